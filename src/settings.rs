use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use wiktionary_entry::parser::DEFAULT_BASE_URL;
use wiktionary_entry::ParseOptions;

/// Last-used options: `wiktionary.toml` in the working directory, then
/// `WIKT_*` environment variables. Command-line flags override both.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub language: Option<String>,
    pub part_of_speech: Option<String>,
    pub base_url: String,
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .add_source(File::with_name("wiktionary").required(false))
            .add_source(Environment::with_prefix("WIKT"))
            .build()
            .context("reading configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    pub fn options(&self) -> ParseOptions {
        ParseOptions {
            base_url: self.base_url.clone(),
        }
    }
}
