pub mod document;
pub mod extract;
pub mod sections;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ParseError;
use crate::record::EntryRecord;
use document::RawDocument;
use extract::Scope;

pub const DEFAULT_BASE_URL: &str = "https://en.wiktionary.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Site that page-relative links (audio files) are resolved against.
    pub base_url: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Four-stage pipeline: markup → blocks → language/part-of-speech section →
/// extracted fields → record. A missing section yields an empty record.
pub fn parse_entry(
    markup: &str,
    language: &str,
    part_of_speech: Option<&str>,
    options: &ParseOptions,
) -> Result<EntryRecord, ParseError> {
    let doc = RawDocument::load(markup)?;
    let blocks = doc.blocks();

    let selected = sections::find_language(&blocks, language).and_then(|section| {
        let part = sections::select_block(&blocks, &section, part_of_speech)?;
        Ok((section, part))
    });
    let (section, part) = match selected {
        Ok(selected) => selected,
        Err(err) if !err.is_fatal() => {
            debug!(%err, "no matching section, returning empty record");
            return Ok(EntryRecord::default());
        }
        Err(err) => return Err(err),
    };
    debug!(
        language = %section.language,
        part_of_speech = %part.part_of_speech,
        heading = %part.label,
        blocks = part.range.body().len(),
        "selected section"
    );

    let title = doc.title();
    let scope = Scope {
        blocks: &blocks,
        section: &section,
        part: &part,
        title: title.as_deref(),
        options,
    };
    Ok(EntryRecord::assemble(extract::extract_all(&scope)))
}

// ── Tests ──
