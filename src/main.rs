mod settings;

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use settings::Settings;
use wiktionary_entry::parser::document::RawDocument;
use wiktionary_entry::parser::sections;
use wiktionary_entry::{EntryRecord, ParseOptions};

#[derive(Parser)]
#[command(name = "wiktionary_entry", about = "Extract flashcard fields from Wiktionary pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one saved page and print the record as JSON
    Parse {
        file: PathBuf,
        /// Language heading to read (default: WIKT_LANGUAGE)
        #[arg(short, long)]
        language: Option<String>,
        /// Part of speech, e.g. "noun" (default: first in the section)
        #[arg(short, long)]
        part_of_speech: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
    /// Parse every .html page in a directory, one JSON line per file
    Batch {
        dir: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(short, long)]
        part_of_speech: Option<String>,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the heading outline of a page
    Sections { file: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    debug!(?settings, "settings loaded");

    match cli.command {
        Commands::Parse {
            file,
            language,
            part_of_speech,
            pretty,
        } => {
            let language = pick_language(language, &settings)?;
            let part_of_speech = part_of_speech.or_else(|| settings.part_of_speech.clone());
            let markup = read_page(&file)?;
            let record = wiktionary_entry::parse_with(
                &markup,
                &language,
                part_of_speech.as_deref(),
                &settings.options(),
            )
            .with_context(|| format!("parsing {}", file.display()))?;
            if record.is_empty() {
                info!(file = %file.display(), %language, "no matching entry");
            }
            let json = if pretty {
                serde_json::to_string_pretty(&record)?
            } else {
                serde_json::to_string(&record)?
            };
            println!("{}", json);
        }
        Commands::Batch {
            dir,
            language,
            part_of_speech,
            output,
        } => {
            let language = pick_language(language, &settings)?;
            let part_of_speech = part_of_speech.or_else(|| settings.part_of_speech.clone());
            let files = html_files(&dir)?;
            if files.is_empty() {
                println!("No .html files in {}", dir.display());
                return Ok(());
            }
            info!(files = files.len(), %language, "batch start");

            let out: Box<dyn Write> = match &output {
                Some(path) => Box::new(
                    fs::File::create(path)
                        .with_context(|| format!("creating {}", path.display()))?,
                ),
                None => Box::new(io::stdout().lock()),
            };
            let counts = run_batch(
                &files,
                &language,
                part_of_speech.as_deref(),
                &settings.options(),
                BufWriter::new(out),
            )?;
            info!(
                parsed = counts.parsed,
                empty = counts.empty,
                errors = counts.errors,
                elapsed = %format_duration(t0.elapsed()),
                "batch done"
            );
        }
        Commands::Sections { file } => {
            let markup = read_page(&file)?;
            let doc = RawDocument::load(&markup)
                .with_context(|| format!("parsing {}", file.display()))?;
            let blocks = doc.blocks();
            if let Some(title) = doc.title() {
                println!("{}", title);
            }
            for entry in sections::outline(&blocks) {
                let indent = "  ".repeat(usize::from(entry.level.saturating_sub(1)));
                match entry.part_of_speech {
                    Some(pos) => println!("{}{}  [{}]", indent, entry.text, pos),
                    None => println!("{}{}", indent, entry.text),
                }
            }
        }
    }

    Ok(())
}

fn pick_language(flag: Option<String>, settings: &Settings) -> Result<String> {
    match flag.or_else(|| settings.language.clone()) {
        Some(language) if !language.trim().is_empty() => Ok(language),
        _ => bail!("no language given (use --language or WIKT_LANGUAGE)"),
    }
}

fn read_page(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn html_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("listing {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("html")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Serialize)]
struct BatchLine {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<EntryRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Default)]
struct BatchCounts {
    parsed: usize,
    empty: usize,
    errors: usize,
}

fn run_batch<W: Write>(
    files: &[PathBuf],
    language: &str,
    part_of_speech: Option<&str>,
    options: &ParseOptions,
    mut out: W,
) -> Result<BatchCounts> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut counts = BatchCounts::default();
    for chunk in files.chunks(500) {
        let lines: Vec<BatchLine> = chunk
            .par_iter()
            .map(|path| {
                let result = read_page(path).and_then(|markup| {
                    wiktionary_entry::parse_with(&markup, language, part_of_speech, options)
                        .map_err(anyhow::Error::from)
                });
                let file = path.display().to_string();
                match result {
                    Ok(record) => BatchLine {
                        file,
                        record: Some(record),
                        error: None,
                    },
                    Err(err) => BatchLine {
                        file,
                        record: None,
                        error: Some(format!("{:#}", err)),
                    },
                }
            })
            .collect();

        for line in lines {
            match (&line.record, &line.error) {
                (Some(record), _) if record.is_empty() => counts.empty += 1,
                (Some(_), _) => counts.parsed += 1,
                (None, Some(err)) => {
                    warn!(file = %line.file, %err, "page failed");
                    counts.errors += 1;
                }
                (None, None) => {}
            }
            serde_json::to_writer(&mut out, &line)?;
            out.write_all(b"\n")?;
        }
        pb.inc(chunk.len() as u64);
    }
    out.flush()?;

    pb.finish_and_clear();
    Ok(counts)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_writes_one_line_per_file() {
        let files = vec![
            PathBuf::from("tests/fixtures/chat_fr.html"),
            PathBuf::from("tests/fixtures/katze_de.html"),
            PathBuf::from("tests/fixtures/missing.html"),
        ];
        let mut buf = Vec::new();
        let counts = run_batch(&files, "French", None, &ParseOptions::default(), &mut buf).unwrap();
        assert_eq!((counts.parsed, counts.empty, counts.errors), (1, 1, 1));

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["record"]["Gender"], "masculine");
        assert_eq!(lines[1]["record"], serde_json::json!({}));
        assert!(lines[2]["error"].as_str().unwrap().contains("missing.html"));
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(std::time::Duration::from_secs(75)), "1m 15s");
        assert_eq!(format_duration(std::time::Duration::from_millis(1500)), "1.5s");
    }
}
