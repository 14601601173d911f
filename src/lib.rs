//! Extract flashcard fields (definitions, examples, gender, IPA, audio,
//! etymology, declension) from a rendered Wiktionary page.

pub mod error;
pub mod parser;
pub mod record;
pub mod render;

pub use error::ParseError;
pub use parser::extract::gender::Gender;
pub use parser::sections::PartOfSpeech;
pub use parser::ParseOptions;
pub use record::{EntryRecord, ExtractedField, FieldName};

/// Parse one language's entry out of `markup`, optionally restricted to a
/// part of speech. A page without that language yields an empty record.
pub fn parse(
    markup: &str,
    language: &str,
    part_of_speech: Option<&str>,
) -> Result<EntryRecord, ParseError> {
    parser::parse_entry(markup, language, part_of_speech, &ParseOptions::default())
}

pub fn parse_with(
    markup: &str,
    language: &str,
    part_of_speech: Option<&str>,
    options: &ParseOptions,
) -> Result<EntryRecord, ParseError> {
    parser::parse_entry(markup, language, part_of_speech, options)
}
