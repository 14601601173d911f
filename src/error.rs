#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed document: {0}")]
    MalformedDocument(String),
    #[error("no section for language {language:?} (part of speech: {})", describe_filter(.part_of_speech))]
    SectionNotFound {
        language: String,
        part_of_speech: Option<String>,
    },
}

impl ParseError {
    pub fn section_not_found(language: &str, part_of_speech: Option<&str>) -> Self {
        Self::SectionNotFound {
            language: language.to_string(),
            part_of_speech: part_of_speech.map(str::to_string),
        }
    }

    /// Non-fatal errors are absorbed into an empty record by `parse`.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::MalformedDocument(_))
    }
}

fn describe_filter(part_of_speech: &Option<String>) -> &str {
    part_of_speech.as_deref().unwrap_or("any")
}
