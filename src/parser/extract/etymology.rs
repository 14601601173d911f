use super::Scope;
use crate::parser::document::text_of;
use crate::parser::sections::{find_preceding, is_etymology_heading};
use crate::record::ExtractedField;

/// Body of the Etymology section that applies to the selected block.
/// Paragraphs are kept on separate lines.
pub fn extract(scope: &Scope) -> ExtractedField {
    let Some(range) = find_preceding(
        scope.blocks,
        scope.section,
        scope.part.range.start,
        is_etymology_heading,
    ) else {
        return ExtractedField::Empty;
    };

    let paragraphs: Vec<String> = scope
        .elements_in(range)
        .map(text_of)
        .filter(|t| !t.is_empty())
        .collect();
    ExtractedField::text(paragraphs.join("\n"))
}
