use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::Scope;
use crate::parser::document::{select_with_self, text_of};
use crate::parser::sections::lead_range;
use crate::record::ExtractedField;
use crate::render;

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static CAPTION_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("caption").unwrap());
static FRAME_TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".NavHead, .inflection-table-title").unwrap());

static DECLENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:declension|inflection)\b").unwrap());
static CONJUGATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bconjugation\b").unwrap());

/// Declension table of the block, serialized to a bare HTML table.
pub fn extract(scope: &Scope) -> ExtractedField {
    for (el, under_heading) in candidates(scope) {
        for table in select_with_self(el, &TABLE_SEL) {
            if !is_declension_table(table, el, under_heading) {
                continue;
            }
            if let Some(html) = render::table(table) {
                return ExtractedField::Text(html);
            }
        }
    }
    ExtractedField::Empty
}

/// Content elements of the block plus a directly following Declension
/// section, flagged when they sit under a Declension/Inflection heading.
/// Anything under a Conjugation heading is left out.
fn candidates<'a>(scope: &Scope<'_, 'a>) -> Vec<(ElementRef<'a>, bool)> {
    let mut out = Vec::new();
    let mut under_heading = false;
    let mut conjugation = false;
    for block in &scope.blocks[scope.part.range.body()] {
        match block.heading() {
            Some((_, text)) => {
                under_heading = is_declension_heading(text);
                conjugation = CONJUGATION_RE.is_match(text);
            }
            None if conjugation => {}
            None => out.extend(block.element().map(|el| (el, under_heading))),
        }
    }

    let next = scope.part.range.end;
    if next < scope.section.range.end {
        if let Some((_, text)) = scope.blocks[next].heading() {
            if is_declension_heading(text) {
                let range = lead_range(scope.blocks, next, scope.section.range.end);
                out.extend(scope.elements_in(range).map(|el| (el, true)));
            }
        }
    }
    out
}

fn is_declension_heading(text: &str) -> bool {
    DECLENSION_RE.is_match(text)
}

/// A table qualifies when its caption or frame title announces a
/// declension, or when it sits under a Declension heading. Conjugation
/// tables never qualify.
fn is_declension_table(
    table: ElementRef<'_>,
    container: ElementRef<'_>,
    under_heading: bool,
) -> bool {
    let labels: Vec<String> = table
        .select(&CAPTION_SEL)
        .next()
        .map(text_of)
        .into_iter()
        .chain(frame_title(table, container))
        .collect();
    if labels.iter().any(|l| CONJUGATION_RE.is_match(l)) {
        return false;
    }
    under_heading || labels.iter().any(|l| DECLENSION_RE.is_match(l))
}

/// Title of the innermost frame (NavFrame or similar) around the table,
/// looking no further out than `container`.
fn frame_title(table: ElementRef<'_>, container: ElementRef<'_>) -> Option<String> {
    let scopes = std::iter::once(table).chain(table.ancestors().filter_map(ElementRef::wrap));
    for scope in scopes {
        if let Some(title) = scope.select(&FRAME_TITLE_SEL).next() {
            return Some(text_of(title));
        }
        if scope.id() == container.id() {
            break;
        }
    }
    None
}

// ── Tests ──
