use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Node, Selector};
use tracing::trace;

use super::Scope;
use crate::parser::document::{collapse_whitespace, has_class, select_with_self, text_of, text_without};
use crate::record::ExtractedField;

static TEMPLATE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".gender, [data-gender]").unwrap());
static ABBR_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("abbr[title]").unwrap());
static HEADWORD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong.headword, b").unwrap());
static MAIN_HEADWORD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong.headword").unwrap());
static WORD_OR_TEMPLATE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong.headword, b, .gender, [data-gender]").unwrap());

static GENDER_WORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(masculine|feminine|neuter|common gender)\b").unwrap()
});
static PARENTHETICAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());

/// Tokens allowed between two abbreviations ("m or f", "m & f").
const CONNECTORS: &[&str] = &["or", "and", "&", "/", "~"];
/// How much text after a headword is examined.
const FOLLOWING_CHARS: usize = 48;
/// Free-text mentions only count near the top of the block.
const FREE_TEXT_CHARS: usize = 300;

const LANGUAGE_CODES: &[(&str, &str)] = &[
    ("french", "fr"),
    ("spanish", "es"),
    ("italian", "it"),
    ("portuguese", "pt"),
    ("catalan", "ca"),
    ("romanian", "ro"),
    ("german", "de"),
    ("dutch", "nl"),
    ("swedish", "sv"),
    ("danish", "da"),
    ("norwegian", "no"),
    ("norwegian bokmål", "nb"),
    ("norwegian nynorsk", "nn"),
    ("icelandic", "is"),
    ("russian", "ru"),
    ("ukrainian", "uk"),
    ("belarusian", "be"),
    ("polish", "pl"),
    ("czech", "cs"),
    ("latin", "la"),
    ("ancient greek", "grc"),
    ("greek", "el"),
];

/// Per-language abbreviation patterns, tried in order against each token.
static ABBREVIATIONS: LazyLock<HashMap<&'static str, Vec<(Regex, Gender)>>> = LazyLock::new(|| {
    use Gender::*;

    let romance: &[(&str, Gender)] = &[(r"m\.?|masc\.?", Masculine), (r"f\.?|fem\.?", Feminine)];
    let three: &[(&str, Gender)] = &[
        (r"m\.?|masc\.?", Masculine),
        (r"f\.?|fem\.?", Feminine),
        (r"n\.?|neut\.?", Neuter),
    ];
    let common_neuter: &[(&str, Gender)] = &[(r"c\.?|com\.?", Common), (r"n\.?|neut\.?", Neuter)];
    let east_slavic: &[(&str, Gender)] = &[
        (r"m\.?|м\.?", Masculine),
        (r"f\.?|ж\.?", Feminine),
        (r"n\.?|с\.?|ср\.?", Neuter),
    ];
    let dutch: &[(&str, Gender)] = &[
        (r"m\.?", Masculine),
        (r"f\.?", Feminine),
        (r"n\.?|o\.?", Neuter),
        (r"c\.?", Common),
    ];
    let fallback: &[(&str, Gender)] = &[
        (r"m\.?|masc\.?", Masculine),
        (r"f\.?|fem\.?", Feminine),
        (r"n\.?|neut\.?", Neuter),
        (r"c\.?|com\.?", Common),
    ];

    let compile = |rows: &[(&str, Gender)]| -> Vec<(Regex, Gender)> {
        rows.iter()
            .map(|(pattern, gender)| (Regex::new(&format!("^(?:{})$", pattern)).unwrap(), *gender))
            .collect()
    };

    let mut tables = HashMap::new();
    for code in ["fr", "es", "it", "pt", "ca"] {
        tables.insert(code, compile(romance));
    }
    for code in ["ro", "de", "is", "no", "nn", "pl", "cs", "la", "grc", "el"] {
        tables.insert(code, compile(three));
    }
    for code in ["sv", "da", "nb"] {
        tables.insert(code, compile(common_neuter));
    }
    for code in ["ru", "uk", "be"] {
        tables.insert(code, compile(east_slavic));
    }
    tables.insert("nl", compile(dutch));
    tables.insert("default", compile(fallback));
    tables
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Masculine,
    Feminine,
    Neuter,
    Common,
    /// Collected but never reported.
    Unknown,
}

impl Gender {
    /// Map a standardized code ("m", "f-p", "n") or a descriptive title
    /// ("masculine gender") to a gender.
    pub fn from_code(code: &str) -> Gender {
        let code = code.trim().to_lowercase();
        let first = code
            .split(|c: char| c.is_whitespace() || c == '-' || c == '|')
            .next()
            .unwrap_or_default();
        match first {
            "m" | "masculine" | "masc" => Gender::Masculine,
            "f" | "feminine" | "fem" => Gender::Feminine,
            "n" | "neuter" | "neut" => Gender::Neuter,
            "c" | "common" => Gender::Common,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(self) -> Option<&'static str> {
        match self {
            Gender::Masculine => Some("masculine"),
            Gender::Feminine => Some("feminine"),
            Gender::Neuter => Some("neuter"),
            Gender::Common => Some("common"),
            Gender::Unknown => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str().unwrap_or("unknown"))
    }
}

/// Where a signal came from. Declaration order is precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignalSource {
    Template,
    Abbreviation,
    FreeText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenderSignal {
    pub gender: Gender,
    pub source: SignalSource,
    /// (block index, offset within the block); orders signals by document position.
    pub position: (usize, usize),
}

pub fn language_code(language: &str) -> Option<&'static str> {
    let lower = language.trim().to_lowercase();
    LANGUAGE_CODES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, code)| *code)
}

/// Abbreviation patterns for a language, falling back to the generic table.
pub fn abbreviations(language: &str) -> &'static [(Regex, Gender)] {
    let tables = &*ABBREVIATIONS;
    language_code(language)
        .and_then(|code| tables.get(code))
        .or_else(|| tables.get("default"))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn extract(scope: &Scope) -> ExtractedField {
    if !scope.part.part_of_speech.is_noun() {
        return ExtractedField::Empty;
    }
    let signals = collect(scope);
    trace!(count = signals.len(), "gender signals");
    match resolve(&signals).and_then(Gender::as_str) {
        Some(gender) => ExtractedField::Text(gender.to_string()),
        None => ExtractedField::Empty,
    }
}

/// Highest-precedence source wins; within a source, the earliest signal.
pub fn resolve(signals: &[GenderSignal]) -> Option<Gender> {
    signals
        .iter()
        .filter(|s| s.gender != Gender::Unknown)
        .min_by_key(|s| (s.source, s.position))
        .map(|s| s.gender)
}

pub fn collect(scope: &Scope) -> Vec<GenderSignal> {
    let head = scope.head();
    let table = abbreviations(&scope.section.language);

    let mut signals = Vec::new();
    for &(index, el) in &head {
        template_signals(index, el, &mut signals);
        abbreviation_signals(index, el, scope.title, table, &mut signals);
    }
    free_text_signals(&head, &mut signals);
    signals
}

/// Template annotations belonging to the headword of the line: those whose
/// nearest preceding bold word is the headword itself. Annotations on
/// inflected forms ("diminutive Kätzchen n") are ignored.
fn template_signals(index: usize, el: ElementRef<'_>, out: &mut Vec<GenderSignal>) {
    let headword = select_with_self(el, &MAIN_HEADWORD_SEL)
        .next()
        .or_else(|| select_with_self(el, &HEADWORD_SEL).next());
    let mut attached = headword.is_none();
    let mut offset = 0;

    for node in select_with_self(el, &WORD_OR_TEMPLATE_SEL) {
        if !is_template(node) {
            attached = headword.is_some_and(|h| h.id() == node.id());
            continue;
        }
        if !attached {
            continue;
        }

        let mut push = |gender: Gender| {
            out.push(GenderSignal {
                gender,
                source: SignalSource::Template,
                position: (index, offset),
            });
            offset += 1;
        };
        if let Some(code) = node.value().attr("data-gender") {
            push(Gender::from_code(code));
            continue;
        }
        let titled: Vec<_> = node.select(&ABBR_SEL).collect();
        if titled.is_empty() {
            push(Gender::from_code(&text_of(node)));
        } else {
            for abbr in titled {
                push(Gender::from_code(abbr.value().attr("title").unwrap_or_default()));
            }
        }
    }
}

fn abbreviation_signals(
    index: usize,
    el: ElementRef<'_>,
    title: Option<&str>,
    table: &[(Regex, Gender)],
    out: &mut Vec<GenderSignal>,
) {
    let headwords: Vec<_> = select_with_self(el, &HEADWORD_SEL).collect();
    let followers: Vec<String> = if headwords.is_empty() {
        // No marked-up headword: fall back to the page title at line start.
        let line = text_without_templates(el);
        title
            .and_then(|t| line.strip_prefix(t))
            .map(|rest| vec![rest.to_string()])
            .unwrap_or_default()
    } else {
        headwords.into_iter().map(following_text).collect()
    };

    for (k, text) in followers.iter().enumerate() {
        for (t, token) in abbreviation_run(text, table).into_iter().enumerate() {
            out.push(GenderSignal {
                gender: token,
                source: SignalSource::Abbreviation,
                position: (index, k * FOLLOWING_CHARS + t),
            });
        }
    }
}

/// Genders of the abbreviation tokens at the very start of `text`.
fn abbreviation_run(text: &str, table: &[(Regex, Gender)]) -> Vec<Gender> {
    let mut genders = Vec::new();
    let tokens = text
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty());
    for token in tokens {
        if CONNECTORS.contains(&token) {
            continue;
        }
        let parts: Vec<&str> = token.split('/').filter(|p| !p.is_empty()).collect();
        let matched: Vec<Gender> = parts
            .iter()
            .filter_map(|part| {
                table
                    .iter()
                    .find(|(pattern, _)| pattern.is_match(part))
                    .map(|(_, gender)| *gender)
            })
            .collect();
        if matched.is_empty() || matched.len() != parts.len() {
            break;
        }
        genders.extend(matched);
    }
    genders
}

/// Text of the siblings right after a headword, template annotations excluded.
fn following_text(headword: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for sibling in headword.next_siblings() {
        if raw.chars().count() >= FOLLOWING_CHARS {
            break;
        }
        match sibling.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(sibling) else {
                    continue;
                };
                if !is_template(el) {
                    raw.push(' ');
                    raw.push_str(&text_without_templates(el));
                    raw.push(' ');
                }
            }
            _ => {}
        }
    }
    collapse_whitespace(&raw)
}

fn is_template(el: ElementRef<'_>) -> bool {
    has_class(el, "gender") || el.value().attr("data-gender").is_some()
}

fn text_without_templates(el: ElementRef<'_>) -> String {
    text_without(el, is_template)
}

fn free_text_signals(head: &[(usize, ElementRef<'_>)], out: &mut Vec<GenderSignal>) {
    let mut budget = FREE_TEXT_CHARS;
    for &(index, el) in head {
        if budget == 0 {
            break;
        }
        let text = text_without_templates(el);
        let text = PARENTHETICAL_RE.replace_all(&text, " ");
        let text: String = text.chars().take(budget).collect();
        budget = budget.saturating_sub(text.chars().count());

        for m in GENDER_WORD_RE.find_iter(&text) {
            out.push(GenderSignal {
                gender: Gender::from_code(m.as_str()),
                source: SignalSource::FreeText,
                position: (index, m.start()),
            });
        }
    }
}

// ── Tests ──
