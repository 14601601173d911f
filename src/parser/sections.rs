use std::fmt;
use std::ops::Range;

use super::document::Block;
use crate::error::ParseError;

/// Wiktionary puts one `<h2>` per language.
pub const LANGUAGE_LEVEL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Preposition,
    Postposition,
    Conjunction,
    Interjection,
    Determiner,
    Article,
    Particle,
    Numeral,
    Participle,
    Prefix,
    Suffix,
    Phrase,
    Proverb,
    Contraction,
    Classifier,
}

impl PartOfSpeech {
    /// Recognize a heading or filter label. Trailing sense numbers ("Noun 2")
    /// are ignored; unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.trim().to_lowercase();
        let base = lower.trim_end_matches(|c: char| c.is_ascii_digit() || c.is_whitespace());
        let pos = match base {
            "noun" | "n" => Self::Noun,
            "proper noun" | "proper name" | "propn" => Self::ProperNoun,
            "verb" | "v" => Self::Verb,
            "adjective" | "adj" => Self::Adjective,
            "adverb" | "adv" => Self::Adverb,
            "pronoun" | "pron" => Self::Pronoun,
            "preposition" | "prep" => Self::Preposition,
            "postposition" | "postp" => Self::Postposition,
            "conjunction" | "conj" => Self::Conjunction,
            "interjection" | "intj" => Self::Interjection,
            "determiner" | "det" => Self::Determiner,
            "article" | "art" => Self::Article,
            "particle" | "part" => Self::Particle,
            "numeral" | "num" | "number" => Self::Numeral,
            "participle" => Self::Participle,
            "prefix" => Self::Prefix,
            "suffix" => Self::Suffix,
            "phrase" | "idiom" | "prepositional phrase" => Self::Phrase,
            "proverb" => Self::Proverb,
            "contraction" => Self::Contraction,
            "classifier" => Self::Classifier,
            _ => return None,
        };
        Some(pos)
    }

    /// Categories that carry grammatical gender.
    pub fn is_noun(self) -> bool {
        matches!(self, Self::Noun | Self::ProperNoun)
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Self::Noun => "noun",
            Self::ProperNoun => "proper noun",
            Self::Verb => "verb",
            Self::Adjective => "adjective",
            Self::Adverb => "adverb",
            Self::Pronoun => "pronoun",
            Self::Preposition => "preposition",
            Self::Postposition => "postposition",
            Self::Conjunction => "conjunction",
            Self::Interjection => "interjection",
            Self::Determiner => "determiner",
            Self::Article => "article",
            Self::Particle => "particle",
            Self::Numeral => "numeral",
            Self::Participle => "participle",
            Self::Prefix => "prefix",
            Self::Suffix => "suffix",
            Self::Phrase => "phrase",
            Self::Proverb => "proverb",
            Self::Contraction => "contraction",
            Self::Classifier => "classifier",
        };
        write!(f, "{}", label)
    }
}

/// Block indices of a section: `start` is its heading, `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRange {
    pub start: usize,
    pub end: usize,
}

impl SectionRange {
    pub fn body(&self) -> Range<usize> {
        (self.start + 1).min(self.end)..self.end
    }
}

#[derive(Debug, Clone)]
pub struct LanguageSection {
    pub language: String,
    pub range: SectionRange,
}

#[derive(Debug, Clone)]
pub struct PartOfSpeechBlock {
    pub part_of_speech: PartOfSpeech,
    pub label: String,
    pub level: u8,
    pub range: SectionRange,
}

/// Index of the first heading after `start` at `level` or shallower.
fn extent(blocks: &[Block], start: usize, level: u8) -> usize {
    blocks[start + 1..]
        .iter()
        .position(|b| matches!(b.heading(), Some((l, _)) if l <= level))
        .map(|offset| start + 1 + offset)
        .unwrap_or(blocks.len())
}

pub fn find_language(blocks: &[Block], language: &str) -> Result<LanguageSection, ParseError> {
    let target = language.trim().to_lowercase();
    let start = blocks
        .iter()
        .position(|b| matches!(b.heading(), Some((LANGUAGE_LEVEL, text)) if text.to_lowercase() == target))
        .ok_or_else(|| ParseError::section_not_found(language, None))?;

    let (_, text) = blocks[start].heading().unwrap_or((LANGUAGE_LEVEL, language));
    Ok(LanguageSection {
        language: text.to_string(),
        range: SectionRange {
            start,
            end: extent(blocks, start, LANGUAGE_LEVEL),
        },
    })
}

/// Every part-of-speech heading inside the language section, in document order.
pub fn part_of_speech_blocks(blocks: &[Block], section: &LanguageSection) -> Vec<PartOfSpeechBlock> {
    section
        .range
        .body()
        .filter_map(|i| {
            let (level, text) = blocks[i].heading()?;
            if level <= LANGUAGE_LEVEL {
                return None;
            }
            let part_of_speech = PartOfSpeech::from_label(text)?;
            Some(PartOfSpeechBlock {
                part_of_speech,
                label: text.to_string(),
                level,
                range: SectionRange {
                    start: i,
                    end: extent(blocks, i, level).min(section.range.end),
                },
            })
        })
        .collect()
}

/// Pick the block matching `filter`, or the first block when no filter is set.
pub fn select_block(
    blocks: &[Block],
    section: &LanguageSection,
    filter: Option<&str>,
) -> Result<PartOfSpeechBlock, ParseError> {
    let mut candidates = part_of_speech_blocks(blocks, section).into_iter();
    let chosen = match filter {
        Some(label) => PartOfSpeech::from_label(label)
            .and_then(|wanted| candidates.find(|b| b.part_of_speech == wanted)),
        None => candidates.next(),
    };
    chosen.ok_or_else(|| ParseError::section_not_found(&section.language, filter))
}

/// Locate an auxiliary heading (Etymology, Pronunciation, ...) in the language
/// section: the nearest match before `before`, else the first match anywhere.
/// Matches inside another etymology group than the one holding `before` are
/// never used. The returned range covers only the content up to the next
/// heading of any level.
pub fn find_preceding<F>(
    blocks: &[Block],
    section: &LanguageSection,
    before: usize,
    is_match: F,
) -> Option<SectionRange>
where
    F: Fn(&str) -> bool,
{
    let groups = etymology_groups(blocks, section);
    let foreign = |i: usize| {
        groups
            .iter()
            .any(|g| g.start <= i && i < g.end && !(g.start < before && before < g.end))
    };
    let hits: Vec<usize> = section
        .range
        .body()
        .filter(|&i| matches!(blocks[i].heading(), Some((_, text)) if is_match(text)))
        .filter(|&i| !foreign(i))
        .collect();
    let start = hits
        .iter()
        .rev()
        .find(|&&i| i < before)
        .or_else(|| hits.first())
        .copied()?;
    Some(lead_range(blocks, start, section.range.end))
}

/// Etymology headings that own subsections ("Etymology 1" with its parts of
/// speech below it), with their full extent.
pub fn etymology_groups(blocks: &[Block], section: &LanguageSection) -> Vec<SectionRange> {
    section
        .range
        .body()
        .filter_map(|i| {
            let (level, text) = blocks[i].heading()?;
            if !is_etymology_heading(text) {
                return None;
            }
            let end = extent(blocks, i, level).min(section.range.end);
            let lead_end = lead_range(blocks, i, section.range.end).end;
            (end > lead_end).then_some(SectionRange { start: i, end })
        })
        .collect()
}

/// Heading at `start` plus its content, stopping at the next heading of any level.
pub fn lead_range(blocks: &[Block], start: usize, limit: usize) -> SectionRange {
    let end = blocks[start + 1..limit.max(start + 1)]
        .iter()
        .position(|b| b.heading().is_some())
        .map(|offset| start + 1 + offset)
        .unwrap_or(limit);
    SectionRange { start, end }
}

/// True for "Etymology" and numbered variants such as "Etymology 2".
pub fn is_etymology_heading(text: &str) -> bool {
    heading_base(text).eq_ignore_ascii_case("etymology")
}

pub fn is_pronunciation_heading(text: &str) -> bool {
    heading_base(text).eq_ignore_ascii_case("pronunciation")
}

fn heading_base(text: &str) -> &str {
    text.trim()
        .trim_end_matches(|c: char| c.is_ascii_digit() || c.is_whitespace())
}

#[derive(Debug, Clone)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    pub part_of_speech: Option<PartOfSpeech>,
}

/// Every heading of the page with its level, for diagnostics.
pub fn outline(blocks: &[Block]) -> Vec<OutlineEntry> {
    blocks
        .iter()
        .filter_map(|b| b.heading())
        .map(|(level, text)| OutlineEntry {
            level,
            text: text.to_string(),
            part_of_speech: if level > LANGUAGE_LEVEL {
                PartOfSpeech::from_label(text)
            } else {
                None
            },
        })
        .collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::document::RawDocument;

    const PAGE: &str = r#"
        <h2>English</h2>
        <h3>Noun</h3><p>chat</p><ol><li>Informal conversation.</li></ol>
        <h2>French</h2>
        <h3>Etymology 1</h3><p>From Latin cattus.</p>
        <h4>Noun</h4><p>chat m</p><ol><li>cat</li></ol>
        <h5>Derived terms</h5><ul><li>chaton</li></ul>
        <h3>Etymology 2</h3><p>From chatter.</p>
        <h4>Verb</h4><p>chat</p><ol><li>to chat</li></ol>
        <h2>Spanish</h2><h3>Noun</h3><p>chat m</p>
    "#;

    #[test]
    fn language_extent_stops_at_next_language() {
        let doc = RawDocument::load(PAGE).unwrap();
        let blocks = doc.blocks();
        let french = find_language(&blocks, "french").unwrap();
        assert_eq!(french.language, "French");
        assert!(matches!(blocks[french.range.end].heading(), Some((2, "Spanish"))));
    }

    #[test]
    fn missing_language() {
        let doc = RawDocument::load(PAGE).unwrap();
        let blocks = doc.blocks();
        let err = find_language(&blocks, "German").unwrap_err();
        assert!(matches!(err, ParseError::SectionNotFound { .. }));
        assert!(!err.is_fatal());
    }

    #[test]
    fn nested_blocks_include_subsections() {
        let doc = RawDocument::load(PAGE).unwrap();
        let blocks = doc.blocks();
        let french = find_language(&blocks, "French").unwrap();
        let parts = part_of_speech_blocks(&blocks, &french);
        let labels: Vec<_> = parts.iter().map(|p| p.part_of_speech).collect();
        assert_eq!(labels, vec![PartOfSpeech::Noun, PartOfSpeech::Verb]);

        // Noun runs through its Derived terms subsection, up to Etymology 2
        let noun = &parts[0];
        assert_eq!(noun.level, 4);
        assert!(matches!(blocks[noun.range.end].heading(), Some((3, "Etymology 2"))));
    }

    #[test]
    fn select_with_filter_and_default() {
        let doc = RawDocument::load(PAGE).unwrap();
        let blocks = doc.blocks();
        let french = find_language(&blocks, "French").unwrap();

        let first = select_block(&blocks, &french, None).unwrap();
        assert_eq!(first.part_of_speech, PartOfSpeech::Noun);

        let verb = select_block(&blocks, &french, Some("verb")).unwrap();
        assert_eq!(verb.label, "Verb");

        assert!(select_block(&blocks, &french, Some("adjective")).is_err());
        assert!(select_block(&blocks, &french, Some("gibberish")).is_err());
    }

    #[test]
    fn etymology_nearest_before_block() {
        let doc = RawDocument::load(PAGE).unwrap();
        let blocks = doc.blocks();
        let french = find_language(&blocks, "French").unwrap();
        let verb = select_block(&blocks, &french, Some("v")).unwrap();

        let ety = find_preceding(&blocks, &french, verb.range.start, is_etymology_heading).unwrap();
        assert!(matches!(blocks[ety.start].heading(), Some((3, "Etymology 2"))));
        // body stops at the Verb heading
        assert_eq!(ety.end, verb.range.start);
        assert_eq!(ety.body().len(), 1);
    }

    #[test]
    fn pronunciation_stays_in_its_etymology_group() {
        let html = r#"<h2>French</h2>
            <h3>Pronunciation</h3><p>IPA: /ʃa/</p>
            <h3>Etymology 1</h3><p>From Latin.</p>
            <h4>Pronunciation</h4><p>IPA: /ʃat/</p>
            <h4>Noun</h4><p>chat m</p>
            <h3>Etymology 2</h3><p>From English.</p>
            <h4>Noun</h4><p>chat m</p>
            <h3>Etymology 3</h3><p>Unknown.</p>
            <h4>Pronunciation</h4><p>IPA: /tʃat/</p>
            <h4>Verb</h4><p>chatter</p>"#;
        let doc = RawDocument::load(html).unwrap();
        let blocks = doc.blocks();
        let french = find_language(&blocks, "French").unwrap();
        let parts = part_of_speech_blocks(&blocks, &french);
        assert_eq!(etymology_groups(&blocks, &french).len(), 3);

        let body_text = |range: SectionRange| {
            blocks[range.body()]
                .iter()
                .filter_map(|b| b.element())
                .map(crate::parser::document::text_of)
                .collect::<String>()
        };
        let pron = |part: &PartOfSpeechBlock| {
            find_preceding(&blocks, &french, part.range.start, is_pronunciation_heading)
                .map(body_text)
        };

        // own group
        assert_eq!(pron(&parts[0]).as_deref(), Some("IPA: /ʃat/"));
        // no pronunciation in Etymology 2: the shared one, never Etymology 1's
        assert_eq!(pron(&parts[1]).as_deref(), Some("IPA: /ʃa/"));
        assert_eq!(pron(&parts[2]).as_deref(), Some("IPA: /tʃat/"));
    }

    #[test]
    fn flat_etymology_is_not_a_group() {
        let html = "<h2>French</h2><h3>Etymology</h3><p>From Latin.</p><h3>Noun</h3><p>chat</p>";
        let doc = RawDocument::load(html).unwrap();
        let blocks = doc.blocks();
        let french = find_language(&blocks, "French").unwrap();
        assert!(etymology_groups(&blocks, &french).is_empty());
    }

    #[test]
    fn labels_and_aliases() {
        assert_eq!(PartOfSpeech::from_label("Noun 2"), Some(PartOfSpeech::Noun));
        assert_eq!(PartOfSpeech::from_label("adj"), Some(PartOfSpeech::Adjective));
        assert_eq!(PartOfSpeech::from_label("Proper noun"), Some(PartOfSpeech::ProperNoun));
        assert_eq!(PartOfSpeech::from_label("Pronunciation"), None);
        assert!(PartOfSpeech::ProperNoun.is_noun());
        assert!(!PartOfSpeech::Verb.is_noun());
    }

    #[test]
    fn outline_marks_parts_of_speech() {
        let doc = RawDocument::load(PAGE).unwrap();
        let entries = outline(&doc.blocks());
        assert_eq!(entries.len(), 10);
        assert!(entries
            .iter()
            .filter(|e| e.part_of_speech.is_some())
            .all(|e| e.level > LANGUAGE_LEVEL));
    }
}
