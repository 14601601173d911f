pub mod declension;
pub mod definitions;
pub mod etymology;
pub mod gender;
pub mod pronunciation;

use scraper::ElementRef;

use super::document::Block;
use super::sections::{self, LanguageSection, PartOfSpeechBlock, SectionRange};
use super::ParseOptions;
use crate::record::{ExtractedField, FieldName};

/// Everything an extractor may look at: the selected part-of-speech block and
/// the language section around it.
pub struct Scope<'s, 'a> {
    pub blocks: &'s [Block<'a>],
    pub section: &'s LanguageSection,
    pub part: &'s PartOfSpeechBlock,
    pub title: Option<&'s str>,
    pub options: &'s ParseOptions,
}

impl<'s, 'a> Scope<'s, 'a> {
    /// Content elements of the part-of-speech block, subsections included.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'a>> + 's {
        self.elements_in(self.part.range)
    }

    pub fn elements_in(&self, range: SectionRange) -> impl Iterator<Item = ElementRef<'a>> + 's {
        let blocks: &'s [Block<'a>] = self.blocks;
        blocks[range.body()].iter().filter_map(Block::element)
    }

    /// Content between the block heading and its first sub-heading or
    /// definition list, with block indices: the headword line and friends.
    pub fn head(&self) -> Vec<(usize, ElementRef<'a>)> {
        self.part
            .range
            .body()
            .map_while(|i| self.blocks[i].element().map(|el| (i, el)))
            .take_while(|(_, el)| !definitions::is_definition_list(*el))
            .collect()
    }

    /// The language section's Pronunciation body nearest to this block.
    pub fn pronunciation(&self) -> Option<SectionRange> {
        sections::find_preceding(
            self.blocks,
            self.section,
            self.part.range.start,
            sections::is_pronunciation_heading,
        )
    }
}

pub fn extract_all(scope: &Scope) -> Vec<(FieldName, ExtractedField)> {
    let (definitions, examples) = definitions::extract(scope);
    vec![
        (FieldName::Definitions, definitions),
        (FieldName::Examples, examples),
        (FieldName::Gender, gender::extract(scope)),
        (FieldName::Ipa, pronunciation::ipa(scope)),
        (FieldName::Audio, pronunciation::audio(scope)),
        (FieldName::Etymology, etymology::extract(scope)),
        (FieldName::Declension, declension::extract(scope)),
    ]
}

// ── Tests ──
