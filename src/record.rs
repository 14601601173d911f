use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::render::{self, ListStyle};

/// The fixed set of fields an entry can carry, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FieldName {
    Definitions,
    Examples,
    Gender,
    #[serde(rename = "IPA")]
    Ipa,
    Audio,
    Etymology,
    Declension,
}

impl FieldName {
    pub const ALL: [FieldName; 7] = [
        FieldName::Definitions,
        FieldName::Examples,
        FieldName::Gender,
        FieldName::Ipa,
        FieldName::Audio,
        FieldName::Etymology,
        FieldName::Declension,
    ];
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FieldName::Definitions => "Definitions",
            FieldName::Examples => "Examples",
            FieldName::Gender => "Gender",
            FieldName::Ipa => "IPA",
            FieldName::Audio => "Audio",
            FieldName::Etymology => "Etymology",
            FieldName::Declension => "Declension",
        };
        write!(f, "{}", name)
    }
}

/// Output of one extractor. `Empty` is a normal result and never reaches
/// an `EntryRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractedField {
    Text(String),
    List(Vec<String>),
    Link(String),
    Empty,
}

impl ExtractedField {
    /// Trimmed text, or `Empty` when nothing is left.
    pub fn text(value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        if value.is_empty() {
            ExtractedField::Empty
        } else {
            ExtractedField::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ExtractedField::Text(s) | ExtractedField::Link(s) => s.trim().is_empty(),
            ExtractedField::List(items) => items.iter().all(|i| i.trim().is_empty()),
            ExtractedField::Empty => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExtractedField::Text(s) | ExtractedField::Link(s) => Some(s),
            ExtractedField::List(_) | ExtractedField::Empty => None,
        }
    }
}

/// Non-empty fields extracted for one (headword, language) query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntryRecord {
    fields: BTreeMap<FieldName, ExtractedField>,
}

impl EntryRecord {
    /// Render list fields and drop every empty one. This is the only place
    /// missing data is filtered.
    pub fn assemble<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (FieldName, ExtractedField)>,
    {
        let mut out = BTreeMap::new();
        for (name, field) in fields {
            let field = match field {
                ExtractedField::List(items) => render::list(list_style(name), &items),
                other => other,
            };
            if field.is_empty() {
                trace!(field = %name, "dropping empty field");
                continue;
            }
            out.insert(name, field);
        }
        EntryRecord { fields: out }
    }

    pub fn get(&self, name: FieldName) -> Option<&ExtractedField> {
        self.fields.get(&name)
    }

    /// Field value as it would be written into a note field.
    pub fn value(&self, name: FieldName) -> Option<&str> {
        self.get(name).and_then(ExtractedField::as_str)
    }

    pub fn contains(&self, name: FieldName) -> bool {
        self.fields.contains_key(&name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &ExtractedField)> {
        self.fields.iter().map(|(name, field)| (*name, field))
    }
}

fn list_style(name: FieldName) -> ListStyle {
    match name {
        FieldName::Definitions => ListStyle::Ordered,
        _ => ListStyle::Unordered,
    }
}
