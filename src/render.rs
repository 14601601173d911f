use std::fmt::Write;
use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use crate::parser::document::text_of;
use crate::record::ExtractedField;

static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

const SPAN_ATTRS: &[&str] = &["colspan", "rowspan"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStyle {
    Ordered,
    Unordered,
}

/// Render items as a bare `<ol>`/`<ul>` fragment. Blank items are skipped;
/// if nothing is left the result is `Empty`, never an empty container.
pub fn list(style: ListStyle, items: &[String]) -> ExtractedField {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        return ExtractedField::Empty;
    }

    let tag = match style {
        ListStyle::Ordered => "ol",
        ListStyle::Unordered => "ul",
    };
    let mut out = format!("<{}>", tag);
    for item in items {
        out.push_str("<li>");
        out.push_str(&escape(item));
        out.push_str("</li>");
    }
    let _ = write!(out, "</{}>", tag);
    ExtractedField::Text(out)
}

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rows and cells only; `colspan`/`rowspan` survive, everything else is dropped.
pub fn table(el: ElementRef<'_>) -> Option<String> {
    let mut out = String::from("<table>");
    let mut rows = 0;

    let own_rows = el
        .select(&ROW_SEL)
        .filter(|row| owning_table(*row).map(|t| t.id()) == Some(el.id()));
    for row in own_rows {
        let cells: Vec<_> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|c| matches!(c.value().name(), "th" | "td"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        out.push_str("<tr>");
        for cell in cells {
            let tag = cell.value().name();
            let _ = write!(out, "<{}", tag);
            for attr in SPAN_ATTRS {
                if let Some(value) = cell.value().attr(attr) {
                    let value = value.trim();
                    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
                        let _ = write!(out, " {}=\"{}\"", attr, value);
                    }
                }
            }
            let _ = write!(out, ">{}</{}>", escape(&text_of(cell)), tag);
        }
        out.push_str("</tr>");
        rows += 1;
    }

    if rows == 0 {
        return None;
    }
    out.push_str("</table>");
    Some(out)
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
}
