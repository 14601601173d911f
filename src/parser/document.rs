use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::ParseError;

static HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());
static HEADLINE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".mw-headline").unwrap());
static FIRST_HEADING_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1#firstHeading").unwrap());
static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());

const CHROME_TAGS: &[&str] = &["head", "script", "style", "noscript", "link", "meta", "template"];
const CHROME_CLASSES: &[&str] = &["mw-editsection", "noprint", "reference", "toc", "mw-empty-elt"];
const BREAKING_TAGS: &[&str] = &["br", "p", "div", "li", "dd", "dt", "tr", "td", "th", "caption"];

/// One unit of the flattened page: a heading, or a content element sitting
/// between headings.
#[derive(Debug, Clone)]
pub enum Block<'a> {
    Heading { level: u8, text: String },
    Content(ElementRef<'a>),
}

impl<'a> Block<'a> {
    pub fn heading(&self) -> Option<(u8, &str)> {
        match self {
            Block::Heading { level, text } => Some((*level, text.as_str())),
            Block::Content(_) => None,
        }
    }

    pub fn element(&self) -> Option<ElementRef<'a>> {
        match self {
            Block::Content(el) => Some(*el),
            Block::Heading { .. } => None,
        }
    }
}

/// A parsed Wiktionary page. Never mutated after `load`.
pub struct RawDocument {
    html: Html,
}

impl RawDocument {
    pub fn load(markup: &str) -> Result<Self, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::MalformedDocument("empty input".to_string()));
        }
        if markup.contains('\0') {
            return Err(ParseError::MalformedDocument("input contains NUL bytes".to_string()));
        }

        let html = Html::parse_document(markup);
        // html5ever recovers from nearly anything, so "unparseable" means the
        // tree holds nothing beyond the skeleton it synthesizes itself.
        let has_markup = html
            .root_element()
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|el| !matches!(el.value().name(), "head" | "body"));
        if !has_markup {
            return Err(ParseError::MalformedDocument("no markup elements found".to_string()));
        }

        Ok(RawDocument { html })
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Flatten the tree into headings and the content elements between them.
    pub fn blocks(&self) -> Vec<Block<'_>> {
        let mut blocks = Vec::new();
        flatten(self.root(), &mut blocks);
        blocks
    }

    /// Page headword, from the rendered page heading or the `<title>`.
    pub fn title(&self) -> Option<String> {
        if let Some(h1) = self.html.select(&FIRST_HEADING_SEL).next() {
            let text = text_of(h1);
            if !text.is_empty() {
                return Some(text);
            }
        }
        let title = self.html.select(&TITLE_SEL).next().map(text_of)?;
        let word = title.split(" - ").next().unwrap_or_default().trim().to_string();
        if word.is_empty() {
            None
        } else {
            Some(word)
        }
    }
}

fn flatten<'a>(parent: ElementRef<'a>, out: &mut Vec<Block<'a>>) {
    for child in parent.children().filter_map(ElementRef::wrap) {
        if is_chrome(child) {
            continue;
        }
        if let Some(level) = heading_level(child) {
            out.push(Block::Heading {
                level,
                text: heading_text(child),
            });
        } else if is_container(child) {
            flatten(child, out);
        } else {
            out.push(Block::Content(child));
        }
    }
}

/// Wrappers are only descended into when a heading hides inside them;
/// otherwise they are content in their own right.
fn is_container(el: ElementRef<'_>) -> bool {
    match el.value().name() {
        "html" | "body" => true,
        "div" | "section" | "main" | "article" => el.select(&HEADING_SEL).next().is_some(),
        _ => false,
    }
}

fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    match el.value().name() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn heading_text(el: ElementRef<'_>) -> String {
    match el.select(&HEADLINE_SEL).next() {
        Some(headline) => text_of(headline),
        None => text_of(el),
    }
}

fn is_chrome(el: ElementRef<'_>) -> bool {
    let element = el.value();
    CHROME_TAGS.contains(&element.name())
        || element.id() == Some("toc")
        || element.classes().any(|c| CHROME_CLASSES.contains(&c))
}

/// `select` that also tests the element itself.
pub fn select_with_self<'a, 'b>(
    el: ElementRef<'a>,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    std::iter::once(el)
        .filter(move |e| selector.matches(e))
        .chain(el.select(selector))
}

pub fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Visible text of an element, whitespace collapsed.
pub fn text_of(el: ElementRef<'_>) -> String {
    text_without(el, |_| false)
}

/// Like `text_of`, but descendants matching `skip` are dropped with their subtree.
pub fn text_without<F>(el: ElementRef<'_>, skip: F) -> String
where
    F: Fn(ElementRef<'_>) -> bool,
{
    let mut raw = String::new();
    collect_text(el, &skip, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(el: ElementRef<'_>, skip: &dyn Fn(ElementRef<'_>) -> bool, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                if is_chrome(child) || skip(child) {
                    continue;
                }
                let breaking = BREAKING_TAGS.contains(&child.value().name());
                if breaking {
                    out.push(' ');
                }
                collect_text(child, skip, out);
                if breaking {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
