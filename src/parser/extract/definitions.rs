use std::sync::LazyLock;

use scraper::{ElementRef, Selector};

use super::Scope;
use crate::parser::document::{has_class, text_of, text_without};
use crate::record::ExtractedField;

static OL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ol").unwrap());
static EXAMPLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".e-example, .e-quotation").unwrap());
static TRANSLATION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".e-translation").unwrap());

const NESTED_TAGS: &[&str] = &["dl", "ul", "ol"];
const EXAMPLE_CLASSES: &[&str] = &["h-usage-example", "e-example", "e-translation", "citation-whole"];
const RELATION_CLASSES: &[&str] = &["nyms", "synonym", "antonym"];
const SOURCE_CLASSES: &[&str] = &["citation-whole", "cited-source"];

/// Definitions and their examples from the block's first ordered list.
/// Returns `(definitions, examples)` as raw lists; rendering happens later.
pub fn extract(scope: &Scope) -> (ExtractedField, ExtractedField) {
    let Some(list) = scope.elements().find_map(definition_list) else {
        return (ExtractedField::Empty, ExtractedField::Empty);
    };

    let mut definitions = Vec::new();
    let mut examples = Vec::new();
    for item in list
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "li")
    {
        let text = text_without(item, is_nested_markup);
        if text.is_empty() {
            continue;
        }
        definitions.push(text);
        item_examples(item, &mut examples);
    }

    (ExtractedField::List(definitions), ExtractedField::List(examples))
}

pub fn is_definition_list(el: ElementRef<'_>) -> bool {
    el.value().name() == "ol" || el.select(&OL_SEL).next().is_some()
}

/// The element itself when it is an `<ol>`, else the first `<ol>` inside it.
fn definition_list(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if el.value().name() == "ol" {
        Some(el)
    } else {
        el.select(&OL_SEL).next()
    }
}

fn is_nested_markup(el: ElementRef<'_>) -> bool {
    NESTED_TAGS.contains(&el.value().name())
        || el.value().classes().any(|c| EXAMPLE_CLASSES.contains(&c))
}

/// Sub-list items under one definition (`dl > dd`, `ul > li`), including
/// those of its sub-senses, in document order.
fn item_examples(item: ElementRef<'_>, out: &mut Vec<String>) {
    for child in item.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "dl" | "ul" => {
                let entries = child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| matches!(el.value().name(), "dd" | "li"));
                out.extend(entries.filter_map(example_text));
            }
            "ol" => {
                let senses = child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|el| el.value().name() == "li");
                for sense in senses {
                    item_examples(sense, out);
                }
            }
            _ => {}
        }
    }
}

/// Example or quotation text, with its translation when there is one.
/// Bare citation lines (date, author, title) yield nothing.
fn example_text(el: ElementRef<'_>) -> Option<String> {
    let text = match el.select(&EXAMPLE_SEL).next() {
        Some(example) => {
            let example = text_of(example);
            match el.select(&TRANSLATION_SEL).next().map(text_of) {
                Some(translation) if !translation.is_empty() && !example.is_empty() => {
                    format!("{} / {}", example, translation)
                }
                _ => example,
            }
        }
        None => text_without(el, |e| {
            NESTED_TAGS.contains(&e.value().name())
                || RELATION_CLASSES.iter().any(|c| has_class(e, c))
                || SOURCE_CLASSES.iter().any(|c| has_class(e, c))
        }),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract::tests::with_scope;

    fn run(body: &str) -> (ExtractedField, ExtractedField) {
        let html = format!("<h2>French</h2><h3>Noun</h3><p>chat m</p>{}", body);
        with_scope(&html, "French", None, extract)
    }

    #[test]
    fn definitions_with_nested_examples() {
        let (defs, examples) = run(
            r#"<ol>
                <li>a small domesticated feline
                    <dl><dd><span class="h-usage-example"><i class="e-example">J'ai un chat.</i> ― <span class="e-translation">I have a cat.</span></span></dd></dl>
                </li>
                <li>(<i>slang</i>) pussy</li>
            </ol>"#,
        );
        assert_eq!(
            defs,
            ExtractedField::List(vec!["a small domesticated feline".into(), "(slang) pussy".into()])
        );
        assert_eq!(
            examples,
            ExtractedField::List(vec!["J'ai un chat. / I have a cat.".into()])
        );
    }

    #[test]
    fn plain_italic_examples() {
        let (_, examples) = run("<ol><li>cat<dl><dd><i>J'ai un chat</i></dd><dd></dd></dl></li></ol>");
        assert_eq!(examples, ExtractedField::List(vec!["J'ai un chat".into()]));
    }

    #[test]
    fn blank_items_are_skipped() {
        let (defs, _) = run("<ol><li>cat</li><li> </li><li><span></span></li><li>tomcat</li></ol>");
        assert_eq!(defs, ExtractedField::List(vec!["cat".into(), "tomcat".into()]));
    }

    #[test]
    fn synonym_lines_are_not_examples() {
        let (_, examples) = run(
            r#"<ol><li>cat<dl><dd><span class="nyms synonym">Synonym: <a>matou</a></span></dd></dl></li></ol>"#,
        );
        assert_eq!(examples, ExtractedField::List(vec![]));
    }

    #[test]
    fn subsenses_are_stripped_from_definition() {
        let (defs, _) = run("<ol><li>feline<ol><li>house cat</li></ol></li></ol>");
        assert_eq!(defs, ExtractedField::List(vec!["feline".into()]));
    }

    #[test]
    fn subsense_examples_are_collected() {
        let (defs, examples) = run(
            "<ol><li>cat<dl><dd><i>Un chat noir.</i></dd></dl>\
             <ol><li>house cat<dl><dd><i>Le chat dort.</i></dd></dl></li></ol></li>\
             <li>tomcat</li></ol>",
        );
        assert_eq!(defs, ExtractedField::List(vec!["cat".into(), "tomcat".into()]));
        assert_eq!(
            examples,
            ExtractedField::List(vec!["Un chat noir.".into(), "Le chat dort.".into()])
        );
    }

    #[test]
    fn quotation_text_without_citation() {
        let (_, examples) = run(
            r#"<ol><li>cat
                <ul><li><span class="citation-whole"><span class="cited-source"><b>1857</b>, Charles Baudelaire, <cite>Les Fleurs du mal</cite></span>:</span>
                <dl><dd><span class="h-quotation"><span class="e-quotation">Viens, mon beau chat, sur mon cœur amoureux</span> ― <span class="e-translation">Come, my fine cat, to my loving heart</span></span></dd></dl></li>
                <li><span class="citation-whole"><span class="cited-source">2001, Anonymous, <cite>Untitled</cite></span></span></li></ul>
            </li></ol>"#,
        );
        assert_eq!(
            examples,
            ExtractedField::List(vec![
                "Viens, mon beau chat, sur mon cœur amoureux / Come, my fine cat, to my loving heart".into()
            ])
        );
    }

    #[test]
    fn no_list_is_empty() {
        let (defs, examples) = run("<p>nothing here</p>");
        assert_eq!(defs, ExtractedField::Empty);
        assert_eq!(examples, ExtractedField::Empty);
    }

    #[test]
    fn wrapped_list_is_found() {
        let (defs, _) = run("<div class=\"senses\"><ol><li>cat</li></ol></div>");
        assert_eq!(defs, ExtractedField::List(vec!["cat".into()]));
    }
}
