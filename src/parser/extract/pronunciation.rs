use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::Scope;
use crate::parser::document::{select_with_self, text_of};
use crate::record::ExtractedField;

static IPA_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".IPA").unwrap());
static MEDIA_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], source[src], audio[src]").unwrap());

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:/[^/]+/|\[[^\]]+\])$").unwrap());
static LABELED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:IPA|pronunciation)\b[^/\[\n]{0,24}(/[^/\n]+/|\[[^\]\n]+\])").unwrap()
});

const AUDIO_EXTENSIONS: &[&str] = &["ogg", "oga", "opus", "mp3", "wav", "flac", "m4a"];
const MEDIA_NAMESPACES: &[&str] = &["Media:", "Special:FilePath/"];

/// First IPA transcription in the block, else in the nearest Pronunciation section.
pub fn ipa(scope: &Scope) -> ExtractedField {
    let found = find_ipa(scope.elements()).or_else(|| {
        scope
            .pronunciation()
            .and_then(|range| find_ipa(scope.elements_in(range)))
    });
    match found {
        Some(ipa) => ExtractedField::Text(ipa),
        None => ExtractedField::Empty,
    }
}

fn find_ipa<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    let elements: Vec<_> = elements.collect();

    let marked = elements.iter().find_map(|el| {
        select_with_self(*el, &IPA_SEL)
            .map(text_of)
            .find(|t| BRACKETED_RE.is_match(t))
    });
    if marked.is_some() {
        return marked;
    }

    elements.iter().find_map(|el| {
        LABELED_RE
            .captures(&text_of(*el))
            .map(|caps| caps[1].to_string())
    })
}

/// First audio link in the block, else in the nearest Pronunciation section.
pub fn audio(scope: &Scope) -> ExtractedField {
    let found = find_audio(scope.elements()).or_else(|| {
        scope
            .pronunciation()
            .and_then(|range| find_audio(scope.elements_in(range)))
    });
    match found {
        Some(target) => ExtractedField::Link(resolve_url(&target, &scope.options.base_url)),
        None => ExtractedField::Empty,
    }
}

fn find_audio<'a>(mut elements: impl Iterator<Item = ElementRef<'a>>) -> Option<String> {
    elements.find_map(|el| {
        select_with_self(el, &MEDIA_SEL)
            .filter_map(|media| {
                let value = media.value();
                value.attr("href").or_else(|| value.attr("src"))
            })
            .find(|target| is_audio(target))
            .map(str::to_string)
    })
}

pub fn is_audio(target: &str) -> bool {
    let path = target.split(['?', '#']).next().unwrap_or_default();
    let extension = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    AUDIO_EXTENSIONS.contains(&extension.as_str())
        || MEDIA_NAMESPACES.iter().any(|ns| path.contains(ns))
}

/// Make a page-relative reference absolute against `base_url`.
pub fn resolve_url(target: &str, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if target.starts_with("https://") || target.starts_with("http://") {
        target.to_string()
    } else if let Some(rest) = target.strip_prefix("//") {
        format!("https://{}", rest)
    } else if target.starts_with('/') {
        format!("{}{}", base, target)
    } else {
        format!("{}/wiki/{}", base, target.trim_start_matches("./"))
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::extract::tests::with_scope;

    fn page(pronunciation: &str, block: &str) -> String {
        format!(
            "<h2>French</h2><h3>Pronunciation</h3>{}<h3>Noun</h3><p>chat</p>{}<ol><li>cat</li></ol>",
            pronunciation, block
        )
    }

    #[test]
    fn ipa_span_in_block() {
        let html = page("", r#"<p>IPA: <span class="IPA">/ʃa/</span></p>"#);
        assert_eq!(with_scope(&html, "French", None, ipa), ExtractedField::Text("/ʃa/".into()));
    }

    #[test]
    fn ipa_falls_back_to_pronunciation_section() {
        let html = page(
            r#"<ul><li><a href="/wiki/Appendix:French_pronunciation">IPA</a><sup>(key)</sup>: <span class="IPA">[ʃa]</span></li></ul>"#,
            "",
        );
        assert_eq!(with_scope(&html, "French", None, ipa), ExtractedField::Text("[ʃa]".into()));
    }

    #[test]
    fn ipa_from_labeled_text() {
        let html = page("", "<p>Pronunciation: /ʃa/</p>");
        assert_eq!(with_scope(&html, "French", None, ipa), ExtractedField::Text("/ʃa/".into()));
    }

    #[test]
    fn unbracketed_ipa_class_is_ignored() {
        let html = page("", r#"<p><span class="IPA">ʃa</span></p>"#);
        assert_eq!(with_scope(&html, "French", None, ipa), ExtractedField::Empty);
    }

    #[test]
    fn audio_source_is_resolved() {
        let html = page(
            r#"<table class="audiotable"><tr><td>Audio</td><td><audio><source src="//upload.wikimedia.org/wikipedia/commons/3/3d/Fr-chat.ogg" type="audio/ogg"></audio></td></tr></table>"#,
            "",
        );
        assert_eq!(
            with_scope(&html, "French", None, audio),
            ExtractedField::Link("https://upload.wikimedia.org/wikipedia/commons/3/3d/Fr-chat.ogg".into())
        );
    }

    #[test]
    fn first_audio_link_wins_and_images_are_skipped() {
        let html = page(
            "",
            r#"<p><a href="/wiki/File:Cat.jpg">img</a> <a href="/wiki/File:Fr-chat.ogg">audio</a> <a href="/wiki/File:Fr-chat-2.mp3">again</a></p>"#,
        );
        assert_eq!(
            with_scope(&html, "French", None, audio),
            ExtractedField::Link("https://en.wiktionary.org/wiki/File:Fr-chat.ogg".into())
        );
    }

    #[test]
    fn no_audio_is_empty() {
        let html = page("<p>nothing</p>", "<p><a href=\"/wiki/cat\">cat</a></p>");
        assert_eq!(with_scope(&html, "French", None, audio), ExtractedField::Empty);
    }

    #[test]
    fn audio_detection() {
        assert!(is_audio("//upload.wikimedia.org/a/b/De-Katze.OGG"));
        assert!(is_audio("/wiki/Special:FilePath/LL-Q150_(fra)-chat.wav?download"));
        assert!(is_audio("./Media:Fr-chat"));
        assert!(!is_audio("/wiki/File:Cat.jpg"));
        assert!(!is_audio("/wiki/chat"));
    }

    #[test]
    fn url_resolution() {
        let base = "https://en.wiktionary.org/";
        assert_eq!(resolve_url("https://x.org/a.ogg", base), "https://x.org/a.ogg");
        assert_eq!(resolve_url("//x.org/a.ogg", base), "https://x.org/a.ogg");
        assert_eq!(
            resolve_url("/wiki/File:a.ogg", base),
            "https://en.wiktionary.org/wiki/File:a.ogg"
        );
        assert_eq!(
            resolve_url("./File:a.ogg", base),
            "https://en.wiktionary.org/wiki/File:a.ogg"
        );
    }
}
