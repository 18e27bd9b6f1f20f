//! Selector-fallback extraction over parsed markup.
//!
//! Pages change layout without notice, so every field is described by an
//! ordered list of [`Locator`]s. The first locator that yields a non-empty
//! value wins; when none does, the field is absent. Nothing here returns an
//! error.

mod decode;
mod locator;

use scraper::{ElementRef, Html, Selector};

pub use decode::{decode_count, decode_date};
pub use locator::{ExtractKind, Locator};

/// Parses the CSS form of a locator. XPath and unparsable selectors are
/// skipped with a log line.
fn selector_for(locator: &Locator) -> Option<Selector> {
    let css = locator.to_css()?;
    let parsed = match Selector::parse(&css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            log::warn!("Skipping unparsable selector '{}': {}", css, e);
            None
        }
    };
    parsed
}

/// Reads `kind` from an element; empty values count as absent.
pub fn read_value(element: ElementRef<'_>, kind: ExtractKind) -> Option<String> {
    let value = match kind {
        ExtractKind::Text => element
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" "),
        ExtractKind::Attribute(name) => element.value().attr(name)?.trim().to_string(),
    };
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// All elements under `root` matched by the first locator that matches any.
pub fn find_all<'a>(root: ElementRef<'a>, locators: &[Locator]) -> Vec<ElementRef<'a>> {
    for selector in locators.iter().filter_map(selector_for) {
        let found: Vec<ElementRef<'a>> = root.select(&selector).collect();
        if !found.is_empty() {
            return found;
        }
    }
    Vec::new()
}

/// First non-empty value under `root` that satisfies `accept`.
///
/// Locators are tried in order; within one locator every matched element is
/// considered before moving on.
pub fn extract_where<F>(
    root: ElementRef<'_>,
    locators: &[Locator],
    kind: ExtractKind,
    accept: F,
) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    for selector in locators.iter().filter_map(selector_for) {
        for element in root.select(&selector) {
            if let Some(value) = read_value(element, kind) {
                if accept(&value) {
                    return Some(value);
                }
            }
        }
    }
    None
}

/// First non-empty value under `root`.
pub fn extract(root: ElementRef<'_>, locators: &[Locator], kind: ExtractKind) -> Option<String> {
    extract_where(root, locators, kind, |_| true)
}

/// [`extract`] over a whole document.
pub fn extract_from(document: &Html, locators: &[Locator], kind: ExtractKind) -> Option<String> {
    extract(document.root_element(), locators, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="info-zone">
            <h2 class="name">  </h2>
            <h2 class="title">Supernova</h2>
            <p class="artist"><a href="/artist/1">aespa</a></p>
          </div>
          <span class="count" data-value=" 1.5만 "></span>
          <span class="count">12</span>
          <span class="count">조회수 99회</span>
        </body></html>
    "#;

    #[test]
    fn test_extract_falls_through_empty_values() {
        let doc = Html::parse_document(PAGE);
        let value = extract_from(
            &doc,
            &[Locator::Css("h2.name"), Locator::Css("h2.title")],
            ExtractKind::Text,
        );
        assert_eq!(value.as_deref(), Some("Supernova"));
    }

    #[test]
    fn test_extract_missing_everywhere() {
        let doc = Html::parse_document(PAGE);
        let value = extract_from(
            &doc,
            &[Locator::Css("h1.nothing"), Locator::XPath("//h1")],
            ExtractKind::Text,
        );
        assert_eq!(value, None);
    }

    #[test]
    fn test_extract_tag_class_and_attribute() {
        let doc = Html::parse_document(PAGE);
        let artist = extract_from(
            &doc,
            &[Locator::TagClass {
                tag: "p",
                class: "artist",
            }],
            ExtractKind::Text,
        );
        assert_eq!(artist.as_deref(), Some("aespa"));

        let raw = extract_from(
            &doc,
            &[Locator::Css("span.count")],
            ExtractKind::Attribute("data-value"),
        );
        assert_eq!(raw.as_deref(), Some("1.5만"));
    }

    #[test]
    fn test_extract_where_filters_values() {
        let doc = Html::parse_document(PAGE);
        let value = extract_where(
            doc.root_element(),
            &[Locator::Css("span.count")],
            ExtractKind::Text,
            |v| v.contains('회'),
        );
        assert_eq!(value.as_deref(), Some("조회수 99회"));
    }

    #[test]
    fn test_invalid_selector_is_skipped() {
        let doc = Html::parse_document(PAGE);
        let value = extract_from(
            &doc,
            &[Locator::Css("h2[[["), Locator::Css("h2.title")],
            ExtractKind::Text,
        );
        assert_eq!(value.as_deref(), Some("Supernova"));
    }

    #[test]
    fn test_find_all_uses_first_matching_locator() {
        let doc = Html::parse_document(PAGE);
        let rows = find_all(
            doc.root_element(),
            &[Locator::Css("tr.none"), Locator::Css("span.count")],
        );
        assert_eq!(rows.len(), 3);
        assert!(find_all(doc.root_element(), &[Locator::Css("tr.none")]).is_empty());
    }

    #[test]
    fn test_earlier_locator_wins_when_several_match() {
        let doc = Html::parse_document(PAGE);
        let value = extract_from(
            &doc,
            &[
                Locator::Css("p.artist a"),
                Locator::Css("h2.title"),
                Locator::Css("span.count"),
            ],
            ExtractKind::Text,
        );
        assert_eq!(value.as_deref(), Some("aespa"));

        let reordered = extract_from(
            &doc,
            &[Locator::Css("h2.title"), Locator::Css("p.artist a")],
            ExtractKind::Text,
        );
        assert_eq!(reordered.as_deref(), Some("Supernova"));
    }
}
