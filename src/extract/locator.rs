//! Locator descriptions shared by static-markup extraction and the browser.

use std::fmt;

/// One way of finding an element.
///
/// `TagClass` matches every class in `class` (space separated). `XPath` is only
/// understood by a live browser session; static extraction skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Css(&'static str),
    TagClass {
        tag: &'static str,
        class: &'static str,
    },
    TagId {
        tag: &'static str,
        id: &'static str,
    },
    XPath(&'static str),
}

impl Locator {
    /// CSS form of the locator, `None` for XPath.
    pub fn to_css(&self) -> Option<String> {
        match self {
            Locator::Css(css) => Some((*css).to_string()),
            Locator::TagClass { tag, class } => {
                let classes: Vec<&str> = class.split_whitespace().collect();
                if classes.is_empty() {
                    Some((*tag).to_string())
                } else {
                    Some(format!("{}.{}", tag, classes.join(".")))
                }
            }
            Locator::TagId { tag, id } => Some(format!("{}#{}", tag, id)),
            Locator::XPath(_) => None,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(path) => write!(f, "xpath:{}", path),
            other => write!(f, "css:{}", other.to_css().unwrap_or_default()),
        }
    }
}

/// What to read from a located element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractKind {
    /// Visible text, whitespace collapsed.
    Text,
    /// Value of the named attribute, trimmed.
    Attribute(&'static str),
}
