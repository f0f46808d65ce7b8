//! Narrow HTML query capability.
//!
//! The pipeline only needs to select elements, read attributes and collect
//! text. [`Document`] and [`Element`] describe exactly that, and
//! [`HtmlDocument`] backs them with `scraper`. Parsing is best-effort: on
//! malformed markup a selection may pick up unrelated elements, and callers
//! are expected to filter.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};

/// A node that can be queried further.
pub trait Element: Sized {
    /// Value of an attribute, if present.
    fn attr(&self, name: &str) -> Option<String>;

    /// Concatenated text of the node and its descendants.
    fn text(&self) -> String;

    /// Descendants matching a CSS selector, in document order.
    fn select(&self, css: &str) -> Result<Vec<Self>>;
}

/// A parsed page.
pub trait Document {
    type Element<'a>: Element
    where
        Self: 'a;

    /// Elements matching a CSS selector, in document order.
    fn select(&self, css: &str) -> Result<Vec<Self::Element<'_>>>;

    /// Elements with the given tag and class attribute.
    fn find_all(&self, tag: &str, class: &str) -> Result<Vec<Self::Element<'_>>> {
        self.select(&format!("{tag}.{class}"))
    }

    /// Trimmed text of the first element matching `css`, if non-empty.
    fn title(&self, css: &str) -> Result<Option<String>> {
        Ok(self
            .select(css)?
            .first()
            .map(|el| el.text().trim().to_string())
            .filter(|title| !title.is_empty()))
    }
}

/// `scraper`-backed document.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }
}

impl Document for HtmlDocument {
    type Element<'a> = ElementRef<'a>;

    fn select(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).collect())
    }
}

impl Element for ElementRef<'_> {
    fn attr(&self, name: &str) -> Option<String> {
        self.value().attr(name).map(str::to_string)
    }

    fn text(&self) -> String {
        ElementRef::text(self).collect()
    }

    fn select(&self, css: &str) -> Result<Vec<Self>> {
        let selector = parse_selector(css)?;
        Ok(ElementRef::select(self, &selector).collect())
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
