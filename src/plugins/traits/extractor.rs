use scraper::{ElementRef, Html, Selector};

use crate::price::{self, PriceMatch, PriceParser};

/// A fetched page as seen by an extractor.
pub struct Page<'a> {
    pub document: &'a Html,
    /// Body text, lower-cased once for phrase searches.
    pub content: &'a str,
    /// Final url after redirects.
    pub url: &'a str,
}

impl<'a> Page<'a> {
    pub fn select_one(&self, css: &str) -> Option<ElementRef<'a>> {
        let selector = match Selector::parse(css) {
            Ok(selector) => selector,
            Err(e) => {
                tracing::debug!("invalid selector '{}': {:?}", css, e);
                return None;
            }
        };
        self.document.select(&selector).next()
    }

    /// Trimmed text of the first element matching `css`.
    pub fn select_text(&self, css: &str) -> Option<String> {
        self.select_one(css)
            .map(|element| element.text().collect::<String>().trim().to_string())
    }

    pub fn has_phrase(&self, phrase: &str) -> bool {
        price::has_phrase(self.content, phrase)
    }
}

/// What an extractor found on a page. An observation is in stock exactly when
/// `alert_content` is non-empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub alert_subject: Option<String>,
    pub alert_content: Option<String>,
    pub price: Option<PriceMatch>,
    pub captcha: bool,
}

/// Site-specific page logic. Implementations must not fail: missing markup
/// degrades to "no price" or "not in stock".
pub trait Extractor: Send + Sync {
    /// Registry key of the site family, e.g. `amazon`.
    fn family(&self) -> &str;

    fn parse(&self, page: &Page<'_>, prices: &PriceParser) -> Extraction;
}
