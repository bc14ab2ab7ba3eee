use scraper::{Html, Selector};

use crate::drivers::FetchResponse;
use crate::plugins::traits::{Extraction, Extractor, Page};
use crate::price::{self, PriceParser};

const FORBIDDEN: u16 = 403;

/// The outcome of one fetch, read against the previous outcome for the same
/// target. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    in_stock: bool,
    price: Option<f64>,
    price_text: Option<String>,
    captcha: bool,
    forbidden: bool,
    alert_subject: Option<String>,
    alert_content: Option<String>,
    previously_in_stock: bool,
    last_price: Option<f64>,
    url: String,
    content: String,
}

impl Observation {
    /// A forbidden response skips extraction entirely.
    pub fn from_response(
        response: &FetchResponse,
        extractor: &dyn Extractor,
        prices: &PriceParser,
        previous: Option<&Observation>,
    ) -> Self {
        let document = Html::parse_document(&response.text);
        let content = body_text(&document).to_lowercase();
        let forbidden = response.status_code == Some(FORBIDDEN);

        let extraction = if forbidden {
            Extraction::default()
        } else {
            let page = Page {
                document: &document,
                content: &content,
                url: &response.final_url,
            };
            extractor.parse(&page, prices)
        };

        Self::new(
            extraction,
            previous,
            response.final_url.clone(),
            content,
            forbidden,
        )
    }

    /// `content` is the lower-cased page text used for phrase checks.
    pub fn new(
        extraction: Extraction,
        previous: Option<&Observation>,
        url: String,
        content: String,
        forbidden: bool,
    ) -> Self {
        let in_stock = extraction
            .alert_content
            .as_deref()
            .is_some_and(|c| !c.is_empty());

        Self {
            in_stock,
            price: extraction.price.as_ref().map(|p| p.value),
            price_text: extraction.price.map(|p| p.text),
            captcha: extraction.captcha,
            forbidden,
            alert_subject: extraction.alert_subject,
            alert_content: extraction.alert_content,
            previously_in_stock: previous.is_some_and(|p| p.in_stock),
            last_price: previous.and_then(|p| p.price),
            url,
            content,
        }
    }

    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn price_text(&self) -> Option<&str> {
        self.price_text.as_deref()
    }

    pub fn captcha(&self) -> bool {
        self.captcha
    }

    pub fn forbidden(&self) -> bool {
        self.forbidden
    }

    pub fn alert_subject(&self) -> Option<&str> {
        self.alert_subject.as_deref()
    }

    pub fn alert_content(&self) -> Option<&str> {
        self.alert_content.as_deref()
    }

    pub fn previously_in_stock(&self) -> bool {
        self.previously_in_stock
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn has_phrase(&self, phrase: &str) -> bool {
        price::has_phrase(&self.content, phrase)
    }
}

fn body_text(document: &Html) -> String {
    match Selector::parse("body") {
        Ok(body) => document
            .select(&body)
            .next()
            .map(|b| b.text().collect())
            .unwrap_or_default(),
        Err(_) => document.root_element().text().collect(),
    }
}
