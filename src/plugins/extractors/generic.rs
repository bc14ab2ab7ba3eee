use crate::config::Target;
use crate::plugins::traits::{Extraction, Extractor, Page};
use crate::price::PriceParser;

const IN_STOCK_PHRASES: [&str; 2] = ["add to cart", "add to basket"];

/// Fallback for sites without their own extractor. Not perfect but usually good
/// enough: a page offering to add the item to a cart or basket is in stock. Never
/// extracts a price.
#[derive(Debug, Default)]
pub struct GenericExtractor;

impl GenericExtractor {
    pub fn boxed(_target: &Target) -> Box<dyn Extractor> {
        Box::new(GenericExtractor)
    }
}

impl Extractor for GenericExtractor {
    fn family(&self) -> &str {
        "generic"
    }

    fn parse(&self, page: &Page<'_>, _prices: &PriceParser) -> Extraction {
        let mut extraction = Extraction::default();
        if IN_STOCK_PHRASES.iter().any(|phrase| page.has_phrase(phrase)) {
            extraction.alert_subject = Some("In Stock".to_string());
            extraction.alert_content = Some(page.url.to_string());
        }
        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extract(content: &str) -> Extraction {
        let document = Html::parse_document("<html><body></body></html>");
        let page = Page {
            document: &document,
            content,
            url: "https://shop.example.com/item",
        };
        GenericExtractor.parse(&page, &PriceParser::default())
    }

    #[test]
    fn test_add_to_cart_is_in_stock() {
        let extraction = extract("widget $10 add to cart");
        assert_eq!(extraction.alert_subject.as_deref(), Some("In Stock"));
        assert_eq!(
            extraction.alert_content.as_deref(),
            Some("https://shop.example.com/item")
        );
        assert_eq!(extraction.price, None);
    }

    #[test]
    fn test_add_to_basket_is_in_stock() {
        assert!(extract("add to basket").alert_content.is_some());
    }

    #[test]
    fn test_sold_out_page() {
        let extraction = extract("sold out, check back later");
        assert_eq!(extraction, Extraction::default());
    }
}
