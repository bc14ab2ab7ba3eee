use crate::config::Target;
use crate::plugins::traits::{Extraction, Extractor, Page};
use crate::price::{contains_price, PriceParser};

const TITLE: &str = "h1#title > span#productTitle";
const BUYBOX_PRICE: &str = "div.a-section > span#price_inside_buybox";
const OUR_PRICE: &str = "div#price span#priceblock_ourprice";
const ADD_TO_CART: &str = r"span.a-button-inner > span#submit\.add-to-cart-announce";
const CAPTCHA_FORM: &str = r#"form[action="/errors/validateCaptcha"]"#;

/// Amazon product pages. The item is actionable only when the add-to-cart
/// button is rendered; the title and buy-box price are best-effort.
#[derive(Debug, Default)]
pub struct AmazonExtractor;

impl AmazonExtractor {
    pub fn boxed(_target: &Target) -> Box<dyn Extractor> {
        Box::new(AmazonExtractor)
    }
}

impl Extractor for AmazonExtractor {
    fn family(&self) -> &str {
        "amazon"
    }

    fn parse(&self, page: &Page<'_>, prices: &PriceParser) -> Extraction {
        let mut extraction = Extraction {
            captcha: page.select_one(CAPTCHA_FORM).is_some(),
            ..Extraction::default()
        };

        let mut alert_subject = "In Stock".to_string();
        let mut alert_content = String::new();

        match page.select_text(TITLE) {
            Some(title) => {
                alert_content.push_str(&title);
                alert_content.push('\n');
            }
            None => tracing::warn!("missing title: {}", page.url),
        }

        let price_text = page
            .select_text(BUYBOX_PRICE)
            .or_else(|| page.select_text(OUR_PRICE));
        extraction.price = prices.parse(price_text.as_deref());
        // The subject shows the tag text even when it does not convert to a number.
        if let Some(text) = price_text.as_deref().map(str::trim) {
            if contains_price(text) {
                alert_subject = format!("In Stock for {}", text);
            }
        }

        if page.select_one(ADD_TO_CART).is_some() {
            extraction.alert_subject = Some(alert_subject);
            extraction.alert_content = Some(format!("{}\n{}", alert_content.trim(), page.url));
        }

        extraction
    }
}
