//! Price extraction from free text.
//!
//! A price is the first run of `[0-9,.]` characters in the candidate text. A run
//! ending in `,DD` is read as a European amount (`1.234,56`); anything else is
//! read under the configured [`NumericLocale`], never the process locale.

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

static PRICE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9,.]+").expect("price pattern is a valid regex"));

static COMMA_DECIMAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*,\d{2}$").expect("comma pattern is a valid regex"));

/// Numeric conventions used when a price is not in the `…,DD` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NumericLocale {
    #[default]
    #[serde(rename = "en_US")]
    EnUs,
    #[serde(rename = "de_DE")]
    DeDe,
    #[serde(rename = "fr_FR")]
    FrFr,
    #[serde(rename = "C")]
    Posix,
}

impl NumericLocale {
    pub fn decimal_point(&self) -> char {
        match self {
            NumericLocale::EnUs | NumericLocale::Posix => '.',
            NumericLocale::DeDe | NumericLocale::FrFr => ',',
        }
    }

    /// French groups with a (narrow) space, which never appears in a matched run.
    pub fn thousands_separator(&self) -> Option<char> {
        match self {
            NumericLocale::EnUs => Some(','),
            NumericLocale::DeDe => Some('.'),
            NumericLocale::FrFr | NumericLocale::Posix => None,
        }
    }

    /// Rewrites a localized number into the `1234.56` form.
    pub fn delocalize(&self, number: &str) -> String {
        let decimal_point = self.decimal_point();
        let thousands = self.thousands_separator();
        number
            .chars()
            .filter(|c| Some(*c) != thousands)
            .map(|c| if c == decimal_point { '.' } else { c })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatch {
    pub value: f64,
    /// The `[0-9,.]+` run the value was read from.
    pub matched: String,
    /// The trimmed candidate text, used in alert subjects.
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PriceParser {
    locale: NumericLocale,
}

impl PriceParser {
    pub fn new(locale: NumericLocale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> NumericLocale {
        self.locale
    }

    /// Never fails: anything unparseable is logged and reported as no price.
    pub fn parse(&self, candidate: Option<&str>) -> Option<PriceMatch> {
        let text = candidate?.trim();
        if text.is_empty() {
            return None;
        }

        let Some(found) = PRICE_PATTERN.find(text) else {
            tracing::warn!("unable to find price in string: \"{}\"", text);
            return None;
        };
        let matched = found.as_str();

        let normalized = if COMMA_DECIMAL_PATTERN.is_match(matched) {
            european_to_plain(matched)
        } else {
            self.locale.delocalize(matched)
        };

        match to_float(&normalized) {
            Some(value) => Some(PriceMatch {
                value,
                matched: matched.to_string(),
                text: text.to_string(),
            }),
            None => {
                tracing::warn!(
                    "unable to convert \"{}\" to float under {:?} conventions",
                    text,
                    self.locale
                );
                None
            }
        }
    }
}

fn european_to_plain(matched: &str) -> String {
    match matched.rfind(',') {
        Some(comma) => {
            let whole: String = matched[..comma]
                .chars()
                .filter(|c| !matches!(c, '.' | ','))
                .collect();
            format!("{}.{}", whole, &matched[comma + 1..])
        }
        None => matched.to_string(),
    }
}

fn to_float(normalized: &str) -> Option<f64> {
    if !normalized.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(normalized).ok()?.to_f64()
}

/// True when the text holds a `[0-9,.]` run, whether or not it converts to a number.
pub fn contains_price(text: &str) -> bool {
    PRICE_PATTERN.is_match(text)
}

/// Case-insensitive containment against already lower-cased page text.
pub fn has_phrase(lowercase_content: &str, phrase: &str) -> bool {
    lowercase_content.contains(&phrase.to_lowercase())
}
