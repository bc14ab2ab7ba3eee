//! What to do with one observation: alert, log, or stop the process.
//!
//! A price drop while already in stock alerts; so does a first appearance in
//! stock, whatever the price direction, since there is nothing to compare with.
//! An unknown price never counts as a change.

use tracing::Level;

use crate::observation::Observation;

/// Shown by anti-bot interstitials; seeing it while out of stock means the
/// target will only keep serving challenges.
pub const HUMAN_VERIFICATION_PHRASE: &str = "are you a human";

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Alert {
        reason: String,
        subject: String,
        content: String,
    },
    Log {
        level: Level,
        message: String,
    },
    /// A human has to answer a challenge before scraping can continue.
    Fatal { url: String },
}

impl Decision {
    fn info(message: impl Into<String>) -> Self {
        Decision::Log {
            level: Level::INFO,
            message: message.into(),
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Decision::Log {
            level: Level::WARN,
            message: message.into(),
        }
    }

    fn alert(observation: &Observation, reason: String) -> Self {
        Decision::Alert {
            reason,
            subject: observation.alert_subject().unwrap_or_default().to_string(),
            content: observation.alert_content().unwrap_or_default().to_string(),
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Decision::Alert { .. })
    }
}

/// Evaluated top to bottom; the first matching row wins.
pub fn decide(observation: &Observation, max_price: Option<f64>) -> Decision {
    let affordable = |price: f64| max_price.is_none_or(|max| price <= max);

    if observation.captcha() {
        return Decision::warn("access denied, got a CAPTCHA");
    }
    if observation.forbidden() {
        return Decision::warn("access denied, got HTTP status code 403 (forbidden)");
    }

    let current = observation.price();
    let last = observation.last_price();

    match (observation.in_stock(), observation.previously_in_stock()) {
        (true, true) => match (current, last) {
            (Some(current), Some(last)) if current == last => {
                Decision::info("still in stock at the same price")
            }
            (Some(current), Some(last)) if current < last => {
                if affordable(current) {
                    Decision::alert(observation, format!("now in stock at {}!", current))
                } else {
                    Decision::info(format!("now in stock at {}... still too expensive", current))
                }
            }
            (Some(current), Some(_)) => Decision::info(format!(
                "now in stock at {}... more expensive than before :(",
                current
            )),
            _ => Decision::info("still in stock"),
        },
        (true, false) => match current {
            None => Decision::alert(observation, "now in stock!".to_string()),
            Some(current) if affordable(current) => {
                Decision::alert(observation, format!("now in stock at {}!", current))
            }
            Some(current) => Decision::info(format!("now in stock at {}... too expensive", current)),
        },
        (false, _) if observation.has_phrase(HUMAN_VERIFICATION_PHRASE) => Decision::Fatal {
            url: observation.url().to_string(),
        },
        (false, _) => Decision::info("not in stock"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::traits::Extraction;
    use crate::price::PriceMatch;
    use rstest::rstest;

    fn price(value: f64) -> PriceMatch {
        PriceMatch {
            value,
            matched: value.to_string(),
            text: format!("${}", value),
        }
    }

    fn extraction(in_stock: bool, value: Option<f64>) -> Extraction {
        Extraction {
            alert_subject: in_stock.then(|| "In Stock".to_string()),
            alert_content: in_stock.then(|| "https://shop.example.com/item".to_string()),
            price: value.map(price),
            captcha: false,
        }
    }

    /// Builds the observation that follows one with the given stock/price.
    fn transition(
        previous: Option<(bool, Option<f64>)>,
        current: (bool, Option<f64>),
    ) -> Observation {
        let previous = previous.map(|(in_stock, value)| {
            Observation::new(
                extraction(in_stock, value),
                None,
                "https://shop.example.com/item".into(),
                String::new(),
                false,
            )
        });
        Observation::new(
            extraction(current.0, current.1),
            previous.as_ref(),
            "https://shop.example.com/item".into(),
            String::new(),
            false,
        )
    }

    #[rstest]
    #[case::price_drop_under_ceiling(Some((true, Some(50.0))), (true, Some(40.0)), Some(45.0), true)]
    #[case::price_drop_over_ceiling(Some((true, Some(50.0))), (true, Some(40.0)), Some(30.0), false)]
    #[case::price_drop_no_ceiling(Some((true, Some(50.0))), (true, Some(40.0)), None, true)]
    #[case::same_price(Some((true, Some(50.0))), (true, Some(50.0)), None, false)]
    #[case::price_rise(Some((true, Some(40.0))), (true, Some(50.0)), None, false)]
    #[case::known_to_unknown(Some((true, Some(50.0))), (true, None), None, false)]
    #[case::unknown_to_known(Some((true, None)), (true, Some(10.0)), None, false)]
    #[case::first_appearance_no_price(None, (true, None), Some(1.0), true)]
    #[case::restock_no_price(Some((false, None)), (true, None), Some(1.0), true)]
    #[case::restock_affordable(Some((false, None)), (true, Some(99.0)), Some(100.0), true)]
    #[case::restock_at_ceiling(Some((false, None)), (true, Some(100.0)), Some(100.0), true)]
    #[case::restock_too_expensive(Some((false, None)), (true, Some(101.0)), Some(100.0), false)]
    #[case::still_out(Some((false, None)), (false, None), None, false)]
    #[case::went_out(Some((true, Some(5.0))), (false, None), None, false)]
    fn test_alert_table(
        #[case] previous: Option<(bool, Option<f64>)>,
        #[case] current: (bool, Option<f64>),
        #[case] max_price: Option<f64>,
        #[case] alerts: bool,
    ) {
        let observation = transition(previous, current);
        assert_eq!(decide(&observation, max_price).is_alert(), alerts);
    }

    #[test]
    fn test_price_drop_alert_carries_payload() {
        let observation = transition(Some((true, Some(50.0))), (true, Some(40.0)));
        assert_eq!(
            decide(&observation, Some(45.0)),
            Decision::Alert {
                reason: "now in stock at 40!".to_string(),
                subject: "In Stock".to_string(),
                content: "https://shop.example.com/item".to_string(),
            }
        );
    }

    #[test]
    fn test_log_messages() {
        let still = transition(Some((true, None)), (true, None));
        assert_eq!(decide(&still, None), Decision::info("still in stock"));

        let same = transition(Some((true, Some(3.5))), (true, Some(3.5)));
        assert_eq!(decide(&same, None), Decision::info("still in stock at the same price"));

        let dearer = transition(Some((true, Some(3.0))), (true, Some(3.5)));
        assert_eq!(
            decide(&dearer, None),
            Decision::info("now in stock at 3.5... more expensive than before :(")
        );

        let out = transition(None, (false, None));
        assert_eq!(decide(&out, None), Decision::info("not in stock"));
    }

    #[test]
    fn test_captcha_wins_over_stock() {
        let observation = Observation::new(
            Extraction {
                captcha: true,
                ..extraction(true, None)
            },
            None,
            "u".into(),
            String::new(),
            false,
        );
        assert_eq!(decide(&observation, None), Decision::warn("access denied, got a CAPTCHA"));
    }

    #[test]
    fn test_forbidden_is_logged() {
        let observation = Observation::new(
            Extraction::default(),
            None,
            "u".into(),
            "are you a human".into(),
            true,
        );
        assert_eq!(
            decide(&observation, None),
            Decision::warn("access denied, got HTTP status code 403 (forbidden)")
        );
    }

    #[test]
    fn test_human_verification_is_fatal_only_when_out_of_stock() {
        let challenged = Observation::new(
            Extraction::default(),
            None,
            "https://www.amazon.com/dp/X".into(),
            "sorry! are you a human? type the characters".into(),
            false,
        );
        assert_eq!(
            decide(&challenged, None),
            Decision::Fatal {
                url: "https://www.amazon.com/dp/X".to_string()
            }
        );

        let in_stock = Observation::new(
            extraction(true, None),
            None,
            "https://www.amazon.com/dp/X".into(),
            "are you a human? add to cart".into(),
            false,
        );
        assert!(decide(&in_stock, None).is_alert());
    }
}
