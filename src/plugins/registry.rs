use std::collections::HashMap;

use super::alerters::{DiscordAlerter, EmailAlerter};
use super::extractors::{AmazonExtractor, GenericExtractor};
use super::traits::{Alerter, Extractor};
use crate::config::Target;
use crate::drivers::DriverKind;
use crate::utils::error::AppError;
use crate::Result;

pub type ExtractorFactory = fn(&Target) -> Box<dyn Extractor>;
pub type AlerterFactory = fn(&serde_json::Value) -> Result<Box<dyn Alerter>>;

struct ExtractorEntry {
    key: String,
    driver: DriverKind,
    factory: ExtractorFactory,
}

/// An extractor built for a target, with the driver it should be fetched through.
pub struct ResolvedExtractor {
    pub key: Option<String>,
    pub driver: DriverKind,
    pub extractor: Box<dyn Extractor>,
}

/// Maps host substrings to site extractors. Lookup is first match in registration order.
#[derive(Default)]
pub struct ExtractorRegistry {
    entries: Vec<ExtractorEntry>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("amazon", DriverKind::Browser, AmazonExtractor::boxed);
        registry
    }

    /// Re-registering a key replaces its entry but keeps its position.
    pub fn register(&mut self, key: &str, driver: DriverKind, factory: ExtractorFactory) {
        let entry = ExtractorEntry {
            key: key.to_string(),
            driver,
            factory,
        };
        match self.entries.iter_mut().find(|e| e.key == key) {
            Some(existing) => {
                tracing::debug!("replacing extractor \"{}\"", key);
                *existing = entry;
            }
            None => self.entries.push(entry),
        }
    }

    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.key.as_str()).collect()
    }

    pub fn resolve(&self, target: &Target) -> ResolvedExtractor {
        let netloc = target.netloc();
        match self.entries.iter().find(|e| netloc.contains(&e.key)) {
            Some(entry) => ResolvedExtractor {
                key: Some(entry.key.clone()),
                driver: entry.driver,
                extractor: (entry.factory)(target),
            },
            None => {
                tracing::warn!("using generic extractor for url {}", target);
                ResolvedExtractor {
                    key: None,
                    driver: DriverKind::Http,
                    extractor: GenericExtractor::boxed(target),
                }
            }
        }
    }
}

/// Alerter constructors keyed by type name.
#[derive(Default)]
pub struct AlerterRegistry {
    factories: HashMap<String, AlerterFactory>,
}

impl AlerterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("email", EmailAlerter::boxed);
        registry.register("discord", DiscordAlerter::boxed);
        registry
    }

    pub fn register(&mut self, alerter_type: &str, factory: AlerterFactory) {
        if self
            .factories
            .insert(alerter_type.to_string(), factory)
            .is_some()
        {
            tracing::debug!("replacing alerter \"{}\"", alerter_type);
        }
    }

    pub fn contains(&self, alerter_type: &str) -> bool {
        self.factories.contains_key(alerter_type)
    }

    pub fn create(&self, alerter_type: &str, config: &serde_json::Value) -> Result<Box<dyn Alerter>> {
        let factory = self.factories.get(alerter_type).ok_or_else(|| {
            AppError::Registry(format!(
                "the \"{}\" alerter type does not exist in the registry",
                alerter_type
            ))
        })?;
        factory(config)
    }
}
