// Alerter plugin implementations
pub mod discord;
pub mod email;

pub use discord::DiscordAlerter;
pub use email::{EmailAlerter, EmailConfig};

use async_trait::async_trait;

use super::registry::AlerterRegistry;
use super::traits::{AlertDispatcher, Alerter};
use crate::utils::error::AppError;
use crate::Result;

/// Sends every alert through each configured alerter in turn.
pub struct AlertEngine {
    alerters: Vec<Box<dyn Alerter>>,
}

impl AlertEngine {
    pub fn new(alerters: Vec<Box<dyn Alerter>>) -> Result<Self> {
        if alerters.is_empty() {
            return Err(AppError::Validation("no alerters loaded".into()));
        }
        for alerter in &alerters {
            tracing::info!("loaded {} alerter", alerter.alerter_type());
        }
        Ok(Self { alerters })
    }

    /// Builds one alerter per `(type, settings)` pair through the registry.
    pub fn from_settings<I>(registry: &AlerterRegistry, settings: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let alerters = settings
            .into_iter()
            .map(|(alerter_type, config)| registry.create(&alerter_type, &config))
            .collect::<Result<Vec<_>>>()?;
        Self::new(alerters)
    }

    pub fn alerter_types(&self) -> Vec<&str> {
        self.alerters.iter().map(|a| a.alerter_type()).collect()
    }
}

#[async_trait]
impl AlertDispatcher for AlertEngine {
    async fn dispatch(&self, subject: &str, content: &str) {
        for alerter in &self.alerters {
            if let Err(e) = alerter.send(subject, content).await {
                tracing::error!("{} alerter failed: {}", alerter.alerter_type(), e);
            }
        }
    }
}
