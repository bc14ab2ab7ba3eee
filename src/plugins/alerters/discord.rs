use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::plugins::traits::Alerter;
use crate::utils::error::AppError;
use crate::Result;

const ALERTER_TYPE: &str = "discord";

/// Posts alerts to a Discord webhook.
pub struct DiscordAlerter {
    client: Client,
    webhook_url: String,
}

impl DiscordAlerter {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    pub fn from_json(config: &serde_json::Value) -> Result<Self> {
        let webhook_url = config
            .get("webhook_url")
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::alert(ALERTER_TYPE, "missing webhook_url"))?;
        Ok(Self::new(webhook_url))
    }

    pub fn boxed(config: &serde_json::Value) -> Result<Box<dyn Alerter>> {
        Ok(Box::new(Self::from_json(config)?))
    }

    fn payload(subject: &str, content: &str) -> serde_json::Value {
        json!({ "content": format!("{}\n{}", subject, content) })
    }
}

#[async_trait]
impl Alerter for DiscordAlerter {
    fn alerter_type(&self) -> &str {
        ALERTER_TYPE
    }

    async fn send(&self, subject: &str, content: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&Self::payload(subject, content))
            .send()
            .await
            .map_err(|e| AppError::alert(ALERTER_TYPE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::alert(
                ALERTER_TYPE,
                format!("webhook returned {}", status),
            ));
        }
        Ok(())
    }
}
