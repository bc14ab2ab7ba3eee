use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::plugins::traits::Alerter;
use crate::utils::error::AppError;
use crate::Result;

const ALERTER_TYPE: &str = "email";
const SMTP_PORT: u16 = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct EmailConfig {
    pub sender: String,
    pub recipients: Vec<String>,
    pub relay: String,
    pub password: Option<String>,
}

impl EmailConfig {
    /// `recipients` may be a single address or a list.
    pub fn from_json(config: &serde_json::Value) -> Result<Self> {
        let field = |name: &str| {
            config
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let missing = |name: &str| AppError::alert(ALERTER_TYPE, format!("missing {}", name));

        let sender = field("sender").ok_or_else(|| missing("sender"))?;
        let relay = field("relay").ok_or_else(|| missing("relay"))?;
        let recipients = match config.get("recipients") {
            Some(serde_json::Value::String(one)) => vec![one.clone()],
            Some(serde_json::Value::Array(many)) => many
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        if recipients.is_empty() {
            return Err(missing("recipients"));
        }

        Ok(Self {
            sender,
            recipients,
            relay,
            password: field("password").filter(|p| !p.is_empty()),
        })
    }
}

/// Plain-text mail through an SMTP relay.
pub struct EmailAlerter {
    config: EmailConfig,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
}

impl EmailAlerter {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let parse = |address: &str| {
            address
                .parse::<Mailbox>()
                .map_err(|e| AppError::alert(ALERTER_TYPE, format!("invalid address {}: {}", address, e)))
        };
        let sender = parse(&config.sender)?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| parse(r))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            sender,
            recipients,
        })
    }

    pub fn from_json(config: &serde_json::Value) -> Result<Self> {
        Self::new(EmailConfig::from_json(config)?)
    }

    pub fn boxed(config: &serde_json::Value) -> Result<Box<dyn Alerter>> {
        Ok(Box::new(Self::from_json(config)?))
    }

    pub fn config(&self) -> &EmailConfig {
        &self.config
    }

    fn message(&self, subject: &str, content: &str) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(subject)
            .date_now()
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        builder
            .body(content.to_string())
            .map_err(|e| AppError::alert(ALERTER_TYPE, e))
    }

    fn transport(&self) -> AsyncSmtpTransport<Tokio1Executor> {
        let builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.relay).port(SMTP_PORT);
        match &self.config.password {
            Some(password) => builder
                .credentials(Credentials::new(self.config.sender.clone(), password.clone()))
                .build(),
            None => builder.build(),
        }
    }
}

#[async_trait]
impl Alerter for EmailAlerter {
    fn alerter_type(&self) -> &str {
        ALERTER_TYPE
    }

    async fn send(&self, subject: &str, content: &str) -> Result<()> {
        let message = self.message(subject, content)?;
        self.transport()
            .send(message)
            .await
            .map_err(|e| AppError::alert(ALERTER_TYPE, e))?;
        tracing::debug!("sent email to {}", self.config.recipients.join(", "));
        Ok(())
    }
}
