use clap::Parser;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::load_alerter_settings;
use crate::Result;

#[derive(Debug, Parser)]
#[command(name = "stock-hunter", version, about = "Watches product pages and alerts on restocks and price drops")]
pub struct Cli {
    /// YAML config file for the scrapers
    #[arg(short, long, default_value = "/config.yaml")]
    pub config: PathBuf,

    /// Alert system to use when no alerter config file is given
    #[arg(short, long = "alerter", default_value = "email")]
    pub alerter_type: String,

    /// YAML file with an `alerters:` map, required for more than one alerter
    #[arg(short = 'q', long)]
    pub alerter_config: Option<PathBuf>,

    /// Log file, written in addition to stderr
    #[arg(short, long)]
    pub log: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Email addresses; the first is also the sender
    #[arg(short, long, num_args = 1..)]
    pub email: Vec<String>,

    /// Address of the SMTP relay
    #[arg(short, long)]
    pub relay: Option<String>,

    /// Send a test alert before starting the scrapes
    #[arg(short, long)]
    pub test_alerts: bool,

    /// Webhook url for webhook-based alerters
    #[arg(short, long = "webhook")]
    pub webhook_url: Option<String>,
}

impl Cli {
    /// Alerter settings keyed by type, from the alerter config file if one was given,
    /// otherwise a single entry built from the command line flags.
    pub fn alerter_settings(&self) -> Result<BTreeMap<String, serde_json::Value>> {
        if let Some(path) = &self.alerter_config {
            return Ok(load_alerter_settings(path)?);
        }

        let emails: Vec<&str> = self.email.iter().map(|e| e.trim()).collect();
        let mut settings = json!({ "recipients": emails });
        if let Some(sender) = emails.first() {
            settings["sender"] = json!(sender);
        }
        if let Some(relay) = &self.relay {
            settings["relay"] = json!(relay);
        }
        if let Some(webhook_url) = &self.webhook_url {
            settings["webhook_url"] = json!(webhook_url);
        }

        Ok(BTreeMap::from([(self.alerter_type.clone(), settings)]))
    }
}
