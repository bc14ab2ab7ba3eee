// Shared helpers for the integration tests

pub mod config_tests;
pub mod engine_tests;
pub mod worker_tests;

use async_trait::async_trait;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stock_hunter::plugins::traits::AlertDispatcher;
use stock_hunter::price::NumericLocale;
use stock_hunter::{EngineSettings, Target};
use tempfile::NamedTempFile;

/// Keeps every dispatched alert for later inspection.
#[derive(Clone, Default)]
pub struct RecordingDispatcher {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingDispatcher {
    async fn dispatch(&self, subject: &str, content: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), content.to_string()));
    }
}

pub fn target(url: &str) -> Target {
    Target::from_urls([url]).unwrap().remove(0)
}

pub fn fast_settings(max_price: Option<f64>) -> EngineSettings {
    EngineSettings {
        refresh_interval: Duration::from_millis(10),
        max_price,
        locale: NumericLocale::EnUs,
    }
}

pub fn write_yaml(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}
