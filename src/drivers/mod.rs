//! Fetch drivers: the ways a page can be retrieved.

pub mod browser;
pub mod http;
pub mod puppeteer;
pub mod worker;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::HunterConfig;
use crate::config::Target;
use crate::utils::error::AppError;
use crate::Result;

pub use browser::BrowserDriver;
pub use http::HttpDriver;
pub use puppeteer::PuppeteerDriver;
pub use worker::WorkerDriver;

pub const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.93 Safari/537.36";

/// Raw result of one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub text: String,
    pub final_url: String,
    /// Absent when the driver cannot see the HTTP status (browser automation).
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    Http,
    Browser,
    Puppeteer,
    Worker,
}

impl DriverKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Http => "http",
            DriverKind::Browser => "browser",
            DriverKind::Puppeteer => "puppeteer",
            DriverKind::Worker => "worker",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retrieves a target's page. The engine awaits each call to completion before
/// doing anything else; timeouts are the driver's business.
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn kind(&self) -> DriverKind;

    async fn fetch(&self, target: &Target) -> Result<FetchResponse>;
}

/// One fetcher per driver kind, built once at startup.
#[derive(Default)]
pub struct DriverRepo {
    drivers: HashMap<DriverKind, Arc<dyn Fetcher>>,
}

impl DriverRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &HunterConfig) -> Result<Self> {
        let timeout = config.fetch_timeout();
        let mut repo = Self::new();

        repo.insert(Arc::new(HttpDriver::new(timeout)?));
        repo.insert(Arc::new(BrowserDriver::new(
            config.data_dir.clone(),
            config.browser.chrome_path.clone(),
            timeout,
        )));
        repo.insert(Arc::new(WorkerDriver::new(config.worker.addr.clone(), timeout)));

        if let Some(script) = &config.puppeteer.script {
            repo.insert(Arc::new(PuppeteerDriver::new(
                script.clone(),
                config.data_dir.clone(),
                timeout,
            )?));
        }

        Ok(repo)
    }

    pub fn insert(&mut self, fetcher: Arc<dyn Fetcher>) {
        self.drivers.insert(fetcher.kind(), fetcher);
    }

    pub fn get(&self, kind: DriverKind) -> Result<Arc<dyn Fetcher>> {
        self.drivers
            .get(&kind)
            .cloned()
            .ok_or_else(|| AppError::Registry(format!("the \"{}\" driver is not configured", kind)))
    }
}
