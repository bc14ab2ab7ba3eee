use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;

use super::{DriverKind, FetchResponse, Fetcher};
use crate::config::Target;
use crate::utils::error::AppError;
use crate::Result;

/// Runs an external node script that drives a browser and writes the page to disk:
/// `node <script> <url> <html_file> <png_file>`.
pub struct PuppeteerDriver {
    script: PathBuf,
    data_dir: PathBuf,
    timeout: Duration,
}

impl PuppeteerDriver {
    pub fn new(script: PathBuf, data_dir: PathBuf, timeout: Duration) -> Result<Self> {
        if !script.exists() {
            return Err(AppError::Validation(format!(
                "does not exist: {}",
                script.display()
            )));
        }
        Ok(Self {
            script,
            data_dir,
            timeout,
        })
    }
}

#[async_trait]
impl Fetcher for PuppeteerDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Puppeteer
    }

    async fn fetch(&self, target: &Target) -> Result<FetchResponse> {
        let html_file = self.data_dir.join(format!("{}.html", target.nickname()));
        let png_file = self.data_dir.join(format!("{}.png", target.nickname()));

        let mut command = Command::new("node");
        command
            .arg(&self.script)
            .arg(target.url())
            .arg(&html_file)
            .arg(&png_file)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                AppError::Fetch(format!("puppeteer timed out after {:?}", self.timeout))
            })??;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            tracing::warn!("puppeteer scrape failed: {}", stdout.trim());
            return Err(AppError::Fetch(format!(
                "puppeteer exited with {}",
                output.status
            )));
        }

        let text = tokio::fs::read_to_string(&html_file).await?;
        Ok(FetchResponse {
            text,
            final_url: target.url().to_string(),
            status_code: None,
        })
    }
}
