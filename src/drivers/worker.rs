use async_trait::async_trait;
use std::time::Duration;

use super::{DriverKind, FetchResponse, Fetcher};
use crate::config::Target;
use crate::utils::error::AppError;
use crate::worker::WorkerClient;
use crate::Result;

/// Request ids are not correlated with anything yet; one connection carries one exchange.
const REQUEST_ID: i32 = 1337;

/// Delegates the fetch to a remote worker process.
pub struct WorkerDriver {
    client: WorkerClient,
    timeout: Duration,
}

impl WorkerDriver {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: WorkerClient::new(addr),
            timeout,
        }
    }
}

#[async_trait]
impl Fetcher for WorkerDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Worker
    }

    async fn fetch(&self, target: &Target) -> Result<FetchResponse> {
        let timeout = i32::try_from(self.timeout.as_secs()).unwrap_or(i32::MAX);
        // A worker that accepts and never answers must not stall the engine.
        let response = tokio::time::timeout(
            self.timeout,
            self.client.get(REQUEST_ID, target.url(), timeout),
        )
        .await
        .map_err(|_| {
            AppError::Fetch(format!(
                "worker at {} timed out after {:?}",
                self.client.addr(),
                self.timeout
            ))
        })??;

        // A worker that failed closes the connection without writing anything.
        let status_code = u16::try_from(response.status_code)
            .ok()
            .filter(|code| *code > 0)
            .ok_or_else(|| {
                AppError::Fetch(format!("worker at {} returned no response", self.client.addr()))
            })?;

        Ok(FetchResponse {
            text: response.data,
            final_url: target.url().to_string(),
            status_code: Some(status_code),
        })
    }
}
