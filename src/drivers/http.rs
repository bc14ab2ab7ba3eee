use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;
use std::time::Duration;

use super::{DriverKind, FetchResponse, Fetcher, USER_AGENT};
use crate::config::Target;
use crate::Result;

/// Plain HTTP GET. Cheapest driver and the only one that sees the real status code.
pub struct HttpDriver {
    client: Client,
}

impl HttpDriver {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://google.com"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Http
    }

    async fn fetch(&self, target: &Target) -> Result<FetchResponse> {
        let response = self.client.get(target.url()).send().await?;
        let status = response.status();
        let final_url = response.url().to_string();
        if !status.is_success() {
            tracing::debug!("got response with status code {} for {}", status.as_u16(), target);
        }
        let text = response.text().await?;

        Ok(FetchResponse {
            text,
            final_url,
            status_code: Some(status.as_u16()),
        })
    }
}
