use async_trait::async_trait;
use prost::Message;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use super::proto::{Request, Response};
use crate::drivers::USER_AGENT;
use crate::Result;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Turns one decoded request into a response.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, request: &Request) -> Result<Response>;
}

pub struct WorkerServer<H> {
    handler: Arc<H>,
}

impl<H: RequestHandler> WorkerServer<H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    /// Accepts connections forever. A failed exchange only closes that connection.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer) = listener.accept().await?;
            tracing::debug!("accepted connection from {}", peer);
            let handler = Arc::clone(&self.handler);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(handler.as_ref(), stream).await {
                    tracing::error!("something went wrong during request: {}", e);
                }
            });
        }
    }
}

async fn handle_connection<H: RequestHandler>(handler: &H, mut stream: TcpStream) -> Result<()> {
    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let request = Request::decode(buf.as_slice())?;
    tracing::info!(
        "received request: id: {}, url: {}, timeout: {}",
        request.id,
        request.url,
        request.timeout
    );

    let outcome = handler.handle(&request).await;
    if let Ok(response) = &outcome {
        stream.write_all(&response.encode_to_vec()).await?;
        tracing::info!(
            "sent response: id: {}, status_code: {}, data: <{} bytes>",
            response.id,
            response.status_code,
            response.data.len()
        );
    }
    stream.shutdown().await?;
    outcome.map(|_| ())
}

/// Fetches with browser-like headers so plain HTTP passes simple bot checks.
pub struct LeanAndMeanHandler {
    client: Client,
}

impl LeanAndMeanHandler {
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(header::REFERER, HeaderValue::from_static("https://google.com"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
        headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
        headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RequestHandler for LeanAndMeanHandler {
    async fn handle(&self, request: &Request) -> Result<Response> {
        let timeout = match u64::try_from(request.timeout) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };
        let authority = url::Url::parse(&request.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();

        let response = self
            .client
            .get(&request.url)
            .header("authority", authority)
            .timeout(timeout)
            .send()
            .await?;
        let status_code = i32::from(response.status().as_u16());
        let data = response.text().await?;

        Ok(Response {
            id: request.id,
            status_code,
            data,
        })
    }
}
