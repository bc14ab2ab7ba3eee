use prost::Message;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::proto::{Request, Response};
use crate::Result;

#[derive(Debug, Clone)]
pub struct WorkerClient {
    addr: String,
}

impl WorkerClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub async fn get(&self, request_id: i32, url: &str, timeout: i32) -> Result<Response> {
        let mut stream = TcpStream::connect(&self.addr).await?;

        let request = Request {
            id: request_id,
            url: url.to_string(),
            timeout,
        };
        stream.write_all(&request.encode_to_vec()).await?;
        stream.shutdown().await?;

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await?;
        let response = Response::decode(buf.as_slice())?;

        tracing::debug!(
            "got response with id {}, status_code: {}, data: <{} bytes>",
            response.id,
            response.status_code,
            response.data.len()
        );
        Ok(response)
    }
}
