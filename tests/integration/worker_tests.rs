use super::*;
use stock_hunter::drivers::{Fetcher, WorkerDriver};
use stock_hunter::worker::proto::{Request, Response};
use stock_hunter::worker::{LeanAndMeanHandler, RequestHandler, WorkerClient, WorkerServer};
use stock_hunter::AppError;
use tokio::net::TcpListener;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Binds an ephemeral port and serves `handler` in the background.
async fn spawn_worker<H: RequestHandler>(handler: H) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(WorkerServer::new(handler).serve(listener));
    addr
}

struct Echo;

#[async_trait]
impl RequestHandler for Echo {
    async fn handle(&self, request: &Request) -> stock_hunter::Result<Response> {
        Ok(Response {
            id: request.id,
            status_code: 200,
            data: format!("{} in {}s", request.url, request.timeout),
        })
    }
}

struct Broken;

#[async_trait]
impl RequestHandler for Broken {
    async fn handle(&self, _request: &Request) -> stock_hunter::Result<Response> {
        Err(AppError::Fetch("upstream timed out".into()))
    }
}

#[tokio::test]
async fn test_client_round_trip() -> anyhow::Result<()> {
    let addr = spawn_worker(Echo).await;
    let client = WorkerClient::new(addr);

    let response = client.get(42, "https://shop.example.com/item", 15).await?;
    assert_eq!(response.id, 42);
    assert_eq!(response.status_code, 200);
    assert_eq!(response.data, "https://shop.example.com/item in 15s");
    Ok(())
}

#[tokio::test]
async fn test_server_survives_failed_request() -> anyhow::Result<()> {
    let addr = spawn_worker(Broken).await;
    let driver = WorkerDriver::new(addr.clone(), Duration::from_secs(15));

    for _ in 0..2 {
        let err = driver.fetch(&target("https://shop.example.com/item")).await.unwrap_err();
        assert!(err.to_string().contains(&format!("worker at {} returned no response", addr)));
    }
    Ok(())
}

#[tokio::test]
async fn test_worker_driver_through_lean_and_mean() -> anyhow::Result<()> {
    let page = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("go away"))
        .mount(&page)
        .await;

    let addr = spawn_worker(LeanAndMeanHandler::new()?).await;
    let driver = WorkerDriver::new(addr, Duration::from_secs(15));
    let url = format!("{}/item", page.uri());

    let response = driver.fetch(&target(&url)).await?;
    assert_eq!(response.status_code, Some(403));
    assert_eq!(response.text, "go away");
    assert_eq!(response.final_url, url);
    Ok(())
}

#[tokio::test]
async fn test_silent_worker_times_out() -> anyhow::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?.to_string();
    // Accepts connections and keeps them open without ever replying.
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let driver = WorkerDriver::new(addr.clone(), Duration::from_millis(200));
    let result = tokio::time::timeout(
        Duration::from_secs(5),
        driver.fetch(&target("https://shop.example.com/item")),
    )
    .await?;

    let err = result.unwrap_err();
    assert!(err.to_string().contains(&format!("worker at {} timed out", addr)));
    Ok(())
}
