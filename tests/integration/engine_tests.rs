use super::*;
use std::sync::Arc;
use stock_hunter::drivers::{DriverRepo, HttpDriver};
use stock_hunter::plugins::ExtractorRegistry;
use stock_hunter::scheduler::Jitter;
use stock_hunter::scraper::ScrapeTask;
use stock_hunter::Engine;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn http_repo() -> DriverRepo {
    let mut drivers = DriverRepo::new();
    drivers.insert(Arc::new(HttpDriver::new(Duration::from_secs(5)).unwrap()));
    drivers
}

#[tokio::test]
async fn test_restock_alerts_once() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(html("<p>Currently unavailable</p>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item"))
        .respond_with(html("<button>Add to Basket</button>"))
        .mount(&server)
        .await;

    let url = format!("{}/item", server.uri());
    let pages = tempfile::tempdir()?;
    let tasks = ScrapeTask::for_targets(
        vec![target(&url)],
        &ExtractorRegistry::with_defaults(),
        &http_repo(),
        Some(pages.path().to_path_buf()),
    )?;
    let nickname = tasks[0].target().nickname().to_string();

    let alerts = RecordingDispatcher::default();
    let mut engine = Engine::with_jitter(
        fast_settings(None),
        tasks,
        Box::new(alerts.clone()),
        Jitter::seeded(11),
    );
    for _ in 0..3 {
        engine.run_once().await?;
    }

    assert_eq!(alerts.sent(), vec![("In Stock".to_string(), url.clone())]);
    assert_eq!(engine.tasks()[0].stats().num_successful(), 3);

    let saved = std::fs::read_to_string(pages.path().join(format!("{}.html", nickname)))?;
    assert!(saved.contains("Add to Basket"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_target_keeps_others_running() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("add to cart"))
        .mount(&server)
        .await;

    // Nothing listens on port 9 locally.
    let tasks = ScrapeTask::for_targets(
        vec![
            target("http://127.0.0.1:9/gone"),
            target(&format!("{}/fine", server.uri())),
        ],
        &ExtractorRegistry::with_defaults(),
        &http_repo(),
        None,
    )?;

    let alerts = RecordingDispatcher::default();
    let mut engine = Engine::with_jitter(
        fast_settings(None),
        tasks,
        Box::new(alerts.clone()),
        Jitter::seeded(12),
    );
    for _ in 0..4 {
        engine.run_once().await?;
    }

    assert_eq!(engine.tasks()[0].stats().num_failed(), 2);
    assert_eq!(engine.tasks()[1].stats().num_successful(), 2);
    assert_eq!(alerts.sent().len(), 1);
    assert_eq!(engine.queue().len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_human_verification_ends_run() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html("<h4>Sorry, are you a human?</h4>"))
        .mount(&server)
        .await;

    let url = format!("{}/dp/X", server.uri());
    let tasks = ScrapeTask::for_targets(
        vec![target(&url)],
        &ExtractorRegistry::with_defaults(),
        &http_repo(),
        None,
    )?;

    let alerts = RecordingDispatcher::default();
    let engine = Engine::with_jitter(
        fast_settings(None),
        tasks,
        Box::new(alerts.clone()),
        Jitter::seeded(13),
    );
    let err = engine.run().await.unwrap_err();

    assert!(err.is_fatal());
    assert_eq!(
        alerts.sent(),
        vec![(
            "Something went wrong".to_string(),
            format!("You need to answer this CAPTCHA and restart this script: {}", url),
        )]
    );
    Ok(())
}

#[tokio::test]
async fn test_site_without_driver_is_a_startup_error() {
    let result = ScrapeTask::for_targets(
        vec![target("https://www.amazon.com/dp/B08")],
        &ExtractorRegistry::with_defaults(),
        &http_repo(),
        None,
    );
    let err = result.err().unwrap();
    assert!(err.to_string().contains("\"browser\" driver is not configured"));
}
