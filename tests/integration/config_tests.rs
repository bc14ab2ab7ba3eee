use super::*;
use stock_hunter::drivers::{DriverKind, DriverRepo, Fetcher};
use stock_hunter::plugins::alerters::AlertEngine;
use stock_hunter::plugins::AlerterRegistry;
use stock_hunter::price::NumericLocale;
use stock_hunter::HunterConfig;

#[test]
fn test_load_full_config() -> anyhow::Result<()> {
    let file = write_yaml(
        r#"
refresh_interval: 20
max_price: 499.99
locale: fr_FR
data_dir: /tmp/hunter
save_pages: false
worker:
  addr: 10.0.0.5:3080
urls:
  - https://www.amazon.com/dp/B08HR7SV3M
  - https://www.bestbuy.com/site/6429440.p
  - https://www.amazon.com/dp/B08HR7SV3M
"#,
    );
    let config = HunterConfig::load(file.path())?;

    assert_eq!(config.max_price, Some(499.99));
    assert_eq!(config.locale, NumericLocale::FrFr);
    assert!(!config.save_pages);
    assert_eq!(config.worker.addr, "10.0.0.5:3080");
    assert_eq!(config.fetch_timeout(), Duration::from_secs(20));

    let nicknames: Vec<String> = config
        .targets()?
        .iter()
        .map(|t| t.nickname().to_string())
        .collect();
    assert_eq!(nicknames, vec!["mzn_1", "bstby_1"]);
    Ok(())
}

#[test]
fn test_empty_urls_fail_fast() {
    let file = write_yaml("refresh_interval: 5\nurls:\n  - ''\n");
    let err = HunterConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains("config urls section is empty"));
}

#[test]
fn test_missing_config_file() {
    assert!(HunterConfig::load(std::path::Path::new("/nonexistent/hunter.yaml")).is_err());
}

#[test]
fn test_missing_puppeteer_script_is_a_startup_error() {
    let file = write_yaml(
        "puppeteer:\n  script: /nonexistent/fetch.js\nurls:\n  - https://example.com/\n",
    );
    let config = HunterConfig::load(file.path()).unwrap();
    let err = DriverRepo::from_config(&config).err().unwrap();
    assert!(err.to_string().contains("does not exist"));
}

#[test]
fn test_puppeteer_driver_when_script_exists() -> anyhow::Result<()> {
    let script = tempfile::Builder::new().suffix(".js").tempfile()?;
    let file = write_yaml(&format!(
        "puppeteer:\n  script: {}\nurls:\n  - https://example.com/\n",
        script.path().display()
    ));
    let config = HunterConfig::load(file.path())?;
    let drivers = DriverRepo::from_config(&config)?;
    assert_eq!(drivers.get(DriverKind::Puppeteer)?.kind(), DriverKind::Puppeteer);
    Ok(())
}

#[test]
fn test_alerter_file_builds_engine() -> anyhow::Result<()> {
    let file = write_yaml(
        r#"
alerters:
  email:
    sender: hunter@example.com
    recipients:
      - me@example.com
      - you@example.com
    relay: 127.0.0.1
  discord:
    webhook_url: https://discord.test/hook
"#,
    );
    let settings = stock_hunter::config::load_alerter_settings(file.path())?;
    let engine = AlertEngine::from_settings(&AlerterRegistry::with_defaults(), settings)?;
    assert_eq!(engine.alerter_types(), vec!["discord", "email"]);
    Ok(())
}

#[test]
fn test_unknown_alerter_in_file() {
    let file = write_yaml("alerters:\n  pager:\n    number: 555\n");
    let settings = stock_hunter::config::load_alerter_settings(file.path()).unwrap();
    let err = AlertEngine::from_settings(&AlerterRegistry::with_defaults(), settings)
        .err()
        .unwrap();
    assert!(err.to_string().contains("\"pager\" alerter type does not exist"));
}
