use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use stock_hunter::cli::Cli;
use stock_hunter::drivers::DriverRepo;
use stock_hunter::plugins::alerters::AlertEngine;
use stock_hunter::plugins::traits::AlertDispatcher;
use stock_hunter::plugins::{AlerterRegistry, ExtractorRegistry};
use stock_hunter::scraper::ScrapeTask;
use stock_hunter::{Engine, EngineSettings, HunterConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let guard = match stock_hunter::logging::init(
        stock_hunter::logging::default_directive(cli.verbose),
        cli.log.as_deref(),
    ) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e:#}");
            std::process::exit(1);
        }
    };

    info!(
        "starting v{} with args: {}",
        env!("CARGO_PKG_VERSION"),
        std::env::args().collect::<Vec<_>>().join(" ")
    );

    if let Err(e) = run(cli).await {
        error!("caught exception: {e:#}");
        drop(guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let alerts = AlertEngine::from_settings(&AlerterRegistry::with_defaults(), cli.alerter_settings()?)?;
    let config = HunterConfig::load(&cli.config)?;
    let drivers = DriverRepo::from_config(&config)?;

    tokio::fs::create_dir_all(&config.data_dir).await?;
    let page_dir = config.save_pages.then(|| config.data_dir.clone());
    let tasks = ScrapeTask::for_targets(
        config.targets()?,
        &ExtractorRegistry::with_defaults(),
        &drivers,
        page_dir,
    )?;

    if cli.test_alerts {
        info!("sending test alert");
        alerts.dispatch("This is a test", "This is only a test").await;
    }

    Engine::new(EngineSettings::from(&config), tasks, Box::new(alerts))
        .run()
        .await?;
    Ok(())
}
