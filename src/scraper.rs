use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Level;

use crate::config::Target;
use crate::drivers::{DriverKind, DriverRepo, Fetcher};
use crate::observation::Observation;
use crate::plugins::registry::ExtractorRegistry;
use crate::plugins::traits::Extractor;
use crate::price::PriceParser;
use crate::Result;

/// How often a task logs its success rate.
pub const STATS_WINDOW: Duration = Duration::from_secs(5 * 60);

/// Rolling success/failure counts for one target.
#[derive(Debug, Clone)]
pub struct ScraperStats {
    num_successful: u64,
    num_failed: u64,
    since: Instant,
}

impl ScraperStats {
    pub fn new(now: Instant) -> Self {
        Self {
            num_successful: 0,
            num_failed: 0,
            since: now,
        }
    }

    pub fn record_success(&mut self) {
        self.num_successful += 1;
    }

    pub fn record_failure(&mut self) {
        self.num_failed += 1;
    }

    pub fn num_successful(&self) -> u64 {
        self.num_successful
    }

    pub fn num_failed(&self) -> u64 {
        self.num_failed
    }

    /// Never zero, so rates are defined on an empty window.
    pub fn number_of_scrapes(&self) -> u64 {
        (self.num_successful + self.num_failed).max(1)
    }

    pub fn success_rate(&self) -> f64 {
        100.0 * self.num_successful as f64 / self.number_of_scrapes() as f64
    }

    pub fn failure_rate(&self) -> f64 {
        100.0 * self.num_failed as f64 / self.number_of_scrapes() as f64
    }

    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    pub fn summary(&self, now: Instant) -> StatsSummary {
        StatsSummary {
            num_successful: self.num_successful,
            num_failed: self.num_failed,
            elapsed: now.saturating_duration_since(self.since),
            success_rate: self.success_rate(),
        }
    }

    /// Closes the window once it is older than [`STATS_WINDOW`].
    pub fn take_summary_if_due(&mut self, now: Instant) -> Option<StatsSummary> {
        if now.saturating_duration_since(self.since) <= STATS_WINDOW {
            return None;
        }
        let summary = self.summary(now);
        self.reset(now);
        Some(summary)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsSummary {
    pub num_successful: u64,
    pub num_failed: u64,
    pub elapsed: Duration,
    pub success_rate: f64,
}

impl StatsSummary {
    /// Windows with any failure are reported as warnings.
    pub fn level(&self) -> Level {
        if self.num_failed > 0 {
            Level::WARN
        } else {
            Level::INFO
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} successful scrapes in the last {} seconds ({:.0}% success rate)",
            self.num_successful,
            self.elapsed.as_secs(),
            self.success_rate
        )
    }
}

/// Everything needed to scrape one target, plus what the last scrape saw.
pub struct ScrapeTask {
    target: Target,
    fetcher: Arc<dyn Fetcher>,
    extractor: Box<dyn Extractor>,
    last: Option<Observation>,
    stats: ScraperStats,
    page_dir: Option<PathBuf>,
}

impl ScrapeTask {
    pub fn new(target: Target, fetcher: Arc<dyn Fetcher>, extractor: Box<dyn Extractor>) -> Self {
        tracing::info!(nickname = %target.nickname(), "scraper initialized for {}", target);
        Self {
            target,
            fetcher,
            extractor,
            last: None,
            stats: ScraperStats::new(Instant::now()),
            page_dir: None,
        }
    }

    /// Saves each fetched page as `<dir>/<nickname>.html`.
    pub fn with_page_dir(mut self, dir: PathBuf) -> Self {
        self.page_dir = Some(dir);
        self
    }

    /// One task per target, each with the extractor and driver its host resolves to.
    pub fn for_targets(
        targets: Vec<Target>,
        extractors: &ExtractorRegistry,
        drivers: &DriverRepo,
        page_dir: Option<PathBuf>,
    ) -> Result<Vec<ScrapeTask>> {
        targets
            .into_iter()
            .map(|target| {
                let resolved = extractors.resolve(&target);
                let fetcher = drivers.get(resolved.driver)?;
                let task = ScrapeTask::new(target, fetcher, resolved.extractor);
                Ok(match &page_dir {
                    Some(dir) => task.with_page_dir(dir.clone()),
                    None => task,
                })
            })
            .collect()
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.last.as_ref()
    }

    pub fn stats(&self) -> &ScraperStats {
        &self.stats
    }

    /// Fetches and parses the target. On success the new observation replaces the
    /// last one; on failure the last one is kept and the failure is counted.
    pub async fn scrape(&mut self, prices: &PriceParser) -> Result<&Observation> {
        tracing::debug!("starting new scrape");
        let response = match self.fetcher.fetch(&self.target).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_failure();
                return Err(e);
            }
        };
        self.save_page(&response.text).await;

        let observation = Observation::from_response(
            &response,
            self.extractor.as_ref(),
            prices,
            self.last.as_ref(),
        );
        self.stats.record_success();
        Ok(self.last.insert(observation))
    }

    /// Logs and resets the statistics window once it has run its course, returning
    /// the level the summary was logged at.
    pub fn report_stats(&mut self, now: Instant) -> Option<Level> {
        let summary = self.stats.take_summary_if_due(now)?;
        let level = summary.level();
        if level == Level::WARN {
            tracing::warn!("{}", summary);
        } else {
            tracing::info!("{}", summary);
        }
        Some(level)
    }

    async fn save_page(&self, text: &str) {
        // The puppeteer script writes the page itself.
        if self.fetcher.kind() == DriverKind::Puppeteer {
            return;
        }
        let Some(dir) = &self.page_dir else {
            return;
        };
        let path = dir.join(format!("{}.html", self.target.nickname()));
        if let Err(e) = tokio::fs::write(&path, text).await {
            tracing::warn!("unable to save page to {}: {}", path.display(), e);
        }
    }
}
