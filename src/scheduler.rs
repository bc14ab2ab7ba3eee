//! The scrape loop: one queue of fire times shared by every target, drained by
//! a single task that sleeps until the earliest entry, scrapes, and re-enters the
//! target behind everything already queued.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::{Instrument, Level};

use crate::config::HunterConfig;
use crate::decision::{self, Decision, HUMAN_VERIFICATION_PHRASE};
use crate::plugins::traits::AlertDispatcher;
use crate::price::{NumericLocale, PriceParser};
use crate::scraper::ScrapeTask;
use crate::utils::error::AppError;
use crate::Result;

/// Fire times mapped to task indices. Entries at the same instant keep insertion order.
#[derive(Debug, Default)]
pub struct ScheduleQueue {
    entries: BTreeMap<(Instant, u64), usize>,
    seq: u64,
}

impl ScheduleQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&mut self, at: Instant, task: usize) {
        self.entries.insert((at, self.seq), task);
        self.seq += 1;
    }

    /// Schedules `task` `delay` after the latest queued entry, or after `now` when
    /// the queue is empty. Returns the chosen fire time.
    pub fn enter_chained(&mut self, now: Instant, delay: Duration, task: usize) -> Instant {
        let at = self.latest().unwrap_or(now) + delay;
        self.enter(at, task);
        at
    }

    /// Removes and returns the earliest entry.
    pub fn pop(&mut self) -> Option<(Instant, usize)> {
        self.entries
            .pop_first()
            .map(|((at, _), task)| (at, task))
    }

    pub fn peek(&self) -> Option<(Instant, usize)> {
        self.entries
            .first_key_value()
            .map(|((at, _), task)| (*at, *task))
    }

    pub fn latest(&self) -> Option<Instant> {
        self.entries.last_key_value().map(|((at, _), _)| *at)
    }

    /// Fire times in the order they will fire.
    pub fn fire_times(&self) -> Vec<Instant> {
        self.entries.keys().map(|(at, _)| *at).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stretches a base interval by a uniform factor in `[1.00, 1.20]`.
pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn delay(&mut self, base: Duration) -> Duration {
        base.mul_f64(self.rng.gen_range(1.00..=1.20))
    }
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub refresh_interval: Duration,
    pub max_price: Option<f64>,
    pub locale: NumericLocale,
}

impl From<&HunterConfig> for EngineSettings {
    fn from(config: &HunterConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            max_price: config.max_price,
            locale: config.locale,
        }
    }
}

pub struct Engine {
    settings: EngineSettings,
    prices: PriceParser,
    tasks: Vec<ScrapeTask>,
    queue: ScheduleQueue,
    jitter: Jitter,
    alerts: Box<dyn AlertDispatcher>,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        tasks: Vec<ScrapeTask>,
        alerts: Box<dyn AlertDispatcher>,
    ) -> Self {
        Self::with_jitter(settings, tasks, alerts, Jitter::from_entropy())
    }

    /// Every task is queued once, one jittered interval apart.
    pub fn with_jitter(
        settings: EngineSettings,
        tasks: Vec<ScrapeTask>,
        alerts: Box<dyn AlertDispatcher>,
        jitter: Jitter,
    ) -> Self {
        let mut engine = Self {
            prices: PriceParser::new(settings.locale),
            settings,
            tasks,
            queue: ScheduleQueue::new(),
            jitter,
            alerts,
        };
        for index in 0..engine.tasks.len() {
            engine.schedule(index);
        }
        engine
    }

    pub fn tasks(&self) -> &[ScrapeTask] {
        &self.tasks
    }

    pub fn queue(&self) -> &ScheduleQueue {
        &self.queue
    }

    pub fn schedule(&mut self, index: usize) -> Instant {
        let delay = self.jitter.delay(self.settings.refresh_interval);
        self.queue.enter_chained(Instant::now(), delay, index)
    }

    /// Scrapes one target and acts on the result. Only a human-verification
    /// prompt makes this fail.
    pub async fn tick(&mut self, index: usize) -> Result<()> {
        let task = &mut self.tasks[index];
        let span = tracing::info_span!("scrape", nickname = %task.target().nickname());
        scrape_once(
            task,
            &self.prices,
            self.settings.max_price,
            self.alerts.as_ref(),
        )
        .instrument(span)
        .await
    }

    /// Waits for the earliest entry, runs it, and re-queues that target.
    /// Returns the index that ran, or `None` with nothing scheduled.
    pub async fn run_once(&mut self) -> Result<Option<usize>> {
        let Some((at, index)) = self.queue.pop() else {
            return Ok(None);
        };
        time::sleep_until(at).await;
        self.tick(index).await?;
        self.schedule(index);
        Ok(Some(index))
    }

    pub async fn run(mut self) -> Result<()> {
        tracing::info!("starting engine with {} targets", self.tasks.len());
        while self.run_once().await?.is_some() {}
        Ok(())
    }
}

async fn scrape_once(
    task: &mut ScrapeTask,
    prices: &PriceParser,
    max_price: Option<f64>,
    alerts: &dyn AlertDispatcher,
) -> Result<()> {
    let outcome = match task.scrape(prices).await {
        Ok(observation) => Some(decision::decide(observation, max_price)),
        Err(e) => {
            tracing::error!("scrape failed: {}", e);
            None
        }
    };
    task.report_stats(Instant::now());

    match outcome {
        Some(Decision::Alert {
            reason,
            subject,
            content,
        }) => {
            tracing::info!("{}", reason);
            alerts.dispatch(&subject, &content).await;
        }
        Some(Decision::Log { level, message }) => log_at(level, &message),
        Some(Decision::Fatal { url }) => {
            tracing::error!("got \"{}\" prompt", HUMAN_VERIFICATION_PHRASE);
            alerts
                .dispatch(
                    "Something went wrong",
                    &format!("You need to answer this CAPTCHA and restart this script: {}", url),
                )
                .await;
            return Err(AppError::HumanVerification { url });
        }
        None => {}
    }
    Ok(())
}

fn log_at(level: Level, message: &str) {
    match level {
        Level::ERROR => tracing::error!("{}", message),
        Level::WARN => tracing::warn!("{}", message),
        Level::INFO => tracing::info!("{}", message),
        Level::DEBUG => tracing::debug!("{}", message),
        _ => tracing::trace!("{}", message),
    }
}
