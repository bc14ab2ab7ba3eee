use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::price::NumericLocale;
use crate::utils::error::AppError;

pub const DEFAULT_WORKER_ADDR: &str = "127.0.0.1:3080";

/// Fetches never time out faster than this, whatever the refresh interval.
const MIN_FETCH_TIMEOUT_SECS: f64 = 15.0;

/// Upper bound on the refresh interval: one week.
const MAX_REFRESH_INTERVAL_SECS: f64 = 7.0 * 24.0 * 60.0 * 60.0;

#[derive(Debug, Clone, Deserialize)]
pub struct HunterConfig {
    /// Base delay between two scrapes, in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: f64,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub urls: Option<Vec<String>>,
    #[serde(default)]
    pub locale: NumericLocale,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_save_pages")]
    pub save_pages: bool,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub puppeteer: PuppeteerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_worker_addr")]
    pub addr: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrowserConfig {
    pub chrome_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PuppeteerConfig {
    /// Node script invoked as `node <script> <url> <html_file> <png_file>`.
    pub script: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            addr: default_worker_addr(),
        }
    }
}

fn default_refresh_interval() -> f64 {
    1.0
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_save_pages() -> bool {
    true
}

fn default_worker_addr() -> String {
    DEFAULT_WORKER_ADDR.to_string()
}

impl HunterConfig {
    /// Loads a YAML file, then applies `HUNTER__*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(
                Environment::with_prefix("HUNTER")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("urls"),
            )
            .build()?;

        let config: HunterConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?;

        let config: HunterConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.refresh_interval.is_finite() || self.refresh_interval <= 0.0 {
            return Err(ConfigError::Message("refresh_interval must be positive".into()));
        }
        if self.refresh_interval > MAX_REFRESH_INTERVAL_SECS
            || Duration::try_from_secs_f64(self.refresh_interval).is_err()
        {
            return Err(ConfigError::Message(format!(
                "refresh_interval must be at most {} seconds",
                MAX_REFRESH_INTERVAL_SECS
            )));
        }

        if let Some(max_price) = self.max_price {
            if max_price <= 0.0 {
                return Err(ConfigError::Message("max_price must be positive".into()));
            }
        }

        if self.worker.addr.trim().is_empty() {
            return Err(ConfigError::Message("worker.addr must not be empty".into()));
        }

        if self.urls.is_none() {
            return Err(ConfigError::Message("config missing urls section".into()));
        }

        let targets = self
            .targets()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        if targets.is_empty() {
            return Err(ConfigError::Message("config urls section is empty".into()));
        }

        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval.max(MIN_FETCH_TIMEOUT_SECS))
    }

    /// Unique, sorted, non-blank urls turned into nicknamed targets.
    pub fn targets(&self) -> Result<Vec<Target>, AppError> {
        let urls: BTreeSet<&str> = self
            .urls
            .iter()
            .flatten()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .collect();
        Target::from_urls(urls)
    }
}

#[derive(Debug, Deserialize)]
struct AlerterFile {
    alerters: BTreeMap<String, serde_json::Value>,
}

/// Reads the `alerters:` map (alerter type to settings) from a YAML file.
pub fn load_alerter_settings(path: &Path) -> Result<BTreeMap<String, serde_json::Value>, ConfigError> {
    let settings = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml))
        .build()?;
    Ok(settings.try_deserialize::<AlerterFile>()?.alerters)
}

/// One monitored url. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    netloc: String,
    nickname: String,
}

impl Target {
    /// Parses every url and gives each a nickname; collisions get increasing suffixes
    /// in iteration order.
    pub fn from_urls<'a, I>(urls: I) -> Result<Vec<Target>, AppError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut counter: HashMap<String, usize> = HashMap::new();
        let mut targets = Vec::new();

        for raw in urls {
            let url = Url::parse(raw).map_err(|_| AppError::InvalidUrl(raw.to_string()))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(AppError::InvalidUrl(raw.to_string()));
            }
            let host = url
                .host_str()
                .ok_or_else(|| AppError::InvalidUrl(raw.to_string()))?;
            let netloc = match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            };

            let stem = nickname_stem(&netloc);
            let count = counter.entry(stem.clone()).or_insert(0);
            *count += 1;
            let nickname = format!("{}_{}", stem, count);

            targets.push(Target {
                url,
                netloc,
                nickname,
            });
        }

        Ok(targets)
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Host plus explicit port, lower-cased.
    pub fn netloc(&self) -> &str {
        &self.netloc
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn nickname_stem(netloc: &str) -> String {
    let lower = netloc.to_lowercase();
    let host = lower.strip_prefix("www.").unwrap_or(&lower);
    let host = host.strip_suffix(".com").unwrap_or(host);
    host.chars()
        .filter(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
        .map(|c| if c == '.' { '_' } else { c })
        .collect()
}
