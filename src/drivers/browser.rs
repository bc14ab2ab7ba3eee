use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DriverKind, FetchResponse, Fetcher, USER_AGENT};
use crate::config::Target;
use crate::utils::error::AppError;
use crate::Result;

/// Headless Chrome. Headless chromium crashes somewhat regularly, so every fetch
/// starts a fresh browser.
pub struct BrowserDriver {
    data_dir: PathBuf,
    chrome_path: Option<PathBuf>,
    timeout: Duration,
}

impl BrowserDriver {
    pub fn new(data_dir: PathBuf, chrome_path: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            data_dir,
            chrome_path,
            timeout,
        }
    }

    fn launch_options(
        chrome_path: Option<PathBuf>,
        timeout: Duration,
    ) -> Result<LaunchOptions<'static>> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            // Chrome refuses to start sandboxed as root.
            .sandbox(!running_as_root())
            .idle_browser_timeout(timeout.max(Duration::from_secs(30)))
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--window-position=0,0"),
                OsStr::new("--window-size=1920,1080"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("failed to create launch options: {}", e)))?;

        if chrome_path.is_some() {
            launch_options.path = chrome_path;
        }

        Ok(launch_options)
    }

    fn fetch_blocking(
        chrome_path: Option<PathBuf>,
        url: String,
        screenshot: PathBuf,
        timeout: Duration,
    ) -> Result<FetchResponse> {
        let launch_options = Self::launch_options(chrome_path, timeout)?;
        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("failed to launch browser: {}", e)))?;
        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("failed to create tab: {}", e)))?;
        tab.set_default_timeout(timeout);
        tab.set_user_agent(USER_AGENT, None, None)
            .map_err(|e| AppError::Browser(format!("failed to set user agent: {}", e)))?;

        tab.navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| AppError::Browser(format!("navigation failed: {}", e)))?;

        save_screenshot(&tab, &screenshot);

        let text = tab
            .get_content()
            .map_err(|e| AppError::Browser(format!("failed to get page content: {}", e)))?;
        let final_url = match tab.get_url() {
            current if current.is_empty() => url,
            current => current,
        };
        if let Err(e) = tab.close(true) {
            tracing::debug!("unable to close tab: {}", e);
        }

        Ok(FetchResponse {
            text,
            final_url,
            status_code: None,
        })
    }
}

fn running_as_root() -> bool {
    whoami::username() == "root"
}

fn save_screenshot(tab: &headless_chrome::Tab, path: &Path) {
    let captured = tab
        .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        .map_err(|e| e.to_string())
        .and_then(|png| std::fs::write(path, png).map_err(|e| e.to_string()));
    if let Err(e) = captured {
        tracing::warn!("unable to save screenshot of webpage: {}", e);
    }
}

#[async_trait]
impl Fetcher for BrowserDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Browser
    }

    async fn fetch(&self, target: &Target) -> Result<FetchResponse> {
        let chrome_path = self.chrome_path.clone();
        let url = target.url().to_string();
        let screenshot = self.data_dir.join(format!("{}.png", target.nickname()));
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            Self::fetch_blocking(chrome_path, url, screenshot, timeout)
        })
        .await
        .map_err(|e| AppError::Browser(format!("browser task failed: {}", e)))?
    }
}
