use async_trait::async_trait;

use crate::Result;

/// One alert delivery method (email, Discord webhook, ...).
#[async_trait]
pub trait Alerter: Send + Sync {
    /// Registry key, e.g. `email`.
    fn alerter_type(&self) -> &str;

    async fn send(&self, subject: &str, content: &str) -> Result<()>;
}

/// Where the engine hands alerts. Best-effort: delivery failures are logged by the
/// implementation and never reach the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    async fn dispatch(&self, subject: &str, content: &str);
}
