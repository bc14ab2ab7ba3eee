pub mod cli;
pub mod config;
pub mod decision;
pub mod drivers;
pub mod logging;
pub mod observation;
pub mod plugins;
pub mod price;
pub mod scheduler;
pub mod scraper;
pub mod utils;
pub mod worker;

// Re-export commonly used types
pub use config::{HunterConfig, Target};
pub use scheduler::{Engine, EngineSettings};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
