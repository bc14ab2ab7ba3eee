pub mod extractor;
pub mod alerter;

pub use extractor::{Extraction, Extractor, Page};
pub use alerter::{AlertDispatcher, Alerter};

#[cfg(test)]
pub use alerter::MockAlertDispatcher;
