pub mod traits;
pub mod registry;
pub mod extractors;
pub mod alerters;

pub use registry::{AlerterRegistry, ExtractorRegistry};
pub use traits::{AlertDispatcher, Alerter, Extractor};
