// Extractor plugin implementations
pub mod amazon;
pub mod generic;

pub use amazon::AmazonExtractor;
pub use generic::GenericExtractor;
