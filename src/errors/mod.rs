pub mod types;
pub mod classification;

pub use types::CoreError;
pub use classification::ErrorClassification;
