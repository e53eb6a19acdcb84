//! Core types and service wiring for the EcoSell recyclables pricing assistant.

/// Classifier adapter with backend fallback and candidate selection.
pub mod classifier;
/// Great-circle distance and nearest-first ranking of recycling centers.
pub mod geo;
/// Ordered label rules mapping model labels to waste categories.
pub mod labels;
/// Domain models shared by all providers.
pub mod model;
/// Traits describing the provider interfaces.
pub mod ports;
/// Static price table and estimates.
pub mod pricing;
/// High-level service facade used by clients.
pub mod service;
/// Image upload validation and the upload surface state machine.
pub mod upload;

pub use classifier::*;
pub use geo::*;
pub use labels::*;
pub use model::*;
pub use ports::*;
pub use pricing::*;
pub use service::*;
pub use upload::*;
