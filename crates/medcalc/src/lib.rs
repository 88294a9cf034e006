//! Clinical risk-score calculators behind a JSON metadata catalogue and an axum REST surface.

pub mod config;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod router;
pub mod scores;
pub mod service;
pub mod telemetry;
pub mod validation;

pub use registry::{CalculatorError, CalculatorRegistry, ScoreId};
pub use router::score_router;
pub use service::{ScoreService, ServiceError};
