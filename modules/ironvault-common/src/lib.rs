pub mod config;
pub mod error;
pub mod scoring;
pub mod types;
pub mod validation;

pub use config::Config;
pub use error::{ConfigError, ScoringError, ValidationError};
pub use scoring::{RiskModel, RuleBasedModel, APPROVAL_THRESHOLD};
pub use types::*;
pub use validation::validate;
