//! Configuration, errors and logging shared by every stage

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, HashAlgorithm, PathRules, StageMode};
pub use error::{BatchSigCheckError, Result};
