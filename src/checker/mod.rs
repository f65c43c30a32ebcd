//! External signature checker
//!
//! The checker is a black box that scans a directory and prints tab-separated
//! rows. Tests substitute their own `SignatureChecker` with canned output.

pub mod sigcheck;

use std::path::Path;

use crate::core::error::Result;

pub use sigcheck::{decode_output, Sigcheck};

/// Scans every file below a directory and returns the raw tabular output
pub trait SignatureChecker {
    fn run(&self, dir: &Path) -> Result<String>;
}
