//! Batch signature checking for layout manifests
//!
//! Deduplicates the binaries named in a UTF-16LE layout manifest by content
//! hash, runs an external signature checker once over a staged directory of
//! per-hash references, and writes a reattached result table plus a triage
//! summary.

pub mod checker;
pub mod core;
pub mod pipeline;
pub mod reporting;
pub mod scanner;
pub mod staging;

pub use crate::core::{BatchSigCheckError, Config, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::checker::{Sigcheck, SignatureChecker};
    pub use crate::core::config::{Config, HashAlgorithm, StageMode};
    pub use crate::core::error::{BatchSigCheckError, Result};
    pub use crate::pipeline::{run, RunContext, RunOutcome, RunReport};
    pub use crate::reporting::{reattach, Heuristics, Reattached, ReportRow};
    pub use crate::scanner::{
        compute_file_hash, parse_manifest, FileTable, ScanOutcome, ScanSettings, ScanStats,
        UniqueFile,
    };
    pub use crate::staging::{stage_links, StagedLinks};
}
