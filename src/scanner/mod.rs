//! Manifest scanning, path resolution and deduplication

pub mod duplicate_detector;
pub mod manifest_parser;
pub mod path_resolver;

pub use duplicate_detector::{compute_file_hash, FileTable, Insertion, UniqueFile};
pub use manifest_parser::{parse_manifest, LineOutcome, ScanOutcome, ScanSettings, ScanStats};
pub use path_resolver::{infer_root, resolve_case_insensitive, resolve_manifest_path};
