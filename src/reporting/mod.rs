//! Reattachment, heuristics and report output

pub mod heuristics;
pub mod report_builder;
pub mod report_writer;
pub mod tsv;

pub use heuristics::Heuristics;
pub use report_builder::{reattach, Reattached, Record, ReportRow};
pub use report_writer::{write_summary, write_table};
