//! Scratch directory of per-hash references for one batch checker run

pub mod link_stager;

pub use link_stager::{stage_links, StagedLinks};
