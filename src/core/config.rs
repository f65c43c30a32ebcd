//! Run configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. CLI flags are applied on top by the binary.

use regex::{RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::error::{BatchSigCheckError, Result};

/// 50 MiB
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1_048_576;

/// Folders with this many processed files or fewer are flagged
pub const DEFAULT_LOW_LOADS: usize = 1;

/// Digest used as the deduplication key. Must match a hash column the
/// checker emits so results can be mapped back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha256,
}

impl HashAlgorithm {
    /// Header label of the matching column in sigcheck output
    pub fn column_name(self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha256 => "SHA256",
        }
    }

    /// Column position when the output has no header
    pub fn default_column(self) -> usize {
        match self {
            HashAlgorithm::Md5 => 16,
            HashAlgorithm::Sha256 => 20,
        }
    }
}

/// How each unique file is made reachable from the scratch directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageMode {
    Symlink,
    Copy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sigcheck_path: PathBuf,
    pub sigcheck_args: Vec<String>,
    pub max_file_size: u64,
    pub low_loads: usize,
    pub insist_patterns: Vec<String>,
    pub skip_patterns: Vec<String>,
    pub suspicious_substrings: Vec<String>,
    pub hash_algorithm: HashAlgorithm,
    pub link_extension: String,
    pub stage_mode: StageMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sigcheck_path: PathBuf::from("sigcheck.exe"),
            sigcheck_args: ["-nobanner", "-a", "-s", "-e", "-h", "-ct"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            low_loads: DEFAULT_LOW_LOADS,
            insist_patterns: vec![r"\.dll$".into(), r"\.exe$".into(), r"\.sys$".into()],
            skip_patterns: vec![
                r"^(?:[a-z]:\\)?Windows\\System32\\".into(),
                r"^(?:[a-z]:\\)?Windows\\SysWOW64\\".into(),
            ],
            suspicious_substrings: vec![
                r"\ProgramData\".into(),
                r"\Recycler\".into(),
                r"\$Recycle.Bin\".into(),
                r"\Temp".into(),
                r"\Users\".into(),
            ],
            hash_algorithm: HashAlgorithm::Md5,
            link_extension: "lnk".into(),
            stage_mode: StageMode::Symlink,
        }
    }
}

impl Config {
    /// Load a JSON config file, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let file = File::open(path).map_err(|e| {
            BatchSigCheckError::Config(format!("cannot open {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_reader(file).map_err(|e| {
            BatchSigCheckError::Config(format!("cannot parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.link_extension.is_empty() || self.link_extension.contains(['/', '\\', '.']) {
            return Err(BatchSigCheckError::Config(format!(
                "link_extension must be a bare extension, got '{}'",
                self.link_extension
            )));
        }
        if self.insist_patterns.is_empty() {
            return Err(BatchSigCheckError::Config(
                "insist_patterns must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Compile the insist/skip patterns
    pub fn path_rules(&self) -> Result<PathRules> {
        Ok(PathRules {
            insist: compile_set(&self.insist_patterns)?,
            skip: compile_set(&self.skip_patterns)?,
        })
    }
}

/// Compiled manifest line filters
#[derive(Debug, Clone)]
pub struct PathRules {
    insist: RegexSet,
    skip: RegexSet,
}

impl PathRules {
    /// Line names a binary worth checking
    pub fn is_candidate(&self, line: &str) -> bool {
        self.insist.is_match(line)
    }

    /// Line lives in a trusted system directory
    pub fn is_skipped(&self, line: &str) -> bool {
        self.skip.is_match(line)
    }
}

fn compile_set(patterns: &[String]) -> Result<RegexSet> {
    RegexSetBuilder::new(patterns)
        .case_insensitive(true)
        .unicode(true)
        .build()
        .map_err(|e| BatchSigCheckError::Config(format!("invalid pattern: {}", e)))
}
