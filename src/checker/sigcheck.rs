//! Sysinternals sigcheck invocation

use encoding_rs::UTF_16LE;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{info, warn};

use super::SignatureChecker;
use crate::core::error::{BatchSigCheckError, Result};

/// Runs sigcheck once over a directory
#[derive(Debug, Clone)]
pub struct Sigcheck {
    program: PathBuf,
    args: Vec<String>,
}

impl Sigcheck {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Command line as logged, with the scan directory appended
    pub fn command_line(&self, dir: &Path) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.push(dir.display().to_string());
        parts.join(" ")
    }
}

impl SignatureChecker for Sigcheck {
    fn run(&self, dir: &Path) -> Result<String> {
        info!("Running command: {}", self.command_line(dir));

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .output()
            .map_err(|source| BatchSigCheckError::CheckerSpawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // sigcheck exits non-zero on normal runs; only stdout matters.
        if !output.status.success() {
            info!("Checker exited with {}", output.status);
        }
        if !output.stderr.is_empty() {
            warn!(
                "Checker stderr: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = decode_output(&output.stdout);
        if text.trim().is_empty() {
            return Err(BatchSigCheckError::EmptyOutput);
        }
        Ok(text)
    }
}

/// Decode checker stdout: UTF-16LE when it carries that BOM, else UTF-8.
pub fn decode_output(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFF, 0xFE]) {
        let (text, _, _) = UTF_16LE.decode(bytes);
        return text.into_owned();
    }
    String::from_utf8_lossy(bytes).into_owned()
}
