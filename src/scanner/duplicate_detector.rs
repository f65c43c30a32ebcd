//! Duplicate file detection by content hash

use md5::Context;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::core::config::HashAlgorithm;
use crate::core::error::{BatchSigCheckError, Result};

/// One distinct file content seen in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueFile {
    /// Uppercase hex digest
    pub hash: String,
    /// Manifest paths with this content, in order of appearance. Never empty.
    pub paths: Vec<String>,
    /// Local file the hash was computed from (first occurrence)
    pub local_path: PathBuf,
}

impl UniqueFile {
    /// The path shown in reports
    pub fn canonical_path(&self) -> &str {
        &self.paths[0]
    }
}

/// Whether an insert created a new entry or extended an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Unique,
    Duplicate,
}

/// Unique files keyed by hash, kept in first-seen order
#[derive(Debug, Default, Clone)]
pub struct FileTable {
    files: Vec<UniqueFile>,
    index: HashMap<String, usize>,
}

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `manifest_path` under `hash`. A new hash takes `local_path`;
    /// a known hash only appends the manifest path.
    pub fn insert(
        &mut self,
        hash: String,
        manifest_path: String,
        local_path: PathBuf,
    ) -> Insertion {
        if let Some(&idx) = self.index.get(&hash) {
            self.files[idx].paths.push(manifest_path);
            return Insertion::Duplicate;
        }

        self.index.insert(hash.clone(), self.files.len());
        self.files.push(UniqueFile {
            hash,
            paths: vec![manifest_path],
            local_path,
        });
        Insertion::Unique
    }

    /// Case-insensitive lookup; checker output may differ in hex case
    pub fn get(&self, hash: &str) -> Option<&UniqueFile> {
        self.index
            .get(&hash.to_uppercase())
            .map(|&idx| &self.files[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &UniqueFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Compute the uppercase hex digest of a file
///
/// # Arguments
/// * `path` - Path to the file
/// * `algorithm` - Digest to compute
pub fn compute_file_hash(path: &Path, algorithm: HashAlgorithm) -> Result<String> {
    let mut file = File::open(path).map_err(|e| BatchSigCheckError::io(path, e))?;
    let mut buffer = [0u8; 8192];

    let mut md5 = Context::new();
    let mut sha256 = Sha256::new();

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| BatchSigCheckError::io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        match algorithm {
            HashAlgorithm::Md5 => md5.consume(&buffer[..bytes_read]),
            HashAlgorithm::Sha256 => sha256.update(&buffer[..bytes_read]),
        }
    }

    Ok(match algorithm {
        HashAlgorithm::Md5 => hex::encode_upper(md5.compute().0),
        HashAlgorithm::Sha256 => hex::encode_upper(sha256.finalize()),
    })
}
