//! Link staging
//!
//! Every unique file gets one entry named `<HASH>.<ext>` in a fresh scratch
//! directory so the checker can scan them all in one invocation. The
//! directory is a `TempDir`, so it is removed when `StagedLinks` drops,
//! whichever way the run ends.

use std::fs;
use std::io;
use std::path::Path;
use tempfile::TempDir;
use tracing::{error, info, warn};

use crate::core::config::StageMode;
use crate::core::error::{BatchSigCheckError, Result};
use crate::scanner::duplicate_detector::FileTable;

const SCRATCH_PREFIX: &str = "batchsigcheck-";

/// A populated scratch directory
#[derive(Debug)]
pub struct StagedLinks {
    dir: TempDir,
    count: usize,
}

impl StagedLinks {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Number of references actually created
    pub fn count(&self) -> usize {
        self.count
    }

    /// Remove the scratch directory now, logging any failure
    pub fn close(self) {
        let path = self.dir.path().to_path_buf();
        info!("Removing temporary folder.");
        if let Err(e) = self.dir.close() {
            error!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Name of the staged reference for `hash`
pub fn link_name(hash: &str, extension: &str) -> String {
    format!("{}.{}", hash, extension)
}

/// Stage one reference per unique file. Returns `None` without touching
/// the filesystem when the table is empty.
pub fn stage_links(
    table: &FileTable,
    extension: &str,
    mode: StageMode,
) -> Result<Option<StagedLinks>> {
    if table.is_empty() {
        return Ok(None);
    }

    let dir = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempdir()
        .map_err(|e| BatchSigCheckError::io(std::env::temp_dir(), e))?;
    info!("Created temporary folder: {}", dir.path().display());

    info!("Creating links...");
    let mut count = 0;
    for file in table.iter() {
        let link = dir.path().join(link_name(&file.hash, extension));
        match make_reference(&file.local_path, &link, mode) {
            Ok(()) => count += 1,
            Err(e) => warn!(
                "Could not stage {} -> {}: {}",
                link.display(),
                file.local_path.display(),
                e
            ),
        }
    }
    info!("Done; created {} links.", count);

    if count < table.len() {
        warn!(
            "Staged {} of {} unique files; the rest will not be checked",
            count,
            table.len()
        );
    }

    Ok(Some(StagedLinks { dir, count }))
}

fn make_reference(target: &Path, link: &Path, mode: StageMode) -> io::Result<()> {
    match mode {
        StageMode::Symlink => symlink(target, link),
        StageMode::Copy => fs::copy(target, link).map(|_| ()),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

#[cfg(not(any(unix, windows)))]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    fs::copy(target, link).map(|_| ())
}
