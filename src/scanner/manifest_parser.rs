//! Layout manifest scanning
//!
//! Reads a UTF-16LE manifest, keeps candidate binaries, resolves them under
//! the image root and deduplicates them by content hash. Failures on single
//! files are logged and counted; only an unreadable manifest aborts.

use encoding_rs::UTF_16LE;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use super::duplicate_detector::{compute_file_hash, FileTable, Insertion};
use super::path_resolver::resolve_manifest_path;
use crate::core::config::{HashAlgorithm, PathRules};
use crate::core::error::{BatchSigCheckError, Result};

/// Per-scan settings taken from the run configuration
#[derive(Debug, Clone)]
pub struct ScanSettings {
    pub rules: PathRules,
    pub max_file_size: u64,
    pub hash_algorithm: HashAlgorithm,
    pub show_progress: bool,
}

/// What happened to a single manifest line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Ignored,
    Skipped,
    TooBig,
    Errored,
    Duplicate,
    Unique,
}

/// Counters reported at the end of a scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub total: usize,
    pub duplicates: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub too_big: usize,
    pub errored: usize,
}

impl ScanStats {
    pub fn record(&mut self, outcome: LineOutcome) {
        self.total += 1;
        match outcome {
            LineOutcome::Ignored => self.ignored += 1,
            LineOutcome::Skipped => self.skipped += 1,
            LineOutcome::TooBig => self.too_big += 1,
            LineOutcome::Errored => self.errored += 1,
            LineOutcome::Duplicate => self.duplicates += 1,
            LineOutcome::Unique => {}
        }
    }
}

/// Result of scanning one manifest
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub table: FileTable,
    pub stats: ScanStats,
}

impl ScanOutcome {
    pub fn unique_count(&self) -> usize {
        self.table.len()
    }
}

/// Read and decode a UTF-16LE manifest. A leading BOM is stripped.
pub fn read_manifest(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|source| BatchSigCheckError::ManifestRead {
        path: path.to_path_buf(),
        source,
    })?;
    let (text, _, had_errors) = UTF_16LE.decode(&bytes);
    if had_errors {
        error!("Manifest {} contains invalid UTF-16; bad units replaced", path.display());
    }
    Ok(text.into_owned())
}

/// Scan the manifest at `manifest` with files resolved under `root`
pub fn parse_manifest(
    manifest: &Path,
    root: &Path,
    settings: &ScanSettings,
) -> Result<ScanOutcome> {
    let text = read_manifest(manifest)?;
    info!("Building hash table...");

    let lines: Vec<&str> = text.lines().collect();
    let progress = if settings.show_progress {
        let pb = ProgressBar::new(lines.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut outcome = ScanOutcome::default();
    for line in lines {
        let result = scan_line(line.trim(), root, settings, &mut outcome.table);
        outcome.stats.record(result);
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!("Done.");
    log_stats(&outcome);
    Ok(outcome)
}

/// Classify, resolve and hash a single trimmed manifest line
pub fn scan_line(
    line: &str,
    root: &Path,
    settings: &ScanSettings,
    table: &mut FileTable,
) -> LineOutcome {
    if !settings.rules.is_candidate(line) {
        return LineOutcome::Ignored;
    }
    if settings.rules.is_skipped(line) {
        return LineOutcome::Skipped;
    }

    let local_path = match resolve_manifest_path(root, line) {
        Ok(path) => path,
        Err(e) => {
            error!("{}: {}", line, e);
            return LineOutcome::Errored;
        }
    };

    match hash_candidate(&local_path, settings) {
        Ok(Some(hash)) => match table.insert(hash, line.to_string(), local_path) {
            Insertion::Unique => LineOutcome::Unique,
            Insertion::Duplicate => LineOutcome::Duplicate,
        },
        Ok(None) => {
            info!("File too big: {}", line);
            LineOutcome::TooBig
        }
        Err(e) => {
            error!("{}", e);
            LineOutcome::Errored
        }
    }
}

/// Hash a resolved file, or `None` when it exceeds the size ceiling
fn hash_candidate(local_path: &Path, settings: &ScanSettings) -> Result<Option<String>> {
    let metadata = fs::metadata(local_path).map_err(|e| BatchSigCheckError::io(local_path, e))?;
    if metadata.len() > settings.max_file_size {
        return Ok(None);
    }
    compute_file_hash(local_path, settings.hash_algorithm).map(Some)
}

fn log_stats(outcome: &ScanOutcome) {
    let stats = &outcome.stats;
    info!("Total Lines: {}", stats.total);
    info!("Duplicates: {}", stats.duplicates);
    info!("Ignored: {}", stats.ignored);
    info!("Skipped: {}", stats.skipped);
    info!("Too Big: {}", stats.too_big);
    info!("Errored: {}", stats.errored);
    info!("To Process: {}", outcome.unique_count());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn settings() -> ScanSettings {
        ScanSettings {
            rules: Config::default().path_rules().unwrap(),
            max_file_size: 64,
            hash_algorithm: HashAlgorithm::Md5,
            show_progress: false,
        }
    }

    #[test]
    fn test_read_manifest_strips_bom() {
        let mut file = NamedTempFile::new().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "C:\\a.exe\r\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        file.write_all(&bytes).unwrap();

        assert_eq!(read_manifest(file.path()).unwrap(), "C:\\a.exe\r\n");
    }

    #[test]
    fn test_read_manifest_missing_is_fatal() {
        let err = read_manifest(Path::new("/nonexistent/Layout.ini")).unwrap_err();
        assert!(matches!(err, BatchSigCheckError::ManifestRead { .. }));
    }

    #[test]
    fn test_scan_line_classification() {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("app")).unwrap();
        fs::write(root.path().join("app").join("big.exe"), vec![0u8; 65]).unwrap();
        fs::write(root.path().join("app").join("ok.dll"), b"MZ").unwrap();

        let settings = settings();
        let mut table = FileTable::new();

        assert_eq!(
            scan_line(r"C:\app\notes.txt", root.path(), &settings, &mut table),
            LineOutcome::Ignored
        );
        assert_eq!(
            scan_line(r"C:\Windows\System32\kernel32.dll", root.path(), &settings, &mut table),
            LineOutcome::Skipped
        );
        assert_eq!(
            scan_line(r"C:\app\big.exe", root.path(), &settings, &mut table),
            LineOutcome::TooBig
        );
        assert_eq!(
            scan_line(r"C:\app\missing.sys", root.path(), &settings, &mut table),
            LineOutcome::Errored
        );
        assert_eq!(
            scan_line(r"C:\APP\OK.DLL", root.path(), &settings, &mut table),
            LineOutcome::Unique
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_stats_record() {
        let mut stats = ScanStats::default();
        for outcome in [
            LineOutcome::Unique,
            LineOutcome::Duplicate,
            LineOutcome::Duplicate,
            LineOutcome::Ignored,
            LineOutcome::TooBig,
        ] {
            stats.record(outcome);
        }
        assert_eq!(stats.total, 5);
        assert_eq!(stats.duplicates, 2);
        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.too_big, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(stats.errored, 0);
    }
}
