//! Mapping manifest paths onto the mounted image
//!
//! Manifest paths come from a case-insensitive filesystem. When the image is
//! mounted somewhere case-sensitive, each segment has to be matched against
//! the real directory listing.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::error::{BatchSigCheckError, Result};

/// Derive the image root from the manifest location: the third ancestor
/// of the manifest file, e.g. `X:\Windows\Prefetch\Layout.ini` -> `X:\`.
pub fn infer_root(manifest: &Path) -> PathBuf {
    let absolute = std::path::absolute(manifest).unwrap_or_else(|_| manifest.to_path_buf());
    let root = absolute
        .ancestors()
        .nth(3)
        .or_else(|| absolute.ancestors().last())
        .map(Path::to_path_buf);
    root.unwrap_or(absolute)
}

/// Split a manifest line into path segments, dropping the leading drive
/// component and any empty segments.
pub fn manifest_segments(line: &str) -> Vec<&str> {
    line.split('\\')
        .skip(1)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Resolve a manifest line to a local path under `root`.
pub fn resolve_manifest_path(root: &Path, line: &str) -> Result<PathBuf> {
    let segments = manifest_segments(line);
    if cfg!(windows) {
        for segment in &segments {
            reject_traversal(segment)?;
        }
        Ok(segments.iter().fold(root.to_path_buf(), |acc, s| acc.join(s)))
    } else {
        resolve_case_insensitive(root, &segments)
    }
}

/// Walk `segments` below `root`, matching each one case-insensitively
/// against the directory listing. An exact match wins; among several
/// case-variant matches the lexically smallest name is chosen.
pub fn resolve_case_insensitive(root: &Path, segments: &[&str]) -> Result<PathBuf> {
    let mut resolved = root.to_path_buf();

    for segment in segments {
        reject_traversal(segment)?;

        let exact = resolved.join(segment);
        if fs::symlink_metadata(&exact).is_ok() {
            resolved = exact;
            continue;
        }

        let wanted = segment.to_uppercase();
        let entries = fs::read_dir(&resolved).map_err(|e| BatchSigCheckError::io(&resolved, e))?;
        let matched = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.to_uppercase() == wanted)
            .min();

        match matched {
            Some(name) => resolved.push(name),
            None => {
                return Err(BatchSigCheckError::SegmentNotFound {
                    parent: resolved,
                    segment: segment.to_string(),
                })
            }
        }
    }

    Ok(resolved)
}

/// A segment must be exactly one plain path component; `.`, `..`, roots and
/// embedded separators would let a manifest line escape the root.
fn reject_traversal(segment: &str) -> Result<()> {
    let mut components = Path::new(segment).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(BatchSigCheckError::TraversalSegment(segment.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_segments_drop_drive() {
        assert_eq!(
            manifest_segments(r"C:\Program Files\app\a.exe"),
            vec!["Program Files", "app", "a.exe"]
        );
        assert_eq!(manifest_segments(r"C:\\dir\\x.dll"), vec!["dir", "x.dll"]);
        assert!(manifest_segments("C:").is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_infer_root_is_third_ancestor() {
        let root = infer_root(Path::new("/mnt/image/Windows/Prefetch/Layout.ini"));
        assert_eq!(root, PathBuf::from("/mnt/image"));
    }

    #[test]
    fn test_resolve_mixed_case_segments() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Program Files").join("App");
        fs::create_dir_all(&dir).unwrap();
        File::create(dir.join("Tool.EXE")).unwrap();

        let resolved =
            resolve_case_insensitive(temp_dir.path(), &["PROGRAM FILES", "app", "tool.exe"])
                .unwrap();
        assert_eq!(resolved, dir.join("Tool.EXE"));
    }

    #[test]
    fn test_resolve_missing_segment() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("Windows")).unwrap();

        let err = resolve_case_insensitive(temp_dir.path(), &["windows", "nothere.dll"])
            .unwrap_err();
        match err {
            BatchSigCheckError::SegmentNotFound { parent, segment } => {
                assert_eq!(parent, temp_dir.path().join("Windows"));
                assert_eq!(segment, "nothere.dll");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let err = resolve_case_insensitive(temp_dir.path(), &["..", "etc"]).unwrap_err();
        assert!(matches!(err, BatchSigCheckError::TraversalSegment(_)));
    }

    #[test]
    fn test_resolve_rejects_embedded_separators() {
        let temp_dir = TempDir::new().unwrap();
        let image = temp_dir.path().join("img");
        fs::create_dir_all(image.join("x")).unwrap();
        File::create(temp_dir.path().join("outside.dll")).unwrap();

        let err = resolve_manifest_path(&image, r"C:\x/../..\outside.dll").unwrap_err();
        assert!(matches!(err, BatchSigCheckError::TraversalSegment(_)));

        let err = resolve_manifest_path(&image, r"C:\x\./outside.dll").unwrap_err();
        assert!(matches!(err, BatchSigCheckError::TraversalSegment(_)));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_resolve_prefers_exact_match() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("a.dll")).unwrap();
        File::create(temp_dir.path().join("A.dll")).unwrap();

        let resolved = resolve_case_insensitive(temp_dir.path(), &["A.dll"]).unwrap();
        assert_eq!(resolved, temp_dir.path().join("A.dll"));
    }
}
