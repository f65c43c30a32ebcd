//! Triage heuristics over reattached checker rows

use std::collections::{BTreeMap, HashSet};

use super::report_builder::ReportRow;
use crate::scanner::duplicate_detector::FileTable;

/// Findings written to the summary report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Heuristics {
    /// First manifest path of each unique file the checker did not report
    pub non_binaries: Vec<String>,
    /// Processed rows per directory
    pub folders: BTreeMap<String, usize>,
    /// Directories at or below the low-occupancy threshold
    pub low_occupancy: Vec<(String, usize)>,
    /// Processed paths containing a suspicious substring, in row order
    pub suspicious: Vec<String>,
}

impl Heuristics {
    pub fn derive<'a>(
        table: &FileTable,
        rows: impl IntoIterator<Item = &'a ReportRow>,
        low_loads: usize,
        suspicious_substrings: &[String],
    ) -> Self {
        let needles: Vec<String> = suspicious_substrings
            .iter()
            .map(|s| s.to_uppercase())
            .collect();

        let mut processed = HashSet::new();
        let mut folders: BTreeMap<String, usize> = BTreeMap::new();
        let mut suspicious = Vec::new();

        for row in rows {
            processed.insert(row.hash.to_uppercase());
            *folders.entry(parent_folder(row.path()).to_string()).or_insert(0) += 1;

            let upper = row.path().to_uppercase();
            if needles.iter().any(|needle| upper.contains(needle.as_str())) {
                suspicious.push(row.path().to_string());
            }
        }

        let non_binaries = table
            .iter()
            .filter(|file| !processed.contains(&file.hash.to_uppercase()))
            .map(|file| file.canonical_path().to_string())
            .collect();

        let low_occupancy = folders
            .iter()
            .filter(|(_, &count)| count <= low_loads)
            .map(|(folder, &count)| (folder.clone(), count))
            .collect();

        Self {
            non_binaries,
            folders,
            low_occupancy,
            suspicious,
        }
    }
}

/// Directory portion of a backslash- or slash-separated path
pub fn parent_folder(path: &str) -> &str {
    match path.rfind(['\\', '/']) {
        Some(0) => &path[..1],
        Some(idx) => &path[..idx],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use std::path::PathBuf;

    fn row(path: &str, hash: &str) -> ReportRow {
        ReportRow {
            fields: vec![path.to_string(), "Signed".to_string()],
            hash: hash.to_string(),
        }
    }

    fn table(entries: &[(&str, &str)]) -> FileTable {
        let mut table = FileTable::new();
        for (hash, path) in entries {
            table.insert(hash.to_string(), path.to_string(), PathBuf::from(path));
        }
        table
    }

    #[test]
    fn test_parent_folder() {
        assert_eq!(parent_folder(r"C:\app\a.exe"), r"C:\app");
        assert_eq!(parent_folder("a.exe"), "");
        assert_eq!(parent_folder(r"\a.exe"), r"\");
    }

    #[test]
    fn test_non_binaries_are_unreported_hashes() {
        let table = table(&[("AA", r"C:\app\a.exe"), ("BB", r"C:\app\fake.exe")]);
        let rows = vec![row(r"C:\app\a.exe", "aa")];

        let h = Heuristics::derive(&table, &rows, 1, &[]);
        assert_eq!(h.non_binaries, vec![r"C:\app\fake.exe"]);
    }

    #[test]
    fn test_low_occupancy_threshold() {
        let table = table(&[("AA", "x"), ("BB", "y"), ("CC", "z")]);
        let rows = vec![
            row(r"C:\shared\a.dll", "AA"),
            row(r"C:\shared\b.dll", "BB"),
            row(r"C:\lonely\c.dll", "CC"),
        ];

        let h = Heuristics::derive(&table, &rows, 1, &[]);
        assert_eq!(h.low_occupancy, vec![(r"C:\lonely".to_string(), 1)]);
        assert_eq!(h.folders[r"C:\shared"], 2);

        let h = Heuristics::derive(&table, &rows, 2, &[]);
        assert_eq!(h.low_occupancy.len(), 2);
    }

    #[test]
    fn test_suspicious_paths_case_insensitive() {
        let table = table(&[("AA", "x"), ("BB", "y"), ("CC", "z")]);
        let rows = vec![
            row(r"C:\users\bob\AppData\evil.exe", "AA"),
            row(r"C:\Program Files\ok.exe", "BB"),
            row(r"C:\Windows\TEMP\drop.dll", "CC"),
        ];

        let h = Heuristics::derive(&table, &rows, 1, &Config::default().suspicious_substrings);
        assert_eq!(
            h.suspicious,
            vec![r"C:\users\bob\AppData\evil.exe", r"C:\Windows\TEMP\drop.dll"]
        );
    }
}
