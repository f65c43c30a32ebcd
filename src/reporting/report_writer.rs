//! Report writing functionality

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::heuristics::Heuristics;
use super::report_builder::Reattached;
use super::tsv::write_row;

/// Write the reattached checker output as a tab-separated table
///
/// # Arguments
/// * `output_path` - Path to output file
/// * `reattached` - Header and rows in checker order
///
/// # Returns
/// Number of processed rows written
pub fn write_table(output_path: &Path, reattached: &Reattached) -> Result<usize> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    for record in &reattached.records {
        write_row(&mut writer, record.fields())?;
    }
    writer.flush()?;

    Ok(reattached.processed_count())
}

/// Write the triage summary
///
/// # Arguments
/// * `output_path` - Path to output file
/// * `heuristics` - Findings to render
pub fn write_summary(output_path: &Path, heuristics: &Heuristics) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    render_summary(&mut writer, heuristics)?;
    writer.flush()?;
    Ok(())
}

/// Render the three summary sections in fixed order
pub fn render_summary<W: Write>(out: &mut W, heuristics: &Heuristics) -> std::io::Result<()> {
    section(out, "Non-Binaries")?;
    if heuristics.non_binaries.is_empty() {
        writeln!(out, "None")?;
    }
    for path in &heuristics.non_binaries {
        writeln!(out, "{}", path)?;
    }
    writeln!(out)?;

    section(out, "Folder Heuristics")?;
    if heuristics.low_occupancy.is_empty() {
        writeln!(out, "None")?;
    }
    for (folder, count) in &heuristics.low_occupancy {
        writeln!(out, "{}\t{}", format_count(*count), folder)?;
    }
    writeln!(out)?;

    section(out, "Suspicious")?;
    if heuristics.suspicious.is_empty() {
        writeln!(out, "None")?;
    }
    for path in &heuristics.suspicious {
        writeln!(out, "{}", path)?;
    }

    Ok(())
}

fn section<W: Write>(out: &mut W, title: &str) -> std::io::Result<()> {
    let heading = format!("{}:", title);
    writeln!(out, "{}", heading)?;
    writeln!(out, "{}", "=".repeat(heading.len()))
}

/// Format a count with thousands separators
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::report_builder::{Record, ReportRow};
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(1), "1");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_empty_summary_reads_none() {
        let mut out = Vec::new();
        render_summary(&mut out, &Heuristics::default()).unwrap();

        let expected = "Non-Binaries:\n=============\nNone\n\n\
                        Folder Heuristics:\n==================\nNone\n\n\
                        Suspicious:\n===========\nNone\n";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn test_write_summary() {
        let temp_file = NamedTempFile::new().unwrap();
        let heuristics = Heuristics {
            non_binaries: vec![r"C:\app\readme.exe".into()],
            low_occupancy: vec![(r"C:\Users\bob".into(), 1)],
            suspicious: vec![r"C:\Users\bob\x.exe".into()],
            ..Heuristics::default()
        };

        write_summary(temp_file.path(), &heuristics).unwrap();

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("Non-Binaries:\n=============\nC:\\app\\readme.exe\n"));
        assert!(content.contains("Folder Heuristics:\n==================\n1\tC:\\Users\\bob\n"));
        assert!(content.contains("Suspicious:\n===========\nC:\\Users\\bob\\x.exe\n"));
    }

    #[test]
    fn test_write_table() {
        let temp_file = NamedTempFile::new().unwrap();
        let reattached = Reattached {
            has_header: true,
            records: vec![
                Record::Passthrough(vec!["Path".into(), "Verified".into()]),
                Record::Processed(ReportRow {
                    fields: vec![r"C:\app\a.exe".into(), "Signed".into()],
                    hash: "AA".into(),
                }),
            ],
        };

        let written = write_table(temp_file.path(), &reattached).unwrap();
        assert_eq!(written, 1);

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert_eq!(content, "Path\tVerified\nC:\\app\\a.exe\tSigned\n");
    }
}
