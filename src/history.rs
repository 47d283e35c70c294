//! Append-only check history stored as CSV.
//!
//! One row per completed check: `timestamp,company_name,score,mode,filename`.
//! Rows are only ever appended — nothing here updates or deletes. The file
//! format is CSV with standard double-quote escaping so company names and
//! filenames may contain commas or quotes; a missing file reads as an
//! empty history.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::models::{CheckMode, HistoryRecord};

/// CSV header, fixed column order.
pub const HEADER: &str = "timestamp,company_name,score,mode,filename";

/// Location of the history file under the data directory.
pub fn history_path(data_dir: &Path) -> PathBuf {
    data_dir.join("history.csv")
}

/// Append one record, creating the file (with header) on first use.
pub fn append_history(path: &Path, record: &HistoryRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let is_new = !path.exists();

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open history file: {}", path.display()))?;

    if is_new {
        writeln!(file, "{}", HEADER)?;
    }

    let score_cell = record.score.map(|s| s.to_string()).unwrap_or_default();
    writeln!(
        file,
        "{},{},{},{},{}",
        escape_field(&record.timestamp),
        escape_field(&record.company_name),
        score_cell,
        escape_field(&record.mode),
        escape_field(&record.filename)
    )?;

    Ok(())
}

/// Load all records. A missing file is an empty history, not an error.
pub fn load_history(path: &Path) -> Result<Vec<HistoryRecord>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read history file: {}", path.display()))
        }
    };

    let mut rows = parse_csv(&content)?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    // Drop the header row.
    rows.remove(0);

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        if row.len() != 5 {
            bail!(
                "Malformed history row (expected 5 fields, got {}): {:?}",
                row.len(),
                row
            );
        }
        records.push(HistoryRecord {
            timestamp: row[0].clone(),
            company_name: row[1].clone(),
            score: row[2].trim().parse::<u32>().ok(),
            mode: row[3].clone(),
            filename: row[4].clone(),
        });
    }
    Ok(records)
}

/// Optional filters for the history listing. All active filters must match.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Exact company name.
    pub company: Option<String>,
    /// Exact mode label.
    pub mode: Option<String>,
    /// Substring of the filename.
    pub filename: Option<String>,
}

/// Apply a filter to a record list.
pub fn filter_history(records: &[HistoryRecord], filter: &HistoryFilter) -> Vec<HistoryRecord> {
    records
        .iter()
        .filter(|r| {
            filter.company.as_deref().map_or(true, |c| r.company_name == c)
                && filter.mode.as_deref().map_or(true, |m| r.mode == m)
                && filter
                    .filename
                    .as_deref()
                    .map_or(true, |f| r.filename.contains(f))
        })
        .cloned()
        .collect()
}

/// Score trend: criteria-mode rows that carry a score, ordered by
/// timestamp (the timestamp format sorts lexicographically).
pub fn score_trend(records: &[HistoryRecord]) -> Vec<(String, u32)> {
    let mut points: Vec<(String, u32)> = records
        .iter()
        .filter(|r| r.mode == CheckMode::Criteria.label())
        .filter_map(|r| r.score.map(|s| (r.timestamp.clone(), s)))
        .collect();
    points.sort();
    points
}

/// CLI entry point — print the (filtered) history and, on request, the
/// score trend for criteria checks.
pub fn run_history(data_dir: &Path, filter: &HistoryFilter, trend: bool) -> Result<()> {
    let records = load_history(&history_path(data_dir))?;
    if records.is_empty() {
        println!("No history yet. Run a check first.");
        return Ok(());
    }

    let filtered = filter_history(&records, filter);
    println!("--- History ({} of {} rows) ---", filtered.len(), records.len());
    for r in &filtered {
        println!(
            "{}  {:>3}  {}  {}  {}",
            r.timestamp,
            r.score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
            r.mode,
            r.company_name,
            r.filename
        );
    }

    if trend {
        // Trend is computed over the full history, not the filtered view.
        let points = score_trend(&records);
        println!();
        println!("--- Score trend ({}) ---", CheckMode::Criteria.label());
        if points.is_empty() {
            println!("No scores to plot.");
        } else {
            for (timestamp, score) in &points {
                println!(
                    "{}  {:>3} {}",
                    timestamp,
                    score,
                    "#".repeat((*score as usize).div_ceil(2))
                );
            }
        }
    }

    Ok(())
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Minimal CSV reader: double-quote escaping, quoted newlines, CRLF.
fn parse_csv(content: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\r' => {} // tolerate CRLF
            _ => field.push(ch),
        }
    }
    if in_quotes {
        bail!("Malformed history CSV: unterminated quoted field");
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(ts: &str, company: &str, score: Option<u32>, mode: CheckMode) -> HistoryRecord {
        HistoryRecord {
            timestamp: ts.to_string(),
            company_name: company.to_string(),
            score,
            mode: mode.label().to_string(),
            filename: "plan.pdf".to_string(),
        }
    }

    #[test]
    fn test_append_creates_file_with_header() {
        let tmp = TempDir::new().unwrap();
        let path = history_path(tmp.path());
        append_history(&path, &record("2026-01-05 09:00:00", "株式会社A", Some(72), CheckMode::Criteria)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HEADER));
        assert!(content.contains("株式会社A"));
    }

    #[test]
    fn test_append_then_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = history_path(tmp.path());
        let r1 = record("2026-01-05 09:00:00", "株式会社A", Some(72), CheckMode::Criteria);
        let r2 = record("2026-01-06 10:30:00", "株式会社B", None, CheckMode::Typo);
        append_history(&path, &r1).unwrap();
        append_history(&path, &r2).unwrap();

        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded, vec![r1, r2]);
    }

    #[test]
    fn test_missing_file_is_empty_history() {
        let tmp = TempDir::new().unwrap();
        assert!(load_history(&history_path(tmp.path())).unwrap().is_empty());
    }

    #[test]
    fn test_fields_with_commas_and_quotes() {
        let tmp = TempDir::new().unwrap();
        let path = history_path(tmp.path());
        let mut r = record("2026-01-05 09:00:00", "A, B \"合同\" 会社", Some(50), CheckMode::Criteria);
        r.filename = "計画,最終版.pdf".to_string();
        append_history(&path, &r).unwrap();

        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded, vec![r]);
    }

    #[test]
    fn test_filter_by_company_mode_filename() {
        let records = vec![
            record("2026-01-01 09:00:00", "株式会社A", Some(60), CheckMode::Criteria),
            record("2026-01-02 09:00:00", "株式会社B", Some(70), CheckMode::Criteria),
            record("2026-01-03 09:00:00", "株式会社A", None, CheckMode::Typo),
        ];

        let by_company = filter_history(
            &records,
            &HistoryFilter {
                company: Some("株式会社A".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_company.len(), 2);

        let by_mode = filter_history(
            &records,
            &HistoryFilter {
                mode: Some(CheckMode::Typo.label().to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_mode.len(), 1);

        let by_file = filter_history(
            &records,
            &HistoryFilter {
                filename: Some("plan".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(by_file.len(), 3);
    }

    #[test]
    fn test_score_trend_criteria_only_sorted() {
        let records = vec![
            record("2026-01-03 09:00:00", "A", Some(80), CheckMode::Criteria),
            record("2026-01-01 09:00:00", "A", Some(60), CheckMode::Criteria),
            record("2026-01-02 09:00:00", "A", Some(99), CheckMode::Typo),
            record("2026-01-04 09:00:00", "A", None, CheckMode::Criteria),
        ];
        let trend = score_trend(&records);
        assert_eq!(
            trend,
            vec![
                ("2026-01-01 09:00:00".to_string(), 60),
                ("2026-01-03 09:00:00".to_string(), 80),
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_is_an_error() {
        assert!(parse_csv("a,\"b,c\n").is_err());
    }
}
