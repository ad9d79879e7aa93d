//! Persisted record table and the deduplicating merge.
//!
//! The table lives in a single CSV file that is read whole at the start of a
//! merge and rewritten whole at the end. There is no locking: two runs
//! against the same file race and the last writer wins.

use crate::error::{HarvestError, Result};
use crate::record::{Record, COLUMNS};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Ordered collection of records keyed by `apply_link`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordTable {
    rows: Vec<Record>,
}

impl RecordTable {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row with the given link, if any.
    pub fn get(&self, apply_link: &str) -> Option<&Record> {
        self.rows.iter().find(|r| r.apply_link == apply_link)
    }

    /// Load the table from `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist. A file that exists
    /// but cannot be parsed into records is an error.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let mut reader = match csv::Reader::from_path(path) {
            Ok(r) => r,
            Err(e) => {
                if let csv::ErrorKind::Io(io) = e.kind() {
                    if io.kind() == std::io::ErrorKind::NotFound {
                        return Ok(None);
                    }
                }
                return Err(HarvestError::csv(path, e));
            }
        };

        let rows = reader
            .deserialize::<Record>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| HarvestError::csv(path, e))?;

        debug!(path = %path.display(), rows = rows.len(), "loaded record table");
        Ok(Some(Self { rows }))
    }

    /// Overwrite `path` with the full table, header row first.
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| HarvestError::csv(path, e))?;

        wtr.write_record(COLUMNS)
            .map_err(|e| HarvestError::csv(path, e))?;
        for row in &self.rows {
            wtr.serialize(row).map_err(|e| HarvestError::csv(path, e))?;
        }
        wtr.flush().map_err(|e| HarvestError::io(path, e))?;

        debug!(path = %path.display(), rows = self.rows.len(), "wrote record table");
        Ok(())
    }
}

/// Keep only the last occurrence of every `apply_link`.
///
/// Surviving rows stay in the order of their positions in `rows`.
pub fn dedup_keep_last(rows: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    let mut kept: Vec<Record> = rows
        .into_iter()
        .rev()
        .filter(|r| seen.insert(r.apply_link.clone()))
        .collect();
    kept.reverse();
    kept
}

/// Concatenate `existing ++ incoming` and drop superseded duplicates.
pub fn merge(existing: Option<RecordTable>, incoming: Vec<Record>) -> RecordTable {
    let mut rows = existing.map(RecordTable::into_rows).unwrap_or_default();
    rows.extend(incoming);
    RecordTable::new(dedup_keep_last(rows))
}

/// Counts describing one read-merge-write cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Rows found in the file before the merge (0 if it did not exist).
    pub existing_rows: usize,
    /// Records handed in by the collector.
    pub incoming_rows: usize,
    /// Rows in the table after deduplication.
    pub total_rows: usize,
    /// Rows dropped because a later row shared their link.
    pub superseded_rows: usize,
    /// Whether the file was (re)written.
    pub written: bool,
}

/// Merge `incoming` into the table stored at `path`.
///
/// The file is rewritten in full whenever it existed or there is something
/// to store. A first run that collected nothing leaves the disk untouched.
pub fn merge_into_file(path: &Path, incoming: Vec<Record>) -> Result<MergeSummary> {
    let existing = RecordTable::read(path)?;
    let existing_rows = existing.as_ref().map_or(0, RecordTable::len);
    let incoming_rows = incoming.len();

    if existing.is_none() && incoming.is_empty() {
        info!(path = %path.display(), "no existing table and nothing collected, skipping write");
        return Ok(MergeSummary::default());
    }

    let merged = merge(existing, incoming);
    merged.write(path)?;

    let summary = MergeSummary {
        existing_rows,
        incoming_rows,
        total_rows: merged.len(),
        superseded_rows: existing_rows + incoming_rows - merged.len(),
        written: true,
    };
    info!(
        path = %path.display(),
        saved = summary.total_rows,
        superseded = summary.superseded_rows,
        "saved records"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rec(link: &str, title: &str) -> Record {
        Record {
            title: title.into(),
            organization: "Org".into(),
            location: "Remote".into(),
            stipend: "10000".into(),
            duration: "2 Months".into(),
            kind: "Internship".into(),
            source: "Internshala".into(),
            apply_link: link.into(),
            scraped_at: "2026-01-01 00:00:00".into(),
        }
    }

    fn links(table: &RecordTable) -> Vec<&str> {
        table.rows().iter().map(|r| r.apply_link.as_str()).collect()
    }

    #[test]
    fn test_merge_without_existing_is_incoming() {
        let merged = merge(None, vec![rec("a", "A"), rec("b", "B")]);
        assert_eq!(links(&merged), vec!["a", "b"]);
    }

    #[test]
    fn test_merge_with_empty_incoming_is_identity() {
        let existing = RecordTable::new(vec![rec("a", "A"), rec("b", "B"), rec("c", "C")]);
        let merged = merge(Some(existing.clone()), Vec::new());
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_incoming_supersedes_existing() {
        let existing = RecordTable::new(vec![rec("a", "Old"), rec("b", "Keep")]);
        let merged = merge(Some(existing), vec![rec("a", "New")]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("a").unwrap().title, "New");
        // Retained rows follow their position in existing ++ incoming.
        assert_eq!(links(&merged), vec!["b", "a"]);
    }

    #[test]
    fn test_last_incoming_duplicate_wins() {
        let merged = merge(
            None,
            vec![rec("x", "first"), rec("y", "Y"), rec("x", "second")],
        );
        assert_eq!(links(&merged), vec!["y", "x"]);
        assert_eq!(merged.get("x").unwrap().title, "second");
    }

    #[test]
    fn test_links_are_unique_after_merge() {
        let existing = RecordTable::new(vec![rec("a", "1"), rec("a", "2"), rec("b", "3")]);
        let merged = merge(
            Some(existing),
            vec![rec("b", "4"), rec("c", "5"), rec("a", "6"), rec("c", "7")],
        );
        let unique: HashSet<&str> = links(&merged).into_iter().collect();
        assert_eq!(unique.len(), merged.len());
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_read_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let table = RecordTable::read(&dir.path().join("absent.csv")).unwrap();
        assert!(table.is_none());
    }

    #[test]
    fn test_write_then_read_keeps_rows_and_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("internships.csv");
        let table = RecordTable::new(vec![rec("https://x.com/a", "Title, with comma")]);

        table.write(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("title,organization,location,stipend,duration,type,source,apply_link,last_scraped_at\n"));

        let back = RecordTable::read(&path).unwrap().unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_empty_table_still_writes_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("internships.csv");
        RecordTable::default().write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.trim_end(), COLUMNS.join(","));
        assert!(RecordTable::read(&path).unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_read_rejects_missing_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "title,organization\nA,B\n").unwrap();

        assert!(matches!(
            RecordTable::read(&path),
            Err(HarvestError::Csv { .. })
        ));
    }

    #[test]
    fn test_merge_into_file_first_empty_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("internships.csv");

        let summary = merge_into_file(&path, Vec::new()).unwrap();

        assert!(!summary.written);
        assert!(!path.exists());
    }

    #[test]
    fn test_merge_into_file_rewrites_on_empty_batch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("internships.csv");
        RecordTable::new(vec![rec("a", "A")]).write(&path).unwrap();

        let summary = merge_into_file(&path, Vec::new()).unwrap();

        assert!(summary.written);
        assert_eq!(summary.existing_rows, 1);
        assert_eq!(summary.total_rows, 1);
        assert_eq!(summary.superseded_rows, 0);
    }

    #[test]
    fn test_merge_into_file_counts_superseded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("internships.csv");
        RecordTable::new(vec![rec("a", "Old"), rec("b", "B")])
            .write(&path)
            .unwrap();

        let summary = merge_into_file(&path, vec![rec("a", "New"), rec("c", "C")]).unwrap();

        assert_eq!(
            summary,
            MergeSummary {
                existing_rows: 2,
                incoming_rows: 2,
                total_rows: 3,
                superseded_rows: 1,
                written: true,
            }
        );
        let stored = RecordTable::read(&path).unwrap().unwrap();
        assert_eq!(stored.get("a").unwrap().title, "New");
    }
}
