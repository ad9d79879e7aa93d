//! One harvest run: prepare the output directory, collect, merge, persist.
//!
//! Runs must not overlap on the same output file. Nothing here locks it.

use crate::acquisition::http_client::PageFetcher;
use crate::collector::{Clock, CollectionReport, Collector};
use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::table::{merge_into_file, MergeSummary};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Outcome of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub output_path: PathBuf,
    pub collection: CollectionReport,
    pub merge: MergeSummary,
}

/// Create the output directory if it is missing.
pub fn prepare_workspace(config: &HarvestConfig) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| HarvestError::io(&config.output_dir, e))
}

/// Collect every configured page and merge the result into the table.
///
/// Page and card failures end up in the returned report. Only a table that
/// cannot be read or written fails the run.
pub async fn harvest(
    config: &HarvestConfig,
    fetcher: &dyn PageFetcher,
    clock: &dyn Clock,
) -> Result<HarvestSummary> {
    let run_id = Uuid::new_v4();
    let started_at = Local::now();
    info!(%run_id, pages = config.pages, base_url = %config.base_url, "harvest started");

    config.validate()?;
    prepare_workspace(config)?;

    let collector = Collector::new(config, fetcher, clock)?;
    let collection = collector.collect().await;

    let output_path = config.output_path();
    let merge = merge_into_file(&output_path, collection.records.clone())?;

    let finished_at = Local::now();
    info!(
        %run_id,
        elapsed_ms = (finished_at - started_at).num_milliseconds(),
        "harvest completed"
    );

    Ok(HarvestSummary {
        run_id,
        started_at,
        finished_at,
        output_path,
        collection,
        merge,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_workspace_creates_nested_dir() {
        let dir = TempDir::new().unwrap();
        let config = HarvestConfig {
            output_dir: dir.path().join("data1").join("nested"),
            ..HarvestConfig::default()
        };

        prepare_workspace(&config).unwrap();
        assert!(config.output_dir.is_dir());
        // Idempotent.
        prepare_workspace(&config).unwrap();
    }
}
