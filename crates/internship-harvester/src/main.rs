// Copyright 2026 Internship Harvester Contributors
// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::Parser;
use internship_harvester::acquisition::http_client::HttpClient;
use internship_harvester::collector::{PageOutcome, SystemClock};
use internship_harvester::pipeline::{self, HarvestSummary};
use internship_harvester::HarvestConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Running without arguments harvests the default site into
/// `data1/internships.csv`. Do not run two harvests against the same output
/// file at once.
#[derive(Parser)]
#[command(
    name = "internship-harvester",
    about = "Collect internship listings and merge them into a deduplicated CSV table",
    version
)]
struct Cli {
    /// Listing address of page 1
    #[arg(long)]
    base_url: Option<String>,

    /// Origin used to resolve relative apply links
    #[arg(long)]
    site_origin: Option<String>,

    /// Number of listing pages to visit
    #[arg(long)]
    pages: Option<u32>,

    /// Seconds to wait after each page
    #[arg(long)]
    delay_secs: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Path of the CSV table
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> HarvestConfig {
        let mut config = HarvestConfig::default();
        if let Some(url) = self.base_url {
            config.base_url = url;
        }
        if let Some(origin) = self.site_origin {
            config.site_origin = origin;
        }
        if let Some(pages) = self.pages {
            config.pages = pages;
        }
        if let Some(secs) = self.delay_secs {
            config.request_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = self.output {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                config.output_dir = parent.to_path_buf();
            } else {
                config.output_dir = PathBuf::from(".");
            }
            if let Some(name) = path.file_name() {
                config.output_file = name.to_string_lossy().into_owned();
            }
        }
        config
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "internship_harvester=debug"
    } else if quiet {
        "internship_harvester=warn"
    } else {
        "internship_harvester=info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let (json, quiet) = (cli.json, cli.quiet);
    init_tracing(cli.verbose, quiet);

    let config = cli.into_config();
    let fetcher = HttpClient::new(&config).context("failed to build HTTP client")?;

    let result = pipeline::harvest(&config, &fetcher, &SystemClock)
        .await
        .with_context(|| format!("harvest into {} failed", config.output_path().display()));

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "error": true, "message": format!("{e:#}") })
                );
            } else if !quiet {
                eprintln!("  Error: {e:#}");
            }
            std::process::exit(1);
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if !quiet {
        print_summary(&summary);
    }

    Ok(())
}

fn print_summary(summary: &HarvestSummary) {
    println!("Harvest {}", summary.run_id);
    println!("  started:  {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  finished: {}", summary.finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!();

    for page in &summary.collection.pages {
        match &page.outcome {
            PageOutcome::Parsed { cards, records } => println!(
                "  [OK] page {:<3} {cards} cards, {records} records  {}",
                page.page, page.url
            ),
            PageOutcome::Skipped(skip) => {
                println!("  [!!] page {:<3} skipped: {skip}  {}", page.page, page.url)
            }
        }
        for card in &page.card_skips {
            println!("         {card}");
        }
    }

    println!();
    let merge = &summary.merge;
    if merge.written {
        println!(
            "  Saved records: {} ({} existing, {} new, {} superseded) -> {}",
            merge.total_rows,
            merge.existing_rows,
            merge.incoming_rows,
            merge.superseded_rows,
            summary.output_path.display()
        );
    } else {
        println!("  Nothing collected and no existing table; nothing written.");
    }
}
