//! Walk the listing pages and turn their cards into records.
//!
//! Pages are visited one at a time, in order. A page that cannot be fetched
//! and a card that cannot be read are both recorded in the
//! [`CollectionReport`] and skipped; nothing here aborts the run.

use crate::acquisition::http_client::PageFetcher;
use crate::acquisition::listing::{extract_listings, CardSkip, ListingSelectors, RawListing};
use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::record::Record;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

/// Format of the `last_scraped_at` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Source of capture timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Why a whole page was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum PageSkip {
    /// The server answered with something other than 200.
    BadStatus { status: u16 },
    /// The request never produced a response.
    Transport { error: String },
}

impl std::fmt::Display for PageSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadStatus { status } => write!(f, "HTTP status {status}"),
            Self::Transport { error } => write!(f, "transport error: {error}"),
        }
    }
}

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PageOutcome {
    Parsed { cards: usize, records: usize },
    Skipped(PageSkip),
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    pub page: u32,
    pub url: String,
    /// Status of the response, when one arrived.
    pub status: Option<u16>,
    pub outcome: PageOutcome,
    pub card_skips: Vec<CardSkip>,
}

/// Records gathered by one collection pass plus a per-page account.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionReport {
    pub records: Vec<Record>,
    pub pages: Vec<PageReport>,
}

impl CollectionReport {
    pub fn pages_fetched(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p.outcome, PageOutcome::Parsed { .. }))
            .count()
    }

    pub fn pages_skipped(&self) -> usize {
        self.pages.len() - self.pages_fetched()
    }

    pub fn cards_skipped(&self) -> usize {
        self.pages.iter().map(|p| p.card_skips.len()).sum()
    }
}

/// Sequential page collector.
pub struct Collector<'a> {
    config: &'a HarvestConfig,
    fetcher: &'a dyn PageFetcher,
    clock: &'a dyn Clock,
    selectors: ListingSelectors,
    origin: Url,
}

impl<'a> Collector<'a> {
    pub fn new(
        config: &'a HarvestConfig,
        fetcher: &'a dyn PageFetcher,
        clock: &'a dyn Clock,
    ) -> Result<Self> {
        let origin = Url::parse(&config.site_origin).map_err(|e| {
            HarvestError::Config(format!("site origin `{}`: {e}", config.site_origin))
        })?;

        Ok(Self {
            config,
            fetcher,
            clock,
            selectors: ListingSelectors::new()?,
            origin,
        })
    }

    /// Visit pages `1..=pages` and gather every readable card.
    ///
    /// The configured delay runs after every page, including skipped pages
    /// and the last one.
    pub async fn collect(&self) -> CollectionReport {
        let mut report = CollectionReport::default();

        for page in 1..=self.config.pages {
            let (page_report, records) = self.collect_page(page).await;
            report.records.extend(records);
            report.pages.push(page_report);

            if !self.config.request_delay.is_zero() {
                debug!(delay = ?self.config.request_delay, "waiting before next page");
                tokio::time::sleep(self.config.request_delay).await;
            }
        }

        info!(
            pages = report.pages.len(),
            skipped_pages = report.pages_skipped(),
            skipped_cards = report.cards_skipped(),
            records = report.records.len(),
            "collection finished"
        );

        report
    }

    async fn collect_page(&self, page: u32) -> (PageReport, Vec<Record>) {
        let url = self.config.page_url(page);
        info!(page, url = %url, "fetching listing page");

        let response = match self.fetcher.fetch(&url).await {
            Ok(r) => r,
            Err(e) => {
                let skip = PageSkip::Transport {
                    error: format!("{e:#}"),
                };
                warn!(page, %skip, "skipping page");
                return (skipped(page, url, None, skip), Vec::new());
            }
        };

        debug!(page, status = response.status, bytes = response.body.len(), "page received");

        if !response.is_ok() {
            let skip = PageSkip::BadStatus {
                status: response.status,
            };
            warn!(page, %skip, "skipping page");
            return (skipped(page, url, Some(response.status), skip), Vec::new());
        }

        let extracted = extract_listings(&response.body, &self.origin, &self.selectors);
        for skip in &extracted.skipped {
            warn!(page, %skip, "skipping card");
        }

        let scraped_at = self.clock.now().format(TIMESTAMP_FORMAT).to_string();
        let records: Vec<Record> = extracted
            .listings
            .into_iter()
            .map(|raw| self.to_record(raw, &scraped_at))
            .collect();

        info!(page, cards = extracted.cards, records = records.len(), "internships found on page");

        let report = PageReport {
            page,
            url,
            status: Some(response.status),
            outcome: PageOutcome::Parsed {
                cards: extracted.cards,
                records: records.len(),
            },
            card_skips: extracted.skipped,
        };
        (report, records)
    }

    fn to_record(&self, raw: RawListing, scraped_at: &str) -> Record {
        Record {
            title: raw.title,
            organization: raw.organization,
            location: raw.location,
            stipend: raw.stipend,
            duration: raw.duration,
            kind: self.config.record_kind.clone(),
            source: self.config.record_source.clone(),
            apply_link: raw.apply_link,
            scraped_at: scraped_at.to_string(),
        }
    }
}

fn skipped(page: u32, url: String, status: Option<u16>, skip: PageSkip) -> PageReport {
    PageReport {
        page,
        url,
        status,
        outcome: PageOutcome::Skipped(skip),
        card_skips: Vec::new(),
    }
}
