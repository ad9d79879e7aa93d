//! Extract internship cards from a listing page.
//!
//! Uses `scraper` CSS selectors against the raw HTML. Each card is handled
//! on its own: a card that cannot be read is reported and the rest of the
//! page still counts.

use crate::error::{HarvestError, Result};
use crate::record::{NOT_AVAILABLE, NOT_MENTIONED};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

const CARD: &str = "div.individual_internship";
const TITLE: &str = "h3.job-internship-name";
const ORGANIZATION: &str = "div.company_name";
const LOCATION: &str = "span.locations";
const STIPEND: &str = "span.stipend";
const DURATION: &str = "span.duration";
const APPLY_LINK: &str = "a.job-title-href";

/// Compiled selectors for one listing layout.
#[derive(Debug, Clone)]
pub struct ListingSelectors {
    card: Selector,
    title: Selector,
    organization: Selector,
    location: Selector,
    stipend: Selector,
    duration: Selector,
    apply_link: Selector,
}

impl ListingSelectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            card: compile(CARD)?,
            title: compile(TITLE)?,
            organization: compile(ORGANIZATION)?,
            location: compile(LOCATION)?,
            stipend: compile(STIPEND)?,
            duration: compile(DURATION)?,
            apply_link: compile(APPLY_LINK)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

/// Field values read from one card, before tagging and timestamping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub stipend: String,
    pub duration: String,
    pub apply_link: String,
}

/// Why a single card was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CardSkip {
    /// The apply anchor had an href that does not resolve to a URL.
    InvalidLink { index: usize, href: String, error: String },
}

impl std::fmt::Display for CardSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLink { index, href, error } => {
                write!(f, "card {index}: invalid apply link `{href}` ({error})")
            }
        }
    }
}

/// Everything extracted from one page of markup.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// Number of card containers found.
    pub cards: usize,
    /// Successfully read cards, in document order.
    pub listings: Vec<RawListing>,
    /// Cards that were skipped.
    pub skipped: Vec<CardSkip>,
}

/// Find every card on the page and read its fields.
pub fn extract_listings(html: &str, origin: &Url, selectors: &ListingSelectors) -> ExtractedPage {
    let document = Html::parse_document(html);
    let mut page = ExtractedPage::default();

    for (index, card) in document.select(&selectors.card).enumerate() {
        page.cards += 1;
        match extract_card(card, index, origin, selectors) {
            Ok(listing) => page.listings.push(listing),
            Err(skip) => page.skipped.push(skip),
        }
    }

    page
}

fn extract_card(
    card: ElementRef<'_>,
    index: usize,
    origin: &Url,
    selectors: &ListingSelectors,
) -> std::result::Result<RawListing, CardSkip> {
    let apply_link = match card
        .select(&selectors.apply_link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
    {
        Some(href) => resolve_link(origin, href).map_err(|e| CardSkip::InvalidLink {
            index,
            href: href.to_string(),
            error: e.to_string(),
        })?,
        None => NOT_AVAILABLE.to_string(),
    };

    Ok(RawListing {
        title: text_or_default(card, &selectors.title),
        organization: text_or_default(card, &selectors.organization),
        location: text_or_default(card, &selectors.location),
        stipend: text_or_default(card, &selectors.stipend),
        duration: text_or_default(card, &selectors.duration),
        apply_link,
    })
}

/// Build the absolute apply link for `href`.
///
/// Root-relative hrefs are appended to the origin as written, with no
/// percent-encoding or dot-segment removal, so the link stays byte-equal to
/// rows already stored under that key. Anything else is joined as a URL
/// reference.
fn resolve_link(origin: &Url, href: &str) -> std::result::Result<String, url::ParseError> {
    if href.starts_with('/') {
        let link = format!("{}{href}", origin.as_str().trim_end_matches('/'));
        Url::parse(&link)?;
        return Ok(link);
    }
    origin.join(href).map(|u| u.to_string())
}

/// Trimmed text of the first match, or the "Not Mentioned" placeholder.
fn text_or_default(card: ElementRef<'_>, selector: &Selector) -> String {
    card.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| NOT_MENTIONED.to_string())
}
