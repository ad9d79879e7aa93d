//! The listing record and its CSV column layout.

use serde::{Deserialize, Serialize};

/// Placeholder for a text field the card did not provide.
pub const NOT_MENTIONED: &str = "Not Mentioned";
/// Placeholder for a card without a usable apply link.
pub const NOT_AVAILABLE: &str = "Not Available";

/// Column names of the persisted table, in order.
pub const COLUMNS: [&str; 9] = [
    "title",
    "organization",
    "location",
    "stipend",
    "duration",
    "type",
    "source",
    "apply_link",
    "last_scraped_at",
];

/// One extracted internship listing.
///
/// `apply_link` identifies the listing; `scraped_at` only records when it was
/// last seen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub title: String,
    pub organization: String,
    pub location: String,
    pub stipend: String,
    pub duration: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub apply_link: String,
    #[serde(rename = "last_scraped_at")]
    pub scraped_at: String,
}
