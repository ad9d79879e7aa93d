//! Run configuration.
//!
//! Everything the collector and merger need is carried in one explicit
//! [`HarvestConfig`] value. The defaults reproduce the listing site the
//! harvester was written for; tests point it at a mock server with zero delay.

use crate::error::{HarvestError, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://internshala.com/internships/";
pub const DEFAULT_SITE_ORIGIN: &str = "https://internshala.com";
pub const DEFAULT_PAGES: u32 = 3;
pub const DEFAULT_DELAY_SECS: u64 = 5;
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_OUTPUT_DIR: &str = "data1";
pub const DEFAULT_OUTPUT_FILE: &str = "internships.csv";
pub const DEFAULT_RECORD_KIND: &str = "Internship";
pub const DEFAULT_RECORD_SOURCE: &str = "Internshala";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0.0.0 Safari/537.36";

/// Configuration for a single harvest run.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Listing address of page 1. Later pages append `page-{n}/`.
    pub base_url: String,
    /// Origin used to resolve relative apply links.
    pub site_origin: String,
    /// Number of listing pages to visit, starting at 1.
    pub pages: u32,
    /// Pause after every page.
    pub request_delay: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Directory holding the persisted table.
    pub output_dir: PathBuf,
    /// File name of the persisted table inside `output_dir`.
    pub output_file: String,
    /// Constant category tag written into every record.
    pub record_kind: String,
    /// Constant origin tag written into every record.
    pub record_source: String,
    /// Header set sent with every request.
    pub headers: Vec<(String, String)>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            site_origin: DEFAULT_SITE_ORIGIN.to_string(),
            pages: DEFAULT_PAGES,
            request_delay: Duration::from_secs(DEFAULT_DELAY_SECS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            record_kind: DEFAULT_RECORD_KIND.to_string(),
            record_source: DEFAULT_RECORD_SOURCE.to_string(),
            headers: default_headers(),
        }
    }
}

/// Browser-like header set the listing site expects.
pub fn default_headers() -> Vec<(String, String)> {
    [
        ("User-Agent", USER_AGENT),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Accept-Encoding", "gzip, deflate, br"),
        ("Connection", "keep-alive"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl HarvestConfig {
    /// Full path of the persisted table.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_file)
    }

    /// Address of listing page `page` (1-based).
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            return self.base_url.clone();
        }
        if self.base_url.ends_with('/') {
            format!("{}page-{page}/", self.base_url)
        } else {
            format!("{}/page-{page}/", self.base_url)
        }
    }

    /// Reject configurations that cannot produce a single valid request.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| HarvestError::Config(format!("base url `{}`: {e}", self.base_url)))?;
        url::Url::parse(&self.site_origin).map_err(|e| {
            HarvestError::Config(format!("site origin `{}`: {e}", self.site_origin))
        })?;
        if self.output_file.trim().is_empty() {
            return Err(HarvestError::Config("output file name is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_urls() {
        let config = HarvestConfig::default();
        assert_eq!(config.page_url(1), "https://internshala.com/internships/");
        assert_eq!(
            config.page_url(3),
            "https://internshala.com/internships/page-3/"
        );
    }

    #[test]
    fn test_page_url_without_trailing_slash() {
        let config = HarvestConfig {
            base_url: "http://127.0.0.1:9000/listings".into(),
            ..HarvestConfig::default()
        };
        assert_eq!(config.page_url(1), "http://127.0.0.1:9000/listings");
        assert_eq!(config.page_url(2), "http://127.0.0.1:9000/listings/page-2/");
    }

    #[test]
    fn test_default_output_path() {
        let config = HarvestConfig::default();
        assert_eq!(config.output_path(), PathBuf::from("data1/internships.csv"));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let config = HarvestConfig {
            base_url: "not a url".into(),
            ..HarvestConfig::default()
        };
        assert!(matches!(config.validate(), Err(HarvestError::Config(_))));
        assert!(HarvestConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_headers_include_browser_agent() {
        let headers = default_headers();
        assert!(headers
            .iter()
            .any(|(k, v)| k == "User-Agent" && v.contains("Chrome/120")));
        assert_eq!(headers.len(), 4);
    }
}
