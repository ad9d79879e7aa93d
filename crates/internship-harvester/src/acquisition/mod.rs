//! Page acquisition: HTTP fetches and listing extraction from raw HTML.

pub mod http_client;
pub mod listing;
