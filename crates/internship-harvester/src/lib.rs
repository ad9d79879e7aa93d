// Copyright 2026 Internship Harvester Contributors
// SPDX-License-Identifier: MIT

//! Internship harvester library: collect listing cards from paged HTML and
//! merge them into a CSV table deduplicated by apply link.

pub mod acquisition;
pub mod collector;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod table;

pub use config::HarvestConfig;
pub use error::{HarvestError, Result};
pub use record::Record;
pub use table::RecordTable;
