//! Metal Archives listing scraper.
//! Pages through the site's AJAX listings one partition at a time and writes
//! the accumulated rows to a dated CSV file.

use std::time::Duration;

mod error;
mod macros;

pub mod collect;
pub mod config;
pub mod parse;
pub mod partition;
pub mod process;
pub mod request;
pub mod table;

pub use error::{Error, Result};

const BASE_URL: &str = "http://www.metal-archives.com";
/// Attempts per page before it is dropped.
const MAX_ATTEMPTS: usize = 10;
/// From the site's robots.txt: "Crawl-delay: 3".
const CRAWL_DELAY: Duration = Duration::from_secs(3);
/// The band listing rejects any other length.
const BAND_PAGE_LEN: usize = 500;
/// The review listing rejects any other length.
const REVIEW_PAGE_LEN: usize = 200;
/// Characters trimmed off the end of a review heading (the " - 85%" score).
const REVIEW_TITLE_SUFFIX_LEN: usize = 6;
