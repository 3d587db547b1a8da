//! Paginated fetching of a listing, one partition at a time.

use std::time::Duration;

use chrono::Local;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;

use crate::partition::PartitionKey;
use crate::request::{Endpoint, Transport};
use crate::{info_time, warn_time, Result, MAX_ATTEMPTS};

/// One row of `aaData`, fields rendered as text in the order the service sent them.
pub type RawRecord = Vec<String>;

#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(rename = "iTotalRecords")]
    total_records: usize,
}

#[derive(Debug, Deserialize)]
struct PageResponse {
    #[serde(rename = "aaData")]
    data: Vec<Vec<Value>>,
}

/// A page that never decoded within the attempt limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedPage {
    pub partition: PartitionKey,
    pub offset: usize,
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Fetched(Vec<RawRecord>),
    Dropped(DroppedPage),
}

/// Rows collected so far, in fetch order, plus every page that had to be given up on.
#[derive(Debug, Default)]
pub struct Accumulator {
    rows: Vec<RawRecord>,
    dropped: Vec<DroppedPage>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: PageOutcome) {
        match outcome {
            PageOutcome::Fetched(rows) => self.rows.extend(rows),
            PageOutcome::Dropped(page) => self.dropped.push(page),
        }
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn dropped(&self) -> &[DroppedPage] {
        &self.dropped
    }

    pub fn into_parts(self) -> (Vec<RawRecord>, Vec<DroppedPage>) {
        (self.rows, self.dropped)
    }
}

/// `floor(total / page_len) + 1`.
///
/// When `total` is an exact multiple of `page_len` the last page is empty; fetching it is harmless.
pub fn number_of_pages(total: usize, page_len: usize) -> usize {
    total / page_len + 1
}

/// `(start, end)` offsets of page `index`. `end` never exceeds `total`.
pub fn page_range(index: usize, total: usize, page_len: usize) -> (usize, usize) {
    let start = page_len * index;
    let end = if start + page_len < total {
        start + page_len
    } else {
        total
    };
    (start, end)
}

/// Pages through one listing endpoint.
pub struct Collector<'a, T> {
    transport: &'a T,
    endpoint: Endpoint,
    base_url: String,
    crawl_delay: Duration,
    max_attempts: usize,
}

impl<'a, T: Transport> Collector<'a, T> {
    pub fn new(transport: &'a T, endpoint: Endpoint, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint,
            base_url: base_url.into(),
            crawl_delay: endpoint.crawl_delay(),
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_crawl_delay(mut self, crawl_delay: Duration) -> Self {
        self.crawl_delay = crawl_delay;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn page_len(&self) -> usize {
        self.endpoint.page_len()
    }

    /// Total records the service reports for `key`. Not retried.
    pub async fn fetch_page_count(&self, key: &PartitionKey) -> Result<usize> {
        let url = self.endpoint.url(&self.base_url, key);
        let body = self.transport.get(&url, &self.endpoint.query(0)).await?;
        let count: CountResponse = serde_json::from_str(&body)?;
        Ok(count.total_records)
    }

    /// Fetches the page starting at `offset`, retrying while the body fails to decode.
    /// Transport errors are returned straight away.
    pub async fn fetch_page(&self, key: &PartitionKey, offset: usize) -> Result<PageOutcome> {
        let url = self.endpoint.url(&self.base_url, key);
        let query = self.endpoint.query(offset);

        for attempt in 1..=self.max_attempts {
            if !self.crawl_delay.is_zero() {
                sleep(self.crawl_delay).await;
            }
            let body = self.transport.get(&url, &query).await?;
            match decode_rows(&body) {
                Ok(rows) => return Ok(PageOutcome::Fetched(rows)),
                Err(e) => {
                    warn_time!("{}", decode_failure_notice(attempt, self.max_attempts, &e));
                }
            }
        }

        warn_time!(
            "DROPPED page of {} at offset {} after {} attempts",
            key,
            offset,
            self.max_attempts
        );
        Ok(PageOutcome::Dropped(DroppedPage {
            partition: key.clone(),
            offset,
            attempts: self.max_attempts,
        }))
    }

    /// Fetches every page of `key` in offset order and appends it to `acc`.
    pub async fn collect_partition(
        &self,
        key: &PartitionKey,
        mut acc: Accumulator,
    ) -> Result<Accumulator> {
        info_time!("Current partition = {}", key);
        let total = self.fetch_page_count(key).await?;
        info_time!("Total records = {}", total);

        let page_len = self.page_len();
        for index in 0..number_of_pages(total, page_len) {
            let (start, end) = page_range(index, total, page_len);
            info_time!("Fetching records {} to {}", start, end);
            let outcome = self.fetch_page(key, start).await?;
            acc.push(outcome);
        }
        Ok(acc)
    }

    /// Collects all `keys` strictly in the given order.
    pub async fn collect_all(&self, keys: &[PartitionKey]) -> Result<Accumulator> {
        let start_time = Local::now();
        let mut acc = Accumulator::new();
        for key in keys {
            acc = self.collect_partition(key, acc).await?;
        }
        info_time!(
            start_time,
            "Collected {} rows, {} pages dropped",
            acc.rows().len(),
            acc.dropped().len()
        );
        Ok(acc)
    }
}

fn decode_rows(body: &str) -> serde_json::Result<Vec<RawRecord>> {
    let page: PageResponse = serde_json::from_str(body)?;
    Ok(page
        .data
        .into_iter()
        .map(|row| row.into_iter().map(cell_text).collect())
        .collect())
}

fn decode_failure_notice(attempt: usize, max_attempts: usize, err: &serde_json::Error) -> String {
    let notice = format!("Decode error on attempt {attempt} of {max_attempts}: {err}.");
    if attempt < max_attempts {
        notice + " Retrying..."
    } else {
        notice
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
