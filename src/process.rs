use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use tokio::time::sleep;

use crate::collect::{number_of_pages, page_range, Collector, DroppedPage, PageOutcome};
use crate::config::Settings;
use crate::parse::{parse_review, review_link};
use crate::partition::{NbrStyle, PartitionKey};
use crate::request::{Endpoint, Transport};
use crate::table::Table;
use crate::{info_time, warn_time, Error, Result};

pub fn band_file_name(date: &str) -> String {
    format!("MA-band-names_{date}.csv")
}

pub fn review_file_name(date: &str, key: &str, chunk: usize) -> String {
    format!("MA-reviews_{date}_{key}{chunk:03}.csv")
}

/// Name of the dropped-page manifest written next to `output`.
pub fn manifest_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_dropped.csv"))
}

fn collector<'a, T: Transport>(
    transport: &'a T,
    endpoint: Endpoint,
    settings: &Settings,
) -> Collector<'a, T> {
    let collector = Collector::new(transport, endpoint, settings.base_url.clone());
    match settings.crawl_delay {
        Some(delay) => collector.with_crawl_delay(delay),
        None => collector,
    }
}

fn check_partitions(endpoint: Endpoint, keys: &[PartitionKey]) -> Result<()> {
    match keys.iter().find(|key| !endpoint.accepts(key)) {
        Some(key) => Err(Error::InvalidPartition(format!("{key} for {endpoint:?} listing"))),
        None => Ok(()),
    }
}

/// Scrapes the band listing for every key in `keys` and writes one CSV.
/// Returns the path of the written file.
pub async fn process_bands<T: Transport>(
    transport: &T,
    settings: &Settings,
    keys: &[PartitionKey],
) -> Result<PathBuf> {
    let start_time = Local::now();
    check_partitions(Endpoint::Bands, keys)?;
    info_time!("Started scraping band listing");

    let acc = collector(transport, Endpoint::Bands, settings)
        .collect_all(keys)
        .await?;
    let (rows, dropped) = acc.into_parts();
    let table = Table::finalize(rows, Endpoint::Bands.columns())?;

    tokio::fs::create_dir_all(&settings.out_dir).await?;
    let path = settings.out_dir.join(band_file_name(&settings.date));
    info_time!("Writing {} bands to csv file: {}", table.len(), path.display());
    table.save(&path).await?;
    report_dropped(&path, &dropped, NbrStyle::Upper).await?;

    info_time!(start_time, "Finished band listing.");
    Ok(path)
}

/// Scrapes reviews chunk by chunk, writing one CSV per chunk with the review
/// title and text appended. `max_chunks` of 0 means every chunk.
/// Returns the paths of the written files in write order.
pub async fn process_reviews<T: Transport>(
    transport: &T,
    settings: &Settings,
    endpoint: Endpoint,
    keys: &[PartitionKey],
    max_chunks: usize,
) -> Result<Vec<PathBuf>> {
    let start_time = Local::now();
    check_partitions(endpoint, keys)?;
    tokio::fs::create_dir_all(&settings.out_dir).await?;
    info_time!("Started scraping {:?} review listing", endpoint);

    let collector = collector(transport, endpoint, settings);
    let delay = settings.crawl_delay.unwrap_or(endpoint.crawl_delay());
    let page_len = collector.page_len();

    let mut written = Vec::new();
    let mut dropped = Vec::new();
    for key in keys {
        info_time!("Current partition = {}", key);
        let total = collector.fetch_page_count(key).await?;
        info_time!("Total records = {}", total);

        let mut chunks = number_of_pages(total, page_len);
        if max_chunks > 0 {
            chunks = chunks.min(max_chunks);
        }

        for chunk in 0..chunks {
            let (start, end) = page_range(chunk, total, page_len);
            info_time!("Fetching review entries {} to {}", start, end);

            let rows = match collector.fetch_page(key, start).await? {
                PageOutcome::Fetched(rows) => rows,
                PageOutcome::Dropped(page) => {
                    dropped.push(page);
                    continue;
                }
            };
            let mut table = Table::finalize(rows, endpoint.columns())?;
            add_review_content(transport, &mut table, delay).await?;

            let key_param = key.as_param(endpoint.nbr_style());
            let path = settings
                .out_dir
                .join(review_file_name(&settings.date, &key_param, chunk));
            info_time!("Writing chunk to csv file: {}", path.display());
            table.save(&path).await?;
            written.push(path);
        }
    }

    let summary = settings
        .out_dir
        .join(format!("MA-reviews_{}.csv", settings.date));
    report_dropped(&summary, &dropped, endpoint.nbr_style()).await?;

    info_time!(start_time, "Finished review listing, {} files written.", written.len());
    Ok(written)
}

/// Visits every review linked from the `ReviewLink` column and appends
/// `ReviewTitle` and `ReviewContent`. Any unexpected page aborts.
pub async fn add_review_content<T: Transport>(
    transport: &T,
    table: &mut Table,
    delay: Duration,
) -> Result<()> {
    info_time!("Fetching review content...");
    let links = table
        .column("ReviewLink")
        .ok_or_else(|| Error::MissingElement("ReviewLink column".into()))?
        .map(review_link)
        .collect::<Result<Vec<_>>>()?;

    let mut titles = Vec::with_capacity(links.len());
    let mut contents = Vec::with_capacity(links.len());
    for (n, link) in links.iter().enumerate() {
        if !delay.is_zero() {
            sleep(delay).await;
        }
        info_time!("Review #{}", n + 1);
        let html = transport.get(link, &[]).await?;
        let review = parse_review(&html)?;
        titles.push(review.title);
        contents.push(review.content);
    }

    table.push_column("ReviewTitle", titles)?;
    table.push_column("ReviewContent", contents)?;
    Ok(())
}

/// Prints every dropped page and writes them to a manifest next to `output`.
/// Partitions are spelled the way the failed request spelled them.
async fn report_dropped(output: &Path, dropped: &[DroppedPage], style: NbrStyle) -> Result<()> {
    if dropped.is_empty() {
        return Ok(());
    }

    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["partition", "offset", "attempts"])?;
    for page in dropped {
        let partition = page.partition.as_param(style);
        warn_time!(
            "Page of {} at offset {} was dropped after {} attempts",
            partition,
            page.offset,
            page.attempts
        );
        wtr.write_record([
            partition,
            page.offset.to_string(),
            page.attempts.to_string(),
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;

    let path = manifest_path(output);
    tokio::fs::write(&path, bytes).await?;
    info_time!("{} dropped pages listed in {}", dropped.len(), path.display());
    Ok(())
}
