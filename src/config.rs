use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::partition::PartitionKey;
use crate::BASE_URL;

#[derive(Debug, Parser)]
#[command(name = "ma-scrape")]
#[command(about = "Scrapes Metal Archives band and review listings to CSV")]
pub struct Cli {
    /// Site root the listing paths are appended to
    #[arg(long, global = true, default_value = BASE_URL)]
    pub base_url: String,

    /// Directory the CSV files are written to
    #[arg(short, long, global = true, default_value = ".")]
    pub out_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Band names, country, genre and status for every letter
    Bands {
        /// Partitions to fetch, e.g. `NBR,A,B`. Defaults to NBR and A-Z
        #[arg(short, long, value_delimiter = ',')]
        partitions: Vec<PartitionKey>,
    },
    /// Album reviews with their title and text
    Reviews {
        /// Letters (or `YYYY-MM` months with --by-date) to fetch. Defaults to `A`,
        /// or the current month with --by-date
        #[arg(short, long, value_delimiter = ',')]
        partitions: Vec<PartitionKey>,

        /// Use the by-date listing instead of the alphabetical one
        #[arg(long)]
        by_date: bool,

        /// Chunks of 200 reviews to fetch per partition. 0 fetches all of them
        #[arg(long, default_value_t = 1)]
        max_chunks: usize,
    },
}

/// Settings shared by every run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub out_dir: PathBuf,
    /// `YYYY-MM-DD`, UTC, stamped into the file names.
    pub date: String,
    /// Overrides the listing's own crawl delay when set.
    pub crawl_delay: Option<Duration>,
}

impl Settings {
    pub fn new(base_url: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url: base_url.into(),
            out_dir: out_dir.into(),
            date: Utc::now().format("%Y-%m-%d").to_string(),
            crawl_delay: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_crawl_delay(mut self, crawl_delay: Duration) -> Self {
        self.crawl_delay = Some(crawl_delay);
        self
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Settings::new(cli.base_url.clone(), cli.out_dir.clone())
    }
}

/// Current `YYYY-MM`, UTC.
pub fn current_month() -> PartitionKey {
    PartitionKey::Month(Utc::now().format("%Y-%m").to_string())
}
