use chrono::Local;
use clap::Parser;
use ma_scrape::config::{current_month, Cli, Command, Settings};
use ma_scrape::partition::{alphabet_partitions, PartitionKey};
use ma_scrape::process::{process_bands, process_reviews};
use ma_scrape::request::{Endpoint, HttpTransport};
use ma_scrape::{info_time, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Local::now();
    let cli = Cli::parse();
    let settings = Settings::from(&cli);
    let transport = HttpTransport::new();

    match cli.command {
        Command::Bands { partitions } => {
            let keys = if partitions.is_empty() {
                alphabet_partitions()
            } else {
                partitions
            };
            process_bands(&transport, &settings, &keys).await?;
        }
        Command::Reviews {
            partitions,
            by_date,
            max_chunks,
        } => {
            let endpoint = if by_date {
                Endpoint::ReviewsByDate
            } else {
                Endpoint::ReviewsByAlpha
            };
            let keys = match (partitions.is_empty(), by_date) {
                (false, _) => partitions,
                (true, true) => vec![current_month()],
                (true, false) => vec![PartitionKey::Letter('A')],
            };
            process_reviews(&transport, &settings, endpoint, &keys, max_chunks).await?;
        }
    }

    info_time!(start_time, "Full program time:");
    Ok(())
}
