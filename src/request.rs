use std::future::Future;
use std::time::Duration;

use reqwest::Client;

use crate::partition::{NbrStyle, PartitionKey};
use crate::{Result, BAND_PAGE_LEN, CRAWL_DELAY, REVIEW_PAGE_LEN};

/// Query parameters of a single GET.
pub type Query = Vec<(&'static str, String)>;

/// Something that can perform a GET and hand back the body as text.
///
/// Connection failures and non-2xx statuses are errors; the body itself is never inspected here.
pub trait Transport {
    fn get(&self, url: &str, query: &[(&'static str, String)]) -> impl Future<Output = Result<String>>;
}

/// `Transport` backed by a `reqwest::Client`. No request timeout is set.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Transport for HttpTransport {
    /// Requests a page and returns its body, always decoded as UTF-8.
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<String> {
        let res = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;
        let bytes = res.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// The AJAX listings the scraper knows how to page through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Bands,
    ReviewsByAlpha,
    ReviewsByDate,
}

const BAND_COLUMNS: &[&str] = &["NameLink", "Country", "Genre", "Status"];
const REVIEW_ALPHA_COLUMNS: &[&str] = &[
    "BandName",
    "ReviewLink",
    "BandLink",
    "AlbumLink",
    "Score",
    "UserLink",
    "Date",
];
const REVIEW_DATE_COLUMNS: &[&str] = &[
    "Date",
    "ReviewLink",
    "BandLink",
    "AlbumLink",
    "Score",
    "UserLink",
    "Time",
];

impl Endpoint {
    pub fn url(&self, base_url: &str, key: &PartitionKey) -> String {
        let base_url = base_url.trim_end_matches('/');
        let key = key.as_param(self.nbr_style());
        match self {
            Endpoint::Bands => format!("{base_url}/browse/ajax-letter/json/1/l/{key}"),
            Endpoint::ReviewsByAlpha => {
                format!("{base_url}/review/ajax-list-browse/by/alpha/selection/{key}/json/1")
            }
            Endpoint::ReviewsByDate => {
                format!("{base_url}/review/ajax-list-browse/by/date/selection/{key}/json/1")
            }
        }
    }

    /// The only page length the upstream service accepts for this listing.
    pub fn page_len(&self) -> usize {
        match self {
            Endpoint::Bands => BAND_PAGE_LEN,
            Endpoint::ReviewsByAlpha | Endpoint::ReviewsByDate => REVIEW_PAGE_LEN,
        }
    }

    pub fn query(&self, start: usize) -> Query {
        let length = self.page_len();
        match self {
            // Without sEcho the body isn't valid JSON.
            Endpoint::Bands => vec![
                ("sEcho", "0".into()),
                ("iDisplayStart", start.to_string()),
                ("iDisplayLength", length.to_string()),
            ],
            Endpoint::ReviewsByAlpha | Endpoint::ReviewsByDate => vec![
                ("sEcho", "1".into()),
                ("iColumns", "7".into()),
                ("iDisplayStart", start.to_string()),
                ("iDisplayLength", length.to_string()),
            ],
        }
    }

    /// Names of the positional fields in each `aaData` row.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Endpoint::Bands => BAND_COLUMNS,
            Endpoint::ReviewsByAlpha => REVIEW_ALPHA_COLUMNS,
            Endpoint::ReviewsByDate => REVIEW_DATE_COLUMNS,
        }
    }

    /// Pause before every page attempt.
    pub fn crawl_delay(&self) -> Duration {
        match self {
            Endpoint::Bands => Duration::ZERO,
            Endpoint::ReviewsByAlpha | Endpoint::ReviewsByDate => CRAWL_DELAY,
        }
    }

    pub fn nbr_style(&self) -> NbrStyle {
        match self {
            Endpoint::Bands => NbrStyle::Upper,
            Endpoint::ReviewsByAlpha | Endpoint::ReviewsByDate => NbrStyle::Lower,
        }
    }

    /// Whether `key` is a valid filter for this listing.
    pub fn accepts(&self, key: &PartitionKey) -> bool {
        match self {
            Endpoint::Bands | Endpoint::ReviewsByAlpha => !matches!(key, PartitionKey::Month(_)),
            Endpoint::ReviewsByDate => matches!(key, PartitionKey::Month(_)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_url_and_query() {
        let url = Endpoint::Bands.url("http://example.test/", &PartitionKey::Nbr);
        assert_eq!(url, "http://example.test/browse/ajax-letter/json/1/l/NBR");

        let query = Endpoint::Bands.query(1000);
        assert_eq!(
            query,
            vec![
                ("sEcho", "0".to_string()),
                ("iDisplayStart", "1000".to_string()),
                ("iDisplayLength", "500".to_string()),
            ]
        );
    }

    #[test]
    fn review_urls() {
        let alpha = Endpoint::ReviewsByAlpha.url("http://example.test", &PartitionKey::Nbr);
        assert_eq!(
            alpha,
            "http://example.test/review/ajax-list-browse/by/alpha/selection/nbr/json/1"
        );
        let date = Endpoint::ReviewsByDate.url(
            "http://example.test",
            &PartitionKey::Month("2016-04".into()),
        );
        assert_eq!(
            date,
            "http://example.test/review/ajax-list-browse/by/date/selection/2016-04/json/1"
        );
        assert!(Endpoint::ReviewsByAlpha
            .query(0)
            .contains(&("iColumns", "7".to_string())));
        assert_eq!(Endpoint::ReviewsByDate.page_len(), 200);
    }

    #[test]
    fn partition_kinds_match_listing() {
        let month = PartitionKey::Month("2016-04".into());
        assert!(Endpoint::ReviewsByDate.accepts(&month));
        assert!(!Endpoint::ReviewsByDate.accepts(&PartitionKey::Letter('A')));
        assert!(!Endpoint::Bands.accepts(&month));
        assert!(Endpoint::Bands.accepts(&PartitionKey::Nbr));
    }
}
