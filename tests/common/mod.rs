#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use ma_scrape::request::Transport;
use ma_scrape::{Error, Result};
use serde_json::json;
use tokio::time::Instant;

/// A request as the fake saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub url: String,
    pub start: Option<usize>,
    /// Runtime clock when the request went out.
    pub at: Instant,
}

/// Replies to requests strictly in the order they were scripted.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<VecDeque<Result<String>>>,
    seen: Mutex<Vec<Seen>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, body: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn reply_times(self, body: &str, times: usize) -> Self {
        (0..times).fold(self, |fake, _| fake.reply(body))
    }

    pub fn fail(self, msg: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(Error::Io(std::io::Error::other(msg.to_string()))));
        self
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn starts(&self) -> Vec<Option<usize>> {
        self.seen().into_iter().map(|s| s.start).collect()
    }

    /// Time of each request relative to `origin`.
    pub fn offsets_from(&self, origin: Instant) -> Vec<std::time::Duration> {
        self.seen().into_iter().map(|s| s.at - origin).collect()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl Transport for FakeTransport {
    async fn get(&self, url: &str, query: &[(&'static str, String)]) -> Result<String> {
        let start = query
            .iter()
            .find(|(name, _)| *name == "iDisplayStart")
            .and_then(|(_, v)| v.parse().ok());
        self.seen.lock().unwrap().push(Seen {
            url: url.to_string(),
            start,
            at: Instant::now(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Io(std::io::Error::other(format!("unscripted GET {url}")))))
    }
}

/// A listing body as the service returns it.
pub fn listing(total: usize, rows: &[&[&str]]) -> String {
    json!({
        "iTotalRecords": total,
        "iTotalDisplayRecords": total,
        "sEcho": 0,
        "aaData": rows,
    })
    .to_string()
}

pub fn band(name: &str) -> [&str; 4] {
    [name, "Sweden", "Heavy Metal", "Active"]
}

pub const NOT_JSON: &str = "<html><body>Service temporarily unavailable</body></html>";

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ma-scrape-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
