use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// How the non-alphabetic bucket is spelled in a listing's URL.
/// The band listing wants `NBR`, the review listing `nbr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbrStyle {
    Upper,
    Lower,
}

/// A bucket the upstream listing is filtered by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionKey {
    /// Names that don't start with a letter.
    Nbr,
    Letter(char),
    /// A `YYYY-MM` bucket of the by-date review listing.
    Month(String),
}

impl PartitionKey {
    /// Path segment used in the request URL.
    pub fn as_param(&self, style: NbrStyle) -> String {
        match self {
            PartitionKey::Nbr => match style {
                NbrStyle::Upper => "NBR".into(),
                NbrStyle::Lower => "nbr".into(),
            },
            PartitionKey::Letter(c) => c.to_string(),
            PartitionKey::Month(m) => m.clone(),
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_param(NbrStyle::Upper))
    }
}

impl FromStr for PartitionKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("nbr") {
            return Ok(PartitionKey::Nbr);
        }

        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_alphabetic() {
                return Ok(PartitionKey::Letter(c.to_ascii_uppercase()));
            }
        }

        if is_month(s) {
            return Ok(PartitionKey::Month(s.into()));
        }

        Err(Error::InvalidPartition(s.into()))
    }
}

/// `YYYY-MM` with a month in 01..=12.
fn is_month(s: &str) -> bool {
    let Some((year, month)) = s.split_once('-') else {
        return false;
    };
    year.len() == 4
        && month.len() == 2
        && year.bytes().all(|b| b.is_ascii_digit())
        && month.bytes().all(|b| b.is_ascii_digit())
        && month
            .parse::<u8>()
            .map(|m| (1..=12).contains(&m))
            .unwrap_or(false)
}

/// `NBR`, then `A` through `Z`.
pub fn alphabet_partitions() -> Vec<PartitionKey> {
    std::iter::once(PartitionKey::Nbr)
        .chain(('A'..='Z').map(PartitionKey::Letter))
        .collect()
}
