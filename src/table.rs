use std::io::Write;
use std::path::Path;

use crate::collect::RawRecord;
use crate::{Error, Result};

/// Collected rows with their final column names.
///
/// Rows are indexed `0..len()` by position; the index is written as the
/// leading, unnamed column of the CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
}

impl Table {
    /// Names the columns of `rows` positionally. Every row must be exactly as wide as `columns`.
    ///
    /// With no rows there is nothing to check the width against, so any `columns` is accepted
    /// and the table is written as a header-only CSV.
    pub fn finalize<S: AsRef<str>>(rows: Vec<RawRecord>, columns: &[S]) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.len() != columns.len()) {
            return Err(Error::ColumnMismatch {
                expected: columns.len(),
                found: row.len(),
            });
        }
        Ok(Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of the column called `name`, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Appends a column. One value per row.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::LengthMismatch {
                name: name.into(),
                expected: self.rows.len(),
                found: values.len(),
            });
        }
        self.columns.push(name.into());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(std::iter::once("").chain(self.columns.iter().map(String::as_str)))?;
        for (idx, row) in self.rows.iter().enumerate() {
            let idx = idx.to_string();
            wtr.write_record(std::iter::once(idx.as_str()).chain(row.iter().map(String::as_str)))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// The whole CSV, header included, as bytes.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(buf)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        tokio::fs::write(path, self.to_csv_bytes()?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<RawRecord> {
        raw.iter()
            .map(|r| r.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn finalize_rejects_wrong_width() {
        let err = Table::finalize(rows(&[&["a", "b", "c"]]), &["One", "Two"]).unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnMismatch {
                expected: 2,
                found: 3
            }
        ));
    }

    #[test]
    fn empty_table_takes_any_header() {
        let table = Table::finalize(Vec::new(), &["NameLink", "Country"]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), ["NameLink", "Country"]);
    }

    #[test]
    fn csv_has_index_column() {
        let table = Table::finalize(
            rows(&[&["Abba", "Sweden"], &["Acid, Inc", "US"]]),
            &["NameLink", "Country"],
        )
        .unwrap();

        let mut out = Vec::new();
        table.write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            ",NameLink,Country\n0,Abba,Sweden\n1,\"Acid, Inc\",US\n"
        );
    }

    #[test]
    fn push_column_checks_length() {
        let mut table = Table::finalize(rows(&[&["x"], &["y"]]), &["A"]).unwrap();
        assert!(table.push_column("B", vec!["1".into()]).is_err());

        table
            .push_column("B", vec!["1".into(), "2".into()])
            .unwrap();
        assert_eq!(table.columns(), ["A", "B"]);
        assert_eq!(table.column("B").unwrap().collect::<Vec<_>>(), ["1", "2"]);
        assert!(table.column("C").is_none());
    }

    #[tokio::test]
    async fn save_writes_same_bytes_as_csv() {
        let table = Table::finalize(rows(&[&["Abba", "Sweden"]]), &["NameLink", "Country"]).unwrap();
        let path = std::env::temp_dir().join(format!("ma-scrape-table-{}.csv", std::process::id()));

        table.save(&path).await.unwrap();
        let written = std::fs::read(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(written, table.to_csv_bytes().unwrap());
        assert_eq!(written, b",NameLink,Country\n0,Abba,Sweden\n");
    }
}
