//! CSV ingestion.
//!
//! Loads a header-led CSV into an ordered [`Dataset`], from a local file or an
//! `http(s)://` URL. Row order is preserved exactly, which the hash chain
//! relies on. Raw header names can be renamed on the way in so
//! differently-labelled sources map onto one schema.

use crate::error::{ChainError, Result};
use crate::record::{FieldValue, Record};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Whole-request limit for remote datasets; the card dataset is ~150 MB.
const FETCH_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// True when `location` names an HTTP(S) resource rather than a file.
pub fn is_remote(location: &str) -> bool {
    let lower = location.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Blocking client used for remote datasets.
pub fn http_client() -> Result<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()?;
    Ok(client)
}

/// Raw header name -> canonical column name.
pub type ColumnRenames = HashMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    /// Loads from a URL when `location` is one, otherwise from the file system.
    pub fn load(location: &str, renames: &ColumnRenames) -> Result<Self> {
        if is_remote(location) {
            Self::from_url(&http_client()?, location, renames)
        } else {
            Self::from_path(location, renames)
        }
    }

    /// Fetches a CSV over HTTP. Non-success statuses are errors.
    pub fn from_url(client: &reqwest::blocking::Client, url: &str, renames: &ColumnRenames) -> Result<Self> {
        let response = client.get(url.trim()).send()?.error_for_status()?;
        let dataset = Self::from_reader(response, renames)?;
        info!(url, rows = dataset.len(), columns = dataset.columns.len(), "fetched dataset");
        Ok(dataset)
    }

    pub fn from_path(path: impl AsRef<Path>, renames: &ColumnRenames) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file, renames)?;
        info!(path = %path.display(), rows = dataset.len(), columns = dataset.columns.len(), "loaded dataset");
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R, renames: &ColumnRenames) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::Headers).from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| renames.get(h).cloned().unwrap_or_else(|| h.to_string()))
            .collect();

        if let Some(dup) = columns.iter().enumerate().find_map(|(i, c)| columns[..i].contains(c).then_some(c)) {
            return Err(ChainError::InvalidSchema(format!("duplicate column '{}' after renaming", dup)));
        }

        let mut records = Vec::new();
        for row in csv_reader.records() {
            let row = row?;
            let record: Record = columns
                .iter()
                .zip(row.iter())
                .map(|(name, cell)| (name.clone(), FieldValue::parse(cell)))
                .collect();
            records.push(record);
        }

        Ok(Self { columns, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// First `n` rows, in order.
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }

    /// Rows whose `column` holds `value`. Integer and float cells compare numerically.
    pub fn filter_eq(&self, column: &str, value: &FieldValue) -> Vec<&Record> {
        self.records
            .iter()
            .filter(|r| r.get(column).is_some_and(|v| values_equal(v, value)))
            .collect()
    }

    pub fn count_eq(&self, column: &str, value: &FieldValue) -> usize {
        self.records
            .iter()
            .filter(|r| r.get(column).is_some_and(|v| values_equal(v, value)))
            .count()
    }

    /// Content identity: SHA-256 over the header and every canonically formatted cell.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for column in &self.columns {
            hasher.update(column.as_bytes());
            hasher.update([0x1f]);
        }
        hasher.update([0x1e]);
        for record in &self.records {
            for (_, value) in record.iter() {
                hasher.update(value.to_string().as_bytes());
                hasher.update([0x1f]);
            }
            hasher.update([0x1e]);
        }
        hex::encode(hasher.finalize())
    }
}

fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x == y,
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARDS: &str = "Time,V1,Amount,Class\n0,-1.35,149.62,0\n1,1.19,2.69,0\n2,-0.96,378.66,1\n";

    /// Serves one canned HTTP response on a local port and returns its base URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        use std::io::{BufRead, BufReader, Write};
        use std::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = reader.into_inner();
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: text/csv\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
        });
        format!("http://{}", addr)
    }

    fn local_client() -> reqwest::blocking::Client {
        reqwest::blocking::Client::builder().no_proxy().build().unwrap()
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://storage.example.com/creditcard.csv"));
        assert!(is_remote("HTTP://host/a.csv"));
        assert!(!is_remote("./data/creditcard.csv"));
        assert!(!is_remote("httpdocs/a.csv"));
    }

    #[test]
    fn test_from_url_reads_served_csv() {
        let base = serve_once("200 OK", CARDS);
        let ds = Dataset::from_url(&local_client(), &format!("{}/creditcard.csv", base), &ColumnRenames::new()).unwrap();
        assert_eq!(ds.columns, vec!["Time", "V1", "Amount", "Class"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds, Dataset::from_reader(CARDS.as_bytes(), &ColumnRenames::new()).unwrap());
    }

    #[test]
    fn test_from_url_error_status() {
        let base = serve_once("404 Not Found", "missing");
        let err = Dataset::from_url(&local_client(), &format!("{}/gone.csv", base), &ColumnRenames::new()).unwrap_err();
        assert!(matches!(err, ChainError::Http(_)));
    }

    #[test]
    fn test_from_reader_types_and_order() {
        let ds = Dataset::from_reader(CARDS.as_bytes(), &ColumnRenames::new()).unwrap();
        assert_eq!(ds.columns, vec!["Time", "V1", "Amount", "Class"]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.records[2].get("Amount"), Some(&FieldValue::Float(378.66)));
        assert_eq!(ds.records[2].get("Class"), Some(&FieldValue::Integer(1)));
        assert_eq!(ds.records[1].columns().collect::<Vec<_>>(), ds.columns);
    }

    #[test]
    fn test_renames_applied() {
        let csv = "uf,dt,casos,mortes\nSP,2020-03-01,2,0\n";
        let renames: ColumnRenames = [("uf", "state"), ("dt", "date"), ("casos", "new_cases"), ("mortes", "deaths")]
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        let ds = Dataset::from_reader(csv.as_bytes(), &renames).unwrap();
        assert_eq!(ds.columns, vec!["state", "date", "new_cases", "deaths"]);
        assert_eq!(ds.records[0].get("state"), Some(&FieldValue::Text("SP".into())));
    }

    #[test]
    fn test_rename_collision_rejected() {
        let csv = "a,b\n1,2\n";
        let renames: ColumnRenames = [("a".to_string(), "b".to_string())].into_iter().collect();
        assert!(Dataset::from_reader(csv.as_bytes(), &renames).is_err());
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let csv = "a,b\n1,2\n3\n";
        let err = Dataset::from_reader(csv.as_bytes(), &ColumnRenames::new()).unwrap_err();
        assert!(matches!(err, ChainError::Csv(_)));
    }

    #[test]
    fn test_filters_and_head() {
        let ds = Dataset::from_reader(CARDS.as_bytes(), &ColumnRenames::new()).unwrap();
        assert_eq!(ds.count_eq("Class", &FieldValue::Integer(1)), 1);
        assert_eq!(ds.count_eq("Class", &FieldValue::Float(0.0)), 2);
        assert_eq!(ds.filter_eq("Class", &FieldValue::Integer(0)).len(), 2);
        assert_eq!(ds.count_eq("Missing", &FieldValue::Integer(0)), 0);
        assert_eq!(ds.head(2).len(), 2);
        assert_eq!(ds.head(50).len(), 3);
    }

    #[test]
    fn test_fingerprint_tracks_content() {
        let a = Dataset::from_reader(CARDS.as_bytes(), &ColumnRenames::new()).unwrap();
        let b = Dataset::from_reader(CARDS.as_bytes(), &ColumnRenames::new()).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let mut c = a.clone();
        c.records[0].set("Amount", 1.0);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}
