// Transaction sources - whatever hands the pipeline its raw records
//
// The browser session that captures the portal's network traffic lives
// outside this crate. What it leaves behind is one JSON body per captured
// `transactions` response; this module turns those into RawTransactions.

use crate::normalizer::RawTransaction;
use anyhow::{Context, Result};
use log::info;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Producer of a finite, already fetched batch of raw records
pub trait TransactionSource {
    /// Every raw record, in feed order
    fn fetch(&self) -> Result<Vec<RawTransaction>>;

    /// Label for log output
    fn name(&self) -> &str;
}

/// Shape of one captured response body. Records stay untyped until
/// `read_body` converts them one by one.
#[derive(Debug, Deserialize)]
struct CapturedResponse {
    transactions: Vec<serde_json::Value>,
}

/// Captured response bodies on disk, read in the order given.
/// When the portal pages its transaction list, each page is its own body.
#[derive(Debug, Clone)]
pub struct CapturedResponseSource {
    paths: Vec<PathBuf>,
}

impl CapturedResponseSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        CapturedResponseSource { paths }
    }

    fn read_body(path: &Path) -> Result<Vec<RawTransaction>> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open captured response: {}", path.display()))?;

        let body: CapturedResponse = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse captured response {}", path.display()))?;

        body.transactions
            .into_iter()
            .enumerate()
            .map(|(index, value)| {
                serde_json::from_value::<RawTransaction>(value).with_context(|| {
                    format!("Bad record {} in captured response {}", index, path.display())
                })
            })
            .collect()
    }
}

impl TransactionSource for CapturedResponseSource {
    fn fetch(&self) -> Result<Vec<RawTransaction>> {
        let mut records = Vec::new();

        for path in &self.paths {
            let page = Self::read_body(path)?;
            info!("Read {} record(s) from {}", page.len(), path.display());
            records.extend(page);
        }

        Ok(records)
    }

    fn name(&self) -> &str {
        "captured responses"
    }
}

/// An in-memory batch is its own source
impl TransactionSource for Vec<RawTransaction> {
    fn fetch(&self) -> Result<Vec<RawTransaction>> {
        Ok(self.clone())
    }

    fn name(&self) -> &str {
        "in-memory batch"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_pages_are_concatenated_in_order() {
        let dir = tempdir().unwrap();
        let page1 = dir.path().join("page1.json");
        let page2 = dir.path().join("page2.json");
        fs::write(
            &page1,
            r#"{"transactions": [
                {"transaction_date": "2023-01-05T00:00:00",
                 "merchant": {"title": "Coffee Shop", "subtitle": "Melbourne VIC"},
                 "amount": 4.5, "type": "DEBIT", "id": "ignored-extra-field"},
                {"transaction_date": "2023-01-04T00:00:00",
                 "merchant": {"title": "PAYMENT", "subtitle": "THANK YOU"},
                 "amount": "$200.00", "type": "CREDIT"}
            ], "cursor": null}"#,
        )
        .unwrap();
        fs::write(
            &page2,
            r#"{"transactions": [
                {"transaction_date": "2022-12-30T00:00:00",
                 "merchant": {"title": "Myki", "subtitle": "Docklands"},
                 "amount": 10, "type": "DEBIT"}
            ]}"#,
        )
        .unwrap();

        let source = CapturedResponseSource::new(vec![page1, page2]);
        let records = source.fetch().unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].transaction_date.as_deref(), Some("2023-01-05T00:00:00"));
        assert!(records[1].is_credit());
        assert_eq!(
            records[2].merchant.as_ref().unwrap().title.as_deref(),
            Some("Myki")
        );
    }

    #[test]
    fn test_record_with_missing_fields_still_loads() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.json");
        fs::write(&page, r#"{"transactions": [{"amount": 1.0}]}"#).unwrap();

        let records = CapturedResponseSource::new(vec![page]).fetch().unwrap();

        assert_eq!(records.len(), 1);
        assert!(records[0].transaction_date.is_none());
    }

    #[test]
    fn test_missing_file_and_bad_json_are_errors() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"items": []}"#).unwrap();

        assert!(CapturedResponseSource::new(vec![dir.path().join("absent.json")])
            .fetch()
            .is_err());
        assert!(CapturedResponseSource::new(vec![bad]).fetch().is_err());
    }

    #[test]
    fn test_wrongly_typed_field_names_the_record() {
        let dir = tempdir().unwrap();
        let page = dir.path().join("page.json");
        fs::write(
            &page,
            r#"{"transactions": [
                {"transaction_date": "2023-01-05T00:00:00", "amount": 4.5, "type": "DEBIT"},
                {"transaction_date": "2023-01-06T00:00:00", "amount": true, "type": "DEBIT"}
            ]}"#,
        )
        .unwrap();

        let err = CapturedResponseSource::new(vec![page]).fetch().unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("Bad record 1"), "{}", message);
        assert!(message.contains("page.json"), "{}", message);
    }

    #[test]
    fn test_vec_is_a_source() {
        let batch = vec![RawTransaction::new("2023-01-05", "m", "", "1", "DEBIT")];
        assert_eq!(batch.fetch().unwrap(), batch);
    }
}
