//! Core record types for scraped decisions and the exported dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of hex characters kept from the URL hash for dataset ids.
const RECORD_ID_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A downloaded summary or judgement document and its extracted text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name as stored under `docs/<year>/`.
    pub filename: String,
    /// Absolute URL the file was downloaded from.
    pub file_url: String,
    /// Extracted plain text.
    pub file_content: String,
}

impl Document {
    /// The placeholder the dataset uses for a missing document.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Which slot of a decision a document fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// The court's media summary (`…media.pdf` / `…media.rtf`).
    Summary,
    /// The full judgement text.
    Judgement,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Summary => f.write_str("summary"),
            Self::Judgement => f.write_str("judgement"),
        }
    }
}

// ---------------------------------------------------------------------------
// DecisionRecord / ScrapeOutput
// ---------------------------------------------------------------------------

/// One court decision as written to `data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// `<title>` of the decision page.
    pub title: String,
    /// Decision page URL.
    pub url: String,
    /// `null` when the decision page links no summary.
    pub summary_document: Option<Document>,
    /// `null` when the decision page links no judgement.
    pub judgement_document: Option<Document>,
    /// RFC 3339 timestamp of when the record was scraped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<String>,
}

/// The contents of `data.json`: year string → decisions, in year order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScrapeOutput(pub BTreeMap<String, Vec<DecisionRecord>>);

impl ScrapeOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a (possibly empty) entry exists for `year` and return it.
    pub fn year_mut(&mut self, year: u16) -> &mut Vec<DecisionRecord> {
        self.0.entry(year.to_string()).or_default()
    }

    /// Decisions recorded for `year`, if the year was processed.
    pub fn year(&self, year: u16) -> Option<&[DecisionRecord]> {
        self.0.get(&year.to_string()).map(Vec::as_slice)
    }

    /// Total decisions across all years.
    pub fn decision_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Iterate `(year, record)` pairs in year order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DecisionRecord)> {
        self.0
            .iter()
            .flat_map(|(year, records)| records.iter().map(move |r| (year.as_str(), r)))
    }
}

// ---------------------------------------------------------------------------
// DatasetRecord
// ---------------------------------------------------------------------------

/// One line of the exported dataset (the loader's record schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub year: String,
    pub update_date: String,
    #[serde(default, deserialize_with = "document_or_empty")]
    pub summary_document: Document,
    #[serde(default, deserialize_with = "document_or_empty")]
    pub judgement_document: Document,
}

impl DatasetRecord {
    /// Build a dataset record from a scraped decision.
    pub fn from_decision(year: &str, record: &DecisionRecord, fallback_update_date: &str) -> Self {
        Self {
            id: record_id(&record.url),
            title: record.title.clone(),
            url: record.url.clone(),
            year: year.to_string(),
            update_date: record
                .update_date
                .clone()
                .unwrap_or_else(|| fallback_update_date.to_string()),
            summary_document: record.summary_document.clone().unwrap_or_default(),
            judgement_document: record.judgement_document.clone().unwrap_or_default(),
        }
    }

    /// Whether both a summary and a judgement are present.
    pub fn is_complete(&self) -> bool {
        !self.summary_document.file_content.is_empty()
            && !self.judgement_document.file_content.is_empty()
    }
}

/// Some decisions have no summary; `null` reads as an empty document.
fn document_or_empty<'de, D>(deserializer: D) -> std::result::Result<Document, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Document>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stable record id derived from the decision URL.
pub fn record_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hex = format!("{:x}", hasher.finalize());
    hex[..RECORD_ID_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> DecisionRecord {
        DecisionRecord {
            title: "S v Makwanyane and Another (CCT3/94) [1995] ZACC 3".into(),
            url: "http://www.saflii.org/za/cases/ZACC/1995/3.html".into(),
            summary_document: None,
            judgement_document: Some(Document {
                filename: "3.pdf".into(),
                file_url: "http://www.saflii.org/za/cases/ZACC/1995/3.pdf".into(),
                file_content: "JUDGMENT".into(),
            }),
            update_date: None,
        }
    }

    #[test]
    fn missing_summary_serializes_as_null() {
        let json = serde_json::to_value(sample_record()).expect("serialize");
        assert!(json["summary_document"].is_null());
        assert_eq!(json["judgement_document"]["filename"], "3.pdf");
        assert!(json.get("update_date").is_none());
    }

    #[test]
    fn scrape_output_is_keyed_by_year() {
        let mut out = ScrapeOutput::new();
        out.year_mut(1996);
        out.year_mut(1995).push(sample_record());

        let json = serde_json::to_string(&out).expect("serialize");
        assert!(json.starts_with(r#"{"1995":[{"#));
        assert!(json.ends_with(r#""1996":[]}"#));
        assert_eq!(out.decision_count(), 1);
        assert_eq!(out.year(1996).map(<[_]>::len), Some(0));
        assert!(out.year(1997).is_none());
    }

    #[test]
    fn dataset_record_fills_missing_documents() {
        let rec = DatasetRecord::from_decision("1995", &sample_record(), "2021-06-01");
        assert_eq!(rec.summary_document, Document::empty());
        assert_eq!(rec.judgement_document.file_content, "JUDGMENT");
        assert_eq!(rec.update_date, "2021-06-01");
        assert_eq!(rec.year, "1995");
        assert!(!rec.is_complete());
    }

    #[test]
    fn dataset_record_reads_null_documents() {
        let line = r#"{"id":"x","title":"t","url":"u","year":"1995","update_date":"d","summary_document":null,"judgement_document":{"filename":"a.rtf","file_url":"u/a.rtf","file_content":"text"}}"#;
        let rec: DatasetRecord = serde_json::from_str(line).expect("parse");
        assert_eq!(rec.summary_document, Document::empty());
        assert_eq!(rec.judgement_document.filename, "a.rtf");
    }

    #[test]
    fn record_id_is_stable() {
        let a = record_id("http://www.saflii.org/za/cases/ZACC/1995/3.html");
        let b = record_id("http://www.saflii.org/za/cases/ZACC/1995/3.html");
        let c = record_id("http://www.saflii.org/za/cases/ZACC/1995/4.html");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }
}
