//! `data.json` persistence and the JSON-lines dataset the loader consumes.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, instrument};

use cosuju_shared::{CosujuError, DatasetRecord, Result, ScrapeOutput};

/// Static metadata describing the published dataset.
#[derive(Debug, Clone, Copy)]
pub struct DatasetInfo {
    pub name: &'static str,
    pub config_name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub homepage: &'static str,
    pub citation: &'static str,
}

pub const DATASET_INFO: DatasetInfo = DatasetInfo {
    name: "cosuju",
    config_name: "plain_text",
    version: "1.0.0",
    description: "Court Summaries and Judgements (CoSuJu)",
    homepage: "https://github.com/FRTNX/ml-data-scraper",
    citation: "@InProceedings{huggingface:dataset,\n\
               title   = {CoSuJu 500+ Court Judegements and Summaries for Machine Text Summarization},\n\
               authors = {Busani Ndlovu, Luke Jordan},\n\
               year    = {2021}\n\
               }",
};

// ---------------------------------------------------------------------------
// data.json
// ---------------------------------------------------------------------------

/// Write the year-keyed scrape output.
pub fn write_output(path: &Path, output: &ScrapeOutput) -> Result<()> {
    write_json(path, output)?;
    info!(
        path = %path.display(),
        years = output.0.len(),
        decisions = output.decision_count(),
        "wrote scrape output"
    );
    Ok(())
}

/// Read a previously written `data.json`.
pub fn read_output(path: &Path) -> Result<ScrapeOutput> {
    let content = std::fs::read_to_string(path).map_err(|e| CosujuError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| {
        CosujuError::validation(format!("{} is not scrape output: {e}", path.display()))
    })
}

fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json).map_err(|e| CosujuError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| CosujuError::io(parent, e))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Options for [`export_jsonl`].
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// `update_date` for records scraped before timestamps were recorded.
    pub fallback_update_date: String,
    /// Drop decisions missing a summary or a judgement.
    pub complete_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            fallback_update_date: chrono::Utc::now().to_rfc3339(),
            complete_only: false,
        }
    }
}

/// Counts reported by [`export_jsonl`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub written: usize,
    pub dropped_incomplete: usize,
}

/// Flatten scrape output into dataset records, in year order.
pub fn to_dataset_records(output: &ScrapeOutput, fallback_update_date: &str) -> Vec<DatasetRecord> {
    output
        .iter()
        .map(|(year, record)| DatasetRecord::from_decision(year, record, fallback_update_date))
        .collect()
}

/// Convert `data.json` into a JSON-lines dataset file.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn export_jsonl(input: &Path, output: &Path, opts: &ExportOptions) -> Result<ExportSummary> {
    let scraped = read_output(input)?;
    let records = to_dataset_records(&scraped, &opts.fallback_update_date);

    ensure_parent(output)?;
    let file = std::fs::File::create(output).map_err(|e| CosujuError::io(output, e))?;
    let mut writer = BufWriter::new(file);
    let mut summary = ExportSummary::default();

    for record in &records {
        if opts.complete_only && !record.is_complete() {
            summary.dropped_incomplete += 1;
            continue;
        }
        serde_json::to_writer(&mut writer, record)?;
        writer
            .write_all(b"\n")
            .map_err(|e| CosujuError::io(output, e))?;
        summary.written += 1;
    }
    writer.flush().map_err(|e| CosujuError::io(output, e))?;

    info!(
        written = summary.written,
        dropped = summary.dropped_incomplete,
        "exported dataset"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Read a JSON-lines dataset as `(key, record)` pairs.
///
/// The key is the zero-based line number. Blank lines are skipped; null or
/// missing documents read as empty documents.
pub fn read_examples(path: &Path) -> Result<Vec<(usize, DatasetRecord)>> {
    info!(path = %path.display(), "generating examples");
    let file = std::fs::File::open(path).map_err(|e| CosujuError::io(path, e))?;

    let mut examples = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| CosujuError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: DatasetRecord = serde_json::from_str(&line).map_err(|e| {
            CosujuError::validation(format!("{}:{}: {e}", path.display(), idx + 1))
        })?;
        examples.push((idx, record));
    }
    Ok(examples)
}

/// Aggregate counts over a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub total: usize,
    pub with_summary: usize,
    pub with_judgement: usize,
    pub per_year: BTreeMap<String, usize>,
}

pub fn dataset_stats(examples: &[(usize, DatasetRecord)]) -> DatasetStats {
    let mut stats = DatasetStats::default();
    for (_, record) in examples {
        stats.total += 1;
        if !record.summary_document.file_content.is_empty() {
            stats.with_summary += 1;
        }
        if !record.judgement_document.file_content.is_empty() {
            stats.with_judgement += 1;
        }
        *stats.per_year.entry(record.year.clone()).or_default() += 1;
    }
    stats
}
