//! End-to-end scrape: years → listings → decision pages → documents → `data.json`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use url::Url;

use cosuju_extract::ExtractorRegistry;
use cosuju_harvester::{DownloadOutcome, HarvestOptions, Harvester, links};
use cosuju_shared::{
    CosujuError, DecisionRecord, Document, DocumentKind, Result, ScrapeConfig, ScrapeOutput,
};

use crate::dataset;

/// Counters for a scrape run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub years: usize,
    /// Years whose listing page could not be fetched.
    pub failed_years: usize,
    pub decisions: usize,
    /// Decisions skipped after an error.
    pub failed_decisions: usize,
    pub documents_downloaded: usize,
    /// Documents already on disk from an earlier run.
    pub documents_cached: usize,
    /// Documents kept with empty content because no text could be read.
    pub documents_unreadable: usize,
}

/// Result of [`scrape`].
#[derive(Debug)]
pub struct ScrapeResult {
    pub output: ScrapeOutput,
    pub stats: ScrapeStats,
    /// Where `data.json` was written.
    pub data_file: PathBuf,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called once a year's listing is parsed.
    fn year_started(&self, year: u16, decisions: usize);
    /// Called after each decision, successful or not.
    fn decision_done(&self, url: &str, current: usize, total: usize);
    /// Called when a decision is skipped after an error.
    fn decision_failed(&self, url: &str, error: &CosujuError);
    /// Called when the pipeline completes.
    fn done(&self, result: &ScrapeResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn year_started(&self, _year: u16, _decisions: usize) {}
    fn decision_done(&self, _url: &str, _current: usize, _total: usize) {}
    fn decision_failed(&self, _url: &str, _error: &CosujuError) {}
    fn done(&self, _result: &ScrapeResult) {}
}

/// Run the full scrape and write `data.json`.
#[instrument(skip_all, fields(from = config.first_year, to = config.last_year))]
pub async fn scrape(config: &ScrapeConfig, progress: &dyn ProgressReporter) -> Result<ScrapeResult> {
    config.validate()?;
    let start = Instant::now();
    let scraper = Scraper::new(config.clone())?;

    info!(
        base_url = %config.base_url,
        docs_dir = %config.docs_dir.display(),
        delay_ms = config.request_delay_ms,
        "starting scrape"
    );

    let mut output = ScrapeOutput::new();
    let mut stats = ScrapeStats::default();

    for year in config.years() {
        stats.years += 1;
        let records = output.year_mut(year);
        match scraper.scrape_year(year, records, &mut stats, progress).await {
            Ok(()) => {}
            Err(e) if config.continue_on_error => {
                warn!(year, error = %e, "skipping year");
                stats.failed_years += 1;
            }
            Err(e) => return Err(e),
        }
    }

    dataset::write_output(&config.data_file, &output)?;

    let result = ScrapeResult {
        output,
        stats,
        data_file: config.data_file.clone(),
        elapsed: start.elapsed(),
    };

    info!(
        decisions = result.stats.decisions,
        failed = result.stats.failed_decisions,
        downloaded = result.stats.documents_downloaded,
        cached = result.stats.documents_cached,
        elapsed_ms = result.elapsed.as_millis() as u64,
        "scrape completed"
    );
    progress.done(&result);

    Ok(result)
}

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// Holds the HTTP client and extractors for one run.
pub struct Scraper {
    config: ScrapeConfig,
    harvester: Harvester,
    registry: Arc<ExtractorRegistry>,
}

impl Scraper {
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let harvester = Harvester::new(HarvestOptions::from(&config))?;
        Ok(Self {
            config,
            harvester,
            registry: Arc::new(ExtractorRegistry::new()),
        })
    }

    /// Scrape one year's listing into `records`.
    #[instrument(skip(self, records, stats, progress))]
    pub async fn scrape_year(
        &self,
        year: u16,
        records: &mut Vec<DecisionRecord>,
        stats: &mut ScrapeStats,
        progress: &dyn ProgressReporter,
    ) -> Result<()> {
        let docs_dir = self.config.year_docs_dir(year);
        tokio::fs::create_dir_all(&docs_dir)
            .await
            .map_err(|e| CosujuError::io(&docs_dir, e))?;

        let listing_url = self.config.year_url(year)?;
        let listing = self.harvester.fetch_html(&listing_url).await?;

        let mut decisions = links::decision_links(&listing, &listing_url);
        if let Some(limit) = self.config.max_decisions_per_year {
            decisions.truncate(limit);
        }

        info!(year, decisions = decisions.len(), "listing parsed");
        progress.year_started(year, decisions.len());

        let total = decisions.len();
        for (i, decision_url) in decisions.iter().enumerate() {
            match self.scrape_decision(year, decision_url, stats).await {
                Ok(record) => {
                    info!(
                        title = %record.title,
                        summary = record.summary_document.is_some(),
                        judgement = record.judgement_document.is_some(),
                        "decision scraped"
                    );
                    stats.decisions += 1;
                    records.push(record);
                }
                Err(e) if self.config.continue_on_error => {
                    warn!(url = %decision_url, error = %e, "skipping decision");
                    stats.failed_decisions += 1;
                    progress.decision_failed(decision_url.as_str(), &e);
                }
                Err(e) => return Err(e),
            }
            progress.decision_done(decision_url.as_str(), i + 1, total);
        }

        Ok(())
    }

    /// Fetch a decision page and its summary/judgement documents.
    #[instrument(skip(self, decision_url, stats), fields(url = %decision_url))]
    pub async fn scrape_decision(
        &self,
        year: u16,
        decision_url: &Url,
        stats: &mut ScrapeStats,
    ) -> Result<DecisionRecord> {
        let html = self.harvester.fetch_html(decision_url).await?;
        let page = links::parse_decision_page(&html);

        let title = page
            .title
            .ok_or_else(|| CosujuError::parse(format!("{decision_url}: page has no <title>")))?;

        let mut record = DecisionRecord {
            title,
            url: decision_url.to_string(),
            summary_document: None,
            judgement_document: None,
            update_date: Some(Utc::now().to_rfc3339()),
        };

        if page.documents.is_empty() {
            debug!("decision page links no documents");
        }

        for kind in [DocumentKind::Summary, DocumentKind::Judgement] {
            let Some(href) = page.documents.get(kind) else {
                debug!(%kind, "no document linked");
                continue;
            };
            let document = self.fetch_document(year, decision_url, href, stats).await?;
            match kind {
                DocumentKind::Summary => record.summary_document = Some(document),
                DocumentKind::Judgement => record.judgement_document = Some(document),
            }
        }

        Ok(record)
    }

    /// Download one document into `docs/<year>/` and extract its text.
    pub async fn fetch_document(
        &self,
        year: u16,
        page_url: &Url,
        href: &str,
        stats: &mut ScrapeStats,
    ) -> Result<Document> {
        let file_url = links::resolve_link(page_url, href)?;
        let filename = links::filename_from_url(&file_url)?;
        let dest = self.config.year_docs_dir(year).join(&filename);

        match self.harvester.download(&file_url, &dest).await? {
            DownloadOutcome::Downloaded { .. } => stats.documents_downloaded += 1,
            DownloadOutcome::Skipped => stats.documents_cached += 1,
        }

        let registry = Arc::clone(&self.registry);
        let path = dest.clone();
        let extracted = tokio::task::spawn_blocking(move || registry.extract_file(&path))
            .await
            .map_err(|e| CosujuError::extraction(&dest, format!("extraction task failed: {e}")))?;

        // Scanned or malformed files keep their slot with empty content; I/O errors still fail.
        let file_content = match extracted {
            Ok(extracted) => {
                debug!(
                    filename = %filename,
                    extractor = %extracted.extractor,
                    chars = extracted.text.len(),
                    "document extracted"
                );
                extracted.text
            }
            Err(CosujuError::Extraction { message, .. }) => {
                warn!(filename = %filename, error = %message, "no readable text, keeping empty document");
                stats.documents_unreadable += 1;
                String::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Document {
            filename,
            file_url: file_url.to_string(),
            file_content,
        })
    }
}
