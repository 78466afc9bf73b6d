//! HTTP access to the archive: page fetches and streamed document downloads.
//!
//! Requests are sequential and spaced by a politeness delay.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use url::Url;

use cosuju_shared::{CosujuError, Result, ScrapeConfig};

/// Maximum redirects followed for any request.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// HTTP settings for a [`Harvester`].
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Minimum gap between the start of consecutive requests.
    pub request_delay_ms: u64,
}

impl From<&ScrapeConfig> for HarvestOptions {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout_secs: config.timeout_secs,
            request_delay_ms: config.request_delay_ms,
        }
    }
}

/// What [`Harvester::download`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched and written to disk.
    Downloaded { bytes: u64 },
    /// A non-empty file was already present; no request was made.
    Skipped,
}

// ---------------------------------------------------------------------------
// Harvester
// ---------------------------------------------------------------------------

/// Sequential, rate-limited archive client.
pub struct Harvester {
    client: Client,
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl Harvester {
    /// Create a new harvester with the given options.
    pub fn new(opts: HarvestOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(opts.user_agent)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| CosujuError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            delay: Duration::from_millis(opts.request_delay_ms),
            last_request: Mutex::new(None),
        })
    }

    /// Fetch an HTML page and decode it to text.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_html(&self, url: &Url) -> Result<String> {
        let response = self.get(url).await?;

        let charset = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(charset_from_content_type);

        let body = response
            .bytes()
            .await
            .map_err(|e| CosujuError::Network(format!("{url}: body read failed: {e}")))?;

        let decoded = cosuju_extract::decode_with_label(&body, charset.as_deref());
        debug!(
            bytes = body.len(),
            encoding = decoded.encoding_name(),
            "fetched page"
        );
        if decoded.had_errors {
            warn!(encoding = decoded.encoding_name(), "page contained undecodable bytes");
        }

        Ok(decoded.text)
    }

    /// Stream a document to `dest`, unless a non-empty file is already there.
    ///
    /// Bytes go to `<dest>.part` first and are renamed into place when complete,
    /// so an interrupted download is never mistaken for a finished one.
    #[instrument(skip_all, fields(url = %url, dest = %dest.display()))]
    pub async fn download(&self, url: &Url, dest: &Path) -> Result<DownloadOutcome> {
        if is_present(dest).await {
            debug!("already downloaded, skipping");
            return Ok(DownloadOutcome::Skipped);
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CosujuError::io(parent, e))?;
        }

        let part = part_path(dest);
        match self.stream_to(url, &part).await {
            Ok(bytes) => {
                tokio::fs::rename(&part, dest)
                    .await
                    .map_err(|e| CosujuError::io(dest, e))?;
                info!(bytes, "downloaded document");
                Ok(DownloadOutcome::Downloaded { bytes })
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &Url, path: &Path) -> Result<u64> {
        let mut response = self.get(url).await?;

        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(|e| CosujuError::io(path, e))?;

        let mut written: u64 = 0;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CosujuError::Network(format!("{url}: body read failed: {e}")))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| CosujuError::io(path, e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| CosujuError::io(path, e))?;
        Ok(written)
    }

    /// GET with politeness delay and status check.
    async fn get(&self, url: &Url) -> Result<reqwest::Response> {
        self.wait_turn().await;

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| CosujuError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CosujuError::Network(format!("{url}: HTTP {status}")));
        }

        Ok(response)
    }

    /// Sleep until `delay` has passed since the previous request started.
    async fn wait_turn(&self) {
        let wait = {
            let mut last = self
                .last_request
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();
            let wait = last
                .map(|prev| self.delay.saturating_sub(now.duration_since(prev)))
                .unwrap_or_default();
            *last = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "politeness delay");
            tokio::time::sleep(wait).await;
        }
    }
}

/// Extract the `charset=` parameter from a `Content-Type` value.
fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, val) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| val.trim().trim_matches('"').to_string())
    })
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
