//! HTTP client and retried capture fetching
//!
//! Raw capture bytes come from the archive's replay endpoint
//! (`{base}/web/{timestamp}id_/{original}`), which serves the stored body
//! with the originally recorded status. Transient failures (timeouts, 5xx,
//! connection errors) are retried with exponential backoff; other statuses
//! terminate the unit immediately.

use crate::archive::CaptureDescriptor;
use crate::fetch::TokenBucket;
use crate::{MirrorError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Attempts per fetch, timeouts included.
const RETRY_LIMIT: u32 = 3;

/// Base delay for exponential backoff between attempts.
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// A successfully retrieved capture.
#[derive(Debug)]
pub struct FetchedCapture {
    /// Raw body bytes as stored by the archive.
    pub bytes: Vec<u8>,

    /// `Content-Type` header of the replay response, if present.
    pub content_type: Option<String>,

    /// URL the response ultimately came from.
    pub final_url: String,

    /// Wall time spent on the successful attempt.
    pub elapsed: Duration,
}

/// Builds the shared HTTP client.
///
/// Replay redirects within the archive (e.g. to the nearest stored
/// timestamp) are followed by the client; capture-level redirect records are
/// handled by the resolver instead.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    let user_agent = format!(
        "{}/{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited, retrying fetcher for resolved captures.
pub struct Fetcher {
    client: Client,
    limiter: Arc<TokenBucket>,
    replay_base: String,
}

impl Fetcher {
    /// Creates a fetcher against an archive base URL.
    pub fn new(client: Client, limiter: Arc<TokenBucket>, archive_base: &str) -> Self {
        Self {
            client,
            limiter,
            replay_base: format!("{}/web", archive_base.trim_end_matches('/')),
        }
    }

    /// The raw-replay URL for a capture.
    pub fn replay_url(&self, capture: &CaptureDescriptor) -> String {
        format!(
            "{}/{}id_/{}",
            self.replay_base, capture.timestamp, capture.original
        )
    }

    /// Retrieves the capture's raw bytes and content type.
    ///
    /// Every attempt takes a rate-limiter token first. A timed-out attempt
    /// counts against the retry ceiling like any other transient failure.
    pub async fn fetch(&self, capture: &CaptureDescriptor) -> Result<FetchedCapture> {
        let url = self.replay_url(capture);
        let mut last_err = None;

        for attempt in 0..RETRY_LIMIT {
            if attempt > 0 {
                let backoff = BACKOFF_BASE * 2u32.pow(attempt - 1);
                tracing::debug!(
                    "Retrying {} (attempt {}/{}) after {:?}",
                    capture.original,
                    attempt + 1,
                    RETRY_LIMIT,
                    backoff
                );
                tokio::time::sleep(backoff).await;
            }

            self.limiter.acquire().await;

            let start = Instant::now();
            match self.client.get(&url).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let final_url = response.url().to_string();
                        let content_type = response
                            .headers()
                            .get(reqwest::header::CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(|v| v.to_string());
                        let bytes = response.bytes().await.map_err(|e| {
                            classify_body_error(&capture.original, e)
                        })?;

                        return Ok(FetchedCapture {
                            bytes: bytes.to_vec(),
                            content_type,
                            final_url,
                            elapsed: start.elapsed(),
                        });
                    }

                    if status.is_server_error() {
                        // Transient: the archive itself is struggling.
                        last_err = Some(MirrorError::HttpStatus {
                            url: capture.original.clone(),
                            status: status.as_u16(),
                        });
                        continue;
                    }

                    // 4xx replays the recorded error capture; not retried.
                    return Err(MirrorError::HttpStatus {
                        url: capture.original.clone(),
                        status: status.as_u16(),
                    });
                }
                Err(e) if e.is_timeout() => {
                    last_err = Some(MirrorError::Timeout {
                        url: capture.original.clone(),
                    });
                }
                Err(e) => {
                    last_err = Some(MirrorError::Network {
                        url: capture.original.clone(),
                        source: e,
                    });
                }
            }
        }

        Err(last_err.unwrap_or(MirrorError::Timeout {
            url: capture.original.clone(),
        }))
    }
}

fn classify_body_error(url: &str, e: reqwest::Error) -> MirrorError {
    if e.is_timeout() {
        MirrorError::Timeout {
            url: url.to_string(),
        }
    } else {
        MirrorError::Network {
            url: url.to_string(),
            source: e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveTimestamp;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(30)).is_ok());
    }

    #[test]
    fn test_replay_url_format() {
        let client = build_http_client(Duration::from_secs(30)).unwrap();
        let limiter = Arc::new(TokenBucket::new(1.0, 1));
        let fetcher = Fetcher::new(client, limiter, "https://web.archive.org/");

        let capture = CaptureDescriptor {
            timestamp: ArchiveTimestamp::parse("20221201000000").unwrap(),
            original: "https://example.org/page".to_string(),
            status: Some(200),
            redirect: None,
        };

        assert_eq!(
            fetcher.replay_url(&capture),
            "https://web.archive.org/web/20221201000000id_/https://example.org/page"
        );
    }
}
