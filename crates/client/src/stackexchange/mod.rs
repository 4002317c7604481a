//! Stack Exchange API client.
//!
//! Fetches one page of questions for a query identity and normalizes the
//! result into [`Row`](stackpager_core::Row)s.
//!
//! ### Behavior
//!
//! - **Endpoints**: `/search/advanced` when the query has search text,
//!   `/questions` otherwise. Both are sorted by activity, newest first.
//! - **Timeout**: every request is bounded; a timeout is a `StackError`.
//! - **Empty results**: a body with no items is `FetchOutcome::Exhausted`,
//!   whatever the HTTP status. The API returns the same shape for "nothing
//!   matched" and for quota violations.
//! - **Backoff**: when the API sends a `backoff` value, further requests
//!   from this client wait that many seconds (at most five minutes). A
//!   request that would wait longer than the request timeout fails with
//!   `StackError::Timeout` instead.

pub mod error;
pub mod request;
pub mod response;

pub use error::StackError;
pub use request::QuestionQuery;
pub use response::{ExhaustionInfo, FetchOutcome};

use reqwest::header;
use stackpager_core::QueryIdentity;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Rows requested from the API per page.
pub const PAGE_SIZE: u32 = 30;

/// Default base URL for the Stack Exchange API.
const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.3";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "stackpager/0.1";

/// The API throttles above 30 requests per second per IP.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(34);

/// Stack Exchange client configuration.
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Base URL (default: https://api.stackexchange.com/2.3).
    pub base_url: String,
    /// Optional app key.
    pub api_key: Option<String>,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string.
    pub user_agent: String,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&stackpager_core::AppConfig> for StackConfig {
    fn from(config: &stackpager_core::AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Longest provider backoff honored, in seconds.
const MAX_BACKOFF_SECS: u64 = 300;

/// Spaces out requests and honors provider backoff.
///
/// The lock only guards the next free slot; waiting happens outside it.
#[derive(Debug)]
struct RateLimiter {
    next_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self { next_request: Mutex::new(Instant::now()), min_interval }
    }

    /// Reserve the next request slot and wait for it.
    ///
    /// Fails with `StackError::Timeout` without reserving anything when the
    /// slot is further away than `max_wait`.
    async fn acquire(&self, max_wait: Duration) -> Result<(), StackError> {
        let wait = {
            let mut next = self.next_request.lock().await;
            let now = Instant::now();
            let wait = next.saturating_duration_since(now);
            if wait > max_wait {
                return Err(StackError::Timeout);
            }
            *next = (*next).max(now) + self.min_interval;
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        Ok(())
    }

    /// Hold off further requests for `secs` seconds, capped at `MAX_BACKOFF_SECS`.
    async fn defer(&self, secs: u64) {
        let delay = Duration::from_secs(secs.min(MAX_BACKOFF_SECS));
        let mut next = self.next_request.lock().await;
        if let Some(until) = Instant::now().checked_add(delay)
            && until > *next
        {
            *next = until;
        }
    }
}

/// A source of question pages.
///
/// The query orchestrator depends on this trait rather than on the HTTP
/// client directly.
#[async_trait::async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch one page of results for `identity`.
    async fn fetch_page(&self, identity: &QueryIdentity, page_number: u32) -> Result<FetchOutcome, StackError>;
}

/// Stack Exchange API client.
#[derive(Debug, Clone)]
pub struct StackClient {
    http: reqwest::Client,
    config: StackConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl StackClient {
    /// Create a new client with the given configuration.
    pub fn new(config: StackConfig) -> Result<Self, StackError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .gzip(true)
            .build()
            .map_err(|e| StackError::Network(Arc::new(e)))?;

        Ok(Self { http, config, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    /// Build the request query for one page.
    pub fn query_for(&self, identity: &QueryIdentity, page_number: u32) -> QuestionQuery {
        QuestionQuery::new(identity, page_number, PAGE_SIZE).with_key(self.config.api_key.clone())
    }

    /// Full URL for a query.
    pub fn url_for(&self, query: &QuestionQuery) -> String {
        format!("{}{}", self.config.base_url, query.endpoint())
    }

    /// Execute one query against the API.
    pub async fn fetch(&self, query: &QuestionQuery) -> Result<FetchOutcome, StackError> {
        query.validate()?;

        self.rate_limiter.acquire(self.config.timeout).await?;

        let start = Instant::now();
        let url = self.url_for(query);

        tracing::debug!(site = %query.site, page = query.page, endpoint = query.endpoint(), "querying Stack Exchange API");

        let http_response = self
            .http
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent)
            .query(query)
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("Stack Exchange API response status: {}", status);

        let bytes = http_response.bytes().await?;
        let (outcome, backoff) = response::classify(&bytes)?;

        if let Some(secs) = backoff.filter(|s| *s > 0) {
            tracing::warn!(backoff_secs = secs, "Stack Exchange API requested backoff");
            self.rate_limiter.defer(secs).await;
        }

        match &outcome {
            FetchOutcome::Page { rows, has_more } => {
                tracing::debug!("fetch completed in {:?}, {} rows, has_more={}", start.elapsed(), rows.len(), has_more);
            }
            FetchOutcome::Exhausted(info) => {
                tracing::warn!(
                    status = status.as_u16(),
                    quota_remaining = ?info.quota_remaining,
                    error_id = ?info.error_id,
                    error_name = ?info.error_name,
                    error_message = ?info.error_message,
                    "Stack Exchange API returned no items"
                );
            }
        }

        Ok(outcome)
    }
}

#[async_trait::async_trait]
impl QuestionSource for StackClient {
    async fn fetch_page(&self, identity: &QueryIdentity, page_number: u32) -> Result<FetchOutcome, StackError> {
        let query = self.query_for(identity, page_number);
        self.fetch(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(text: &str) -> QueryIdentity {
        QueryIdentity {
            start_date: 1_672_531_200,
            end_date: 1_675_123_200,
            site_name: "stackoverflow".into(),
            search_text: text.into(),
        }
    }

    #[test]
    fn test_config_from_app_config() {
        let app = stackpager_core::AppConfig {
            api_base_url: "http://localhost:9999/2.3/".into(),
            api_key: Some("k".into()),
            timeout_ms: 1500,
            ..Default::default()
        };
        let config = StackConfig::from(&app);
        assert_eq!(config.base_url, "http://localhost:9999/2.3");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn test_url_for_endpoint_choice() {
        let client = StackClient::new(StackConfig::default()).unwrap();

        let list = client.query_for(&identity(""), 1);
        assert_eq!(client.url_for(&list), "https://api.stackexchange.com/2.3/questions");

        let search = client.query_for(&identity("tokio"), 1);
        assert_eq!(client.url_for(&search), "https://api.stackexchange.com/2.3/search/advanced");
    }

    #[test]
    fn test_query_for_uses_page_size_and_key() {
        let client = StackClient::new(StackConfig { api_key: Some("k".into()), ..Default::default() }).unwrap();
        let query = client.query_for(&identity(""), 4);
        assert_eq!(query.pagesize, PAGE_SIZE);
        assert_eq!(query.page, 4);
        assert_eq!(query.key.as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_query_without_network() {
        let client = StackClient::new(StackConfig::default()).unwrap();
        let query = QuestionQuery::new(&identity(""), 0, PAGE_SIZE);
        assert!(matches!(client.fetch(&query).await, Err(StackError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_error() {
        let client = StackClient::new(StackConfig {
            base_url: "http://127.0.0.1:9".into(),
            timeout: Duration::from_millis(500),
            ..Default::default()
        })
        .unwrap();

        let result = client.fetch_page(&identity(""), 1).await;
        assert!(matches!(result, Err(StackError::Network(_) | StackError::Timeout)));
    }

    #[tokio::test]
    async fn test_rate_limiter_defer_delays_acquire() {
        let limiter = RateLimiter::new(Duration::from_millis(0));
        limiter.defer(1).await;
        let start = Instant::now();
        limiter.acquire(Duration::from_secs(5)).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_rate_limiter_rejects_wait_beyond_limit() {
        let limiter = RateLimiter::new(Duration::from_millis(0));
        limiter.defer(u64::MAX).await;
        let start = Instant::now();
        assert!(matches!(limiter.acquire(Duration::from_millis(200)).await, Err(StackError::Timeout)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_rate_limiter_does_not_hold_lock_while_waiting() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(0)));
        limiter.defer(1).await;

        let waiting = limiter.clone();
        let waiter = tokio::spawn(async move { waiting.acquire(Duration::from_secs(5)).await });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let start = Instant::now();
        limiter.defer(0).await;
        assert!(start.elapsed() < Duration::from_millis(200));
        assert!(waiter.await.unwrap().is_ok());
    }

    /// Serve `body` as a JSON response to every connection.
    async fn serve_json(body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else { break };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let mut read = 0;
                    while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf[read..]).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => read += n,
                        }
                    }
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                });
            }
        });
        format!("http://{addr}")
    }

    fn local_client(base_url: String) -> StackClient {
        StackClient::new(StackConfig { base_url, timeout: Duration::from_millis(500), ..Default::default() }).unwrap()
    }

    #[tokio::test]
    async fn test_backoff_beyond_timeout_fails_fast() {
        let base_url = serve_json(
            r#"{"items":[{"title":"t","tags":["rust"],"link":"https://stackoverflow.com/q/1"}],"has_more":true,"backoff":5}"#,
        )
        .await;
        let client = local_client(base_url);

        let first = client.fetch_page(&identity(""), 1).await;
        assert!(matches!(first, Ok(FetchOutcome::Page { .. })));

        let start = Instant::now();
        let second = client.fetch_page(&identity(""), 2).await;
        assert!(matches!(second, Err(StackError::Timeout)));
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_huge_backoff_does_not_panic() {
        let base_url =
            serve_json(r#"{"items":[],"has_more":false,"backoff":18446744073709551615}"#).await;
        let client = local_client(base_url);

        let first = tokio::spawn({
            let client = client.clone();
            async move { client.fetch_page(&identity(""), 1).await }
        })
        .await;
        assert!(matches!(first, Ok(Ok(FetchOutcome::Exhausted(_)))));

        assert!(matches!(client.fetch_page(&identity(""), 1).await, Err(StackError::Timeout)));
    }
}
