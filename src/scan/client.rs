//! Blocking HTTP client with a delay between requests, a per-request timeout and bounded retries.

use reqwest::blocking::{RequestBuilder, Response};
use std::time::{Duration, Instant};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; scandl/0.1)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DELAY_MS: u64 = 250;
const MAX_REDIRECTS: usize = 10;

/// Default number of attempts per request (initial plus retries).
const DEFAULT_RETRY_COUNT: u32 = 3;
/// Default backoff delays in seconds after each failed attempt.
const DEFAULT_BACKOFF_SECS: [u64; 2] = [1, 2];
/// Backoff for HTTP 429 (rate limit).
const BACKOFF_429_SECS: [u64; 3] = [15, 30, 60];

/// Blocking HTTP client that enforces a delay between requests against the scan host.
#[derive(Debug)]
pub struct PoliteClient {
    inner: reqwest::blocking::Client,
    delay: Duration,
    last_request: Option<Instant>,
    retry_count: u32,
    backoff_secs: Vec<u64>,
}

impl PoliteClient {
    /// Client with default User-Agent, timeout, delay and retries.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// HEAD with retries. Redirects are followed; `Response::url` is the final URL.
    pub fn head(&mut self, url: &str) -> Result<Response, reqwest::Error> {
        self.send_with_retry(|c| c.head(url))
    }

    /// GET with retries.
    pub fn get(&mut self, url: &str) -> Result<Response, reqwest::Error> {
        self.send_with_retry(|c| c.get(url))
    }

    /// Retries timeouts, connection errors, HTTP 5xx and HTTP 429 with backoff. Any other
    /// response (including 4xx) is returned as-is on the first attempt. The last attempt's
    /// response or error is returned unchanged.
    fn send_with_retry<F>(&mut self, build: F) -> Result<Response, reqwest::Error>
    where
        F: Fn(&reqwest::blocking::Client) -> RequestBuilder,
    {
        let max_attempts = self.retry_count.max(1);
        let mut attempt = 0;
        loop {
            self.wait_delay();
            let result = build(&self.inner).send();
            self.last_request = Some(Instant::now());
            let is_last = attempt + 1 >= max_attempts;
            let backoff = match &result {
                Ok(response) => {
                    let status = response.status();
                    if is_last || !(status.is_server_error() || status.as_u16() == 429) {
                        return result;
                    }
                    tracing::debug!(status = status.as_u16(), url = %response.url(), "retrying");
                    if status.as_u16() == 429 {
                        pick_backoff(&BACKOFF_429_SECS, attempt)
                    } else {
                        pick_backoff(&self.backoff_secs, attempt)
                    }
                }
                Err(e) => {
                    if is_last || !(e.is_timeout() || e.is_connect()) {
                        return result;
                    }
                    tracing::debug!(error = %e, "retrying after transport error");
                    pick_backoff(&self.backoff_secs, attempt)
                }
            };
            std::thread::sleep(Duration::from_secs(backoff));
            attempt += 1;
        }
    }

    fn wait_delay(&self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}

/// Backoff for the given attempt; reuses the last value when the list is shorter.
fn pick_backoff(secs: &[u64], attempt: u32) -> u64 {
    secs.get(attempt as usize)
        .or_else(|| secs.last())
        .copied()
        .unwrap_or(1)
}

/// Builder for PoliteClient with optional User-Agent, delay, timeout, and retry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoliteClientBuilder {
    user_agent: Option<String>,
    delay_ms: u64,
    timeout_secs: u64,
    retry_count: u32,
    retry_backoff_secs: Vec<u64>,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            delay_ms: DEFAULT_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff_secs: DEFAULT_BACKOFF_SECS.to_vec(),
        }
    }
}

impl PoliteClientBuilder {
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Delay between requests in milliseconds. Default 250.
    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Per-request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Attempts per request for transient failures (default 3, minimum 1).
    pub fn retry_count(mut self, n: u32) -> Self {
        self.retry_count = n.max(1);
        self
    }

    /// Backoff delays in seconds before each retry. If shorter than retry_count - 1, the last value is reused.
    pub fn retry_backoff_secs(mut self, secs: Vec<u64>) -> Self {
        self.retry_backoff_secs = secs;
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        let backoff_secs = if self.retry_backoff_secs.is_empty() {
            // Exponential 1, 2, 4, ... for (retry_count - 1) steps
            let n = self.retry_count.saturating_sub(1) as usize;
            (0..n).map(|i| 1u64 << i.min(4)).collect::<Vec<_>>()
        } else {
            self.retry_backoff_secs
        };
        Ok(PoliteClient {
            inner,
            delay: Duration::from_millis(self.delay_ms),
            last_request: None,
            retry_count: self.retry_count,
            backoff_secs,
        })
    }
}
