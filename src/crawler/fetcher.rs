//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the analyzer, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests for the primary page, with timing and size accounting
//! - HEAD (with GET fallback) probes for link health checks
//! - Error classification

use crate::config::{FetcherConfig, UserAgentConfig};
use crate::crawler::types::ProbeFailure;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::error::Error as StdError;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Errors that abort the primary page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url} after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("DNS resolution failed for {url}: {message}")]
    Dns { url: String, message: String },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Response from {url} exceeds {limit} bytes")]
    TooLarge { url: String, limit: usize },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("HTTP error for {url}: {message}")]
    Other { url: String, message: String },
}

impl FetchError {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Dns { .. } => "dns",
            Self::Connection { .. } => "connection",
            Self::HttpStatus { .. } => "http-status",
            Self::TooLarge { .. } => "too-large",
            Self::RedirectLimit { .. } => "redirect-limit",
            Self::Other { .. } => "other",
        }
    }
}

/// A successfully retrieved page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was asked for
    pub requested_url: Url,

    /// Final URL after redirects
    pub final_url: Url,

    pub status_code: u16,

    pub content_type: Option<String>,

    /// Body decoded as UTF-8 (lossy)
    pub body: String,

    /// Raw body length in bytes
    pub size_bytes: usize,

    /// Time from sending the request to receiving the last body byte
    pub elapsed: Duration,
}

impl FetchedPage {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// True when the server declared an HTML body, or declared nothing
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(true, |content_type| {
            let mime = content_type.split(';').next().unwrap_or_default().trim();
            mime.eq_ignore_ascii_case("text/html")
                || mime.eq_ignore_ascii_case("application/xhtml+xml")
        })
    }
}

/// Result of probing one link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { status: u16 },
    Broken(ProbeFailure),
}

impl ProbeOutcome {
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken(_))
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client follows at most `max_redirects` redirects. Timeouts are set per
/// request so the primary fetch and link probes can use different limits.
///
/// # Example
///
/// ```no_run
/// use site_sage::config::Config;
/// use site_sage::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.user_agent, &config.fetcher).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetcher: &FetcherConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .connect_timeout(fetcher.connect_timeout())
        .redirect(Policy::limited(fetcher.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches the page under analysis
///
/// # Failure modes
///
/// | Condition | Error |
/// |-----------|-------|
/// | Total time exceeds `request_timeout_ms` | `Timeout` |
/// | Host name does not resolve | `Dns` |
/// | Connection refused / TLS failure | `Connection` |
/// | Final status >= 400 | `HttpStatus` |
/// | Body larger than `max_page_bytes` | `TooLarge` |
/// | Redirect chain longer than `max_redirects` | `RedirectLimit` |
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    config: &FetcherConfig,
) -> Result<FetchedPage, FetchError> {
    let timeout = config.request_timeout();
    let limit = config.max_page_bytes;
    let start = Instant::now();

    let mut response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| classify_fetch_error(url, timeout, e))?;

    let status = response.status();
    let final_url = response.url().clone();

    if status.as_u16() >= 400 {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(FetchError::TooLarge {
            url: url.to_string(),
            limit,
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut body: Vec<u8> = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| classify_fetch_error(url, timeout, e))?
    {
        if body.len() + chunk.len() > limit {
            return Err(FetchError::TooLarge {
                url: url.to_string(),
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }

    let elapsed = start.elapsed();

    if final_url != *url {
        tracing::debug!("{} redirected to {}", url, final_url);
    }

    Ok(FetchedPage {
        requested_url: url.clone(),
        final_url,
        status_code: status.as_u16(),
        content_type,
        size_bytes: body.len(),
        body: String::from_utf8_lossy(&body).into_owned(),
        elapsed,
    })
}

/// Probes a link for reachability
///
/// Sends a HEAD request and follows redirects. Servers that refuse HEAD
/// (405/501) get one GET before the link is judged. Every failure is
/// reported as data; this function never errors.
pub async fn probe_link(client: &Client, url: &str, timeout: Duration) -> ProbeOutcome {
    let head = client.head(url).timeout(timeout).send().await;

    let status = match head {
        Ok(response)
            if matches!(
                response.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) =>
        {
            tracing::trace!("HEAD refused by {}, retrying with GET", url);
            match client.get(url).timeout(timeout).send().await {
                Ok(response) => response.status(),
                Err(e) => return ProbeOutcome::Broken(classify_probe_error(&e)),
            }
        }
        Ok(response) => response.status(),
        Err(e) => return ProbeOutcome::Broken(classify_probe_error(&e)),
    };

    if status.as_u16() >= 400 {
        ProbeOutcome::Broken(ProbeFailure::HttpStatus(status.as_u16()))
    } else {
        ProbeOutcome::Reachable {
            status: status.as_u16(),
        }
    }
}

/// Maps a reqwest error on the primary fetch to a [`FetchError`]
fn classify_fetch_error(url: &Url, timeout: Duration, err: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if err.is_timeout() {
        FetchError::Timeout { url, timeout }
    } else if err.is_redirect() {
        FetchError::RedirectLimit { url }
    } else if err.is_connect() {
        let message = error_chain_message(&err);
        if is_dns_error(&err) {
            FetchError::Dns { url, message }
        } else {
            FetchError::Connection { url, message }
        }
    } else {
        FetchError::Other {
            url,
            message: error_chain_message(&err),
        }
    }
}

/// Maps a reqwest error on a link probe to a [`ProbeFailure`]
fn classify_probe_error(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        ProbeFailure::Timeout
    } else if is_dns_error(err) {
        ProbeFailure::Dns
    } else if err.is_connect() {
        ProbeFailure::Connection
    } else {
        ProbeFailure::Other(error_chain_message(err))
    }
}

/// Returns true if any error in the source chain is a name resolution failure
fn is_dns_error(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        let message = e.to_string().to_lowercase();
        if message.contains("dns error")
            || message.contains("failed to lookup address")
            || message.contains("name or service not known")
            || message.contains("no such host")
        {
            return true;
        }
        current = e.source();
    }
    false
}

/// Joins an error and its sources into one line
fn error_chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ")
}
