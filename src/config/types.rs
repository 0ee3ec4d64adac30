use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for SiteSage
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Primary page fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Total time allowed for the primary fetch, body included (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Time allowed to establish a connection (milliseconds)
    #[serde(rename = "connect-timeout-ms", default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum number of redirects followed
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Largest accepted response body (bytes)
    #[serde(rename = "max-page-bytes", default = "default_max_page_bytes")]
    pub max_page_bytes: usize,
}

impl FetcherConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_redirects: default_max_redirects(),
            max_page_bytes: default_max_page_bytes(),
        }
    }
}

/// Link audit configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Maximum number of links probed per page (first-seen first)
    #[serde(rename = "max-links", default = "default_max_links")]
    pub max_links: usize,

    /// Maximum number of probes in flight at once
    #[serde(rename = "max-concurrent-probes", default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: usize,

    /// Time allowed for a single probe (milliseconds)
    #[serde(rename = "probe-timeout-ms", default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl AuditConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_links: default_max_links(),
            max_concurrent_probes: default_max_concurrent_probes(),
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Narrative insight generation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct InsightsConfig {
    /// Whether narrative insights are requested at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible chat completions API
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env", default = "default_api_key_env")]
    pub api_key_env: String,

    /// Time allowed for the whole generation (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_insights_timeout_ms")]
    pub timeout_ms: u64,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl InsightsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reads the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_api_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_ms: default_insights_timeout_ms(),
            temperature: default_temperature(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default = "default_contact_email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
            contact_email: default_contact_email(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Directory where exported reports are written
    #[serde(rename = "reports-dir", default = "default_reports_dir")]
    pub reports_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            reports_dir: default_reports_dir(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_max_redirects() -> usize {
    10
}

fn default_max_page_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_links() -> usize {
    50
}

fn default_max_concurrent_probes() -> usize {
    10
}

fn default_probe_timeout_ms() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_insights_timeout_ms() -> u64 {
    30_000
}

fn default_temperature() -> f32 {
    0.7
}

fn default_crawler_name() -> String {
    "SiteSage".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://github.com/sitesage/sitesage".to_string()
}

fn default_contact_email() -> String {
    "bot@sitesage.dev".to_string()
}

fn default_database_path() -> String {
    "sitesage.db".to_string()
}

fn default_reports_dir() -> String {
    "reports".to_string()
}
