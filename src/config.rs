use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Configuration for one crawl
///
/// All fields other than `start_url` are optional; absent values fall back
/// to the defaults below, and the time/page budgets are additionally clamped
/// by [`crate::limits::CrawlLimits`] when the crawl starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// URL to start crawling from
    pub start_url: String,

    /// Wall-clock budget for the whole crawl, in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_box: Option<i64>,

    /// Maximum number of URLs to visit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_urls: Option<i64>,

    /// User-Agent header sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Accept-Language header sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_language: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Number of fetches allowed in flight at once (1 = strictly sequential)
    #[serde(default = "default_dispatch_width")]
    pub dispatch_width: usize,

    /// Proxy to route requests through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
}

/// Proxy endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host or IP
    pub ip: String,

    /// Proxy port
    pub port: u16,

    /// Basic-auth username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Basic-auth password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Default per-request timeout in seconds
fn default_request_timeout() -> u64 {
    10
}

/// Default dispatch width (sequential)
fn default_dispatch_width() -> usize {
    1
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(start_url: &str) -> Self {
        Self {
            start_url: start_url.to_string(),
            time_box: None,
            max_urls: None,
            user_agent: None,
            accept_language: None,
            request_timeout: default_request_timeout(),
            dispatch_width: default_dispatch_width(),
            proxy: None,
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply a header override by name
    ///
    /// Only `User-Agent` and `Accept-Language` are recognized (matched
    /// case-insensitively); anything else is ignored.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if name.eq_ignore_ascii_case("user-agent") {
            self.user_agent = Some(value.to_string());
        } else if name.eq_ignore_ascii_case("accept-language") {
            self.accept_language = Some(value.to_string());
        } else {
            ::log::debug!("Ignoring unrecognized header override: {}", name);
        }
    }
}

impl ProxyConfig {
    /// Render the proxy endpoint as a URL reqwest can consume
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::new("https://example.com");
        assert_eq!(config.start_url, "https://example.com");
        assert_eq!(config.request_timeout, 10);
        assert_eq!(config.dispatch_width, 1);
        assert!(config.time_box.is_none());
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: CrawlConfig =
            serde_json::from_str(r#"{"start_url": "https://example.com"}"#).unwrap();
        assert_eq!(config.request_timeout, 10);
        assert_eq!(config.dispatch_width, 1);
        assert!(config.max_urls.is_none());
    }

    #[test]
    fn test_deserialize_with_proxy() {
        let raw = r#"{
            "start_url": "https://example.com",
            "time_box": 120,
            "max_urls": 200,
            "proxy": {"ip": "10.0.0.1", "port": 8080, "username": "u", "password": "p"}
        }"#;
        let config: CrawlConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.time_box, Some(120));
        assert_eq!(config.max_urls, Some(200));
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.endpoint(), "http://10.0.0.1:8080");
        assert_eq!(proxy.username.as_deref(), Some("u"));
    }

    #[test]
    fn test_header_overrides() {
        let mut config = CrawlConfig::new("https://example.com");
        config.set_header("User-Agent", "sweeper/1.0");
        config.set_header("ACCEPT-LANGUAGE", "de-DE");
        config.set_header("X-Custom", "dropped");
        assert_eq!(config.user_agent.as_deref(), Some("sweeper/1.0"));
        assert_eq!(config.accept_language.as_deref(), Some("de-DE"));
    }
}
