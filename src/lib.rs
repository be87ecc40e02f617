// Re-export modules
pub mod config;
pub mod crawlers;
pub mod fetch;
pub mod filter;
pub mod limits;
pub mod links;
pub mod parsers;
pub mod results;
pub mod visited;

// Re-export commonly used types for convenience
pub use results::FetchedPage;

use config::{CrawlConfig, ProxyConfig};
use std::error::Error;
use std::fmt;
use std::path::Path;
use tokio::sync::mpsc;

/// Ways starting a crawl can fail
///
/// Nothing past `start()` is fatal: once a crawl is running, fetch and
/// parse problems are logged and skipped, never surfaced as errors.
#[derive(Debug)]
pub enum CrawlError {
    /// The seed URL did not parse
    InvalidSeed {
        url: String,
        source: url::ParseError,
    },
    /// The seed URL parsed but has no host to bound the crawl to
    SeedWithoutHost(String),
    /// The HTTP client could not be built from the configuration
    Client(reqwest::Error),
}

impl fmt::Display for CrawlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSeed { url, source } => write!(f, "invalid seed URL '{}': {}", url, source),
            Self::SeedWithoutHost(url) => write!(f, "seed URL '{}' has no host", url),
            Self::Client(e) => write!(f, "failed to build HTTP client: {}", e),
        }
    }
}

impl Error for CrawlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSeed { source, .. } => Some(source),
            Self::SeedWithoutHost(_) => None,
            Self::Client(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for CrawlError {
    fn from(e: reqwest::Error) -> Self {
        Self::Client(e)
    }
}

/// Main builder for crawling one site
///
/// Binds a seed URL at construction, takes optional budgets and transport
/// settings, and on `start()` hands back a receiver yielding every fetched
/// in-domain page. One instance describes exactly one crawl.
pub struct Crawl {
    config: CrawlConfig,
}

impl Crawl {
    /// Create a new crawl builder for the given seed URL
    pub fn new(seed_url: &str) -> Self {
        Self {
            config: CrawlConfig::new(seed_url),
        }
    }

    /// Use a prepared configuration
    pub fn with_config(config: CrawlConfig) -> Self {
        Self { config }
    }

    /// Load configuration from a JSON file
    pub fn with_config_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            config: CrawlConfig::from_file(path)?,
        })
    }

    /// Set the wall-clock budget in seconds (clamped when the crawl starts)
    pub fn with_time_box(mut self, seconds: i64) -> Self {
        self.config.time_box = Some(seconds);
        self
    }

    /// Set the page budget (clamped when the crawl starts)
    pub fn with_max_urls(mut self, count: i64) -> Self {
        self.config.max_urls = Some(count);
        self
    }

    /// Override a request header; only User-Agent and Accept-Language are
    /// recognized
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.config.set_header(name, value);
        self
    }

    /// Set the per-request timeout in seconds
    pub fn with_request_timeout(mut self, seconds: u64) -> Self {
        self.config.request_timeout = seconds;
        self
    }

    /// Route requests through a proxy
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Allow up to `width` fetches in flight at once
    ///
    /// The default of 1 keeps the crawl strictly sequential; higher widths
    /// fan out within each round while keeping round boundaries intact.
    pub fn with_dispatch_width(mut self, width: usize) -> Self {
        self.config.dispatch_width = width.max(1);
        self
    }

    /// Start the crawl and get a receiver for fetched pages
    ///
    /// Fails fast on a seed URL that does not parse or has no host;
    /// afterwards the crawl runs to completion on its own task and the
    /// channel closes when it is done.
    pub async fn start(self) -> Result<mpsc::Receiver<FetchedPage>, CrawlError> {
        crawlers::web::start(&self.config).await
    }
}
