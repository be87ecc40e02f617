use crate::config::CrawlConfig;
use crate::results::FetchedPage;
use reqwest::cookie::Jar;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy};
use std::sync::Arc;
use std::time::Duration;

/// User-Agent sent when the caller does not override it
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Accept-Language sent when the caller does not override it
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// Redirect hops followed before a fetch is abandoned
const MAX_REDIRECTS: usize = 10;

/// Issues the crawl's HTTP requests
///
/// One client per crawl: fixed timeout, redirect following, a cookie jar
/// shared by every request and released with the client at crawl end, and
/// the crawl's header/proxy configuration. Cloning shares the same client.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    /// Build the client for one crawl from its configuration
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            header_value(config.user_agent.as_deref(), DEFAULT_USER_AGENT),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            header_value(config.accept_language.as_deref(), DEFAULT_ACCEPT_LANGUAGE),
        );

        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .redirect(Policy::limited(MAX_REDIRECTS))
            .cookie_provider(Arc::new(Jar::default()))
            .default_headers(headers);

        if let Some(proxy_config) = &config.proxy {
            let mut proxy = Proxy::all(proxy_config.endpoint())?;
            if let (Some(username), Some(password)) =
                (&proxy_config.username, &proxy_config.password)
            {
                proxy = proxy.basic_auth(username, password);
            }
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Issue one GET and return the response with its effective URL
    ///
    /// The returned record carries the post-redirect URL; scope decisions
    /// must use it, since redirects can leave or re-enter the target domain.
    /// Any response is a successful fetch regardless of status code.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let effective_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await?;

        Ok(FetchedPage::new(effective_url, status, headers, body))
    }
}

/// Header value from an override, falling back to the fixed default
fn header_value(raw: Option<&str>, fallback: &'static str) -> HeaderValue {
    match raw {
        Some(value) => HeaderValue::from_str(value).unwrap_or_else(|_| {
            ::log::warn!("Invalid header value {:?}, using default", value);
            HeaderValue::from_static(fallback)
        }),
        None => HeaderValue::from_static(fallback),
    }
}
