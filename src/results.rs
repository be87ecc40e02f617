use serde::{Deserialize, Serialize};

/// A fetched page as yielded to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchedPage {
    /// Effective URL of the response, after any redirects
    pub url: String,

    /// HTTP status code of the response
    pub status: u16,

    /// Response headers as name/value pairs
    pub headers: Vec<(String, String)>,

    /// Response body
    pub body: String,
}

impl FetchedPage {
    /// Create a new fetched page record
    pub fn new(url: String, status: u16, headers: Vec<(String, String)>, body: String) -> Self {
        Self {
            url,
            status,
            headers,
            body,
        }
    }

    /// Look up a response header by name (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
