use crate::visited::VisitedSet;
use std::collections::VecDeque;
use url::Url;

// Non-HTML suffixes grouped by byte length for cheap tail matching; group at
// index i holds suffixes of length i + 3. Each group is sorted for binary
// search.
static IGNORED_SUFFIXES: &[&[&str]] = &[
    // length 3
    &[".7z", ".gz", ".js", ".xz"],
    // length 4
    &[
        ".avi", ".bin", ".bmp", ".bz2", ".css", ".csv", ".deb", ".dmg", ".doc", ".eot", ".exe",
        ".gif", ".ico", ".iso", ".jar", ".jpg", ".mkv", ".mov", ".mp3", ".mp4", ".ogg", ".otf",
        ".pdf", ".png", ".ppt", ".rar", ".rpm", ".svg", ".tar", ".tgz", ".ttf", ".wav", ".xls",
        ".zip",
    ],
    // length 5
    &[
        ".docx", ".flac", ".jpeg", ".pptx", ".tiff", ".webm", ".webp", ".woff", ".xlsx",
    ],
    // length 6
    &[".woff2"],
    // length 7
    &[],
    // length 8
    &[".torrent"],
];

/// Registrable domain of a URL, e.g. `blog.example.co.uk` → `example.co.uk`
///
/// IP literals scope by the full address, and named hosts the public-suffix
/// list cannot split (bare intranet names) fall back to the raw host, so
/// such hosts still compare equal to themselves. None only when the URL has
/// no host at all.
pub fn registrable_domain(url: &Url) -> Option<String> {
    match url.host()? {
        url::Host::Domain(domain) => {
            let host = domain.to_ascii_lowercase();
            Some(psl::domain_str(&host).map_or_else(|| host.clone(), str::to_string))
        }
        ip => Some(ip.to_string()),
    }
}

/// Whether a URL path ends in a suffix the crawl should never fetch
pub fn has_ignored_suffix(path: &str) -> bool {
    let path = path.to_ascii_lowercase();
    IGNORED_SUFFIXES.iter().enumerate().any(|(i, group)| {
        let len = i + 3;
        path.len() >= len
            && path
                .get(path.len() - len..)
                .is_some_and(|tail| group.binary_search(&tail).is_ok())
    })
}

/// Scope policy for one crawl: which discovered URLs are worth queueing
#[derive(Debug, Clone)]
pub struct ScopeFilter {
    target_domain: String,
}

impl ScopeFilter {
    /// Build the filter for a seed URL; None when the seed has no host
    pub fn for_seed(seed: &Url) -> Option<Self> {
        Some(Self {
            target_domain: registrable_domain(seed)?,
        })
    }

    /// Registrable domain the crawl is bounded to
    pub fn target_domain(&self) -> &str {
        &self.target_domain
    }

    /// Whether a URL's registrable domain matches the target
    pub fn in_domain(&self, url: &Url) -> bool {
        registrable_domain(url).as_deref() == Some(self.target_domain.as_str())
    }

    /// Whether a discovered URL should be queued
    ///
    /// True iff the URL is in-domain, not already seen, not an ignorable
    /// resource type, and not already pending in the frontier. All four
    /// checks are necessary.
    pub fn in_scope(&self, url: &Url, visited: &VisitedSet, frontier: &VecDeque<String>) -> bool {
        self.in_domain(url)
            && !visited.contains(url.as_str())
            && !has_ignored_suffix(url.path())
            && !frontier.iter().any(|queued| queued == url.as_str())
    }
}
