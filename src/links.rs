use regex::Regex;
use url::Url;

/// Resolves raw href strings against a page's effective URL
///
/// Noise hrefs (empty, script/mail/about schemes, bare fragments, stray
/// parenthesis artifacts from malformed markup) are skipped before any URI
/// work. Resolution failures drop that link only; they never abort the rest
/// of a page's links.
#[derive(Debug)]
pub struct LinkNormalizer {
    noise: Regex,
}

impl Default for LinkNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkNormalizer {
    pub fn new() -> Self {
        let noise = Regex::new(r"(?i)^\s*$|^\s*(javascript:|mailto:|tel:|about:|#|\()")
            .expect("noise pattern should be valid");
        Self { noise }
    }

    /// Resolve one href to an absolute, navigable URL
    ///
    /// Returns None for noise, join failures, and non-http(s) results.
    /// Fragments are dropped from the resolved URL so equivalent pages
    /// collapse to one frontier entry.
    pub fn resolve(&self, base: &Url, href: &str) -> Option<Url> {
        if self.noise.is_match(href) {
            return None;
        }

        let mut resolved = match base.join(href.trim()) {
            Ok(url) => url,
            Err(e) => {
                ::log::debug!("Dropping unresolvable href {:?}: {}", href, e);
                return None;
            }
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            return None;
        }

        resolved.set_fragment(None);
        Some(resolved)
    }

    /// Resolve a batch of hrefs, silently dropping the unusable ones
    pub fn resolve_all(&self, base: &Url, hrefs: &[String]) -> Vec<Url> {
        hrefs
            .iter()
            .filter_map(|href| self.resolve(base, href))
            .collect()
    }
}
