use crate::CrawlError;
use crate::config::CrawlConfig;
use crate::fetch::PageFetcher;
use crate::filter::ScopeFilter;
use crate::limits::CrawlLimits;
use crate::links::LinkNormalizer;
use crate::parsers::html;
use crate::results::FetchedPage;
use crate::visited::VisitedSet;
use std::collections::VecDeque;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Capacity of the channel carrying yielded pages
const PAGE_CHANNEL_CAPACITY: usize = 64;

/// Starts an async crawl and returns a receiver that yields each fetched
/// in-domain page.
///
/// The seed URL is validated here, before any crawling; everything after
/// that is best-effort and never fails the crawl as a whole.
pub async fn start(config: &CrawlConfig) -> Result<mpsc::Receiver<FetchedPage>, CrawlError> {
    let seed = Url::parse(&config.start_url).map_err(|source| CrawlError::InvalidSeed {
        url: config.start_url.clone(),
        source,
    })?;
    let filter = ScopeFilter::for_seed(&seed)
        .ok_or_else(|| CrawlError::SeedWithoutHost(config.start_url.clone()))?;
    let fetcher = PageFetcher::new(config)?;
    let limits = CrawlLimits::new(config.time_box, config.max_urls);

    ::log::info!(
        "Starting crawl of {} bounded to domain {} ({:?} / {} URLs)",
        seed,
        filter.target_domain(),
        limits.time_box(),
        limits.max_urls()
    );

    let (result_tx, result_rx) = mpsc::channel::<FetchedPage>(PAGE_CHANNEL_CAPACITY);

    let session = CrawlSession {
        frontier: VecDeque::from([seed.into()]),
        visited: VisitedSet::default(),
        visited_count: 0,
        limits,
        filter,
        fetcher,
        normalizer: LinkNormalizer::new(),
        dispatch_width: config.dispatch_width.max(1),
    };
    tokio::spawn(session.run(result_tx));

    Ok(result_rx)
}

/// State owned by one crawl's driver task
///
/// Nothing here is shared across crawls; the frontier, visited set, and
/// client (with its cookie jar) live and die with this session.
struct CrawlSession {
    frontier: VecDeque<String>,
    visited: VisitedSet,
    visited_count: u64,
    limits: CrawlLimits,
    filter: ScopeFilter,
    fetcher: PageFetcher,
    normalizer: LinkNormalizer,
    dispatch_width: usize,
}

impl CrawlSession {
    /// Round loop: drain the frontier as this round's batch, process it,
    /// repeat until no new work surfaces.
    ///
    /// Links discovered mid-round land in the emptied frontier, so they are
    /// only eligible in a later round. A round truncated by the governor
    /// discards its batch remainder; the following round then truncates at
    /// zero fetches and the frontier runs dry, so the loop always ends.
    async fn run(mut self, result_tx: mpsc::Sender<FetchedPage>) {
        let mut rounds = 0u64;
        while !self.frontier.is_empty() {
            rounds += 1;
            let batch: Vec<String> = self.frontier.drain(..).collect();
            ::log::debug!("Round {}: {} pending URLs", rounds, batch.len());
            if !self.run_round(batch, &result_tx).await {
                ::log::info!("Receiver dropped, ending crawl early");
                break;
            }
        }
        ::log::info!(
            "Crawl complete after {} rounds, {} URLs visited",
            rounds,
            self.visited_count
        );
    }

    /// Process one round's batch. Returns false once the caller has gone
    /// away and further work is pointless.
    async fn run_round(&mut self, batch: Vec<String>, result_tx: &mpsc::Sender<FetchedPage>) -> bool {
        let mut pending = batch.into_iter();
        let mut truncated = false;
        let mut in_flight: JoinSet<(String, Result<FetchedPage, reqwest::Error>)> = JoinSet::new();

        loop {
            // Top up in-flight fetches, consulting the governor before each
            // dispatch. Hitting a limit truncates the rest of the round but
            // lets already-issued fetches finish.
            while !truncated && in_flight.len() < self.dispatch_width {
                if self.limit_reached() {
                    truncated = true;
                    pending.by_ref().for_each(drop);
                    break;
                }
                let Some(url) = self.next_unvisited(&mut pending) else {
                    break;
                };
                self.visited.insert(&url);
                self.visited_count += 1;
                let fetcher = self.fetcher.clone();
                in_flight.spawn(async move {
                    let result = fetcher.fetch(&url).await;
                    (url, result)
                });
            }

            match in_flight.join_next().await {
                Some(Ok((_, Ok(page)))) => {
                    if !self.process_page(page, result_tx).await {
                        return false;
                    }
                }
                Some(Ok((url, Err(e)))) => {
                    ::log::warn!("Fetch failed for {}: {}", url, e);
                }
                Some(Err(e)) => {
                    ::log::error!("Fetch task failed to run: {}", e);
                }
                None => break,
            }
        }
        true
    }

    /// Pull the next batch entry that is not already in the visited set
    fn next_unvisited(&self, pending: &mut impl Iterator<Item = String>) -> Option<String> {
        for url in pending {
            if self.visited.contains(&url) {
                ::log::trace!("Skipping already visited: {}", url);
                continue;
            }
            return Some(url);
        }
        None
    }

    /// Governor poll run before every dispatch
    fn limit_reached(&self) -> bool {
        if self.limits.page_budget_spent(self.visited_count) {
            ::log::info!("Page budget of {} spent, truncating round", self.limits.max_urls());
            true
        } else if self.limits.deadline_passed() {
            ::log::info!("Crawl deadline passed, truncating round");
            true
        } else if self.limits.memory_danger() {
            ::log::warn!("Host memory pressure detected, truncating round");
            true
        } else {
            false
        }
    }

    /// Yield a completed response and queue its surviving links
    ///
    /// Responses whose effective URL has left the target domain are dropped
    /// without notification or link extraction. Returns false when the
    /// receiver is gone.
    async fn process_page(&mut self, page: FetchedPage, result_tx: &mpsc::Sender<FetchedPage>) -> bool {
        let effective = match Url::parse(&page.url) {
            Ok(url) => url,
            Err(e) => {
                ::log::warn!("Unparseable effective URL {}: {}", page.url, e);
                return true;
            }
        };
        if !self.filter.in_domain(&effective) {
            ::log::debug!("Dropping off-domain response: {}", page.url);
            return true;
        }

        let hrefs = html::extract_links(&page.body);
        if result_tx.send(page).await.is_err() {
            return false;
        }

        for link in self.normalizer.resolve_all(&effective, &hrefs) {
            if self.filter.in_scope(&link, &self.visited, &self.frontier) {
                ::log::debug!("Queueing link for a later round: {}", link);
                self.frontier.push_back(link.into());
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(mut rx: mpsc::Receiver<FetchedPage>) -> Vec<FetchedPage> {
        let mut pages = Vec::new();
        while let Some(page) = rx.recv().await {
            pages.push(page);
        }
        pages
    }

    fn page_with_links(hrefs: &[&str]) -> String {
        let anchors: String = hrefs
            .iter()
            .map(|href| format!("<a href=\"{}\">link</a>", href))
            .collect();
        format!("<html><body>{}</body></html>", anchors)
    }

    #[tokio::test]
    async fn test_crawl_visits_linked_pages() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&["/a", "/b"]))
            .create_async()
            .await;
        let _a = server.mock("GET", "/a").with_body("a").create_async().await;
        let _b = server.mock("GET", "/b").with_body("b").create_async().await;

        let rx = start(&CrawlConfig::new(&server.url())).await.unwrap();
        let pages = collect(rx).await;

        let mut urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![
                format!("{}/", server.url()),
                format!("{}/a", server.url()),
                format!("{}/b", server.url()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_offsite_and_noise_links_collapse() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&[
                "/a",
                "http://other.com/x",
                "#frag",
                "mailto:x@y.com",
                "/a",
            ]))
            .create_async()
            .await;
        let a = server
            .mock("GET", "/a")
            .with_body("a")
            .expect(1)
            .create_async()
            .await;

        let rx = start(&CrawlConfig::new(&server.url())).await.unwrap();
        let pages = collect(rx).await;

        a.assert_async().await;
        let mut urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![format!("{}/", server.url()), format!("{}/a", server.url())]
        );
    }

    #[tokio::test]
    async fn test_back_links_are_not_refetched() {
        let mut server = mockito::Server::new_async().await;
        let root = server
            .mock("GET", "/")
            .with_body(page_with_links(&["/a"]))
            .expect(1)
            .create_async()
            .await;
        let a = server
            .mock("GET", "/a")
            .with_body(page_with_links(&["/", "/a"]))
            .expect(1)
            .create_async()
            .await;

        let rx = start(&CrawlConfig::new(&server.url())).await.unwrap();
        let pages = collect(rx).await;

        root.assert_async().await;
        a.assert_async().await;
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_ignored_extensions_are_never_fetched() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&["/report.PDF", "/photo.jpg", "/a"]))
            .create_async()
            .await;
        let _a = server.mock("GET", "/a").with_body("a").create_async().await;
        let pdf = server
            .mock("GET", "/report.PDF")
            .expect(0)
            .create_async()
            .await;
        let jpg = server.mock("GET", "/photo.jpg").expect(0).create_async().await;

        let rx = start(&CrawlConfig::new(&server.url())).await.unwrap();
        let pages = collect(rx).await;

        pdf.assert_async().await;
        jpg.assert_async().await;
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_page_budget_bounds_yields() {
        let mut server = mockito::Server::new_async().await;
        let hrefs: Vec<String> = (0..60).map(|i| format!("/p{}", i)).collect();
        let href_refs: Vec<&str> = hrefs.iter().map(String::as_str).collect();
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&href_refs))
            .create_async()
            .await;
        let _pages = server
            .mock("GET", mockito::Matcher::Regex(r"^/p\d+$".to_string()))
            .with_body("leaf")
            .expect_at_most(60)
            .create_async()
            .await;

        // Raw budget of 1 clamps up to the base budget.
        let mut config = CrawlConfig::new(&server.url());
        config.max_urls = Some(1);
        let rx = start(&config).await.unwrap();
        let pages = collect(rx).await;

        assert_eq!(pages.len() as u64, crate::limits::BASE_CRAWL_URLS);
    }

    #[tokio::test]
    async fn test_offdomain_redirect_is_dropped_silently() {
        let mut server = mockito::Server::new_async().await;
        // "localhost" resolves to the same listener but is a different host,
        // so the effective URL leaves the crawl's domain.
        let out_url = format!("{}/out", server.url().replace("127.0.0.1", "localhost"));
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&["/leave", "/a"]))
            .create_async()
            .await;
        let _leave = server
            .mock("GET", "/leave")
            .with_status(302)
            .with_header("location", &out_url)
            .create_async()
            .await;
        let _out = server
            .mock("GET", "/out")
            .with_body(page_with_links(&["/smuggled"]))
            .create_async()
            .await;
        let _a = server.mock("GET", "/a").with_body("a").create_async().await;
        let smuggled = server.mock("GET", "/smuggled").expect(0).create_async().await;

        let rx = start(&CrawlConfig::new(&server.url())).await.unwrap();
        let pages = collect(rx).await;

        smuggled.assert_async().await;
        let mut urls: Vec<_> = pages.iter().map(|p| p.url.as_str()).collect();
        urls.sort();
        assert_eq!(
            urls,
            vec![format!("{}/", server.url()), format!("{}/a", server.url())]
        );
    }

    #[tokio::test]
    async fn test_error_statuses_are_yielded_in_domain() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&["/missing"]))
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body("gone")
            .create_async()
            .await;

        let rx = start(&CrawlConfig::new(&server.url())).await.unwrap();
        let pages = collect(rx).await;

        let missing = pages
            .iter()
            .find(|p| p.url.ends_with("/missing"))
            .expect("404 page should still be yielded");
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn test_concurrent_dispatch_visits_the_same_pages() {
        let mut server = mockito::Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_body(page_with_links(&["/a", "/b", "/c"]))
            .create_async()
            .await;
        let mut leaves = Vec::new();
        for path in ["/a", "/b", "/c"] {
            leaves.push(
                server
                    .mock("GET", path)
                    .with_body("leaf")
                    .expect(1)
                    .create_async()
                    .await,
            );
        }

        let mut config = CrawlConfig::new(&server.url());
        config.dispatch_width = 3;
        let rx = start(&config).await.unwrap();
        let pages = collect(rx).await;

        for leaf in &leaves {
            leaf.assert_async().await;
        }
        assert_eq!(pages.len(), 4);
    }

    #[tokio::test]
    async fn test_expired_deadline_truncates_before_any_fetch() {
        let mut server = mockito::Server::new_async().await;
        let root = server.mock("GET", "/").expect(0).create_async().await;

        let config = CrawlConfig::new(&server.url());
        let seed = Url::parse(&config.start_url).unwrap();
        let session = CrawlSession {
            frontier: VecDeque::from([seed.as_str().to_string()]),
            visited: VisitedSet::default(),
            visited_count: 0,
            limits: CrawlLimits::expired(),
            filter: ScopeFilter::for_seed(&seed).unwrap(),
            fetcher: PageFetcher::new(&config).unwrap(),
            normalizer: LinkNormalizer::new(),
            dispatch_width: 1,
        };
        let (tx, rx) = mpsc::channel(8);
        session.run(tx).await;

        root.assert_async().await;
        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_seed_fails_fast() {
        assert!(start(&CrawlConfig::new("not a url")).await.is_err());
        assert!(start(&CrawlConfig::new("data:text/plain,hi")).await.is_err());
    }
}
