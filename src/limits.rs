use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Time budget applied when none (or an invalid one) is supplied, in seconds
pub const BASE_CRAWL_TIME: u64 = 60;

/// Hard ceiling on the crawl time budget, in seconds
pub const MAX_CRAWL_TIME: u64 = 1200;

/// Page budget applied when none (or an invalid one) is supplied
pub const BASE_CRAWL_URLS: u64 = 50;

/// Hard ceiling on the page budget
pub const MAX_CRAWL_URLS: u64 = 1000;

/// Usage/limit ratio at which memory pressure is reported
const MEMORY_DANGER_RATIO: f64 = 0.8;

// cgroup v2 exposes a flat hierarchy, v1 nests memory under its own controller.
const CGROUP_V2_USAGE: &str = "/sys/fs/cgroup/memory.current";
const CGROUP_V2_LIMIT: &str = "/sys/fs/cgroup/memory.max";
const CGROUP_V1_USAGE: &str = "/sys/fs/cgroup/memory/memory.usage_in_bytes";
const CGROUP_V1_LIMIT: &str = "/sys/fs/cgroup/memory/memory.limit_in_bytes";

/// Effective resource limits for one crawl
///
/// Raw caller-supplied budgets are clamped into `[BASE, MAX]`; non-positive
/// or absent values fall back to the base. The deadline is fixed at
/// construction. Memory pressure is advisory: it is polled by the driver
/// before each dispatch and never interrupts an in-flight fetch.
#[derive(Debug)]
pub struct CrawlLimits {
    time_box: Duration,
    max_urls: u64,
    deadline: Instant,
    memory: Option<MemoryGauge>,
}

impl CrawlLimits {
    /// Build limits from raw caller-supplied budgets, starting the clock now
    pub fn new(time_box: Option<i64>, max_urls: Option<i64>) -> Self {
        let time_box = Duration::from_secs(clamp(time_box, BASE_CRAWL_TIME, MAX_CRAWL_TIME));
        Self {
            time_box,
            max_urls: clamp(max_urls, BASE_CRAWL_URLS, MAX_CRAWL_URLS),
            deadline: Instant::now() + time_box,
            memory: MemoryGauge::detect(),
        }
    }

    /// Effective wall-clock budget
    pub fn time_box(&self) -> Duration {
        self.time_box
    }

    /// Effective page budget
    pub fn max_urls(&self) -> u64 {
        self.max_urls
    }

    /// Whether the absolute deadline has passed
    pub fn deadline_passed(&self) -> bool {
        Instant::now() > self.deadline
    }

    /// Whether `visited` URLs exhaust the page budget
    pub fn page_budget_spent(&self, visited: u64) -> bool {
        visited >= self.max_urls
    }

    /// Whether the host reports dangerous memory pressure
    ///
    /// Reports false when no cgroup memory interface is present, or when the
    /// interface cannot be read or holds zero/non-numeric values. A governor
    /// that cannot assess pressure does not block crawling.
    pub fn memory_danger(&self) -> bool {
        self.memory.as_ref().is_some_and(MemoryGauge::danger)
    }

    #[cfg(test)]
    fn with_memory_gauge(mut self, gauge: Option<MemoryGauge>) -> Self {
        self.memory = gauge;
        self
    }

    #[cfg(test)]
    pub(crate) fn expired() -> Self {
        let mut limits = Self::new(None, None);
        limits.deadline = Instant::now() - Duration::from_secs(1);
        limits
    }
}

/// Clamp a raw budget into `[base, max]`, treating non-positive input as absent
fn clamp(raw: Option<i64>, base: u64, max: u64) -> u64 {
    match raw {
        Some(value) if value > 0 => (value as u64).clamp(base, max),
        _ => base,
    }
}

/// Read-only view of the host's cgroup memory accounting files
#[derive(Debug)]
struct MemoryGauge {
    usage_path: PathBuf,
    limit_path: PathBuf,
}

impl MemoryGauge {
    /// Probe the well-known cgroup paths, preferring v2 over v1
    fn detect() -> Option<Self> {
        [
            (CGROUP_V2_USAGE, CGROUP_V2_LIMIT),
            (CGROUP_V1_USAGE, CGROUP_V1_LIMIT),
        ]
        .into_iter()
        .find(|(usage, limit)| Path::new(usage).is_file() && Path::new(limit).is_file())
        .map(|(usage, limit)| Self {
            usage_path: PathBuf::from(usage),
            limit_path: PathBuf::from(limit),
        })
    }

    /// Whether usage has reached the danger ratio of the limit
    fn danger(&self) -> bool {
        let (Some(usage), Some(limit)) = (
            read_bytes_value(&self.usage_path),
            read_bytes_value(&self.limit_path),
        ) else {
            return false;
        };
        if limit == 0 {
            return false;
        }
        usage as f64 / limit as f64 >= MEMORY_DANGER_RATIO
    }
}

/// Parse a single numeric value from a cgroup accounting file
///
/// cgroup v2 writes the literal `max` for an unlimited cgroup; that (and any
/// other non-numeric content) yields None.
fn read_bytes_value(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}
