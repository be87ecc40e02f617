use clap::Parser;
use site_sweep::config::{CrawlConfig, ProxyConfig};

#[derive(Parser, Debug)]
#[command(name = "site-sweep")]
#[command(about = "Bounded same-domain crawler that yields fetched pages")]
#[command(version)]
pub struct Args {
    /// Seed URL; the crawl is bounded to its registrable domain
    pub url: String,

    /// Wall-clock budget in seconds (clamped to the supported range)
    #[arg(short, long)]
    pub time_box: Option<i64>,

    /// Maximum number of URLs to visit (clamped to the supported range)
    #[arg(short, long)]
    pub max_urls: Option<i64>,

    /// User-Agent header override
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Accept-Language header override
    #[arg(long)]
    pub accept_language: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub request_timeout: u64,

    /// Number of fetches allowed in flight at once
    #[arg(short, long, default_value_t = 1)]
    pub dispatch_width: usize,

    /// Proxy host or IP
    #[arg(long)]
    pub proxy_ip: Option<String>,

    /// Proxy port
    #[arg(long, requires = "proxy_ip")]
    pub proxy_port: Option<u16>,

    /// Proxy basic-auth username
    #[arg(long, requires = "proxy_ip")]
    pub proxy_username: Option<String>,

    /// Proxy basic-auth password
    #[arg(long, requires = "proxy_username")]
    pub proxy_password: Option<String>,
}

/// Convert parsed arguments into a crawl configuration
pub fn build_config(args: &Args) -> CrawlConfig {
    let mut config = CrawlConfig::new(&args.url);
    config.time_box = args.time_box;
    config.max_urls = args.max_urls;
    config.user_agent = args.user_agent.clone();
    config.accept_language = args.accept_language.clone();
    config.request_timeout = args.request_timeout;
    config.dispatch_width = args.dispatch_width;

    if let (Some(ip), Some(port)) = (&args.proxy_ip, args.proxy_port) {
        config.proxy = Some(ProxyConfig {
            ip: ip.clone(),
            port,
            username: args.proxy_username.clone(),
            password: args.proxy_password.clone(),
        });
    }

    config
}
