use clap::Parser;
use site_sweep::Crawl;
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to crawl
    #[arg(short, long)]
    url: String,

    /// Wall-clock budget in seconds
    #[arg(short, long)]
    time_box: Option<i64>,

    /// Maximum number of URLs to visit
    #[arg(short, long)]
    max_urls: Option<i64>,

    /// User-Agent header override
    #[arg(long)]
    user_agent: Option<String>,

    /// Number of fetches allowed in flight at once
    #[arg(short, long)]
    dispatch_width: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    // Parse command line arguments
    let args = Args::parse();

    println!("Starting crawl of {}", args.url);

    // Create a crawl builder bound to the seed URL
    let mut crawl = Crawl::new(&args.url);

    // Apply command-line overrides
    if let Some(time_box) = args.time_box {
        println!("Overriding time box: {}s", time_box);
        crawl = crawl.with_time_box(time_box);
    }

    if let Some(max_urls) = args.max_urls {
        println!("Overriding max URLs: {}", max_urls);
        crawl = crawl.with_max_urls(max_urls);
    }

    if let Some(user_agent) = &args.user_agent {
        println!("Overriding User-Agent: {}", user_agent);
        crawl = crawl.with_header("User-Agent", user_agent);
    }

    if let Some(width) = args.dispatch_width {
        println!("Overriding dispatch width: {}", width);
        crawl = crawl.with_dispatch_width(width);
    }

    // Start the crawl
    let mut rx = crawl.start().await?;

    // Process pages as they come in
    let mut pages_crawled = 0;
    let start_time = std::time::Instant::now();

    while let Some(page) = rx.recv().await {
        pages_crawled += 1;
        println!("Received page {}: {} {}", pages_crawled, page.status, page.url);
    }

    let duration = start_time.elapsed();
    println!(
        "Crawling complete. Processed {} pages in {:.2} seconds.",
        pages_crawled,
        duration.as_secs_f64()
    );

    Ok(())
}
