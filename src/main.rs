use clap::Parser;
use site_sweep::Crawl;
use site_sweep::results::FetchedPage;

mod args;
use args::{Args, build_config};

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    ::log::info!("Starting crawl of {}", args.url);

    let config = build_config(&args);

    // Start the crawl and get a receiver for fetched pages
    let mut rx = match Crawl::with_config(config).start().await {
        Ok(rx) => rx,
        Err(e) => {
            ::log::error!("Failed to start crawl: {}", e);
            std::process::exit(1);
        }
    };

    // Process pages as they come in
    let mut pages_yielded = 0u64;
    let start_time = std::time::Instant::now();

    while let Some(page) = rx.recv().await {
        pages_yielded += 1;
        report_page(&page, pages_yielded);
    }

    let duration = start_time.elapsed();
    ::log::info!(
        "Crawl complete - {} pages in {:.2} seconds",
        pages_yielded,
        duration.as_secs_f64()
    );
}

// Example sink for fetched pages; a real application would index or store
// them here
fn report_page(page: &FetchedPage, count: u64) {
    println!("[{}] {} {}", count, page.status, page.url);
    ::log::debug!("Page body is {} bytes", page.body.len());
}
