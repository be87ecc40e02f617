use clap::Parser;
use site_sweep::Crawl;
use site_sweep::config::CrawlConfig;
use std::error::Error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON crawl configuration file
    #[arg(short, long)]
    config: String,

    /// Override the wall-clock budget in seconds
    #[arg(short, long)]
    time_box: Option<i64>,

    /// Override the page budget
    #[arg(short, long)]
    max_urls: Option<i64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize logger
    env_logger::init();

    let args = Args::parse();

    // Load configuration from file, then apply CLI overrides
    let mut config = CrawlConfig::from_file(&args.config)?;
    if args.time_box.is_some() {
        config.time_box = args.time_box;
    }
    if args.max_urls.is_some() {
        config.max_urls = args.max_urls;
    }

    println!("Crawling {} with:", config.start_url);
    println!("  time_box: {:?}", config.time_box);
    println!("  max_urls: {:?}", config.max_urls);
    println!("  dispatch_width: {}", config.dispatch_width);

    let mut rx = Crawl::with_config(config).start().await?;

    while let Some(page) = rx.recv().await {
        println!("{} {} ({} bytes)", page.status, page.url, page.body.len());
    }

    Ok(())
}
