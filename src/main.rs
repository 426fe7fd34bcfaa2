use std::error::Error;

use log::{info, warn};

use yfbzb_scraper::{Config, CrawlControl, CsvExporter, YfbzbScraper};

fn main() -> Result<(), Box<dyn Error>> {
    yfbzb_scraper::logger::init();
    info!("Starting yfbzb announcement crawl...");

    let mut config = Config::default();
    // Keywords from argv override the defaults; flags and richer CLI
    // handling live with the callers of this crate.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        config.search.keywords = args;
    }

    info!("Keywords: {}", config.search.keywords.join(", "));
    info!("Time window: last {} hours", config.search.time_range_hours);

    let scraper = YfbzbScraper::new(config);
    let results = scraper.scrape(true, &CrawlControl::new());

    if results.is_empty() {
        warn!("No announcements matched the search window");
        return Ok(());
    }

    let exporter = CsvExporter::new("output")?;
    let path = exporter.export(&results)?;

    info!("Done: {} announcements -> {}", results.len(), path.display());
    for (i, item) in results.iter().take(5).enumerate() {
        info!("  {}. [{}] {}", i + 1, item.publish_time, item.title);
    }
    if results.len() > 5 {
        info!("  ... and {} more", results.len() - 5);
    }

    Ok(())
}
