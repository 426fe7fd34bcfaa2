pub mod config;
pub mod crawler;
pub mod dates;
pub mod detail;
pub mod exporter;
pub mod listing;
pub mod logger;
pub mod runner;
pub mod transport;

// Exporting types for convenience
pub use config::Config;
pub use crawler::YfbzbScraper;
pub use detail::{DetailExtractor, DetailFields};
pub use exporter::CsvExporter;
pub use listing::{Announcement, ListingParser};
pub use runner::{CrawlControl, CrawlEvent, CrawlJob};
pub use transport::{FetchError, Transport};
