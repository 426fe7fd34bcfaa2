use std::time::Duration;

/// Fixed properties of the yfbzb.com portal.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub base_url: String,
    pub search_url: String,
    /// Rows per listing page, also the pagination heuristic threshold.
    pub page_size: usize,
    /// Safety bound against runaway crawls.
    pub max_pages: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            base_url: "https://www.yfbzb.com".to_string(),
            search_url: "https://www.yfbzb.com/search/invitedBidSearch".to_string(),
            page_size: 30,
            max_pages: 20,
        }
    }
}

/// HTTP behaviour shared by every request the crawl issues.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout: Duration,
    /// Pacing sleep between successive fetches.
    pub request_delay: Duration,
    pub max_retries: u32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        RequestConfig {
            timeout: Duration::from_secs(30),
            request_delay: Duration::from_secs(1),
            max_retries: 3,
        }
    }
}

/// What to search for and how far back to look.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub keywords: Vec<String>,
    pub time_range_hours: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            keywords: vec!["无纸化会议".to_string()],
            time_range_hours: 48,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub site: SiteConfig,
    pub request: RequestConfig,
    pub search: SearchConfig,
}
