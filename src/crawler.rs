use std::thread;

use chrono::{Duration, Local, NaiveDateTime};
use log::{error, info, warn};

use crate::config::Config;
use crate::detail::{DetailExtractor, DetailFields};
use crate::listing::{Announcement, ListingParser};
use crate::runner::{CrawlControl, CrawlEvent};
use crate::transport::Transport;

/// Drives the keyword × page loop against the yfbzb.com search
/// endpoint. One crawl in flight per instance; all fetches are
/// sequential and paced by the configured delay.
pub struct YfbzbScraper {
    config: Config,
    transport: Transport,
    listing: ListingParser,
    detail: DetailExtractor,
    /// Oldest publish time still in range. Computed once so the window
    /// does not drift mid-run.
    cutoff: NaiveDateTime,
}

impl YfbzbScraper {
    pub fn new(config: Config) -> Self {
        let cutoff =
            Local::now().naive_local() - Duration::hours(config.search.time_range_hours);
        let transport = Transport::new(&config.request);
        let listing = ListingParser::new(&config.site.base_url, config.site.page_size);
        YfbzbScraper {
            transport,
            listing,
            detail: DetailExtractor::new(),
            cutoff,
            config,
        }
    }

    pub fn cutoff(&self) -> NaiveDateTime {
        self.cutoff
    }

    fn search_params(&self, keyword: &str, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("type", "0".to_string()),
            ("defaultSearch", "false".to_string()),
            ("keyword", keyword.to_string()),
            ("pageNo", page.to_string()),
            ("pageSize", self.config.site.page_size.to_string()),
            ("noticeType", "3".to_string()),
            ("invitedBidType", "3".to_string()),
            ("timeType", "1".to_string()),
            ("searchType", "2".to_string()),
            ("searchMode", "1".to_string()),
        ]
    }

    /// One page of search results for `keyword`. A transport failure is
    /// logged and surfaces as an empty page with no continuation, which
    /// is distinct from a page that legitimately had no rows.
    pub fn search_list(&self, keyword: &str, page: u32) -> (Vec<Announcement>, bool) {
        let params = self.search_params(keyword, page);
        let html = match self
            .transport
            .fetch(&self.config.site.search_url, Some(&params))
        {
            Ok(html) => html,
            Err(e) => {
                error!(
                    "Search request for '{}' page {} failed: {}",
                    keyword, page, e
                );
                return (Vec::new(), false);
            }
        };
        self.listing.parse_page(&html, self.cutoff)
    }

    /// Detail fields for one announcement; empty on any failure.
    pub fn get_detail(&self, url: &str) -> DetailFields {
        match self.transport.fetch(url, None) {
            Ok(html) => self.detail.extract(&html),
            Err(e) => {
                warn!("Detail fetch failed for {}: {}", url, e);
                DetailFields::default()
            }
        }
    }

    /// Runs the full crawl. Cancellation is checked before every page
    /// and every detail fetch; a cancelled crawl returns whatever has
    /// been collected so far.
    pub fn scrape(&self, fetch_details: bool, ctl: &CrawlControl) -> Vec<Announcement> {
        let mut all_results = Vec::new();

        for keyword in &self.config.search.keywords {
            info!("Searching keyword: {}", keyword);
            info!(
                "Time window: last {} hours",
                self.config.search.time_range_hours
            );

            let mut keyword_results = Vec::new();
            let mut page = 1;

            while page <= self.config.site.max_pages {
                if ctl.is_cancelled() {
                    info!("Crawl cancelled, returning partial results");
                    all_results.extend(keyword_results);
                    return all_results;
                }

                info!("Fetching page {}...", page);
                let (results, has_more) = self.search_list(keyword, page);

                if results.is_empty() {
                    info!("Page {} had no rows in range, stopping", page);
                    break;
                }

                info!("Page {} yielded {} announcements", page, results.len());
                ctl.emit(CrawlEvent::PageScraped {
                    keyword: keyword.clone(),
                    page,
                    count: results.len(),
                });
                keyword_results.extend(results);

                if !has_more {
                    info!("Reached last page or the time window edge");
                    break;
                }

                page += 1;
                thread::sleep(self.config.request.request_delay);
            }

            info!(
                "Keyword '{}' collected {} announcements",
                keyword,
                keyword_results.len()
            );

            if fetch_details && !keyword_results.is_empty() {
                info!("Fetching announcement details...");
                let total = keyword_results.len();
                for (done, item) in keyword_results.iter_mut().enumerate() {
                    if ctl.is_cancelled() {
                        info!("Crawl cancelled during detail fetch");
                        break;
                    }
                    if item.detail_url.is_empty() {
                        continue;
                    }
                    let details = self.get_detail(&item.detail_url);
                    item.merge_details(&details);
                    ctl.emit(CrawlEvent::DetailProgress {
                        done: done + 1,
                        total,
                    });
                    thread::sleep(self.config.request.request_delay);
                }
            }

            all_results.extend(keyword_results);
            if ctl.is_cancelled() {
                break;
            }
        }

        info!("Crawl finished with {} announcements", all_results.len());
        ctl.emit(CrawlEvent::Done {
            total: all_results.len(),
        });
        all_results
    }
}
