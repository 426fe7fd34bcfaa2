use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::crawler::YfbzbScraper;
use crate::listing::Announcement;

/// Progress events emitted while a crawl runs. A host (GUI, server)
/// drains these from its own thread; the engine never blocks on them.
#[derive(Debug, Clone)]
pub enum CrawlEvent {
    PageScraped {
        keyword: String,
        page: u32,
        count: usize,
    },
    DetailProgress {
        done: usize,
        total: usize,
    },
    Done {
        total: usize,
    },
}

/// Cancellation flag plus optional event sink, shared between the
/// crawl thread and whoever controls it.
#[derive(Clone, Default)]
pub struct CrawlControl {
    cancelled: Arc<AtomicBool>,
    events: Option<Sender<CrawlEvent>>,
}

impl CrawlControl {
    pub fn new() -> Self {
        CrawlControl::default()
    }

    pub fn with_events(sender: Sender<CrawlEvent>) -> Self {
        CrawlControl {
            cancelled: Arc::new(AtomicBool::new(false)),
            events: Some(sender),
        }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn emit(&self, event: CrawlEvent) {
        if let Some(sender) = &self.events {
            // A disconnected receiver just means nobody is listening.
            let _ = sender.send(event);
        }
    }
}

/// One crawl running on a background thread.
pub struct CrawlJob {
    control: CrawlControl,
    events: Receiver<CrawlEvent>,
    handle: JoinHandle<Vec<Announcement>>,
}

impl CrawlJob {
    pub fn spawn(scraper: YfbzbScraper, fetch_details: bool) -> Self {
        let (tx, rx) = mpsc::channel();
        let control = CrawlControl::with_events(tx);
        let worker_ctl = control.clone();
        let handle = thread::spawn(move || scraper.scrape(fetch_details, &worker_ctl));
        CrawlJob {
            control,
            events: rx,
            handle,
        }
    }

    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn events(&self) -> &Receiver<CrawlEvent> {
        &self.events
    }

    /// Waits for the crawl thread; a panicked worker yields an empty
    /// result rather than poisoning the caller.
    pub fn join(self) -> Vec<Announcement> {
        self.handle.join().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let ctl = CrawlControl::new();
        let clone = ctl.clone();
        assert!(!clone.is_cancelled());
        ctl.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn emit_delivers_to_receiver() {
        let (tx, rx) = mpsc::channel();
        let ctl = CrawlControl::with_events(tx);
        ctl.emit(CrawlEvent::PageScraped {
            keyword: "会议".to_string(),
            page: 1,
            count: 12,
        });
        match rx.recv().unwrap() {
            CrawlEvent::PageScraped { page, count, .. } => {
                assert_eq!(page, 1);
                assert_eq!(count, 12);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn emit_without_listener_is_a_noop() {
        let ctl = CrawlControl::new();
        ctl.emit(CrawlEvent::Done { total: 0 });
    }

    #[test]
    fn job_with_no_keywords_finishes_immediately() {
        let mut config = Config::default();
        config.search.keywords.clear();
        let job = CrawlJob::spawn(YfbzbScraper::new(config), true);
        let results = job.join();
        assert!(results.is_empty());
    }

    #[test]
    fn finished_job_emits_done_event() {
        let mut config = Config::default();
        config.search.keywords.clear();
        let job = CrawlJob::spawn(YfbzbScraper::new(config), false);
        let event = job.events().recv().unwrap();
        assert!(matches!(event, CrawlEvent::Done { total: 0 }));
        job.join();
    }
}
