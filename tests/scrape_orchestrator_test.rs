use async_trait::async_trait;
use chrono::NaiveDate;
use sift::apis::factory::known_venues;
use sift::common::constants::*;
use sift::common::error::{Result, ScraperError};
use sift::pipeline::orchestrator::month_page_urls;
use sift::pipeline::{PageFetcher, ScrapeOrchestrator};
use sift::storage::{InMemoryStorage, Storage};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves canned pages and remembers what was asked for. Unknown urls fail like a 404.
#[derive(Default)]
struct StubFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages.get(url).cloned().ok_or_else(|| ScraperError::Network {
            url: url.to_string(),
            message: "HTTP 404".to_string(),
        })
    }
}

const EMPTY_BOTTLE_PAGE: &str = r#"
    <div class="show_summary">
      <a href="/show/1001">info</a>
      <div class="show_artists">
        Toast Test
        The Toe Jam
      </div>
      <span class="tw-event-date">Sep 08</span>
      <span class="tw-event-time">7:00 PM</span>
    </div>
    <div class="show_summary">
      <a href="/show/1002">info</a>
      <div class="show_artists">Bottle Presents: Big Band</div>
      <div class="show_venue">Thalia Hall</div>
      <span class="tw-event-date">Oct 3</span>
      <span class="tw-event-time">9:30 PM</span>
    </div>
    <div class="show_summary">
      <div class="show_artists">No Date Band</div>
    </div>
"#;

/// Hands out the given bodies in order, one per fetch, repeating the last one.
struct SequenceFetcher {
    bodies: Vec<&'static str>,
    calls: Mutex<usize>,
}

#[async_trait]
impl PageFetcher for SequenceFetcher {
    async fn fetch(&self, _url: &str) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        let body = self.bodies[(*calls).min(self.bodies.len() - 1)];
        *calls += 1;
        Ok(body.to_string())
    }
}

fn lh_st_page(month: &str, day: u32) -> String {
    format!(
        r#"<div id="shows">
             <div class="showItem LincolnHall">
               <div class="header">Lincoln Band {month} {day:02} 2025</div>
               <div class="bands">Lincoln Band</div>
               <div class="ticketInfo">Show 8:00 PM</div>
               <div class="avail">$15</div>
               <div class="buttons"><a href="/event/{day}">Buy</a></div>
             </div>
             <div class="showItem Schubas">
               <div class="header">Schubas Band {month} {day:02} 2025</div>
               <div class="bands">Schubas Band</div>
               <div class="ticketInfo">Show 9:00 PM</div>
               <div class="avail">$12</div>
               <div class="buttons"><a href="/event/9{day}">Buy</a></div>
             </div>
           </div>"#
    )
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap()
}

async fn seeded_storage() -> Arc<InMemoryStorage> {
    let storage = Arc::new(InMemoryStorage::new());
    for venue in known_venues() {
        storage.upsert_venue(&venue).await.unwrap();
    }
    storage
}

#[tokio::test]
async fn failed_venue_does_not_stop_the_others() {
    let storage = seeded_storage().await;
    let fetcher = Arc::new(StubFetcher::default().with_page(EMPTY_BOTTLE_URL, EMPTY_BOTTLE_PAGE));
    let orchestrator = ScrapeOrchestrator::new(fetcher, storage.clone());

    let summary = orchestrator
        .run(Some(vec![METRO_ID, EMPTY_BOTTLE_ID, 42]), today())
        .await
        .unwrap();

    assert_eq!(summary.venues_attempted, 3);
    assert_eq!(summary.venues_scraped, 1);
    assert_eq!(summary.shows_found, 2);
    assert_eq!(summary.shows_skipped, 1);
    assert_eq!(summary.concerts_created, 2);

    assert_eq!(summary.failures.len(), 2);
    assert_eq!(summary.failures[0].venue_id, METRO_ID);
    assert!(summary.failures[0].error.contains("HTTP 404"));
    assert_eq!(summary.failures[1].venue_id, 42);

    let concerts = storage.list_active_concerts().await.unwrap();
    assert_eq!(concerts.len(), 2);
    let hosted = concerts.iter().find(|c| c.billing == "Toast Test, The Toe Jam").unwrap();
    assert_eq!(hosted.venue_id, Some(EMPTY_BOTTLE_ID));
    assert_eq!(hosted.url, "http://emptybottle.com/show/1001");
    assert_eq!(hosted.starts_at.to_rfc3339(), "2025-09-09T00:00:00+00:00");
    let promoted = concerts.iter().find(|c| c.billing == "Bottle Presents: Big Band").unwrap();
    assert_eq!(promoted.venue_id, Some(MISC_VENUE_ID));
}

#[tokio::test]
async fn rescraping_a_loaded_venue_is_a_no_op() {
    let storage = seeded_storage().await;
    let fetcher = Arc::new(StubFetcher::default().with_page(EMPTY_BOTTLE_URL, EMPTY_BOTTLE_PAGE));
    let orchestrator = ScrapeOrchestrator::new(fetcher.clone(), storage.clone());

    let first = orchestrator.run(Some(vec![EMPTY_BOTTLE_ID]), today()).await.unwrap();
    let second = orchestrator.run(Some(vec![EMPTY_BOTTLE_ID]), today()).await.unwrap();

    assert_eq!(first.concerts_created, 2);
    assert_eq!(second.venues_scraped, 0);
    assert_eq!(second.concerts_created, 0);
    assert!(second.failures.is_empty());
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(fetcher.requested().len(), 1);
    assert_eq!(storage.list_active_concerts().await.unwrap().len(), 2);
}

#[tokio::test]
async fn a_venue_without_stored_shows_is_scraped_again() {
    let storage = seeded_storage().await;
    let fetcher = Arc::new(SequenceFetcher {
        bodies: vec!["<html><body>Schedule coming soon</body></html>", EMPTY_BOTTLE_PAGE],
        calls: Mutex::new(0),
    });
    let orchestrator = ScrapeOrchestrator::new(fetcher.clone(), storage.clone());

    let empty = orchestrator.run(Some(vec![EMPTY_BOTTLE_ID]), today()).await.unwrap();
    assert_eq!(empty.venues_scraped, 1);
    assert_eq!(empty.concerts_created, 0);

    let retry = orchestrator.run(Some(vec![EMPTY_BOTTLE_ID]), today()).await.unwrap();
    assert_eq!(retry.concerts_created, 2);
    assert_eq!(*fetcher.calls.lock().unwrap(), 2);

    let again = orchestrator.run(Some(vec![EMPTY_BOTTLE_ID]), today()).await.unwrap();
    assert_eq!(again.concerts_created, 0);
    assert_eq!(*fetcher.calls.lock().unwrap(), 2);
}

#[tokio::test]
async fn paginated_venue_fetches_three_months_and_keeps_its_own_shows() {
    let storage = seeded_storage().await;
    let urls = month_page_urls(LH_ST_URL, today(), 3).unwrap();
    let fetcher = Arc::new(
        StubFetcher::default()
            .with_page(&urls[0], &lh_st_page("Sep", 12))
            .with_page(&urls[1], &lh_st_page("Oct", 3))
            .with_page(&urls[2], &lh_st_page("Nov", 21)),
    );
    let orchestrator =
        ScrapeOrchestrator::new(fetcher.clone(), storage.clone()).with_settle_delay(Duration::ZERO);

    let summary = orchestrator.run(Some(vec![LINCOLN_HALL_ID]), today()).await.unwrap();

    assert_eq!(fetcher.requested(), urls);
    assert_eq!(summary.shows_found, 3);
    let concerts = storage.list_active_concerts().await.unwrap();
    assert_eq!(concerts.len(), 3);
    assert!(concerts.iter().all(|c| c.billing == "Lincoln Band"));
    assert!(concerts.iter().all(|c| c.venue_id == Some(LINCOLN_HALL_ID)));
}

#[tokio::test]
async fn a_failed_month_page_fails_the_whole_venue() {
    let storage = seeded_storage().await;
    let urls = month_page_urls(LH_ST_URL, today(), 3).unwrap();
    let fetcher = Arc::new(StubFetcher::default().with_page(&urls[0], &lh_st_page("Sep", 12)));
    let orchestrator =
        ScrapeOrchestrator::new(fetcher, storage.clone()).with_settle_delay(Duration::ZERO);

    let summary = orchestrator.run(Some(vec![SCHUBAS_ID]), today()).await.unwrap();

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].venue_name, SCHUBAS_VENUE_NAME);
    assert!(storage.list_active_concerts().await.unwrap().is_empty());
}

#[tokio::test]
async fn shows_for_unknown_venue_rows_are_stored_without_a_venue() {
    let storage = Arc::new(InMemoryStorage::new());
    let fetcher = Arc::new(StubFetcher::default().with_page(EMPTY_BOTTLE_URL, EMPTY_BOTTLE_PAGE));
    let orchestrator = ScrapeOrchestrator::new(fetcher, storage.clone());

    orchestrator.run(Some(vec![EMPTY_BOTTLE_ID]), today()).await.unwrap();

    let concerts = storage.list_active_concerts().await.unwrap();
    assert_eq!(concerts.len(), 2);
    assert!(concerts.iter().all(|c| c.venue_id.is_none()));
}

#[tokio::test]
async fn default_run_covers_every_active_scraped_venue() {
    let storage = seeded_storage().await;
    let fetcher = Arc::new(StubFetcher::default());
    let orchestrator =
        ScrapeOrchestrator::new(fetcher, storage.clone()).with_settle_delay(Duration::ZERO);

    let summary = orchestrator.run(None, today()).await.unwrap();

    assert_eq!(summary.venues_attempted, get_supported_venue_ids().len());
    assert_eq!(summary.failures.len(), summary.venues_attempted);
}
