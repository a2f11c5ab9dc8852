use crate::apis::base::{extract, filter_fragments, Pagination, VenueExtractor};
use crate::apis::factory::create_extractor;
use crate::common::constants::MISC_VENUE_ID;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Concert, ShowRecord};
use crate::observability::metrics as sift_metrics;
use crate::pipeline::fetch::PageFetcher;
use crate::storage::Storage;
use chrono::{Datelike, NaiveDate, Utc};
use reqwest::Url;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

/// Shows read for one venue
#[derive(Debug, Default)]
pub struct VenueScrape {
    pub shows: Vec<ShowRecord>,
    /// Fragments dropped because a required field could not be read
    pub skipped: usize,
    /// True when the venue was already scraped by this orchestrator and nothing was fetched
    pub already_loaded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueFailure {
    pub venue_id: i64,
    pub venue_name: String,
    pub error: String,
}

/// Result of one scrape run over several venues
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeSummary {
    pub run_id: Uuid,
    pub venues_attempted: usize,
    pub venues_scraped: usize,
    pub shows_found: usize,
    pub shows_skipped: usize,
    pub concerts_created: usize,
    pub failures: Vec<VenueFailure>,
}

impl ScrapeSummary {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            venues_attempted: 0,
            venues_scraped: 0,
            shows_found: 0,
            shows_skipped: 0,
            concerts_created: 0,
            failures: Vec::new(),
        }
    }
}

/// Fetches venue schedules, extracts shows and stores them as concerts.
///
/// Venues are scraped one after another. A venue whose page cannot be fetched
/// is reported in the summary and the run moves on to the next one. Each venue
/// is scraped at most once per orchestrator; later requests are no-ops.
pub struct ScrapeOrchestrator {
    fetcher: Arc<dyn PageFetcher>,
    storage: Arc<dyn Storage>,
    settle_delay: Duration,
    loaded: Mutex<HashSet<i64>>,
}

impl ScrapeOrchestrator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, storage: Arc<dyn Storage>) -> Self {
        Self {
            fetcher,
            storage,
            settle_delay: Duration::from_secs(3),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Pause between page transitions for venues with paginated schedules
    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    fn is_loaded(&self, venue_id: i64) -> bool {
        self.loaded
            .lock()
            .map(|loaded| loaded.contains(&venue_id))
            .unwrap_or(false)
    }

    fn mark_loaded(&self, venue_id: i64) {
        if let Ok(mut loaded) = self.loaded.lock() {
            loaded.insert(venue_id);
        }
    }

    /// Fetches and extracts one venue's schedule. Nothing is stored.
    ///
    /// A venue counts as loaded only once [`run`](Self::run) has stored at
    /// least one of its concerts.
    pub async fn scrape(&self, extractor: &dyn VenueExtractor, today: NaiveDate) -> Result<VenueScrape> {
        if self.is_loaded(extractor.venue_id()) {
            info!("{} already loaded, skipping", extractor.venue_name());
            return Ok(VenueScrape {
                already_loaded: true,
                ..Default::default()
            });
        }

        let html = self.fetch_schedule(extractor, today).await?;
        let extraction = extract(extractor, &html, today);

        Ok(VenueScrape {
            shows: extraction.shows,
            skipped: extraction.skipped.len(),
            already_loaded: false,
        })
    }

    async fn fetch_schedule(&self, extractor: &dyn VenueExtractor, today: NaiveDate) -> Result<String> {
        match extractor.pagination() {
            Pagination::Single => self.fetcher.fetch(extractor.schedule_url()).await,
            Pagination::Monthly { pages, filter } => {
                let mut bodies = Vec::new();
                for (i, url) in month_page_urls(extractor.schedule_url(), today, pages)?
                    .iter()
                    .enumerate()
                {
                    if i > 0 {
                        tokio::time::sleep(self.settle_delay).await;
                    }
                    let body = self.fetcher.fetch(url).await?;
                    debug!("Page {} of {} for {}", i + 1, pages, extractor.venue_name());
                    bodies.push(match filter {
                        Some(css) => filter_fragments(&body, css),
                        None => body,
                    });
                }
                Ok(bodies.join("\n"))
            }
        }
    }

    /// Scrapes the given venues, or every active venue in storage with a
    /// registered extractor, and stores each show as a concert.
    #[instrument(skip(self))]
    pub async fn run(&self, venue_ids: Option<Vec<i64>>, today: NaiveDate) -> Result<ScrapeSummary> {
        let ids: Vec<i64> = match venue_ids {
            Some(ids) => ids,
            None => self
                .storage
                .list_venues()
                .await?
                .into_iter()
                .filter(|v| v.is_active && create_extractor(v.id).is_some())
                .map(|v| v.id)
                .collect(),
        };

        let mut summary = ScrapeSummary::new();
        info!("Scrape run {} over {} venues", summary.run_id, ids.len());

        for venue_id in ids {
            summary.venues_attempted += 1;
            let Some(extractor) = create_extractor(venue_id) else {
                warn!("No extractor registered for venue {}", venue_id);
                summary.failures.push(VenueFailure {
                    venue_id,
                    venue_name: String::new(),
                    error: format!("no extractor for venue {venue_id}"),
                });
                continue;
            };

            let span = info_span!("venue", venue = extractor.venue_name());
            match self.run_venue(extractor.as_ref(), today).instrument(span).await {
                Ok((scrape, created)) => {
                    if !scrape.already_loaded {
                        summary.venues_scraped += 1;
                    }
                    summary.shows_found += scrape.shows.len();
                    summary.shows_skipped += scrape.skipped;
                    summary.concerts_created += created;
                }
                Err(e) => {
                    error!("Scrape of {} failed: {}", extractor.venue_name(), e);
                    sift_metrics::venue_failure(extractor.venue_name());
                    summary.failures.push(VenueFailure {
                        venue_id,
                        venue_name: extractor.venue_name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Scrape run {} done: {} shows, {} concerts created, {} venues failed",
            summary.run_id,
            summary.shows_found,
            summary.concerts_created,
            summary.failures.len()
        );
        Ok(summary)
    }

    async fn run_venue(&self, extractor: &dyn VenueExtractor, today: NaiveDate) -> Result<(VenueScrape, usize)> {
        let scrape = self.scrape(extractor, today).await?;
        if scrape.already_loaded {
            return Ok((scrape, 0));
        }
        sift_metrics::shows_scraped(extractor.venue_name(), scrape.shows.len());
        sift_metrics::shows_skipped(extractor.venue_name(), scrape.skipped);

        let host_id = self.known_venue(extractor.venue_id()).await?;
        let misc_id = self.known_venue(MISC_VENUE_ID).await?;
        let scraped_at = Utc::now();

        let mut created = 0;
        for show in &scrape.shows {
            let venue_id = if show.venue.is_host { host_id } else { misc_id };
            let mut concert = Concert::from_show(show, venue_id, scraped_at);
            match self.storage.create_concert(&mut concert).await {
                Ok(()) => created += 1,
                Err(e) => warn!("Could not store {}: {}", show.billing, e),
            }
        }
        if created > 0 {
            self.mark_loaded(extractor.venue_id());
        }
        Ok((scrape, created))
    }

    /// `Some(id)` when a venue row with that id exists
    async fn known_venue(&self, venue_id: i64) -> Result<Option<i64>> {
        Ok(self.storage.get_venue(venue_id).await?.map(|v| v.id))
    }
}

/// Schedule URLs for `pages` consecutive months starting with the month of `today`.
pub fn month_page_urls(schedule_url: &str, today: NaiveDate, pages: u32) -> Result<Vec<String>> {
    let base = Url::parse(schedule_url).map_err(|e| ScraperError::Network {
        url: schedule_url.to_string(),
        message: format!("bad schedule url: {e}"),
    })?;

    Ok((0..pages)
        .map(|offset| {
            let months = today.month0() + offset;
            let year = today.year() + (months / 12) as i32;
            let month = months % 12 + 1;

            let mut url = base.clone();
            url.query_pairs_mut()
                .append_pair("month", &format!("{year:04}-{month:02}"));
            url.to_string()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_pages_roll_into_next_year() {
        let today = NaiveDate::from_ymd_opt(2025, 11, 20).unwrap();
        let urls = month_page_urls("https://www.lh-st.com/", today, 3).unwrap();
        assert_eq!(
            urls,
            vec![
                "https://www.lh-st.com/?month=2025-11",
                "https://www.lh-st.com/?month=2025-12",
                "https://www.lh-st.com/?month=2026-01",
            ]
        );
    }

    #[test]
    fn month_pages_keep_existing_query() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let urls = month_page_urls("https://example.com/events?view=list", today, 1).unwrap();
        assert_eq!(urls, vec!["https://example.com/events?view=list&month=2025-03"]);
    }
}
