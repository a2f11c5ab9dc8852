use crate::apis::base::{first, first_link, require, resolve_url, select_all, text, VenueExtractor};
use crate::common::constants::{
    NO_PRICE_LISTED, SOURCE_TIME_ZONE, SUBTERRANEAN_ID, SUBTERRANEAN_URL, SUBTERRANEAN_VENUE_NAME,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::parse_iso_instant;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};

/// Subterranean, 2011 W North Ave.
///
/// The only venue with a machine-readable start time: an ISO-8601 timestamp in
/// the `title` attribute of `.value-title`. Show links are site-relative.
pub struct SubterraneanExtractor;

impl VenueExtractor for SubterraneanExtractor {
    fn venue_id(&self) -> i64 {
        SUBTERRANEAN_ID
    }

    fn venue_name(&self) -> &'static str {
        SUBTERRANEAN_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        SUBTERRANEAN_URL
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".list-view-item")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        let headliners = text(require(summary, ".list-view-details > .headliners")?);
        match first(summary, ".list-view-details > .supports").map(text) {
            Some(support) if !support.is_empty() => Ok(format!("{} with {}", headliners, support)),
            _ => Ok(headliners),
        }
    }

    fn venue_attribution(&self, _summary: ElementRef<'_>) -> Result<VenueAttribution> {
        Ok(VenueAttribution::host(SUBTERRANEAN_VENUE_NAME))
    }

    fn show_instant(&self, summary: ElementRef<'_>, _today: NaiveDate) -> Result<DateTime<Utc>> {
        let stamp = require(summary, ".value-title")?
            .value()
            .attr("title")
            .ok_or_else(|| ScraperError::MissingField("'.value-title' has no title".to_string()))?;
        parse_iso_instant(stamp, SOURCE_TIME_ZONE)
    }

    fn price(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(first(summary, ".price-range")
            .map(text)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| NO_PRICE_LISTED.to_string()))
    }

    fn detail_url(&self, summary: ElementRef<'_>) -> Result<String> {
        let href = first_link(summary)
            .ok_or_else(|| ScraperError::MissingField("no show link".to_string()))?;
        resolve_url(self.base_url(), &href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::base::extract;

    const PAGE: &str = r#"
        <div class="list-view-item">
          <a href="/event/881-toast-test">Toast Test</a>
          <div class="list-view-details">
            <h1 class="headliners">Toast Test</h1>
            <h2 class="supports">The Toe Jam, Bread Heads</h2>
          </div>
          <span class="value-title" title="2025-10-03T21:00:00-05:00"></span>
          <h3 class="price-range">$10 - $12</h3>
        </div>
        <div class="list-view-item">
          <a href="/event/882-solo">Solo Act</a>
          <div class="list-view-details">
            <h1 class="headliners">Solo Act</h1>
          </div>
          <span class="value-title" title="2025-10-04T20:00:00"></span>
        </div>
    "#;

    #[test]
    fn joins_support_and_reads_iso_times() {
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let result = extract(&SubterraneanExtractor, PAGE, today);
        assert_eq!(result.shows.len(), 2);

        let first = &result.shows[0];
        assert_eq!(first.billing, "Toast Test with The Toe Jam, Bread Heads");
        assert_eq!(first.starts_at.to_rfc3339(), "2025-10-04T02:00:00+00:00");
        assert_eq!(first.price, "$10 - $12");
        assert_eq!(first.detail_url, "http://www.subt.net/event/881-toast-test");

        let second = &result.shows[1];
        assert_eq!(second.billing, "Solo Act");
        assert_eq!(second.price, NO_PRICE_LISTED);
        // no offset: read as Chicago wall time
        assert_eq!(second.starts_at.to_rfc3339(), "2025-10-05T01:00:00+00:00");
    }
}
