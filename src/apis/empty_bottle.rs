use crate::apis::base::{
    first, first_link, join_lines, local_instant, month_day, raw_text, require, resolve_url,
    select_all, text, VenueExtractor,
};
use crate::common::constants::{
    EMPTY_BOTTLE_ID, EMPTY_BOTTLE_URL, EMPTY_BOTTLE_VENUE_NAME, SEE_TICKET_SITE_PRICE,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::{infer_year, parse_clock};
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};

/// The Empty Bottle, 1035 N Western Ave.
///
/// Dates are printed as "Sep 08" without a year. The bottle also lists shows
/// it books at other rooms; those carry a `.show_venue` element.
pub struct EmptyBottleExtractor;

impl VenueExtractor for EmptyBottleExtractor {
    fn venue_id(&self) -> i64 {
        EMPTY_BOTTLE_ID
    }

    fn venue_name(&self) -> &'static str {
        EMPTY_BOTTLE_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        EMPTY_BOTTLE_URL
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".show_summary")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        let block = raw_text(require(summary, ".show_artists")?);
        Ok(join_lines(&block, ", "))
    }

    fn venue_attribution(&self, summary: ElementRef<'_>) -> Result<VenueAttribution> {
        match first(summary, ".show_venue").map(text) {
            Some(name) if !name.is_empty() => Ok(VenueAttribution::elsewhere(name)),
            _ => Ok(VenueAttribution::host(EMPTY_BOTTLE_VENUE_NAME)),
        }
    }

    fn show_instant(&self, summary: ElementRef<'_>, today: NaiveDate) -> Result<DateTime<Utc>> {
        let (month, day) = month_day(&text(require(summary, ".tw-event-date")?))?;
        let clock = parse_clock(&text(require(summary, ".tw-event-time")?))?;
        local_instant(infer_year(month, today), month, day, clock)
    }

    fn price(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(first(summary, ".show_price")
            .map(text)
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| SEE_TICKET_SITE_PRICE.to_string()))
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
        <div class="show_summary">
          <a href="http://emptybottle.com/show/1001">info</a>
          <div class="show_artists">
            Toast Test
            The Toe Jam
          </div>
          <span class="tw-event-date">Sep 08</span>
          <span class="tw-event-time">7:00 PM</span>
          <div class="show_price">$12</div>
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
          <span class="tw-event-time">9:30 PM</span>
        </div>
    "#;

    #[test]
    fn reads_shows_and_skips_broken_fragments() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let result = extract(&EmptyBottleExtractor, PAGE, today);

        assert_eq!(result.shows.len(), 2);
        assert_eq!(result.skipped.len(), 1);

        let first = &result.shows[0];
        assert_eq!(first.billing, "Toast Test, The Toe Jam");
        assert_eq!(first.venue, VenueAttribution::host("The Empty Bottle"));
        assert_eq!(first.starts_at.to_rfc3339(), "2025-09-09T00:00:00+00:00");
        assert_eq!(first.price, "$12");
        assert_eq!(first.detail_url, "http://emptybottle.com/show/1001");
        assert_eq!(first.schedule_url, EMPTY_BOTTLE_URL);

        let second = &result.shows[1];
        assert_eq!(second.venue, VenueAttribution::elsewhere("Thalia Hall"));
        assert_eq!(second.price, SEE_TICKET_SITE_PRICE);
        assert_eq!(second.detail_url, "http://emptybottle.com/show/1002");
        assert_eq!(second.starts_at.to_rfc3339(), "2025-10-04T02:30:00+00:00");
    }

    #[test]
    fn empty_page_is_not_an_error() {
        let today = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        let result = extract(&EmptyBottleExtractor, "<html><body></body></html>", today);
        assert!(result.shows.is_empty());
        assert!(result.skipped.is_empty());
    }
}
