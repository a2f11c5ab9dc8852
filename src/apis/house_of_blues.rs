use crate::apis::base::{
    first_link, local_instant, month_day, require, resolve_url, select_all, selector, text,
    Pagination, VenueExtractor,
};
use crate::common::constants::{
    CHECK_TICKET_SITE_PRICE, HOUSE_OF_BLUES_ID, HOUSE_OF_BLUES_URL, HOUSE_OF_BLUES_VENUE_NAME,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::{infer_year, parse_clock};
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};

/// Headline concerts carry exactly these two buttons; anything else on the
/// calendar (restaurant events, gospel brunch) is dropped.
const CONCERT_BUTTONS: &str = "Find Tickets Now Event Details";

/// House of Blues Chicago, 329 N Dearborn St.
///
/// The calendar shows one month at a time.
pub struct HouseOfBluesExtractor;

impl VenueExtractor for HouseOfBluesExtractor {
    fn venue_id(&self) -> i64 {
        HOUSE_OF_BLUES_ID
    }

    fn venue_name(&self) -> &'static str {
        HOUSE_OF_BLUES_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        HOUSE_OF_BLUES_URL
    }

    fn pagination(&self) -> Pagination {
        Pagination::Monthly {
            pages: 3,
            filter: None,
        }
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let buttons = selector(".c-calendar-list__venue");
        select_all(document, ".c-calendar-list__item")
            .into_iter()
            .filter(|item| {
                item.select(&buttons)
                    .next()
                    .map(|el| text(el) == CONCERT_BUTTONS)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(text(require(summary, ".c-calendar-list__title")?))
    }

    fn venue_attribution(&self, _summary: ElementRef<'_>) -> Result<VenueAttribution> {
        Ok(VenueAttribution::host(HOUSE_OF_BLUES_VENUE_NAME))
    }

    fn show_instant(&self, summary: ElementRef<'_>, today: NaiveDate) -> Result<DateTime<Utc>> {
        let (month, day) = month_day(&text(require(summary, ".c-calendar-list__date-date")?))?;
        let clock = parse_clock(&text(require(summary, ".c-calendar-list__date-time")?))?;
        local_instant(infer_year(month, today), month, day, clock)
    }

    fn price(&self, _summary: ElementRef<'_>) -> Result<String> {
        Ok(CHECK_TICKET_SITE_PRICE.to_string())
    }

    /// The second `.btn-parent` is "Event Details".
    fn detail_url(&self, summary: ElementRef<'_>) -> Result<String> {
        let details = summary
            .select(&selector(".btn-parent"))
            .nth(1)
            .ok_or_else(|| ScraperError::MissingField("no event details button".to_string()))?;
        let href = first_link(details)
            .ok_or_else(|| ScraperError::MissingField("event details button has no link".to_string()))?;
        resolve_url(self.base_url(), &href)
    }
}
