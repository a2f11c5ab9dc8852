use crate::apis::base::{
    first, first_link, local_instant, require, resolve_url, select_all, text, VenueExtractor,
};
use crate::common::constants::{
    DOUBLE_DOOR_ID, DOUBLE_DOOR_URL, DOUBLE_DOOR_VENUE_NAME, SEE_TICKET_SITE_PRICE,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::{infer_year, month_number, parse_clock};
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};

/// Double Door, 1551 N. Damen Ave.
///
/// Rhino-themed listing. Headliner and support sit in separate headers and
/// are joined with a single space; the support line carries its own "with".
/// The site refuses clients that do not send a browser user agent.
pub struct DoubleDoorExtractor;

impl VenueExtractor for DoubleDoorExtractor {
    fn venue_id(&self) -> i64 {
        DOUBLE_DOOR_ID
    }

    fn venue_name(&self) -> &'static str {
        DOUBLE_DOOR_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        DOUBLE_DOOR_URL
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".rhino-event-wrapper")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        let headliner = text(require(summary, ".rhino-event-header")?);
        let support = first(summary, ".rhino-event-subheader")
            .map(text)
            .unwrap_or_default();
        Ok(format!("{} {}", headliner, support).trim().to_string())
    }

    fn venue_attribution(&self, _summary: ElementRef<'_>) -> Result<VenueAttribution> {
        Ok(VenueAttribution::host(DOUBLE_DOOR_VENUE_NAME))
    }

    fn show_instant(&self, summary: ElementRef<'_>, today: NaiveDate) -> Result<DateTime<Utc>> {
        let month_text = text(require(summary, ".rhino-event-datebox-month")?);
        let month = month_number(&month_text).ok_or_else(|| {
            ScraperError::MissingField(format!("unknown month {:?}", month_text))
        })?;
        let day_text = text(require(summary, ".rhino-event-datebox-date")?);
        let day: u32 = day_text
            .parse()
            .map_err(|_| ScraperError::MissingField(format!("unreadable day {:?}", day_text)))?;
        let clock = parse_clock(&text(require(summary, ".rhino-event-time")?))?;

        local_instant(infer_year(month, today), month, day, clock)
    }

    fn price(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(first(summary, ".rhino-event-price")
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
