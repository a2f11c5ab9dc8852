use crate::apis::base::{
    first, first_link, local_instant, month_day, require, resolve_url, select_all, text,
    VenueExtractor,
};
use crate::common::constants::{
    SEE_TICKET_SITE_PRICE, THALIA_HALL_ID, THALIA_HALL_URL, THALIA_HALL_VENUE_NAME,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::parse_clock;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};

/// Thalia Hall, 1807 S. Allport St.
///
/// Dates carry an explicit year ("September 8, 2025").
pub struct ThaliaHallExtractor;

impl ThaliaHallExtractor {
    fn dated(text: &str) -> Result<(i32, u32, u32)> {
        let (month, day) = month_day(text)?;
        let year = text
            .split_whitespace()
            .last()
            .filter(|t| t.len() == 4)
            .and_then(|t| t.parse::<i32>().ok())
            .ok_or_else(|| ScraperError::MissingField(format!("no year in {:?}", text)))?;
        Ok((year, month, day))
    }
}

impl VenueExtractor for ThaliaHallExtractor {
    fn venue_id(&self) -> i64 {
        THALIA_HALL_ID
    }

    fn venue_name(&self) -> &'static str {
        THALIA_HALL_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        THALIA_HALL_URL
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".event-list-item-inner")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(text(require(summary, ".tw-event-name")?))
    }

    fn venue_attribution(&self, _summary: ElementRef<'_>) -> Result<VenueAttribution> {
        // outside shows are only marked with an image
        Ok(VenueAttribution::host(THALIA_HALL_VENUE_NAME))
    }

    fn show_instant(&self, summary: ElementRef<'_>, _today: NaiveDate) -> Result<DateTime<Utc>> {
        let (year, month, day) = Self::dated(&text(require(summary, ".tw-event-date")?))?;
        let clock = parse_clock(&text(require(summary, ".tw-event-time")?))?;
        local_instant(year, month, day, clock)
    }

    fn price(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(first(summary, ".tw-event-price")
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
