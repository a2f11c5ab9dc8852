use crate::apis::base::{
    first_link, local_instant, raw_text, require, resolve_url, select_all, selector, squish,
    text, VenueExtractor,
};
use crate::common::constants::{
    BOTTOM_LOUNGE_ID, BOTTOM_LOUNGE_URL, BOTTOM_LOUNGE_VENUE_NAME, SEE_TICKET_SITE_PRICE,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::parse_clock;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};

/// Bottom Lounge, 1375 W Lake St.
///
/// `.schedule-date` holds two spans: "09/08/2025" and
/// "Doors 6:00 PM    Show 6:30 PM". Prices only live on the ticketing site.
pub struct BottomLoungeExtractor;

impl BottomLoungeExtractor {
    /// Text after the last "Show" label, or the whole listing when unlabelled.
    fn show_time_text(times: &str) -> &str {
        match times.to_ascii_lowercase().rfind("show") {
            Some(idx) => times[idx + "show".len()..].trim_start_matches([':', ' ']),
            None => times,
        }
    }

    fn slash_date(text: &str) -> Result<(i32, u32, u32)> {
        let unreadable = || ScraperError::MissingField(format!("unreadable date {:?}", text));
        let parts: Vec<&str> = text.trim().split('/').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(unreadable());
        }
        let month = parts[0].parse().map_err(|_| unreadable())?;
        let day = parts[1].parse().map_err(|_| unreadable())?;
        let year = parts[2].parse().map_err(|_| unreadable())?;
        Ok((year, month, day))
    }
}

impl VenueExtractor for BottomLoungeExtractor {
    fn venue_id(&self) -> i64 {
        BOTTOM_LOUNGE_ID
    }

    fn venue_name(&self) -> &'static str {
        BOTTOM_LOUNGE_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        BOTTOM_LOUNGE_URL
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".schedule-item-content")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(text(require(summary, ".schedule-title")?))
    }

    fn venue_attribution(&self, _summary: ElementRef<'_>) -> Result<VenueAttribution> {
        // in-house shows only
        Ok(VenueAttribution::host(BOTTOM_LOUNGE_VENUE_NAME))
    }

    fn show_instant(&self, summary: ElementRef<'_>, _today: NaiveDate) -> Result<DateTime<Utc>> {
        let date_box = require(summary, ".schedule-date")?;
        let spans: Vec<_> = date_box.select(&selector("span")).collect();
        if spans.len() < 2 {
            return Err(ScraperError::MissingField(
                "'.schedule-date' needs a date span and a time span".to_string(),
            ));
        }

        let (year, month, day) = Self::slash_date(&text(spans[0]))?;
        let times = squish(&raw_text(spans[1]));
        let clock = parse_clock(Self::show_time_text(&times))?;
        local_instant(year, month, day, clock)
    }

    fn price(&self, _summary: ElementRef<'_>) -> Result<String> {
        Ok(SEE_TICKET_SITE_PRICE.to_string())
    }

    fn detail_url(&self, summary: ElementRef<'_>) -> Result<String> {
        let href = first_link(summary)
            .ok_or_else(|| ScraperError::MissingField("no show link".to_string()))?;
        resolve_url(self.base_url(), &href)
    }
}
