//! Lincoln Hall and Schubas Tavern share one schedule site. Each month page
//! lists both rooms; the venue class on every `.showItem` tells them apart.

use crate::apis::base::{
    first, first_link, join_lines, local_instant, raw_text, require, resolve_url, select_all,
    text, Pagination, VenueExtractor,
};
use crate::common::constants::{
    LH_ST_URL, LINCOLN_HALL_ID, LINCOLN_HALL_VENUE_NAME, SCHUBAS_ID, SCHUBAS_VENUE_NAME,
    SEE_TICKET_SITE_PRICE,
};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::{month_number, parse_clock};
use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static MERIDIEM_TIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b\d{1,2}(?::\d{2})?\s*([ap])\.?m\b").expect("meridiem time regex")
});

pub struct LhStExtractor {
    id: i64,
    name: &'static str,
    /// Class marking this room's shows on the shared pages
    filter: &'static str,
}

impl LhStExtractor {
    pub fn lincoln_hall() -> Self {
        Self {
            id: LINCOLN_HALL_ID,
            name: LINCOLN_HALL_VENUE_NAME,
            filter: ".LincolnHall",
        }
    }

    pub fn schubas() -> Self {
        Self {
            id: SCHUBAS_ID,
            name: SCHUBAS_VENUE_NAME,
            filter: ".Schubas",
        }
    }

    /// `.header` runs the title into the date; the last three tokens are "Sep 08 2025".
    fn header_date(header: &str) -> Result<(i32, u32, u32)> {
        let unreadable = || ScraperError::MissingField(format!("unreadable header date {:?}", header));
        let tokens: Vec<&str> = header.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(unreadable());
        }
        let tail = &tokens[tokens.len() - 3..];

        // the title can be glued to the month ("Toast TestSep"), so read the month from its end
        let month_token = tail[0];
        let month = month_number(month_token)
            .or_else(|| {
                month_token
                    .char_indices()
                    .rev()
                    .nth(2)
                    .and_then(|(idx, _)| month_number(&month_token[idx..]))
            })
            .ok_or_else(unreadable)?;
        let day = tail[1].trim_end_matches(',').parse().map_err(|_| unreadable())?;
        let year = tail[2].parse().map_err(|_| unreadable())?;
        Ok((year, month, day))
    }

    /// First time carrying AM/PM, preferring PM: ticket blurbs mention
    /// on-sale times and prices before the show time.
    fn show_time(info: &str) -> Option<&str> {
        let mut am = None;
        for caps in MERIDIEM_TIME_RE.captures_iter(info) {
            let (Some(whole), Some(meridiem)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if meridiem.as_str().eq_ignore_ascii_case("p") {
                return Some(whole.as_str());
            }
            am.get_or_insert(whole.as_str());
        }
        am
    }
}

impl VenueExtractor for LhStExtractor {
    fn venue_id(&self) -> i64 {
        self.id
    }

    fn venue_name(&self) -> &'static str {
        self.name
    }

    fn schedule_url(&self) -> &'static str {
        LH_ST_URL
    }

    fn pagination(&self) -> Pagination {
        Pagination::Monthly {
            pages: 3,
            filter: Some(self.filter),
        }
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".showItem")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(join_lines(&raw_text(require(summary, ".bands")?), ", "))
    }

    fn venue_attribution(&self, _summary: ElementRef<'_>) -> Result<VenueAttribution> {
        Ok(VenueAttribution::host(self.name))
    }

    fn show_instant(&self, summary: ElementRef<'_>, _today: NaiveDate) -> Result<DateTime<Utc>> {
        let (year, month, day) = Self::header_date(&text(require(summary, ".header")?))?;
        let info = text(require(summary, ".ticketInfo")?);
        let time = Self::show_time(&info)
            .ok_or_else(|| ScraperError::MissingField(format!("no AM/PM time in {:?}", info)))?;
        local_instant(year, month, day, parse_clock(time)?)
    }

    fn price(&self, summary: ElementRef<'_>) -> Result<String> {
        Ok(first(summary, ".avail")
            .map(text)
            .and_then(|avail| avail.split_whitespace().next().map(str::to_string))
            .unwrap_or_else(|| SEE_TICKET_SITE_PRICE.to_string()))
    }

    /// Sold-out shows have no ticket link; those point at the site root.
    fn detail_url(&self, summary: ElementRef<'_>) -> Result<String> {
        let buttons = require(summary, ".buttons")?;
        let href = first_link(buttons).unwrap_or_default();
        resolve_url(self.base_url(), &href)
    }
}
