use crate::apis::base::{
    first, first_link, local_instant, month_day, require, resolve_url, select_all, selector, text,
    VenueExtractor,
};
use crate::common::constants::{METRO_ID, METRO_URL, METRO_VENUE_NAME, SEE_TICKET_SITE_PRICE};
use crate::common::error::{Result, ScraperError};
use crate::common::types::VenueAttribution;
use crate::datetime::{infer_year, is_labelled_time, parse_clock, select_show_time};
use chrono::{DateTime, NaiveDate, Utc};
use scraper::{ElementRef, Html};
use tracing::warn;

/// Metro, 3730 N. Clark St.
///
/// `.showinfo` reads "<tickets> // <times> // <ages>". Support acts are
/// nested `h3`s in the source, which the parser flattens into siblings of
/// the headliner.
pub struct MetroExtractor;

/// The pieces of a `.showinfo` line
#[derive(Debug, PartialEq, Eq)]
struct ShowInfo {
    price: String,
    times: String,
    /// The line used single slashes
    degraded: bool,
}

impl ShowInfo {
    fn parse(info: &str) -> Self {
        let parts: Vec<&str> = info.split("//").collect();
        if parts.len() > 1 {
            return Self {
                price: parts[0].trim().to_string(),
                times: parts[1].trim().to_string(),
                degraded: false,
            };
        }

        // Ticket info is first; times may be "Doors X / Show Y", so rejoin
        // the next segment only when it is a time itself and not the age label.
        let parts: Vec<&str> = info.split('/').map(str::trim).collect();
        let mut times: Vec<&str> = parts.get(1).copied().into_iter().collect();
        if let Some(next) = parts.get(2).copied().filter(|next| is_labelled_time(next)) {
            times.push(next);
        }
        Self {
            price: parts[0].to_string(),
            times: times.join(" / "),
            degraded: true,
        }
    }
}

impl VenueExtractor for MetroExtractor {
    fn venue_id(&self) -> i64 {
        METRO_ID
    }

    fn venue_name(&self) -> &'static str {
        METRO_VENUE_NAME
    }

    fn schedule_url(&self) -> &'static str {
        METRO_URL
    }

    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        select_all(document, ".showContainer")
    }

    fn billing(&self, summary: ElementRef<'_>) -> Result<String> {
        let headliner = text(require(summary, ".headliner")?);
        let support: Vec<String> = summary
            .select(&selector("h3:not(.headliner)"))
            .map(text)
            .filter(|name| !name.is_empty())
            .collect();

        if support.is_empty() {
            Ok(headliner)
        } else {
            Ok(format!("{} with {}", headliner, support.join(", ")))
        }
    }

    fn venue_attribution(&self, summary: ElementRef<'_>) -> Result<VenueAttribution> {
        let Some(label) = first(summary, ".picCTA").map(text).filter(|l| !l.is_empty()) else {
            return Ok(VenueAttribution::host(METRO_VENUE_NAME));
        };
        // sometimes "at Smart Bar", sometimes just "Smart Bar"
        let name = match label.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("at ") => label[3..].trim().to_string(),
            _ => label,
        };
        Ok(VenueAttribution::elsewhere(name))
    }

    fn show_instant(&self, summary: ElementRef<'_>, today: NaiveDate) -> Result<DateTime<Utc>> {
        let (month, day) = month_day(&text(require(summary, ".date")?))?;

        let info = ShowInfo::parse(&text(require(summary, ".showinfo")?));
        if info.degraded {
            warn!("Metro show info without '//' separators, splitting on '/': {:?}", info.times);
        }
        if info.times.is_empty() {
            return Err(ScraperError::MissingField("no times in '.showinfo'".to_string()));
        }

        let clock = parse_clock(select_show_time(&info.times))?;
        local_instant(infer_year(month, today), month, day, clock)
    }

    fn price(&self, summary: ElementRef<'_>) -> Result<String> {
        let price = first(summary, ".showinfo")
            .map(|el| ShowInfo::parse(&text(el)).price)
            .unwrap_or_default();
        if price.is_empty() {
            Ok(SEE_TICKET_SITE_PRICE.to_string())
        } else {
            Ok(price)
        }
    }

    fn detail_url(&self, summary: ElementRef<'_>) -> Result<String> {
        let href = first_link(summary)
            .ok_or_else(|| ScraperError::MissingField("no show link".to_string()))?;
        resolve_url(self.base_url(), &href)
    }
}
