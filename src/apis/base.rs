use crate::common::constants::SOURCE_TIME_ZONE;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{ShowRecord, VenueAttribution};
use crate::datetime::{month_number, normalize, ClockTime};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info, warn};

/// How a venue spreads its schedule across pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Everything is on the schedule page
    Single,
    /// One page per month starting with the current month. Pages are fetched
    /// in order with a settle delay between them; when `filter` is set only
    /// fragments matching it are kept from each page.
    Monthly {
        pages: u32,
        filter: Option<&'static str>,
    },
}

/// Trait for venue-specific extraction logic.
///
/// Each venue prints its schedule differently; an implementation knows how to
/// find the repeating unit for one show ("summary") and how to read each
/// field out of it. Required fields fail with [`ScraperError::MissingField`],
/// optional ones fall back to an empty or sentinel value.
pub trait VenueExtractor: Send + Sync {
    /// Stable venue id used as the registry key
    fn venue_id(&self) -> i64;

    fn venue_name(&self) -> &'static str;

    fn schedule_url(&self) -> &'static str;

    /// Base for resolving venue-relative detail links
    fn base_url(&self) -> &'static str {
        self.schedule_url()
    }

    fn pagination(&self) -> Pagination {
        Pagination::Single
    }

    /// The repeating elements that each describe one show, in page order.
    fn summaries<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    fn billing(&self, summary: ElementRef<'_>) -> Result<String>;

    fn venue_attribution(&self, summary: ElementRef<'_>) -> Result<VenueAttribution>;

    /// Start of the show. `today` anchors year inference for dates printed without a year.
    fn show_instant(&self, summary: ElementRef<'_>, today: NaiveDate) -> Result<DateTime<Utc>>;

    fn price(&self, summary: ElementRef<'_>) -> Result<String>;

    fn detail_url(&self, summary: ElementRef<'_>) -> Result<String>;
}

/// Shows read from one schedule document plus the fragments that were dropped.
#[derive(Debug, Default)]
pub struct Extraction {
    pub shows: Vec<ShowRecord>,
    pub skipped: Vec<ScraperError>,
}

/// Runs an extractor over a schedule document.
///
/// A failure in one fragment skips that show only; the rest of the page is
/// still read. An empty page yields an empty result.
pub fn extract(extractor: &dyn VenueExtractor, html: &str, today: NaiveDate) -> Extraction {
    let document = Html::parse_document(html);
    let summaries = extractor.summaries(&document);
    debug!(
        "Found {} show summaries for {}",
        summaries.len(),
        extractor.venue_name()
    );

    let mut extraction = Extraction::default();
    for (index, summary) in summaries.into_iter().enumerate() {
        match read_show(extractor, summary, today) {
            Ok(show) => {
                debug!("Read show: {} @ {}", show.billing, show.starts_at);
                extraction.shows.push(show);
            }
            Err(err) => {
                let err = err.in_show(extractor.venue_name(), index);
                if err.is_invalid_date() {
                    error!(venue = extractor.venue_name(), index, "Extractor produced an invalid date: {}", err);
                } else {
                    warn!("Skipping show: {}", err);
                }
                extraction.skipped.push(err);
            }
        }
    }

    info!(
        "Extracted {} shows from {} ({} skipped)",
        extraction.shows.len(),
        extractor.venue_name(),
        extraction.skipped.len()
    );
    extraction
}

fn read_show(
    extractor: &dyn VenueExtractor,
    summary: ElementRef<'_>,
    today: NaiveDate,
) -> Result<ShowRecord> {
    Ok(ShowRecord {
        billing: extractor.billing(summary)?,
        venue: extractor.venue_attribution(summary)?,
        starts_at: extractor.show_instant(summary, today)?,
        price: extractor.price(summary)?,
        detail_url: extractor.detail_url(summary)?,
        schedule_url: extractor.schedule_url().to_string(),
    })
}

/// Keeps only the elements matching `css`, re-serialized one per line.
pub fn filter_fragments(html: &str, css: &str) -> String {
    let document = Html::parse_document(html);
    let selector = selector(css);
    document
        .select(&selector)
        .map(|el| el.html())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    document.select(&selector(css)).collect()
}

pub(crate) fn first<'a>(el: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    el.select(&selector(css)).next()
}

pub(crate) fn require<'a>(el: ElementRef<'a>, css: &str) -> Result<ElementRef<'a>> {
    first(el, css).ok_or_else(|| ScraperError::MissingField(format!("no '{}' element", css)))
}

/// Text content of an element, untrimmed
pub(crate) fn raw_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Text content with whitespace runs collapsed to single spaces
pub(crate) fn text(el: ElementRef<'_>) -> String {
    squish(&raw_text(el))
}

pub(crate) fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Joins the non-empty lines of a run-on block with `separator`.
pub(crate) fn join_lines(text: &str, separator: &str) -> String {
    text.lines()
        .map(squish)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

pub(crate) fn first_link(el: ElementRef<'_>) -> Option<String> {
    first(el, "a[href]").and_then(|a| a.value().attr("href").map(|href| href.trim().to_string()))
}

/// Month and day from text like "Sep 08", "Sep 8," or "Saturday, November 5".
pub(crate) fn month_day(text: &str) -> Result<(u32, u32)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let unreadable = || ScraperError::MissingField(format!("unreadable date {:?}", text.trim()));

    let pos = tokens
        .iter()
        .position(|t| month_number(t).is_some())
        .ok_or_else(unreadable)?;
    let month = month_number(tokens[pos]).ok_or_else(unreadable)?;
    let day = tokens
        .get(pos + 1)
        .map(|t| t.trim_end_matches([',', '.']))
        .and_then(|t| t.parse::<u32>().ok())
        .ok_or_else(unreadable)?;
    Ok((month, day))
}

/// Start instant in the venues' time zone
pub(crate) fn local_instant(
    year: i32,
    month: u32,
    day: u32,
    clock: ClockTime,
) -> Result<DateTime<Utc>> {
    normalize(year, month, day, clock.hour, clock.minute, SOURCE_TIME_ZONE)
}

/// Resolves a possibly venue-relative link against the venue's base URL.
pub fn resolve_url(base: &str, href: &str) -> Result<String> {
    let href = href.trim();
    if let Ok(absolute) = Url::parse(href) {
        return Ok(absolute.to_string());
    }
    let base = Url::parse(base)
        .map_err(|e| ScraperError::MissingField(format!("bad base url {base:?}: {e}")))?;
    base.join(href)
        .map(|url| url.to_string())
        .map_err(|e| ScraperError::MissingField(format!("bad link {href:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links() {
        assert_eq!(
            resolve_url("http://www.subt.net", "/event/1234-band").unwrap(),
            "http://www.subt.net/event/1234-band"
        );
        assert_eq!(
            resolve_url("http://www.lh-st.com", "").unwrap(),
            "http://www.lh-st.com/"
        );
        assert_eq!(
            resolve_url("http://www.subt.net", "https://tix.example.com/e/9").unwrap(),
            "https://tix.example.com/e/9"
        );
    }

    #[test]
    fn month_and_day_from_loose_text() {
        assert_eq!(month_day("Sep 08").unwrap(), (9, 8));
        assert_eq!(month_day(" Oct 3,\n").unwrap(), (10, 3));
        assert_eq!(month_day("Saturday, November 5").unwrap(), (11, 5));
        assert!(month_day("TBA").is_err());
        assert!(month_day("Sep").is_err());
    }

    #[test]
    fn run_on_blocks_become_one_line() {
        let block = "\n   Band One \n\n  Band   Two\nBand Three  \n";
        assert_eq!(join_lines(block, ", "), "Band One, Band Two, Band Three");
        assert_eq!(squish("  a \n b\t c "), "a b c");
    }

    #[test]
    fn filter_keeps_matching_fragments_only() {
        let html = r#"<div class="showItem LincolnHall">one</div>
            <div class="showItem Schubas">two</div>
            <div class="showItem LincolnHall">three</div>"#;
        let kept = filter_fragments(html, ".LincolnHall");
        assert!(kept.contains("one"));
        assert!(kept.contains("three"));
        assert!(!kept.contains("two"));
    }
}
