use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which venue a scraped show belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueAttribution {
    pub name: String,
    /// False when the scraped venue only promotes the show at another location.
    pub is_host: bool,
}

impl VenueAttribution {
    pub fn host(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_host: true,
        }
    }

    pub fn elsewhere(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_host: false,
        }
    }
}

/// One show as read off a venue schedule page. Never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub billing: String,
    pub venue: VenueAttribution,
    pub starts_at: DateTime<Utc>,
    pub price: String,
    pub detail_url: String,
    pub schedule_url: String,
}

/// A tracked artist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: Option<i64>,
    pub name: String,
    /// Match pattern built from `name` at creation time
    pub pattern: String,
    pub external_id: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Artist {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>, external_id: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            pattern: pattern.into(),
            external_id,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A venue in the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub schedule_url: String,
    pub is_active: bool,
}

/// A scraped show persisted for matching and display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concert {
    pub id: Option<i64>,
    pub billing: String,
    /// Tracked artists found in the billing, filled in by the match engine
    pub artist_ids: BTreeSet<i64>,
    /// None when the show is not tied to a known venue row
    pub venue_id: Option<i64>,
    pub starts_at: DateTime<Utc>,
    pub price: String,
    pub url: String,
    pub scraped_at: DateTime<Utc>,
    pub is_active: bool,
}

impl Concert {
    pub fn from_show(show: &ShowRecord, venue_id: Option<i64>, scraped_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            billing: show.billing.clone(),
            artist_ids: BTreeSet::new(),
            venue_id,
            starts_at: show.starts_at,
            price: show.price.clone(),
            url: show.detail_url.clone(),
            scraped_at,
            is_active: true,
        }
    }
}

/// Tracked artists found in one concert's billing. At most one per concert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchGroup {
    pub id: i64,
    pub concert_id: i64,
    pub artist_ids: BTreeSet<i64>,
}

/// Result of recording one (concert, artist) hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub group_id: i64,
    pub group_created: bool,
    /// False when the artist was already associated with the concert
    pub newly_associated: bool,
}
