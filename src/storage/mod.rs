use crate::common::error::Result;
use crate::common::types::{Artist, Concert, MatchGroup, MatchOutcome, Venue};
use async_trait::async_trait;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStorage;
pub use sqlite::SqliteStorage;

/// Key under which artist names are unique: full Unicode lowercase
pub fn artist_name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Storage trait for venues, tracked artists, scraped concerts and matches
#[async_trait]
pub trait Storage: Send + Sync {
    // Venue operations
    async fn upsert_venue(&self, venue: &Venue) -> Result<()>;
    async fn get_venue(&self, id: i64) -> Result<Option<Venue>>;
    async fn list_venues(&self) -> Result<Vec<Venue>>;
    /// Deletes the venue row; its concerts keep existing with no venue.
    async fn remove_venue(&self, id: i64) -> Result<()>;

    // Artist operations
    /// Sets `artist.id`. Fails when the name already exists in any case.
    async fn create_artist(&self, artist: &mut Artist) -> Result<()>;
    /// Case-insensitive lookup
    async fn get_artist_by_name(&self, name: &str) -> Result<Option<Artist>>;
    async fn list_active_artists(&self) -> Result<Vec<Artist>>;
    async fn set_artist_external_id(&self, artist_id: i64, external_id: &str) -> Result<()>;

    // Concert operations
    /// Sets `concert.id`.
    async fn create_concert(&self, concert: &mut Concert) -> Result<()>;
    async fn get_concert(&self, id: i64) -> Result<Option<Concert>>;
    async fn list_active_concerts(&self) -> Result<Vec<Concert>>;

    // Match operations
    /// Gets or creates the concert's match group and adds the artist to both
    /// the concert and the group. Either all of it is stored or none of it.
    async fn record_match(&self, concert_id: i64, artist_id: i64) -> Result<MatchOutcome>;
    async fn get_match_group(&self, concert_id: i64) -> Result<Option<MatchGroup>>;
    async fn list_match_groups(&self) -> Result<Vec<MatchGroup>>;
}
