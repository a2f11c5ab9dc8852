use super::{artist_name_key, Storage};
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Artist, Concert, MatchGroup, MatchOutcome, Venue};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Default)]
struct State {
    venues: BTreeMap<i64, Venue>,
    artists: BTreeMap<i64, Artist>,
    concerts: BTreeMap<i64, Concert>,
    match_groups: BTreeMap<i64, MatchGroup>,
    next_artist_id: i64,
    next_concert_id: i64,
    next_group_id: i64,
}

/// In-memory storage implementation for development/testing.
///
/// All tables sit behind one lock so a match is recorded in a single step.
#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| ScraperError::Storage {
            message: "in-memory store lock poisoned".to_string(),
        })
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn upsert_venue(&self, venue: &Venue) -> Result<()> {
        let mut state = self.state()?;
        state.venues.insert(venue.id, venue.clone());
        debug!("Stored venue: {} with id {}", venue.name, venue.id);
        Ok(())
    }

    async fn get_venue(&self, id: i64) -> Result<Option<Venue>> {
        Ok(self.state()?.venues.get(&id).cloned())
    }

    async fn list_venues(&self) -> Result<Vec<Venue>> {
        Ok(self.state()?.venues.values().cloned().collect())
    }

    async fn remove_venue(&self, id: i64) -> Result<()> {
        let mut state = self.state()?;
        state.venues.remove(&id);
        for concert in state.concerts.values_mut() {
            if concert.venue_id == Some(id) {
                concert.venue_id = None;
            }
        }
        debug!("Removed venue {}", id);
        Ok(())
    }

    async fn create_artist(&self, artist: &mut Artist) -> Result<()> {
        let mut state = self.state()?;
        let key = artist_name_key(&artist.name);
        if state.artists.values().any(|a| artist_name_key(&a.name) == key) {
            return Err(ScraperError::Storage {
                message: format!("artist {:?} already exists", artist.name),
            });
        }

        state.next_artist_id += 1;
        let id = state.next_artist_id;
        artist.id = Some(id);
        state.artists.insert(id, artist.clone());

        debug!("Created artist: {} with id {}", artist.name, id);
        Ok(())
    }

    async fn get_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let state = self.state()?;
        let key = artist_name_key(name);
        Ok(state
            .artists
            .values()
            .find(|a| artist_name_key(&a.name) == key)
            .cloned())
    }

    async fn list_active_artists(&self) -> Result<Vec<Artist>> {
        let state = self.state()?;
        Ok(state.artists.values().filter(|a| a.is_active).cloned().collect())
    }

    async fn set_artist_external_id(&self, artist_id: i64, external_id: &str) -> Result<()> {
        let mut state = self.state()?;
        let artist = state
            .artists
            .get_mut(&artist_id)
            .ok_or_else(|| ScraperError::Storage {
                message: format!("unknown artist {}", artist_id),
            })?;
        artist.external_id = Some(external_id.to_string());
        Ok(())
    }

    async fn create_concert(&self, concert: &mut Concert) -> Result<()> {
        let mut state = self.state()?;
        state.next_concert_id += 1;
        let id = state.next_concert_id;
        concert.id = Some(id);
        state.concerts.insert(id, concert.clone());

        debug!("Created concert: {} with id {}", concert.billing, id);
        Ok(())
    }

    async fn get_concert(&self, id: i64) -> Result<Option<Concert>> {
        Ok(self.state()?.concerts.get(&id).cloned())
    }

    async fn list_active_concerts(&self) -> Result<Vec<Concert>> {
        let state = self.state()?;
        Ok(state.concerts.values().filter(|c| c.is_active).cloned().collect())
    }

    async fn record_match(&self, concert_id: i64, artist_id: i64) -> Result<MatchOutcome> {
        let mut state = self.state()?;
        if !state.artists.contains_key(&artist_id) {
            return Err(ScraperError::Storage {
                message: format!("unknown artist {}", artist_id),
            });
        }
        if !state.concerts.contains_key(&concert_id) {
            return Err(ScraperError::Storage {
                message: format!("unknown concert {}", concert_id),
            });
        }

        let existing = state
            .match_groups
            .values()
            .find(|g| g.concert_id == concert_id)
            .map(|g| g.id);
        let (group_id, group_created) = match existing {
            Some(id) => (id, false),
            None => {
                state.next_group_id += 1;
                let id = state.next_group_id;
                state.match_groups.insert(
                    id,
                    MatchGroup {
                        id,
                        concert_id,
                        artist_ids: BTreeSet::new(),
                    },
                );
                (id, true)
            }
        };

        let mut newly_associated = false;
        if let Some(concert) = state.concerts.get_mut(&concert_id) {
            newly_associated |= concert.artist_ids.insert(artist_id);
        }
        if let Some(group) = state.match_groups.get_mut(&group_id) {
            newly_associated |= group.artist_ids.insert(artist_id);
        }

        Ok(MatchOutcome {
            group_id,
            group_created,
            newly_associated,
        })
    }

    async fn get_match_group(&self, concert_id: i64) -> Result<Option<MatchGroup>> {
        let state = self.state()?;
        Ok(state
            .match_groups
            .values()
            .find(|g| g.concert_id == concert_id)
            .cloned())
    }

    async fn list_match_groups(&self) -> Result<Vec<MatchGroup>> {
        Ok(self.state()?.match_groups.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn concert(billing: &str, venue_id: Option<i64>) -> Concert {
        Concert {
            id: None,
            billing: billing.to_string(),
            artist_ids: BTreeSet::new(),
            venue_id,
            starts_at: Utc::now(),
            price: "$10".to_string(),
            url: "http://example.com/show".to_string(),
            scraped_at: Utc::now(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn artist_names_are_unique_ignoring_case() {
        let storage = InMemoryStorage::new();
        let mut first = Artist::new("Toast Test", r"\bToast\s+Test\b", None);
        storage.create_artist(&mut first).await.unwrap();
        assert_eq!(first.id, Some(1));

        let mut shouted = Artist::new("TOAST TEST", r"\bTOAST\s+TEST\b", None);
        assert!(storage.create_artist(&mut shouted).await.is_err());

        let found = storage.get_artist_by_name("toast test").await.unwrap();
        assert_eq!(found.unwrap().id, Some(1));
    }

    #[tokio::test]
    async fn record_match_reuses_the_group() {
        let storage = InMemoryStorage::new();
        let mut a = Artist::new("A", r"\bA\b", None);
        let mut b = Artist::new("B", r"\bB\b", None);
        storage.create_artist(&mut a).await.unwrap();
        storage.create_artist(&mut b).await.unwrap();
        let mut show = concert("A with B", None);
        storage.create_concert(&mut show).await.unwrap();
        let concert_id = show.id.unwrap();

        let first = storage.record_match(concert_id, a.id.unwrap()).await.unwrap();
        assert!(first.group_created && first.newly_associated);

        let second = storage.record_match(concert_id, b.id.unwrap()).await.unwrap();
        assert_eq!(second.group_id, first.group_id);
        assert!(!second.group_created);

        let repeat = storage.record_match(concert_id, a.id.unwrap()).await.unwrap();
        assert!(!repeat.newly_associated);

        let group = storage.get_match_group(concert_id).await.unwrap().unwrap();
        assert_eq!(group.artist_ids.len(), 2);
        let stored = storage.get_concert(concert_id).await.unwrap().unwrap();
        assert_eq!(stored.artist_ids, group.artist_ids);
    }

    #[tokio::test]
    async fn unknown_concert_records_nothing() {
        let storage = InMemoryStorage::new();
        let mut a = Artist::new("A", r"\bA\b", None);
        storage.create_artist(&mut a).await.unwrap();

        assert!(storage.record_match(404, a.id.unwrap()).await.is_err());
        assert!(storage.list_match_groups().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn removing_a_venue_orphans_its_concerts() {
        let storage = InMemoryStorage::new();
        let venue = Venue {
            id: 7,
            name: "Metro".to_string(),
            address: String::new(),
            schedule_url: String::new(),
            is_active: true,
        };
        storage.upsert_venue(&venue).await.unwrap();
        let mut show = concert("Somebody", Some(7));
        storage.create_concert(&mut show).await.unwrap();

        storage.remove_venue(7).await.unwrap();

        let stored = storage.get_concert(show.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.venue_id, None);
        assert!(storage.get_venue(7).await.unwrap().is_none());
    }
}
