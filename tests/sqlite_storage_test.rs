use chrono::{TimeZone, Utc};
use sift::apis::factory::known_venues;
use sift::common::constants::METRO_ID;
use sift::common::error::ScraperError;
use sift::common::types::{Artist, Concert, Venue};
use sift::matching::{AddOutcome, ArtistCatalog, NoLookup};
use sift::storage::{SqliteStorage, Storage};
use std::collections::BTreeSet;
use std::sync::Arc;
use tempfile::tempdir;

fn concert(billing: &str, venue_id: Option<i64>) -> Concert {
    Concert {
        id: None,
        billing: billing.to_string(),
        artist_ids: BTreeSet::new(),
        venue_id,
        starts_at: Utc.with_ymd_and_hms(2025, 11, 16, 3, 0, 0).unwrap(),
        price: "$10".to_string(),
        url: "http://metrochicago.com/event/1".to_string(),
        scraped_at: Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap(),
        is_active: true,
    }
}

#[tokio::test]
async fn data_survives_reopening_the_database() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("sift.db");

    let concert_id = {
        let storage = SqliteStorage::open(&path).unwrap();
        for venue in known_venues() {
            storage.upsert_venue(&venue).await.unwrap();
        }
        let mut artist = Artist::new("Toast Test", r"\bToast\s+Test\b", Some("spotify:1".into()));
        storage.create_artist(&mut artist).await.unwrap();
        let mut show = concert("Toast Test", Some(METRO_ID));
        storage.create_concert(&mut show).await.unwrap();
        storage.record_match(show.id.unwrap(), artist.id.unwrap()).await.unwrap();
        show.id.unwrap()
    };

    let storage = SqliteStorage::open(&path).unwrap();
    assert_eq!(storage.list_venues().await.unwrap().len(), known_venues().len());

    let artist = storage.get_artist_by_name("toast test").await.unwrap().unwrap();
    assert_eq!(artist.name, "Toast Test");
    assert_eq!(artist.external_id.as_deref(), Some("spotify:1"));

    let stored = storage.get_concert(concert_id).await.unwrap().unwrap();
    assert_eq!(stored.starts_at, Utc.with_ymd_and_hms(2025, 11, 16, 3, 0, 0).unwrap());
    assert_eq!(stored.venue_id, Some(METRO_ID));
    assert_eq!(stored.artist_ids, BTreeSet::from([artist.id.unwrap()]));
}

#[tokio::test]
async fn artist_names_are_unique_in_any_case() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut first = Artist::new("Boris", r"\bBoris\b", None);
    storage.create_artist(&mut first).await.unwrap();

    let mut shouted = Artist::new("BORIS", r"\bBORIS\b", None);
    let err = storage.create_artist(&mut shouted).await.unwrap_err();
    assert!(matches!(err, ScraperError::Storage { .. }));
    assert!(shouted.id.is_none());
    assert_eq!(storage.list_active_artists().await.unwrap().len(), 1);
}

#[tokio::test]
async fn artist_names_ignore_non_ascii_case() {
    let storage = Arc::new(SqliteStorage::open_in_memory().unwrap());
    let catalog = ArtistCatalog::new(storage.clone(), Arc::new(NoLookup));

    let first = catalog.add_artist("Björk").await.unwrap();
    assert!(matches!(first, AddOutcome::Created(_)));
    let second = catalog.add_artist("BJÖRK").await.unwrap();
    assert!(matches!(second, AddOutcome::Existing(ref a) if a.name == "Björk"));

    assert_eq!(storage.list_active_artists().await.unwrap().len(), 1);
    let found = storage.get_artist_by_name("björk").await.unwrap().unwrap();
    assert_eq!(found.id, first.artist().id);

    let mut direct = Artist::new("BJÖRK", r"\bBJÖRK\b", None);
    assert!(storage.create_artist(&mut direct).await.is_err());
}

#[tokio::test]
async fn removing_a_venue_keeps_its_concerts() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let venue = Venue {
        id: 7,
        name: "Metro".to_string(),
        address: "3730 N Clark St".to_string(),
        schedule_url: "http://metrochicago.com/shows/".to_string(),
        is_active: true,
    };
    storage.upsert_venue(&venue).await.unwrap();
    let mut show = concert("Bread Heads", Some(7));
    storage.create_concert(&mut show).await.unwrap();

    storage.remove_venue(7).await.unwrap();

    assert!(storage.get_venue(7).await.unwrap().is_none());
    let stored = storage.get_concert(show.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.venue_id, None);
}

#[tokio::test]
async fn upsert_replaces_venue_details() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut venue = known_venues().remove(0);
    storage.upsert_venue(&venue).await.unwrap();

    venue.is_active = false;
    venue.address = "moved".to_string();
    storage.upsert_venue(&venue).await.unwrap();

    let stored = storage.get_venue(venue.id).await.unwrap().unwrap();
    assert_eq!(stored, venue);
    assert_eq!(storage.list_venues().await.unwrap().len(), 1);
}

#[tokio::test]
async fn record_match_reuses_the_group() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut a = Artist::new("Toast Test", r"\bToast\s+Test\b", None);
    let mut b = Artist::new("The Toe Jam", r"\bThe\s+Toe\s+Jam\b", None);
    storage.create_artist(&mut a).await.unwrap();
    storage.create_artist(&mut b).await.unwrap();
    let mut show = concert("Toast Test w/ The Toe Jam", None);
    storage.create_concert(&mut show).await.unwrap();
    let concert_id = show.id.unwrap();

    let first = storage.record_match(concert_id, a.id.unwrap()).await.unwrap();
    assert!(first.group_created);
    assert!(first.newly_associated);

    let repeat = storage.record_match(concert_id, a.id.unwrap()).await.unwrap();
    assert!(!repeat.group_created);
    assert!(!repeat.newly_associated);
    assert_eq!(repeat.group_id, first.group_id);

    let other = storage.record_match(concert_id, b.id.unwrap()).await.unwrap();
    assert!(!other.group_created);
    assert!(other.newly_associated);
    assert_eq!(other.group_id, first.group_id);

    let groups = storage.list_match_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].artist_ids.len(), 2);
}

#[tokio::test]
async fn failed_match_leaves_nothing_behind() {
    let storage = SqliteStorage::open_in_memory().unwrap();
    let mut show = concert("Toast Test", None);
    storage.create_concert(&mut show).await.unwrap();

    assert!(storage.record_match(show.id.unwrap(), 999).await.is_err());
    assert!(storage.record_match(12345, 1).await.is_err());

    assert!(storage.list_match_groups().await.unwrap().is_empty());
    assert!(storage.get_concert(show.id.unwrap()).await.unwrap().unwrap().artist_ids.is_empty());
}
