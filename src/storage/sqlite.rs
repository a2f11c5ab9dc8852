use super::{artist_name_key, Storage};
use crate::common::error::{Result, ScraperError};
use crate::common::types::{Artist, Concert, MatchGroup, MatchOutcome, Venue};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;
    CREATE TABLE IF NOT EXISTS venues (
        id            INTEGER PRIMARY KEY,
        name          TEXT NOT NULL,
        address       TEXT NOT NULL DEFAULT '',
        schedule_url  TEXT NOT NULL DEFAULT '',
        is_active     INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS artists (
        id           INTEGER PRIMARY KEY AUTOINCREMENT,
        name         TEXT NOT NULL,
        name_key     TEXT NOT NULL UNIQUE,
        pattern      TEXT NOT NULL,
        external_id  TEXT,
        is_active    INTEGER NOT NULL DEFAULT 1,
        created_at   TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS concerts (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        billing     TEXT NOT NULL,
        venue_id    INTEGER REFERENCES venues(id) ON DELETE SET NULL,
        starts_at   TEXT NOT NULL,
        price       TEXT NOT NULL,
        url         TEXT NOT NULL,
        scraped_at  TEXT NOT NULL,
        is_active   INTEGER NOT NULL DEFAULT 1
    );
    CREATE TABLE IF NOT EXISTS concert_artists (
        concert_id  INTEGER NOT NULL REFERENCES concerts(id) ON DELETE CASCADE,
        artist_id   INTEGER NOT NULL REFERENCES artists(id),
        PRIMARY KEY (concert_id, artist_id)
    );
    CREATE TABLE IF NOT EXISTS match_groups (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        concert_id  INTEGER NOT NULL UNIQUE REFERENCES concerts(id) ON DELETE CASCADE
    );
    CREATE TABLE IF NOT EXISTS match_group_artists (
        group_id   INTEGER NOT NULL REFERENCES match_groups(id) ON DELETE CASCADE,
        artist_id  INTEGER NOT NULL REFERENCES artists(id),
        PRIMARY KEY (group_id, artist_id)
    );
"#;

/// SQLite-backed storage
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| ScraperError::Storage {
            message: "database lock poisoned".to_string(),
        })
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn venue_from_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    Ok(Venue {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        schedule_url: row.get(3)?,
        is_active: row.get(4)?,
    })
}

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        pattern: row.get(2)?,
        external_id: row.get(3)?,
        is_active: row.get(4)?,
        created_at: timestamp(row, 5)?,
    })
}

fn concert_from_row(row: &Row<'_>) -> rusqlite::Result<Concert> {
    Ok(Concert {
        id: Some(row.get(0)?),
        billing: row.get(1)?,
        artist_ids: BTreeSet::new(),
        venue_id: row.get(2)?,
        starts_at: timestamp(row, 3)?,
        price: row.get(4)?,
        url: row.get(5)?,
        scraped_at: timestamp(row, 6)?,
        is_active: row.get(7)?,
    })
}

const VENUE_COLUMNS: &str = "id, name, address, schedule_url, is_active";
const ARTIST_COLUMNS: &str = "id, name, pattern, external_id, is_active, created_at";
const CONCERT_COLUMNS: &str = "id, billing, venue_id, starts_at, price, url, scraped_at, is_active";

/// Associated ids per owner from a two-column (owner, artist) table
fn artist_sets(conn: &Connection, sql: &str) -> Result<HashMap<i64, BTreeSet<i64>>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
    let mut sets: HashMap<i64, BTreeSet<i64>> = HashMap::new();
    for row in rows {
        let (owner, artist) = row?;
        sets.entry(owner).or_default().insert(artist);
    }
    Ok(sets)
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn upsert_venue(&self, venue: &Venue) -> Result<()> {
        self.conn()?.execute(
            "INSERT INTO venues (id, name, address, schedule_url, is_active) VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET name=excluded.name, address=excluded.address,
                 schedule_url=excluded.schedule_url, is_active=excluded.is_active",
            params![venue.id, venue.name, venue.address, venue.schedule_url, venue.is_active],
        )?;
        debug!("Stored venue: {} with id {}", venue.name, venue.id);
        Ok(())
    }

    async fn get_venue(&self, id: i64) -> Result<Option<Venue>> {
        let conn = self.conn()?;
        let venue = conn
            .query_row(
                &format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?1"),
                params![id],
                venue_from_row,
            )
            .optional()?;
        Ok(venue)
    }

    async fn list_venues(&self) -> Result<Vec<Venue>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("SELECT {VENUE_COLUMNS} FROM venues ORDER BY id"))?;
        let venues = stmt
            .query_map([], venue_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(venues)
    }

    async fn remove_venue(&self, id: i64) -> Result<()> {
        self.conn()?
            .execute("DELETE FROM venues WHERE id = ?1", params![id])?;
        debug!("Removed venue {}", id);
        Ok(())
    }

    async fn create_artist(&self, artist: &mut Artist) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO artists (name, name_key, pattern, external_id, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                artist.name,
                artist_name_key(&artist.name),
                artist.pattern,
                artist.external_id,
                artist.is_active,
                artist.created_at.to_rfc3339()
            ],
        )?;
        let id = conn.last_insert_rowid();
        artist.id = Some(id);
        debug!("Created artist: {} with id {}", artist.name, id);
        Ok(())
    }

    async fn get_artist_by_name(&self, name: &str) -> Result<Option<Artist>> {
        let conn = self.conn()?;
        let artist = conn
            .query_row(
                &format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE name_key = ?1"),
                params![artist_name_key(name)],
                artist_from_row,
            )
            .optional()?;
        Ok(artist)
    }

    async fn list_active_artists(&self) -> Result<Vec<Artist>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTIST_COLUMNS} FROM artists WHERE is_active = 1 ORDER BY id"
        ))?;
        let artists = stmt
            .query_map([], artist_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(artists)
    }

    async fn set_artist_external_id(&self, artist_id: i64, external_id: &str) -> Result<()> {
        let changed = self.conn()?.execute(
            "UPDATE artists SET external_id = ?1 WHERE id = ?2",
            params![external_id, artist_id],
        )?;
        if changed == 0 {
            return Err(ScraperError::Storage {
                message: format!("unknown artist {}", artist_id),
            });
        }
        Ok(())
    }

    async fn create_concert(&self, concert: &mut Concert) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO concerts (billing, venue_id, starts_at, price, url, scraped_at, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                concert.billing,
                concert.venue_id,
                concert.starts_at.to_rfc3339(),
                concert.price,
                concert.url,
                concert.scraped_at.to_rfc3339(),
                concert.is_active
            ],
        )?;
        let id = conn.last_insert_rowid();
        concert.id = Some(id);
        debug!("Created concert: {} with id {}", concert.billing, id);
        Ok(())
    }

    async fn get_concert(&self, id: i64) -> Result<Option<Concert>> {
        let conn = self.conn()?;
        let concert = conn
            .query_row(
                &format!("SELECT {CONCERT_COLUMNS} FROM concerts WHERE id = ?1"),
                params![id],
                concert_from_row,
            )
            .optional()?;
        let Some(mut concert) = concert else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT artist_id FROM concert_artists WHERE concert_id = ?1")?;
        concert.artist_ids = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<i64>>>()?;
        Ok(Some(concert))
    }

    async fn list_active_concerts(&self) -> Result<Vec<Concert>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CONCERT_COLUMNS} FROM concerts WHERE is_active = 1 ORDER BY id"
        ))?;
        let mut concerts = stmt
            .query_map([], concert_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut associations =
            artist_sets(&conn, "SELECT concert_id, artist_id FROM concert_artists")?;
        for concert in &mut concerts {
            if let Some(ids) = concert.id.and_then(|id| associations.remove(&id)) {
                concert.artist_ids = ids;
            }
        }
        Ok(concerts)
    }

    async fn record_match(&self, concert_id: i64, artist_id: i64) -> Result<MatchOutcome> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let concert_exists = tx
            .query_row(
                "SELECT 1 FROM concerts WHERE id = ?1",
                params![concert_id],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !concert_exists {
            return Err(ScraperError::Storage {
                message: format!("unknown concert {}", concert_id),
            });
        }

        let group_created = tx.execute(
            "INSERT INTO match_groups (concert_id) VALUES (?1) ON CONFLICT(concert_id) DO NOTHING",
            params![concert_id],
        )? == 1;
        let group_id: i64 = tx.query_row(
            "SELECT id FROM match_groups WHERE concert_id = ?1",
            params![concert_id],
            |row| row.get(0),
        )?;

        let on_concert = tx.execute(
            "INSERT OR IGNORE INTO concert_artists (concert_id, artist_id) VALUES (?1, ?2)",
            params![concert_id, artist_id],
        )?;
        let on_group = tx.execute(
            "INSERT OR IGNORE INTO match_group_artists (group_id, artist_id) VALUES (?1, ?2)",
            params![group_id, artist_id],
        )?;
        tx.commit()?;

        Ok(MatchOutcome {
            group_id,
            group_created,
            newly_associated: on_concert + on_group > 0,
        })
    }

    async fn get_match_group(&self, concert_id: i64) -> Result<Option<MatchGroup>> {
        let conn = self.conn()?;
        let group_id: Option<i64> = conn
            .query_row(
                "SELECT id FROM match_groups WHERE concert_id = ?1",
                params![concert_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = group_id else {
            return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT artist_id FROM match_group_artists WHERE group_id = ?1")?;
        let artist_ids = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<rusqlite::Result<BTreeSet<i64>>>()?;
        Ok(Some(MatchGroup {
            id,
            concert_id,
            artist_ids,
        }))
    }

    async fn list_match_groups(&self) -> Result<Vec<MatchGroup>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT id, concert_id FROM match_groups ORDER BY id")?;
        let groups = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut members =
            artist_sets(&conn, "SELECT group_id, artist_id FROM match_group_artists")?;
        Ok(groups
            .into_iter()
            .map(|(id, concert_id)| MatchGroup {
                id,
                concert_id,
                artist_ids: members.remove(&id).unwrap_or_default(),
            })
            .collect())
    }
}
