use crate::common::error::Result;
use crate::common::types::Artist;
use crate::matching::lookup::ArtistLookup;
use crate::matching::pattern::build_pattern;
use crate::storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// What happened to one requested name
#[derive(Debug)]
pub enum AddOutcome {
    Created(Artist),
    /// An artist with the same name in any case was already tracked
    Existing(Artist),
}

impl AddOutcome {
    pub fn artist(&self) -> &Artist {
        match self {
            AddOutcome::Created(artist) | AddOutcome::Existing(artist) => artist,
        }
    }
}

/// Counts from a batch identity refresh
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub checked: usize,
    pub updated: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Creates tracked artists and keeps their external identities filled in.
pub struct ArtistCatalog {
    storage: Arc<dyn Storage>,
    lookup: Arc<dyn ArtistLookup>,
    lookup_delay: Duration,
}

impl ArtistCatalog {
    pub fn new(storage: Arc<dyn Storage>, lookup: Arc<dyn ArtistLookup>) -> Self {
        Self {
            storage,
            lookup,
            lookup_delay: Duration::ZERO,
        }
    }

    /// Pause between identity calls in [`refresh_external_ids`](Self::refresh_external_ids)
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    #[instrument(skip(self))]
    pub async fn add_artist(&self, name: &str) -> Result<AddOutcome> {
        let name = name.trim();
        let pattern = build_pattern(name)?;

        if let Some(existing) = self.storage.get_artist_by_name(name).await? {
            info!("Existing artist {} found, skipping", existing.name);
            return Ok(AddOutcome::Existing(existing));
        }

        let external_id = self.identify(name).await;
        let mut artist = Artist::new(name, pattern, external_id);
        self.storage.create_artist(&mut artist).await?;
        info!(
            "New artist created: {} (id {:?}, external id {:?})",
            artist.name, artist.id, artist.external_id
        );
        Ok(AddOutcome::Created(artist))
    }

    /// Adds each name independently; a rejected name does not stop the rest.
    pub async fn add_artists<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Vec<(String, Result<AddOutcome>)> {
        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let outcome = self.add_artist(name).await;
            if let Err(e) = &outcome {
                warn!("Could not add artist {:?}: {}", name, e);
            }
            outcomes.push((name.to_string(), outcome));
        }
        outcomes
    }

    /// Looks up active artists that have no external id yet.
    #[instrument(skip(self))]
    pub async fn refresh_external_ids(&self) -> Result<RefreshSummary> {
        let mut summary = RefreshSummary::default();
        let pending: Vec<Artist> = self
            .storage
            .list_active_artists()
            .await?
            .into_iter()
            .filter(|a| a.external_id.as_deref().map_or(true, str::is_empty))
            .collect();

        for (i, artist) in pending.iter().enumerate() {
            if i > 0 && !self.lookup_delay.is_zero() {
                tokio::time::sleep(self.lookup_delay).await;
            }
            let Some(id) = artist.id else { continue };
            summary.checked += 1;

            match self.lookup.lookup(&artist.name).await {
                Ok(Some(external_id)) => {
                    self.storage.set_artist_external_id(id, &external_id).await?;
                    info!("Saved external id {} for {}", external_id, artist.name);
                    summary.updated += 1;
                }
                Ok(None) => {
                    info!("No external id found for {}", artist.name);
                    summary.not_found += 1;
                }
                Err(e) => {
                    warn!("External id lookup failed for {}: {}", artist.name, e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }

    /// A failed lookup leaves the artist without an id; it can be refreshed later.
    async fn identify(&self, name: &str) -> Option<String> {
        match self.lookup.lookup(name).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Identity lookup for {:?} failed: {}", name, e);
                None
            }
        }
    }
}
