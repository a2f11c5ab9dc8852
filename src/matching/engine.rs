use crate::common::error::Result;
use crate::matching::pattern::compile_pattern;
use crate::observability::metrics as sift_metrics;
use crate::storage::Storage;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Counts from one match run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub artists_scanned: usize,
    pub concerts_scanned: usize,
    /// (artist, concert) pairs whose billing matched
    pub hits: usize,
    /// Hits that added an association not stored before
    pub new_associations: usize,
    pub groups_created: usize,
    /// Artists skipped because their stored pattern did not compile
    pub bad_patterns: usize,
    /// Hits that could not be stored
    pub failed: usize,
}

/// Scans every active artist's pattern against every active concert's billing.
///
/// Matches only accumulate: a rescan never removes an artist from a concert,
/// even when the billing has since changed. Running twice over the same data
/// stores nothing new the second time.
pub struct MatchEngine {
    storage: Arc<dyn Storage>,
}

impl MatchEngine {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<MatchSummary> {
        let artists = self.storage.list_active_artists().await?;
        let concerts = self.storage.list_active_concerts().await?;
        let mut summary = MatchSummary {
            artists_scanned: artists.len(),
            concerts_scanned: concerts.len(),
            ..Default::default()
        };
        info!(
            "Matching {} artists against {} concerts",
            artists.len(),
            concerts.len()
        );

        let compiled: Vec<(i64, &str, Regex)> = artists
            .iter()
            .filter_map(|artist| {
                let id = artist.id?;
                match compile_pattern(&artist.pattern) {
                    Ok(re) => Some((id, artist.name.as_str(), re)),
                    Err(e) => {
                        warn!("Skipping {}: {}", artist.name, e);
                        summary.bad_patterns += 1;
                        None
                    }
                }
            })
            .collect();

        for (artist_id, artist_name, pattern) in &compiled {
            for concert in &concerts {
                let Some(concert_id) = concert.id else { continue };
                if !pattern.is_match(&concert.billing) {
                    continue;
                }
                summary.hits += 1;

                match self.storage.record_match(concert_id, *artist_id).await {
                    Ok(outcome) => {
                        if outcome.group_created {
                            summary.groups_created += 1;
                            sift_metrics::match_group_created();
                        }
                        if outcome.newly_associated {
                            summary.new_associations += 1;
                            sift_metrics::match_recorded();
                            info!("Matched artist {} and concert {}", artist_name, concert.billing);
                        } else {
                            debug!("Already matched: {} / concert {}", artist_name, concert_id);
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Could not record match of {} and concert {}: {}",
                            artist_name, concert_id, e
                        );
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            "Match run done: {} hits, {} new, {} groups created",
            summary.hits, summary.new_associations, summary.groups_created
        );
        Ok(summary)
    }
}
