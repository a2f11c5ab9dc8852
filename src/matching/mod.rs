// Tracked artists and their matches against scraped billings

pub mod catalog;
pub mod engine;
pub mod lookup;
pub mod pattern;

pub use catalog::{AddOutcome, ArtistCatalog, RefreshSummary};
pub use engine::{MatchEngine, MatchSummary};
pub use lookup::{ArtistLookup, NoLookup, SpotifySearch};
