use crate::common::error::{Result, ScraperError};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

pub const SPOTIFY_SEARCH_URL: &str = "https://api.spotify.com/v1/search";

/// External artist-identity service
#[async_trait]
pub trait ArtistLookup: Send + Sync {
    /// Identity for a display name; `Ok(None)` when the service has no match.
    async fn lookup(&self, name: &str) -> Result<Option<String>>;
}

/// Lookup that never finds anything, for offline runs
pub struct NoLookup;

#[async_trait]
impl ArtistLookup for NoLookup {
    async fn lookup(&self, _name: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: Option<ArtistPage>,
}

#[derive(Debug, Deserialize)]
struct ArtistPage {
    #[serde(default)]
    items: Vec<ArtistItem>,
}

#[derive(Debug, Deserialize)]
struct ArtistItem {
    id: String,
}

/// Spotify artist search. The quoted name gives a more accurate first result
/// ("Boris" vs `"Boris"`), and the first result is taken as the identity.
pub struct SpotifySearch {
    client: reqwest::Client,
    search_url: String,
    token: Option<String>,
}

impl SpotifySearch {
    pub fn new(search_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            search_url: search_url.into(),
            token,
        })
    }

    fn first_id(body: &str) -> Result<Option<String>> {
        let response: SearchResponse = serde_json::from_str(body)?;
        Ok(response
            .artists
            .and_then(|page| page.items.into_iter().next())
            .map(|item| item.id))
    }
}

#[async_trait]
impl ArtistLookup for SpotifySearch {
    #[instrument(skip(self))]
    async fn lookup(&self, name: &str) -> Result<Option<String>> {
        let quoted = format!("\"{}\"", name);
        let mut request = self
            .client
            .get(&self.search_url)
            .query(&[("q", quoted.as_str()), ("type", "artist")]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ScraperError::Lookup {
                message: format!("{} - {}", status, body),
            });
        }

        let id = Self::first_id(&body)?;
        debug!("Lookup for {:?} returned {:?}", name, id);
        Ok(id)
    }
}
