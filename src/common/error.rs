use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch of {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("{venue}: show #{index} could not be extracted: {reason}")]
    Extraction {
        venue: String,
        index: usize,
        reason: String,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid date: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}")]
    InvalidDate {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
    },

    #[error("Invalid artist name: {0:?}")]
    InvalidArtistName(String),

    #[error("Artist pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Artist lookup failed: {message}")]
    Lookup { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

impl ScraperError {
    /// Attaches venue and fragment position to a field-level failure.
    ///
    /// Invalid dates keep their own kind: they point at an extractor bug and
    /// are reported separately from missing markup.
    pub fn in_show(self, venue: &str, index: usize) -> Self {
        match self {
            ScraperError::MissingField(reason) => ScraperError::Extraction {
                venue: venue.to_string(),
                index,
                reason,
            },
            err @ (ScraperError::InvalidDate { .. } | ScraperError::Extraction { .. }) => err,
            other => ScraperError::Extraction {
                venue: venue.to_string(),
                index,
                reason: other.to_string(),
            },
        }
    }

    pub fn is_invalid_date(&self) -> bool {
        matches!(self, ScraperError::InvalidDate { .. })
    }
}

impl From<rusqlite::Error> for ScraperError {
    fn from(err: rusqlite::Error) -> Self {
        ScraperError::Storage {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;
