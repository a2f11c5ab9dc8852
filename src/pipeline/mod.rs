// Fetching schedule pages and turning them into stored concerts

pub mod fetch;
pub mod orchestrator;

pub use fetch::{PageFetcher, ReqwestFetcher};
pub use orchestrator::{ScrapeOrchestrator, ScrapeSummary, VenueFailure, VenueScrape};
