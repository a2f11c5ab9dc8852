//! Counters for scrape and match runs.
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use std::fmt;
use std::net::SocketAddr;
use tracing::{info, warn};

/// All metric names used by the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    ShowsScraped,
    ShowsSkipped,
    VenueFailures,
    MatchesRecorded,
    MatchGroupsCreated,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::ShowsScraped => "sift_shows_scraped_total",
            MetricName::ShowsSkipped => "sift_shows_skipped_total",
            MetricName::VenueFailures => "sift_venue_failures_total",
            MetricName::MatchesRecorded => "sift_matches_recorded_total",
            MetricName::MatchGroupsCreated => "sift_match_groups_created_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installs the Prometheus exporter on `addr`. A failed install is logged and
/// leaves recording as a no-op.
pub fn init(addr: SocketAddr) {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => info!("Prometheus exporter listening on http://{}/metrics", addr),
        Err(e) => warn!("Prometheus exporter install failed: {}", e),
    }
}

pub fn shows_scraped(venue: &str, count: usize) {
    ::metrics::counter!(MetricName::ShowsScraped.as_str(), "venue" => venue.to_string())
        .increment(count as u64);
}

pub fn shows_skipped(venue: &str, count: usize) {
    ::metrics::counter!(MetricName::ShowsSkipped.as_str(), "venue" => venue.to_string())
        .increment(count as u64);
}

pub fn venue_failure(venue: &str) {
    ::metrics::counter!(MetricName::VenueFailures.as_str(), "venue" => venue.to_string())
        .increment(1);
}

pub fn match_recorded() {
    ::metrics::counter!(MetricName::MatchesRecorded.as_str()).increment(1);
}

pub fn match_group_created() {
    ::metrics::counter!(MetricName::MatchGroupsCreated.as_str()).increment(1);
}
