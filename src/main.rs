use clap::{Parser, Subcommand};
use sift::apis::factory::known_venues;
use sift::common::constants::SOURCE_TIME_ZONE;
use sift::config::Config;
use sift::matching::{AddOutcome, ArtistCatalog, ArtistLookup, MatchEngine, NoLookup, SpotifySearch};
use sift::observability::{init_logging, metrics as sift_metrics};
use sift::pipeline::{ReqwestFetcher, ScrapeOrchestrator};
use sift::storage::{SqliteStorage, Storage};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Chicago concert listings scraper and tracked-artist matcher")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert or refresh the known venue rows
    SeedVenues,
    /// Scrape venue schedules into concerts
    Scrape {
        /// Venue ids to scrape (comma-separated). Defaults to every active venue
        #[arg(long)]
        venues: Option<String>,
    },
    /// Match tracked artists against stored concerts
    Match,
    /// Track new artists by name
    AddArtists {
        #[arg(required = true)]
        names: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Look up external ids for artists that have none
    RefreshIds,
    /// List stored venues
    Venues,
}

fn parse_venue_ids(list: &str) -> anyhow::Result<Vec<i64>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|e| anyhow::anyhow!("bad venue id {s:?}: {e}"))
        })
        .collect()
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}

fn artist_lookup(config: &Config) -> anyhow::Result<Arc<dyn ArtistLookup>> {
    match &config.lookup.spotify_token {
        Some(token) => Ok(Arc::new(SpotifySearch::new(
            config.lookup.spotify_search_url.clone(),
            Some(token.clone()),
            config.scrape.timeout(),
        )?)),
        None => {
            warn!("No Spotify token configured; artists are created without external ids");
            Ok(Arc::new(NoLookup))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;
    if let Some(addr) = config.metrics_addr {
        sift_metrics::init(addr);
    }

    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::open(&config.database_path)?);
    info!("Using database {}", config.database_path.display());

    match cli.command {
        Commands::SeedVenues => {
            let venues = known_venues();
            for venue in &venues {
                storage.upsert_venue(venue).await?;
            }
            println!("✅ Seeded {} venues", venues.len());
        }
        Commands::Scrape { venues } => {
            let ids = venues.as_deref().map(parse_venue_ids).transpose()?;
            let fetcher = Arc::new(ReqwestFetcher::new(
                &config.scrape.user_agent,
                config.scrape.timeout(),
            )?);
            let orchestrator = ScrapeOrchestrator::new(fetcher, storage.clone())
                .with_settle_delay(config.scrape.settle_delay());
            let today = chrono::Utc::now().with_timezone(&SOURCE_TIME_ZONE).date_naive();

            let summary = orchestrator.run(ids, today).await?;
            println!("\n📊 Scrape run {}:", summary.run_id);
            println!("   Venues: {}/{}", summary.venues_scraped, summary.venues_attempted);
            println!("   Shows: {} ({} skipped)", summary.shows_found, summary.shows_skipped);
            println!("   Concerts created: {}", summary.concerts_created);
            if !summary.failures.is_empty() {
                println!("\n⚠️  Failed venues:");
                for failure in &summary.failures {
                    println!("   - {} ({}): {}", failure.venue_name, failure.venue_id, failure.error);
                }
            }
        }
        Commands::Match => {
            let summary = MatchEngine::new(storage.clone()).run().await?;
            println!("\n📊 Match run:");
            println!(
                "   Scanned {} artists x {} concerts",
                summary.artists_scanned, summary.concerts_scanned
            );
            println!(
                "   Hits: {} ({} new, {} groups created)",
                summary.hits, summary.new_associations, summary.groups_created
            );
            if summary.bad_patterns + summary.failed > 0 {
                println!(
                    "⚠️  {} bad patterns, {} matches not stored",
                    summary.bad_patterns, summary.failed
                );
            }
        }
        Commands::AddArtists { names, yes } => {
            println!("Artists to add:");
            for name in &names {
                println!("   - {}", name.trim());
            }
            if !yes && !confirm("Add these artists?")? {
                println!("Nothing added");
                return Ok(());
            }

            let catalog = ArtistCatalog::new(storage.clone(), artist_lookup(&config)?);
            for (name, outcome) in catalog.add_artists(&names).await {
                match outcome {
                    Ok(AddOutcome::Created(artist)) => println!("✅ Added {}", artist.name),
                    Ok(AddOutcome::Existing(artist)) => println!("   Already tracked: {}", artist.name),
                    Err(e) => {
                        error!("Could not add {}: {}", name, e);
                        println!("❌ {}: {}", name, e);
                    }
                }
            }
        }
        Commands::RefreshIds => {
            let catalog = ArtistCatalog::new(storage.clone(), artist_lookup(&config)?)
                .with_lookup_delay(config.lookup.delay());
            let summary = catalog.refresh_external_ids().await?;
            println!(
                "Checked {} artists: {} updated, {} not found, {} failed",
                summary.checked, summary.updated, summary.not_found, summary.failed
            );
        }
        Commands::Venues => {
            for venue in storage.list_venues().await? {
                let state = if venue.is_active { "" } else { " (inactive)" };
                println!("{:>3}  {}{}  {}", venue.id, venue.name, state, venue.schedule_url);
            }
        }
    }
    Ok(())
}
