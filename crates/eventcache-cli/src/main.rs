//! eventcache - participant schedules from the command line.
//!
//! Keeps the participant list and the last looked-up schedule on disk, and
//! only goes back to the server when its last-update signature changes.

mod render;

use std::io;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use eventcache_core::cache::CacheManager;
use eventcache_core::models::search;
use eventcache_core::{ApiClient, CachedFetchClient, Config, FileStorage, ParticipantEvents};

const USAGE: &str = "\
Usage: eventcache <command>

Commands:
  update                 Check the server version and refresh stale data
  force-update           Refresh everything regardless of the stored version
  participants [query]   List cached participants, optionally filtered
  events <name>          Fetch and show one participant's schedule
  status                 Show the stored version and cache ages";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let config = Config::load()?;
    debug!(?config, "Config loaded");

    let cache_dir = config.cache_dir()?;
    let storage = Arc::new(FileStorage::open(&cache_dir)?);
    debug!(?cache_dir, "Cache directory configured");

    if command == "status" {
        return show_status(CacheManager::new(storage));
    }

    // Size of a freshly fetched participant list, if the update fetched one
    let fetched = Arc::new(Mutex::new(None));
    let on_participants = Arc::clone(&fetched);

    let api = ApiClient::with_base_url(config.base_url())?;
    let client = CachedFetchClient::builder(api, storage)
        .delivery(config.delivery)
        .on_event_fetch(|events: &ParticipantEvents| {
            debug!(name = %events.name, count = events.events.len(), "Events delivered");
        })
        .on_update_participants(move |names| {
            if let Ok(mut slot) = on_participants.lock() {
                *slot = Some(names.len());
            }
        })
        .build()?;

    info!(command, "eventcache starting");

    match command {
        "update" => {
            client.update().await?;
            report_update(&client, &fetched).await;
        }
        "force-update" => {
            client.force_update().await?;
            report_update(&client, &fetched).await;
        }
        "participants" => {
            let names = client.participants().await;
            if names.is_empty() {
                eprintln!("No participants cached yet. Run `eventcache update` first.");
                return Ok(());
            }
            let query = rest_of_args(&args);
            print!("{}", render::participants(&search(&names, &query), names.len()));
        }
        "events" => {
            let name = rest_of_args(&args);
            if name.is_empty() {
                bail!("Missing participant name\n\n{}", USAGE);
            }
            client
                .fetch_events(&name)
                .await
                .with_context(|| format!("Failed to fetch events for {}", name))?;
            if let Some(events) = client.last_event_fetch().await {
                print!("{}", render::schedule(&events));
            }
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }

    Ok(())
}

/// Arguments after the command, joined so unquoted names like
/// `events John Smith` work.
fn rest_of_args(args: &[String]) -> String {
    args.get(1..).unwrap_or_default().join(" ").trim().to_string()
}

async fn report_update(client: &CachedFetchClient, fetched: &Mutex<Option<usize>>) {
    let fetched = fetched.lock().ok().and_then(|count| *count);
    match fetched {
        Some(count) => println!("Fetched {} participants", count),
        None => println!(
            "Participant list is current ({} cached)",
            client.participants().await.len()
        ),
    }

    // Anything still cached after an update survived the version check
    if let Some(events) = client.last_event_fetch().await {
        println!("Cached schedule for {} is current", events.name);
    }
    println!("Server version: {}", client.last_update().await);
}

fn show_status(cache: CacheManager) -> Result<()> {
    let signature = cache.load_last_update()?;
    let cached_events = cache.load_last_event_fetch()?;
    let ages = cache.get_cache_ages();
    print!(
        "{}",
        render::status(&signature, &ages, cached_events.as_ref().map(|e| e.name.as_str()))
    );
    Ok(())
}
