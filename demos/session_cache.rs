//! Session store with idle timeout and a hard size cap.
//!
//! Run with: `RUST_LOG=ttl_lru=trace cargo run --example session_cache`
//!
//! Sessions carry their own id and last-seen time, so the cache derives both
//! from the value. A background service drops sessions idle for 300ms; a
//! periodic `shrink` keeps at most 8 live sessions.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::EnvFilter;
use ttl_lru::prelude::*;

#[derive(Debug, Clone)]
struct Session {
    id: u32,
    user: String,
    last_seen: Instant,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_thread_names(true)
        .init();

    let cache = Arc::new(
        CacheBuilder::<u32, Session>::new()
            .capacity(16)
            .key_fn(|s: &Session| s.id)
            .time_fns(
                |s: &Session| s.last_seen,
                |s: &mut Session, at| s.last_seen = at,
            )
            .try_build::<DerivedKeyTime<u32, Session>>()?,
    );

    let on_evict: EvictCallback<u32> = Arc::new(|id: &u32| info!(session = id, "session timed out"));
    let config = ExpiryConfig::new(Duration::from_millis(50), Duration::from_millis(300))?;
    let mut service = ExpiryService::start(Arc::clone(&cache), config, Some(on_evict))?;

    for id in 0..12 {
        cache.put_value(Session {
            id,
            user: format!("user-{id}"),
            last_seen: Instant::now(),
        });
    }
    let capped = cache.shrink(8);
    info!(capped, live = cache.len(), "applied session cap");

    // Sessions 8..12 stay active; the rest go idle.
    for _ in 0..8 {
        thread::sleep(Duration::from_millis(60));
        for id in 8..12 {
            if let Some(session) = cache.get(&id) {
                info!(session = id, user = %session.user, "request served");
            }
        }
    }

    info!(live = ?cache.keys_by_recency(), "sessions still open");
    service.shutdown();
    info!(empty = cache.is_empty(), "service stopped");
    Ok(())
}
