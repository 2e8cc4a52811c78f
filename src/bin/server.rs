//! Replicated cache server.
//!
//! This binary runs a TCP server that accepts cache commands from
//! clients. Run standalone it acts as its own sequencer: each mutation
//! is committed immediately with the server clock as its timestamp. A
//! background task sweeps expired items once per purge interval.

use bytes::BytesMut;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    signal,
};
use tracing::{debug, error, info};

use replicated_cache::{
    buffer_to_array, now_unix, CacheConfig, CacheItem, CacheState, Command, CommitCode,
};

/// Replicated cache server.
#[derive(Parser, Debug)]
#[command(name = "cache-server")]
#[command(author, version, about, long_about = None)]
struct ServerArgs {
    /// Host to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Total cache capacity in bytes.
    #[arg(long, default_value_t = 64 * 1024 * 1024)]
    cache_size: usize,

    /// Largest admissible payload in bytes.
    #[arg(long, default_value_t = 1024 * 1024)]
    max_item_size: usize,

    /// Largest admissible key in bytes.
    #[arg(long, default_value_t = 256)]
    max_key_size: usize,

    /// Seconds between purge sweeps; also the expiry bucket width.
    #[arg(long, default_value_t = 30)]
    purge_interval: i64,
}

/// Entry point for the cache server.
#[tokio::main]
pub async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = ServerArgs::parse();

    let cache_config = CacheConfig::new()
        .cache_size(args.cache_size)
        .max_item_size(args.max_item_size)
        .max_key_size(args.max_key_size)
        .purge_interval(args.purge_interval)
        .build();

    // Create the shared cache engine
    let cache = Arc::new(CacheState::new(cache_config)?);

    // Bind the listener
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr).await?;

    info!(%addr, cache_size = args.cache_size, "cache server listening");

    // Sweep expired items on the bucket boundary cadence
    let purge_cache = Arc::clone(&cache);
    let purge_interval = args.purge_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(purge_interval as u64));
        // the first tick fires immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = purge_cache.commit_purge_expired(now_unix());
            if removed > 0 {
                debug!(removed, "purged expired items");
            }
        }
    });

    // Spawn a task to handle graceful shutdown
    let shutdown_cache = Arc::clone(&cache);
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            let stats = shutdown_cache.stats();
            info!(
                hits = stats.hits,
                misses = stats.misses,
                writes = stats.writes,
                evictions = stats.evictions,
                "shutting down"
            );
            std::process::exit(0);
        }
    });

    // Accept connections in a loop
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                debug!(%peer, "connection accepted");

                // Clone the cache handle for this connection
                let cache = Arc::clone(&cache);

                // Spawn a task to handle this connection
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(socket, cache).await {
                        error!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    mut socket: TcpStream,
    cache: Arc<CacheState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = BytesMut::with_capacity(1024);

    // Read the request
    let n = socket.read_buf(&mut buf).await?;
    if n == 0 {
        return Ok(()); // Connection closed
    }

    // Parse the command
    let attrs = buffer_to_array(&mut buf);

    if attrs.is_empty() {
        socket.write_all(b"ERR empty command").await?;
        return Ok(());
    }

    let command = Command::get(&attrs[0]);

    // Process the command
    let response = process_command(command, &attrs, &cache);

    // Send the response
    socket.write_all(response.as_bytes()).await?;

    Ok(())
}

/// Process a cache command and return the response.
fn process_command(command: Command, attrs: &[String], cache: &CacheState) -> String {
    match command {
        Command::Get => {
            if attrs.len() < 2 {
                return "ERR missing key argument".to_string();
            }

            let key = &attrs[1];
            // refresh the LRU position, then read the payload
            cache.commit_read(key, now_unix());
            match cache.read(key) {
                Some(value) => {
                    // Convert bytes to string for response
                    match std::str::from_utf8(&value) {
                        Ok(s) => s.to_string(),
                        Err(_) => format!("(binary data: {} bytes)", value.len()),
                    }
                }
                None => String::new(), // Empty string for not found
            }
        }

        Command::Set => {
            if attrs.len() < 3 {
                return "ERR missing key or value argument".to_string();
            }

            let key = &attrs[1];
            let value = attrs[2].clone().into_bytes();
            let ttl: i64 = match attrs.get(3) {
                Some(raw) => match raw.parse() {
                    Ok(ttl) => ttl,
                    Err(_) => return format!("ERR invalid ttl '{}'", raw),
                },
                None => 300,
            };

            let now = now_unix();
            let item = CacheItem::new(value, now + ttl);
            match cache.commit_write(key, item, now) {
                CommitCode::DoneOk => "Ok".to_string(),
                code => {
                    debug!(%key, %code, "write rejected");
                    format!("ERR {}", code)
                }
            }
        }

        Command::Purge => {
            let removed = cache.commit_purge_expired(now_unix());
            format!("Ok {}", removed)
        }

        Command::Ping => "PONG".to_string(),

        Command::Stats => {
            let stats = cache.stats();
            format!(
                "hits:{} misses:{} writes:{} evictions:{} expirations:{} used_memory:{} items:{} hit_rate:{:.1}%",
                stats.hits,
                stats.misses,
                stats.writes,
                stats.evictions,
                stats.expirations,
                cache.used_memory(),
                cache.len(),
                stats.hit_rate
            )
        }

        Command::Invalid => {
            format!(
                "ERR unknown command '{}'",
                attrs.first().unwrap_or(&String::new())
            )
        }
    }
}
