//! Turncoat server binary.
//!
//! Configured from the environment:
//!
//! | Variable              | Default          |
//! |-----------------------|------------------|
//! | `TURNCOAT_BIND`       | `127.0.0.1:8080` |
//! | `TURNCOAT_LOG_FILE`   | none (in memory) |
//! | `TURNCOAT_RESET_SECS` | `30`             |
//! | `TURNCOAT_TRAITORS`   | `4`              |
//! | `TURNCOAT_SEED`       | none (OS random) |
//! | `RUST_LOG`            | `info`           |

use std::str::FromStr;
use std::time::Duration;

use turncoat::prelude::*;

#[tokio::main]
async fn main() -> Result<(), TurncoatError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let mut config = RoomConfig::default();
    if let Some(secs) = env_parse::<u64>("TURNCOAT_RESET_SECS") {
        config.reset_delay = Duration::from_secs(secs);
    }
    if let Some(traitors) = env_parse::<usize>("TURNCOAT_TRAITORS") {
        config.traitor_count = traitors;
    }
    config.seed = env_parse::<u64>("TURNCOAT_SEED");

    let bind = std::env::var("TURNCOAT_BIND").unwrap_or_else(|_| turncoat::DEFAULT_BIND.to_string());
    let mut builder = TurncoatServer::builder().bind(&bind).room_config(config);
    if let Ok(path) = std::env::var("TURNCOAT_LOG_FILE") {
        builder = builder.log_file(path);
    }

    let server = builder.build().await?;
    tracing::info!(addr = ?server.local_addr().ok(), "accepting players");
    server.run().await
}

/// Reads and parses an environment variable, warning on bad values.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
