// src/logging.rs
//! Tracing setup and log helpers.

use sha2::{Digest, Sha256};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_FORMAT: &str = "SURVEY_LOG_FORMAT";
const DEFAULT_FILTER: &str = "survey_targeting=info,warn";

/// Install a global subscriber. `RUST_LOG` wins over the default filter;
/// `SURVEY_LOG_FORMAT=json` switches to JSON lines.
///
/// Safe to call more than once: a second call (or a host app that already
/// installed its own subscriber) leaves the existing one in place.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let res = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Short stable id for a piece of reader-facing text.
/// Article titles are never logged raw, only this hash.
pub fn anon_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("Tabby cat");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("Tabby cat"));
        assert_ne!(a, anon_hash("Dog"));
    }

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
