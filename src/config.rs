//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).
//!
//! | Variable                  | Default        |
//! |---------------------------|----------------|
//! | `LISTEN_ADDR`             | `0.0.0.0:8080` |
//! | `DELIVERY_QUEUE_CAPACITY` | `256`          |
//! | `INTAKE_CAPACITY`         | `64`           |
//! | `SELF_ECHO`               | `true`         |
//! | `REQUIRE_AUTH`            | `true`         |
//! | `CLOSE_GRACE_MS`          | `1000`         |

use std::net::SocketAddr;
use std::time::Duration;

use crate::hub::{EchoPolicy, HubSettings};
use crate::session::SessionPolicy;
use crate::ws::connection::PumpSettings;

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Capacity of each member's delivery queue.
    pub delivery_queue_capacity: usize,

    /// Capacity of each hub intake channel.
    pub intake_capacity: usize,

    /// Whether a sender receives its own messages.
    pub self_echo: bool,

    /// Reject WebSocket upgrades that carry no `auth` cookie.
    pub require_auth: bool,

    /// Time an outbound loop gets to flush after its inbound side ends.
    pub close_grace: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            delivery_queue_capacity: 256,
            intake_capacity: 64,
            self_echo: true,
            require_auth: true,
            close_grace: Duration::from_millis(1000),
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set or does not parse.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw.trim().parse()?,
            None => defaults.listen_addr,
        };

        let delivery_queue_capacity = parse_value(
            lookup("DELIVERY_QUEUE_CAPACITY").as_deref(),
            defaults.delivery_queue_capacity,
        )
        .max(1);
        let intake_capacity =
            parse_value(lookup("INTAKE_CAPACITY").as_deref(), defaults.intake_capacity).max(1);

        let self_echo = parse_bool(lookup("SELF_ECHO").as_deref(), defaults.self_echo);
        let require_auth = parse_bool(lookup("REQUIRE_AUTH").as_deref(), defaults.require_auth);

        let close_grace_ms = parse_value(lookup("CLOSE_GRACE_MS").as_deref(), 1000_u64);

        Ok(Self {
            listen_addr,
            delivery_queue_capacity,
            intake_capacity,
            self_echo,
            require_auth,
            close_grace: Duration::from_millis(close_grace_ms),
        })
    }

    /// Hub settings derived from this configuration.
    #[must_use]
    pub const fn hub_settings(&self) -> HubSettings {
        HubSettings {
            intake_capacity: self.intake_capacity,
            echo: if self.self_echo {
                EchoPolicy::IncludeSender
            } else {
                EchoPolicy::ExcludeSender
            },
        }
    }

    /// Per-connection pump settings derived from this configuration.
    #[must_use]
    pub const fn pump_settings(&self) -> PumpSettings {
        PumpSettings {
            queue_capacity: self.delivery_queue_capacity,
            close_grace: self.close_grace,
        }
    }

    /// Session policy derived from this configuration.
    #[must_use]
    pub const fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            require_auth: self.require_auth,
        }
    }
}

/// Parses `raw` as `T`, returning `default` on missing or invalid values.
fn parse_value<T: std::str::FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Parses a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_bool(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
