//! Environment-driven configuration.
//!
//! Everything has a development default, so `Config::from_env()` never fails:
//! unset variables fall back, malformed values fall back with a warning. The
//! backend anon key is the only value with no useful default; leaving it
//! empty simply means the hosted backend will reject requests.

use std::collections::BTreeSet;
use std::env;

use crate::pricing::SeatMultipliers;
use crate::seatmap::StadiumLayout;
use crate::types::SeatType;

/// Connection details for the hosted backend.
#[derive(Clone, Debug)]
pub struct BackendConfig {
    /// Base URL of the hosted backend, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Publishable anon key sent with every request.
    pub anon_key: String,
}

/// Full application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Hosted backend connection.
    pub backend: BackendConfig,
    /// Venue layout used to generate seat maps.
    pub stadium: StadiumLayout,
    /// Tier price multipliers.
    pub multipliers: SeatMultipliers,
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file first
    /// if one exists.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let backend = BackendConfig {
            url: env_or("MATCHDAY_BACKEND_URL", "http://localhost:54321"),
            anon_key: env_or("MATCHDAY_BACKEND_ANON_KEY", ""),
        };

        let rows = env_parsed("MATCHDAY_STADIUM_ROWS", 10);
        let seats_per_row = env_parsed("MATCHDAY_STADIUM_SEATS_PER_ROW", 20);
        let premium_rows = env_row_set("MATCHDAY_STADIUM_PREMIUM_ROWS", &[3, 4, 5]);
        let vip_rows = env_row_set("MATCHDAY_STADIUM_VIP_ROWS", &[1, 2]);

        let stadium = StadiumLayout::new(rows, seats_per_row, premium_rows, vip_rows)
            .unwrap_or_else(|error| {
                tracing::warn!(%error, "invalid stadium layout in environment; using default");
                StadiumLayout::default()
            });

        let multipliers = SeatMultipliers::new([
            (
                SeatType::Standard,
                env_parsed("MATCHDAY_MULTIPLIER_STANDARD", 1.0),
            ),
            (
                SeatType::Premium,
                env_parsed("MATCHDAY_MULTIPLIER_PREMIUM", 1.25),
            ),
            (SeatType::Vip, env_parsed("MATCHDAY_MULTIPLIER_VIP", 1.5)),
        ]);

        Self {
            backend,
            stadium,
            multipliers,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_parsed<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable value; using default");
            default
        }),
        Err(_) => default,
    }
}

/// Parse a comma-separated row list such as `"1,2"`.
fn env_row_set(key: &str, default: &[u32]) -> BTreeSet<u32> {
    match env::var(key) {
        Ok(raw) => {
            let parsed: Result<BTreeSet<u32>, _> = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::parse)
                .collect();
            parsed.unwrap_or_else(|_| {
                tracing::warn!(key, value = %raw, "unparseable row list; using default");
                default.iter().copied().collect()
            })
        },
        Err(_) => default.iter().copied().collect(),
    }
}
