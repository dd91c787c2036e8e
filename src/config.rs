use std::env;

use chrono::FixedOffset;
use dotenvy::dotenv;

use crate::scan::ScanPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,

    // Scan reconciliation policy
    pub min_session_secs: u64,
    pub debounce_window_secs: u64,
    pub debounce_ttl_secs: u64,
    pub reporting_utc_offset_hours: i32,

    // Storage
    pub store_timeout_secs: u64,

    // Rate limiting
    pub rate_scan_per_min: u32,
    pub rate_api_per_min: u32,

    pub api_prefix: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: &str) -> T
where
    T::Err: std::fmt::Debug,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|e| panic!("{key} must be a valid value: {e:?}"))
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),

            min_session_secs: env_or("MIN_SESSION_SECS", "10"),
            debounce_window_secs: env_or("DEBOUNCE_WINDOW_SECS", "2"),
            debounce_ttl_secs: env_or("DEBOUNCE_TTL_SECS", "20"),
            reporting_utc_offset_hours: env_or("REPORTING_UTC_OFFSET_HOURS", "0"),

            store_timeout_secs: env_or("STORE_TIMEOUT_SECS", "5"),

            rate_scan_per_min: env_or("RATE_SCAN_PER_MIN", "120"),
            rate_api_per_min: env_or("RATE_API_PER_MIN", "1000"),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
        }
    }

    pub fn scan_policy(&self) -> ScanPolicy {
        let offset = FixedOffset::east_opt(self.reporting_utc_offset_hours * 3600)
            .expect("REPORTING_UTC_OFFSET_HOURS out of range");

        ScanPolicy {
            min_session_secs: self.min_session_secs,
            debounce_window_secs: self.debounce_window_secs,
            debounce_ttl_secs: self.debounce_ttl_secs,
            reporting_offset: offset,
        }
    }
}
