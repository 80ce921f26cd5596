use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ReaperConfig {
    pub grace_minutes: i64,
    pub interval_minutes: u64,
    pub run_timeout_secs: u64,
    pub page_size: i64,
    pub concurrency: usize,
    pub run_once: bool,
    /// Delete ledger entries whose identity is already gone. Off by default:
    /// such entries are reported as failures and kept.
    pub clean_orphans: bool,
}

/// Upper bound for the grace period and the schedule interval.
pub const MAX_MINUTES: u64 = 366 * 24 * 60;
/// Upper bound for a single run, and so for the run lease.
pub const MAX_RUN_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            grace_minutes: 10,
            interval_minutes: 60,
            run_timeout_secs: 10 * 60,
            page_size: 500,
            concurrency: 16,
            run_once: false,
            clean_orphans: false,
        }
    }
}

impl ReaperConfig {
    pub fn grace_period(&self) -> time::Duration {
        time::Duration::minutes(self.grace_minutes)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }

    fn validate(self) -> anyhow::Result<Self> {
        anyhow::ensure!(self.grace_minutes >= 0, "REAPER_GRACE_MINUTES must not be negative");
        anyhow::ensure!(
            self.grace_minutes.unsigned_abs() <= MAX_MINUTES,
            "REAPER_GRACE_MINUTES must be at most {}",
            MAX_MINUTES
        );
        anyhow::ensure!(self.interval_minutes > 0, "REAPER_INTERVAL_MINUTES must be positive");
        anyhow::ensure!(
            self.interval_minutes <= MAX_MINUTES,
            "REAPER_INTERVAL_MINUTES must be at most {}",
            MAX_MINUTES
        );
        anyhow::ensure!(self.run_timeout_secs > 0, "REAPER_RUN_TIMEOUT_SECS must be positive");
        anyhow::ensure!(
            self.run_timeout_secs <= MAX_RUN_TIMEOUT_SECS,
            "REAPER_RUN_TIMEOUT_SECS must be at most {}",
            MAX_RUN_TIMEOUT_SECS
        );
        anyhow::ensure!(self.page_size > 0, "REAPER_PAGE_SIZE must be positive");
        anyhow::ensure!(self.concurrency > 0, "REAPER_CONCURRENCY must be positive");
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub reaper: ReaperConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let reaper = reaper_from_lookup(|key| std::env::var(key).ok())?;
        Ok(Self {
            database_url,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", std::env::var("DB_MAX_CONNECTIONS").ok(), 10),
            reaper,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(v) => match v.trim().parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %v, "invalid value, using default");
                default
            }
        },
        None => default,
    }
}

fn reaper_from_lookup<F>(lookup: F) -> anyhow::Result<ReaperConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let d = ReaperConfig::default();
    ReaperConfig {
        grace_minutes: parse_or("REAPER_GRACE_MINUTES", lookup("REAPER_GRACE_MINUTES"), d.grace_minutes),
        interval_minutes: parse_or(
            "REAPER_INTERVAL_MINUTES",
            lookup("REAPER_INTERVAL_MINUTES"),
            d.interval_minutes,
        ),
        run_timeout_secs: parse_or(
            "REAPER_RUN_TIMEOUT_SECS",
            lookup("REAPER_RUN_TIMEOUT_SECS"),
            d.run_timeout_secs,
        ),
        page_size: parse_or("REAPER_PAGE_SIZE", lookup("REAPER_PAGE_SIZE"), d.page_size),
        concurrency: parse_or("REAPER_CONCURRENCY", lookup("REAPER_CONCURRENCY"), d.concurrency),
        run_once: parse_or("REAPER_RUN_ONCE", lookup("REAPER_RUN_ONCE"), d.run_once),
        clean_orphans: parse_or(
            "REAPER_CLEAN_ORPHANS",
            lookup("REAPER_CLEAN_ORPHANS"),
            d.clean_orphans,
        ),
    }
    .validate()
}
