use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub home_assistant: HomeAssistantConfig,
    pub schedule: ScheduleConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            storage: StorageConfig::from_env(),
            home_assistant: HomeAssistantConfig::from_env(),
            schedule: ScheduleConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:    {}:{}", self.server.host, self.server.port);
        tracing::info!("  storage:   data_dir={}", self.storage.data_dir.display());
        tracing::info!(
            "  ha:        url={}, token={}",
            self.home_assistant.url,
            if self.home_assistant.token.is_some() { "(set)" } else { "(none)" }
        );
        tracing::info!(
            "  schedule:  tz={}, weekday_hour={}, weekend_hour={}, poll_interval={}s",
            self.schedule.timezone,
            self.schedule.weekday_hour,
            self.schedule.weekend_hour,
            self.schedule.poll_interval_secs
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "server": { "host": self.server.host, "port": self.server.port },
            "storage": { "data_dir": self.storage.data_dir },
            "home_assistant": {
                "url": self.home_assistant.url,
                "token_configured": self.home_assistant.token.is_some(),
            },
            "schedule": {
                "timezone": self.schedule.timezone,
                "weekday_hour": self.schedule.weekday_hour,
                "weekend_hour": self.schedule.weekend_hour,
                "poll_interval_secs": self.schedule.poll_interval_secs,
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: env_u16("PORT", 8000),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            data_dir: PathBuf::from(env_or("DATA_DIR", "data")),
        }
    }
}

// ── Home Assistant ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    /// Base URL of the Home Assistant instance.
    pub url: String,
    /// Long-lived access token. Missing token disables notifications.
    pub token: Option<String>,
}

impl HomeAssistantConfig {
    fn from_env() -> Self {
        Self {
            url: env_or("HA_URL", "http://localhost:8123"),
            token: env_opt("HA_TOKEN"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.token.is_some()
    }
}

// ── Schedule ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone name all scheduling runs in, fixed at deploy time.
    pub timezone: String,
    /// Canonical notification hour on Mon–Fri.
    pub weekday_hour: u32,
    /// Canonical notification hour on Sat–Sun.
    pub weekend_hour: u32,
    /// Wall-clock sleep between poller ticks.
    pub poll_interval_secs: u64,
}

impl ScheduleConfig {
    fn from_env() -> Self {
        Self {
            timezone: env_or("CHORES_TIMEZONE", "Europe/Stockholm"),
            weekday_hour: env_u32("WEEKDAY_NOTIFY_HOUR", 16),
            weekend_hour: env_u32("WEEKEND_NOTIFY_HOUR", 8),
            poll_interval_secs: env_u64("POLL_INTERVAL_SECS", 30),
        }
    }
}
