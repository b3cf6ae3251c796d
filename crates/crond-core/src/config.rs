use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

pub const DEFAULT_PORT: u16 = 9999;
pub const DEFAULT_IP: &str = "127.0.0.1";
pub const DEFAULT_CONFIG_PATH: &str = "crond.toml";
pub const DEFAULT_JOBS_CONFIG: &str = "jobs-config.toml";
pub const DEFAULT_PID_PATH: &str = "crond.pid";
/// Cadence of the one-shot sweep entry registered at bootstrap.
pub const SWEEP_SCHEDULE: &str = "@every 1s";
/// Cadence of the daemon's own liveness metric.
pub const HEARTBEAT_SCHEDULE: &str = "@every 1m";

/// Runtime configuration (crond.toml + CROND_* env overrides).
///
/// Read once at startup. `/config/reload` reloads the job table only, never
/// these settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrondConfig {
    #[serde(default = "default_ip")]
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub bk_biz_id: i64,
    /// OS user that jobs execute as. `None` runs them as the daemon's own user.
    #[serde(default)]
    pub jobs_user: Option<String>,
    /// Path of the persisted jobs document.
    #[serde(default = "default_jobs_config")]
    pub jobs_config: String,
    #[serde(default = "default_pid_path")]
    pub pid_path: String,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub beat: BeatConfig,
}

impl Default for CrondConfig {
    fn default() -> Self {
        Self {
            ip: default_ip(),
            port: default_port(),
            bk_biz_id: 0,
            jobs_user: None,
            jobs_config: default_jobs_config(),
            pid_path: default_pid_path(),
            log: LogConfig::default(),
            beat: BeatConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter directive when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "bool_true")]
    pub console: bool,
    /// Directory for daily-rotated log files. No file output when unset.
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: true,
            dir: None,
            max_files: default_max_files(),
        }
    }
}

/// Where job events and daemon metrics are delivered.
///
/// With neither URL set, events only go to the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatConfig {
    #[serde(default)]
    pub event_url: Option<String>,
    #[serde(default)]
    pub metrics_url: Option<String>,
    #[serde(default = "default_beat_timeout")]
    pub timeout_secs: u64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            event_url: None,
            metrics_url: None,
            timeout_secs: default_beat_timeout(),
        }
    }
}

fn default_ip() -> String {
    DEFAULT_IP.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_jobs_config() -> String {
    DEFAULT_JOBS_CONFIG.to_string()
}
fn default_pid_path() -> String {
    DEFAULT_PID_PATH.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_max_files() -> usize {
    7
}
fn default_beat_timeout() -> u64 {
    5
}
fn bool_true() -> bool {
    true
}

impl CrondConfig {
    /// Load config from a TOML file with CROND_* env var overrides.
    ///
    /// Resolution order for the file: explicit path, `CROND_CONFIG`, then
    /// `./crond.toml`. Nested keys are addressed with a double underscore
    /// (`CROND_BEAT__EVENT_URL`).
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("CROND_CONFIG").ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

        if !std::path::Path::new(&path).exists() {
            return Err(CoreError::Config(format!("config file not found: {path}")));
        }

        Figment::from(Serialized::defaults(CrondConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CROND_").ignore(&["CONFIG"]).split("__"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))
    }

    /// `ip:port` the control service listens on and the CLI dials.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn file_values_and_defaults_merge() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "crond.toml",
                r#"
                port = 9200
                bk_biz_id = 42
                jobs_user = "mysql"

                [beat]
                event_url = "http://127.0.0.1:9201/event"
                "#,
            )?;
            let cfg = CrondConfig::load(Some("crond.toml")).expect("load");
            assert_eq!(cfg.port, 9200);
            assert_eq!(cfg.ip, DEFAULT_IP);
            assert_eq!(cfg.bk_biz_id, 42);
            assert_eq!(cfg.jobs_user.as_deref(), Some("mysql"));
            assert_eq!(cfg.jobs_config, DEFAULT_JOBS_CONFIG);
            assert_eq!(
                cfg.beat.event_url.as_deref(),
                Some("http://127.0.0.1:9201/event")
            );
            assert!(cfg.beat.metrics_url.is_none());
            assert_eq!(cfg.log.level, "info");
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("crond.toml", "port = 9200")?;
            jail.set_env("CROND_PORT", "9300");
            jail.set_env("CROND_LOG__LEVEL", "debug");
            let cfg = CrondConfig::load(Some("crond.toml")).expect("load");
            assert_eq!(cfg.port, 9300);
            assert_eq!(cfg.log.level, "debug");
            assert_eq!(cfg.listen_addr(), "127.0.0.1:9300");
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_an_error() {
        Jail::expect_with(|_jail| {
            let err = CrondConfig::load(Some("absent.toml")).unwrap_err();
            assert!(err.to_string().contains("absent.toml"));
            Ok(())
        });
    }
}
