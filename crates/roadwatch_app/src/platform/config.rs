use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use roadwatch_core::{ControllerOptions, ErrorRecovery};
use roadwatch_engine::{parse_base_url, ClientSettings, ReconnectPolicy};
use roadwatch_logging::rw_info;
use serde::{Deserialize, Serialize};

use crate::Cli;

const DEFAULT_CONFIG_FILENAME: &str = "roadwatch.ron";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecoveryMode {
    #[default]
    Discard,
    Retain,
}

/// On-disk client configuration. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub upload_timeout_secs: u64,
    pub reconnect_delay_ms: u64,
    pub reconnect_jitter_ms: u64,
    pub notification_ttl_ms: u64,
    /// Interval for `/api/status` polling; absent disables it.
    pub status_poll_ms: Option<u64>,
    pub error_recovery: RecoveryMode,
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let settings = ClientSettings::default();
        Self {
            server: settings.base_url.to_string(),
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            upload_timeout_secs: settings.upload_timeout.as_secs(),
            reconnect_delay_ms: duration_ms(settings.reconnect.delay),
            reconnect_jitter_ms: duration_ms(settings.reconnect.jitter),
            notification_ttl_ms: duration_ms(settings.notification_ttl),
            status_poll_ms: None,
            error_recovery: RecoveryMode::default(),
            download_dir: settings.download_dir,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl ClientConfig {
    /// Loads `explicit` if given, otherwise `./roadwatch.ron` if it exists,
    /// otherwise the defaults. An explicit path that is missing is an error.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILENAME);
                if !fallback.exists() {
                    return Ok(Self::default());
                }
                fallback
            }
        };
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        rw_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(ron::from_str(content)?)
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(server) = &cli.server {
            self.server = server.clone();
        }
        if let Some(dir) = &cli.download_dir {
            self.download_dir = dir.clone();
        }
    }

    pub fn client_settings(&self) -> anyhow::Result<ClientSettings> {
        let base_url = parse_base_url(&self.server)
            .with_context(|| format!("invalid server {:?}", self.server))?;
        Ok(ClientSettings {
            base_url,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            upload_timeout: Duration::from_secs(self.upload_timeout_secs),
            reconnect: ReconnectPolicy {
                delay: Duration::from_millis(self.reconnect_delay_ms),
                jitter: Duration::from_millis(self.reconnect_jitter_ms),
            },
            notification_ttl: Duration::from_millis(self.notification_ttl_ms),
            status_poll_interval: self
                .status_poll_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            download_dir: self.download_dir.clone(),
        })
    }

    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            error_recovery: match self.error_recovery {
                RecoveryMode::Discard => ErrorRecovery::Discard,
                RecoveryMode::Retain => ErrorRecovery::Retain,
            },
            status_poll: self.status_poll_ms.is_some_and(|ms| ms > 0),
        }
    }
}
