//! Configuration management for OSC Deck
//!
//! Sender settings are kept as three single-line files in the data directory
//! (`sender_ip`, `sender_port`, `listener_port`). Engine tuning lives in an
//! optional `engine.yaml` next to them.

pub mod watcher;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, warn};

pub const SENDER_IP_FILE: &str = "sender_ip";
pub const SENDER_PORT_FILE: &str = "sender_port";
pub const LISTENER_PORT_FILE: &str = "listener_port";
pub const ENGINE_FILE: &str = "engine.yaml";

/// Files whose change requires a sender restart
pub const SENDER_FILES: [&str; 3] = [SENDER_IP_FILE, SENDER_PORT_FILE, LISTENER_PORT_FILE];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{name} is not a valid port: '{value}'")]
    InvalidPort { name: &'static str, value: String },
    #[error("failed to parse {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Where outgoing OSC goes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSettings {
    pub sender_ip: String,
    pub sender_port: u16,
    /// Stored for a future listener; never bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listener_port: Option<u16>,
}

impl SenderSettings {
    /// Settings that leave the transport disabled
    pub fn unconfigured() -> Self {
        Self {
            sender_ip: String::new(),
            sender_port: 0,
            listener_port: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.sender_ip.is_empty() && self.sender_port != 0
    }

    /// Build from raw text values
    pub fn parse(ip: &str, port: &str, listener: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            sender_ip: ip.trim().to_string(),
            sender_port: parse_port("sender_port", port)?,
            listener_port: listener.map(|l| parse_port("listener_port", l)).transpose()?,
        })
    }

    /// Load from the data directory
    ///
    /// A missing `sender_ip` or `sender_port` file yields unconfigured
    /// settings. A malformed `listener_port` is ignored since nothing binds it.
    pub async fn load(dir: &Path) -> Result<Self, ConfigError> {
        let ip = read_first_line(&dir.join(SENDER_IP_FILE)).await?;
        let port = read_first_line(&dir.join(SENDER_PORT_FILE)).await?;
        debug!("Sender files present: ip={} port={}", ip.is_some(), port.is_some());

        let (Some(ip), Some(port)) = (ip, port) else {
            return Ok(Self::unconfigured());
        };

        let listener_port = match read_first_line(&dir.join(LISTENER_PORT_FILE)).await? {
            Some(raw) => match parse_port("listener_port", &raw) {
                Ok(port) => Some(port),
                Err(e) => {
                    warn!("Ignoring listener port: {}", e);
                    None
                },
            },
            None => None,
        };

        Ok(Self {
            sender_ip: ip.trim().to_string(),
            sender_port: parse_port("sender_port", &port)?,
            listener_port,
        })
    }

    /// Write the three settings files, creating the directory if needed
    pub async fn save(&self, dir: &Path) -> Result<(), ConfigError> {
        fs::create_dir_all(dir).await.map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = vec![
            (SENDER_IP_FILE, self.sender_ip.clone()),
            (SENDER_PORT_FILE, self.sender_port.to_string()),
        ];
        if let Some(listener) = self.listener_port {
            files.push((LISTENER_PORT_FILE, listener.to_string()));
        }

        for (name, value) in files {
            let path = dir.join(name);
            fs::write(&path, format!("{}\n", value))
                .await
                .map_err(|source| ConfigError::Io { path, source })?;
        }
        Ok(())
    }
}

/// Engine tuning, all fields optional
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Delay before a momentary button returns to 0
    pub momentary_delay_ms: u64,
    /// TrueType font used to paint labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Starting size of the label fit search
    pub font_size: u32,
    /// Smallest size the fit search will go down to
    pub min_font_size: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            momentary_delay_ms: 250,
            font_path: None,
            font_size: 16,
            min_font_size: 1,
        }
    }
}

impl EngineSettings {
    /// Load `engine.yaml` from the data directory, defaults when absent
    pub async fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(ENGINE_FILE);
        match fs::read_to_string(&path).await {
            Ok(content) => Self::from_yaml(&content).map_err(|source| ConfigError::Yaml { path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn momentary_delay(&self) -> Duration {
        Duration::from_millis(self.momentary_delay_ms)
    }
}

fn parse_port(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse::<u16>().map_err(|_| ConfigError::InvalidPort {
        name,
        value: raw.trim().to_string(),
    })
}

/// First line of a file, `None` if the file does not exist
async fn read_first_line(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(content.lines().next().unwrap_or_default().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
