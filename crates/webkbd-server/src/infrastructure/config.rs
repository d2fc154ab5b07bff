//! TOML-based configuration for the server.
//!
//! ```toml
//! log_level = "info"
//!
//! [server]
//! bind_address = "0.0.0.0"
//! port = 80
//!
//! [auth]
//! username = "admin"
//! password = "password"
//!
//! [typing]
//! pacing_ms = 40
//!
//! [storage]
//! dir = "/var/lib/webkbd"
//!
//! [keyboard]
//! backend = "hidg"
//! device = "/dev/hidg0"
//! ```
//!
//! Every field has a `#[serde(default = "...")]` helper, so a partial file (or
//! no file at all) yields a working configuration.  Command-line flags are
//! applied on top in `main.rs`.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::auth::Credentials;
use crate::application::preset_store::DEFAULT_MAX_DOCUMENT_BYTES;
use crate::application::type_text::TypingDelays;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `server.bind_address` is not an IP address.
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    /// Unknown keyboard backend name.
    #[error("unknown keyboard backend '{0}' (expected 'log' or 'hidg')")]
    UnknownBackend(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub typing: TypingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub keyboard: KeyboardConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address to bind.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Pause between bind attempts while the network comes up.
    #[serde(default = "default_bind_retry_interval_ms")]
    pub bind_retry_interval_ms: u64,
    /// Give up binding after this long.
    #[serde(default = "default_bind_retry_ceiling_ms")]
    pub bind_retry_ceiling_ms: u64,
}

/// The single account allowed to use the service.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Typing delays in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypingConfig {
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
    #[serde(default = "default_release_settle_ms")]
    pub release_settle_ms: u64,
    #[serde(default = "default_chord_settle_ms")]
    pub chord_settle_ms: u64,
}

/// Where presets are persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
    /// File stem of the preferences file inside `dir`.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,
}

/// Which keystroke emitter to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyboardConfig {
    #[serde(default)]
    pub backend: KeyboardBackend,
    /// HID gadget device, used by the `hidg` backend.
    #[serde(default = "default_device")]
    pub device: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardBackend {
    /// Log key events only.
    #[default]
    Log,
    /// Write reports to a Linux USB HID gadget.
    Hidg,
}

impl FromStr for KeyboardBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(KeyboardBackend::Log),
            "hidg" => Ok(KeyboardBackend::Hidg),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

impl fmt::Display for KeyboardBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyboardBackend::Log => "log",
            KeyboardBackend::Hidg => "hidg",
        })
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    80
}
fn default_bind_retry_interval_ms() -> u64 {
    250
}
fn default_bind_retry_ceiling_ms() -> u64 {
    20_000
}
fn default_username() -> String {
    "admin".to_string()
}
fn default_password() -> String {
    "password".to_string()
}
fn default_pacing_ms() -> u64 {
    40
}
fn default_release_settle_ms() -> u64 {
    10
}
fn default_chord_settle_ms() -> u64 {
    100
}
fn default_storage_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_namespace() -> String {
    "cfg".to_string()
}
fn default_max_document_bytes() -> usize {
    DEFAULT_MAX_DOCUMENT_BYTES
}
fn default_device() -> PathBuf {
    PathBuf::from(crate::infrastructure::keyboard::hid_gadget::DEFAULT_DEVICE)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            typing: TypingConfig::default(),
            storage: StorageConfig::default(),
            keyboard: KeyboardConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            bind_retry_interval_ms: default_bind_retry_interval_ms(),
            bind_retry_ceiling_ms: default_bind_retry_ceiling_ms(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_password(),
        }
    }
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            release_settle_ms: default_release_settle_ms(),
            chord_settle_ms: default_chord_settle_ms(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            namespace: default_namespace(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            backend: KeyboardBackend::default(),
            device: default_device(),
        }
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl ServerConfig {
    /// Socket address to listen on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBindAddress`] if `bind_address` is not
    /// an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind_address
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddress(self.bind_address.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn bind_retry_interval(&self) -> Duration {
        Duration::from_millis(self.bind_retry_interval_ms)
    }

    pub fn bind_retry_ceiling(&self) -> Duration {
        Duration::from_millis(self.bind_retry_ceiling_ms)
    }
}

impl AuthConfig {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }
}

impl TypingConfig {
    pub fn delays(&self) -> TypingDelays {
        TypingDelays {
            release_settle: Duration::from_millis(self.release_settle_ms),
            chord_settle: Duration::from_millis(self.chord_settle_ms),
            pacing: Duration::from_millis(self.pacing_ms),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_server_listens_on_port_80_all_interfaces() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(
            cfg.server.socket_addr().unwrap(),
            "0.0.0.0:80".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(cfg.server.bind_retry_interval(), Duration::from_millis(250));
        assert_eq!(cfg.server.bind_retry_ceiling(), Duration::from_secs(20));
    }

    #[test]
    fn test_default_typing_delays_match_use_case_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.typing.delays(), TypingDelays::default());
    }

    #[test]
    fn test_default_storage_and_keyboard() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.storage.namespace, "cfg");
        assert_eq!(cfg.storage.max_document_bytes, 8192);
        assert_eq!(cfg.keyboard.backend, KeyboardBackend::Log);
        assert_eq!(cfg.keyboard.device, PathBuf::from("/dev/hidg0"));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_default_credentials_are_admin_password() {
        let creds = AppConfig::default().auth.credentials();
        assert!(creds.matches("admin", "password"));
    }

    #[test]
    fn test_auth_debug_hides_password() {
        let shown = format!("{:?}", AuthConfig::default());
        assert!(!shown.contains("\"password\""));
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let text = r#"
            [server]
            port = 8080

            [keyboard]
            backend = "hidg"
        "#;

        // Act
        let cfg: AppConfig = toml::from_str(text).unwrap();

        // Assert
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind_address, "0.0.0.0");
        assert_eq!(cfg.keyboard.backend, KeyboardBackend::Hidg);
        assert_eq!(cfg.keyboard.device, PathBuf::from("/dev/hidg0"));
    }

    #[test]
    fn test_unknown_backend_in_toml_is_parse_error() {
        let result: Result<AppConfig, _> = toml::from_str("[keyboard]\nbackend = \"bluetooth\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_bind_address_is_reported() {
        let server = ServerConfig {
            bind_address: "not.an.ip".into(),
            ..ServerConfig::default()
        };
        assert!(matches!(
            server.socket_addr(),
            Err(ConfigError::InvalidBindAddress(_))
        ));
    }

    #[test]
    fn test_keyboard_backend_from_str() {
        assert_eq!("log".parse::<KeyboardBackend>().unwrap(), KeyboardBackend::Log);
        assert_eq!("HIDG".parse::<KeyboardBackend>().unwrap(), KeyboardBackend::Hidg);
        assert!("usb".parse::<KeyboardBackend>().is_err());
        assert_eq!(KeyboardBackend::Hidg.to_string(), "hidg");
    }

    // ── Loading from disk ─────────────────────────────────────────────────────

    #[test]
    fn test_missing_file_yields_defaults() {
        let path = std::env::temp_dir().join(format!("webkbd_missing_{}.toml", Uuid::new_v4()));
        assert_eq!(load_config(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_file_is_loaded() {
        // Arrange
        let path = std::env::temp_dir().join(format!("webkbd_cfg_{}.toml", Uuid::new_v4()));
        std::fs::write(&path, "log_level = \"debug\"\n[auth]\nusername = \"ops\"\n").unwrap();

        // Act
        let cfg = load_config(&path).unwrap();

        // Assert
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.auth.username, "ops");
        assert_eq!(cfg.auth.password, "password");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let path = std::env::temp_dir().join(format!("webkbd_bad_{}.toml", Uuid::new_v4()));
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
        std::fs::remove_file(&path).ok();
    }
}
