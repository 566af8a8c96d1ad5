//! Configuration for the Ethanol controller binary.
//!
//! One TOML file plus `ETHANOL_` environment overrides, layered with
//! figment over built-in defaults, and translated to
//! `ethanol_core::ControllerConfig`.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ethanol_core::{ControllerConfig, ServerIdentity};
use ethanol_proto::transport::AP_PORT;
use ethanol_proto::{TlsMode, TransportConfig};

/// Prefix for environment overrides. Nested keys use `__`, e.g.
/// `ETHANOL_TIMEOUTS__READ_MS=2000`.
pub const ENV_PREFIX: &str = "ETHANOL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Address the device listener binds.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Reject AP hellos from IPs the network controller never reported.
    #[serde(default)]
    pub require_preregistration: bool,

    #[serde(default)]
    pub tls: TlsSettings,

    #[serde(default)]
    pub timeouts: Timeouts,

    /// CLI presentation defaults.
    #[serde(default)]
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            require_preregistration: false,
            tls: TlsSettings::default(),
            timeouts: Timeouts::default(),
            defaults: Defaults::default(),
        }
    }
}

fn default_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, AP_PORT))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TlsSettings {
    /// Listener certificate (PEM). Defaults to `ethanol.pem` in the
    /// config directory.
    pub cert: Option<PathBuf>,

    /// Private key (PEM); read from `cert` when unset.
    pub key: Option<PathBuf>,

    /// Trust anchor for outbound calls. Pointing this at the controller's
    /// own certificate pins it.
    pub ca_cert: Option<PathBuf>,

    /// Accept any device certificate. Ignored when `ca_cert` is set.
    #[serde(default = "default_insecure")]
    pub insecure: bool,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            cert: None,
            key: None,
            ca_cert: None,
            insecure: default_insecure(),
        }
    }
}

fn default_insecure() -> bool {
    true
}

/// Timeouts, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Timeouts {
    #[serde(default = "default_connect_ms")]
    pub connect_ms: u64,

    #[serde(default = "default_handshake_ms")]
    pub handshake_ms: u64,

    #[serde(default = "default_read_ms")]
    pub read_ms: u64,

    /// Time a station has to confirm a handoff.
    #[serde(default = "default_handoff_ms")]
    pub handoff_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_ms: default_connect_ms(),
            handshake_ms: default_handshake_ms(),
            read_ms: default_read_ms(),
            handoff_ms: default_handoff_ms(),
        }
    }
}

fn default_connect_ms() -> u64 {
    3_000
}
fn default_handshake_ms() -> u64 {
    3_000
}
fn default_read_ms() -> u64 {
    5_000
}
fn default_handoff_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

// ── Paths ───────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    ProjectDirs::from("org", "ethanol", "ethanol").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("ethanol");
            p
        },
        |dirs| dirs.config_dir().to_path_buf(),
    )
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Listener certificate used when `tls.cert` is unset.
pub fn default_cert_path() -> PathBuf {
    config_dir().join("ethanol.pem")
}

// ── Loading ─────────────────────────────────────────────────────────

/// Defaults, then the TOML file at `path`, then `ETHANOL_` variables.
///
/// A missing file contributes nothing.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    Ok(figment_for(path).extract()?)
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

// ── Saving ──────────────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Translation ─────────────────────────────────────────────────────

fn timeout(field: &str, ms: u64) -> Result<Duration, ConfigError> {
    if ms == 0 {
        return Err(ConfigError::Validation {
            field: format!("timeouts.{field}"),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_millis(ms))
}

impl Config {
    /// Trust mode for outbound device calls.
    pub fn tls_mode(&self) -> TlsMode {
        match &self.tls.ca_cert {
            Some(ca) => TlsMode::CustomCa(ca.clone()),
            None if self.tls.insecure => TlsMode::DangerAcceptInvalid,
            None => TlsMode::CustomCa(self.cert_path()),
        }
    }

    pub fn cert_path(&self) -> PathBuf {
        self.tls.cert.clone().unwrap_or_else(default_cert_path)
    }

    /// Build the controller settings, rejecting zero timeouts.
    pub fn to_controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let t = &self.timeouts;
        let transport = TransportConfig {
            tls: self.tls_mode(),
            connect_timeout: timeout("connect_ms", t.connect_ms)?,
            handshake_timeout: timeout("handshake_ms", t.handshake_ms)?,
            read_timeout: timeout("read_ms", t.read_ms)?,
        };
        Ok(ControllerConfig {
            listen: self.listen,
            transport,
            identity: Some(ServerIdentity {
                cert: self.cert_path(),
                key: self.tls.key.clone(),
            }),
            handoff_timeout: timeout("handoff_ms", t.handoff_ms)?,
            require_preregistration: self.require_preregistration,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_without_a_file() {
        Jail::expect_with(|_jail| {
            let cfg = load_config_from(Path::new("missing.toml")).unwrap();
            assert_eq!(cfg, Config::default());
            assert_eq!(cfg.listen.port(), AP_PORT);
            assert!(cfg.tls.insecure);
            assert_eq!(cfg.tls_mode(), TlsMode::DangerAcceptInvalid);
            Ok(())
        });
    }

    #[test]
    fn file_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "ethanol.toml",
                r#"
                listen = "127.0.0.1:9000"

                [tls]
                cert = "/etc/ethanol/server.pem"
                insecure = false

                [timeouts]
                read_ms = 1500
                "#,
            )?;
            jail.set_env("ETHANOL_REQUIRE_PREREGISTRATION", "true");
            jail.set_env("ETHANOL_TIMEOUTS__HANDOFF_MS", "250");

            let cfg = load_config_from(Path::new("ethanol.toml")).unwrap();
            assert_eq!(cfg.listen, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
            assert!(cfg.require_preregistration);
            assert_eq!(cfg.timeouts.read_ms, 1500);
            assert_eq!(cfg.timeouts.handoff_ms, 250);
            assert_eq!(cfg.timeouts.connect_ms, 3_000);
            assert_eq!(
                cfg.tls_mode(),
                TlsMode::CustomCa(PathBuf::from("/etc/ethanol/server.pem"))
            );

            let controller = cfg.to_controller_config().unwrap();
            assert_eq!(controller.handoff_timeout, Duration::from_millis(250));
            assert_eq!(controller.transport.read_timeout, Duration::from_millis(1500));
            let identity = controller.identity.unwrap();
            assert_eq!(identity.key_path(), Path::new("/etc/ethanol/server.pem"));
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut cfg = Config::default();
        cfg.timeouts.read_ms = 0;
        let err = cfg.to_controller_config().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "timeouts.read_ms"));
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.tls.ca_cert = Some(PathBuf::from("/etc/ethanol/ca.pem"));
        cfg.defaults.output = "json".into();

        save_config_to(&cfg, &path).unwrap();
        let loaded: Config = Figment::new()
            .merge(Toml::file(&path))
            .extract()
            .unwrap();
        assert_eq!(loaded, cfg);
    }
}
