//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ethanol_config::ConfigError;
use ethanol_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach device at {addr}")]
    #[diagnostic(
        code(ethanol::connection_failed),
        help(
            "Check that the device agent is running and listening.\n\
             Reason: {reason}\n\
             Devices usually ship self-signed certificates; try --insecure (-k)."
        )
    )]
    ConnectionFailed { addr: String, reason: String },

    #[error("Device did not answer within {timeout_ms} ms ({operation})")]
    #[diagnostic(
        code(ethanol::timeout),
        help("Increase the timeout with --timeout or check the device's load.")
    )]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    // ── Device replies ───────────────────────────────────────────────
    #[error("Device rejected the request: {message}")]
    #[diagnostic(code(ethanol::device_error))]
    DeviceError { message: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(code(ethanol::not_found))]
    NotFound {
        resource_type: String,
        identifier: String,
    },

    #[error("{resource_type} '{identifier}' already exists")]
    #[diagnostic(code(ethanol::conflict))]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ethanol::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Server certificate not found at {path}")]
    #[diagnostic(
        code(ethanol::no_certificate),
        help(
            "Point tls.cert in the config file (or --cert) at a PEM file\n\
             holding the listener certificate and, unless tls.key is set, its key."
        )
    )]
    NoCertificate { path: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(ethanol::config_exists),
        help("Pass --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(ethanol::config))]
    Config(#[from] ConfigError),

    // ── Internal ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(ethanol::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {message}")]
    #[diagnostic(code(ethanol::serialization))]
    Serialization { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::ConfigExists { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceUnreachable { addr, reason } => {
                CliError::ConnectionFailed { addr, reason }
            }

            CoreError::Timeout {
                operation,
                timeout_ms,
            } => CliError::Timeout {
                operation,
                timeout_ms,
            },

            CoreError::InterfaceNotFound { interface } => CliError::NotFound {
                resource_type: "interface".into(),
                identifier: interface,
            },

            CoreError::NetworkNotFound { ssid } => CliError::NotFound {
                resource_type: "network".into(),
                identifier: ssid,
            },

            CoreError::ApNotFound { ip } => CliError::NotFound {
                resource_type: "AP".into(),
                identifier: ip,
            },

            CoreError::VapNotFound { mac } => CliError::NotFound {
                resource_type: "VAP".into(),
                identifier: mac.to_string(),
            },

            CoreError::StationNotFound { identifier } => CliError::NotFound {
                resource_type: "station".into(),
                identifier,
            },

            CoreError::DuplicateSsid { ssid } => CliError::Conflict {
                resource_type: "network".into(),
                identifier: ssid,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::DeviceError { code } => CliError::DeviceError {
                message: code.to_string(),
            },

            other => CliError::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<ethanol_proto::Error> for CliError {
    fn from(err: ethanol_proto::Error) -> Self {
        CoreError::from(err).into()
    }
}
