use std::net::SocketAddr;

use serde::Serialize;
use strum::{Display, FromRepr, IntoStaticStr};
use thiserror::Error;

use crate::codec::MessageType;

/// Reason codes carried by the `error_type` field of an ERR message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, FromRepr, IntoStaticStr,
)]
#[repr(i32)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    Unknown = 0,
    VersionMismatch = 1,
    ProcessNotImplemented = 2,
    MessageWithoutType = 3,
    FieldNotFound = 4,
    InterfaceNotFound = 5,
}

impl ErrorCode {
    /// Map a raw wire value, falling back to `Unknown` for values outside the table.
    pub fn from_wire(raw: i32) -> Self {
        Self::from_repr(raw).unwrap_or(Self::Unknown)
    }

    pub fn as_wire(self) -> i32 {
        self as i32
    }
}

/// Top-level error type for the `ethanol-proto` crate.
///
/// Covers codec failures, transport failures, and error replies sent by the
/// remote side. `ethanol-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Codec ───────────────────────────────────────────────────────
    /// Bytes could not be decoded (truncated input, negative length, bad count).
    #[error("Malformed message: {reason}")]
    Malformed { reason: String },

    /// The type tag in the header is not part of the catalog.
    #[error("Unknown message type tag {tag}")]
    UnknownType { tag: i32 },

    /// The header carries a protocol version we do not speak.
    #[error("Protocol version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: &'static str, got: String },

    /// A reply decoded fine but did not carry the field the caller asked for.
    #[error("Field not found in {message_type} reply: {field}")]
    FieldNotFound {
        message_type: MessageType,
        field: &'static str,
    },

    /// A request was refused locally before anything was sent.
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The device does not have the referenced wireless interface.
    #[error("Interface not found: {interface}")]
    InterfaceNotFound { interface: String },

    // ── Transport ───────────────────────────────────────────────────
    /// TCP connect failed, or the connection was reset mid-exchange.
    #[error("Connection to {addr} failed: {source}")]
    ConnectionFailure {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// TLS configuration, certificate, or handshake error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A connect, handshake, or read step exceeded its deadline.
    #[error("{operation} timed out after {timeout_ms}ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The peer closed the connection without sending a reply.
    #[error("Peer {addr} closed the connection without replying")]
    EmptyResponse { addr: SocketAddr },

    /// Generic I/O failure on an established stream.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Remote ──────────────────────────────────────────────────────
    /// The device answered with an ERR message.
    #[error("Device replied with error {code} to message {id}")]
    Remote { code: ErrorCode, id: i32 },
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Returns `true` for failures where no reply was obtained at all.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailure { .. }
                | Self::Tls(_)
                | Self::Timeout { .. }
                | Self::EmptyResponse { .. }
                | Self::Io(_)
        )
    }

    /// The reason code a server sends back when this error aborts a request.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::VersionMismatch { .. } => ErrorCode::VersionMismatch,
            Self::UnknownType { .. } => ErrorCode::MessageWithoutType,
            Self::FieldNotFound { .. } => ErrorCode::FieldNotFound,
            Self::InterfaceNotFound { .. } => ErrorCode::InterfaceNotFound,
            Self::Remote { code, .. } => *code,
            _ => ErrorCode::Unknown,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn error_code_from_wire_falls_back_to_unknown() {
        assert_eq!(ErrorCode::from_wire(2), ErrorCode::ProcessNotImplemented);
        assert_eq!(ErrorCode::from_wire(99), ErrorCode::Unknown);
        assert_eq!(ErrorCode::from_wire(-1), ErrorCode::Unknown);
    }

    #[test]
    fn error_code_display_is_snake_case() {
        assert_eq!(ErrorCode::InterfaceNotFound.to_string(), "interface_not_found");
    }

    #[test]
    fn version_mismatch_maps_to_wire_code() {
        let err = Error::VersionMismatch {
            expected: "1.0.3",
            got: "0.9".into(),
        };
        assert_eq!(err.code(), ErrorCode::VersionMismatch);
        assert!(!err.is_transport());
    }

    #[test]
    fn timeout_is_transport_error() {
        let err = Error::Timeout {
            operation: "connect",
            timeout_ms: 3000,
        };
        assert!(err.is_transport());
        assert_eq!(err.code(), ErrorCode::Unknown);
    }
}
