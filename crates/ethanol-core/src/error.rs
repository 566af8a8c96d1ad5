// ── Core error types ──
//
// Domain errors from ethanol-core. Callers never see raw codec or
// transport failures; the `From<ethanol_proto::Error>` impl translates
// them into the variants below.

use ethanol_proto::ErrorCode;
use thiserror::Error;

use crate::association::{AssociationEvent, AssociationState};
use crate::model::MacAddress;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Device communication ─────────────────────────────────────────
    #[error("Cannot reach device at {addr}: {reason}")]
    DeviceUnreachable { addr: String, reason: String },

    #[error("Device did not answer within {timeout_ms} ms ({operation})")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },

    #[error("Device replied with error: {code}")]
    DeviceError { code: ErrorCode },

    #[error("Protocol error: {message}")]
    Protocol { message: String, code: ErrorCode },

    #[error("Interface not found: {interface}")]
    InterfaceNotFound { interface: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Fleet errors ─────────────────────────────────────────────────
    #[error("Network with SSID {ssid:?} already exists")]
    DuplicateSsid { ssid: String },

    #[error("Network not found: {ssid}")]
    NetworkNotFound { ssid: String },

    #[error("AP not found: {ip}")]
    ApNotFound { ip: String },

    #[error("VAP not found: {mac}")]
    VapNotFound { mac: MacAddress },

    #[error("Station not found: {identifier}")]
    StationNotFound { identifier: String },

    #[error("VAP {mac} has no SSID; set one before enabling it")]
    SsidRequired { mac: MacAddress },

    #[error("AP at {ip} was not announced by the network controller")]
    NotPreregistered { ip: String },

    // ── Association and handoff ──────────────────────────────────────
    #[error("Station {station} at {bssid}: {event} is not valid from {from}")]
    InvalidTransition {
        station: MacAddress,
        bssid: MacAddress,
        from: AssociationState,
        event: AssociationEvent,
    },

    #[error("VAP {target} refused to admit station {station}")]
    HandoffRejected {
        station: MacAddress,
        target: MacAddress,
    },

    #[error("Station {station} did not move to {target} within {timeout_ms} ms")]
    HandoffTimeout {
        station: MacAddress,
        target: MacAddress,
        timeout_ms: u64,
    },

    #[error("Handoff not possible: {reason}")]
    HandoffInvalid { reason: String },

    // ── Configuration and internal errors ────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Reason code used when this error is reported back to a device.
    pub fn wire_code(&self) -> ErrorCode {
        match self {
            Self::DeviceError { code } | Self::Protocol { code, .. } => *code,
            Self::InterfaceNotFound { .. } => ErrorCode::InterfaceNotFound,
            _ => ErrorCode::Unknown,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ethanol_proto::Error> for CoreError {
    fn from(err: ethanol_proto::Error) -> Self {
        use ethanol_proto::Error as E;
        match err {
            E::ConnectionFailure { addr, source } => CoreError::DeviceUnreachable {
                addr: addr.to_string(),
                reason: source.to_string(),
            },
            E::EmptyResponse { addr } => CoreError::DeviceUnreachable {
                addr: addr.to_string(),
                reason: "connection closed without a reply".into(),
            },
            E::Tls(msg) => CoreError::DeviceUnreachable {
                addr: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            E::Io(e) => CoreError::DeviceUnreachable {
                addr: String::new(),
                reason: e.to_string(),
            },
            E::Timeout {
                operation,
                timeout_ms,
            } => CoreError::Timeout {
                operation,
                timeout_ms,
            },
            E::Remote { code, .. } => CoreError::DeviceError { code },
            E::InterfaceNotFound { interface } => CoreError::InterfaceNotFound { interface },
            E::InvalidRequest { reason } => CoreError::ValidationFailed { message: reason },
            other @ (E::Malformed { .. }
            | E::UnknownType { .. }
            | E::VersionMismatch { .. }
            | E::FieldNotFound { .. }) => CoreError::Protocol {
                code: other.code(),
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethanol_proto::MessageType;

    #[test]
    fn remote_error_keeps_its_code() {
        let err = CoreError::from(ethanol_proto::Error::Remote {
            code: ErrorCode::ProcessNotImplemented,
            id: 3,
        });
        assert_eq!(err.wire_code(), ErrorCode::ProcessNotImplemented);
    }

    #[test]
    fn missing_field_becomes_protocol_error() {
        let err = CoreError::from(ethanol_proto::Error::FieldNotFound {
            message_type: MessageType::GetCpu,
            field: "value",
        });
        assert!(matches!(
            err,
            CoreError::Protocol {
                code: ErrorCode::FieldNotFound,
                ..
            }
        ));
    }

    #[test]
    fn fleet_errors_report_unknown_on_the_wire() {
        let err = CoreError::DuplicateSsid {
            ssid: "lab".into(),
        };
        assert_eq!(err.wire_code(), ErrorCode::Unknown);
    }
}
