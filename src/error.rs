//! Error types for Modbus TCP sessions
//!
//! Every operation reports failure through [`ModbusError`]. Nothing is retried
//! internally; the caller decides whether to adjust inputs, reconnect or abort.

use std::io;

use thiserror::Error;

use crate::constants;

/// Result type alias used throughout the crate.
pub type ModbusResult<T> = Result<T, ModbusError>;

/// Errors produced by validation, framing, transport and decoding.
#[derive(Debug, Error)]
pub enum ModbusError {
    /// Address or count outside the protocol bounds for the operation.
    #[error("Range error: {message}")]
    Range { message: String },

    /// Dial, close or connection-state failure.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Write or read failure in the middle of an exchange.
    ///
    /// The session is left in an indeterminate state and should be
    /// disconnected before reuse.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Reply too short or malformed for the requested type.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Reply that cannot acknowledge the request (empty or mismatched echo).
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A configured write/read/connect deadline elapsed.
    #[error("Timeout: {operation} did not complete within {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    /// The exchange was abandoned through its cancellation token.
    #[error("Exchange cancelled")]
    Cancelled,

    /// The device answered with a Modbus exception reply.
    #[error("Modbus exception: function {function:#04X}, code {code:#04X} ({message})")]
    Exception {
        function: u8,
        code: u8,
        message: String,
    },
}

impl ModbusError {
    /// Create a range error
    pub fn range(message: impl Into<String>) -> Self {
        Self::Range {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Create an exception error from an exception reply.
    pub fn exception(function: u8, code: u8) -> Self {
        Self::Exception {
            function: function & 0x7F,
            code,
            message: exception_description(code).to_string(),
        }
    }

    /// Whether the caller can recover by changing its inputs, without
    /// touching the connection.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Range { .. } | Self::Exception { .. })
    }

    /// Whether the failure happened at the transport level. After one of these
    /// the session should be disconnected before it is used again.
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Io(_) | Self::Timeout { .. } | Self::Cancelled
        )
    }
}

/// Human-readable name of a Modbus exception code.
pub fn exception_description(code: u8) -> &'static str {
    match code {
        constants::EXCEPTION_ILLEGAL_FUNCTION => "Illegal Function",
        constants::EXCEPTION_ILLEGAL_DATA_ADDRESS => "Illegal Data Address",
        constants::EXCEPTION_ILLEGAL_DATA_VALUE => "Illegal Data Value",
        constants::EXCEPTION_SERVER_DEVICE_FAILURE => "Server Device Failure",
        constants::EXCEPTION_ACKNOWLEDGE => "Acknowledge",
        constants::EXCEPTION_SERVER_DEVICE_BUSY => "Server Device Busy",
        constants::EXCEPTION_MEMORY_PARITY_ERROR => "Memory Parity Error",
        constants::EXCEPTION_GATEWAY_PATH_UNAVAILABLE => "Gateway Path Unavailable",
        constants::EXCEPTION_GATEWAY_TARGET_FAILED => "Gateway Target Device Failed to Respond",
        _ => "Unknown Exception",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModbusError::range("address (10000) cannot exceed 9999");
        assert_eq!(
            err.to_string(),
            "Range error: address (10000) cannot exceed 9999"
        );

        let err = ModbusError::timeout("read", 1500);
        assert_eq!(err.to_string(), "Timeout: read did not complete within 1500ms");
    }

    #[test]
    fn test_exception_masks_function_code() {
        let err = ModbusError::exception(0x83, 0x02);
        match err {
            ModbusError::Exception {
                function,
                code,
                ref message,
            } => {
                assert_eq!(function, 0x03);
                assert_eq!(code, 0x02);
                assert_eq!(message, "Illegal Data Address");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_io_conversion() {
        let err: ModbusError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, ModbusError::Io(_)));
        assert!(err.is_transport_error());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_classification() {
        assert!(ModbusError::range("bad").is_recoverable());
        assert!(!ModbusError::range("bad").is_transport_error());
        assert!(ModbusError::Cancelled.is_transport_error());
        assert!(!ModbusError::decode("short").is_transport_error());
        assert_eq!(exception_description(0x7F), "Unknown Exception");
    }
}
