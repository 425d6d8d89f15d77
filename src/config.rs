//! # Session Configuration
//!
//! Connection target and protocol knobs for one [`ModbusSession`](crate::ModbusSession).
//!
//! ## Defaults
//!
//! - **Port**: 502 (Modbus TCP)
//! - **Unit ID**: 1
//! - **Byte order**: big-endian, applied to every 16-bit field on the wire
//! - **Deadlines**: none; a silent device stalls the caller until a
//!   timeout is configured
//! - **Write echo verification**: off; any non-empty reply acknowledges a write

use std::time::Duration;

use crate::bytes::ByteOrder;

/// Modbus TCP default port.
pub const DEFAULT_TCP_PORT: u16 = 502;

/// Default unit identifier.
pub const DEFAULT_UNIT_ID: u8 = 1;

/// Default host for [`SessionConfig::default`].
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Configuration for a Modbus TCP session.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use voltage_mbap::{ByteOrder, SessionConfig};
///
/// let config = SessionConfig::new("192.168.1.20", 502)
///     .with_unit_id(3)
///     .with_byte_order(ByteOrder::BigEndian)
///     .with_timeout(Duration::from_secs(2));
///
/// assert_eq!(config.unit_id, 3);
/// assert_eq!(config.address(), "192.168.1.20:502");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Device host name or IP address.
    pub host: String,
    /// Device TCP port.
    pub port: u16,
    /// Unit identifier written into every MBAP header.
    pub unit_id: u8,
    /// Byte order for header and payload fields.
    pub byte_order: ByteOrder,
    /// Deadline applied separately to each frame write and each reply read.
    pub timeout: Option<Duration>,
    /// Deadline applied to dialing the device.
    pub connect_timeout: Option<Duration>,
    /// Require write acknowledgements to echo the request.
    pub verify_write_echo: bool,
}

impl SessionConfig {
    /// Create a configuration for `host:port` with default settings.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// Set the unit identifier.
    pub fn with_unit_id(mut self, unit_id: u8) -> Self {
        self.unit_id = unit_id;
        self
    }

    /// Set the byte order.
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the write/read deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the dial deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Enable or disable write acknowledgement echo checks.
    pub fn with_write_echo_verification(mut self, enabled: bool) -> Self {
        self.verify_write_echo = enabled;
        self
    }

    /// `host:port` of the device.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_TCP_PORT,
            unit_id: DEFAULT_UNIT_ID,
            byte_order: ByteOrder::BigEndian,
            timeout: None,
            connect_timeout: None,
            verify_write_echo: false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_TCP_PORT);
        assert_eq!(config.unit_id, DEFAULT_UNIT_ID);
        assert_eq!(config.byte_order, ByteOrder::BigEndian);
        assert!(config.timeout.is_none());
        assert!(config.connect_timeout.is_none());
        assert!(!config.verify_write_echo);
    }

    #[test]
    fn test_builder_pattern() {
        let config = SessionConfig::new("plc.local", 1502)
            .with_unit_id(17)
            .with_byte_order(ByteOrder::LittleEndian)
            .with_timeout(Duration::from_millis(750))
            .with_connect_timeout(Duration::from_secs(3))
            .with_write_echo_verification(true);

        assert_eq!(config.address(), "plc.local:1502");
        assert_eq!(config.unit_id, 17);
        assert_eq!(config.byte_order, ByteOrder::LittleEndian);
        assert_eq!(config.timeout, Some(Duration::from_millis(750)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
        assert!(config.verify_write_echo);
    }
}
