//! # Byte Order Handling
//!
//! Byte order policy applied to every multi-byte field a session puts on the
//! wire: MBAP header fields, addresses, counts and register payloads alike.
//!
//! Modbus TCP deployments use big-endian (network byte order). Little-endian is
//! kept as a session setting for devices and simulators that speak it; it is
//! never the default.
//!
//! For 16-bit value `0x1234`:
//! - `BigEndian (AB)`: \[0x12, 0x34\]
//! - `LittleEndian (BA)`: \[0x34, 0x12\]

use std::fmt;

use bytes::BufMut;

/// Byte order of 16-bit fields in frames and register payloads.
///
/// # Example
///
/// ```rust
/// use voltage_mbap::ByteOrder;
///
/// let order = ByteOrder::from_str("ABCD").unwrap();
/// assert_eq!(order, ByteOrder::BigEndian);
/// assert_eq!(order.u16_to_bytes(0x1234), [0x12, 0x34]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Big-endian: AB (most significant byte first)
    ///
    /// Network byte order, mandated by Modbus TCP.
    #[default]
    BigEndian,

    /// Little-endian: BA (least significant byte first)
    LittleEndian,
}

impl ByteOrder {
    /// Convert from common string formats.
    ///
    /// - "AB", "ABCD", "BE", "BIG", "BIG_ENDIAN" → BigEndian
    /// - "BA", "DCBA", "LE", "LITTLE", "LITTLE_ENDIAN" → LittleEndian
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        // Normalize in single pass: uppercase + remove hyphens/underscores
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "AB" | "ABCD" | "BE" | "BIG" | "BIGENDIAN" => Some(Self::BigEndian),
            "BA" | "DCBA" | "LE" | "LITTLE" | "LITTLEENDIAN" => Some(Self::LittleEndian),
            _ => None,
        }
    }

    /// Get descriptive name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BigEndian => "AB (Big-Endian)",
            Self::LittleEndian => "BA (Little-Endian)",
        }
    }

    /// Check if this is big-endian.
    #[inline]
    pub fn is_big_endian(&self) -> bool {
        matches!(self, Self::BigEndian)
    }

    /// Serialize a 16-bit value.
    #[inline]
    pub fn u16_to_bytes(&self, value: u16) -> [u8; 2] {
        match self {
            Self::BigEndian => value.to_be_bytes(),
            Self::LittleEndian => value.to_le_bytes(),
        }
    }

    /// Reassemble a 16-bit value from two wire bytes.
    #[inline]
    pub fn u16_from_bytes(&self, bytes: [u8; 2]) -> u16 {
        match self {
            Self::BigEndian => u16::from_be_bytes(bytes),
            Self::LittleEndian => u16::from_le_bytes(bytes),
        }
    }

    /// Append a 16-bit value to a buffer.
    #[inline]
    pub fn put_u16<B: BufMut>(&self, buf: &mut B, value: u16) {
        match self {
            Self::BigEndian => buf.put_u16(value),
            Self::LittleEndian => buf.put_u16_le(value),
        }
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
