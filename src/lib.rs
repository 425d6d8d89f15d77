//! # Voltage MBAP - Serialized Modbus TCP Session Client
//!
//! **Author:** Evan Liu <liuyifanz.1996@gmail.com>
//! **License:** MIT
//!
//! A Modbus TCP client built around one exclusively owned connection per
//! [`ModbusSession`]. Every request allocates a transaction id, writes one
//! frame and reads one reply while holding the session lock, so a session can
//! be shared across tasks without replies crossing between callers.
//!
//! ## Features
//!
//! - **Typed operations**: coils and discrete inputs as `bool`, registers as `i16`
//! - **Protocol bounds**: address and count validated before anything is sent
//! - **Byte order knob**: big-endian by default, little-endian on request
//! - **Optional deadlines**: per write/read timeouts and cancellation tokens
//! - **Opt-in write echo verification**
//!
//! ## Supported Function Codes
//!
//! | Code | Function | Client |
//! |------|----------|--------|
//! | 0x01 | Read Coils | ✅ |
//! | 0x02 | Read Discrete Inputs | ✅ |
//! | 0x03 | Read Holding Registers | ✅ |
//! | 0x04 | Read Input Registers | ✅ |
//! | 0x05 | Write Single Coil | ✅ |
//! | 0x06 | Write Single Register | ✅ |
//! | 0x0F | Write Multiple Coils | ✅ |
//! | 0x10 | Write Multiple Registers | ✅ |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voltage_mbap::{ModbusClient, ModbusResult, ModbusSession, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> ModbusResult<()> {
//!     let session = ModbusSession::open(SessionConfig::new("127.0.0.1", 502)).await?;
//!
//!     let values = session.read_holding_registers(0, 10).await?;
//!     println!("Read registers: {:?}", values);
//!
//!     session.write_single_register(100, 0x1234).await?;
//!
//!     session.disconnect().await
//! }
//! ```

// ============================================================================
// Core modules
// ============================================================================

/// Core error types and result handling
pub mod error;

/// Modbus TCP protocol constants
pub mod constants;

/// Byte order policy for wire fields
pub mod bytes;

/// Bit packing, register words and reply decoding
pub mod codec;

/// Address and count validation
pub mod validate;

/// MBAP frame construction
pub mod frame;

/// Session configuration
pub mod config;

/// Connection ownership and serialized exchanges
pub mod session;

/// The eight data-access operations
pub mod client;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// === Async runtime (users can use voltage_mbap::tokio) ===
pub use tokio;

// === Core client API ===
pub use client::ModbusClient;
pub use config::SessionConfig;
pub use session::{ModbusSession, TransportStats};

// === Error handling ===
pub use error::{ModbusError, ModbusResult};

// === Core types ===
pub use bytes::ByteOrder;
pub use frame::{Frame, FrameBuilder};

// === Value codec ===
pub use codec::{
    bits_to_bools, bools_to_bits, i16_to_words, parse_bit_reply, parse_register_reply,
    words_to_i16,
};
pub use validate::validate;

// === Protocol limits (commonly needed constants) ===
pub use constants::{
    MAX_ADDRESS, MAX_READ_COILS, MAX_READ_REGISTERS, MAX_REPLY_SIZE, MAX_WRITE_COILS,
    MAX_WRITE_REGISTERS,
};

/// Cancellation token accepted by [`ModbusSession::exchange_with_cancel`]
pub use tokio_util::sync::CancellationToken;

/// Modbus TCP default port
pub use config::DEFAULT_TCP_PORT;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
