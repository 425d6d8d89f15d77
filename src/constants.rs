//! Modbus TCP protocol constants
//!
//! Frame layout and per-function limits used by the validator, the frame
//! builder and the session. The count ceilings are protocol-mandated and are
//! not configurable.

// ============================================================================
// Frame Size Constants
// ============================================================================

/// MBAP header length for TCP
/// Format: Transaction ID(2) + Protocol ID(2) + Length(2) + Unit ID(1) = 7 bytes
pub const MBAP_HEADER_LEN: usize = 7;

/// Protocol identifier carried in every MBAP header (Modbus = 0)
pub const PROTOCOL_ID: u16 = 0;

/// Offset of the function code within a frame
pub const FUNCTION_CODE_OFFSET: usize = MBAP_HEADER_LEN;

/// Offset of the first data byte in a read reply
///
/// MBAP header (7) + function code (1) + byte count (1) = 9
pub const REPLY_PAYLOAD_OFFSET: usize = MBAP_HEADER_LEN + 2;

/// Maximum PDU (Protocol Data Unit) size per Modbus specification
pub const MAX_PDU_SIZE: usize = 253;

/// Maximum reply size read from the transport per exchange
///
/// Transaction ID(2) + Protocol ID(2) + Length(2) + Unit ID(1) + PDU(253) = 260 bytes
pub const MAX_REPLY_SIZE: usize = 6 + 1 + MAX_PDU_SIZE;

/// Length field value for read and single-write frames
/// Unit ID(1) + Function Code(1) + Address(2) + Count/Value(2) = 6
///
/// Multi-value writes add their payload byte count to this base.
pub const FIXED_FRAME_LENGTH: u16 = 6;

// ============================================================================
// Address and Count Limits
// ============================================================================

/// Highest address accepted by any operation
pub const MAX_ADDRESS: u16 = 9999;

/// Maximum number of coils for FC01/FC02 (Read Coils/Discrete Inputs)
pub const MAX_READ_COILS: u16 = 2000;

/// Maximum number of registers for FC03/FC04 (Read Holding/Input Registers)
pub const MAX_READ_REGISTERS: u16 = 125;

/// Count for FC05/FC06 (Write Single Coil/Register)
pub const MAX_WRITE_SINGLE: u16 = 1;

/// Maximum number of coils for FC15 (Write Multiple Coils)
pub const MAX_WRITE_COILS: u16 = 1968;

/// Maximum number of registers for FC16 (Write Multiple Registers)
pub const MAX_WRITE_REGISTERS: u16 = 123;

// ============================================================================
// Modbus Function Codes
// ============================================================================

/// Read Coils (FC01)
pub const FC_READ_COILS: u8 = 0x01;

/// Read Discrete Inputs (FC02)
pub const FC_READ_DISCRETE_INPUTS: u8 = 0x02;

/// Read Holding Registers (FC03)
pub const FC_READ_HOLDING_REGISTERS: u8 = 0x03;

/// Read Input Registers (FC04)
pub const FC_READ_INPUT_REGISTERS: u8 = 0x04;

/// Write Single Coil (FC05)
pub const FC_WRITE_SINGLE_COIL: u8 = 0x05;

/// Write Single Register (FC06)
pub const FC_WRITE_SINGLE_REGISTER: u8 = 0x06;

/// Write Multiple Coils (FC15)
pub const FC_WRITE_MULTIPLE_COILS: u8 = 0x0F;

/// Write Multiple Registers (FC16)
pub const FC_WRITE_MULTIPLE_REGISTERS: u8 = 0x10;

/// Coil ON value for FC05
pub const COIL_ON: u16 = 0xFF00;

/// Coil OFF value for FC05
pub const COIL_OFF: u16 = 0x0000;

// ============================================================================
// Modbus Exception Codes
// ============================================================================

/// Bit set in the function code of an exception reply
pub const EXCEPTION_FLAG: u8 = 0x80;

/// Illegal Function
pub const EXCEPTION_ILLEGAL_FUNCTION: u8 = 0x01;

/// Illegal Data Address
pub const EXCEPTION_ILLEGAL_DATA_ADDRESS: u8 = 0x02;

/// Illegal Data Value
pub const EXCEPTION_ILLEGAL_DATA_VALUE: u8 = 0x03;

/// Server Device Failure
pub const EXCEPTION_SERVER_DEVICE_FAILURE: u8 = 0x04;

/// Acknowledge
pub const EXCEPTION_ACKNOWLEDGE: u8 = 0x05;

/// Server Device Busy
pub const EXCEPTION_SERVER_DEVICE_BUSY: u8 = 0x06;

/// Memory Parity Error
pub const EXCEPTION_MEMORY_PARITY_ERROR: u8 = 0x08;

/// Gateway Path Unavailable
pub const EXCEPTION_GATEWAY_PATH_UNAVAILABLE: u8 = 0x0A;

/// Gateway Target Device Failed to Respond
pub const EXCEPTION_GATEWAY_TARGET_FAILED: u8 = 0x0B;
