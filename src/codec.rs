//! # Value Codec
//!
//! Conversion between raw reply/request bytes and the values callers work with.
//!
//! | Data | Wire form | Rust form |
//! |------|-----------|-----------|
//! | coils, discrete inputs | packed bits, LSB first | `Vec<bool>` |
//! | holding, input registers | 16-bit words in session byte order | `Vec<i16>` |
//!
//! The packing helpers are pure; the `parse_*_reply` functions slice a raw
//! reply at the fixed payload offset and never trust the reply's own length
//! or byte count fields.

use tracing::debug;

use crate::bytes::ByteOrder;
use crate::constants::{
    EXCEPTION_FLAG, FUNCTION_CODE_OFFSET, MBAP_HEADER_LEN, REPLY_PAYLOAD_OFFSET,
};
use crate::error::{ModbusError, ModbusResult};

// ============================================================================
// Bit Packing
// ============================================================================

/// Pack booleans into bytes, least significant bit first.
///
/// Produces `ceil(values.len() / 8)` bytes; unused trailing bits are zero.
///
/// # Example
///
/// ```rust
/// use voltage_mbap::bools_to_bits;
///
/// assert_eq!(bools_to_bits(&[true; 8]), vec![0xFF]);
/// assert_eq!(bools_to_bits(&[true, false, true]), vec![0x05]);
/// ```
pub fn bools_to_bits(values: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len().div_ceil(8)];
    for (i, &value) in values.iter().enumerate() {
        if value {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

/// Unpack every bit of `bytes` into booleans, least significant bit first.
///
/// Returns `bytes.len() * 8` values. The codec does not know the logical
/// count, so callers truncate to the number of elements they asked for.
pub fn bits_to_bools(bytes: &[u8]) -> Vec<bool> {
    let mut values = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for bit in 0..8 {
            values.push(byte & (1 << bit) != 0);
        }
    }
    values
}

// ============================================================================
// Register Words
// ============================================================================

/// Decode 16-bit words into signed integers.
///
/// # Errors
///
/// [`ModbusError::Decode`] when `bytes` has an odd length.
///
/// # Example
///
/// ```rust
/// use voltage_mbap::{words_to_i16, ByteOrder};
///
/// assert_eq!(words_to_i16(&[0x00, 0x01], ByteOrder::BigEndian).unwrap(), vec![1]);
/// assert_eq!(words_to_i16(&[0x01, 0x00], ByteOrder::LittleEndian).unwrap(), vec![1]);
/// ```
pub fn words_to_i16(bytes: &[u8], order: ByteOrder) -> ModbusResult<Vec<i16>> {
    if bytes.len() % 2 != 0 {
        return Err(ModbusError::decode(format!(
            "register payload has odd length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| order.u16_from_bytes([pair[0], pair[1]]) as i16)
        .collect())
}

/// Encode signed integers as 16-bit words.
pub fn i16_to_words(values: &[i16], order: ByteOrder) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 2);
    for &value in values {
        bytes.extend_from_slice(&order.u16_to_bytes(value as u16));
    }
    bytes
}

// ============================================================================
// Reply Parsing
// ============================================================================

/// Fail with [`ModbusError::Exception`] if `reply` carries an exception
/// function code.
pub fn check_exception(reply: &[u8]) -> ModbusResult<()> {
    if reply.len() > FUNCTION_CODE_OFFSET + 1 {
        let function = reply[FUNCTION_CODE_OFFSET];
        if function & EXCEPTION_FLAG != 0 {
            let code = reply[FUNCTION_CODE_OFFSET + 1];
            debug!(
                "Exception reply: FC={:02X}, exception_code={:02X}",
                function & 0x7F,
                code
            );
            return Err(ModbusError::exception(function, code));
        }
    }
    Ok(())
}

/// Slice exactly `data_len` payload bytes from a read reply.
fn reply_payload(reply: &[u8], data_len: usize) -> ModbusResult<&[u8]> {
    check_exception(reply)?;

    let end = REPLY_PAYLOAD_OFFSET + data_len;
    if reply.len() < end {
        return Err(ModbusError::decode(format!(
            "reply truncated: expected at least {} bytes, got {}",
            end,
            reply.len()
        )));
    }
    Ok(&reply[REPLY_PAYLOAD_OFFSET..end])
}

/// Decode a coil/discrete-input read reply into exactly `count` booleans.
///
/// # Example
///
/// ```rust
/// use voltage_mbap::parse_bit_reply;
///
/// let reply = [0x00, 0x01, 0x00, 0x00, 0x00, 0x04, 0x01, 0x01, 0x01, 0x05];
/// assert_eq!(parse_bit_reply(&reply, 3).unwrap(), vec![true, false, true]);
/// ```
pub fn parse_bit_reply(reply: &[u8], count: u16) -> ModbusResult<Vec<bool>> {
    let count = count as usize;
    let payload = reply_payload(reply, count.div_ceil(8))?;
    let mut values = bits_to_bools(payload);
    values.truncate(count);
    Ok(values)
}

/// Decode a holding/input register read reply into exactly `count` values.
pub fn parse_register_reply(
    reply: &[u8],
    count: u16,
    order: ByteOrder,
) -> ModbusResult<Vec<i16>> {
    let payload = reply_payload(reply, count as usize * 2)?;
    words_to_i16(payload, order)
}

/// Transaction id carried in the first two bytes of a frame or reply.
pub fn transaction_id_of(frame: &[u8], order: ByteOrder) -> Option<u16> {
    if frame.len() < MBAP_HEADER_LEN {
        return None;
    }
    Some(order.u16_from_bytes([frame[0], frame[1]]))
}
