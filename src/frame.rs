//! Modbus TCP frame construction
//!
//! A frame is the MBAP header followed by the PDU:
//!
//! | Offset | Field | Size |
//! |--------|-------|------|
//! | 0 | Transaction ID | 2 |
//! | 2 | Protocol ID (0) | 2 |
//! | 4 | Length | 2 |
//! | 6 | Unit ID | 1 |
//! | 7 | Function code | 1 |
//! | 8 | Function-specific body | var |
//!
//! Every 16-bit field, header and body alike, is written in the session byte
//! order. Frames are built fresh for each request and never reused.
//!
//! The length field is 6 for reads and single writes. Multi-value writes
//! (FC15/FC16) carry `6 + payload byte count`, one less than the bytes that
//! actually follow the field. Devices that check the MBAP length strictly
//! will reject those frames.

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::bytes::ByteOrder;
use crate::codec::{bools_to_bits, i16_to_words};
use crate::constants::{
    COIL_OFF, COIL_ON, FC_WRITE_MULTIPLE_COILS, FC_WRITE_MULTIPLE_REGISTERS,
    FC_WRITE_SINGLE_COIL, FC_WRITE_SINGLE_REGISTER, FIXED_FRAME_LENGTH, MBAP_HEADER_LEN,
    PROTOCOL_ID,
};
use crate::error::{ModbusError, ModbusResult};

/// An encoded request frame, ready to be written to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Bytes,
    transaction_id: u16,
    function_code: u8,
}

impl Frame {
    /// Raw frame bytes
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total frame length in bytes
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// A frame always carries at least the MBAP header
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Transaction id written in the header
    #[inline]
    pub fn transaction_id(&self) -> u16 {
        self.transaction_id
    }

    /// Function code of the request
    #[inline]
    pub fn function_code(&self) -> u8 {
        self.function_code
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builds request frames for one transaction.
///
/// # Example
///
/// ```rust
/// use voltage_mbap::{ByteOrder, FrameBuilder};
///
/// let frame = FrameBuilder::new(1, 1, ByteOrder::BigEndian)
///     .write_single_coil(0, true);
/// assert_eq!(
///     frame.as_bytes(),
///     &[0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x05, 0x00, 0x00, 0xFF, 0x00]
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FrameBuilder {
    transaction_id: u16,
    unit_id: u8,
    order: ByteOrder,
}

impl FrameBuilder {
    /// Create a builder for one transaction
    #[inline]
    pub fn new(transaction_id: u16, unit_id: u8, order: ByteOrder) -> Self {
        Self {
            transaction_id,
            unit_id,
            order,
        }
    }

    /// Assemble header + function code + body with the given length field.
    fn finish(&self, function_code: u8, length: u16, body: &[u8]) -> Frame {
        let mut buf = BytesMut::with_capacity(MBAP_HEADER_LEN + 1 + body.len());
        self.order.put_u16(&mut buf, self.transaction_id);
        self.order.put_u16(&mut buf, PROTOCOL_ID);
        self.order.put_u16(&mut buf, length);
        buf.put_u8(self.unit_id);
        buf.put_u8(function_code);
        buf.put_slice(body);

        debug!(
            "Frame built: TID={}, FC={:02X} ({}), length_field={}, total_len={}",
            self.transaction_id,
            function_code,
            function_code_description(function_code),
            length,
            buf.len()
        );

        Frame {
            bytes: buf.freeze(),
            transaction_id: self.transaction_id,
            function_code,
        }
    }

    /// Address followed by a second 16-bit field (count or value).
    fn address_and_word(&self, address: u16, word: u16) -> BytesMut {
        let mut body = BytesMut::with_capacity(4);
        self.order.put_u16(&mut body, address);
        self.order.put_u16(&mut body, word);
        body
    }

    /// Build a read request frame for FC01-04
    ///
    /// # Arguments
    /// * `fc` - Function code (1, 2, 3, or 4)
    /// * `address` - Starting address
    /// * `count` - Number of coils (FC01/02) or registers (FC03/04)
    pub fn read_request(&self, fc: u8, address: u16, count: u16) -> ModbusResult<Frame> {
        if !matches!(fc, 0x01..=0x04) {
            return Err(ModbusError::protocol(format!(
                "function code {fc:#04X} is not a read function"
            )));
        }
        Ok(self.finish(
            fc,
            FIXED_FRAME_LENGTH,
            &self.address_and_word(address, count),
        ))
    }

    /// Build a write single coil frame (FC05)
    ///
    /// `true` is sent as 0xFF00, `false` as 0x0000.
    pub fn write_single_coil(&self, address: u16, value: bool) -> Frame {
        let coil_value = if value { COIL_ON } else { COIL_OFF };
        self.finish(
            FC_WRITE_SINGLE_COIL,
            FIXED_FRAME_LENGTH,
            &self.address_and_word(address, coil_value),
        )
    }

    /// Build a write single register frame (FC06)
    pub fn write_single_register(&self, address: u16, value: i16) -> Frame {
        self.finish(
            FC_WRITE_SINGLE_REGISTER,
            FIXED_FRAME_LENGTH,
            &self.address_and_word(address, value as u16),
        )
    }

    /// Build a write multiple coils frame (FC15)
    ///
    /// Coils are packed LSB first; the byte count is `ceil(values.len() / 8)`.
    pub fn write_multiple_coils(&self, address: u16, values: &[bool]) -> Frame {
        let packed = bools_to_bits(values);
        self.multi_write(FC_WRITE_MULTIPLE_COILS, address, values.len() as u16, &packed)
    }

    /// Build a write multiple registers frame (FC16)
    ///
    /// Register words follow the session byte order.
    pub fn write_multiple_registers(&self, address: u16, values: &[i16]) -> Frame {
        let words = i16_to_words(values, self.order);
        self.multi_write(FC_WRITE_MULTIPLE_REGISTERS, address, values.len() as u16, &words)
    }

    /// Address, count, byte count, payload; length field is `6 + payload.len()`.
    fn multi_write(&self, function_code: u8, address: u16, count: u16, payload: &[u8]) -> Frame {
        let mut body = self.address_and_word(address, count);
        body.put_u8(payload.len() as u8);
        body.put_slice(payload);
        let length = FIXED_FRAME_LENGTH + payload.len() as u16;
        self.finish(function_code, length, &body)
    }
}

/// Get human-readable function code description
pub fn function_code_description(fc: u8) -> &'static str {
    match fc & 0x7F {
        0x01 => "Read Coils",
        0x02 => "Read Discrete Inputs",
        0x03 => "Read Holding Registers",
        0x04 => "Read Input Registers",
        0x05 => "Write Single Coil",
        0x06 => "Write Single Register",
        0x0F => "Write Multiple Coils",
        0x10 => "Write Multiple Registers",
        _ => "Unknown Function",
    }
}

/// Space-separated uppercase hex dump used for packet tracing.
pub fn format_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FC_READ_COILS, FC_READ_DISCRETE_INPUTS, FC_READ_HOLDING_REGISTERS};

    fn big(tid: u16) -> FrameBuilder {
        FrameBuilder::new(tid, 1, ByteOrder::BigEndian)
    }

    fn length_field(frame: &Frame) -> u16 {
        u16::from_be_bytes([frame.as_bytes()[4], frame.as_bytes()[5]])
    }

    #[test]
    fn test_read_request() {
        let frame = big(0x0102)
            .read_request(FC_READ_HOLDING_REGISTERS, 0x006B, 3)
            .unwrap();

        assert_eq!(frame.transaction_id(), 0x0102);
        assert_eq!(frame.function_code(), 0x03);
        assert_eq!(
            frame.as_bytes(),
            &[0x01, 0x02, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x6B, 0x00, 0x03]
        );
    }

    #[test]
    fn test_read_request_rejects_write_codes() {
        let err = big(1).read_request(0x05, 0, 1).unwrap_err();
        assert!(matches!(err, ModbusError::Protocol { .. }));
    }

    #[test]
    fn test_bit_read_frames_have_fixed_size() {
        for count in [1u16, 7, 8, 9, 1000, 1999, 2000] {
            for fc in [FC_READ_COILS, FC_READ_DISCRETE_INPUTS] {
                let frame = big(1).read_request(fc, 0, count).unwrap();
                assert_eq!(frame.len(), 12);
                assert_eq!(length_field(&frame), 6);
            }
        }
    }

    #[test]
    fn test_write_single_coil() {
        let frame = big(1).write_single_coil(0, true);
        assert_eq!(
            frame.as_bytes(),
            &[0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x05, 0x00, 0x00, 0xFF, 0x00]
        );

        let frame = big(2).write_single_coil(0x00AC, false);
        assert_eq!(&frame.as_bytes()[7..], &[0x05, 0x00, 0xAC, 0x00, 0x00]);
    }

    #[test]
    fn test_write_single_register() {
        let frame = big(1).write_single_register(0x0001, -2);
        assert_eq!(length_field(&frame), 6);
        assert_eq!(&frame.as_bytes()[7..], &[0x06, 0x00, 0x01, 0xFF, 0xFE]);
    }

    #[test]
    fn test_write_multiple_coils() {
        let values = [true, true, true, true, true, true, true, true, false, true];
        let frame = big(7).write_multiple_coils(10, &values);

        assert_eq!(
            frame.as_bytes(),
            &[
                0x00, 0x07, 0x00, 0x00, 0x00, 0x08, 0x01, 0x0F, 0x00, 0x0A, 0x00, 0x0A, 0x02,
                0xFF, 0x02
            ]
        );
        // 6 + packed payload bytes
        assert_eq!(length_field(&frame), 8);
        assert_eq!(length_field(&frame) as usize, frame.len() - 7);
    }

    #[test]
    fn test_write_multiple_registers() {
        let frame = big(1).write_multiple_registers(0x0001, &[0x000A, 0x0102]);

        assert_eq!(
            &frame.as_bytes()[7..],
            &[0x10, 0x00, 0x01, 0x00, 0x02, 0x04, 0x00, 0x0A, 0x01, 0x02]
        );
        assert_eq!(length_field(&frame), 10);
        assert_eq!(length_field(&frame) as usize, frame.len() - 7);
    }

    #[test]
    fn test_multi_write_length_is_six_plus_payload() {
        let coils = big(1).write_multiple_coils(0, &[true, false, true]);
        assert_eq!(length_field(&coils), 7);
        assert_eq!(coils.as_bytes()[12], 1);

        let registers = big(1).write_multiple_registers(0, &[1, 2]);
        assert_eq!(length_field(&registers), 10);
        assert_eq!(registers.as_bytes()[12], 4);

        let many = big(1).write_multiple_coils(0, &[true; 1968]);
        assert_eq!(length_field(&many), 6 + 246);
        assert_eq!(many.len(), 7 + 6 + 246);
    }

    #[test]
    fn test_little_endian_applies_to_header_and_payload() {
        let frame = FrameBuilder::new(1, 9, ByteOrder::LittleEndian)
            .write_multiple_registers(2, &[1]);
        assert_eq!(
            frame.as_bytes(),
            &[
                0x01, 0x00, 0x00, 0x00, 0x08, 0x00, 0x09, 0x10, 0x02, 0x00, 0x01, 0x00, 0x02,
                0x01, 0x00
            ]
        );
    }

    #[test]
    fn test_format_hex() {
        assert_eq!(format_hex(&[0x00, 0xAB, 0x0F]), "00 AB 0F");
        assert_eq!(format_hex(&[]), "");
        assert_eq!(function_code_description(0x83), "Read Holding Registers");
    }
}
