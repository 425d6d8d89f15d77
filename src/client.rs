//! Modbus TCP operations
//!
//! The eight standard data-access functions, each a fixed composition of
//! validation, frame building, one serialized exchange and decoding:
//!
//! ```text
//! validate -> FrameBuilder -> ModbusSession::transact -> codec
//! ```
//!
//! # API Naming Convention
//!
//! | Function Code | Semantic Name | Alias | Max count |
//! |---------------|---------------|-------|-----------|
//! | 0x01 | `read_coils()` | `read_01()` | 2000 |
//! | 0x02 | `read_discrete_inputs()` | `read_02()` | 2000 |
//! | 0x03 | `read_holding_registers()` | `read_03()` | 125 |
//! | 0x04 | `read_input_registers()` | `read_04()` | 125 |
//! | 0x05 | `write_single_coil()` | `write_05()` | 1 |
//! | 0x06 | `write_single_register()` | `write_06()` | 1 |
//! | 0x0F | `write_multiple_coils()` | `write_0f()` | 1968 |
//! | 0x10 | `write_multiple_registers()` | `write_10()` | 123 |
//!
//! All addresses are 0-based and must not exceed 9999.
//!
//! # Write acknowledgements
//!
//! By default any non-empty reply acknowledges a write, and an empty reply
//! fails with [`ModbusError::Protocol`]. With
//! [`SessionConfig::with_write_echo_verification`](crate::SessionConfig::with_write_echo_verification)
//! the reply must also echo the transaction id, function code, address and
//! value/quantity of the request.

use std::future::Future;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::bytes::ByteOrder;
use crate::codec::{check_exception, parse_bit_reply, parse_register_reply, transaction_id_of};
use crate::constants::{
    FC_READ_COILS, FC_READ_DISCRETE_INPUTS, FC_READ_HOLDING_REGISTERS, FC_READ_INPUT_REGISTERS,
    FUNCTION_CODE_OFFSET, MAX_READ_COILS, MAX_READ_REGISTERS, MAX_WRITE_COILS,
    MAX_WRITE_REGISTERS, MAX_WRITE_SINGLE,
};
use crate::error::{ModbusError, ModbusResult};
use crate::frame::{function_code_description, Frame, FrameBuilder};
use crate::session::ModbusSession;
use crate::validate::{validate, validate_len};

/// Bytes a write acknowledgement must echo: function code, address and
/// value/quantity.
const ECHO_END: usize = FUNCTION_CODE_OFFSET + 5;

/// Trait defining the Modbus data-access operations.
///
/// Methods take `&self`: a session serializes concurrent callers internally,
/// so it can be shared behind an `Arc`.
pub trait ModbusClient: Send + Sync {
    /// Read coils (function code 0x01).
    ///
    /// # Arguments
    ///
    /// * `address` - Starting coil address (0-9999)
    /// * `count` - Number of coils to read (1-2000)
    fn read_coils(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send;

    /// Read discrete inputs (function code 0x02).
    ///
    /// # Arguments
    ///
    /// * `address` - Starting input address (0-9999)
    /// * `count` - Number of inputs to read (1-2000)
    fn read_discrete_inputs(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send;

    /// Read holding registers (function code 0x03).
    ///
    /// # Arguments
    ///
    /// * `address` - Starting register address (0-9999)
    /// * `count` - Number of registers to read (1-125)
    fn read_holding_registers(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<i16>>> + Send;

    /// Read input registers (function code 0x04).
    ///
    /// # Arguments
    ///
    /// * `address` - Starting register address (0-9999)
    /// * `count` - Number of registers to read (1-125)
    fn read_input_registers(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<i16>>> + Send;

    /// Write single coil (function code 0x05).
    ///
    /// `true` is sent as ON (0xFF00), `false` as OFF (0x0000).
    fn write_single_coil(
        &self,
        address: u16,
        value: bool,
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write single register (function code 0x06).
    fn write_single_register(
        &self,
        address: u16,
        value: i16,
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write multiple coils (function code 0x0F), 1-1968 values.
    fn write_multiple_coils(
        &self,
        address: u16,
        values: &[bool],
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    /// Write multiple registers (function code 0x10), 1-123 values.
    fn write_multiple_registers(
        &self,
        address: u16,
        values: &[i16],
    ) -> impl Future<Output = ModbusResult<()>> + Send;

    // ===== Function code aliases =====

    /// Alias for [`read_coils`](Self::read_coils)
    #[inline]
    fn read_01(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send {
        self.read_coils(address, count)
    }

    /// Alias for [`read_discrete_inputs`](Self::read_discrete_inputs)
    #[inline]
    fn read_02(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<bool>>> + Send {
        self.read_discrete_inputs(address, count)
    }

    /// Alias for [`read_holding_registers`](Self::read_holding_registers)
    #[inline]
    fn read_03(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<i16>>> + Send {
        self.read_holding_registers(address, count)
    }

    /// Alias for [`read_input_registers`](Self::read_input_registers)
    #[inline]
    fn read_04(
        &self,
        address: u16,
        count: u16,
    ) -> impl Future<Output = ModbusResult<Vec<i16>>> + Send {
        self.read_input_registers(address, count)
    }

    /// Alias for [`write_single_coil`](Self::write_single_coil)
    #[inline]
    fn write_05(&self, address: u16, value: bool) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_single_coil(address, value)
    }

    /// Alias for [`write_single_register`](Self::write_single_register)
    #[inline]
    fn write_06(&self, address: u16, value: i16) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_single_register(address, value)
    }

    /// Alias for [`write_multiple_coils`](Self::write_multiple_coils)
    #[inline]
    fn write_0f(
        &self,
        address: u16,
        values: &[bool],
    ) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_multiple_coils(address, values)
    }

    /// Alias for [`write_multiple_registers`](Self::write_multiple_registers)
    #[inline]
    fn write_10(
        &self,
        address: u16,
        values: &[i16],
    ) -> impl Future<Output = ModbusResult<()>> + Send {
        self.write_multiple_registers(address, values)
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> ModbusSession<S> {
    async fn read_bits(&self, fc: u8, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        validate(address, count, MAX_READ_COILS)?;
        debug!(
            "{}: address={}, count={}",
            function_code_description(fc),
            address,
            count
        );

        let (_, reply) = self
            .transact(|builder| builder.read_request(fc, address, count))
            .await?;
        parse_bit_reply(&reply, count)
    }

    async fn read_words(&self, fc: u8, address: u16, count: u16) -> ModbusResult<Vec<i16>> {
        validate(address, count, MAX_READ_REGISTERS)?;
        debug!(
            "{}: address={}, count={}",
            function_code_description(fc),
            address,
            count
        );

        let (_, reply) = self
            .transact(|builder| builder.read_request(fc, address, count))
            .await?;
        parse_register_reply(&reply, count, self.byte_order())
    }

    async fn write<F>(&self, build: F) -> ModbusResult<()>
    where
        F: FnOnce(FrameBuilder) -> Frame + Send,
    {
        let (frame, reply) = self.transact(|builder| Ok(build(builder))).await?;
        let verify = self.config().verify_write_echo.then_some(self.byte_order());
        confirm_write(&frame, &reply, verify)
    }
}

/// Decide whether `reply` acknowledges the write carried by `frame`.
fn confirm_write(frame: &Frame, reply: &[u8], verify: Option<ByteOrder>) -> ModbusResult<()> {
    if reply.is_empty() {
        return Err(ModbusError::protocol(format!(
            "device is in unknown state, did not receive a valid response after {}",
            function_code_description(frame.function_code()).to_lowercase()
        )));
    }
    let Some(order) = verify else {
        return Ok(());
    };

    check_exception(reply)?;
    let request = frame.as_bytes();
    if reply.len() < ECHO_END {
        return Err(ModbusError::protocol(format!(
            "write acknowledgement too short: {} bytes",
            reply.len()
        )));
    }
    let received = transaction_id_of(reply, order);
    if received != Some(frame.transaction_id()) {
        return Err(ModbusError::protocol(format!(
            "transaction id mismatch: sent {}, received {:?}",
            frame.transaction_id(),
            received
        )));
    }
    if reply[FUNCTION_CODE_OFFSET..ECHO_END] != request[FUNCTION_CODE_OFFSET..ECHO_END] {
        return Err(ModbusError::protocol(
            "write acknowledgement does not echo the request",
        ));
    }
    Ok(())
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> ModbusClient for ModbusSession<S> {
    async fn read_coils(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        self.read_bits(FC_READ_COILS, address, count).await
    }

    async fn read_discrete_inputs(&self, address: u16, count: u16) -> ModbusResult<Vec<bool>> {
        self.read_bits(FC_READ_DISCRETE_INPUTS, address, count).await
    }

    async fn read_holding_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<i16>> {
        self.read_words(FC_READ_HOLDING_REGISTERS, address, count)
            .await
    }

    async fn read_input_registers(&self, address: u16, count: u16) -> ModbusResult<Vec<i16>> {
        self.read_words(FC_READ_INPUT_REGISTERS, address, count)
            .await
    }

    async fn write_single_coil(&self, address: u16, value: bool) -> ModbusResult<()> {
        validate(address, 1, MAX_WRITE_SINGLE)?;
        debug!("Write Single Coil: address={}, value={}", address, value);
        self.write(move |builder| builder.write_single_coil(address, value))
            .await
    }

    async fn write_single_register(&self, address: u16, value: i16) -> ModbusResult<()> {
        validate(address, 1, MAX_WRITE_SINGLE)?;
        debug!("Write Single Register: address={}, value={}", address, value);
        self.write(move |builder| builder.write_single_register(address, value))
            .await
    }

    async fn write_multiple_coils(&self, address: u16, values: &[bool]) -> ModbusResult<()> {
        let count = validate_len(address, values.len(), MAX_WRITE_COILS)?;
        debug!("Write Multiple Coils: address={}, count={}", address, count);
        self.write(move |builder| builder.write_multiple_coils(address, values))
            .await
    }

    async fn write_multiple_registers(&self, address: u16, values: &[i16]) -> ModbusResult<()> {
        let count = validate_len(address, values.len(), MAX_WRITE_REGISTERS)?;
        debug!(
            "Write Multiple Registers: address={}, count={}",
            address, count
        );
        self.write(move |builder| builder.write_multiple_registers(address, values))
            .await
    }
}
