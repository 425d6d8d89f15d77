//! Parameter validation for Modbus operations
//!
//! Every operation checks its start address and element count before a frame
//! is built. Only the documented address ceiling and the per-function count
//! ceilings are enforced; whether an address exists in a given register class
//! is up to the device.

use crate::constants::MAX_ADDRESS;
use crate::error::{ModbusError, ModbusResult};

/// Check `address` and `count` against the bounds of one operation.
///
/// Fails with [`ModbusError::Range`] when `count` is outside `1..=max_count`
/// or `address` is above 9999.
///
/// # Example
///
/// ```rust
/// use voltage_mbap::validate;
///
/// assert!(validate(0, 125, 125).is_ok());
/// assert!(validate(0, 0, 125).is_err());
/// assert!(validate(10000, 1, 125).is_err());
/// ```
pub fn validate(address: u16, count: u16, max_count: u16) -> ModbusResult<()> {
    if count < 1 || count > max_count {
        return Err(ModbusError::range(format!(
            "number of registers has to be in the range of 1-{max_count}, got {count}"
        )));
    }
    if address > MAX_ADDRESS {
        return Err(ModbusError::range(format!(
            "address ({address}) cannot exceed {MAX_ADDRESS}"
        )));
    }
    Ok(())
}

/// Validate a slice-backed write, where the count is the slice length.
///
/// Lengths that do not fit in a `u16` are rejected instead of truncated.
pub(crate) fn validate_len(address: u16, len: usize, max_count: u16) -> ModbusResult<u16> {
    let count = u16::try_from(len).map_err(|_| {
        ModbusError::range(format!(
            "number of registers has to be in the range of 1-{max_count}, got {len}"
        ))
    })?;
    validate(address, count, max_count)?;
    Ok(count)
}
