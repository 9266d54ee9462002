//! Error types for serial port operations.
//!
//! Timeouts are deliberately absent from this enum: a read that runs out of
//! time reports a partial or empty result value, never an error.

use crate::hardware::HardwareError;
use thiserror::Error;

/// Errors surfaced by the serial port core.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The framing combination violates a cross-field constraint.
    #[error("Invalid framing: {0}")]
    InvalidFraming(&'static str),

    /// The baud rate is outside the accepted range.
    #[error("Invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    /// The operation requires a configured port.
    #[error("Port is not configured")]
    PortNotConfigured,

    /// A read or reconfiguration was attempted while a read is in flight.
    #[error("Port is busy with an in-flight read")]
    PortBusy,

    /// A write payload contained a value outside `[0, 255]`.
    #[error("Byte value out of range: {0}")]
    InvalidByteValue(i64),

    /// A fault in the hardware collaborator. Never retried by the core.
    #[error("Hardware fault: {0}")]
    Hardware(#[from] HardwareError),
}

/// Convenient `Result` type for port operations.
pub type SerialResult<T> = Result<T, SerialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SerialError::InvalidFraming("6 data bits require parity");
        assert_eq!(err.to_string(), "Invalid framing: 6 data bits require parity");

        let err = SerialError::InvalidBaudRate(0);
        assert_eq!(err.to_string(), "Invalid baud rate: 0");

        let err = SerialError::InvalidByteValue(256);
        assert_eq!(err.to_string(), "Byte value out of range: 256");

        assert_eq!(
            SerialError::PortNotConfigured.to_string(),
            "Port is not configured"
        );
    }

    #[test]
    fn hardware_error_conversion() {
        fn fails() -> SerialResult<()> {
            Err(HardwareError::Unsupported("9 data bits".into()))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(SerialError::Hardware(_))));
    }
}
