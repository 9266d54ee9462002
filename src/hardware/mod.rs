//! Hardware collaborator boundary.
//!
//! The core never touches a peripheral directly. It talks to a
//! [`SerialHardware`] implementation: the mock used throughout the tests, or
//! the optional host-OS backend. The RX direction is inverted — at attach
//! time the hardware receives an [`RxHandle`](crate::rx::RxHandle) and pushes
//! received bytes through it from whatever context delivery happens in.

pub mod mock;

#[cfg(feature = "host-serial")]
pub mod host;

pub use mock::MockHardware;

#[cfg(feature = "host-serial")]
pub use host::HostSerial;

use crate::framing::SerialConfig;
use crate::rx::RxHandle;
use thiserror::Error;

/// Faults in the hardware layer. A distinct fatal category: the core reports
/// them verbatim and never retries.
#[derive(Debug, Error)]
pub enum HardwareError {
    /// The requested peripheral is not present or cannot be acquired.
    #[error("Port unavailable: {0}")]
    PortUnavailable(String),

    /// The backend cannot realize the requested framing.
    #[error("Unsupported configuration: {0}")]
    Unsupported(String),

    /// The transmit path failed outright.
    #[error("Transmit failed: {0}")]
    Transmit(#[from] std::io::Error),
}

impl HardwareError {
    pub fn port_unavailable(detail: impl Into<String>) -> Self {
        Self::PortUnavailable(detail.into())
    }

    pub fn unsupported(detail: impl Into<String>) -> Self {
        Self::Unsupported(detail.into())
    }
}

/// Driver-side contract for one serial peripheral.
///
/// Implementations either accept an operation or fail outright; retry and
/// backoff are not their concern, and delivery through the [`RxHandle`] must
/// never block on the consumer.
pub trait SerialHardware: Send + std::fmt::Debug {
    /// Bring the peripheral up with the given line configuration and start
    /// delivering received bytes through `rx`.
    fn attach(&mut self, config: &SerialConfig, rx: RxHandle) -> Result<(), HardwareError>;

    /// Stop delivery and release the peripheral. Must tolerate being called
    /// when already detached.
    fn detach(&mut self);

    /// Queue bytes for transmission. Fire-and-forget from the caller's
    /// perspective; backpressure is handled here or not at all.
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), HardwareError>;

    /// Enable or disable the expansion module service that would otherwise
    /// contend for the peripheral. Toggled once per setup/end pair.
    fn set_expansion_service(&mut self, enabled: bool);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HardwareError::port_unavailable("lpuart");
        assert_eq!(err.to_string(), "Port unavailable: lpuart");

        let err = HardwareError::unsupported("9 data bits");
        assert_eq!(err.to_string(), "Unsupported configuration: 9 data bits");
    }

    #[test]
    fn io_error_converts_to_transmit() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: HardwareError = io.into();
        assert!(matches!(err, HardwareError::Transmit(_)));
    }
}
