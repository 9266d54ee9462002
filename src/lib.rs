//! Scripted Serial
//!
//! A buffered, timeout-governed serial port core for script hosts: configure
//! electrical framing, write bytes, and read bytes back under fixed-length,
//! line-delimited, best-effort, and multi-pattern termination policies.
//!
//! # Modules
//!
//! - `framing`: electrical framing and line configuration
//! - `buffer`: bounded RX ingestion buffer
//! - `deadline`: millisecond budgets as monotonic deadlines
//! - `pattern`: pattern normalization and the streaming multi-pattern matcher
//! - `payload`: write payload normalization
//! - `rx`: shared RX state and the hardware delivery handle
//! - `hardware`: the collaborator boundary, its mock, and the optional
//!   host-OS backend (`host-serial` feature)
//! - `port`: the port core tying it all together
//! - `error`: unified error handling
//!
//! # Example
//!
//! ```
//! use scripted_serial::{MockHardware, PortId, SerialPort};
//!
//! # #[tokio::main(flavor = "current_thread")] async fn main() {
//! let mock = MockHardware::new();
//! let port = SerialPort::new(Box::new(mock.clone()));
//! port.setup(PortId::Usart, 115_200, None).unwrap();
//!
//! port.write("AT\r\n").unwrap();
//! mock.deliver(b"OK\r\n");
//! assert_eq!(port.expect(vec!["OK", "ERROR"], Some(100)).await.unwrap(), Some(0));
//! port.end();
//! # }
//! ```

pub mod buffer;
pub mod deadline;
pub mod error;
pub mod framing;
pub mod hardware;
pub mod pattern;
pub mod payload;
pub mod port;
pub mod rx;

// Re-export commonly used types for convenience
pub use buffer::{StreamBuffer, DEFAULT_RX_CAPACITY};
pub use deadline::Deadline;
pub use error::{SerialError, SerialResult};
pub use framing::{DataBits, Framing, Parity, PortId, SerialConfig, StopBits};
pub use hardware::{HardwareError, MockHardware, SerialHardware};
pub use pattern::{Pattern, PatternSet};
pub use payload::WritePayload;
pub use port::SerialPort;
pub use rx::RxHandle;

#[cfg(feature = "host-serial")]
pub use hardware::HostSerial;
