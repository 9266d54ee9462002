//! Host-OS serial backend using tokio-serial.
//!
//! Bridges a host operating-system serial device (e.g. `/dev/ttyUSB0` or
//! `COM3`) into the core, mapping whichever [`PortId`](crate::framing::PortId)
//! the script selects to one configured device path. RX is pumped into the [`RxHandle`] by an owned
//! task; TX is fed through an unbounded channel so `transmit` stays
//! fire-and-forget.
//!
//! Host UARTs cannot realize the full framing space: 9 data bits and
//! fractional stop bits fail with [`HardwareError::Unsupported`].
//!
//! Gated behind the `host-serial` feature flag.

use super::{HardwareError, SerialHardware};
use crate::framing::{DataBits, Parity, SerialConfig, StopBits};
use crate::rx::RxHandle;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Serial hardware backed by a host-OS device.
///
/// `attach` must be called from within a Tokio runtime; it spawns the I/O
/// pump task that owns the device stream.
#[derive(Debug)]
pub struct HostSerial {
    device: String,
    worker: Option<Worker>,
}

#[derive(Debug)]
struct Worker {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    pump: JoinHandle<()>,
}

impl HostSerial {
    /// Target the given device path.
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            worker: None,
        }
    }

    /// The device path this backend targets.
    pub fn device(&self) -> &str {
        &self.device
    }
}

impl SerialHardware for HostSerial {
    fn attach(&mut self, config: &SerialConfig, rx: RxHandle) -> Result<(), HardwareError> {
        self.detach();

        let builder = tokio_serial::new(&self.device, config.baud_rate)
            .data_bits(convert_data_bits(config.framing.data_bits)?)
            .parity(convert_parity(config.framing.parity))
            .stop_bits(convert_stop_bits(config.framing.stop_bits)?)
            .flow_control(serialport::FlowControl::None);

        let stream = tokio_serial::SerialStream::open(&builder).map_err(|e| match e.kind {
            tokio_serial::ErrorKind::NoDevice => HardwareError::port_unavailable(&self.device),
            tokio_serial::ErrorKind::InvalidInput => HardwareError::unsupported(e.to_string()),
            _ => HardwareError::Transmit(std::io::Error::other(e.to_string())),
        })?;

        debug!(port = %config.port, device = %self.device, baud = config.baud_rate,
            "attached host serial device");

        let (tx, commands) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump(stream, commands, rx));
        self.worker = Some(Worker { tx, pump });
        Ok(())
    }

    fn detach(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.pump.abort();
            debug!(device = %self.device, "detached host serial device");
        }
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        let worker = self
            .worker
            .as_ref()
            .ok_or_else(|| HardwareError::port_unavailable(&self.device))?;
        worker
            .tx
            .send(bytes.to_vec())
            .map_err(|_| HardwareError::port_unavailable("I/O pump task is gone"))
    }

    fn set_expansion_service(&mut self, enabled: bool) {
        // Host systems have no expansion module service contending for the
        // device; honor the contract as a no-op.
        debug!(enabled, "expansion service toggle ignored on host backend");
    }
}

impl Drop for HostSerial {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Owns the device stream: drains the TX channel and pushes received bytes
/// into the RX handle until either side fails.
async fn pump(
    mut stream: tokio_serial::SerialStream,
    mut commands: mpsc::UnboundedReceiver<Vec<u8>>,
    rx: RxHandle,
) {
    let mut buf = [0u8; 512];
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(bytes) => {
                    if let Err(e) = stream.write_all(&bytes).await {
                        warn!(error = %e, "host serial write failed");
                        break;
                    }
                }
                None => break,
            },
            result = stream.read(&mut buf) => match result {
                Ok(0) => {
                    warn!("host serial device closed");
                    break;
                }
                Ok(n) => rx.deliver(&buf[..n]),
                Err(e) => {
                    warn!(error = %e, "host serial read failed");
                    break;
                }
            },
        }
    }
}

fn convert_data_bits(bits: DataBits) -> Result<serialport::DataBits, HardwareError> {
    match bits {
        DataBits::Six => Ok(serialport::DataBits::Six),
        DataBits::Seven => Ok(serialport::DataBits::Seven),
        DataBits::Eight => Ok(serialport::DataBits::Eight),
        DataBits::Nine => Err(HardwareError::unsupported(
            "host UARTs do not support 9 data bits",
        )),
    }
}

fn convert_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn convert_stop_bits(bits: StopBits) -> Result<serialport::StopBits, HardwareError> {
    match bits {
        StopBits::One => Ok(serialport::StopBits::One),
        StopBits::Two => Ok(serialport::StopBits::Two),
        StopBits::Half | StopBits::OneAndHalf => Err(HardwareError::unsupported(
            "host UARTs support whole stop bit lengths only",
        )),
    }
}
