//! The serial port core: lifecycle gating, the write path, and the four read
//! disciplines plus `expect`.
//!
//! One [`SerialPort`] models one port instance. Hardware delivery and the
//! consumer side meet in the shared RX state; every read-family operation is
//! an async cooperative suspension bounded by its deadline. Timeouts are
//! result values (`None` / partial data), never errors.

use crate::buffer::DEFAULT_RX_CAPACITY;
use crate::deadline::Deadline;
use crate::error::{SerialError, SerialResult};
use crate::framing::{Framing, PortId, SerialConfig};
use crate::hardware::SerialHardware;
use crate::pattern::{Matcher, PatternSet};
use crate::payload::WritePayload;
use crate::rx::{RxHandle, RxShared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Where a port instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Lifecycle {
    #[default]
    Uninitialized,
    Configured,
    Closed,
}

#[derive(Debug, Default)]
struct Control {
    lifecycle: Lifecycle,
    config: Option<SerialConfig>,
    /// Whether this instance currently holds the expansion service disabled.
    service_disabled: bool,
}

/// Clears the in-flight flag when a read completes or is dropped.
struct ReadGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ReadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> SerialResult<Self> {
        if flag.swap(true, Ordering::Acquire) {
            return Err(SerialError::PortBusy);
        }
        Ok(Self { flag })
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// One serial port instance: lifecycle, framing, RX buffer, and the hardware
/// collaborator behind it.
///
/// ```
/// use scripted_serial::{MockHardware, PortId, SerialPort};
///
/// # #[tokio::main(flavor = "current_thread")] async fn main() {
/// let mock = MockHardware::new();
/// let port = SerialPort::new(Box::new(mock.clone()));
/// port.setup(PortId::Usart, 115_200, None).unwrap();
///
/// port.write("AT\r\n").unwrap();
/// mock.deliver(b"OK\r\n");
/// let reply = port.readln(Some(100)).await.unwrap();
/// assert_eq!(reply, "OK");
/// # }
/// ```
#[derive(Debug)]
pub struct SerialPort {
    control: Mutex<Control>,
    hardware: Mutex<Box<dyn SerialHardware>>,
    rx: Arc<RxShared>,
    read_in_flight: AtomicBool,
}

impl SerialPort {
    /// Create an unconfigured port over the given hardware collaborator.
    pub fn new(hardware: Box<dyn SerialHardware>) -> Self {
        Self::with_capacity(hardware, DEFAULT_RX_CAPACITY)
    }

    /// Same, with an explicit RX buffer capacity.
    pub fn with_capacity(hardware: Box<dyn SerialHardware>, rx_capacity: usize) -> Self {
        Self {
            control: Mutex::new(Control::default()),
            hardware: Mutex::new(hardware),
            rx: RxShared::new(rx_capacity),
            read_in_flight: AtomicBool::new(false),
        }
    }

    /// Configure the port and bring the hardware up.
    ///
    /// Disables the expansion module service that would otherwise contend for
    /// the peripheral; the service is disabled at most once per setup/end
    /// pair, no matter how many times the port is reconfigured in between. A
    /// successful re-`setup` replaces the previous configuration wholesale
    /// and flushes any stale RX bytes.
    pub fn setup(
        &self,
        port: PortId,
        baud_rate: u32,
        framing: Option<Framing>,
    ) -> SerialResult<()> {
        if self.read_in_flight.load(Ordering::Acquire) {
            return Err(SerialError::PortBusy);
        }
        let config = SerialConfig::new(port, baud_rate, framing)?;

        let mut control = self.control.lock();
        let mut hardware = self.hardware.lock();

        if control.lifecycle == Lifecycle::Configured {
            hardware.detach();
        }
        let newly_disabled = if control.service_disabled {
            false
        } else {
            hardware.set_expansion_service(false);
            true
        };

        if let Err(e) = hardware.attach(&config, RxHandle::new(Arc::clone(&self.rx))) {
            if newly_disabled {
                hardware.set_expansion_service(true);
            }
            if control.lifecycle == Lifecycle::Configured {
                // The previous attachment is gone; the port is closed.
                control.lifecycle = Lifecycle::Closed;
                control.config = None;
            }
            return Err(e.into());
        }

        if newly_disabled {
            control.service_disabled = true;
        }
        self.rx.buffer.lock().clear();
        control.config = Some(config);
        control.lifecycle = Lifecycle::Configured;
        debug!(port = %port, baud = baud_rate, "serial port configured");
        Ok(())
    }

    /// Tear the port down and re-enable the expansion service. Idempotent.
    pub fn end(&self) {
        let mut control = self.control.lock();
        let mut hardware = self.hardware.lock();

        if control.lifecycle == Lifecycle::Configured {
            hardware.detach();
        }
        if control.service_disabled {
            hardware.set_expansion_service(true);
            control.service_disabled = false;
        }
        control.config = None;
        control.lifecycle = Lifecycle::Closed;
        self.rx.buffer.lock().clear();
        debug!("serial port closed");
    }

    /// Encode the payload and hand it to the hardware transmit path.
    ///
    /// The whole payload is validated before any byte is transmitted; an
    /// out-of-range value fails the call with nothing written. TX and RX are
    /// disjoint, so writing is fine while a read is in flight.
    pub fn write(&self, payload: impl Into<WritePayload>) -> SerialResult<()> {
        self.ensure_configured()?;
        let bytes = payload.into().encode()?;
        self.hardware.lock().transmit(&bytes)?;
        trace!(len = bytes.len(), "tx");
        Ok(())
    }

    /// Consume up to `length` bytes as ASCII text, suspending for more until
    /// the deadline expires. `None` when nothing was read at all.
    pub async fn read(
        &self,
        length: usize,
        timeout_ms: Option<u64>,
    ) -> SerialResult<Option<String>> {
        self.ensure_configured()?;
        let _guard = ReadGuard::acquire(&self.read_in_flight)?;
        let collected = self.collect(length, timeout_ms).await;
        trace!(requested = length, got = collected.len(), "rx read");
        Ok((!collected.is_empty()).then(|| ascii(collected)))
    }

    /// `read`, but the raw bytes instead of text.
    pub async fn read_bytes(
        &self,
        length: usize,
        timeout_ms: Option<u64>,
    ) -> SerialResult<Option<Vec<u8>>> {
        self.ensure_configured()?;
        let _guard = ReadGuard::acquire(&self.read_in_flight)?;
        let collected = self.collect(length, timeout_ms).await;
        trace!(requested = length, got = collected.len(), "rx read_bytes");
        Ok((!collected.is_empty()).then_some(collected))
    }

    /// Consume until a `\r` or `\n` (excluded from the result). The timeout
    /// budget applies to each byte, not the whole line; at expiry the partial
    /// line is returned and nothing is retained for the next call. Line
    /// terminators arriving before any payload byte are skipped.
    pub async fn readln(&self, timeout_ms: Option<u64>) -> SerialResult<String> {
        self.ensure_configured()?;
        let _guard = ReadGuard::acquire(&self.read_in_flight)?;
        let mut line: Vec<u8> = Vec::new();
        loop {
            let drained = {
                let mut buffer = self.rx.buffer.lock();
                match buffer.find_line_terminator() {
                    Some(pos) => {
                        let mut chunk = buffer.consume(pos + 1);
                        chunk.pop();
                        Some((chunk, true))
                    }
                    None => {
                        let pending = buffer.pending();
                        (pending > 0).then(|| (buffer.consume(pending), false))
                    }
                }
            };
            match drained {
                Some((chunk, terminated)) => {
                    line.extend_from_slice(&chunk);
                    if terminated && !line.is_empty() {
                        break;
                    }
                }
                None => {
                    // Per-byte budget: a fresh deadline for every wait.
                    let deadline = Deadline::from_timeout_ms(timeout_ms);
                    if !self.rx.wait_for_data(&deadline).await {
                        break;
                    }
                }
            }
        }
        trace!(len = line.len(), "rx readln");
        Ok(ascii(line))
    }

    /// Drain whatever is pending; if nothing is, wait once for at least one
    /// byte or the deadline, then drain. Never gathers a "complete" message.
    pub async fn read_any(&self, timeout_ms: Option<u64>) -> SerialResult<Option<String>> {
        self.ensure_configured()?;
        let _guard = ReadGuard::acquire(&self.read_in_flight)?;
        let deadline = Deadline::from_timeout_ms(timeout_ms);
        if let Some(text) = self.drain_pending() {
            return Ok(Some(text));
        }
        if !self.rx.wait_for_data(&deadline).await {
            return Ok(None);
        }
        Ok(self.drain_pending())
    }

    /// Scan the stream for the first completing pattern. Returns the matched
    /// pattern's index (0 for a matching singleton), or `None` once the
    /// per-byte deadline expires with nothing completed. Scanned bytes are
    /// consumed either way; partial match progress dies with the call.
    pub async fn expect(
        &self,
        patterns: impl Into<PatternSet>,
        timeout_ms: Option<u64>,
    ) -> SerialResult<Option<usize>> {
        self.ensure_configured()?;
        let _guard = ReadGuard::acquire(&self.read_in_flight)?;
        let set = patterns.into();
        let mut matcher = Matcher::new(&set);
        if matcher.is_inert() {
            return Ok(None);
        }
        loop {
            let byte = self.rx.buffer.lock().consume_one();
            match byte {
                Some(b) => {
                    if let Some(index) = matcher.push(b) {
                        trace!(index, "expect matched");
                        return Ok(Some(index));
                    }
                }
                None => {
                    let deadline = Deadline::from_timeout_ms(timeout_ms);
                    if !self.rx.wait_for_data(&deadline).await {
                        trace!("expect timed out");
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// The active configuration, if the port is configured.
    pub fn config(&self) -> Option<SerialConfig> {
        self.control.lock().config
    }

    pub fn is_configured(&self) -> bool {
        self.control.lock().lifecycle == Lifecycle::Configured
    }

    /// Bytes currently pending in the RX buffer.
    pub fn rx_pending(&self) -> usize {
        self.rx.buffer.lock().pending()
    }

    /// Total RX bytes ever dropped by overflow eviction.
    pub fn rx_overflow_total(&self) -> u64 {
        self.rx.buffer.lock().overflow_total()
    }

    fn ensure_configured(&self) -> SerialResult<()> {
        match self.control.lock().lifecycle {
            Lifecycle::Configured => Ok(()),
            _ => Err(SerialError::PortNotConfigured),
        }
    }

    async fn collect(&self, length: usize, timeout_ms: Option<u64>) -> Vec<u8> {
        let deadline = Deadline::from_timeout_ms(timeout_ms);
        let mut out = Vec::with_capacity(length);
        while out.len() < length {
            let chunk = self.rx.buffer.lock().consume(length - out.len());
            if !chunk.is_empty() {
                out.extend_from_slice(&chunk);
                continue;
            }
            if !self.rx.wait_for_data(&deadline).await {
                break;
            }
        }
        out
    }

    fn drain_pending(&self) -> Option<String> {
        let mut buffer = self.rx.buffer.lock();
        let pending = buffer.pending();
        (pending > 0).then(|| ascii(buffer.consume(pending)))
    }
}

fn ascii(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).into_owned()
}
