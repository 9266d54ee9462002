//! Mock hardware collaborator for testing.
//!
//! Simulates the peripheral boundary without real hardware: records every
//! transmission and expansion-service toggle, optionally loops transmitted
//! bytes straight back into the RX stream, and can be told to fail the next
//! transmit.

use super::{HardwareError, SerialHardware};
use crate::framing::SerialConfig;
use crate::rx::RxHandle;
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockState {
    /// Line configuration of the current attachment, if any.
    attached: Option<SerialConfig>,
    /// Delivery sink handed over at attach time.
    rx: Option<RxHandle>,
    /// Every transmit call, in order.
    transmissions: Vec<Vec<u8>>,
    /// Every expansion-service toggle, in order.
    service_events: Vec<bool>,
    /// Whether the next transmit should fail.
    fail_next_transmit: bool,
    /// Echo transmitted bytes back into the RX stream.
    loopback: bool,
    attach_count: u32,
    detach_count: u32,
}

/// Mock hardware with a cloneable shared-state handle.
///
/// Hand one clone to the port core and keep another in the test:
///
/// ```
/// use scripted_serial::{MockHardware, SerialPort};
///
/// let mock = MockHardware::new();
/// let port = SerialPort::new(Box::new(mock.clone()));
/// // ... drive the port, then inspect `mock.transmissions()` etc.
/// # let _ = port;
/// ```
#[derive(Clone, Default)]
pub struct MockHardware {
    state: Arc<Mutex<MockState>>,
}

impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the interrupt/DMA side pushing received bytes. Bytes sent
    /// while detached are dropped, as a dead peripheral would drop them.
    pub fn deliver(&self, bytes: &[u8]) {
        let state = self.state.lock();
        if let Some(rx) = &state.rx {
            rx.deliver(bytes);
        }
    }

    /// Echo every transmitted byte back into the RX stream.
    pub fn set_loopback(&self, enabled: bool) {
        self.state.lock().loopback = enabled;
    }

    /// Make the next transmit fail outright.
    pub fn fail_next_transmit(&self) {
        self.state.lock().fail_next_transmit = true;
    }

    /// All transmissions so far, in order.
    pub fn transmissions(&self) -> Vec<Vec<u8>> {
        self.state.lock().transmissions.clone()
    }

    /// All expansion-service toggles so far, in order.
    pub fn service_events(&self) -> Vec<bool> {
        self.state.lock().service_events.clone()
    }

    /// The configuration of the current attachment, if attached.
    pub fn attached_config(&self) -> Option<SerialConfig> {
        self.state.lock().attached
    }

    pub fn attach_count(&self) -> u32 {
        self.state.lock().attach_count
    }

    pub fn detach_count(&self) -> u32 {
        self.state.lock().detach_count
    }
}

impl SerialHardware for MockHardware {
    fn attach(&mut self, config: &SerialConfig, rx: RxHandle) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        state.attached = Some(*config);
        state.rx = Some(rx);
        state.attach_count += 1;
        Ok(())
    }

    fn detach(&mut self) {
        let mut state = self.state.lock();
        state.attached = None;
        state.rx = None;
        state.detach_count += 1;
    }

    fn transmit(&mut self, bytes: &[u8]) -> Result<(), HardwareError> {
        let mut state = self.state.lock();
        if state.attached.is_none() {
            return Err(HardwareError::port_unavailable("mock is detached"));
        }
        if state.fail_next_transmit {
            state.fail_next_transmit = false;
            return Err(HardwareError::Transmit(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "injected transmit fault",
            )));
        }
        state.transmissions.push(bytes.to_vec());
        if state.loopback {
            if let Some(rx) = &state.rx {
                rx.deliver(bytes);
            }
        }
        Ok(())
    }

    fn set_expansion_service(&mut self, enabled: bool) {
        self.state.lock().service_events.push(enabled);
    }
}

impl std::fmt::Debug for MockHardware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MockHardware")
            .field("attached", &state.attached.is_some())
            .field("transmissions", &state.transmissions.len())
            .finish()
    }
}
