//! Session lifecycle: setup/end sequencing, configuration replacement, and
//! the expansion-service contract, driven through the public API only.

use pretty_assertions::assert_eq;
use scripted_serial::{
    DataBits, Framing, MockHardware, Parity, PortId, SerialError, SerialPort, StopBits,
};

/// Opt into log output with e.g. `RUST_LOG=scripted_serial=trace`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test(start_paused = true)]
async fn full_session_then_clean_restart() {
    init_tracing();
    let mock = MockHardware::new();
    let port = SerialPort::new(Box::new(mock.clone()));

    port.setup(PortId::Lpuart, 9600, None).unwrap();
    port.write("hello").unwrap();
    mock.deliver(b"world");
    assert_eq!(port.read(5, Some(50)).await.unwrap().as_deref(), Some("world"));

    port.end();
    port.end(); // idempotent

    assert!(matches!(
        port.read_any(Some(0)).await,
        Err(SerialError::PortNotConfigured)
    ));

    // A fresh setup fully replaces the old configuration.
    let framing = Framing {
        data_bits: DataBits::Seven,
        parity: Parity::Odd,
        stop_bits: StopBits::Two,
    };
    port.setup(PortId::Usart, 115_200, Some(framing)).unwrap();
    let config = port.config().unwrap();
    assert_eq!(config.port, PortId::Usart);
    assert_eq!(config.baud_rate, 115_200);
    assert_eq!(config.framing, framing);
}

#[test]
fn expansion_service_is_restored_across_sessions() {
    let mock = MockHardware::new();
    let port = SerialPort::new(Box::new(mock.clone()));

    port.setup(PortId::Usart, 9600, None).unwrap();
    assert_eq!(
        mock.attached_config().map(|c| c.baud_rate),
        Some(9600),
        "the mock sees the line configuration"
    );
    port.end();
    assert!(mock.attached_config().is_none());

    port.setup(PortId::Usart, 9600, None).unwrap();
    port.end();

    assert_eq!(mock.service_events(), vec![false, true, false, true]);
    assert_eq!(mock.attach_count(), 2);
    assert_eq!(mock.detach_count(), 2);
}

#[test]
fn setup_rejects_bad_framing_through_the_public_api() {
    let port = SerialPort::new(Box::new(MockHardware::new()));

    let six_no_parity = Framing {
        data_bits: DataBits::Six,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };
    assert!(matches!(
        port.setup(PortId::Usart, 9600, Some(six_no_parity)),
        Err(SerialError::InvalidFraming(_))
    ));

    let nine_with_parity = Framing {
        data_bits: DataBits::Nine,
        parity: Parity::Even,
        stop_bits: StopBits::One,
    };
    assert!(matches!(
        port.setup(PortId::Usart, 9600, Some(nine_with_parity)),
        Err(SerialError::InvalidFraming(_))
    ));

    let fractional_on_lpuart = Framing {
        data_bits: DataBits::Eight,
        parity: Parity::None,
        stop_bits: StopBits::Half,
    };
    assert!(matches!(
        port.setup(PortId::Lpuart, 9600, Some(fractional_on_lpuart)),
        Err(SerialError::InvalidFraming(_))
    ));

    assert!(matches!(
        port.setup(PortId::Usart, 0, None),
        Err(SerialError::InvalidBaudRate(0))
    ));

    // Nothing above configured the port.
    assert!(!port.is_configured());
}

#[test]
fn nine_data_bits_without_parity_is_valid() {
    let port = SerialPort::new(Box::new(MockHardware::new()));
    let framing = Framing {
        data_bits: DataBits::Nine,
        parity: Parity::None,
        stop_bits: StopBits::One,
    };
    port.setup(PortId::Usart, 921_600, Some(framing)).unwrap();
    assert!(port.is_configured());
}

#[tokio::test(start_paused = true)]
async fn end_flushes_pending_rx_bytes() {
    let mock = MockHardware::new();
    let port = SerialPort::new(Box::new(mock.clone()));
    port.setup(PortId::Usart, 9600, None).unwrap();

    mock.deliver(b"leftover");
    port.end();
    port.setup(PortId::Usart, 9600, None).unwrap();

    // The new session starts with an empty stream.
    assert_eq!(port.rx_pending(), 0);
    assert!(port.read_any(Some(0)).await.unwrap().is_none());
}
