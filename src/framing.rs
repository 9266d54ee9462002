//! Electrical framing and line configuration.
//!
//! A [`SerialConfig`] bundles the selected port, baud rate and [`Framing`] and
//! enforces the cross-field constraints the UART silicon imposes:
//!
//! - 6 data bits can only be selected when parity is enabled (even or odd)
//! - 9 data bits can only be selected when parity is disabled
//! - the low-power port only supports whole stop bit lengths (1 and 2)
//!
//! All types carry serde derives so hosts can load framing from their own
//! configuration files.

use crate::error::{SerialError, SerialResult};
use serde::{Deserialize, Serialize};

/// The UART peripheral a session binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortId {
    /// Low-power UART. Restricted to whole stop bit lengths.
    Lpuart,
    /// Full-featured USART.
    Usart,
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortId::Lpuart => write!(f, "lpuart"),
            PortId::Usart => write!(f, "usart"),
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataBits {
    Six,
    Seven,
    Eight,
    Nine,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits, including the fractional lengths USART supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopBits {
    Half,
    One,
    OneAndHalf,
    Two,
}

/// Character framing for a serial line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framing {
    #[serde(default = "default_data_bits")]
    pub data_bits: DataBits,
    #[serde(default = "default_parity")]
    pub parity: Parity,
    #[serde(default = "default_stop_bits")]
    pub stop_bits: StopBits,
}

fn default_data_bits() -> DataBits {
    DataBits::Eight
}

fn default_parity() -> Parity {
    Parity::None
}

fn default_stop_bits() -> StopBits {
    StopBits::One
}

impl Default for Framing {
    /// 8 data bits, no parity, 1 stop bit.
    fn default() -> Self {
        Self {
            data_bits: default_data_bits(),
            parity: default_parity(),
            stop_bits: default_stop_bits(),
        }
    }
}

impl Framing {
    /// Check the cross-field constraints for the given port.
    pub fn validate_for(&self, port: PortId) -> SerialResult<()> {
        if self.data_bits == DataBits::Six && self.parity == Parity::None {
            return Err(SerialError::InvalidFraming("6 data bits require parity"));
        }
        if self.data_bits == DataBits::Nine && self.parity != Parity::None {
            return Err(SerialError::InvalidFraming("9 data bits forbid parity"));
        }
        if port == PortId::Lpuart
            && matches!(self.stop_bits, StopBits::Half | StopBits::OneAndHalf)
        {
            return Err(SerialError::InvalidFraming(
                "lpuart supports whole stop bit lengths only",
            ));
        }
        Ok(())
    }
}

/// Validated line configuration for one session. Immutable once a `setup`
/// succeeds; a subsequent `setup` replaces it wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialConfig {
    pub port: PortId,
    pub baud_rate: u32,
    #[serde(default)]
    pub framing: Framing,
}

impl SerialConfig {
    /// Validate a port/baud/framing combination. A missing framing defaults
    /// to 8-N-1.
    pub fn new(port: PortId, baud_rate: u32, framing: Option<Framing>) -> SerialResult<Self> {
        if baud_rate == 0 {
            return Err(SerialError::InvalidBaudRate(baud_rate));
        }
        let framing = framing.unwrap_or_default();
        framing.validate_for(port)?;
        Ok(Self {
            port,
            baud_rate,
            framing,
        })
    }
}
