//! Serial-line transport to the flip-dot controller
//!
//! The controller board enumerates as a USB CDC device (usually
//! `/dev/ttyACM0`) and expects 8N1 framing without flow control.

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Write};
use std::time::Duration;

use super::{Transport, TransportError, DEFAULT_BAUD_RATE, DEFAULT_SERIAL_PATH};

/// Baud rates the controller's DIP switches can select
pub const CONTROLLER_BAUD_RATES: &[u32] = &[
    2400,   // Factory default on older boards
    4800,   // Legacy
    9600,   // Legacy
    19200,  // Common for RS-485 chains
    38400,  // Fast
    57600,  // Default for USB controllers
    115200, // Maximum
];

/// Configuration for the serial connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyACM0, /dev/ttyUSB0)
    pub port_path: String,
    /// Baud rate (default: 57600)
    pub baud_rate: u32,
    /// Data bits (default: 8)
    pub data_bits: DataBits,
    /// Parity (default: None)
    pub parity: Parity,
    /// Stop bits (default: 1)
    pub stop_bits: StopBits,
    /// Flow control (default: None)
    pub flow_control: FlowControl,
    /// Timeout applied to blocking writes
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: DEFAULT_SERIAL_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(500),
        }
    }
}

impl PortConfig {
    /// Create a new configuration with the controller's default settings
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    /// Set the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }
}

/// Persistent serial connection to the controller
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    config: PortConfig,
}

impl SerialTransport {
    /// Open the serial port
    ///
    /// Fails if the device is missing or not accessible (check membership
    /// of the `dialout` group).
    pub fn open(config: PortConfig) -> Result<Self, TransportError> {
        if !CONTROLLER_BAUD_RATES.contains(&config.baud_rate) {
            log::warn!(
                "Baud rate {} is not one the controller supports, expect garbage",
                config.baud_rate
            );
        }

        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| TransportError::Open {
                target: config.port_path.clone(),
                source: io::Error::from(e),
            })?;

        log::info!(
            "Opened serial port {} at {} baud",
            config.port_path,
            config.baud_rate
        );

        Ok(Self { port, config })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port
            .write_all(bytes)
            .and_then(|()| self.port.flush())
            .map_err(|source| TransportError::Write {
                target: self.config.port_path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        format!("serial {} @ {} baud", self.config.port_path, self.config.baud_rate)
    }
}

/// List the serial ports present on this machine
pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>, TransportError> {
    serialport::available_ports().map_err(|e| TransportError::Open {
        target: "serial port enumeration".to_string(),
        source: io::Error::from(e),
    })
}
