//! Byte transports to the flip-dot controller
//!
//! This module provides functionality for:
//! - A single [`Transport`] capability, `write(bytes)`, shared by every carrier
//! - A serial-line carrier for the physical controller (`serial` feature)
//! - A TCP carrier for the development simulator
//!
//! The carrier is chosen once at startup from a [`TransportConfig`].

pub mod network;
#[cfg(feature = "serial")]
pub mod serial;

pub use network::NetworkTransport;
#[cfg(feature = "serial")]
pub use serial::{PortConfig, SerialTransport};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;

/// Default serial device of the controller's USB adapter
pub const DEFAULT_SERIAL_PATH: &str = "/dev/ttyACM0";

/// Default controller baud rate
pub const DEFAULT_BAUD_RATE: u32 = 57600;

/// Default simulator host
pub const DEFAULT_SIMULATOR_HOST: &str = "127.0.0.1";

/// Default simulator port
pub const DEFAULT_SIMULATOR_PORT: u16 = 3000;

/// Transport failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// The link could not be established
    #[error("failed to open {target}: {source}")]
    Open {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Bytes could not be delivered over an established link
    #[error("failed to write to {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: io::Error,
    },

    /// The carrier was not compiled into this build
    #[error("{0}")]
    Unsupported(String),
}

/// A byte sink to the panel controller
///
/// Implementations keep their connection open between writes. A failed
/// write is recoverable: the caller may simply try again later.
pub trait Transport: Send {
    /// Deliver a complete framed message
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Human readable description of the link, for logs
    fn describe(&self) -> String;
}

/// Which carrier to use and where it points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Serial line to the physical controller
    Serial {
        path: String,
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },
    /// TCP connection to the simulator
    Network { host: String, port: u16 },
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig::Serial {
            path: DEFAULT_SERIAL_PATH.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl TransportConfig {
    /// Network configuration pointing at the local simulator
    pub fn simulator() -> Self {
        TransportConfig::Network {
            host: DEFAULT_SIMULATOR_HOST.to_string(),
            port: DEFAULT_SIMULATOR_PORT,
        }
    }

    /// Open the configured carrier
    ///
    /// Failing here is fatal for the caller: without a link there is
    /// nothing to display on.
    pub fn open(&self) -> Result<Box<dyn Transport>, TransportError> {
        match self {
            TransportConfig::Network { host, port } => {
                Ok(Box::new(NetworkTransport::connect(host, *port)?))
            }
            #[cfg(feature = "serial")]
            TransportConfig::Serial { path, baud_rate } => {
                let config = PortConfig::new(path).with_baud_rate(*baud_rate);
                Ok(Box::new(SerialTransport::open(config)?))
            }
            #[cfg(not(feature = "serial"))]
            TransportConfig::Serial { path, .. } => Err(TransportError::Unsupported(format!(
                "cannot open serial port {}: built without the `serial` feature",
                path
            ))),
        }
    }
}

impl fmt::Display for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportConfig::Serial { path, baud_rate } => {
                write!(f, "serial {} @ {} baud", path, baud_rate)
            }
            TransportConfig::Network { host, port } => write!(f, "tcp {}:{}", host, port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_serial_controller() {
        let config = TransportConfig::default();
        assert_eq!(
            config,
            TransportConfig::Serial {
                path: "/dev/ttyACM0".to_string(),
                baud_rate: 57600
            }
        );
        assert_eq!(config.to_string(), "serial /dev/ttyACM0 @ 57600 baud");
    }

    #[test]
    fn test_simulator_config() {
        let config = TransportConfig::simulator();
        assert_eq!(config.to_string(), "tcp 127.0.0.1:3000");
    }

    #[test]
    fn test_tagged_deserialization() {
        let config: TransportConfig =
            toml::from_str("type = \"network\"\nhost = \"10.0.0.2\"\nport = 4000\n").unwrap();
        assert_eq!(
            config,
            TransportConfig::Network {
                host: "10.0.0.2".to_string(),
                port: 4000
            }
        );

        let config: TransportConfig =
            toml::from_str("type = \"serial\"\npath = \"/dev/ttyUSB1\"\n").unwrap();
        assert_eq!(
            config,
            TransportConfig::Serial {
                path: "/dev/ttyUSB1".to_string(),
                baud_rate: 57600
            }
        );
    }

    #[test]
    fn test_open_refused_network_is_an_open_error() {
        // Bind then drop to get a port with nothing listening on it
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = TransportConfig::Network {
            host: "127.0.0.1".to_string(),
            port,
        };

        match config.open() {
            Err(TransportError::Open { target, .. }) => assert!(target.contains(&port.to_string())),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("connection to a closed port succeeded"),
        }
    }

    #[cfg(not(feature = "serial"))]
    #[test]
    fn test_serial_without_feature_is_unsupported() {
        let result = TransportConfig::default().open();
        assert!(matches!(result, Err(TransportError::Unsupported(_))));
    }
}
