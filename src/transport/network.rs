//! TCP transport to the panel simulator
//!
//! The simulator listens on a TCP port and renders the same framed bytes
//! the physical controller would receive over serial.

use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{Transport, TransportError};

/// Timeout for a single frame write
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Timeout for establishing the connection, per resolved address
const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Persistent TCP connection, re-established after a failed write
pub struct NetworkTransport {
    host: String,
    port: u16,
    stream: Option<TcpStream>,
}

impl NetworkTransport {
    /// Connect to the simulator
    ///
    /// A refused connection is returned as [`TransportError::Open`].
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let stream = open_stream(host, port).map_err(|source| TransportError::Open {
            target: format!("{}:{}", host, port),
            source,
        })?;

        log::info!("Connected to simulator at {}:{}", host, port);

        Ok(Self {
            host: host.to_string(),
            port,
            stream: Some(stream),
        })
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn open_stream(host: &str, port: u16) -> io::Result<TcpStream> {
    let mut last_error = None;
    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => return configure(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("{} did not resolve", host))
    }))
}

fn configure(stream: TcpStream) -> io::Result<TcpStream> {
    stream.set_nodelay(true)?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
    Ok(stream)
}

impl Transport for NetworkTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => {
                let stream = open_stream(&self.host, self.port).map_err(|source| {
                    TransportError::Write {
                        target: self.target(),
                        source,
                    }
                })?;
                log::info!("Reconnected to simulator at {}", self.target());
                stream
            }
        };

        // On failure the stream is dropped so the next write reconnects
        match stream.write_all(bytes).and_then(|()| stream.flush()) {
            Ok(()) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(source) => Err(TransportError::Write {
                target: self.target(),
                source,
            }),
        }
    }

    fn describe(&self) -> String {
        format!("tcp {}", self.target())
    }
}
