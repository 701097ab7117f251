//! # Transport
//!
//! The byte-oriented link to the meter. [`Connector`] opens ports and lists the
//! ones present on the system; [`Transport`] wraps an open port and provides
//! the two bounded read primitives the frame reader is built on.
//!
//! Any `AsyncRead` can serve as a port, which lets the frame reader and the
//! meter session run against [`mock::MockSerialPort`] in tests.

pub mod mock;
pub mod serial;

pub use mock::{MockConnector, MockSerialPort};
pub use serial::{SerialConfig, SerialConnector};

use crate::error::SmartMeterError;
use log::debug;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout_at, Instant};

/// Opens connections to a meter interface.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    type Port: AsyncRead + Unpin + Send;

    /// Open `interface` with the given serial settings.
    async fn open(&self, interface: &str, config: &SerialConfig)
        -> Result<Self::Port, SmartMeterError>;

    /// Names of the interfaces present on this system.
    fn available_ports(&self) -> Result<Vec<String>, SmartMeterError>;
}

/// An open connection with deadline-bounded reads.
pub struct Transport<P> {
    port: Option<P>,
    timeout: Duration,
}

impl<P: AsyncRead + Unpin + Send> Transport<P> {
    pub fn new(port: P, timeout: Duration) -> Self {
        Transport {
            port: Some(port),
            timeout,
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Release the port. Further reads fail with `NotConnected`.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Transport closed");
        }
    }

    /// Read exactly `n` bytes within one timeout period.
    ///
    /// A timeout or end of stream before `n` bytes arrived is reported as
    /// `Timeout` carrying the number of bytes received; I/O errors as `Connection`.
    pub async fn read_exact(&mut self, n: usize) -> Result<Vec<u8>, SmartMeterError> {
        let deadline = Instant::now() + self.timeout;
        let port = self.port.as_mut().ok_or(SmartMeterError::NotConnected)?;

        let mut buf = vec![0u8; n];
        let mut filled = 0;
        while filled < n {
            match timeout_at(deadline, port.read(&mut buf[filled..])).await {
                Err(_) | Ok(Ok(0)) => {
                    return Err(SmartMeterError::Timeout {
                        expected: n,
                        received: filled,
                    })
                }
                Ok(Err(e)) => return Err(SmartMeterError::Connection(e.to_string())),
                Ok(Ok(read)) => filled += read,
            }
        }
        Ok(buf)
    }

    /// Consume bytes up to and including the next `marker`.
    ///
    /// Returns the number of bytes consumed, or `None` if `limit` bytes were
    /// consumed without seeing the marker.
    pub async fn read_until(
        &mut self,
        marker: u8,
        limit: usize,
    ) -> Result<Option<usize>, SmartMeterError> {
        let deadline = Instant::now() + self.timeout;
        let port = self.port.as_mut().ok_or(SmartMeterError::NotConnected)?;

        let mut consumed = 0;
        while consumed < limit {
            let byte = match timeout_at(deadline, port.read_u8()).await {
                Err(_) => {
                    return Err(SmartMeterError::Timeout {
                        expected: 1,
                        received: 0,
                    })
                }
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(SmartMeterError::Timeout {
                        expected: 1,
                        received: 0,
                    })
                }
                Ok(Err(e)) => return Err(SmartMeterError::Connection(e.to_string())),
                Ok(Ok(byte)) => byte,
            };
            consumed += 1;
            if byte == marker {
                return Ok(Some(consumed));
            }
        }
        Ok(None)
    }
}
