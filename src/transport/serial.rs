//! # Serial Communication
//!
//! Opens the meter's customer interface (M-Bus or optical/IR reader on a
//! USB-serial adapter) with `tokio_serial` and enumerates available ports.

use super::Connector;
use crate::constants::{DEFAULT_BAUDRATE, DEFAULT_READ_TIMEOUT};
use crate::error::SmartMeterError;
use log::info;
use serde::Deserialize;
use std::time::Duration;
use tokio_serial::SerialPortBuilderExt;

/// Configuration for serial connection. Framing is fixed at 8N1.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub baudrate: u32,
    /// Deadline for a single read operation, in milliseconds
    pub timeout_ms: u64,
}

impl SerialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            baudrate: DEFAULT_BAUDRATE,
            timeout_ms: DEFAULT_READ_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Connector for real serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

#[async_trait::async_trait]
impl Connector for SerialConnector {
    type Port = tokio_serial::SerialStream;

    async fn open(
        &self,
        interface: &str,
        config: &SerialConfig,
    ) -> Result<Self::Port, SmartMeterError> {
        let port = tokio_serial::new(interface, config.baudrate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .timeout(config.timeout())
            .open_native_async()
            .map_err(|e| SmartMeterError::Connection(e.to_string()))?;

        info!(
            "Connection to serial port {interface} established ({} baud, 8N1)",
            config.baudrate
        );
        Ok(port)
    }

    fn available_ports(&self) -> Result<Vec<String>, SmartMeterError> {
        let ports = tokio_serial::available_ports()
            .map_err(|e| SmartMeterError::Connection(e.to_string()))?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}
