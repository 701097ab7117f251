//! # Smart Meter Session
//!
//! [`SmartMeter`] owns the connection to one meter and turns push frames into
//! [`MeterReading`]s. It connects lazily: every call to
//! [`SmartMeter::read_meter_data`] opens the port first if needed, and a
//! failed open or read simply yields no reading for that cycle.
//!
//! A payload that does not decrypt to a data notification is different: the
//! key is wrong and polling again will not help, so that error is returned
//! to the caller.
//!
//! The last frame is kept as received. Decrypted bytes and decoded readings
//! are recomputed from it on request and never stored.
//!
//! ```rust,no_run
//! use smartmeter_rs::{MeterConfig, SmartMeter};
//!
//! # async fn run() -> Result<(), smartmeter_rs::SmartMeterError> {
//! let config = MeterConfig::new("/dev/ttyUSB0", "00112233445566778899AABBCCDDEEFF");
//! let mut meter = SmartMeter::open(config)?;
//! while let Some(reading) = meter.read_meter_data().await? {
//!     println!("{reading}");
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::MeterConfig;
use crate::constants::{FRAME_LENGTH, HDLC_FLAG};
use crate::crypto::{decrypt, DecryptionKey};
use crate::error::SmartMeterError;
use crate::hdlc::{read_frame, Frame};
use crate::payload::{decode_payload, MeterReading};
use crate::transport::{Connector, SerialConfig, SerialConnector, Transport};
use crate::util::hex::format_hex_compact;
use log::{debug, error, info, warn};

/// Connection and decoding state for one meter.
pub struct SmartMeter<C: Connector = SerialConnector> {
    connector: C,
    interface: String,
    key: DecryptionKey,
    serial: SerialConfig,
    resync_budget: usize,
    verify_fcs: bool,
    transport: Option<Transport<C::Port>>,
    last_frame: Option<Frame>,
}

impl SmartMeter<SerialConnector> {
    /// Create a session on a real serial port.
    pub fn open(config: MeterConfig) -> Result<Self, SmartMeterError> {
        Self::with_connector(SerialConnector, config)
    }
}

impl<C: Connector> SmartMeter<C> {
    /// Create a session using `connector`.
    ///
    /// Fails with a configuration error if the key is malformed or the
    /// interface is not among the connector's available ports. Does not
    /// open the port.
    pub fn with_connector(connector: C, config: MeterConfig) -> Result<Self, SmartMeterError> {
        let key = config.decryption_key()?;

        // A port list that cannot be read leaves no interface to validate against.
        let available = connector.available_ports().unwrap_or_else(|e| {
            warn!("Unable to enumerate serial ports: {e}");
            Vec::new()
        });
        if !available.contains(&config.interface) {
            return Err(SmartMeterError::InterfaceNotFound {
                interface: config.interface,
                available,
            });
        }

        Ok(SmartMeter {
            connector,
            interface: config.interface,
            key,
            serial: config.serial,
            resync_budget: config.resync_budget,
            verify_fcs: config.verify_fcs,
            transport: None,
            last_frame: None,
        })
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Serial ports present on this system.
    pub fn available_ports(&self) -> Result<Vec<String>, SmartMeterError> {
        self.connector.available_ports()
    }

    pub fn is_connected(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_open)
    }

    /// Open (or reopen) the serial connection.
    pub async fn connect(&mut self) -> Result<(), SmartMeterError> {
        self.close();

        match self.connector.open(&self.interface, &self.serial).await {
            Ok(port) => {
                self.transport = Some(Transport::new(port, self.serial.timeout()));
                Ok(())
            }
            Err(e) => {
                error!("Unable to open {}: {e}", self.interface);
                Err(e)
            }
        }
    }

    /// Release the serial connection. The last frame is kept.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if transport.is_open() {
                info!("Closing connection to {}", self.interface);
            }
            transport.close();
        }
    }

    /// Read the next push frame and decode it.
    ///
    /// Returns `Ok(None)` when the port cannot be opened or the read fails;
    /// the connection stays open and the next call tries again.
    pub async fn read_meter_data(&mut self) -> Result<Option<MeterReading>, SmartMeterError> {
        if !self.is_connected() && self.connect().await.is_err() {
            return Ok(None);
        }
        let Some(transport) = self.transport.as_mut() else {
            return Ok(None);
        };

        let frame = match read_frame(transport, FRAME_LENGTH, HDLC_FLAG, self.resync_budget).await
        {
            Ok(frame) => frame,
            Err(e) if e.is_connection_error() => {
                warn!("No data received from {}: {e}", self.interface);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        debug!(
            "Received frame (invocation counter {:?}): {}",
            frame.invocation_counter(),
            format_hex_compact(frame.as_bytes())
        );

        if self.verify_fcs {
            if let Err(e) = frame.verify_fcs() {
                warn!("Dropping garbled frame: {e}");
                return Ok(None);
            }
        }

        let frame = self.last_frame.insert(frame);
        decode_frame(frame, &self.key).map(Some)
    }

    /// The last frame received, as read from the wire.
    pub fn last_raw_frame(&self) -> Option<&Frame> {
        self.last_frame.as_ref()
    }

    /// Decrypt the last frame again. The result is not validated.
    pub fn last_decrypted_payload(&self) -> Result<Option<Vec<u8>>, SmartMeterError> {
        self.last_frame
            .as_ref()
            .map(|frame| decrypt(frame, &self.key))
            .transpose()
    }

    /// Decrypt and decode the last frame again.
    pub fn last_meter_data(&self) -> Result<Option<MeterReading>, SmartMeterError> {
        self.last_frame
            .as_ref()
            .map(|frame| decode_frame(frame, &self.key))
            .transpose()
    }
}

impl<C: Connector> Drop for SmartMeter<C> {
    fn drop(&mut self) {
        self.close();
    }
}

fn decode_frame(frame: &Frame, key: &DecryptionKey) -> Result<MeterReading, SmartMeterError> {
    let plaintext = decrypt(frame, key)?;
    decode_payload(&plaintext).map_err(|e| {
        error!("Decryption key seems not to be correct: {e}");
        SmartMeterError::from(e)
    })
}
