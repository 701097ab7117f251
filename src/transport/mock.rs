//! Mock serial port implementation for testing
//!
//! This module provides an in-memory port and connector that can be used to
//! test the frame reader and the meter session without a meter attached.

use super::{Connector, SerialConfig};
use crate::error::SmartMeterError;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock serial port that replays queued bytes. Clones share their buffers.
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data to be read from the port
    rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Error returned by the next read
    next_error: Arc<Mutex<Option<io::Error>>>,
    /// Stay pending instead of signalling end of stream once drained
    stall_when_empty: Arc<AtomicBool>,
    /// Upper bound on bytes handed out per read call
    chunk_size: Arc<AtomicUsize>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        lock(&self.rx_buffer).extend(data);
    }

    /// Bytes not yet consumed by a reader
    pub fn remaining(&self) -> usize {
        lock(&self.rx_buffer).len()
    }

    /// Clear queued data
    pub fn clear(&self) {
        lock(&self.rx_buffer).clear();
    }

    /// Set an error to be returned on the next read
    pub fn set_next_error(&self, error: io::Error) {
        *lock(&self.next_error) = Some(error);
    }

    /// When set, an empty port never completes a read, like a silent serial line.
    pub fn set_stall_when_empty(&self, stall: bool) {
        self.stall_when_empty.store(stall, Ordering::SeqCst);
    }

    /// Deliver at most `size` bytes per read, like a UART FIFO. Zero means unbounded.
    pub fn set_chunk_size(&self, size: usize) {
        self.chunk_size.store(size, Ordering::SeqCst);
    }
}

impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if let Some(error) = lock(&self.next_error).take() {
            return Poll::Ready(Err(error));
        }

        let mut rx = lock(&self.rx_buffer);
        if rx.is_empty() && self.stall_when_empty.load(Ordering::SeqCst) {
            // Nothing will wake us; the caller's deadline ends the read.
            return Poll::Pending;
        }

        let mut available = rx.len().min(buf.remaining());
        let chunk = self.chunk_size.load(Ordering::SeqCst);
        if chunk > 0 {
            available = available.min(chunk);
        }

        if available > 0 {
            let data: Vec<u8> = rx.drain(..available).collect();
            buf.put_slice(&data);
        }

        Poll::Ready(Ok(()))
    }
}

/// Connector handing out clones of one [`MockSerialPort`].
#[derive(Clone)]
pub struct MockConnector {
    pub port: MockSerialPort,
    ports: Vec<String>,
    fail_open: Arc<AtomicBool>,
    fail_enumeration: Arc<AtomicBool>,
    open_attempts: Arc<AtomicUsize>,
}

impl MockConnector {
    /// A connector that lists `ports` and opens successfully.
    pub fn new(ports: &[&str]) -> Self {
        MockConnector {
            port: MockSerialPort::new(),
            ports: ports.iter().map(|p| p.to_string()).collect(),
            fail_open: Arc::new(AtomicBool::new(false)),
            fail_enumeration: Arc::new(AtomicBool::new(false)),
            open_attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make subsequent opens fail (device busy, permissions, unplugged).
    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make port enumeration fail, as when the system port list is unreadable.
    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Number of times `open` was called
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for MockConnector {
    type Port = MockSerialPort;

    async fn open(
        &self,
        interface: &str,
        _config: &SerialConfig,
    ) -> Result<Self::Port, SmartMeterError> {
        self.open_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(SmartMeterError::Connection(format!(
                "could not open port {interface}: Device or resource busy"
            )));
        }
        Ok(self.port.clone())
    }

    fn available_ports(&self) -> Result<Vec<String>, SmartMeterError> {
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(SmartMeterError::Connection(
                "unable to enumerate serial ports".to_string(),
            ));
        }
        Ok(self.ports.clone())
    }
}
