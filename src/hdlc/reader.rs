//! # Frame Reader
//!
//! Recovers whole push frames from the serial byte stream. The meter sends
//! fixed-length frames back to back; a reader that starts listening in the
//! middle of one sees a buffer whose first and last byte are not both the
//! HDLC flag. It then drops everything up to and including the next flag and
//! tries again.
//!
//! Resynchronization is bounded by a byte budget so a line carrying something
//! other than push frames (wrong baud rate, different meter model) ends in
//! `FramingDesync` instead of searching forever.

use crate::error::SmartMeterError;
use crate::hdlc::frame::Frame;
use crate::transport::Transport;
use crate::util::hex::format_hex_compact;
use log::debug;
use tokio::io::AsyncRead;

/// Read one aligned frame of `expected_length` bytes delimited by `marker`.
///
/// At most `resync_budget` bytes are discarded while searching for a frame
/// boundary. Transport failures are propagated unchanged.
pub async fn read_frame<P>(
    transport: &mut Transport<P>,
    expected_length: usize,
    marker: u8,
    resync_budget: usize,
) -> Result<Frame, SmartMeterError>
where
    P: AsyncRead + Unpin + Send,
{
    let mut discarded = 0usize;

    loop {
        let data = match Frame::from_aligned(transport.read_exact(expected_length).await?, marker) {
            Ok(frame) => {
                if discarded > 0 {
                    debug!("Resynchronized after discarding {discarded} bytes");
                }
                return Ok(frame);
            }
            Err(data) => data,
        };

        debug!(
            "Started receiving in the middle of a frame, waiting for the next one ({} .. {})",
            format_hex_compact(&data[..data.len().min(4)]),
            format_hex_compact(&data[data.len().saturating_sub(4)..]),
        );

        discarded += data.len();
        if discarded >= resync_budget {
            return Err(SmartMeterError::FramingDesync { discarded });
        }

        match transport.read_until(marker, resync_budget - discarded).await? {
            Some(consumed) => discarded += consumed,
            None => {
                return Err(SmartMeterError::FramingDesync {
                    discarded: resync_budget,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DEFAULT_RESYNC_BUDGET, FRAME_LENGTH, HDLC_FLAG};
    use crate::transport::MockSerialPort;
    use proptest::prelude::*;
    use std::time::Duration;

    fn frame_filled(fill: u8) -> Vec<u8> {
        let mut data = vec![fill; FRAME_LENGTH];
        data[0] = HDLC_FLAG;
        data[FRAME_LENGTH - 1] = HDLC_FLAG;
        data
    }

    fn transport(mock: &MockSerialPort) -> Transport<MockSerialPort> {
        Transport::new(mock.clone(), Duration::from_millis(50))
    }

    async fn read(mock: &MockSerialPort, budget: usize) -> Result<Frame, SmartMeterError> {
        read_frame(&mut transport(mock), FRAME_LENGTH, HDLC_FLAG, budget).await
    }

    #[tokio::test]
    async fn test_aligned_stream() {
        let mock = MockSerialPort::new();
        mock.queue_rx_data(&frame_filled(0x11));
        mock.queue_rx_data(&frame_filled(0x22));

        let frame = read(&mock, DEFAULT_RESYNC_BUDGET).await.unwrap();
        assert_eq!(frame.as_bytes(), frame_filled(0x11).as_slice());
        assert_eq!(mock.remaining(), FRAME_LENGTH);
    }

    #[tokio::test]
    async fn test_resync_after_mid_frame_start() {
        let mock = MockSerialPort::new();
        // Tail of a previous frame, then two complete frames.
        let previous = frame_filled(0x33);
        mock.queue_rx_data(&previous[FRAME_LENGTH - 10..]);
        mock.queue_rx_data(&frame_filled(0x11));
        mock.queue_rx_data(&frame_filled(0x22));

        // First read: 10 tail bytes + 95 bytes of frame 0x11, misaligned.
        // Discarding through the next flag consumes the rest of frame 0x11.
        let frame = read(&mock, DEFAULT_RESYNC_BUDGET).await.unwrap();
        assert_eq!(frame.as_bytes(), frame_filled(0x22).as_slice());
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn test_resync_with_fragmented_reads() {
        let mock = MockSerialPort::new();
        mock.set_chunk_size(7);
        mock.queue_rx_data(&[0x01, 0x02, 0x03]);
        mock.queue_rx_data(&frame_filled(0x11));
        mock.queue_rx_data(&frame_filled(0x22));

        let frame = read(&mock, DEFAULT_RESYNC_BUDGET).await.unwrap();
        assert_eq!(frame.as_bytes(), frame_filled(0x22).as_slice());
    }

    #[tokio::test]
    async fn test_budget_exhausted_on_garbage() {
        let mock = MockSerialPort::new();
        mock.queue_rx_data(&vec![0x55; 4 * FRAME_LENGTH]);

        let err = read(&mock, 2 * FRAME_LENGTH).await.unwrap_err();
        assert!(matches!(
            err,
            SmartMeterError::FramingDesync { discarded } if discarded == 2 * FRAME_LENGTH
        ));
    }

    #[tokio::test]
    async fn test_budget_smaller_than_frame() {
        let mock = MockSerialPort::new();
        mock.queue_rx_data(&[0x55; FRAME_LENGTH]);

        let err = read(&mock, 10).await.unwrap_err();
        assert!(matches!(err, SmartMeterError::FramingDesync { discarded: FRAME_LENGTH }));
    }

    #[tokio::test]
    async fn test_short_read_is_transport_failure() {
        let mock = MockSerialPort::new();
        mock.queue_rx_data(&frame_filled(0x11)[..50]);

        let err = read(&mock, DEFAULT_RESYNC_BUDGET).await.unwrap_err();
        assert!(matches!(
            err,
            SmartMeterError::Timeout { expected: FRAME_LENGTH, received: 50 }
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_during_resync() {
        let mock = MockSerialPort::new();
        mock.set_stall_when_empty(true);
        mock.queue_rx_data(&[0x55; FRAME_LENGTH + 3]);

        let err = read(&mock, DEFAULT_RESYNC_BUDGET).await.unwrap_err();
        assert!(err.is_connection_error());
    }

    proptest! {
        #[test]
        fn prop_aligned_frame_returned_unchanged(
            interior in proptest::collection::vec(any::<u8>(), FRAME_LENGTH - 2)
        ) {
            let mut data = vec![HDLC_FLAG];
            data.extend_from_slice(&interior);
            data.push(HDLC_FLAG);

            let mock = MockSerialPort::new();
            mock.queue_rx_data(&data);
            let frame = tokio_test::block_on(read(&mock, DEFAULT_RESYNC_BUDGET)).unwrap();
            prop_assert_eq!(frame.into_bytes(), data);
        }
    }
}
