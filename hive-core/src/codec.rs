//! Framed TCP I/O via `tokio_util`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::HiveError;
use crate::frame::{Frame, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
use crate::header::{FrameHeader, HEADER_SIZE};

/// Stateless codec turning a byte stream into [`Frame`]s and back.
#[derive(Debug, Default)]
pub struct DroneCodec;

impl Decoder for DroneCodec {
    type Item = Frame;
    type Error = HiveError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_SIZE {
            src.reserve(HEADER_SIZE - src.len());
            return Ok(None);
        }

        // Peek at the header without consuming; the magic and length
        // checks run before any payload has arrived.
        let header = FrameHeader::decode(&src[..HEADER_SIZE])?;
        let payload_len = header.payload_length() as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(HiveError::FrameTooLarge {
                size: HEADER_SIZE + payload_len,
                max: MAX_FRAME_SIZE,
            });
        }

        let total = HEADER_SIZE + payload_len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame_bytes = src.split_to(total);
        let frame = Frame::from_bytes(&frame_bytes)?;
        Ok(Some(frame))
    }
}

impl Encoder<Frame> for DroneCodec {
    type Error = HiveError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = item.to_bytes();
        dst.reserve(bytes.len());
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}
