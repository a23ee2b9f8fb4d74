//! The unit of exchange between client and drone: a header plus an
//! opaque payload.
//!
//! Payloads are bincode-encoded structures from [`crate::proto`]. A
//! blake3-derived checksum over the payload bytes is carried in the
//! header and verified on receipt. Bulk payloads (capture buffers) may
//! be zstd-compressed, signalled by [`FrameFlags::COMPRESSED`].

use crate::error::HiveError;
use crate::flags::FrameFlags;
use crate::header::{FrameHeader, HEADER_SIZE};
use crate::message::{Method, MessageType};

/// Largest payload a frame may carry. Sized for whole capture buffers.
pub const MAX_PAYLOAD_SIZE: usize = 16 * 1024 * 1024;

/// Largest on-wire frame: header plus maximum payload.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// First 4 bytes of blake3 over the payload; 0 for empty payloads.
fn payload_checksum(payload: &[u8]) -> u32 {
    if payload.is_empty() {
        return 0;
    }
    let hash = blake3::hash(payload);
    u32::from_le_bytes(hash.as_bytes()[0..4].try_into().expect("4-byte slice"))
}

/// A single protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Vec<u8>,
}

impl Frame {
    fn build(
        message_type: MessageType,
        flags: FrameFlags,
        method: Method,
        request_id: u64,
        payload: Vec<u8>,
    ) -> Result<Self, HiveError> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(HiveError::PayloadTooLarge {
                size: payload.len(),
                max: MAX_PAYLOAD_SIZE,
            });
        }
        let header = FrameHeader::new(
            payload_checksum(&payload),
            message_type as u32,
            flags.bits(),
            method as u64,
            request_id,
            payload.len() as u64,
        );
        Ok(Self { header, payload })
    }

    /// A keep-alive frame. Request id 0 is reserved for these.
    pub fn heartbeat() -> Self {
        Self::build(
            MessageType::Request,
            FrameFlags::NONE,
            Method::Heartbeat,
            0,
            Vec::new(),
        )
        .expect("empty payload always fits")
    }

    /// A client → drone call frame.
    pub fn new_request(
        request_id: u64,
        method: Method,
        payload: Vec<u8>,
    ) -> Result<Self, HiveError> {
        Self::build(MessageType::Request, FrameFlags::NONE, method, request_id, payload)
    }

    /// A drone → client reply frame.
    pub fn new_response(
        request_id: u64,
        method: Method,
        payload: Vec<u8>,
    ) -> Result<Self, HiveError> {
        Self::build(MessageType::Response, FrameFlags::NONE, method, request_id, payload)
    }

    /// A reply frame with explicit flags (error faults, compressed bulk).
    pub fn new_response_with_flags(
        request_id: u64,
        method: Method,
        payload: Vec<u8>,
        flags: FrameFlags,
    ) -> Result<Self, HiveError> {
        Self::build(MessageType::Response, flags, method, request_id, payload)
    }

    /// A reply frame whose payload is stored zstd-compressed.
    ///
    /// The checksum covers the compressed bytes as they travel on the
    /// wire; [`decompressed_payload`](Self::decompressed_payload) undoes
    /// the compression on the receiving side.
    pub fn new_response_compressed(
        request_id: u64,
        method: Method,
        payload: &[u8],
    ) -> Result<Self, HiveError> {
        let compressed =
            zstd::bulk::compress(payload, 3).map_err(|e| HiveError::Encoding(e.to_string()))?;
        Self::build(
            MessageType::Response,
            FrameFlags::COMPRESSED,
            method,
            request_id,
            compressed,
        )
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    /// Raw payload bytes as carried on the wire.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload bytes with any frame-level compression undone.
    pub fn decompressed_payload(&self) -> Result<Vec<u8>, HiveError> {
        if self.flags().contains(FrameFlags::COMPRESSED) {
            zstd::stream::decode_all(&self.payload[..])
                .map_err(|e| HiveError::Encoding(e.to_string()))
        } else {
            Ok(self.payload.clone())
        }
    }

    pub fn message_type(&self) -> Result<MessageType, HiveError> {
        MessageType::try_from(self.header.message_type())
    }

    pub fn method(&self) -> Result<Method, HiveError> {
        Method::try_from(self.header.method_id())
    }

    pub fn flags(&self) -> FrameFlags {
        FrameFlags::from_bits_truncate(self.header.flags())
    }

    pub fn request_id(&self) -> u64 {
        self.header.request_id()
    }

    /// Whether this is the reserved keep-alive frame.
    pub fn is_heartbeat(&self) -> bool {
        self.request_id() == 0
    }

    /// Whether this response carries an [`RpcFault`](crate::proto::RpcFault).
    pub fn is_fault(&self) -> bool {
        self.flags().contains(FrameFlags::ERROR)
    }

    // ── Wire form ────────────────────────────────────────────────

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        bytes.extend_from_slice(&self.header.encode());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HiveError> {
        let header = FrameHeader::decode(bytes)?;
        let total = HEADER_SIZE
            .checked_add(header.payload_length() as usize)
            .ok_or(HiveError::InvalidHeader("payload length overflow"))?;
        if bytes.len() != total {
            return Err(HiveError::InvalidHeader("length does not match header"));
        }
        if header.payload_length() as usize > MAX_PAYLOAD_SIZE {
            return Err(HiveError::PayloadTooLarge {
                size: header.payload_length() as usize,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        let frame = Self {
            header,
            payload: bytes[HEADER_SIZE..].to_vec(),
        };
        if !frame.payload.is_empty() && !frame.checksum_valid() {
            return Err(HiveError::ChecksumMismatch);
        }
        Ok(frame)
    }

    /// Verify the header checksum against the payload bytes.
    pub fn checksum_valid(&self) -> bool {
        self.header.checksum() == payload_checksum(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        let frame = Frame::new_request(7, Method::GetStats, b"abc".to_vec()).unwrap();
        let bytes = frame.to_bytes();
        let back = Frame::from_bytes(&bytes).unwrap();

        assert_eq!(back.request_id(), 7);
        assert_eq!(back.method().unwrap(), Method::GetStats);
        assert_eq!(back.message_type().unwrap(), MessageType::Request);
        assert_eq!(back.payload(), b"abc");
        assert!(back.checksum_valid());
    }

    #[test]
    fn heartbeat_has_reserved_id() {
        let hb = Frame::heartbeat();
        assert!(hb.is_heartbeat());
        assert_eq!(hb.method().unwrap(), Method::Heartbeat);
        assert!(hb.payload().is_empty());
    }

    #[test]
    fn oversized_payload_rejected() {
        let too_large = vec![0u8; MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(
            Frame::new_request(1, Method::ModifyStream, too_large),
            Err(HiveError::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn corrupted_payload_detected() {
        let frame = Frame::new_response(3, Method::GetStats, b"counters".to_vec()).unwrap();
        let mut bytes = frame.to_bytes();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        assert!(matches!(
            Frame::from_bytes(&bytes),
            Err(HiveError::ChecksumMismatch)
        ));
    }

    #[test]
    fn length_mismatch_rejected() {
        let frame = Frame::new_request(1, Method::Hello, b"hi".to_vec()).unwrap();
        let mut bytes = frame.to_bytes();
        bytes.push(0);
        assert!(Frame::from_bytes(&bytes).is_err());
    }

    #[test]
    fn compressed_response_roundtrip() {
        let data = vec![0xCAu8; 64 * 1024];
        let frame = Frame::new_response_compressed(9, Method::GetCaptureBuffer, &data).unwrap();

        assert!(frame.flags().contains(FrameFlags::COMPRESSED));
        // Highly repetitive data should shrink on the wire.
        assert!(frame.payload().len() < data.len());

        let wire = frame.to_bytes();
        let back = Frame::from_bytes(&wire).unwrap();
        assert_eq!(back.decompressed_payload().unwrap(), data);
    }

    #[test]
    fn fault_flag_classification() {
        let fault = Frame::new_response_with_flags(
            4,
            Method::AddStream,
            b"denied".to_vec(),
            FrameFlags::ERROR,
        )
        .unwrap();
        assert!(fault.is_fault());

        let ok = Frame::new_response(4, Method::AddStream, Vec::new()).unwrap();
        assert!(!ok.is_fault());
    }
}
