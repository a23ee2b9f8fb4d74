//! Frame-level flag bits carried in every [`FrameHeader`].
//!
//! [`FrameHeader`]: crate::header::FrameHeader

use bitflags::bitflags;

bitflags! {
    /// Flags describing how a frame's payload is to be interpreted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFlags: u64 {
        /// No special handling.
        const NONE = 0;

        /// Response payload is an [`RpcFault`](crate::proto::RpcFault)
        /// instead of the method's normal reply.
        const ERROR = 1 << 0;

        /// Payload bytes are zstd-compressed. Used for bulk transfers
        /// such as capture buffers.
        const COMPRESSED = 1 << 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_roundtrip_bits() {
        let f = FrameFlags::ERROR | FrameFlags::COMPRESSED;
        let raw = f.bits();
        let back = FrameFlags::from_bits_truncate(raw);
        assert_eq!(f, back);
    }

    #[test]
    fn unknown_bits_truncated() {
        let back = FrameFlags::from_bits_truncate(0xFF00);
        assert!(!back.contains(FrameFlags::ERROR));
    }

    #[test]
    fn default_is_empty() {
        assert_eq!(FrameFlags::default(), FrameFlags::NONE);
    }
}
