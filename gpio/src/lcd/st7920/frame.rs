/// Whether a frame carries an instruction or display data.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameKind {
    /// RS = 0.
    Instruction,
    /// RS = 1.
    Data,
}

impl FrameKind {
    /// Synchronizing byte for an instruction: five `1` bits, RW = 0, RS = 0, then `0`.
    pub const SYNC_INSTRUCTION: u8 = 0b11111000;
    /// Synchronizing byte for data: five `1` bits, RW = 0, RS = 1, then `0`.
    pub const SYNC_DATA: u8 = 0b11111010;

    /// Gets the synchronizing byte that starts a frame of this kind.
    pub fn sync_byte(self) -> u8 {
        match self {
            FrameKind::Instruction => Self::SYNC_INSTRUCTION,
            FrameKind::Data => Self::SYNC_DATA,
        }
    }

    /// The RS bit as it appears on the wire.
    pub fn rs(self) -> bool {
        self == FrameKind::Data
    }
}

/// One logical byte as transmitted on the serial interface.
///
/// Every logical byte is split into three physical bytes: the synchronizing byte, the high
/// nibble, and the low nibble moved up into the high half. The low half of the last two is
/// always `0000`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Frame {
    pub kind: FrameKind,
    pub value: u8,
}

impl Frame {
    pub fn instruction(value: u8) -> Self {
        Frame { kind: FrameKind::Instruction, value }
    }

    pub fn data(value: u8) -> Self {
        Frame { kind: FrameKind::Data, value }
    }

    /// Gets the three bytes to shift out for this frame.
    pub fn encode(&self) -> [u8; 3] {
        [self.kind.sync_byte(), self.value & 0xF0, self.value << 4]
    }

    /// Reassembles a frame from its three physical bytes.
    ///
    /// Returns `None` if the first byte isn't a synchronizing byte or if a nibble byte has
    /// anything in its low half.
    pub fn decode(bytes: [u8; 3]) -> Option<Self> {
        let kind = match bytes[0] {
            FrameKind::SYNC_INSTRUCTION => FrameKind::Instruction,
            FrameKind::SYNC_DATA => FrameKind::Data,
            _ => return None,
        };

        if bytes[1] & 0x0F != 0 || bytes[2] & 0x0F != 0 {
            return None;
        }

        Some(Frame { kind, value: bytes[1] | bytes[2] >> 4 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_frame_splits_nibbles() {
        assert_eq!(Frame::instruction(0x3C).encode(), [0xF8, 0x30, 0xC0]);
    }

    #[test]
    fn data_frame_uses_data_sync_byte() {
        assert_eq!(Frame::data(0xA5).encode(), [0xFA, 0xA0, 0x50]);
    }

    #[test]
    fn sync_bytes_keep_the_five_leading_ones() {
        for kind in [FrameKind::Instruction, FrameKind::Data] {
            assert_eq!(kind.sync_byte() & 0xF8, 0xF8);
        }
    }

    #[test]
    fn decode_joins_nibbles() {
        assert_eq!(Frame::decode([0xF8, 0x80, 0x50]), Some(Frame::instruction(0x85)));
        assert_eq!(Frame::decode([0xFA, 0xF0, 0xF0]), Some(Frame::data(0xFF)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_eq!(Frame::decode([0xF0, 0x00, 0x00]), None);
        assert_eq!(Frame::decode([0xF8, 0x01, 0x00]), None);
        assert_eq!(Frame::decode([0xFA, 0x00, 0x08]), None);
    }
}
