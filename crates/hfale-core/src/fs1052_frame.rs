//! FED-STD-1052 Frame Codec — control and data frames with CRC-32
//!
//! Serializes and parses the two FS-1052 frame families. Both carry a
//! trailing CRC-32 (polynomial 0x04C11DB7, init 0xFFFFFFFF, final XOR
//! 0xFFFFFFFF, stored big-endian); parsing validates the CRC before
//! touching any field and rejects the frame on mismatch.
//!
//! **Control frames** manage the link: header byte, source/destination
//! addresses (2-byte abbreviated or 18-byte full), link state and timeout,
//! ACK-NAK type, an optional 32-byte selective-ACK bitmap whose last byte's
//! MSB is the flow-control flag, and optional herald (5 B), message (17 B),
//! and extension (8 B) sub-blocks. The sub-blocks carry no presence flags
//! on the wire; their sizes are pairwise distinguishable, so the parser
//! infers presence from the remaining length and round-trips them without
//! interpretation.
//!
//! **Data frames** carry payload blocks: header byte, interleaver byte,
//! sequence number, 32-bit message offset, 16-bit length, up to 1023 data
//! bytes. A valid data frame satisfies `9 + data_len + 4 == total_len`.

use crate::crc::{Crc32, CrcComputer};

/// Maximum payload of one data frame.
pub const MAX_DATA_BLOCK_LEN: usize = 1023;

/// Bytes in the selective-ACK bitmap (256 bits).
pub const ACK_MAP_LEN: usize = 32;

/// Data-frame fixed header length (before payload).
pub const DATA_HEADER_LEN: usize = 9;

/// Smallest legal data frame: header plus CRC.
pub const MIN_DATA_FRAME_LEN: usize = DATA_HEADER_LEN + 4;

/// Largest legal data frame.
pub const MAX_DATA_FRAME_LEN: usize = DATA_HEADER_LEN + MAX_DATA_BLOCK_LEN + 4;

/// FS-1052 protocol version carried in control frame headers.
pub const PROTOCOL_VERSION: u8 = 0;

/// Codec failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Buffer shorter than the minimum frame.
    TooShort,
    /// CRC-32 validation failed.
    CrcMismatch,
    /// Payload exceeds 1023 bytes.
    PayloadTooLarge,
    /// Declared length disagrees with the buffer length.
    LengthMismatch,
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::TooShort => write!(f, "frame too short"),
            FrameError::CrcMismatch => write!(f, "CRC-32 mismatch"),
            FrameError::PayloadTooLarge => write!(f, "payload exceeds 1023 bytes"),
            FrameError::LengthMismatch => write!(f, "declared length disagrees with frame size"),
        }
    }
}

impl std::error::Error for FrameError {}

// ============================================================================
// Protocol vocabulary
// ============================================================================

/// Operating modes of the data link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ArqMode {
    /// Adaptive block size with selective ACK; the common mode.
    #[default]
    VariableArq = 0,
    /// One-way, no acknowledgment.
    Broadcast = 1,
    /// Continuous bidirectional.
    Circuit = 2,
    /// Fixed block size with ACK.
    FixedArq = 3,
}

impl ArqMode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ArqMode::VariableArq,
            1 => ArqMode::Broadcast,
            2 => ArqMode::Circuit,
            _ => ArqMode::FixedArq,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArqMode::VariableArq => "Variable ARQ",
            ArqMode::Broadcast => "Broadcast",
            ArqMode::Circuit => "Circuit",
            ArqMode::FixedArq => "Fixed ARQ",
        }
    }
}

/// Link establishment states carried in control frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LinkState {
    #[default]
    Calling = 0,
    CallAck = 1,
    LinkUp = 2,
    Dropping = 3,
}

impl LinkState {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => LinkState::Calling,
            1 => LinkState::CallAck,
            2 => LinkState::LinkUp,
            _ => LinkState::Dropping,
        }
    }
}

/// Frame families and control sub-types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Short control frame.
    T1Control,
    /// Control frame with ACK bitmap.
    T2Control,
    /// Control frame with herald and/or message block.
    T3Control,
    /// Broadcast / fixed-ARQ control frame.
    T4Control,
    /// Data frame.
    Data,
}

/// Address field width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AddressMode {
    /// 2-byte abbreviated addresses, stored reversed.
    #[default]
    Short2Byte = 0,
    /// 18-byte full addresses.
    Long18Byte = 1,
}

/// Acknowledgment field type (low 2 bits of the ACK-NAK byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AckNakType {
    #[default]
    NullAck = 0,
    DataAck = 1,
    DataAckReq = 2,
    HeraldAck = 3,
}

impl AckNakType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => AckNakType::NullAck,
            1 => AckNakType::DataAck,
            2 => AckNakType::DataAckReq,
            _ => AckNakType::HeraldAck,
        }
    }
}

/// Absolute modem data rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DataRate {
    Bps75 = 0,
    Bps150 = 1,
    Bps300 = 2,
    Bps600 = 3,
    Bps1200 = 4,
    #[default]
    Bps2400 = 5,
    Bps4800 = 6,
    Same = 7,
}

impl DataRate {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => DataRate::Bps75,
            1 => DataRate::Bps150,
            2 => DataRate::Bps300,
            3 => DataRate::Bps600,
            4 => DataRate::Bps1200,
            5 => DataRate::Bps2400,
            6 => DataRate::Bps4800,
            _ => DataRate::Same,
        }
    }

    /// Rate in bits per second; zero for [`DataRate::Same`].
    pub fn bps(&self) -> u16 {
        match self {
            DataRate::Bps75 => 75,
            DataRate::Bps150 => 150,
            DataRate::Bps300 => 300,
            DataRate::Bps600 => 600,
            DataRate::Bps1200 => 1200,
            DataRate::Bps2400 => 2400,
            DataRate::Bps4800 => 4800,
            DataRate::Same => 0,
        }
    }

    /// Slowest rate at or above `bps` (saturating at 4800).
    pub fn from_bps(bps: u16) -> Self {
        match bps {
            0..=75 => DataRate::Bps75,
            76..=150 => DataRate::Bps150,
            151..=300 => DataRate::Bps300,
            301..=600 => DataRate::Bps600,
            601..=1200 => DataRate::Bps1200,
            1201..=2400 => DataRate::Bps2400,
            _ => DataRate::Bps4800,
        }
    }
}

/// How a rate field is to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DataRateFormat {
    #[default]
    Absolute = 0,
    Relative = 1,
}

/// Relative rate steps (when the rate format is relative).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RelativeDataRate {
    Div8 = 0,
    Div4 = 1,
    Div2 = 2,
    Same = 3,
    Mul2 = 4,
    Mul4 = 5,
    Mul8 = 6,
    RelSame = 7,
}

/// Interleaver depth for the underlying modem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum InterleaverLength {
    Short = 0,
    #[default]
    Long = 1,
}

/// When modem parameters are renegotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum NegotiationMode {
    #[default]
    ChangesOnly = 0,
    EveryTime = 1,
}

// ============================================================================
// Frame structures
// ============================================================================

/// Herald block: parameters of the next data series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Herald {
    pub data_rate_format: DataRateFormat,
    pub data_rate: u8,
    pub interleaver: InterleaverLength,
    pub bytes_per_block: u16,
    pub frames_in_next_series: u8,
}

/// Message block: application-layer transfer bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageBlock {
    pub msg_size: u32,
    pub msg_id: u16,
    pub connection_id: u16,
    pub priority: u8,
    pub tx_next_byte_pos: u32,
    pub rx_next_byte_pos: u32,
}

/// Extension block: two 32-bit function-bit words, round-tripped opaquely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extension {
    pub function_bits: [u32; 2],
}

/// A control frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlFrame {
    pub protocol_version: u8,
    pub arq_mode: ArqMode,
    pub negotiation_mode: NegotiationMode,
    pub address_mode: AddressMode,
    /// Sub-type selecting whether a DATA_ACK bitmap is serialized.
    pub frame_type: FrameType,

    pub source_address: Vec<u8>,
    pub dest_address: Vec<u8>,

    pub link_state: LinkState,
    pub link_timeout: u16,

    pub ack_nak_type: AckNakType,
    /// 256-bit selective acknowledgment bitmap.
    pub ack_bitmap: [u8; ACK_MAP_LEN],
    /// Carried in the MSB of the bitmap's last byte.
    pub flow_control: bool,

    pub herald: Option<Herald>,
    pub message: Option<MessageBlock>,
    pub extension: Option<Extension>,
}

impl Default for ControlFrame {
    fn default() -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION,
            arq_mode: ArqMode::VariableArq,
            negotiation_mode: NegotiationMode::ChangesOnly,
            address_mode: AddressMode::Short2Byte,
            frame_type: FrameType::T1Control,
            source_address: vec![0, 0],
            dest_address: vec![0, 0],
            link_state: LinkState::Calling,
            link_timeout: 0,
            ack_nak_type: AckNakType::NullAck,
            ack_bitmap: [0; ACK_MAP_LEN],
            flow_control: false,
            herald: None,
            message: None,
            extension: None,
        }
    }
}

impl ControlFrame {
    /// Does the serialized form carry the 32-byte ACK bitmap?
    fn carries_bitmap(&self) -> bool {
        matches!(
            self.frame_type,
            FrameType::T2Control | FrameType::T3Control | FrameType::T4Control
        ) && self.ack_nak_type == AckNakType::DataAck
    }

    /// Mark a sequence number acknowledged in the bitmap.
    pub fn set_ack(&mut self, sequence: u8) {
        self.ack_bitmap[sequence as usize / 8] |= 1 << (sequence % 8);
    }

    /// Is a sequence number acknowledged?
    pub fn is_acked(&self, sequence: u8) -> bool {
        self.ack_bitmap[sequence as usize / 8] & (1 << (sequence % 8)) != 0
    }
}

/// A data frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
    pub data_rate_format: DataRateFormat,
    pub data_rate: u8,
    pub interleaver: InterleaverLength,
    /// Block sequence number, wrapping at 256.
    pub sequence: u8,
    /// Byte position of this block in the message.
    pub msg_byte_offset: u32,
    /// Payload, at most 1023 bytes.
    pub data: Vec<u8>,
}

impl Default for DataFrame {
    fn default() -> Self {
        Self {
            data_rate_format: DataRateFormat::Absolute,
            data_rate: DataRate::Bps2400 as u8,
            interleaver: InterleaverLength::Long,
            sequence: 0,
            msg_byte_offset: 0,
            data: Vec::new(),
        }
    }
}

// ============================================================================
// Formatting
// ============================================================================

/// CRC-32 over a buffer, FS-1052 parameters.
pub fn crc32(data: &[u8]) -> u32 {
    Crc32::compute(data)
}

fn append_crc32(buf: &mut Vec<u8>) {
    let crc = crc32(buf);
    buf.extend_from_slice(&crc.to_be_bytes());
}

/// Validate the trailing CRC-32 of a frame.
pub fn validate_crc32(frame: &[u8]) -> bool {
    if frame.len() < 4 {
        return false;
    }
    let (body, tail) = frame.split_at(frame.len() - 4);
    let received = u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]]);
    crc32(body) == received
}

/// Which family a buffer's first byte announces.
pub fn detect_frame_type(first_byte: u8) -> FrameType {
    if first_byte & 0x02 != 0 {
        FrameType::T1Control
    } else {
        FrameType::Data
    }
}

/// Serialize a control frame, CRC appended.
pub fn format_control_frame(frame: &ControlFrame) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);

    // Header byte: bit 0 sync mismatch (always 1), bit 1 control marker,
    // bits 2-3 version, bits 4-5 ARQ mode, bit 6 negotiation, bit 7 address.
    let mut header = 0x01 | 0x02;
    header |= (frame.protocol_version & 0x03) << 2;
    header |= (frame.arq_mode as u8 & 0x03) << 4;
    header |= (frame.negotiation_mode as u8 & 0x01) << 6;
    header |= (frame.address_mode as u8 & 0x01) << 7;
    buf.push(header);

    match frame.address_mode {
        AddressMode::Short2Byte => {
            // Abbreviated addresses go on the wire reversed: last byte first.
            push_short_address(&mut buf, &frame.source_address);
            push_short_address(&mut buf, &frame.dest_address);
        }
        AddressMode::Long18Byte => {
            push_long_address(&mut buf, &frame.source_address);
            push_long_address(&mut buf, &frame.dest_address);
        }
    }

    buf.push(frame.link_state as u8);
    buf.extend_from_slice(&frame.link_timeout.to_be_bytes());
    buf.push(frame.ack_nak_type as u8 & 0x03);

    if frame.carries_bitmap() {
        let mut bitmap = frame.ack_bitmap;
        // The flag shares the wire bit with sequence 255's acknowledgment.
        if frame.flow_control {
            bitmap[ACK_MAP_LEN - 1] |= 0x80;
        }
        buf.extend_from_slice(&bitmap);
    }

    if let Some(h) = &frame.herald {
        buf.push(((h.data_rate_format as u8) << 7) | (h.data_rate & 0x07));
        buf.push(h.interleaver as u8);
        buf.extend_from_slice(&h.bytes_per_block.to_be_bytes());
        buf.push(h.frames_in_next_series);
    }

    if let Some(m) = &frame.message {
        buf.extend_from_slice(&m.msg_size.to_be_bytes());
        buf.extend_from_slice(&m.msg_id.to_be_bytes());
        buf.extend_from_slice(&m.connection_id.to_be_bytes());
        buf.push(m.priority);
        buf.extend_from_slice(&m.tx_next_byte_pos.to_be_bytes());
        buf.extend_from_slice(&m.rx_next_byte_pos.to_be_bytes());
    }

    if let Some(x) = &frame.extension {
        buf.extend_from_slice(&x.function_bits[0].to_be_bytes());
        buf.extend_from_slice(&x.function_bits[1].to_be_bytes());
    }

    append_crc32(&mut buf);
    buf
}

fn push_short_address(buf: &mut Vec<u8>, address: &[u8]) {
    let len = address.len();
    buf.push(if len >= 1 { address[len - 1] } else { 0 });
    buf.push(if len >= 2 { address[len - 2] } else { 0 });
}

fn push_long_address(buf: &mut Vec<u8>, address: &[u8]) {
    let mut full = [0u8; 18];
    let n = address.len().min(18);
    full[..n].copy_from_slice(&address[..n]);
    buf.extend_from_slice(&full);
}

/// Serialize a data frame, CRC appended. Fails when the payload exceeds
/// 1023 bytes.
pub fn format_data_frame(frame: &DataFrame) -> Result<Vec<u8>, FrameError> {
    if frame.data.len() > MAX_DATA_BLOCK_LEN {
        return Err(FrameError::PayloadTooLarge);
    }

    let mut buf = Vec::with_capacity(DATA_HEADER_LEN + frame.data.len() + 4);

    // Header byte: bit 0 sync mismatch, bit 1 clear (data), bits 4-6 rate,
    // bit 7 rate format.
    let mut header = 0x01;
    header |= (frame.data_rate & 0x07) << 4;
    header |= (frame.data_rate_format as u8) << 7;
    buf.push(header);

    buf.push(frame.interleaver as u8);
    buf.push(frame.sequence);
    buf.extend_from_slice(&frame.msg_byte_offset.to_be_bytes());
    buf.extend_from_slice(&(frame.data.len() as u16).to_be_bytes());
    buf.extend_from_slice(&frame.data);

    append_crc32(&mut buf);
    Ok(buf)
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse a control frame. CRC is checked before any field is read.
pub fn parse_control_frame(buf: &[u8]) -> Result<ControlFrame, FrameError> {
    if buf.len() < 10 {
        return Err(FrameError::TooShort);
    }
    if !validate_crc32(buf) {
        return Err(FrameError::CrcMismatch);
    }

    let body = &buf[..buf.len() - 4];
    let mut idx = 0usize;

    let header = body[idx];
    idx += 1;
    let mut frame = ControlFrame {
        protocol_version: (header >> 2) & 0x03,
        arq_mode: ArqMode::from_bits(header >> 4),
        negotiation_mode: if header & 0x40 != 0 {
            NegotiationMode::EveryTime
        } else {
            NegotiationMode::ChangesOnly
        },
        address_mode: if header & 0x80 != 0 {
            AddressMode::Long18Byte
        } else {
            AddressMode::Short2Byte
        },
        ..ControlFrame::default()
    };

    match frame.address_mode {
        AddressMode::Short2Byte => {
            if body.len() < idx + 4 {
                return Err(FrameError::TooShort);
            }
            // Undo the on-wire reversal.
            frame.source_address = vec![body[idx + 1], body[idx]];
            frame.dest_address = vec![body[idx + 3], body[idx + 2]];
            idx += 4;
        }
        AddressMode::Long18Byte => {
            if body.len() < idx + 36 {
                return Err(FrameError::TooShort);
            }
            frame.source_address = body[idx..idx + 18].to_vec();
            frame.dest_address = body[idx + 18..idx + 36].to_vec();
            idx += 36;
        }
    }

    if body.len() < idx + 4 {
        return Err(FrameError::TooShort);
    }
    frame.link_state = LinkState::from_bits(body[idx]);
    idx += 1;
    frame.link_timeout = u16::from_be_bytes([body[idx], body[idx + 1]]);
    idx += 2;
    frame.ack_nak_type = AckNakType::from_bits(body[idx]);
    idx += 1;

    let mut remaining = body.len() - idx;

    if frame.ack_nak_type == AckNakType::DataAck && remaining >= ACK_MAP_LEN {
        frame.ack_bitmap.copy_from_slice(&body[idx..idx + ACK_MAP_LEN]);
        frame.flow_control = frame.ack_bitmap[ACK_MAP_LEN - 1] & 0x80 != 0;
        idx += ACK_MAP_LEN;
        remaining -= ACK_MAP_LEN;
        frame.frame_type = FrameType::T2Control;
    }

    // The optional sub-blocks are 5 (herald), 17 (message), and 8
    // (extension) bytes; every combination sums to a distinct length, so
    // the remainder identifies which are present.
    let (has_herald, has_message, has_extension) = match remaining {
        0 => (false, false, false),
        5 => (true, false, false),
        17 => (false, true, false),
        8 => (false, false, true),
        22 => (true, true, false),
        13 => (true, false, true),
        25 => (false, true, true),
        30 => (true, true, true),
        _ => return Err(FrameError::LengthMismatch),
    };

    if has_herald {
        let rate_byte = body[idx];
        frame.herald = Some(Herald {
            data_rate_format: if rate_byte & 0x80 != 0 {
                DataRateFormat::Relative
            } else {
                DataRateFormat::Absolute
            },
            data_rate: rate_byte & 0x07,
            interleaver: if body[idx + 1] & 0x01 != 0 {
                InterleaverLength::Long
            } else {
                InterleaverLength::Short
            },
            bytes_per_block: u16::from_be_bytes([body[idx + 2], body[idx + 3]]),
            frames_in_next_series: body[idx + 4],
        });
        idx += 5;
        if frame.frame_type == FrameType::T1Control {
            frame.frame_type = FrameType::T3Control;
        }
    }

    if has_message {
        frame.message = Some(MessageBlock {
            msg_size: u32::from_be_bytes([body[idx], body[idx + 1], body[idx + 2], body[idx + 3]]),
            msg_id: u16::from_be_bytes([body[idx + 4], body[idx + 5]]),
            connection_id: u16::from_be_bytes([body[idx + 6], body[idx + 7]]),
            priority: body[idx + 8],
            tx_next_byte_pos: u32::from_be_bytes([
                body[idx + 9],
                body[idx + 10],
                body[idx + 11],
                body[idx + 12],
            ]),
            rx_next_byte_pos: u32::from_be_bytes([
                body[idx + 13],
                body[idx + 14],
                body[idx + 15],
                body[idx + 16],
            ]),
        });
        idx += 17;
        if frame.frame_type == FrameType::T1Control {
            frame.frame_type = FrameType::T3Control;
        }
    }

    if has_extension {
        frame.extension = Some(Extension {
            function_bits: [
                u32::from_be_bytes([body[idx], body[idx + 1], body[idx + 2], body[idx + 3]]),
                u32::from_be_bytes([body[idx + 4], body[idx + 5], body[idx + 6], body[idx + 7]]),
            ],
        });
    }

    Ok(frame)
}

/// Parse a data frame. CRC is checked first; the declared length must
/// exactly account for the buffer.
pub fn parse_data_frame(buf: &[u8]) -> Result<DataFrame, FrameError> {
    if buf.len() < MIN_DATA_FRAME_LEN {
        return Err(FrameError::TooShort);
    }
    if !validate_crc32(buf) {
        return Err(FrameError::CrcMismatch);
    }

    let header = buf[0];
    let data_len = u16::from_be_bytes([buf[7], buf[8]]) as usize;
    if data_len > MAX_DATA_BLOCK_LEN {
        return Err(FrameError::PayloadTooLarge);
    }
    if DATA_HEADER_LEN + data_len + 4 != buf.len() {
        return Err(FrameError::LengthMismatch);
    }

    Ok(DataFrame {
        data_rate_format: if header & 0x80 != 0 {
            DataRateFormat::Relative
        } else {
            DataRateFormat::Absolute
        },
        data_rate: (header >> 4) & 0x07,
        interleaver: if buf[1] & 0x01 != 0 {
            InterleaverLength::Long
        } else {
            InterleaverLength::Short
        },
        sequence: buf[2],
        msg_byte_offset: u32::from_be_bytes([buf[3], buf[4], buf[5], buf[6]]),
        data: buf[DATA_HEADER_LEN..DATA_HEADER_LEN + data_len].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ack_frame() -> ControlFrame {
        let mut frame = ControlFrame {
            frame_type: FrameType::T2Control,
            ack_nak_type: AckNakType::DataAck,
            source_address: vec![b'W', b'1'],
            dest_address: vec![b'K', b'6'],
            link_state: LinkState::LinkUp,
            link_timeout: 300,
            ..ControlFrame::default()
        };
        frame.set_ack(0);
        frame.set_ack(7);
        frame.set_ack(200);
        frame
    }

    #[test]
    fn control_frame_header_bits() {
        let bytes = format_control_frame(&ControlFrame::default());
        // Sync-mismatch and control bits always set.
        assert_eq!(bytes[0] & 0x03, 0x03);
        assert!(validate_crc32(&bytes));
        assert_eq!(detect_frame_type(bytes[0]), FrameType::T1Control);
    }

    #[test]
    fn minimal_control_round_trip() {
        let frame = ControlFrame {
            source_address: vec![b'A', b'B'],
            dest_address: vec![b'C', b'D'],
            link_state: LinkState::CallAck,
            link_timeout: 1234,
            ..ControlFrame::default()
        };
        let bytes = format_control_frame(&frame);
        // Header + 4 addr + state + timeout + acknak + CRC.
        assert_eq!(bytes.len(), 1 + 4 + 1 + 2 + 1 + 4);
        let parsed = parse_control_frame(&bytes).unwrap();
        assert_eq!(parsed.source_address, frame.source_address);
        assert_eq!(parsed.dest_address, frame.dest_address);
        assert_eq!(parsed.link_state, LinkState::CallAck);
        assert_eq!(parsed.link_timeout, 1234);
        assert_eq!(parsed.ack_nak_type, AckNakType::NullAck);
        assert!(parsed.herald.is_none());
        assert!(parsed.message.is_none());
    }

    #[test]
    fn ack_bitmap_round_trip() {
        let frame = ack_frame();
        let bytes = format_control_frame(&frame);
        let parsed = parse_control_frame(&bytes).unwrap();
        assert_eq!(parsed.frame_type, FrameType::T2Control);
        assert!(parsed.is_acked(0));
        assert!(parsed.is_acked(7));
        assert!(parsed.is_acked(200));
        assert!(!parsed.is_acked(100));
        assert!(!parsed.flow_control);
    }

    #[test]
    fn sequence_255_aliases_flow_control_bit() {
        let mut frame = ack_frame();
        frame.set_ack(255);
        let parsed = parse_control_frame(&format_control_frame(&frame)).unwrap();
        assert!(parsed.is_acked(255));
        // Acknowledging 255 is indistinguishable from the flag on the wire.
        assert!(parsed.flow_control);
    }

    #[test]
    fn flow_control_rides_bitmap_msb() {
        let mut frame = ack_frame();
        frame.flow_control = true;
        let bytes = format_control_frame(&frame);
        let parsed = parse_control_frame(&bytes).unwrap();
        assert!(parsed.flow_control);
        // The flag shares its wire bit with sequence 255; neighbors stay clean.
        assert!(parsed.is_acked(255));
        assert!(!parsed.is_acked(254));
        assert!(!parsed.is_acked(248));
    }

    #[test]
    fn herald_message_extension_round_trip() {
        let frame = ControlFrame {
            herald: Some(Herald {
                data_rate_format: DataRateFormat::Absolute,
                data_rate: DataRate::Bps1200 as u8,
                interleaver: InterleaverLength::Short,
                bytes_per_block: 512,
                frames_in_next_series: 16,
            }),
            message: Some(MessageBlock {
                msg_size: 100_000,
                msg_id: 7,
                connection_id: 9,
                priority: 3,
                tx_next_byte_pos: 2048,
                rx_next_byte_pos: 1024,
            }),
            extension: Some(Extension {
                function_bits: [0xDEAD_BEEF, 0x0123_4567],
            }),
            ..ControlFrame::default()
        };
        let bytes = format_control_frame(&frame);
        let parsed = parse_control_frame(&bytes).unwrap();
        assert_eq!(parsed.herald, frame.herald);
        assert_eq!(parsed.message, frame.message);
        assert_eq!(parsed.extension, frame.extension);
    }

    #[test]
    fn each_sub_block_combination_round_trips() {
        let herald = Some(Herald::default());
        let message = Some(MessageBlock::default());
        let extension = Some(Extension::default());
        for (h, m, x) in [
            (None, None, None),
            (herald, None, None),
            (None, message, None),
            (None, None, extension),
            (herald, message, None),
            (herald, None, extension),
            (None, message, extension),
            (herald, message, extension),
        ] {
            let frame = ControlFrame {
                herald: h,
                message: m,
                extension: x,
                ..ControlFrame::default()
            };
            let parsed = parse_control_frame(&format_control_frame(&frame)).unwrap();
            assert_eq!(parsed.herald.is_some(), h.is_some());
            assert_eq!(parsed.message.is_some(), m.is_some());
            assert_eq!(parsed.extension.is_some(), x.is_some());
        }
    }

    #[test]
    fn long_address_round_trip() {
        let frame = ControlFrame {
            address_mode: AddressMode::Long18Byte,
            source_address: b"STATION-ALPHA-001\0".to_vec(),
            dest_address: b"STATION-BRAVO-002\0".to_vec(),
            ..ControlFrame::default()
        };
        let bytes = format_control_frame(&frame);
        let parsed = parse_control_frame(&bytes).unwrap();
        assert_eq!(parsed.address_mode, AddressMode::Long18Byte);
        assert_eq!(parsed.source_address, frame.source_address);
        assert_eq!(parsed.dest_address, frame.dest_address);
    }

    #[test]
    fn data_frame_round_trip() {
        let frame = DataFrame {
            sequence: 42,
            msg_byte_offset: 43_008,
            data: (0..255u8).collect(),
            ..DataFrame::default()
        };
        let bytes = format_data_frame(&frame).unwrap();
        assert_eq!(bytes.len(), DATA_HEADER_LEN + 255 + 4);
        assert_eq!(bytes[2], 42);
        assert_eq!(detect_frame_type(bytes[0]), FrameType::Data);

        let parsed = parse_data_frame(&bytes).unwrap();
        assert_eq!(parsed, frame);
    }

    #[test]
    fn max_payload_is_1023() {
        let legal = DataFrame {
            data: vec![0xA5; MAX_DATA_BLOCK_LEN],
            ..DataFrame::default()
        };
        let bytes = format_data_frame(&legal).unwrap();
        assert_eq!(bytes.len(), MAX_DATA_FRAME_LEN);
        assert!(parse_data_frame(&bytes).is_ok());

        let oversize = DataFrame {
            data: vec![0; MAX_DATA_BLOCK_LEN + 1],
            ..DataFrame::default()
        };
        assert_eq!(format_data_frame(&oversize), Err(FrameError::PayloadTooLarge));
    }

    #[test]
    fn empty_payload_is_legal() {
        let frame = DataFrame::default();
        let bytes = format_data_frame(&frame).unwrap();
        assert_eq!(bytes.len(), MIN_DATA_FRAME_LEN);
        assert_eq!(parse_data_frame(&bytes).unwrap().data.len(), 0);
    }

    #[test]
    fn every_bit_flip_is_rejected() {
        let frame = DataFrame {
            sequence: 9,
            data: b"The quick brown fox".to_vec(),
            ..DataFrame::default()
        };
        let bytes = format_data_frame(&frame).unwrap();
        for byte in 0..bytes.len() {
            for bit in 0..8 {
                let mut corrupted = bytes.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(
                    parse_data_frame(&corrupted).is_err(),
                    "flip at byte {byte} bit {bit} accepted"
                );
            }
        }
    }

    #[test]
    fn control_bit_flips_rejected() {
        let bytes = format_control_frame(&ack_frame());
        for byte in [0usize, 1, 5, 8, bytes.len() - 1] {
            let mut corrupted = bytes.clone();
            corrupted[byte] ^= 0x10;
            assert!(parse_control_frame(&corrupted).is_err());
        }
    }

    #[test]
    fn short_buffers_rejected() {
        assert_eq!(parse_data_frame(&[0u8; 12]), Err(FrameError::TooShort));
        assert_eq!(parse_control_frame(&[0u8; 9]).unwrap_err(), FrameError::TooShort);
    }

    #[test]
    fn truncated_length_field_rejected() {
        let frame = DataFrame {
            data: vec![1, 2, 3, 4],
            ..DataFrame::default()
        };
        let mut bytes = format_data_frame(&frame).unwrap();
        // Claim a shorter payload, then re-seal the CRC: lengths no longer
        // reconcile with the buffer.
        let len = bytes.len();
        bytes[8] = 2;
        let crc = crc32(&bytes[..len - 4]);
        bytes[len - 4..].copy_from_slice(&crc.to_be_bytes());
        assert_eq!(parse_data_frame(&bytes), Err(FrameError::LengthMismatch));
    }

    #[test]
    fn data_rate_vocabulary() {
        assert_eq!(DataRate::Bps2400.bps(), 2400);
        assert_eq!(DataRate::from_bps(2400), DataRate::Bps2400);
        assert_eq!(DataRate::from_bps(100), DataRate::Bps150);
        assert_eq!(DataRate::from_bps(4800), DataRate::Bps4800);
        assert_eq!(DataRate::from_bits(6), DataRate::Bps4800);
        assert_eq!(ArqMode::VariableArq.name(), "Variable ARQ");
    }

    #[test]
    fn rate_and_mode_fields_round_trip() {
        let frame = DataFrame {
            data_rate: DataRate::Bps600 as u8,
            data_rate_format: DataRateFormat::Relative,
            interleaver: InterleaverLength::Short,
            ..DataFrame::default()
        };
        let parsed = parse_data_frame(&format_data_frame(&frame).unwrap()).unwrap();
        assert_eq!(parsed.data_rate, DataRate::Bps600 as u8);
        assert_eq!(parsed.data_rate_format, DataRateFormat::Relative);
        assert_eq!(parsed.interleaver, InterleaverLength::Short);

        let control = ControlFrame {
            arq_mode: ArqMode::Circuit,
            negotiation_mode: NegotiationMode::EveryTime,
            protocol_version: 2,
            ..ControlFrame::default()
        };
        let parsed = parse_control_frame(&format_control_frame(&control)).unwrap();
        assert_eq!(parsed.arq_mode, ArqMode::Circuit);
        assert_eq!(parsed.negotiation_mode, NegotiationMode::EveryTime);
        assert_eq!(parsed.protocol_version, 2);
    }
}
