//! AQC-ALE — Advanced Quick Call data elements, orderwire CRC, and slots
//!
//! AQC-ALE rides on the same 8-FSK modem as standard 2G ALE but
//! reinterprets the 21-bit word payload as packed Data Elements instead of
//! three ASCII characters. This module extracts the six populated elements
//! (DE2 slot, DE3 traffic class, DE4 LQA, DE9 transaction code, DE1
//! reserved, DE8 orderwire count), validates orderwire CRC-8/CRC-16
//! trailers, computes slotted-response timing, and parses the AQC message
//! shapes (call probe, handshake, inlink, orderwire) out of word
//! sequences.
//!
//! ## Example
//!
//! ```rust
//! use hfale_core::aqc::{extract_data_elements, TrafficClass, TransactionCode};
//!
//! let payload = 5 | (9 << 3) | (20 << 7) | (2 << 12) | (3 << 15) | (1 << 18);
//! let de = extract_data_elements(payload);
//! assert_eq!(de.de2_slot, 5);
//! assert_eq!(de.de3_traffic, TrafficClass::PskMsg);
//! assert_eq!(de.de4_lqa, 20);
//! assert_eq!(de.de9_transaction, TransactionCode::AckLast);
//! ```

use crate::ale_word::{AleWord, Preamble};
use crate::crc::{Crc16, Crc8, CrcComputer};

/// Number of response slots.
pub const NUM_SLOTS: u8 = 8;

/// Width of one response slot in milliseconds.
pub const SLOT_DURATION_MS: u64 = 200;

/// DE3 traffic class (4 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TrafficClass {
    ClearVoice = 0,
    DigitalVoice = 1,
    HfdVoice = 2,
    Reserved3 = 3,
    SecureDigitalVoice = 4,
    Reserved5 = 5,
    Reserved6 = 6,
    Reserved7 = 7,
    AleMsg = 8,
    PskMsg = 9,
    Tone39Msg = 10,
    HfEmail = 11,
    Ky100Active = 12,
    Reserved13 = 13,
    Reserved14 = 14,
    Reserved15 = 15,
}

impl TrafficClass {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x0F {
            0 => TrafficClass::ClearVoice,
            1 => TrafficClass::DigitalVoice,
            2 => TrafficClass::HfdVoice,
            3 => TrafficClass::Reserved3,
            4 => TrafficClass::SecureDigitalVoice,
            5 => TrafficClass::Reserved5,
            6 => TrafficClass::Reserved6,
            7 => TrafficClass::Reserved7,
            8 => TrafficClass::AleMsg,
            9 => TrafficClass::PskMsg,
            10 => TrafficClass::Tone39Msg,
            11 => TrafficClass::HfEmail,
            12 => TrafficClass::Ky100Active,
            13 => TrafficClass::Reserved13,
            14 => TrafficClass::Reserved14,
            _ => TrafficClass::Reserved15,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrafficClass::ClearVoice => "CLEAR_VOICE",
            TrafficClass::DigitalVoice => "DIGITAL_VOICE",
            TrafficClass::HfdVoice => "HFD_VOICE",
            TrafficClass::Reserved3 => "RESERVED_3",
            TrafficClass::SecureDigitalVoice => "SECURE_DIGITAL_VOICE",
            TrafficClass::Reserved5 => "RESERVED_5",
            TrafficClass::Reserved6 => "RESERVED_6",
            TrafficClass::Reserved7 => "RESERVED_7",
            TrafficClass::AleMsg => "ALE_MSG",
            TrafficClass::PskMsg => "PSK_MSG",
            TrafficClass::Tone39Msg => "TONE_39_MSG",
            TrafficClass::HfEmail => "HF_EMAIL",
            TrafficClass::Ky100Active => "KY100_ACTIVE",
            TrafficClass::Reserved13 => "RESERVED_13",
            TrafficClass::Reserved14 => "RESERVED_14",
            TrafficClass::Reserved15 => "RESERVED_15",
        }
    }
}

/// DE9 transaction code (3 bits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransactionCode {
    Reserved0 = 0,
    Ms141a = 1,
    AckLast = 2,
    NakLast = 3,
    Terminate = 4,
    OpAckNak = 5,
    AqcCmd = 6,
    Reserved7 = 7,
}

impl TransactionCode {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x07 {
            0 => TransactionCode::Reserved0,
            1 => TransactionCode::Ms141a,
            2 => TransactionCode::AckLast,
            3 => TransactionCode::NakLast,
            4 => TransactionCode::Terminate,
            5 => TransactionCode::OpAckNak,
            6 => TransactionCode::AqcCmd,
            _ => TransactionCode::Reserved7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransactionCode::Reserved0 => "RESERVED_0",
            TransactionCode::Ms141a => "MS_141A",
            TransactionCode::AckLast => "ACK_LAST",
            TransactionCode::NakLast => "NAK_LAST",
            TransactionCode::Terminate => "TERMINATE",
            TransactionCode::OpAckNak => "OP_ACKNAK",
            TransactionCode::AqcCmd => "AQC_CMD",
            TransactionCode::Reserved7 => "RESERVED_7",
        }
    }
}

/// CRC validation state of an orderwire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcStatus {
    /// No CRC carried.
    #[default]
    NotApplicable,
    Ok,
    Error,
}

/// Data elements unpacked from a 21-bit AQC payload.
///
/// DE5/DE6/DE7 live in message structures this payload does not carry and
/// are always zero here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataElements {
    /// DE1: reserved (3 bits).
    pub de1_reserved: u8,
    /// DE2: response slot position, 0..=7.
    pub de2_slot: u8,
    /// DE3: traffic class.
    pub de3_traffic: TrafficClass,
    /// DE4: LQA value, 0..=31.
    pub de4_lqa: u8,
    /// DE5: link quality metric 1 (not carried, zero).
    pub de5: u8,
    /// DE6: link quality metric 2 (not carried, zero).
    pub de6: u8,
    /// DE7: reserved (not carried, zero).
    pub de7: u8,
    /// DE8: number of orderwire commands, 0..=7.
    pub de8_orderwire_count: u8,
    /// DE9: transaction code.
    pub de9_transaction: TransactionCode,
}

impl Default for DataElements {
    fn default() -> Self {
        Self {
            de1_reserved: 0,
            de2_slot: 0,
            de3_traffic: TrafficClass::ClearVoice,
            de4_lqa: 0,
            de5: 0,
            de6: 0,
            de7: 0,
            de8_orderwire_count: 0,
            de9_transaction: TransactionCode::Reserved0,
        }
    }
}

/// Unpack data elements from a 21-bit payload.
///
/// Layout (LSB first): DE2 bits 0..2, DE3 bits 3..6, DE4 bits 7..11,
/// DE9 bits 12..14, DE1 bits 15..17, DE8 bits 18..20.
pub fn extract_data_elements(payload: u32) -> DataElements {
    DataElements {
        de2_slot: (payload & 0x07) as u8,
        de3_traffic: TrafficClass::from_bits(payload >> 3),
        de4_lqa: ((payload >> 7) & 0x1F) as u8,
        de9_transaction: TransactionCode::from_bits(payload >> 12),
        de1_reserved: ((payload >> 15) & 0x07) as u8,
        de8_orderwire_count: ((payload >> 18) & 0x07) as u8,
        ..DataElements::default()
    }
}

/// Pack data elements back into a 21-bit payload (inverse of extraction).
pub fn pack_data_elements(de: &DataElements) -> u32 {
    (de.de2_slot as u32 & 0x07)
        | ((de.de3_traffic as u32 & 0x0F) << 3)
        | ((de.de4_lqa as u32 & 0x1F) << 7)
        | ((de.de9_transaction as u32 & 0x07) << 12)
        | ((de.de1_reserved as u32 & 0x07) << 15)
        | ((de.de8_orderwire_count as u32 & 0x07) << 18)
}

/// Heuristic AQC detection: CMD words signal AQC, as do payloads whose
/// first 7-bit character falls outside printable ASCII.
pub fn is_aqc_format(word: &AleWord) -> bool {
    if word.preamble == Preamble::Cmd {
        return true;
    }
    let first = (word.raw_payload & 0x7F) as u8;
    !(0x20..=0x7E).contains(&first)
}

// ============================================================================
// Orderwire CRC
// ============================================================================

/// Compute the orderwire CRC-8 (poly 0x07, init 0x00) of a message.
pub fn orderwire_crc8(message: &[u8]) -> u8 {
    Crc8::compute(message)
}

/// Compute the orderwire CRC-16 (poly 0x1021, init 0xFFFF) of a message.
pub fn orderwire_crc16(message: &[u8]) -> u16 {
    Crc16::compute(message)
}

/// Validate a message carrying a trailing CRC-8 byte.
pub fn validate_orderwire_crc8(message_with_crc: &[u8]) -> bool {
    match message_with_crc.split_last() {
        Some((&crc, body)) => orderwire_crc8(body) == crc,
        None => false,
    }
}

/// Validate a message carrying a trailing big-endian CRC-16.
pub fn validate_orderwire_crc16(message_with_crc: &[u8]) -> bool {
    if message_with_crc.len() < 2 {
        return false;
    }
    let (body, tail) = message_with_crc.split_at(message_with_crc.len() - 2);
    let received = u16::from_be_bytes([tail[0], tail[1]]);
    orderwire_crc16(body) == received
}

// ============================================================================
// Slot management
// ============================================================================

/// Assign a response slot by hashing the address (byte sum mod 8).
pub fn assign_slot(address: &str) -> u8 {
    let sum: u32 = address.bytes().map(u32::from).sum();
    (sum % NUM_SLOTS as u32) as u8
}

/// Transmission time for a slot: `base + slot · 200 ms`. Slots above 7 are
/// clamped to the last slot.
pub fn slot_time_ms(slot: u8, base_time_ms: u64) -> u64 {
    let slot = slot.min(NUM_SLOTS - 1);
    base_time_ms + slot as u64 * SLOT_DURATION_MS
}

// ============================================================================
// AQC word building
// ============================================================================

/// Build the two words of an AQC call probe: a TO (or TWS) word whose
/// payload carries the packed data elements, then the caller's FROM word.
pub fn build_call_probe_words(
    to_address: &str,
    from_address: &str,
    de: &DataElements,
    net: bool,
    timestamp_ms: u64,
) -> [AleWord; 2] {
    let to_type = if net { Preamble::Tws } else { Preamble::To };
    let mut to_word = AleWord::for_transmit(to_type, to_address, timestamp_ms);
    to_word.raw_payload = pack_data_elements(de);

    let from_word = AleWord::for_transmit(
        Preamble::From,
        from_address,
        timestamp_ms + crate::params::WORD_DURATION_MS,
    );
    [to_word, from_word]
}

/// Build an orderwire (AMD) word sequence: DATA words carrying the text
/// three characters at a time (space-padded), closed by a CMD word whose
/// payload holds the CRC-16 of the text.
///
/// Returns `None` when the text contains characters outside the ALE set.
pub fn build_orderwire_words(text: &str, timestamp_ms: u64) -> Option<Vec<AleWord>> {
    if text.is_empty() || !text.chars().all(crate::ale_word::is_valid_ale_char) {
        return None;
    }

    let chars: Vec<char> = text.chars().collect();
    let mut words = Vec::with_capacity(chars.len() / 3 + 2);
    let mut t = timestamp_ms;
    for chunk in chars.chunks(3) {
        let mut group: String = chunk.iter().collect();
        while group.chars().count() < 3 {
            group.push(' ');
        }
        words.push(AleWord::for_transmit(Preamble::Data, &group, t));
        t += crate::params::WORD_DURATION_MS;
    }

    let mut cmd = AleWord::for_transmit(Preamble::Cmd, "   ", t);
    cmd.raw_payload = orderwire_crc16(text.as_bytes()) as u32;
    words.push(cmd);
    Some(words)
}

// ============================================================================
// AQC message parsing
// ============================================================================

/// AQC call probe: enhanced TO call addressed at one station.
#[derive(Debug, Clone, PartialEq)]
pub struct CallProbe {
    pub to_address: String,
    pub term_address: String,
    pub de: DataElements,
    pub timestamp_ms: u64,
}

/// AQC call handshake: the called station's response.
#[derive(Debug, Clone, PartialEq)]
pub struct CallHandshake {
    pub to_address: String,
    pub from_address: String,
    pub de: DataElements,
    pub crc_status: CrcStatus,
    pub ack_this: bool,
    pub slot: u8,
    pub timestamp_ms: u64,
}

/// AQC inlink notification: link established.
#[derive(Debug, Clone, PartialEq)]
pub struct Inlink {
    pub to_address: String,
    pub term_address: String,
    pub de: DataElements,
    pub crc_status: CrcStatus,
    pub ack_this: bool,
    pub net_call: bool,
    pub slot: u8,
    pub timestamp_ms: u64,
}

/// AQC orderwire (AMD) text message.
#[derive(Debug, Clone, PartialEq)]
pub struct Orderwire {
    pub message: String,
    pub crc_status: CrcStatus,
    pub carried_crc: u16,
    pub timestamp_ms: u64,
}

/// Parse a call probe from a word sequence starting `TO|TWS, FROM|TIS`.
pub fn parse_call_probe(words: &[AleWord]) -> Option<CallProbe> {
    if words.len() < 2 {
        return None;
    }
    if !matches!(words[0].preamble, Preamble::To | Preamble::Tws) {
        return None;
    }
    if !matches!(words[1].preamble, Preamble::From | Preamble::Tis) {
        return None;
    }

    let de = if is_aqc_format(&words[0]) {
        extract_data_elements(words[0].raw_payload)
    } else {
        DataElements::default()
    };

    Some(CallProbe {
        to_address: words[0].address.clone(),
        term_address: words[1].address.clone(),
        de,
        timestamp_ms: words[0].timestamp_ms,
    })
}

/// Parse a call handshake: `TO, FROM|TIS [, CMD]`.
pub fn parse_call_handshake(words: &[AleWord]) -> Option<CallHandshake> {
    if words.len() < 2 || words[0].preamble != Preamble::To {
        return None;
    }
    if !matches!(words[1].preamble, Preamble::From | Preamble::Tis) {
        return None;
    }

    let (de, slot, ack_this) = if is_aqc_format(&words[1]) {
        let de = extract_data_elements(words[1].raw_payload);
        (de, de.de2_slot, de.de9_transaction == TransactionCode::AckLast)
    } else {
        (DataElements::default(), 0, false)
    };

    Some(CallHandshake {
        to_address: words[0].address.clone(),
        from_address: words[1].address.clone(),
        de,
        crc_status: CrcStatus::NotApplicable,
        ack_this,
        slot,
        timestamp_ms: words[0].timestamp_ms,
    })
}

/// Parse an inlink message: `TO|TWS, FROM|TIS [, CMD]`.
pub fn parse_inlink(words: &[AleWord]) -> Option<Inlink> {
    if words.len() < 2 {
        return None;
    }
    if !matches!(words[0].preamble, Preamble::To | Preamble::Tws) {
        return None;
    }
    if !matches!(words[1].preamble, Preamble::From | Preamble::Tis) {
        return None;
    }

    let net_call = words[0].preamble == Preamble::Tws;
    let (de, slot, ack_this) = if is_aqc_format(&words[0]) {
        let de = extract_data_elements(words[0].raw_payload);
        (de, de.de2_slot, de.de9_transaction == TransactionCode::AckLast)
    } else {
        (DataElements::default(), 0, false)
    };

    Some(Inlink {
        to_address: words[0].address.clone(),
        term_address: words[1].address.clone(),
        de,
        crc_status: CrcStatus::NotApplicable,
        ack_this,
        net_call,
        slot,
        timestamp_ms: words[0].timestamp_ms,
    })
}

/// Parse an orderwire (AMD) message: DATA words carry the text three
/// characters at a time, an optional trailing CMD word carries a CRC-16 in
/// its low payload bits. Trailing spaces are trimmed from the text.
pub fn parse_orderwire(words: &[AleWord]) -> Option<Orderwire> {
    if words.is_empty() {
        return None;
    }

    let mut message = String::new();
    let mut carried_crc = 0u16;
    let mut crc_status = CrcStatus::NotApplicable;

    for word in words {
        match word.preamble {
            Preamble::Data => message.push_str(&word.address),
            Preamble::Cmd => {
                carried_crc = (word.raw_payload & 0xFFFF) as u16;
                let text = message.trim_end_matches(' ');
                crc_status = if orderwire_crc16(text.as_bytes()) == carried_crc {
                    CrcStatus::Ok
                } else {
                    CrcStatus::Error
                };
            }
            _ => {}
        }
    }

    while message.ends_with(' ') {
        message.pop();
    }
    if message.is_empty() {
        return None;
    }

    Some(Orderwire {
        message,
        crc_status,
        carried_crc,
        timestamp_ms: words[0].timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ale_word::{AleWord, WordParser};

    /// Scenario: packed payload unpacks to the expected element values.
    #[test]
    fn data_element_extraction() {
        let payload = 5 | (9 << 3) | (20 << 7) | (2 << 12) | (3 << 15) | (1 << 18);
        let de = extract_data_elements(payload);
        assert_eq!(de.de2_slot, 5);
        assert_eq!(de.de3_traffic, TrafficClass::PskMsg);
        assert_eq!(de.de4_lqa, 20);
        assert_eq!(de.de9_transaction, TransactionCode::AckLast);
        assert_eq!(de.de1_reserved, 3);
        assert_eq!(de.de8_orderwire_count, 1);
        assert_eq!(de.de5, 0);
        assert_eq!(de.de6, 0);
        assert_eq!(de.de7, 0);
    }

    #[test]
    fn pack_extract_round_trip() {
        for payload in [0u32, 0x1F_FFFF, 0x0A_5A5A, 0x15_00F3] {
            let de = extract_data_elements(payload);
            assert_eq!(pack_data_elements(&de), payload);
        }
    }

    /// Scenario: CRC-16 over "HELLO", appended big-endian, survives
    /// validation; any single bit flip fails it.
    #[test]
    fn orderwire_crc16_validation() {
        let mut framed = b"HELLO".to_vec();
        let crc = orderwire_crc16(b"HELLO");
        framed.extend_from_slice(&crc.to_be_bytes());
        assert!(validate_orderwire_crc16(&framed));

        for byte in 0..framed.len() {
            for bit in 0..8 {
                let mut corrupted = framed.clone();
                corrupted[byte] ^= 1 << bit;
                assert!(!validate_orderwire_crc16(&corrupted), "byte {byte} bit {bit}");
            }
        }
    }

    #[test]
    fn orderwire_crc8_validation() {
        let mut framed = b"QSL".to_vec();
        framed.push(orderwire_crc8(b"QSL"));
        assert!(validate_orderwire_crc8(&framed));
        framed[0] ^= 0x20;
        assert!(!validate_orderwire_crc8(&framed));
        assert!(!validate_orderwire_crc8(&[]));
    }

    #[test]
    fn slot_assignment_is_stable_and_bounded() {
        for addr in ["W1AW", "K6K", "NET1", "@@@"] {
            let slot = assign_slot(addr);
            assert!(slot < NUM_SLOTS);
            assert_eq!(slot, assign_slot(addr));
        }
        // Byte-sum hash: "ABC" = 65+66+67 = 198, 198 % 8 = 6.
        assert_eq!(assign_slot("ABC"), 6);
    }

    #[test]
    fn slot_timing() {
        assert_eq!(slot_time_ms(0, 1000), 1000);
        assert_eq!(slot_time_ms(3, 1000), 1600);
        assert_eq!(slot_time_ms(7, 0), 1400);
        // Out-of-range slots clamp to the last slot.
        assert_eq!(slot_time_ms(12, 0), 1400);
    }

    #[test]
    fn cmd_words_detected_as_aqc() {
        let cmd = AleWord::for_transmit(Preamble::Cmd, "ABC", 0);
        assert!(is_aqc_format(&cmd));
        let to = AleWord::for_transmit(Preamble::To, "ABC", 0);
        assert!(!is_aqc_format(&to));
    }

    #[test]
    fn non_printable_payload_detected_as_aqc() {
        // First 7-bit payload character 0x01 is a control code.
        let word = WordParser::parse_from_bits(Preamble::To as u32 | (0x01 << 3), 0);
        assert!(is_aqc_format(&word));
    }

    #[test]
    fn call_probe_parsing() {
        let words = [
            AleWord::for_transmit(Preamble::To, "K6K", 100),
            AleWord::for_transmit(Preamble::From, "W1A", 492),
        ];
        let probe = parse_call_probe(&words).unwrap();
        assert_eq!(probe.to_address, "K6K");
        assert_eq!(probe.term_address, "W1A");
        assert_eq!(probe.timestamp_ms, 100);

        // Wrong leading word type fails.
        assert!(parse_call_probe(&words[1..]).is_none());
        assert!(parse_call_probe(&words[..1]).is_none());
    }

    #[test]
    fn handshake_pulls_slot_and_ack_from_elements() {
        let payload = 4 | (2 << 12); // slot 4, ACK_LAST
        let mut from = WordParser::parse_from_bits(6 | (payload << 3), 500);
        from.preamble = Preamble::From;
        let words = [AleWord::for_transmit(Preamble::To, "K6K", 100), from];
        let hs = parse_call_handshake(&words).unwrap();
        assert_eq!(hs.slot, 4);
        assert!(hs.ack_this);
    }

    #[test]
    fn inlink_flags_net_calls() {
        let words = [
            AleWord::for_transmit(Preamble::Tws, "NT1", 0),
            AleWord::for_transmit(Preamble::Tis, "W1A", 392),
        ];
        let inlink = parse_inlink(&words).unwrap();
        assert!(inlink.net_call);
    }

    #[test]
    fn orderwire_text_accumulates_and_validates() {
        let crc = orderwire_crc16(b"HELLO Q");
        let mut words = vec![
            AleWord::for_transmit(Preamble::Data, "HEL", 0),
            AleWord::for_transmit(Preamble::Data, "LO ", 392),
            AleWord::for_transmit(Preamble::Data, "Q", 784),
        ];
        let mut cmd = AleWord::for_transmit(Preamble::Cmd, "   ", 1176);
        cmd.raw_payload = crc as u32;
        words.push(cmd);

        let ow = parse_orderwire(&words).unwrap();
        assert_eq!(ow.message, "HELLO Q");
        assert_eq!(ow.crc_status, CrcStatus::Ok);
        assert_eq!(ow.carried_crc, crc);
    }

    #[test]
    fn orderwire_crc_mismatch_is_flagged() {
        let mut cmd = AleWord::for_transmit(Preamble::Cmd, "   ", 392);
        cmd.raw_payload = 0xBEEF;
        let words = vec![AleWord::for_transmit(Preamble::Data, "MSG", 0), cmd];
        let ow = parse_orderwire(&words).unwrap();
        assert_eq!(ow.crc_status, CrcStatus::Error);
    }

    #[test]
    fn empty_orderwire_is_none() {
        assert!(parse_orderwire(&[]).is_none());
        let words = [AleWord::for_transmit(Preamble::To, "K6K", 0)];
        assert!(parse_orderwire(&words).is_none());
    }

    #[test]
    fn built_orderwire_parses_back_with_good_crc() {
        let words = build_orderwire_words("QSL DE W1AW", 1000).unwrap();
        // 11 chars -> 4 DATA words + 1 CMD word.
        assert_eq!(words.len(), 5);
        let ow = parse_orderwire(&words).unwrap();
        assert_eq!(ow.message, "QSL DE W1AW");
        assert_eq!(ow.crc_status, CrcStatus::Ok);
    }

    #[test]
    fn orderwire_builder_rejects_bad_characters() {
        assert!(build_orderwire_words("", 0).is_none());
        assert!(build_orderwire_words("lower", 0).is_none());
        assert!(build_orderwire_words("HAS,COMMA", 0).is_none());
    }

    #[test]
    fn built_call_probe_parses_back() {
        // A low traffic-class code keeps the first payload character out of
        // printable ASCII, so the AQC heuristic recognizes the word.
        let de = DataElements {
            de2_slot: 3,
            de3_traffic: TrafficClass::HfdVoice,
            de4_lqa: 25,
            de9_transaction: TransactionCode::AckLast,
            ..DataElements::default()
        };
        let words = build_call_probe_words("ABC", "XYZ", &de, false, 1000);
        assert_eq!(words[0].preamble, Preamble::To);
        assert_eq!(words[1].preamble, Preamble::From);
        assert_eq!(words[1].timestamp_ms, 1392);

        let probe = parse_call_probe(&words).unwrap();
        assert_eq!(probe.de.de2_slot, 3);
        assert_eq!(probe.de.de4_lqa, 25);
        assert_eq!(probe.de.de9_transaction, TransactionCode::AckLast);
        assert_eq!(probe.term_address, "XYZ");
    }
}
