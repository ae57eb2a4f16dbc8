//! ALE Word — preamble, payload, and the restricted ASCII codec
//!
//! Every MIL-STD-188-141B word carries 24 data bits: a 3-bit preamble
//! naming the word type and a 21-bit payload holding three 7-bit
//! characters from the restricted set `{space, 0–9, @, A–Z, ?, ., -, /}`.
//! Characters sit LSB-first in the payload: bits 0..6, 7..13, 14..20.
//!
//! The parser accepts either a raw 24-bit word or the 147-symbol
//! triple-redundant stream (voting is applied first). Payloads containing
//! characters outside the restricted set flag the word invalid and report
//! the placeholder address `"???"`.
//!
//! ## Example
//!
//! ```rust
//! use hfale_core::ale_word::{encode_ascii, Preamble, WordParser};
//!
//! let payload = encode_ascii("K6K").unwrap();
//! let word_bits = Preamble::To as u32 | (payload << 3);
//! let word = WordParser::parse_from_bits(word_bits, 1000);
//! assert!(word.valid);
//! assert_eq!(word.preamble, Preamble::To);
//! assert_eq!(word.address, "K6K");
//! ```

use crate::params::SYMBOLS_PER_REDUNDANT_WORD;
use crate::word_decoder::decode_word_with_voting;

/// Word preamble types per MIL-STD-188-141B Table A-II.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Preamble {
    /// Data word (message content).
    Data = 0,
    /// Through word (repeater routing).
    Thru = 1,
    /// Destination address.
    To = 2,
    /// "To With Self": group call that includes the caller.
    Tws = 3,
    /// Calling-station address.
    From = 4,
    /// "This Is Self": station identification / sounding.
    Tis = 5,
    /// Command word.
    Cmd = 6,
    /// Repeat request.
    Rep = 7,
}

impl Preamble {
    /// Decode the low three bits of a word.
    pub fn from_bits(bits: u32) -> Self {
        match bits & 0x07 {
            0 => Preamble::Data,
            1 => Preamble::Thru,
            2 => Preamble::To,
            3 => Preamble::Tws,
            4 => Preamble::From,
            5 => Preamble::Tis,
            6 => Preamble::Cmd,
            _ => Preamble::Rep,
        }
    }

    /// Standard name of the word type.
    pub fn name(&self) -> &'static str {
        match self {
            Preamble::Data => "DATA",
            Preamble::Thru => "THRU",
            Preamble::To => "TO",
            Preamble::Tws => "TWS",
            Preamble::From => "FROM",
            Preamble::Tis => "TIS",
            Preamble::Cmd => "CMD",
            Preamble::Rep => "REP",
        }
    }
}

impl std::fmt::Display for Preamble {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded ALE word.
#[derive(Debug, Clone, PartialEq)]
pub struct AleWord {
    /// Word type from the 3-bit preamble.
    pub preamble: Preamble,
    /// The three payload characters, or `"???"` when the payload is not
    /// restricted ASCII.
    pub address: String,
    /// Raw 21-bit payload.
    pub raw_payload: u32,
    /// Bit errors corrected on the way to this word.
    pub fec_errors: u8,
    /// Payload decoded as valid restricted ASCII.
    pub valid: bool,
    /// Reception (or scheduled transmission) time, caller-supplied ms.
    pub timestamp_ms: u64,
}

impl AleWord {
    /// Build a word for transmission from a type and up to three address
    /// characters (shorter addresses are space-padded).
    pub fn for_transmit(preamble: Preamble, address: &str, timestamp_ms: u64) -> Self {
        let mut chars: Vec<char> = address.chars().take(3).collect();
        while chars.len() < 3 {
            chars.push(' ');
        }
        let address: String = chars.iter().collect();
        let raw_payload = encode_ascii(&address).unwrap_or(0);
        Self {
            preamble,
            address,
            raw_payload,
            fec_errors: 0,
            valid: true,
            timestamp_ms,
        }
    }

    /// The 24-bit on-air representation of this word.
    pub fn to_bits(&self) -> u32 {
        self.preamble as u32 | (self.raw_payload << 3)
    }

    /// Address with trailing spaces removed.
    pub fn trimmed_address(&self) -> &str {
        self.address.trim_end_matches(' ')
    }
}

/// Parser from bits or symbol streams to [`AleWord`]s.
pub struct WordParser;

impl WordParser {
    /// Parse a 24-bit word.
    pub fn parse_from_bits(word_bits: u32, timestamp_ms: u64) -> AleWord {
        let preamble = Preamble::from_bits(word_bits);
        let raw_payload = extract_payload(word_bits);

        let (address, valid) = match decode_ascii(raw_payload) {
            Some(chars) => (chars, true),
            None => ("???".to_string(), false),
        };

        AleWord {
            preamble,
            address,
            raw_payload,
            fec_errors: 0,
            valid,
            timestamp_ms,
        }
    }

    /// Parse a 147-symbol triple-redundant stream: majority voting first,
    /// then the standard bit-level parse. The vote disagreement count is
    /// reported through `fec_errors` (saturated at 255).
    pub fn parse_word(
        symbols: &[u8; SYMBOLS_PER_REDUNDANT_WORD],
        timestamp_ms: u64,
    ) -> AleWord {
        let (word_bits, corrected) = decode_word_with_voting(symbols);
        let mut word = Self::parse_from_bits(word_bits & 0x00FF_FFFF, timestamp_ms);
        word.fec_errors = corrected.min(255) as u8;
        word
    }
}

/// Extract the 21-bit payload (bits 3..23) of a word.
pub fn extract_payload(word_bits: u32) -> u32 {
    (word_bits >> 3) & 0x1F_FFFF
}

/// True for characters in the ALE restricted ASCII set.
pub fn is_valid_ale_char(ch: char) -> bool {
    matches!(ch, 'A'..='Z' | '0'..='9' | ' ' | '@' | '?' | '.' | '-' | '/')
}

/// Encode exactly three restricted-ASCII characters into a 21-bit payload.
///
/// Returns `None` if the input is not exactly three characters or any
/// character falls outside the restricted set.
pub fn encode_ascii(chars: &str) -> Option<u32> {
    let chars: Vec<char> = chars.chars().collect();
    if chars.len() != 3 || !chars.iter().all(|&c| is_valid_ale_char(c)) {
        return None;
    }
    let mut payload = 0u32;
    for (i, &ch) in chars.iter().enumerate() {
        payload |= ((ch as u32) & 0x7F) << (7 * i);
    }
    Some(payload & 0x1F_FFFF)
}

/// Decode a 21-bit payload into three characters, or `None` when any 7-bit
/// codepoint falls outside the restricted set.
pub fn decode_ascii(payload: u32) -> Option<String> {
    let mut out = String::with_capacity(3);
    for i in 0..3 {
        let code = (payload >> (7 * i)) & 0x7F;
        let ch = char::from_u32(code)?;
        if !is_valid_ale_char(ch) {
            return None;
        }
        out.push(ch);
    }
    Some(out)
}
