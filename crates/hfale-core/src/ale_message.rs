//! ALE Message Assembly and Call-Type Classification
//!
//! Words arrive one at a time off the demodulator; the assembler groups
//! consecutive valid words into a message, decides when the sequence is
//! complete, and classifies the call. A gap longer than the word timeout
//! (default 5000 ms) abandons the partial message and starts a new one at
//! the incoming word.
//!
//! Completion rules: a TIS word completes immediately (sounding); otherwise
//! at least one of {TO, TWS} plus a FROM completes a call. Classification
//! precedence: TIS → SOUNDING; TO∧FROM∧DATA → AMD; TO∧FROM → INDIVIDUAL;
//! TWS∧FROM → NET; anything else UNKNOWN.
//!
//! ## Example
//!
//! ```rust
//! use hfale_core::ale_message::{CallType, MessageAssembler};
//! use hfale_core::ale_word::{AleWord, Preamble};
//!
//! let mut asm = MessageAssembler::new();
//! asm.add_word(&AleWord::for_transmit(Preamble::To, "K6K", 1000));
//! let complete = asm.add_word(&AleWord::for_transmit(Preamble::From, "W1A", 2000));
//! assert!(complete);
//! let msg = asm.get_message().unwrap();
//! assert_eq!(msg.call_type, CallType::Individual);
//! assert_eq!(msg.duration_ms, 1000);
//! ```

use crate::ale_word::{AleWord, Preamble};

/// Default maximum silence between words of one message.
pub const DEFAULT_WORD_TIMEOUT_MS: u64 = 5000;

/// Kinds of ALE calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    /// Point-to-point call (TO + FROM).
    Individual,
    /// Net call (TWS + FROM).
    Net,
    /// Group call addressed to several stations.
    Group,
    /// Broadcast to all stations.
    AllCall,
    /// Channel sounding (TIS only).
    Sounding,
    /// Automatic Message Display (TO + FROM + DATA).
    Amd,
    /// Acknowledgment of an individual call.
    IndividualAck,
    /// Acknowledgment of a net call.
    NetAck,
    /// Unclassifiable word sequence.
    Unknown,
}

impl CallType {
    pub fn name(&self) -> &'static str {
        match self {
            CallType::Individual => "INDIVIDUAL",
            CallType::Net => "NET",
            CallType::Group => "GROUP",
            CallType::AllCall => "ALL_CALL",
            CallType::Sounding => "SOUNDING",
            CallType::Amd => "AMD",
            CallType::IndividualAck => "INDIVIDUAL_ACK",
            CallType::NetAck => "NET_ACK",
            CallType::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for CallType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A complete ALE message assembled from consecutive words.
#[derive(Debug, Clone, PartialEq)]
pub struct AleMessage {
    pub call_type: CallType,
    /// Destination addresses from TO/TWS words, trailing spaces trimmed.
    pub to_addresses: Vec<String>,
    /// Source address from FROM/TIS words.
    pub from_address: String,
    /// Payload text from DATA words.
    pub data_content: Vec<String>,
    /// Every word that formed the message, in capture order.
    pub words: Vec<AleWord>,
    /// Timestamp of the first word.
    pub start_time_ms: u64,
    /// Last-word minus first-word timestamp.
    pub duration_ms: u64,
    pub complete: bool,
}

/// Classify a word sequence by its preamble content. TIS outranks
/// everything; AMD outranks INDIVIDUAL outranks NET.
pub fn classify_call(words: &[AleWord]) -> CallType {
    if words.is_empty() {
        return CallType::Unknown;
    }

    let mut has_to = false;
    let mut has_tws = false;
    let mut has_from = false;
    let mut has_data = false;
    let mut has_tis = false;
    for word in words {
        match word.preamble {
            Preamble::To => has_to = true,
            Preamble::Tws => has_tws = true,
            Preamble::From => has_from = true,
            Preamble::Data => has_data = true,
            Preamble::Tis => has_tis = true,
            _ => {}
        }
    }

    if has_tis {
        CallType::Sounding
    } else if has_to && has_from && has_data {
        CallType::Amd
    } else if has_to && has_from {
        CallType::Individual
    } else if has_tws && has_from {
        CallType::Net
    } else {
        CallType::Unknown
    }
}

/// Groups consecutive words into messages. Holds at most one completed
/// message; [`MessageAssembler::get_message`] transfers it out and resets.
#[derive(Debug, Default)]
pub struct MessageAssembler {
    words: Vec<AleWord>,
    pending: Option<AleMessage>,
    active: bool,
    start_time_ms: u64,
    last_word_time_ms: u64,
    word_timeout_ms: u64,
}

impl MessageAssembler {
    pub fn new() -> Self {
        Self {
            word_timeout_ms: DEFAULT_WORD_TIMEOUT_MS,
            ..Self::default()
        }
    }

    /// Maximum silence between words before the partial message is dropped.
    pub fn set_timeout(&mut self, timeout_ms: u64) {
        self.word_timeout_ms = timeout_ms;
    }

    /// True while a partial message is being collected.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Feed one received word. Invalid words are dropped silently.
    ///
    /// Returns true when this word completed a message (retrievable through
    /// [`MessageAssembler::get_message`]).
    pub fn add_word(&mut self, word: &AleWord) -> bool {
        if !word.valid {
            return false;
        }

        let now = word.timestamp_ms;

        // A long gap abandons whatever was being assembled.
        if self.active && now.saturating_sub(self.last_word_time_ms) > self.word_timeout_ms {
            tracing::debug!(gap_ms = now - self.last_word_time_ms, "word gap, restarting assembly");
            self.reset();
        }

        if !self.active {
            self.active = true;
            self.start_time_ms = now;
        }

        self.words.push(word.clone());
        self.last_word_time_ms = now;

        if !self.sequence_complete() {
            return false;
        }

        let words = std::mem::take(&mut self.words);
        let mut message = AleMessage {
            call_type: classify_call(&words),
            to_addresses: Vec::new(),
            from_address: String::new(),
            data_content: Vec::new(),
            start_time_ms: self.start_time_ms,
            duration_ms: now - self.start_time_ms,
            complete: true,
            words,
        };
        Self::extract_fields(&mut message);

        self.pending = Some(message);
        self.active = false;
        true
    }

    /// Take the completed message, resetting the assembler.
    pub fn get_message(&mut self) -> Option<AleMessage> {
        let msg = self.pending.take();
        if msg.is_some() {
            self.reset();
        }
        msg
    }

    /// Drop all partial and completed state.
    pub fn reset(&mut self) {
        self.words.clear();
        self.pending = None;
        self.active = false;
        self.start_time_ms = 0;
        self.last_word_time_ms = 0;
    }

    fn sequence_complete(&self) -> bool {
        let mut has_to = false;
        let mut has_from = false;
        for word in &self.words {
            match word.preamble {
                Preamble::Tis => return true,
                Preamble::To | Preamble::Tws => has_to = true,
                Preamble::From => has_from = true,
                _ => {}
            }
        }
        has_to && has_from
    }

    fn extract_fields(message: &mut AleMessage) {
        for word in &message.words {
            let addr = word.trimmed_address();
            match word.preamble {
                Preamble::To | Preamble::Tws => {
                    if !addr.is_empty() {
                        message.to_addresses.push(addr.to_string());
                    }
                }
                Preamble::From | Preamble::Tis => {
                    if !addr.is_empty() {
                        message.from_address = addr.to_string();
                    }
                }
                Preamble::Data => {
                    if !addr.is_empty() {
                        message.data_content.push(addr.to_string());
                    }
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ale_word::{encode_ascii, WordParser};

    fn word(preamble: Preamble, addr: &str, t: u64) -> AleWord {
        AleWord::for_transmit(preamble, addr, t)
    }

    /// Scenario: individual call assembled from raw word bits.
    #[test]
    fn individual_call_from_bits() {
        let to = encode_ascii("K6K").unwrap();
        let from = encode_ascii("W1A").unwrap();
        let w1 = WordParser::parse_from_bits(2 | (to << 3), 1000);
        let w2 = WordParser::parse_from_bits(4 | (from << 3), 2000);

        let mut asm = MessageAssembler::new();
        assert!(!asm.add_word(&w1));
        assert!(asm.add_word(&w2));

        let msg = asm.get_message().unwrap();
        assert_eq!(msg.call_type, CallType::Individual);
        assert_eq!(msg.to_addresses, vec!["K6K".to_string()]);
        assert_eq!(msg.from_address, "W1A");
        assert_eq!(msg.start_time_ms, 1000);
        assert_eq!(msg.duration_ms, 1000);
        assert!(msg.complete);
    }

    /// Scenario: a lone TIS word is a complete sounding.
    #[test]
    fn sounding_from_single_tis() {
        let payload = encode_ascii("W1A").unwrap();
        let tis = WordParser::parse_from_bits(5 | (payload << 3), 1000);

        let mut asm = MessageAssembler::new();
        assert!(asm.add_word(&tis));
        let msg = asm.get_message().unwrap();
        assert_eq!(msg.call_type, CallType::Sounding);
        assert_eq!(msg.from_address, "W1A");
        assert_eq!(msg.duration_ms, 0);
    }

    #[test]
    fn amd_call_with_data_words() {
        let mut asm = MessageAssembler::new();
        asm.add_word(&word(Preamble::To, "K6K", 0));
        asm.add_word(&word(Preamble::Data, "MSG", 392));
        assert!(asm.add_word(&word(Preamble::From, "W1A", 784)));

        let msg = asm.get_message().unwrap();
        assert_eq!(msg.call_type, CallType::Amd);
        assert_eq!(msg.data_content, vec!["MSG".to_string()]);
    }

    #[test]
    fn net_call_uses_tws() {
        let mut asm = MessageAssembler::new();
        asm.add_word(&word(Preamble::Tws, "NT1", 0));
        assert!(asm.add_word(&word(Preamble::From, "W1A", 392)));
        assert_eq!(asm.get_message().unwrap().call_type, CallType::Net);
    }

    #[test]
    fn word_gap_restarts_assembly() {
        let mut asm = MessageAssembler::new();
        asm.add_word(&word(Preamble::To, "K6K", 0));
        // 6 s later: the TO is stale, assembly restarts at the FROM.
        assert!(!asm.add_word(&word(Preamble::From, "W1A", 6000)));
        assert!(asm.is_active());
        assert!(asm.get_message().is_none());
    }

    #[test]
    fn configurable_timeout() {
        let mut asm = MessageAssembler::new();
        asm.set_timeout(10_000);
        asm.add_word(&word(Preamble::To, "K6K", 0));
        assert!(asm.add_word(&word(Preamble::From, "W1A", 6000)));
    }

    #[test]
    fn invalid_words_are_dropped() {
        let mut asm = MessageAssembler::new();
        let mut bad = word(Preamble::To, "K6K", 0);
        bad.valid = false;
        assert!(!asm.add_word(&bad));
        assert!(!asm.is_active());
    }

    #[test]
    fn trailing_spaces_trimmed_from_addresses() {
        let mut asm = MessageAssembler::new();
        asm.add_word(&word(Preamble::To, "K6", 0));
        asm.add_word(&word(Preamble::From, "W1", 392));
        let msg = asm.get_message().unwrap();
        assert_eq!(msg.to_addresses, vec!["K6".to_string()]);
        assert_eq!(msg.from_address, "W1");
    }

    #[test]
    fn classifier_precedence() {
        let tis = word(Preamble::Tis, "AAA", 0);
        let to = word(Preamble::To, "BBB", 0);
        let from = word(Preamble::From, "CCC", 0);
        let data = word(Preamble::Data, "DDD", 0);
        let tws = word(Preamble::Tws, "EEE", 0);

        // TIS wins over everything.
        assert_eq!(
            classify_call(&[to.clone(), from.clone(), data.clone(), tis.clone()]),
            CallType::Sounding
        );
        assert_eq!(
            classify_call(&[to.clone(), from.clone(), data.clone()]),
            CallType::Amd
        );
        assert_eq!(classify_call(&[to.clone(), from.clone()]), CallType::Individual);
        assert_eq!(classify_call(&[tws.clone(), from.clone()]), CallType::Net);
        // TO beats TWS when both present with FROM.
        assert_eq!(
            classify_call(&[tws, to, from.clone()]),
            CallType::Individual
        );
        assert_eq!(classify_call(&[from]), CallType::Unknown);
        assert_eq!(classify_call(&[]), CallType::Unknown);
    }

    #[test]
    fn only_one_message_held_at_a_time() {
        let mut asm = MessageAssembler::new();
        asm.add_word(&word(Preamble::Tis, "AAA", 0));
        assert!(asm.get_message().is_some());
        assert!(asm.get_message().is_none());
    }
}
