//! ALE Link State Machine — scanning, calling, linking, sounding
//!
//! Drives the MIL-STD-188-141B link establishment procedures: hop across
//! the scan list while idle-listening, detect calls addressed to us, place
//! outbound individual and net calls, hold an established link, and emit
//! soundings for link quality probing.
//!
//! The machine is purely event- and clock-driven: `process_event` applies
//! one transition, `update(now_ms)` polls dwell and link timeouts against a
//! caller-supplied monotonic millisecond clock. All outward effects go
//! through three sinks installed by the host — state changes, words to
//! transmit, and channel changes — invoked synchronously, never from a
//! background thread.
//!
//! Transition table (events not listed are ignored; ERROR_OCCURRED always
//! enters ERROR):
//!
//! | From | Event | To |
//! |---|---|---|
//! | IDLE | START_SCAN / CALL_REQUEST / SOUNDING_REQUEST | SCANNING / CALLING / SOUNDING |
//! | SCANNING | STOP_SCAN / CALL_DETECTED / CALL_REQUEST | IDLE / HANDSHAKE / CALLING |
//! | CALLING | HANDSHAKE_COMPLETE / LINK_TIMEOUT | LINKED / IDLE |
//! | HANDSHAKE | HANDSHAKE_COMPLETE / LINK_TIMEOUT | LINKED / SCANNING |
//! | LINKED | LINK_TERMINATED or LINK_TIMEOUT | IDLE |
//! | SOUNDING | SOUNDING_COMPLETE | SCANNING |
//! | ERROR | START_SCAN / any other | SCANNING / IDLE |

use serde::{Deserialize, Serialize};

use crate::address::AddressBook;
use crate::ale_message::MessageAssembler;
use crate::ale_word::{AleWord, Preamble};
use crate::params::WORD_DURATION_MS;

/// Call setup timeout for CALLING and HANDSHAKE, per MIL-STD-188-141B.
pub const CALL_TIMEOUT_MS: u64 = 30_000;

/// Inactivity timeout for an established link.
pub const LINK_TIMEOUT_MS: u64 = 120_000;

/// Default per-channel listen time while scanning.
pub const DEFAULT_DWELL_TIME_MS: u64 = 200;

/// Link state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AleState {
    Idle,
    Scanning,
    Calling,
    Handshake,
    Linked,
    Sounding,
    Error,
}

impl AleState {
    pub fn name(&self) -> &'static str {
        match self {
            AleState::Idle => "IDLE",
            AleState::Scanning => "SCANNING",
            AleState::Calling => "CALLING",
            AleState::Handshake => "HANDSHAKE",
            AleState::Linked => "LINKED",
            AleState::Sounding => "SOUNDING",
            AleState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for AleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Events the machine responds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AleEvent {
    StartScan,
    StopScan,
    CallRequest,
    CallDetected,
    HandshakeComplete,
    LinkTimeout,
    LinkTerminated,
    SoundingRequest,
    SoundingComplete,
    ErrorOccurred,
}

impl AleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            AleEvent::StartScan => "START_SCAN",
            AleEvent::StopScan => "STOP_SCAN",
            AleEvent::CallRequest => "CALL_REQUEST",
            AleEvent::CallDetected => "CALL_DETECTED",
            AleEvent::HandshakeComplete => "HANDSHAKE_COMPLETE",
            AleEvent::LinkTimeout => "LINK_TIMEOUT",
            AleEvent::LinkTerminated => "LINK_TERMINATED",
            AleEvent::SoundingRequest => "SOUNDING_REQUEST",
            AleEvent::SoundingComplete => "SOUNDING_COMPLETE",
            AleEvent::ErrorOccurred => "ERROR_OCCURRED",
        }
    }
}

/// A scannable radio channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    /// Center frequency in Hz.
    pub frequency_hz: u32,
    /// Sideband mode, "USB" or "LSB".
    #[serde(default = "Channel::default_mode")]
    pub mode: String,
    /// Link Quality Analysis score, 0..=100.
    #[serde(default)]
    pub lqa_score: f32,
    /// Last time this channel was selected while scanning.
    #[serde(default)]
    pub last_scan_time_ms: u64,
    /// Calls heard on this channel.
    #[serde(default)]
    pub call_count: u32,
}

impl Channel {
    pub fn new(frequency_hz: u32) -> Self {
        Self {
            frequency_hz,
            mode: Self::default_mode(),
            lqa_score: 0.0,
            last_scan_time_ms: 0,
            call_count: 0,
        }
    }

    fn default_mode() -> String {
        "USB".to_string()
    }
}

/// Scanning configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub scan_list: Vec<Channel>,
    pub dwell_time_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_list: Vec::new(),
            dwell_time_ms: DEFAULT_DWELL_TIME_MS,
        }
    }
}

/// Per-channel reception quality snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinkQuality {
    pub snr_db: f32,
    pub ber: f32,
    pub fec_errors: u32,
    pub total_words: u32,
    pub timestamp_ms: u64,
}

type StateSink = Box<dyn FnMut(AleState, AleState)>;
type WordSink = Box<dyn FnMut(&AleWord)>;
type ChannelSink = Box<dyn FnMut(&Channel)>;

/// The ALE link state machine.
pub struct AleStateMachine {
    state: AleState,
    previous_state: AleState,

    scan_config: ScanConfig,
    channel_index: usize,
    address_book: AddressBook,
    assembler: MessageAssembler,

    active_call_to: String,
    active_call_from: String,

    state_entry_time_ms: u64,
    last_scan_hop_time_ms: u64,
    link_start_time_ms: u64,
    last_word_time_ms: u64,
    current_time_ms: u64,

    channel_quality: Vec<LinkQuality>,

    on_state_change: Option<StateSink>,
    on_transmit_word: Option<WordSink>,
    on_channel_change: Option<ChannelSink>,
}

impl AleStateMachine {
    pub fn new() -> Self {
        Self {
            state: AleState::Idle,
            previous_state: AleState::Idle,
            scan_config: ScanConfig::default(),
            channel_index: 0,
            address_book: AddressBook::new(),
            assembler: MessageAssembler::new(),
            active_call_to: String::new(),
            active_call_from: String::new(),
            state_entry_time_ms: 0,
            last_scan_hop_time_ms: 0,
            link_start_time_ms: 0,
            last_word_time_ms: 0,
            current_time_ms: 0,
            channel_quality: Vec::new(),
            on_state_change: None,
            on_transmit_word: None,
            on_channel_change: None,
        }
    }

    // ------------------------------------------------------------------
    // Configuration and sinks
    // ------------------------------------------------------------------

    pub fn state(&self) -> AleState {
        self.state
    }

    pub fn previous_state(&self) -> AleState {
        self.previous_state
    }

    pub fn configure_scan(&mut self, config: ScanConfig) {
        self.scan_config = config;
        self.channel_index = 0;
    }

    pub fn add_scan_channel(&mut self, channel: Channel) {
        self.scan_config.scan_list.push(channel);
    }

    /// Set this station's address; false if it fails validation.
    pub fn set_self_address(&mut self, address: &str) -> bool {
        self.address_book.set_self_address(address)
    }

    pub fn address_book_mut(&mut self) -> &mut AddressBook {
        &mut self.address_book
    }

    /// Sink for (old, new) state transitions.
    pub fn set_state_callback(&mut self, cb: impl FnMut(AleState, AleState) + 'static) {
        self.on_state_change = Some(Box::new(cb));
    }

    /// Sink for words the machine wants on the air.
    pub fn set_transmit_callback(&mut self, cb: impl FnMut(&AleWord) + 'static) {
        self.on_transmit_word = Some(Box::new(cb));
    }

    /// Sink for channel changes while scanning.
    pub fn set_channel_callback(&mut self, cb: impl FnMut(&Channel) + 'static) {
        self.on_channel_change = Some(Box::new(cb));
    }

    /// Currently tuned channel, if the scan list is non-empty.
    pub fn current_channel(&self) -> Option<&Channel> {
        self.scan_config.scan_list.get(self.channel_index)
    }

    /// Addresses of the call in progress: (to, from).
    pub fn active_call(&self) -> (&str, &str) {
        (&self.active_call_to, &self.active_call_from)
    }

    /// When the current link attempt or link began.
    pub fn link_start_time_ms(&self) -> u64 {
        self.link_start_time_ms
    }

    /// When the last valid word arrived.
    pub fn last_word_time_ms(&self) -> u64 {
        self.last_word_time_ms
    }

    /// Latest quality snapshot recorded for a scan-list index.
    pub fn channel_quality(&self, index: usize) -> Option<&LinkQuality> {
        self.channel_quality.get(index)
    }

    /// Assembled messages are available here after words flow in.
    pub fn assembler_mut(&mut self) -> &mut MessageAssembler {
        &mut self.assembler
    }

    // ------------------------------------------------------------------
    // Event processing
    // ------------------------------------------------------------------

    /// Apply one event. Returns true when the state changed.
    pub fn process_event(&mut self, event: AleEvent) -> bool {
        use AleEvent as E;
        use AleState as S;

        let target = match (self.state, event) {
            (S::Idle, E::StartScan) => Some(S::Scanning),
            (S::Idle, E::CallRequest) => Some(S::Calling),
            (S::Idle, E::SoundingRequest) => Some(S::Sounding),

            (S::Scanning, E::StopScan) => Some(S::Idle),
            (S::Scanning, E::CallDetected) => Some(S::Handshake),
            (S::Scanning, E::CallRequest) => Some(S::Calling),

            (S::Calling, E::HandshakeComplete) => Some(S::Linked),
            (S::Calling, E::LinkTimeout) => Some(S::Idle),

            (S::Handshake, E::HandshakeComplete) => Some(S::Linked),
            (S::Handshake, E::LinkTimeout) => Some(S::Scanning),

            (S::Linked, E::LinkTerminated) | (S::Linked, E::LinkTimeout) => Some(S::Idle),

            (S::Sounding, E::SoundingComplete) => Some(S::Scanning),

            (S::Error, E::StartScan) => Some(S::Scanning),
            (S::Error, _) => Some(S::Idle),

            // Any state falls into ERROR on an error event.
            (_, E::ErrorOccurred) => Some(S::Error),

            _ => None,
        };

        match target {
            Some(new_state) => self.transition_to(new_state),
            None => false,
        }
    }

    /// Periodic tick with a monotonic millisecond clock.
    pub fn update(&mut self, now_ms: u64) {
        self.current_time_ms = now_ms;

        match self.state {
            AleState::Scanning => {
                if !self.scan_config.scan_list.is_empty()
                    && now_ms.saturating_sub(self.last_scan_hop_time_ms)
                        >= self.scan_config.dwell_time_ms
                {
                    self.hop_to_next_channel();
                }
            }
            AleState::Calling | AleState::Handshake => {
                if now_ms.saturating_sub(self.state_entry_time_ms) >= CALL_TIMEOUT_MS {
                    self.process_event(AleEvent::LinkTimeout);
                }
            }
            AleState::Linked => {
                if now_ms.saturating_sub(self.state_entry_time_ms) >= LINK_TIMEOUT_MS {
                    self.process_event(AleEvent::LinkTimeout);
                }
            }
            AleState::Sounding => {
                if now_ms.saturating_sub(self.state_entry_time_ms) >= WORD_DURATION_MS {
                    self.process_event(AleEvent::SoundingComplete);
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Calls and soundings
    // ------------------------------------------------------------------

    /// Place an individual call. Only valid from IDLE or SCANNING.
    pub fn initiate_call(&mut self, to_address: &str) -> bool {
        self.initiate_call_inner(to_address, false)
    }

    /// Place a net call (TWS). Only valid from IDLE or SCANNING.
    pub fn initiate_net_call(&mut self, net_address: &str) -> bool {
        self.initiate_call_inner(net_address, true)
    }

    fn initiate_call_inner(&mut self, to_address: &str, net: bool) -> bool {
        if !matches!(self.state, AleState::Idle | AleState::Scanning) {
            return false;
        }

        self.active_call_to = to_address.to_string();
        self.active_call_from = self.address_book.self_address().to_string();

        if !self.process_event(AleEvent::CallRequest) {
            return false;
        }

        let to_type = if net { Preamble::Tws } else { Preamble::To };
        let to_word = AleWord::for_transmit(to_type, to_address, self.current_time_ms);
        self.transmit_word(&to_word);

        let from_word = AleWord::for_transmit(
            Preamble::From,
            &self.active_call_from.clone(),
            self.current_time_ms + WORD_DURATION_MS,
        );
        self.transmit_word(&from_word);
        true
    }

    /// Start a sounding cycle. Only valid from IDLE or SCANNING.
    pub fn send_sounding(&mut self) -> bool {
        if !matches!(self.state, AleState::Idle | AleState::Scanning) {
            return false;
        }
        self.process_event(AleEvent::SoundingRequest)
    }

    /// Complete an inbound handshake (host decides when to accept).
    pub fn respond_to_call(&mut self) -> bool {
        if self.state != AleState::Handshake {
            return false;
        }
        self.process_event(AleEvent::HandshakeComplete)
    }

    /// Feed a received word: quality tracking, call detection, assembly.
    pub fn process_received_word(&mut self, word: &AleWord) {
        if !word.valid {
            return;
        }

        self.last_word_time_ms = self.current_time_ms;

        let quality = LinkQuality {
            fec_errors: word.fec_errors as u32,
            total_words: 1,
            timestamp_ms: self.current_time_ms,
            ..LinkQuality::default()
        };
        self.update_link_quality(quality);

        if self.state == AleState::Scanning
            && matches!(word.preamble, Preamble::To | Preamble::Tws)
        {
            let addr = word.trimmed_address();
            if self.address_book.is_self(addr) {
                tracing::debug!(from_channel = self.channel_index, address = addr, "call detected");
                self.active_call_to = addr.to_string();
                if let Some(ch) = self.scan_config.scan_list.get_mut(self.channel_index) {
                    ch.call_count += 1;
                }
                self.process_event(AleEvent::CallDetected);
            }
        }

        self.assembler.add_word(word);
    }

    /// Fold a quality sample into the current channel's running score.
    pub fn update_link_quality(&mut self, quality: LinkQuality) {
        let idx = self.channel_index;
        while self.channel_quality.len() <= idx {
            self.channel_quality.push(LinkQuality::default());
        }
        self.channel_quality[idx] = quality;

        if let Some(channel) = self.scan_config.scan_list.get_mut(idx) {
            let score = 100.0 - quality.fec_errors as f32 * 10.0;
            channel.lqa_score = score.clamp(0.0, 100.0);
        }
    }

    /// The scan-list channel with the highest LQA score.
    pub fn select_best_channel(&self) -> Option<&Channel> {
        self.scan_config
            .scan_list
            .iter()
            .max_by(|a, b| a.lqa_score.total_cmp(&b.lqa_score))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition_to(&mut self, new_state: AleState) -> bool {
        if self.state == new_state {
            return false;
        }

        self.exit_state(self.state);
        self.previous_state = self.state;
        self.state = new_state;
        self.state_entry_time_ms = self.current_time_ms;
        self.enter_state(new_state);

        tracing::debug!(from = %self.previous_state, to = %self.state, "state transition");
        if let Some(cb) = self.on_state_change.as_mut() {
            cb(self.previous_state, new_state);
        }
        true
    }

    fn enter_state(&mut self, state: AleState) {
        match state {
            AleState::Scanning => {
                self.channel_index = 0;
                self.last_scan_hop_time_ms = self.current_time_ms;
                if !self.scan_config.scan_list.is_empty() {
                    self.set_channel(0);
                }
            }
            AleState::Calling | AleState::Handshake => {
                self.link_start_time_ms = self.current_time_ms;
            }
            AleState::Linked => {
                self.link_start_time_ms = self.current_time_ms;
                self.last_word_time_ms = self.current_time_ms;
            }
            AleState::Sounding => {
                let self_addr = self.address_book.self_address().to_string();
                if !self_addr.is_empty() {
                    let tis = AleWord::for_transmit(Preamble::Tis, &self_addr, self.current_time_ms);
                    self.transmit_word(&tis);
                }
            }
            _ => {}
        }
    }

    fn exit_state(&mut self, state: AleState) {
        if state == AleState::Linked {
            self.active_call_to.clear();
            self.active_call_from.clear();
        }
    }

    fn hop_to_next_channel(&mut self) {
        if self.scan_config.scan_list.is_empty() {
            return;
        }
        let next = (self.channel_index + 1) % self.scan_config.scan_list.len();
        self.set_channel(next);
        self.last_scan_hop_time_ms = self.current_time_ms;
    }

    fn set_channel(&mut self, index: usize) {
        if index >= self.scan_config.scan_list.len() {
            return;
        }
        self.channel_index = index;
        self.scan_config.scan_list[index].last_scan_time_ms = self.current_time_ms;
        if let Some(cb) = self.on_channel_change.as_mut() {
            cb(&self.scan_config.scan_list[index]);
        }
    }

    fn transmit_word(&mut self, word: &AleWord) {
        if let Some(cb) = self.on_transmit_word.as_mut() {
            cb(word);
        }
    }
}

impl Default for AleStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
