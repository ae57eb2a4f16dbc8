//! Variable ARQ — FED-STD-1052 selective-repeat data link
//!
//! Reliable byte-stream delivery over the FS-1052 frame codec. The sender
//! segments a message into blocks of up to 1023 bytes with wrapping
//! sequence numbers, transmits up to a window of them, and waits for
//! selective acknowledgments carried as a 256-bit bitmap in control
//! frames. NAKs and ACK timeouts queue the unacknowledged blocks for
//! retransmission; a block exhausting its retransmit budget is fatal for
//! the session and parks the machine in ERROR until RESET. The receiver
//! drops duplicate sequences via its own 256-bit bitmap and reassembles
//! blocks into the message buffer by byte offset, so out-of-order delivery
//! completes in order.
//!
//! The machine never blocks and never reads a clock: frames go out through
//! a transmit callback invoked synchronously, and timeouts are polled by
//! `update(now_ms)` with a caller-supplied monotonic time. `update` also
//! drives queued retransmissions, so a host only has to pump frames and
//! call `update` periodically.

use crate::fs1052_frame::{
    detect_frame_type, format_control_frame, format_data_frame, parse_control_frame,
    parse_data_frame, AckNakType, ControlFrame, DataFrame, DataRate, FrameType,
    InterleaverLength, MAX_DATA_BLOCK_LEN,
};

/// Default ACK wait before retransmission, in milliseconds.
pub const DEFAULT_ACK_TIMEOUT_MS: u64 = 5000;

/// Default retransmission budget per block.
pub const DEFAULT_MAX_RETRANSMITS: u8 = 3;

/// Default transmission window in blocks.
pub const DEFAULT_WINDOW_SIZE: usize = 16;

/// ARQ machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArqState {
    Idle,
    TxData,
    WaitAck,
    RxData,
    SendAck,
    Retransmit,
    Error,
}

impl ArqState {
    pub fn name(&self) -> &'static str {
        match self {
            ArqState::Idle => "IDLE",
            ArqState::TxData => "TX_DATA",
            ArqState::WaitAck => "WAIT_ACK",
            ArqState::RxData => "RX_DATA",
            ArqState::SendAck => "SEND_ACK",
            ArqState::Retransmit => "RETRANSMIT",
            ArqState::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for ArqState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// ARQ events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArqEvent {
    StartTx,
    DataReady,
    FrameSent,
    AckReceived,
    NakReceived,
    Timeout,
    StartRx,
    FrameReceived,
    TransferComplete,
    ErrorEvent,
    Reset,
}

impl ArqEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ArqEvent::StartTx => "START_TX",
            ArqEvent::DataReady => "DATA_READY",
            ArqEvent::FrameSent => "FRAME_SENT",
            ArqEvent::AckReceived => "ACK_RECEIVED",
            ArqEvent::NakReceived => "NAK_RECEIVED",
            ArqEvent::Timeout => "TIMEOUT",
            ArqEvent::StartRx => "START_RX",
            ArqEvent::FrameReceived => "FRAME_RECEIVED",
            ArqEvent::TransferComplete => "TRANSFER_COMPLETE",
            ArqEvent::ErrorEvent => "ERROR_EVENT",
            ArqEvent::Reset => "RESET",
        }
    }
}

/// One transmit-side block.
#[derive(Debug, Clone)]
struct DataBlock {
    sequence: u8,
    offset: u32,
    data: Vec<u8>,
    acknowledged: bool,
    retransmit_count: u8,
    /// When the block last went out.
    timestamp_ms: u64,
}

/// Session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArqStats {
    pub blocks_sent: u32,
    pub blocks_received: u32,
    pub blocks_retransmitted: u32,
    pub acks_sent: u32,
    pub acks_received: u32,
    pub naks_received: u32,
    pub timeouts: u32,
    pub crc_errors: u32,
    pub sequence_errors: u32,
}

type TxSink = Box<dyn FnMut(&[u8])>;
type StateSink = Box<dyn FnMut(ArqState, ArqState)>;
type ErrorSink = Box<dyn FnMut(&str)>;

/// The Variable-ARQ state machine.
pub struct VariableArq {
    state: ArqState,
    previous_state: ArqState,

    on_transmit: Option<TxSink>,
    on_state_change: Option<StateSink>,
    on_error: Option<ErrorSink>,

    // Transmit side.
    tx_blocks: Vec<DataBlock>,
    retransmit_queue: Vec<u8>,
    next_tx_index: usize,

    // Receive side.
    rx_buffer: Vec<u8>,
    rx_bitmap: [bool; 256],

    // Timing.
    current_time_ms: u64,
    wait_start_ms: u64,
    ack_timeout_ms: u64,

    // Parameters.
    window_size: usize,
    max_retransmits: u8,
    data_rate: DataRate,

    stats: ArqStats,
}

impl VariableArq {
    pub fn new() -> Self {
        Self {
            state: ArqState::Idle,
            previous_state: ArqState::Idle,
            on_transmit: None,
            on_state_change: None,
            on_error: None,
            tx_blocks: Vec::new(),
            retransmit_queue: Vec::new(),
            next_tx_index: 0,
            rx_buffer: Vec::new(),
            rx_bitmap: [false; 256],
            current_time_ms: 0,
            wait_start_ms: 0,
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            window_size: DEFAULT_WINDOW_SIZE,
            max_retransmits: DEFAULT_MAX_RETRANSMITS,
            data_rate: DataRate::Bps2400,
            stats: ArqStats::default(),
        }
    }

    /// Install the transmit sink (required) and optional state/error sinks.
    pub fn init(
        &mut self,
        tx: impl FnMut(&[u8]) + 'static,
        state: Option<StateSink>,
        error: Option<ErrorSink>,
    ) {
        self.on_transmit = Some(Box::new(tx));
        self.on_state_change = state;
        self.on_error = error;
    }

    pub fn state(&self) -> ArqState {
        self.state
    }

    pub fn previous_state(&self) -> ArqState {
        self.previous_state
    }

    pub fn stats(&self) -> &ArqStats {
        &self.stats
    }

    pub fn set_ack_timeout(&mut self, timeout_ms: u64) {
        self.ack_timeout_ms = timeout_ms;
    }

    pub fn set_max_retransmissions(&mut self, max: u8) {
        self.max_retransmits = max;
    }

    pub fn set_window_size(&mut self, size: usize) {
        self.window_size = size.max(1);
    }

    pub fn set_data_rate(&mut self, rate: DataRate) {
        self.data_rate = rate;
    }

    pub fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    /// True when no transfer is in flight (all blocks acknowledged).
    pub fn is_transfer_complete(&self) -> bool {
        self.state == ArqState::Idle && self.all_blocks_acked()
    }

    /// The receiver's reassembled message so far.
    pub fn received_data(&self) -> &[u8] {
        &self.rx_buffer
    }

    /// Drop all transfer state and return to IDLE.
    pub fn reset(&mut self) {
        self.transition_to(ArqState::Idle);
        self.tx_blocks.clear();
        self.retransmit_queue.clear();
        self.next_tx_index = 0;
        self.rx_buffer.clear();
        self.rx_bitmap = [false; 256];
        self.wait_start_ms = 0;
        self.stats = ArqStats::default();
    }

    // ------------------------------------------------------------------
    // Event machine
    // ------------------------------------------------------------------

    pub fn process_event(&mut self, event: ArqEvent) {
        match self.state {
            ArqState::Idle => self.handle_idle(event),
            ArqState::TxData => self.handle_tx_data(event),
            ArqState::WaitAck => self.handle_wait_ack(event),
            ArqState::RxData => self.handle_rx_data(event),
            ArqState::SendAck => self.handle_send_ack(event),
            ArqState::Retransmit => self.handle_retransmit(event),
            ArqState::Error => {
                if event == ArqEvent::Reset {
                    self.reset();
                }
            }
        }
    }

    fn handle_idle(&mut self, event: ArqEvent) {
        match event {
            ArqEvent::StartTx => {
                if !self.tx_blocks.is_empty() {
                    self.transition_to(ArqState::TxData);
                    self.send_next_blocks();
                }
            }
            ArqEvent::StartRx => {
                self.transition_to(ArqState::RxData);
            }
            _ => {}
        }
    }

    fn handle_tx_data(&mut self, event: ArqEvent) {
        match event {
            ArqEvent::FrameSent => {
                if self.all_blocks_acked() {
                    self.process_event(ArqEvent::TransferComplete);
                } else {
                    self.transition_to(ArqState::WaitAck);
                    self.wait_start_ms = self.current_time_ms;
                }
            }
            ArqEvent::TransferComplete => {
                self.transition_to(ArqState::Idle);
            }
            ArqEvent::ErrorEvent => {
                self.transition_to(ArqState::Error);
            }
            _ => {}
        }
    }

    fn handle_wait_ack(&mut self, event: ArqEvent) {
        match event {
            ArqEvent::AckReceived => {
                if self.all_blocks_acked() {
                    self.transition_to(ArqState::Idle);
                } else if !self.retransmit_queue.is_empty() {
                    self.transition_to(ArqState::Retransmit);
                } else {
                    self.transition_to(ArqState::TxData);
                    self.send_next_blocks();
                }
            }
            ArqEvent::NakReceived => {
                self.stats.naks_received += 1;
                self.queue_unacked_blocks();
                self.transition_to(ArqState::Retransmit);
            }
            ArqEvent::Timeout => {
                self.stats.timeouts += 1;
                self.transition_to(ArqState::Retransmit);
            }
            ArqEvent::ErrorEvent => {
                self.transition_to(ArqState::Error);
            }
            _ => {}
        }
    }

    fn handle_rx_data(&mut self, event: ArqEvent) {
        match event {
            ArqEvent::FrameReceived => {
                self.transition_to(ArqState::SendAck);
                self.send_ack();
            }
            ArqEvent::TransferComplete => {
                self.transition_to(ArqState::Idle);
            }
            ArqEvent::ErrorEvent => {
                self.transition_to(ArqState::Error);
            }
            _ => {}
        }
    }

    fn handle_send_ack(&mut self, event: ArqEvent) {
        if event == ArqEvent::FrameSent {
            self.transition_to(ArqState::RxData);
        }
    }

    fn handle_retransmit(&mut self, event: ArqEvent) {
        if event != ArqEvent::DataReady {
            return;
        }

        let queue = std::mem::take(&mut self.retransmit_queue);
        for seq in queue {
            let Some(idx) = self.tx_blocks.iter().position(|b| b.sequence == seq) else {
                continue;
            };
            if self.tx_blocks[idx].acknowledged {
                continue;
            }
            if self.tx_blocks[idx].retransmit_count >= self.max_retransmits {
                tracing::warn!(sequence = seq, "retransmission budget exhausted");
                self.report_error("max retransmissions exceeded");
                self.transition_to(ArqState::Error);
                return;
            }
            tracing::debug!(
                sequence = seq,
                last_sent_ms = self.tx_blocks[idx].timestamp_ms,
                "retransmitting block"
            );
            self.send_block(idx);
            self.tx_blocks[idx].retransmit_count += 1;
            self.stats.blocks_retransmitted += 1;
        }

        self.transition_to(ArqState::WaitAck);
        self.wait_start_ms = self.current_time_ms;
    }

    // ------------------------------------------------------------------
    // Host-facing operations
    // ------------------------------------------------------------------

    /// Segment `data` into blocks and start sending. Only valid from IDLE.
    pub fn start_transmission(&mut self, data: &[u8]) -> bool {
        if self.state != ArqState::Idle {
            self.report_error("cannot start transmission: not in IDLE state");
            return false;
        }
        if self.on_transmit.is_none() {
            self.report_error("no transmit callback configured");
            return false;
        }

        self.create_blocks(data);
        self.process_event(ArqEvent::StartTx);
        true
    }

    /// Feed a frame received off the air.
    pub fn handle_received_frame(&mut self, frame: &[u8]) {
        if frame.is_empty() {
            return;
        }

        match detect_frame_type(frame[0]) {
            FrameType::Data => match parse_data_frame(frame) {
                Ok(df) => {
                    self.accept_data_frame(&df);
                    self.stats.blocks_received += 1;
                    self.process_event(ArqEvent::FrameReceived);
                }
                Err(_) => {
                    self.stats.crc_errors += 1;
                }
            },
            _ => match parse_control_frame(frame) {
                Ok(cf) => {
                    self.apply_ack(&cf);
                    self.stats.acks_received += 1;
                    self.process_event(ArqEvent::AckReceived);
                }
                Err(_) => {
                    self.stats.crc_errors += 1;
                }
            },
        }
    }

    /// Poll timeouts and drive queued retransmissions.
    pub fn update(&mut self, now_ms: u64) {
        self.current_time_ms = now_ms;

        match self.state {
            ArqState::WaitAck => {
                if now_ms.saturating_sub(self.wait_start_ms) > self.ack_timeout_ms {
                    self.queue_unacked_blocks();
                    self.process_event(ArqEvent::Timeout);
                }
            }
            ArqState::Retransmit => {
                self.process_event(ArqEvent::DataReady);
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn transition_to(&mut self, new_state: ArqState) {
        if new_state == self.state {
            return;
        }
        let old = self.state;
        self.previous_state = old;
        self.state = new_state;
        tracing::debug!(from = %old, to = %new_state, "ARQ transition");
        if let Some(cb) = self.on_state_change.as_mut() {
            cb(old, new_state);
        }
    }

    fn create_blocks(&mut self, data: &[u8]) {
        self.tx_blocks.clear();
        self.next_tx_index = 0;

        let mut offset = 0usize;
        let mut seq = 0u8;
        for chunk in data.chunks(MAX_DATA_BLOCK_LEN) {
            self.tx_blocks.push(DataBlock {
                sequence: seq,
                offset: offset as u32,
                data: chunk.to_vec(),
                acknowledged: false,
                retransmit_count: 0,
                timestamp_ms: 0,
            });
            offset += chunk.len();
            seq = seq.wrapping_add(1);
        }
    }

    /// Send up to a window of fresh blocks, then report FRAME_SENT so the
    /// machine settles into WAIT_ACK (or IDLE when everything is acked).
    fn send_next_blocks(&mut self) {
        let mut sent = 0usize;
        while sent < self.window_size && self.next_tx_index < self.tx_blocks.len() {
            let idx = self.next_tx_index;
            if !self.tx_blocks[idx].acknowledged {
                self.send_block(idx);
                sent += 1;
            }
            self.next_tx_index += 1;
        }
        self.process_event(ArqEvent::FrameSent);
    }

    fn send_block(&mut self, idx: usize) {
        let block = &self.tx_blocks[idx];
        let frame = DataFrame {
            data_rate: self.data_rate as u8,
            interleaver: InterleaverLength::Short,
            sequence: block.sequence,
            msg_byte_offset: block.offset,
            data: block.data.clone(),
            ..DataFrame::default()
        };
        let Ok(bytes) = format_data_frame(&frame) else {
            return;
        };

        if let Some(cb) = self.on_transmit.as_mut() {
            cb(&bytes);
            self.tx_blocks[idx].timestamp_ms = self.current_time_ms;
            self.stats.blocks_sent += 1;
        }
    }

    fn send_ack(&mut self) {
        let mut frame = ControlFrame {
            frame_type: FrameType::T2Control,
            ack_nak_type: AckNakType::DataAck,
            ..ControlFrame::default()
        };
        for (seq, &received) in self.rx_bitmap.iter().enumerate() {
            if received {
                frame.set_ack(seq as u8);
            }
        }

        let bytes = format_control_frame(&frame);
        if let Some(cb) = self.on_transmit.as_mut() {
            cb(&bytes);
            self.stats.acks_sent += 1;
            self.process_event(ArqEvent::FrameSent);
        }
    }

    fn apply_ack(&mut self, frame: &ControlFrame) {
        if frame.ack_nak_type != AckNakType::DataAck {
            return;
        }
        for block in self.tx_blocks.iter_mut() {
            if frame.is_acked(block.sequence) {
                block.acknowledged = true;
            }
        }
    }

    fn accept_data_frame(&mut self, frame: &DataFrame) {
        let seq = frame.sequence as usize;
        if self.rx_bitmap[seq] {
            // Duplicate: drop silently.
            return;
        }
        self.rx_bitmap[seq] = true;

        let offset = frame.msg_byte_offset as usize;
        let end = offset + frame.data.len();
        if end > self.rx_buffer.len() {
            self.rx_buffer.resize(end, 0);
        }
        self.rx_buffer[offset..end].copy_from_slice(&frame.data);
    }

    fn queue_unacked_blocks(&mut self) {
        for block in &self.tx_blocks {
            if !block.acknowledged && !self.retransmit_queue.contains(&block.sequence) {
                self.retransmit_queue.push(block.sequence);
            }
        }
    }

    fn all_blocks_acked(&self) -> bool {
        self.tx_blocks.iter().all(|b| b.acknowledged)
    }

    fn report_error(&mut self, msg: &str) {
        tracing::warn!(error = msg, "ARQ error");
        if let Some(cb) = self.on_error.as_mut() {
            cb(msg);
        }
    }
}

impl Default for VariableArq {
    fn default() -> Self {
        Self::new()
    }
}
