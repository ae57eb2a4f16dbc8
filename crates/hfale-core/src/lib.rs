//! # HF ALE Core
//!
//! A clean-room HF Automatic Link Establishment stack: the MIL-STD-188-141B
//! 2G ALE waveform and protocol layers (with the AQC-ALE extension), Link
//! Quality Analysis, and a FED-STD-1052 Variable-ARQ data link for reliable
//! byte-stream delivery over narrow-band SSB radios.
//!
//! The crate covers the signal-and-protocol pipeline between audio samples
//! and application bytes. Sound-card I/O, PTT keying, and radio tuning stay
//! outside; hosts feed 8 kHz signed 16-bit samples in, take samples and
//! frames out through callbacks, and drive timeouts with a monotonic
//! millisecond clock of their choosing.
//!
//! ## Signal Flow
//!
//! ```text
//! TX: address → ALE word → triple-redundant symbols → 8-FSK tones → PCM
//! RX: PCM → sliding DFT → symbol detect → vote → word parse → message
//!                                                   ↓
//!                        LQA database ← metrics ← link state machine
//!
//! DATA: bytes → 1023-byte blocks → FS-1052 data frames ⇄ selective ACK
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hfale_core::ale_word::{encode_ascii, Preamble, WordParser};
//! use hfale_core::word_decoder::encode_word_symbols;
//!
//! // Build a TO word addressed at K6K, spread it across the 147-symbol
//! // triple-redundant stream, and decode it back through voting.
//! let payload = encode_ascii("K6K").unwrap();
//! let word_bits = Preamble::To as u32 | (payload << 3);
//! let symbols = encode_word_symbols(word_bits);
//!
//! let word = WordParser::parse_word(&symbols, 0);
//! assert_eq!(word.preamble, Preamble::To);
//! assert_eq!(word.address, "K6K");
//! assert_eq!(word.fec_errors, 0);
//! ```

pub mod address;
pub mod ale_message;
pub mod ale_word;
pub mod aqc;
pub mod config;
pub mod crc;
pub mod demodulator;
pub mod fs1052_arq;
pub mod fs1052_frame;
pub mod golay;
pub mod link_state_machine;
pub mod lqa_analyzer;
pub mod lqa_database;
pub mod lqa_metrics;
pub mod observe;
pub mod params;
pub mod spectral_estimator;
pub mod symbol_detector;
pub mod tone_generator;
pub mod word_decoder;

pub use ale_message::{AleMessage, CallType, MessageAssembler};
pub use ale_word::{AleWord, Preamble, WordParser};
pub use config::StationConfig;
pub use demodulator::Demodulator;
pub use fs1052_arq::{ArqEvent, ArqState, ArqStats, VariableArq};
pub use fs1052_frame::{ControlFrame, DataFrame, FrameError};
pub use link_state_machine::{AleEvent, AleState, AleStateMachine, Channel, ScanConfig};
pub use lqa_analyzer::LqaAnalyzer;
pub use lqa_database::{LqaDatabase, LqaEntry};
pub use lqa_metrics::{MetricsCollector, MetricsSample};
pub use symbol_detector::Symbol;
pub use tone_generator::ToneGenerator;
