//! 8-FSK Demodulator — sample stream in, symbols out
//!
//! Facade that chains the [`SpectralEstimator`] and the symbol detector.
//! Samples go in one at a time (or in slices); at every 64-sample boundary
//! the smoothed magnitude vector is inspected and, if a tone dominates, a
//! [`Symbol`] is emitted carrying its magnitude, SNR estimate, and the
//! index of the sample that completed the block. Detection failures simply
//! produce no symbol for that block.
//!
//! ## Example
//!
//! ```rust
//! use hfale_core::demodulator::Demodulator;
//! use hfale_core::tone_generator::ToneGenerator;
//!
//! let mut gen = ToneGenerator::new();
//! let mut audio = vec![0i16; 64 * 8];
//! gen.generate_symbols(&[0, 1, 2, 3, 4, 5, 6, 7], &mut audio, 0.7);
//!
//! let mut demod = Demodulator::new();
//! let symbols = demod.process_audio(&audio);
//! let values: Vec<u8> = symbols.iter().map(|s| s.value()).collect();
//! assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6, 7]);
//! ```

use crate::params::{DFT_SIZE, SYMBOLS_PER_WORD};
use crate::spectral_estimator::SpectralEstimator;
use crate::symbol_detector::{
    compute_snr_db, detect_symbol, estimate_noise_floor, peak_magnitude, Symbol,
};

/// Streaming 8-FSK demodulator.
#[derive(Debug, Clone)]
pub struct Demodulator {
    estimator: SpectralEstimator,
    /// Magnitude vectors of the last word's worth of symbol blocks, for
    /// soft re-decoding and diagnostics. Ring indexed by `history_offset`.
    mag_history: Vec<[f32; DFT_SIZE]>,
    history_offset: usize,
}

impl Demodulator {
    /// Create a demodulator with cleared state.
    pub fn new() -> Self {
        Self {
            estimator: SpectralEstimator::new(),
            mag_history: vec![[0.0; DFT_SIZE]; SYMBOLS_PER_WORD],
            history_offset: 0,
        }
    }

    /// Process a block of samples, returning every symbol detected inside it.
    pub fn process_audio(&mut self, samples: &[i16]) -> Vec<Symbol> {
        let mut symbols = Vec::with_capacity(samples.len() / DFT_SIZE + 1);
        for &sample in samples {
            if let Some(sym) = self.process_sample(sample) {
                symbols.push(sym);
            }
        }
        symbols
    }

    /// Process a single sample.
    ///
    /// Returns a symbol only when this sample completes a 64-sample block
    /// and a tone was detected in it.
    pub fn process_sample(&mut self, sample: i16) -> Option<Symbol> {
        let magnitudes = *self.estimator.push_sample(sample)?;

        self.mag_history[self.history_offset] = magnitudes;
        self.history_offset = (self.history_offset + 1) % SYMBOLS_PER_WORD;

        let value = detect_symbol(&magnitudes)?;
        let peak = peak_magnitude(&magnitudes);
        let noise = estimate_noise_floor(&magnitudes);
        let snr = compute_snr_db(peak, noise);
        let sample_index = self.estimator.sample_count() - 1;

        Some(Symbol::from_value(value, peak, snr, sample_index))
    }

    /// Most recent smoothed magnitude vector, for spectrum displays.
    pub fn magnitudes(&self) -> &[f32; DFT_SIZE] {
        self.estimator.magnitudes()
    }

    /// Magnitude vector recorded `age` symbol blocks ago (0 = newest),
    /// up to one word of history.
    pub fn magnitude_history(&self, age: usize) -> Option<&[f32; DFT_SIZE]> {
        if age >= SYMBOLS_PER_WORD {
            return None;
        }
        let idx = (self.history_offset + SYMBOLS_PER_WORD - 1 - age) % SYMBOLS_PER_WORD;
        Some(&self.mag_history[idx])
    }

    /// Clear all demodulator state.
    pub fn reset(&mut self) {
        self.estimator.reset();
        for vec in self.mag_history.iter_mut() {
            *vec = [0.0; DFT_SIZE];
        }
        self.history_offset = 0;
    }
}

impl Default for Demodulator {
    fn default() -> Self {
        Self::new()
    }
}
