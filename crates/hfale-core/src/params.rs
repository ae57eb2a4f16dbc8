//! Physical-layer constants for the MIL-STD-188-141B 8-FSK waveform
//!
//! The 2G ALE waveform places eight tones 125 Hz apart in the 300–3000 Hz
//! SSB voice passband and keys them at 125 baud. At an 8 kHz sample rate
//! every symbol is exactly 64 samples, which also makes a 64-point DFT
//! window line up with symbol boundaries: each tone lands in its own
//! 125 Hz bin (bins 6 through 13 for 750 through 1625 Hz).

/// Audio sample rate in Hz.
pub const SAMPLE_RATE_HZ: u32 = 8000;

/// Symbol rate in baud.
pub const SYMBOL_RATE_BAUD: u32 = 125;

/// Samples per 8-FSK symbol (8000 / 125).
pub const SAMPLES_PER_SYMBOL: usize = (SAMPLE_RATE_HZ / SYMBOL_RATE_BAUD) as usize;

/// Number of FSK tones.
pub const NUM_TONES: usize = 8;

/// Bits carried by one symbol.
pub const BITS_PER_SYMBOL: u32 = 3;

/// Tone center frequencies in Hz, lowest first.
pub const TONE_FREQS_HZ: [u32; NUM_TONES] = [750, 875, 1000, 1125, 1250, 1375, 1500, 1625];

/// Spacing between adjacent tones in Hz.
pub const TONE_SPACING_HZ: u32 = 125;

/// DFT length; equals one symbol period so the bin width matches the tone spacing.
pub const DFT_SIZE: usize = 64;

/// First DFT bin that carries an ALE tone (750 Hz / 125 Hz).
pub const TONE_BIN_FIRST: usize = 6;

/// Last DFT bin that carries an ALE tone (1625 Hz / 125 Hz).
pub const TONE_BIN_LAST: usize = 13;

/// Symbols per transmitted ALE word (each 24-bit word is sent three times
/// through 147 symbols; 49 symbols per redundant copy).
pub const SYMBOLS_PER_WORD: usize = 49;

/// Redundant copies of every data bit on the air.
pub const WORD_REDUNDANCY: usize = 3;

/// Symbols covering one triple-redundant word (147).
pub const SYMBOLS_PER_REDUNDANT_WORD: usize = SYMBOLS_PER_WORD * WORD_REDUNDANCY;

/// Preamble bits per word.
pub const PREAMBLE_BITS: u32 = 3;

/// Payload bits per word (three 7-bit characters).
pub const PAYLOAD_BITS: u32 = 21;

/// Total data bits per word.
pub const WORD_BITS: u32 = PREAMBLE_BITS + PAYLOAD_BITS;

/// On-air duration of one word in milliseconds (49 symbols at 8 ms each).
pub const WORD_DURATION_MS: u64 = (SYMBOLS_PER_WORD as u64 * 1000 * SAMPLES_PER_SYMBOL as u64)
    / SAMPLE_RATE_HZ as u64;

/// On-air duration of one symbol in milliseconds.
pub const SYMBOL_DURATION_MS: u64 = 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_and_word_timing() {
        assert_eq!(SAMPLES_PER_SYMBOL, 64);
        assert_eq!(SYMBOL_DURATION_MS, 8);
        assert_eq!(WORD_DURATION_MS, 392);
        assert_eq!(SYMBOLS_PER_REDUNDANT_WORD, 147);
    }

    #[test]
    fn tones_fall_on_distinct_bins() {
        let bin_width = SAMPLE_RATE_HZ as usize / DFT_SIZE;
        assert_eq!(bin_width, TONE_SPACING_HZ as usize);
        for (i, &freq) in TONE_FREQS_HZ.iter().enumerate() {
            assert_eq!(freq as usize / bin_width, TONE_BIN_FIRST + i);
        }
    }
}
