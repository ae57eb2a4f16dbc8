//! Extended Golay (24,12) Encoder/Decoder
//!
//! Table-driven implementation of the extended binary Golay code used by
//! MIL-STD-188-141B. Twelve information bits map to a 24-bit codeword laid
//! out as `[info (12) | parity (12)]`; minimum distance 8, so any error
//! pattern of weight ≤ 3 is correctable.
//!
//! Two 4096-entry tables are built once per process and shared by every
//! caller: the encode table (info → 12 parity bits, derived from the
//! (23,12) generator polynomial `x^11 + x^9 + x^7 + x^6 + x^5 + x + 1` plus
//! an overall even-parity bit) and the syndrome table (12-bit syndrome →
//! 24-bit error pattern, filled by enumerating every 1-, 2-, and 3-bit
//! error pattern). The syndrome of a received word is its parity field
//! XORed with the parity recomputed from its info field.
//!
//! ## Example
//!
//! ```rust
//! use hfale_core::golay;
//!
//! let codeword = golay::encode(0xABC);
//! // Flip three bits; the decoder recovers the data and counts them.
//! let corrupted = codeword ^ 0b1000_0000_0100_0000_0000_0001;
//! assert_eq!(golay::decode(corrupted), Some((0xABC, 3)));
//! ```

use std::sync::OnceLock;

/// Generator polynomial of the (23,12) Golay code:
/// `x^11 + x^9 + x^7 + x^6 + x^5 + x + 1`.
const GOLAY_POLY: u32 = 0xAE3;

/// Sentinel marking an unfilled syndrome slot.
const NO_PATTERN: u32 = u32::MAX;

static ENCODE_TABLE: OnceLock<[u16; 4096]> = OnceLock::new();
static SYNDROME_TABLE: OnceLock<Box<[u32; 4096]>> = OnceLock::new();

/// 11-bit remainder of `info(x)·x^11` modulo the generator polynomial.
fn poly_remainder(info: u32) -> u32 {
    let mut rem = (info & 0xFFF) << 11;
    for i in (0..12).rev() {
        if rem & (1 << (i + 11)) != 0 {
            rem ^= GOLAY_POLY << i;
        }
    }
    rem & 0x7FF
}

/// The 12 parity bits for a 12-bit info word: the polynomial remainder in
/// the upper 11 bits plus an overall even-parity bit in bit 0.
fn parity_bits(info: u16) -> u16 {
    let rem = poly_remainder(info as u32) as u16;
    let overall = ((info as u32).count_ones() + (rem as u32).count_ones()) & 1;
    (rem << 1) | overall as u16
}

fn encode_table() -> &'static [u16; 4096] {
    ENCODE_TABLE.get_or_init(|| {
        let mut table = [0u16; 4096];
        for (info, entry) in table.iter_mut().enumerate() {
            *entry = parity_bits(info as u16);
        }
        table
    })
}

fn syndrome_table() -> &'static [u32; 4096] {
    let table = SYNDROME_TABLE.get_or_init(|| {
        let mut table = Box::new([NO_PATTERN; 4096]);
        table[0] = 0;

        let mut insert = |pattern: u32| {
            let syn = syndrome(pattern) as usize;
            if table[syn] == NO_PATTERN {
                table[syn] = pattern;
            }
        };

        for a in 0..24 {
            insert(1 << a);
        }
        for a in 0..24u32 {
            for b in (a + 1)..24 {
                insert((1 << a) | (1 << b));
            }
        }
        for a in 0..24u32 {
            for b in (a + 1)..24 {
                for c in (b + 1)..24 {
                    insert((1 << a) | (1 << b) | (1 << c));
                }
            }
        }
        table
    });
    table
}

/// Encode a 12-bit info word into a 24-bit codeword `[info | parity]`.
pub fn encode(info: u16) -> u32 {
    let info = info & 0xFFF;
    ((info as u32) << 12) | encode_table()[info as usize] as u32
}

/// 12-bit syndrome of a received 24-bit word. Zero means a valid codeword.
pub fn syndrome(codeword: u32) -> u16 {
    let info = ((codeword >> 12) & 0xFFF) as usize;
    let received_parity = (codeword & 0xFFF) as u16;
    received_parity ^ encode_table()[info]
}

/// Decode a 24-bit codeword, correcting up to 3 bit errors.
///
/// Returns the 12 info bits and the number of bits corrected, or `None`
/// when the error pattern is uncorrectable.
pub fn decode(codeword: u32) -> Option<(u16, u8)> {
    let codeword = codeword & 0xFF_FFFF;
    let syn = syndrome(codeword);
    if syn == 0 {
        return Some((extract_info(codeword), 0));
    }

    let pattern = syndrome_table()[syn as usize];
    if pattern == NO_PATTERN {
        return None;
    }

    let corrected = codeword ^ pattern;
    Some((extract_info(corrected), pattern.count_ones() as u8))
}

/// The info field of a codeword, without error correction.
pub fn extract_info(codeword: u32) -> u16 {
    ((codeword >> 12) & 0xFFF) as u16
}

/// The parity field of a codeword.
pub fn extract_parity(codeword: u32) -> u16 {
    (codeword & 0xFFF) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_all_info_words() {
        for info in 0u16..4096 {
            let cw = encode(info);
            assert!(cw < (1 << 24));
            assert_eq!(decode(cw), Some((info, 0)), "info {info:#05x}");
        }
    }

    #[test]
    fn valid_codewords_have_zero_syndrome() {
        for info in (0u16..4096).step_by(37) {
            assert_eq!(syndrome(encode(info)), 0);
        }
    }

    #[test]
    fn corrects_every_single_bit_error() {
        let cw = encode(0x5A5);
        for bit in 0..24 {
            assert_eq!(decode(cw ^ (1 << bit)), Some((0x5A5, 1)), "bit {bit}");
        }
    }

    #[test]
    fn corrects_every_double_bit_error() {
        let cw = encode(0x0F3);
        for a in 0..24u32 {
            for b in (a + 1)..24 {
                let corrupted = cw ^ (1 << a) ^ (1 << b);
                assert_eq!(decode(corrupted), Some((0x0F3, 2)), "bits {a},{b}");
            }
        }
    }

    #[test]
    fn corrects_every_triple_bit_error() {
        let cw = encode(0xC3C);
        for a in 0..24u32 {
            for b in (a + 1)..24 {
                for c in (b + 1)..24 {
                    let corrupted = cw ^ (1 << a) ^ (1 << b) ^ (1 << c);
                    assert_eq!(decode(corrupted), Some((0xC3C, 3)), "bits {a},{b},{c}");
                }
            }
        }
    }

    #[test]
    fn four_bit_errors_never_decode_silently_correct() {
        // Weight-4 patterns either fail or miscorrect; they must not come
        // back as the original data with a small error count.
        let cw = encode(0xF0F);
        let patterns = [
            (0u32, 5u32, 10u32, 15u32),
            (1, 2, 3, 4),
            (0, 11, 12, 23),
            (7, 9, 17, 21),
        ];
        for (a, b, c, d) in patterns {
            let corrupted = cw ^ (1 << a) ^ (1 << b) ^ (1 << c) ^ (1 << d);
            match decode(corrupted) {
                None => {}
                Some((info, _)) => assert_ne!(info, 0xF0F),
            }
        }
    }

    #[test]
    fn field_extraction() {
        let cw = encode(0x123);
        assert_eq!(extract_info(cw), 0x123);
        assert_eq!(extract_parity(cw), encode_table()[0x123]);
    }

    #[test]
    fn all_zero_info_is_all_zero_codeword() {
        assert_eq!(encode(0), 0);
        assert_eq!(decode(0), Some((0, 0)));
    }

    #[test]
    fn min_distance_at_least_eight_spot_check() {
        // Nonzero codewords sampled across the space all have weight >= 8.
        for info in (1u16..4096).step_by(13) {
            let w = encode(info).count_ones();
            assert!(w >= 8, "info {info:#05x} weight {w}");
        }
    }
}
