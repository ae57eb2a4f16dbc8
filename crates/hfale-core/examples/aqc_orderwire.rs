//! AQC-ALE data elements, orderwire CRC, and slotted responses
//!
//! Run with: cargo run --example aqc_orderwire -p hfale-core

use hfale_core::aqc::{
    assign_slot, build_orderwire_words, extract_data_elements, parse_orderwire, slot_time_ms,
    validate_orderwire_crc16, orderwire_crc16,
};

fn main() {
    println!("AQC-ALE protocol extensions demo\n");

    // 1. Data element extraction from a 21-bit payload.
    let payload = 3 | (9 << 3) | (25 << 7) | (2 << 12);
    let de = extract_data_elements(payload);
    println!("payload {payload:#07x}:");
    println!("  slot (DE2):        {}", de.de2_slot);
    println!("  traffic (DE3):     {}", de.de3_traffic.name());
    println!("  LQA (DE4):         {}", de.de4_lqa);
    println!("  transaction (DE9): {}", de.de9_transaction.name());

    // 2. Orderwire message with CRC-16 protection.
    let text = "QSL DE W1AW";
    let words = build_orderwire_words(text, 1000).expect("valid orderwire text");
    println!("\norderwire {text:?} -> {} words", words.len());
    let parsed = parse_orderwire(&words).expect("parses back");
    println!("  parsed:  {:?}", parsed.message);
    println!("  crc:     {:?} ({:#06x})", parsed.crc_status, parsed.carried_crc);

    // The same CRC on a raw byte frame.
    let mut framed = text.as_bytes().to_vec();
    framed.extend_from_slice(&orderwire_crc16(text.as_bytes()).to_be_bytes());
    println!("  frame validates: {}", validate_orderwire_crc16(&framed));
    framed[0] ^= 0x01;
    println!("  corrupted frame validates: {}", validate_orderwire_crc16(&framed));

    // 3. Slotted responses spread stations over the 8 x 200 ms grid.
    println!("\nslot assignments from a net call heard at t=5000 ms:");
    for station in ["W1AW", "K6KPH", "N0CALL", "VE3XYZ"] {
        let slot = assign_slot(station);
        println!(
            "  {station:>6} -> slot {slot}, responds at {} ms",
            slot_time_ms(slot, 5000)
        );
    }
}
