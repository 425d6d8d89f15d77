#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use voltage_mbap::{parse_bit_reply, parse_register_reply, ByteOrder};

#[derive(Debug, Arbitrary)]
struct Input {
    count: u16,
    little_endian: bool,
    reply: Vec<u8>,
}

// Decoding arbitrary replies must never panic, and successful decodes must
// return exactly the requested number of values.
fuzz_target!(|input: Input| {
    let order = if input.little_endian {
        ByteOrder::LittleEndian
    } else {
        ByteOrder::BigEndian
    };

    if let Ok(bits) = parse_bit_reply(&input.reply, input.count) {
        assert_eq!(bits.len(), input.count as usize);
    }
    if let Ok(words) = parse_register_reply(&input.reply, input.count, order) {
        assert_eq!(words.len(), input.count as usize);
    }
});
