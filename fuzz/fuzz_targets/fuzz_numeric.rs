#![no_main]

use dftxml::numeric::{parse_float, parse_int};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // The conversion routines take raw byte spans straight out of the
    // input buffer, so they must never panic on any span.
    let _ = parse_int(data);

    // When the span is a well-formed literal the result must agree
    // with the standard library parser to within rounding.
    if let Ok(fast) = parse_float(data) {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(std) = text.parse::<f64>() {
                assert!(fast == std || (fast - std).abs() <= std.abs() * f64::EPSILON);
            }
        }
    }
});
