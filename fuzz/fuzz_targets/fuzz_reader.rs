#![no_main]

use dftxml::prelude::*;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either produce events or a clean error;
    // the reader must NEVER panic.
    let mut reader = Reader::from_slice(data);
    reader.declare_array(|name, _| name == "v", ArrayKind::Float);
    reader.declare_array(|name, _| name == "n", ArrayKind::Int);
    reader.declare_text(|name, _| name == "i");

    loop {
        match reader.next_event() {
            Ok(Some(Event::Text(text))) => {
                // Scalar conversion must also fail gracefully.
                let _ = text.as_int();
                let _ = text.as_float();
            }
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(_) => break,
        }
    }
});
