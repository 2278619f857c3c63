#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::flow::classifier::classify;

fuzz_target!(|data: &[u8]| {
    // Arbitrary frames must classify or fail cleanly, never panic.
    if let Ok(tuple) = classify(data) {
        let _ = tuple.to_string();
    }
});
