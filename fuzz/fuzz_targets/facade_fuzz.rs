//! Fuzz test for the JSON facade
//!
//! Any JSON value, in either direction, must produce `Ok`: a result or the
//! empty fallback. Run with: cargo +nightly fuzz run facade_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use serde_json::Value;
use sievekit_translate::SieveTranslator;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(input) = serde_json::from_slice::<Value>(rest) else {
        return;
    };

    let translator = SieveTranslator::default();
    let version = match selector % 3 {
        0 => None,
        n => Some(n),
    };

    let tree = translator.to_tree(&input, version).expect("to_tree never fails");
    assert!(tree.is_array());

    let simple = translator.from_tree(&input).expect("from_tree never fails");
    assert!(simple.is_object());
});
