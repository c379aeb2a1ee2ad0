//! Fuzz test for the filter tree decompiler
//!
//! Feeds arbitrary JSON to the decompiler to find:
//! - Panics on malformed trees
//! - Internal errors where a recoverable one is expected
//! - Decompiled filters that do not compile again
//!
//! Run with: cargo +nightly fuzz run decompile_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use sievekit_core::{FilterTree, SimpleFilter, Version};
use sievekit_translate::{compile, decompile};

fuzz_target!(|data: &[u8]| {
    let Ok(tree) = serde_json::from_slice::<FilterTree>(data) else {
        return;
    };

    match decompile(&tree) {
        Ok(simple) => {
            // Compiling drops empty destinations and duplicate keys, so only
            // the second cycle has to be exact.
            let cycle = |filter: &SimpleFilter| {
                let tree = compile(filter, Version::V2).expect("decompiled filter compiles");
                decompile(&tree).expect("compiled tree decompiles")
            };
            let first = cycle(&simple);
            assert_eq!(cycle(&first), first, "round trip must settle after one cycle");
        }
        Err(err) => {
            assert!(err.is_recoverable(), "unexpected internal error: {}", err);
            assert!(!err.message().is_empty());
        }
    }
});
