#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmer::stats::round_response_time;

fuzz_target!(|value: u64| {
    let rounded = round_response_time(value);
    if value < 100 {
        debug_assert_eq!(rounded, value);
    }
    debug_assert_eq!(round_response_time(rounded), rounded);
});
