#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(settings) = swarmer::fuzzing::apply_config_from_toml(input) {
            debug_assert!(!settings.node_id.is_empty());
            debug_assert!(!settings.stats_interval.is_zero());
        }
    }
});
