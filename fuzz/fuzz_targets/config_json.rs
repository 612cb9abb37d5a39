#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(settings) = swarmer::fuzzing::apply_config_from_json(data) {
        debug_assert!(!settings.node_id.is_empty());
        if let Some(max_rps) = settings.max_rps {
            debug_assert!(max_rps.get() > 0);
        }
    }
});
