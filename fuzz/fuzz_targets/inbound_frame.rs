#![no_main]

use libfuzzer_sys::fuzz_target;
use swarmer::protocol::InboundMessage;

fuzz_target!(|data: &[u8]| {
    if let Ok((message, plan)) = swarmer::fuzzing::decode_inbound_input(data) {
        match message {
            InboundMessage::Hatch(request) => {
                if let Some(plan) = plan {
                    debug_assert!(request.num_clients > 0 && request.hatch_rate > 0);
                    debug_assert!(plan.num_clients > 0 && plan.hatch_rate > 0);
                }
            }
            InboundMessage::Stop | InboundMessage::Quit => debug_assert!(plan.is_none()),
        }
    }
});
