//! Master/worker wire protocol.
//!
//! Every frame is a 4-byte big-endian length prefix followed by a msgpack
//! body. The body is a positional `[type, data, node_id]` array; `data` is a
//! map (or nil) whose shape depends on `type`. Inbound payloads are decoded
//! once into [`InboundMessage`] here, so nothing downstream inspects raw maps.
mod codec;
mod io;
mod types;

#[cfg(test)]
mod tests;

pub use codec::{decode_inbound, encode_outbound};
pub use io::{
    FrameReader, FrameWriter, MAX_FRAME_BYTES, close_writer, frame_codec, read_frame, split_stream,
    write_frame,
};
pub use types::{HatchCompletePayload, HatchPlan, HatchRequest, InboundMessage, OutboundMessage, StatsPayload};
