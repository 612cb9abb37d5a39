use std::collections::BTreeMap;

use rmpv::Value;

use crate::error::{AppError, AppResult, ProtocolError, WireValueField};
use crate::stats::{EntryReport, ErrorReport, Report};

use super::*;

fn encode_value(value: &Value) -> AppResult<Vec<u8>> {
    let mut body = Vec::new();
    rmpv::encode::write_value(&mut body, value)
        .map_err(|err| AppError::protocol(format!("Encode failed: {}", err)))?;
    Ok(body)
}

fn decode_value(body: &[u8]) -> AppResult<Value> {
    let mut cursor = body;
    rmpv::decode::read_value(&mut cursor)
        .map_err(|err| AppError::protocol(format!("Decode failed: {}", err)))
}

fn hatch_frame(num_clients: Value, hatch_rate: Value) -> AppResult<Vec<u8>> {
    encode_value(&Value::Array(vec![
        Value::from("hatch"),
        Value::Map(vec![
            (Value::from("num_clients"), num_clients),
            (Value::from("hatch_rate"), hatch_rate),
        ]),
        Value::from("master"),
    ]))
}

fn envelope_parts(body: &[u8]) -> AppResult<(String, Value, String)> {
    let value = decode_value(body)?;
    let Value::Array(fields) = value else {
        return Err(AppError::protocol(format!(
            "Expected array envelope, got {}",
            value
        )));
    };
    let [message_type, data, node_id] = <[Value; 3]>::try_from(fields)
        .map_err(|fields| AppError::protocol(format!("Expected 3 fields, got {}", fields.len())))?;
    let message_type = message_type
        .as_str()
        .ok_or_else(|| AppError::protocol("Expected string type"))?
        .to_owned();
    let node_id = node_id
        .as_str()
        .ok_or_else(|| AppError::protocol("Expected string node id"))?
        .to_owned();
    Ok((message_type, data, node_id))
}

fn map_get<'map>(map: &'map Value, key: &str) -> Option<&'map Value> {
    map.as_map()?
        .iter()
        .find(|(entry_key, _)| entry_key.as_str() == Some(key))
        .map(|(_, value)| value)
}

#[test]
fn decode_hatch_accepts_float_signed_and_unsigned() -> AppResult<()> {
    let frames = [
        hatch_frame(Value::F64(5.0), Value::F64(2.0))?,
        hatch_frame(Value::from(5_i64), Value::from(2_i64))?,
        hatch_frame(Value::from(5_u64), Value::from(2_u64))?,
        hatch_frame(Value::F32(5.9), Value::from(2_u8))?,
    ];
    for frame in frames {
        let message = decode_inbound(&frame)?;
        if message != InboundMessage::Hatch(HatchRequest::new(5, 2)) {
            return Err(AppError::protocol(format!("Unexpected message: {:?}", message)));
        }
    }
    Ok(())
}

#[test]
fn decode_hatch_keeps_non_positive_values_for_validation() -> AppResult<()> {
    let frame = hatch_frame(Value::from(0), Value::from(-3))?;
    let message = decode_inbound(&frame)?;
    let InboundMessage::Hatch(request) = message else {
        return Err(AppError::protocol(format!("Unexpected message: {:?}", message)));
    };
    if request.plan().is_some() {
        return Err(AppError::protocol("Expected no plan for invalid hatch"));
    }
    if HatchRequest::new(5, 0).plan().is_some() {
        return Err(AppError::protocol("Expected no plan for zero hatch rate"));
    }
    Ok(())
}

#[test]
fn decode_hatch_rejects_non_numeric_field() -> AppResult<()> {
    let frame = hatch_frame(Value::from("five"), Value::from(1))?;
    let result = decode_inbound(&frame);
    if !matches!(
        &result,
        Err(ProtocolError::NonNumericField {
            field: WireValueField::NumClients,
            found,
        }) if found == "string"
    ) {
        return Err(AppError::protocol(format!("Unexpected result: {:?}", result)));
    }
    Ok(())
}

#[test]
fn decode_hatch_rejects_missing_field() -> AppResult<()> {
    let frame = encode_value(&Value::Array(vec![
        Value::from("hatch"),
        Value::Map(vec![(Value::from("num_clients"), Value::from(3))]),
        Value::from("master"),
    ]))?;
    let result = decode_inbound(&frame);
    if !matches!(
        result,
        Err(ProtocolError::MissingField {
            field: WireValueField::HatchRate,
        })
    ) {
        return Err(AppError::protocol(format!("Unexpected result: {:?}", result)));
    }
    Ok(())
}

#[test]
fn decode_stop_and_quit_ignore_data() -> AppResult<()> {
    for (name, expected) in [("stop", InboundMessage::Stop), ("quit", InboundMessage::Quit)] {
        for data in [Value::Nil, Value::Map(Vec::new())] {
            let frame = encode_value(&Value::Array(vec![
                Value::from(name),
                data,
                Value::from("master"),
            ]))?;
            let message = decode_inbound(&frame)?;
            if message != expected {
                return Err(AppError::protocol(format!("Unexpected message: {:?}", message)));
            }
        }
    }
    Ok(())
}

#[test]
fn decode_rejects_unknown_type_and_garbage() -> AppResult<()> {
    let frame = encode_value(&Value::Array(vec![
        Value::from("spawn"),
        Value::Nil,
        Value::from("master"),
    ]))?;
    let result = decode_inbound(&frame);
    if !matches!(
        &result,
        Err(ProtocolError::UnknownMessageType { message_type }) if message_type == "spawn"
    ) {
        return Err(AppError::protocol(format!("Unexpected result: {:?}", result)));
    }
    if decode_inbound(&[0xc1, 0x00]).is_ok() {
        return Err(AppError::protocol("Expected garbage to be rejected"));
    }
    Ok(())
}

#[test]
fn encode_control_messages_as_positional_envelope() -> AppResult<()> {
    let messages = [
        OutboundMessage::ClientReady,
        OutboundMessage::Hatching,
        OutboundMessage::ClientStopped,
        OutboundMessage::Quit,
    ];
    for message in messages {
        let body = encode_outbound(&message, "host_abc")?;
        let (message_type, data, node_id) = envelope_parts(&body)?;
        if message_type != message.message_type() {
            return Err(AppError::protocol(format!("Unexpected type: {}", message_type)));
        }
        if !data.is_nil() {
            return Err(AppError::protocol(format!("Expected nil data, got {}", data)));
        }
        if node_id != "host_abc" {
            return Err(AppError::protocol(format!("Unexpected node id: {}", node_id)));
        }
    }
    Ok(())
}

#[test]
fn encode_hatch_complete_carries_count() -> AppResult<()> {
    let message = OutboundMessage::HatchComplete(HatchCompletePayload { count: 5 });
    let body = encode_outbound(&message, "node")?;
    let (message_type, data, _) = envelope_parts(&body)?;
    if message_type != "hatch_complete" {
        return Err(AppError::protocol(format!("Unexpected type: {}", message_type)));
    }
    if map_get(&data, "count").and_then(Value::as_u64) != Some(5) {
        return Err(AppError::protocol(format!("Unexpected data: {}", data)));
    }
    Ok(())
}

#[test]
fn encode_stats_uses_master_field_names() -> AppResult<()> {
    let entry = EntryReport {
        name: "foo".to_owned(),
        method: "http".to_owned(),
        last_request_timestamp: 1_700_000_001,
        start_time: 1_700_000_000,
        num_requests: 2,
        num_failures: 0,
        total_response_time: 300,
        max_response_time: 150,
        min_response_time: 150,
        total_content_length: 20,
        response_times: BTreeMap::from([(150, 2)]),
        num_reqs_per_sec: BTreeMap::from([(1_700_000_001, 2)]),
    };
    let report = Report {
        stats: vec![entry.clone()],
        stats_total: EntryReport {
            name: "Total".to_owned(),
            method: String::new(),
            ..entry
        },
        errors: BTreeMap::from([(
            "abc".to_owned(),
            ErrorReport {
                method: "udp".to_owned(),
                name: "bar".to_owned(),
                error: "udp error".to_owned(),
                occurrences: 3,
            },
        )]),
    };
    let message = OutboundMessage::Stats(Box::new(StatsPayload::from_report(report, 7)));
    let body = encode_outbound(&message, "node")?;
    let (message_type, data, _) = envelope_parts(&body)?;
    if message_type != "stats" {
        return Err(AppError::protocol(format!("Unexpected type: {}", message_type)));
    }
    if map_get(&data, "user_count").and_then(Value::as_u64) != Some(7) {
        return Err(AppError::protocol("Expected user_count 7"));
    }

    let stats = map_get(&data, "stats")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::protocol("Expected stats array"))?;
    let first = stats
        .first()
        .ok_or_else(|| AppError::protocol("Expected one stats entry"))?;
    let histogram = map_get(first, "response_times")
        .and_then(Value::as_map)
        .ok_or_else(|| AppError::protocol("Expected response_times map"))?;
    let (bucket, count) = histogram
        .first()
        .ok_or_else(|| AppError::protocol("Expected one bucket"))?;
    if bucket.as_u64() != Some(150) || count.as_u64() != Some(2) {
        return Err(AppError::protocol(format!(
            "Expected integer bucket 150 -> 2, got {} -> {}",
            bucket, count
        )));
    }

    let total_name = map_get(&data, "stats_total")
        .and_then(|total| map_get(total, "name"))
        .and_then(Value::as_str);
    if total_name != Some("Total") {
        return Err(AppError::protocol("Expected stats_total named Total"));
    }
    let occurrences = map_get(&data, "errors")
        .and_then(|errors| map_get(errors, "abc"))
        .and_then(|error| map_get(error, "occurences"))
        .and_then(Value::as_u64);
    if occurrences != Some(3) {
        return Err(AppError::protocol("Expected occurences 3"));
    }
    Ok(())
}

#[test]
fn frame_codec_uses_big_endian_length_prefix() -> AppResult<()> {
    use bytes::BytesMut;
    use tokio_util::codec::{Decoder, Encoder};

    let mut codec = frame_codec();
    let mut buffer = BytesMut::new();
    codec
        .encode(bytes::Bytes::from_static(b"abc"), &mut buffer)
        .map_err(|err| AppError::protocol(format!("Encode failed: {}", err)))?;
    if buffer.as_ref() != [0, 0, 0, 3, b'a', b'b', b'c'] {
        return Err(AppError::protocol(format!("Unexpected frame: {:?}", buffer)));
    }
    let decoded = codec
        .decode(&mut buffer)
        .map_err(|err| AppError::protocol(format!("Decode failed: {}", err)))?
        .ok_or_else(|| AppError::protocol("Expected a complete frame"))?;
    if decoded.as_ref() != b"abc".as_slice() {
        return Err(AppError::protocol(format!("Unexpected body: {:?}", decoded)));
    }
    Ok(())
}

#[test]
fn frame_codec_rejects_oversized_length() -> AppResult<()> {
    use bytes::BytesMut;
    use tokio_util::codec::Decoder;

    let mut codec = frame_codec();
    let oversized = u32::try_from(MAX_FRAME_BYTES)
        .map_err(|err| AppError::protocol(format!("Bad constant: {}", err)))?
        .saturating_add(1);
    let mut buffer = BytesMut::from(oversized.to_be_bytes().as_slice());
    if codec.decode(&mut buffer).is_ok() {
        return Err(AppError::protocol("Expected oversized frame to be rejected"));
    }
    Ok(())
}

#[test]
fn closed_writer_flushes_then_ends_stream() -> AppResult<()> {
    use crate::error::TransportError;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::{Duration, timeout};

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::protocol(format!("Failed to build runtime: {}", err)))?;
    runtime.block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (connected, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        let (_worker_reader, mut worker_writer) = split_stream(connected?);
        let (mut master_reader, _master_writer) = split_stream(accepted?.0);

        write_frame(&mut worker_writer, b"bye".to_vec()).await?;
        close_writer(&mut worker_writer).await?;

        let frame = timeout(Duration::from_secs(1), read_frame(&mut master_reader))
            .await
            .map_err(|err| AppError::protocol(format!("Timed out reading frame: {}", err)))??;
        if frame.as_ref() != b"bye".as_slice() {
            return Err(AppError::protocol(format!("Unexpected body: {:?}", frame)));
        }
        let end = timeout(Duration::from_secs(1), read_frame(&mut master_reader))
            .await
            .map_err(|err| AppError::protocol(format!("Timed out waiting for EOF: {}", err)))?;
        if !matches!(
            end,
            Err(AppError::Transport(TransportError::ConnectionClosed))
        ) {
            return Err(AppError::protocol(format!("Expected end of stream, got {:?}", end)));
        }
        Ok(())
    })
}
