use rmpv::Value;
use serde::Serialize;

use crate::error::{ProtocolError, WireValueField};

use super::types::{HatchRequest, InboundMessage, OutboundMessage};

/// Serializes an outbound message into a frame body.
///
/// The envelope is positional (`[type, data, node_id]`) while payload structs
/// keep their field names, which is the shape the master decodes.
///
/// # Errors
///
/// Returns an error when msgpack encoding fails.
pub fn encode_outbound(message: &OutboundMessage, node_id: &str) -> Result<Vec<u8>, ProtocolError> {
    let message_type = message.message_type();
    match message {
        OutboundMessage::HatchComplete(payload) => {
            encode_envelope(message_type, Some(payload), node_id)
        }
        OutboundMessage::Stats(payload) => {
            encode_envelope(message_type, Some(payload.as_ref()), node_id)
        }
        OutboundMessage::ClientReady
        | OutboundMessage::Hatching
        | OutboundMessage::ClientStopped
        | OutboundMessage::Quit => encode_envelope::<()>(message_type, None, node_id),
    }
}

fn encode_envelope<TData>(
    message_type: &str,
    data: Option<&TData>,
    node_id: &str,
) -> Result<Vec<u8>, ProtocolError>
where
    TData: Serialize,
{
    rmp_serde::to_vec_named(&(message_type, data, node_id)).map_err(|err| {
        ProtocolError::Serialize {
            context: "outbound message",
            source: err,
        }
    })
}

/// Decodes a frame body received from the master.
///
/// # Errors
///
/// Returns an error when the body is not a valid envelope, the message type
/// is unknown, or a hatch field is missing or not numeric.
pub fn decode_inbound(body: &[u8]) -> Result<InboundMessage, ProtocolError> {
    let (message_type, data, _node_id): (String, Option<Value>, Value) =
        rmp_serde::from_slice(body).map_err(|err| ProtocolError::Deserialize {
            context: "inbound message",
            source: err,
        })?;

    match message_type.as_str() {
        "hatch" => {
            let data = data
                .as_ref()
                .filter(|value| value.is_map())
                .ok_or(ProtocolError::MissingData {
                    message_type: "hatch",
                })?;
            let num_clients = numeric_field(data, WireValueField::NumClients)?;
            let hatch_rate = numeric_field(data, WireValueField::HatchRate)?;
            Ok(InboundMessage::Hatch(HatchRequest::new(
                num_clients,
                hatch_rate,
            )))
        }
        "stop" => Ok(InboundMessage::Stop),
        "quit" => Ok(InboundMessage::Quit),
        _ => Err(ProtocolError::UnknownMessageType { message_type }),
    }
}

const fn field_key(field: WireValueField) -> &'static str {
    match field {
        WireValueField::NumClients => "num_clients",
        WireValueField::HatchRate => "hatch_rate",
    }
}

// Masters encode counts as floats, signed or unsigned integers depending on
// their runtime; all three are accepted and floats truncate toward zero.
fn numeric_field(data: &Value, field: WireValueField) -> Result<i64, ProtocolError> {
    let key = field_key(field);
    let value = data
        .as_map()
        .and_then(|entries| {
            entries
                .iter()
                .find(|(entry_key, _)| entry_key.as_str() == Some(key))
        })
        .map(|(_, value)| value)
        .ok_or(ProtocolError::MissingField { field })?;

    match value {
        Value::Integer(int) => int
            .as_i64()
            .ok_or(ProtocolError::FieldOutOfRange { field }),
        Value::F64(float) => Ok(*float as i64),
        Value::F32(float) => Ok(*float as i64),
        Value::Nil
        | Value::Boolean(_)
        | Value::String(_)
        | Value::Binary(_)
        | Value::Array(_)
        | Value::Map(_)
        | Value::Ext(_, _) => Err(ProtocolError::NonNumericField {
            field,
            found: value_kind(value).to_owned(),
        }),
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "boolean",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(_, _) => "ext",
    }
}
