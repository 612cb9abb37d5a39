use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireValueField {
    #[error("num_clients")]
    NumClients,
    #[error("hatch_rate")]
    HatchRate,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Serialization error during {context}: {source}")]
    Serialize {
        context: &'static str,
        #[source]
        source: rmp_serde::encode::Error,
    },
    #[error("Deserialization error during {context}: {source}")]
    Deserialize {
        context: &'static str,
        #[source]
        source: rmp_serde::decode::Error,
    },
    #[error("Unknown message type '{message_type}'.")]
    UnknownMessageType { message_type: String },
    #[error("Message '{message_type}' carries no data.")]
    MissingData { message_type: &'static str },
    #[error("Missing field {field}.")]
    MissingField { field: WireValueField },
    #[error("Field {field} must be numeric (got {found}).")]
    NonNumericField {
        field: WireValueField,
        found: String,
    },
    #[error("Field {field} is out of range.")]
    FieldOutOfRange { field: WireValueField },
    #[cfg(test)]
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[cfg(test)]
    #[error("Test expectation failed: {message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}
