use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection error to {addr}: {source}")]
    Connection {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Master connection closed.")]
    ConnectionClosed,
    #[error("Outbound channel closed.")]
    OutboundChannelClosed,
    #[error("Inbound channel closed.")]
    InboundChannelClosed,
    #[error("Frame exceeded max size ({max_bytes} bytes).")]
    FrameTooLarge { max_bytes: usize },
    #[error("Writer stopped before confirming disconnect.")]
    DisconnectUnconfirmed,
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
