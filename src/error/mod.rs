mod app;
mod config;
mod protocol;
mod transport;
mod validation;

#[cfg(test)]
mod test_support;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use protocol::{ProtocolError, WireValueField};
pub use transport::TransportError;
pub use validation::ValidationError;
