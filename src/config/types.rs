use std::time::Duration;

use serde::Deserialize;

use crate::args::Transport;
use crate::args::parsers::parse_duration_arg;
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(alias = "host")]
    pub master_host: Option<String>,
    #[serde(alias = "port")]
    pub master_port: Option<u16>,
    pub max_rps: Option<u64>,
    #[serde(alias = "transport")]
    pub rpc: Option<Transport>,
    pub stats_interval: Option<DurationValue>,
    pub node_id: Option<String>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_arg(text),
        }
    }
}
