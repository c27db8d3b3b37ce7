//! Connection configuration.

use std::str::FromStr;

use ddp_channels_traits::ClientOptions;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigurationError;

/// Options a [`Connection`](crate::Connection) is created with.
///
/// Unknown keys are ignored when options are parsed from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionOptions {
    /// Websocket URL of the DDP server.
    pub endpoint: String,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl ConnectionOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Check an untyped options object. The only requirement is that
    /// `endpoint` is present and is a string.
    pub fn validate(options: &Value) -> Result<Self, ConfigurationError> {
        let Some(object) = options.as_object() else {
            return Err(ConfigurationError::NotAnObject(type_name(options)))
        };
        match object.get("endpoint") {
            Some(Value::String(endpoint)) => Ok(Self::new(endpoint.clone())),
            Some(other) => Err(ConfigurationError::InvalidEndpoint(type_name(other))),
            None => Err(ConfigurationError::MissingEndpoint),
        }
    }

    /// The options the underlying client is constructed with.
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::new(self.endpoint.clone())
    }
}

impl TryFrom<Value> for ConnectionOptions {
    type Error = ConfigurationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::validate(&value)
    }
}

impl FromStr for ConnectionOptions {
    type Err = ConfigurationError;

    /// Parse options from a JSON document.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value = serde_json::from_str(s)?;
        Self::validate(&value)
    }
}
