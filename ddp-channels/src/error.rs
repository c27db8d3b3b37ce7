use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Value of `errorType` that marks a method result as an application error.
pub const METEOR_ERROR: &str = "Meteor.Error";

/// Invalid connection options.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Connection options must be an object, got {0}")]
    NotAnObject(&'static str),
    #[error("Please pass an endpoint")]
    MissingEndpoint,
    #[error("Endpoint must be a string, got {0}")]
    InvalidEndpoint(&'static str),
    #[error("Malformed connection options: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Errors returned by [`Connection`](crate::Connection) operations.
///
/// `E` is the error type of the underlying client.
#[derive(Error, Debug)]
pub enum Error<E> {
    /// The operation needs a client, but [`start`](crate::Connection::start)
    /// hasn't been called yet.
    #[error("DDP client is not started")]
    NotInitialized,
    /// The client failed the operation.
    #[error("Transport error: {0}")]
    Transport(#[source] E),
    /// The remote method succeeded at the transport level, but its result is
    /// an application error.
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

/// A method result carrying `errorType: "Meteor.Error"`.
///
/// Holds the result object exactly as the client returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationError(Value);

impl ApplicationError {
    /// Whether `value` is an object marked as an application error.
    pub fn is_marked(value: &Value) -> bool {
        value.get("errorType").and_then(Value::as_str) == Some(METEOR_ERROR)
    }

    /// Split a method result into a success value or an application error.
    pub fn check(value: Value) -> Result<Value, Self> {
        if Self::is_marked(&value) {
            Err(Self(value))
        } else {
            Ok(value)
        }
    }

    /// The error code, a string or a number.
    pub fn error(&self) -> Option<&Value> {
        self.0.get("error")
    }

    pub fn reason(&self) -> Option<&str> {
        self.0.get("reason").and_then(Value::as_str)
    }

    pub fn details(&self) -> Option<&Value> {
        self.0.get("details")
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Remote method failed")?;
        if let Some(error) = self.error() {
            write!(f, " [{error}]")?;
        }
        if let Some(reason) = self.reason() {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApplicationError {}
