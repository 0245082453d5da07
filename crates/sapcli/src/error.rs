use std::fmt;

use thiserror::Error;

use crate::rfc::bapi::BapiError;

/// High-level error type shared across sapcli components.
#[derive(Debug, Error)]
pub enum SapcliError {
    #[error("rfc error: {0}")]
    Rfc(String),
    #[error(transparent)]
    Bapi(#[from] BapiError),
    #[error("input error: {0}")]
    Input(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for SapcliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl SapcliError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            SapcliError::Rfc(msg) => SapcliError::Rfc(format!("{ctx}: {msg}")),
            SapcliError::Input(msg) => SapcliError::Input(format!("{ctx}: {msg}")),
            SapcliError::Config(msg) => SapcliError::Config(format!("{ctx}: {msg}")),
            SapcliError::Serialization(msg) => {
                SapcliError::Serialization(format!("{ctx}: {msg}"))
            }
            SapcliError::Bapi(err) => SapcliError::Bapi(err),
            SapcliError::Io(err) => SapcliError::Io(err),
        }
    }
}
