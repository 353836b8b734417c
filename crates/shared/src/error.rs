use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared failure returned by the command API (`ErrNo != 0`). The message
/// is human readable and is shown to the operator verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message} (err_no {err_no})")]
pub struct ApiError {
    pub err_no: i64,
    pub message: String,
}

impl ApiError {
    pub fn new(err_no: i64, message: impl Into<String>) -> Self {
        Self {
            err_no,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error(transparent)]
    Declared(#[from] ApiError),
    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),
}
