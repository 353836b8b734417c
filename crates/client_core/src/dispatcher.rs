use std::sync::Arc;

use serde::de::DeserializeOwned;
use shared::{
    error::{ApiError, ResponseError},
    protocol::{CommandEnvelope, Endpoint, ResponseEnvelope},
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::transport::{CommandTransport, TransportError};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no session token; sign in again")]
    MissingSessionToken,
    #[error(transparent)]
    Declared(#[from] ApiError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected payload from {endpoint}: {source}")]
    Decode {
        endpoint: Endpoint,
        source: serde_json::Error,
    },
}

impl DispatchError {
    /// Text shown in the notification region. Declared failures are shown
    /// verbatim; everything else collapses to a generic failure.
    pub fn operator_message(&self) -> String {
        match self {
            Self::Declared(err) => err.message.clone(),
            Self::MissingSessionToken => self.to_string(),
            Self::Transport(_) => {
                "Request failed; the console server could not be reached".to_string()
            }
            Self::Decode { .. } => {
                "Request failed; the server sent an unexpected response".to_string()
            }
        }
    }

    fn from_response(endpoint: Endpoint, err: ResponseError) -> Self {
        match err {
            ResponseError::Declared(err) => Self::Declared(err),
            ResponseError::Decode(source) => Self::Decode { endpoint, source },
        }
    }
}

pub struct CommandDispatcher {
    transport: Arc<dyn CommandTransport>,
    session_token: String,
}

impl CommandDispatcher {
    pub fn new(transport: Arc<dyn CommandTransport>, session_token: impl Into<String>) -> Self {
        Self {
            transport,
            session_token: session_token.into(),
        }
    }

    pub fn envelope(
        &self,
        target_id: i64,
        command: impl Into<String>,
        payload: impl Into<String>,
    ) -> CommandEnvelope {
        CommandEnvelope {
            session_token: self.session_token.clone(),
            target_id,
            command: command.into(),
            payload: payload.into(),
        }
    }

    /// Returns the raw response, including declared failures, so callers that
    /// treat `ErrNo != 0` as a signal (empty lists) can inspect it.
    pub async fn send(
        &self,
        endpoint: Endpoint,
        envelope: CommandEnvelope,
    ) -> Result<ResponseEnvelope, DispatchError> {
        if envelope.session_token.is_empty() {
            warn!(endpoint = %endpoint, "dispatch: refusing command without session token");
            return Err(DispatchError::MissingSessionToken);
        }

        debug!(
            endpoint = %endpoint,
            command = %envelope.command,
            target_id = envelope.target_id,
            "dispatch: sending command"
        );

        let response = self
            .transport
            .post(endpoint, &envelope)
            .await
            .map_err(|err| {
                warn!(
                    endpoint = %endpoint,
                    command = %envelope.command,
                    "dispatch: transport failure: {err}"
                );
                DispatchError::Transport(err)
            })?;

        if !response.is_success() {
            debug!(
                endpoint = %endpoint,
                command = %envelope.command,
                err_no = response.err_no,
                "dispatch: command refused"
            );
        }
        Ok(response)
    }

    pub async fn execute(
        &self,
        endpoint: Endpoint,
        envelope: CommandEnvelope,
    ) -> Result<(), DispatchError> {
        let response = self.send(endpoint, envelope).await?;
        response.check()?;
        Ok(())
    }

    pub async fn execute_decoded<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        envelope: CommandEnvelope,
    ) -> Result<T, DispatchError> {
        let response = self.send(endpoint, envelope).await?;
        decode_response(endpoint, &response)
    }
}

pub(crate) fn decode_response<T: DeserializeOwned>(
    endpoint: Endpoint,
    response: &ResponseEnvelope,
) -> Result<T, DispatchError> {
    response.decode().map_err(|err| {
        if let ResponseError::Decode(source) = &err {
            warn!(endpoint = %endpoint, "dispatch: malformed success payload: {source}");
        }
        DispatchError::from_response(endpoint, err)
    })
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
