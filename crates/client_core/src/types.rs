use std::str::FromStr;

use shared::domain::{AccountId, ServerId, SessionId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountContext {
    pub id: AccountId,
    pub login: String,
}

impl AccountContext {
    pub fn new(id: AccountId, login: impl Into<String>) -> Self {
        Self {
            id,
            login: login.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerContext {
    pub id: ServerId,
    pub name: String,
}

impl ServerContext {
    pub fn new(id: ServerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub session: SessionId,
    pub server: ServerId,
    pub server_name: String,
    pub account: AccountId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Server confirmed the command and the display was updated.
    Confirmed,
    /// Declared, transport or decode failure; prior state left intact.
    Failed,
    /// Confirmed, but a newer command for the same entity was already applied.
    Discarded,
    /// Not sent: another command for the same entity is still in flight.
    Rejected,
}

/// Which response may update an entity's display when several commands for
/// it overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Any completing response updates the display; the last one to arrive
    /// wins even if it was issued first.
    LastCompleted,
    /// Only the response to the most recently issued command is applied.
    #[default]
    LatestIssued,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InFlightPolicy {
    #[default]
    Allow,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsoleOptions {
    pub ordering: ResponseOrdering,
    pub in_flight: InFlightPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown policy: {0}")]
pub struct UnknownPolicy(pub String);

impl FromStr for ResponseOrdering {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "last-completed" => Ok(Self::LastCompleted),
            "latest-issued" => Ok(Self::LatestIssued),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}

impl FromStr for InFlightPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}
