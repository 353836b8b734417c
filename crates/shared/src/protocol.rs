use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::{
    domain::{AccountId, ServerId, SessionId, StateTag},
    error::{ApiError, ResponseError},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListAccounts,
    ListServers,
    AccountHistory,
    ServerSessions,
    AccountSessions,
    SetAccountStatus,
    SetAccountAttr,
    SetServerStatus,
    SetServerAttr,
    SetSessionState,
    ResolveLogin,
    SetSessionOwner,
    ResetPassword,
}

impl Endpoint {
    pub fn route(self) -> &'static str {
        match self {
            Self::ListAccounts => "/list-user",
            Self::ListServers => "/list-server",
            Self::AccountHistory => "/get-user-list",
            Self::ServerSessions => "/get-server-list",
            Self::AccountSessions => "/get-user-sessions",
            Self::SetAccountStatus => "/set-user-status",
            Self::SetAccountAttr => "/set-user-attr",
            Self::SetServerStatus => "/set-server-status",
            Self::SetServerAttr => "/set-server-attr",
            Self::SetSessionState => "/set-user-session",
            Self::ResolveLogin => "/resolve-user",
            Self::SetSessionOwner => "/set-session-owner",
            Self::ResetPassword => "/reset-user-pw",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route())
    }
}

/// Outgoing request body. `target_id == 0` means "not applicable".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "Sid")]
    pub session_token: String,
    #[serde(rename = "Uid")]
    pub target_id: i64,
    #[serde(rename = "Cmd")]
    pub command: String,
    #[serde(rename = "Data")]
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "ErrNo")]
    pub err_no: i64,
    #[serde(rename = "Data", default)]
    pub data: String,
}

impl ResponseEnvelope {
    pub fn ok(data: impl Into<String>) -> Self {
        Self {
            err_no: 0,
            data: data.into(),
        }
    }

    pub fn declared(err_no: i64, message: impl Into<String>) -> Self {
        Self {
            err_no,
            data: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.err_no == 0
    }

    /// `data` holds the server message when the command was refused.
    pub fn check(&self) -> Result<(), ApiError> {
        if self.is_success() {
            Ok(())
        } else {
            Err(ApiError::new(self.err_no, self.data.clone()))
        }
    }

    /// Decodes the nested payload. Refused responses are never decoded.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ResponseError> {
        self.check()?;
        Ok(serde_json::from_str(&self.data)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListPage<T> {
    #[serde(rename = "Total")]
    pub total: u64,
    #[serde(rename = "Entry", default = "Vec::new", deserialize_with = "null_as_empty")]
    pub entries: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Some list rows carry identifiers as decimal strings.
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountRow {
    pub id: AccountId,
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub registered: String,
    pub admin: StateTag,
    pub status: StateTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerRow {
    pub id: ServerId,
    pub name: String,
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub tunnel: String,
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub descr: String,
    #[serde(default)]
    pub location: String,
    pub admin: StateTag,
    pub status: StateTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountSessionRow {
    pub id: SessionId,
    #[serde(deserialize_with = "lenient_i64")]
    pub server_id: i64,
    pub server_name: String,
    #[serde(default, rename = "Type")]
    pub kind: String,
    #[serde(default)]
    pub tun_src: String,
    #[serde(default)]
    pub tun_dst: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
    #[serde(default)]
    pub rt: String,
    pub status: StateTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSessionRow {
    pub id: SessionId,
    #[serde(deserialize_with = "lenient_i64")]
    pub uid: i64,
    #[serde(default)]
    pub tun_dst: String,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub dst: String,
    #[serde(default)]
    pub rt: String,
    pub status: StateTag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRow {
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "IP", default)]
    pub address: String,
    #[serde(rename = "Time")]
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionActivityRow {
    pub sid: String,
    pub uid: String,
    pub action: String,
    pub time: String,
}

/// Attribute change echo: the value as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueEcho {
    #[serde(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdEcho {
    #[serde(rename = "Id")]
    pub id: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEcho {
    #[serde(rename = "IP", default)]
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdEcho {
    #[serde(rename = "Sid")]
    pub session_id: SessionId,
}
