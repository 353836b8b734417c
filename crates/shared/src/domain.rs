use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AccountId);
id_newtype!(ServerId);
id_newtype!(SessionId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Account,
    Server,
    Session,
}

impl EntityKind {
    /// Noun used by the command API (`enable-user`, `activate-session`, ...).
    pub fn command_noun(self) -> &'static str {
        match self {
            Self::Account => "user",
            Self::Server => "server",
            Self::Session => "session",
        }
    }

    pub fn display_noun(self) -> &'static str {
        match self {
            Self::Account => "User",
            Self::Server => "Server",
            Self::Session => "Session",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: i64,
}

impl EntityKey {
    pub fn account(id: AccountId) -> Self {
        Self {
            kind: EntityKind::Account,
            id: id.0,
        }
    }

    pub fn server(id: ServerId) -> Self {
        Self {
            kind: EntityKind::Server,
            id: id.0,
        }
    }

    pub fn session(id: SessionId) -> Self {
        Self {
            kind: EntityKind::Session,
            id: id.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Admin,
    Lifecycle,
}

/// Confirmed state of an entity on one axis. Each tag belongs to exactly one
/// axis and has exactly one inverse on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateTag {
    Enabled,
    Disabled,
    Active,
    Inactive,
}

impl StateTag {
    pub fn axis(self) -> Axis {
        match self {
            Self::Enabled | Self::Disabled => Axis::Admin,
            Self::Active | Self::Inactive => Axis::Lifecycle,
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Self::Enabled => Self::Disabled,
            Self::Disabled => Self::Enabled,
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, Self::Enabled | Self::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    /// Verb that moves an entity into this tag.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Enabled => "enable",
            Self::Disabled => "disable",
            Self::Active => "activate",
            Self::Inactive => "deactivate",
        }
    }

    /// Past participle used in operator notifications ("is now activated").
    pub fn participle(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::Active => "activated",
            Self::Inactive => "deactivated",
        }
    }
}

impl fmt::Display for StateTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown state tag: {0}")]
pub struct UnknownStateTag(pub String);

impl FromStr for StateTag {
    type Err = UnknownStateTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(UnknownStateTag(other.to_string())),
        }
    }
}

/// Free-text attributes editable through the `set-*-attr` routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Name,
    Alias,
    Descr,
    Location,
    Access,
    Tunnel,
    Url,
    TunSrc,
    PpPrefix,
    RtPrefix,
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Self::Name,
        Self::Alias,
        Self::Descr,
        Self::Location,
        Self::Access,
        Self::Tunnel,
        Self::Url,
        Self::TunSrc,
        Self::PpPrefix,
        Self::RtPrefix,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Alias => "alias",
            Self::Descr => "descr",
            Self::Location => "location",
            Self::Access => "access",
            Self::Tunnel => "tunnel",
            Self::Url => "url",
            Self::TunSrc => "tun-src",
            Self::PpPrefix => "pppfx",
            Self::RtPrefix => "rtpfx",
        }
    }

    pub fn applies_to(self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::Account => self == Self::Name,
            EntityKind::Server => self != Self::Name,
            EntityKind::Session => false,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown attribute: {0}")]
pub struct UnknownAttribute(pub String);

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|attr| attr.as_str() == wanted)
            .ok_or_else(|| UnknownAttribute(wanted.to_string()))
    }
}
