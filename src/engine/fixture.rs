//! TOML description of the contacts and conversations served by the
//! in-memory engine.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    domain::{
        address::SipAddress,
        contact::{Contact, SecurityLevel},
        event_log::{ChatMessage, EventKind, EventLog, MessageId},
    },
    engine::contracts::Capabilities,
    infra::error::AppError,
};

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Fixture {
    #[serde(default)]
    pub contacts: Vec<FixtureContact>,
    #[serde(default)]
    pub conversations: Vec<FixtureConversation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureContact {
    pub name: Option<String>,
    pub addresses: Vec<SipAddress>,
    pub photo: Option<String>,
    #[serde(default)]
    pub security_level: SecurityLevel,
}

impl From<FixtureContact> for Contact {
    fn from(contact: FixtureContact) -> Self {
        Self {
            name: contact.name,
            addresses: contact.addresses,
            photo: contact.photo,
            security_level: contact.security_level,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FixtureConversationKind {
    #[default]
    Basic,
    OneToOne,
    Group,
}

impl FixtureConversationKind {
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Basic => Capabilities::basic(),
            Self::OneToOne => Capabilities::one_to_one(),
            Self::Group => Capabilities::group(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConversation {
    pub local: SipAddress,
    pub peer: SipAddress,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub kind: FixtureConversationKind,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub participants: Vec<SipAddress>,
    #[serde(default)]
    pub composing: Vec<SipAddress>,
    #[serde(default)]
    pub history: Vec<FixtureEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FixtureEvent {
    Message {
        id: Option<String>,
        from: SipAddress,
        text: String,
        timestamp_ms: i64,
        #[serde(default)]
        outgoing: bool,
    },
    ParticipantAdded {
        address: SipAddress,
        timestamp_ms: i64,
    },
    ParticipantRemoved {
        address: SipAddress,
        timestamp_ms: i64,
    },
    SubjectChanged {
        subject: String,
        timestamp_ms: i64,
    },
}

impl FixtureEvent {
    /// Converts into an engine event; `fallback_id` names messages without an id.
    pub fn into_event_log(self, fallback_id: impl FnOnce() -> String) -> EventLog {
        match self {
            Self::Message {
                id,
                from,
                text,
                timestamp_ms,
                outgoing,
            } => EventLog::message(ChatMessage {
                id: MessageId::new(id.unwrap_or_else(fallback_id)),
                from,
                text,
                timestamp_ms,
                is_outgoing: outgoing,
            }),
            Self::ParticipantAdded {
                address,
                timestamp_ms,
            } => EventLog {
                timestamp_ms,
                kind: EventKind::ParticipantAdded(address),
            },
            Self::ParticipantRemoved {
                address,
                timestamp_ms,
            } => EventLog {
                timestamp_ms,
                kind: EventKind::ParticipantRemoved(address),
            },
            Self::SubjectChanged {
                subject,
                timestamp_ms,
            } => EventLog {
                timestamp_ms,
                kind: EventKind::SubjectChanged(subject),
            },
        }
    }
}

pub fn load_fixture(path: &Path) -> Result<Fixture, AppError> {
    let raw = fs::read_to_string(path).map_err(|source| AppError::FixtureRead {
        path: path.to_path_buf(),
        source,
    })?;

    parse_fixture(&raw).map_err(|source| AppError::FixtureParse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_fixture(raw: &str) -> Result<Fixture, toml::de::Error> {
    toml::from_str(raw)
}
