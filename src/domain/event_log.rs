use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use super::{address::SipAddress, avatar::AvatarModel};

/// Engine-assigned identity of a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub from: SipAddress,
    pub text: String,
    pub timestamp_ms: i64,
    pub is_outgoing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    ChatMessage(ChatMessage),
    ParticipantAdded(SipAddress),
    ParticipantRemoved(SipAddress),
    SubjectChanged(String),
}

/// One entry of a conversation history, as delivered by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLog {
    pub timestamp_ms: i64,
    pub kind: EventKind,
}

impl EventLog {
    pub fn message(message: ChatMessage) -> Self {
        Self {
            timestamp_ms: message.timestamp_ms,
            kind: EventKind::ChatMessage(message),
        }
    }

    pub fn chat_message(&self) -> Option<&ChatMessage> {
        match &self.kind {
            EventKind::ChatMessage(message) => Some(message),
            _ => None,
        }
    }

    pub fn participant_address(&self) -> Option<&SipAddress> {
        match &self.kind {
            EventKind::ParticipantAdded(address) | EventKind::ParticipantRemoved(address) => {
                Some(address)
            }
            _ => None,
        }
    }

    /// Participant the event originates from: the sender for messages, the
    /// affected participant for membership changes, nobody otherwise.
    pub fn origin_address(&self) -> Option<&SipAddress> {
        match &self.kind {
            EventKind::ChatMessage(message) => Some(&message.from),
            _ => self.participant_address(),
        }
    }
}

/// A history entry paired with the avatar of its originator.
///
/// The avatar usually belongs to the conversation's avatar cache, which
/// releases it. Only avatars handed over with [`EventLogRecord::with_owned_avatar`]
/// are released together with the record.
#[derive(Debug)]
pub struct EventLogRecord {
    event: EventLog,
    avatar: Arc<AvatarModel>,
    owns_avatar: bool,
    released: AtomicBool,
}

impl EventLogRecord {
    pub fn new(event: EventLog, avatar: Arc<AvatarModel>) -> Self {
        Self {
            event,
            avatar,
            owns_avatar: false,
            released: AtomicBool::new(false),
        }
    }

    /// Record for an avatar nobody else keeps, such as the placeholder of an
    /// event without an originator.
    pub fn with_owned_avatar(event: EventLog, avatar: Arc<AvatarModel>) -> Self {
        Self {
            owns_avatar: true,
            ..Self::new(event, avatar)
        }
    }

    pub fn event(&self) -> &EventLog {
        &self.event
    }

    pub fn avatar(&self) -> &Arc<AvatarModel> {
        &self.avatar
    }

    pub fn message_id(&self) -> Option<&MessageId> {
        self.event.chat_message().map(|message| &message.id)
    }

    /// Releases the record, and its avatar when the record owns it. Returns
    /// `true` only for the first call.
    pub fn release(&self) -> bool {
        let first = !self.released.swap(true, Ordering::AcqRel);
        if first && self.owns_avatar {
            self.avatar.release();
        }
        first
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(uri: &str) -> SipAddress {
        uri.parse().expect("address should parse")
    }

    fn message(id: &str, from: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(id),
            from: address(from),
            text: "hello".to_owned(),
            timestamp_ms: 1_000,
            is_outgoing: false,
        }
    }

    #[test]
    fn origin_of_message_is_its_sender() {
        let event = EventLog::message(message("m1", "sip:alice@example.org"));

        assert_eq!(
            event.origin_address(),
            Some(&address("sip:alice@example.org"))
        );
        assert_eq!(event.timestamp_ms, 1_000);
    }

    #[test]
    fn origin_of_membership_event_is_the_participant() {
        let event = EventLog {
            timestamp_ms: 5,
            kind: EventKind::ParticipantRemoved(address("sip:bob@example.org")),
        };

        assert_eq!(event.origin_address(), Some(&address("sip:bob@example.org")));
        assert!(event.chat_message().is_none());
    }

    #[test]
    fn subject_change_has_no_origin() {
        let event = EventLog {
            timestamp_ms: 5,
            kind: EventKind::SubjectChanged("Weekend".to_owned()),
        };

        assert_eq!(event.origin_address(), None);
    }

    #[test]
    fn record_exposes_message_id_and_releases_once() {
        let record = EventLogRecord::with_owned_avatar(
            EventLog::message(message("m7", "sip:alice@example.org")),
            Arc::new(AvatarModel::placeholder()),
        );

        assert_eq!(record.message_id(), Some(&MessageId::new("m7")));
        assert!(record.release());
        assert!(!record.release());
        assert!(record.is_released());
        assert!(record.avatar().is_released());
    }

    #[test]
    fn releasing_a_record_leaves_a_shared_avatar_alone() {
        let avatar = Arc::new(AvatarModel::placeholder());
        let record = EventLogRecord::new(
            EventLog::message(message("m8", "sip:alice@example.org")),
            Arc::clone(&avatar),
        );

        assert!(record.release());

        assert!(record.is_released());
        assert!(!avatar.is_released());
    }
}
