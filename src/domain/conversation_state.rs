use std::sync::Arc;

use super::{
    avatar::{AvatarModel, GroupAvatarModel},
    event_log::{EventLogRecord, MessageId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationPhase {
    #[default]
    Unbound,
    Bound,
    TornDown,
}

/// Metadata computed once when a conversation gets bound.
#[derive(Debug, Clone)]
pub struct ConversationMetadata {
    pub subject: String,
    pub is_group: bool,
    pub is_read_only: bool,
    pub avatar: Arc<AvatarModel>,
    pub group_avatar: GroupAvatarModel,
}

/// Published, read-only view of a conversation.
///
/// Every update replaces the whole snapshot; `events` is shared between
/// snapshots and never edited in place.
#[derive(Debug, Clone, Default)]
pub struct ConversationSnapshot {
    phase: ConversationPhase,
    subject: String,
    is_group: bool,
    is_read_only: bool,
    composing_label: String,
    avatar: Option<Arc<AvatarModel>>,
    group_avatar: Option<GroupAvatarModel>,
    events: Arc<Vec<Arc<EventLogRecord>>>,
    draft: String,
}

impl ConversationSnapshot {
    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn is_bound(&self) -> bool {
        self.phase == ConversationPhase::Bound
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn is_group(&self) -> bool {
        self.is_group
    }

    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    pub fn composing_label(&self) -> &str {
        &self.composing_label
    }

    pub fn avatar(&self) -> Option<&Arc<AvatarModel>> {
        self.avatar.as_ref()
    }

    pub fn group_avatar(&self) -> Option<&GroupAvatarModel> {
        self.group_avatar.as_ref()
    }

    pub fn events(&self) -> &[Arc<EventLogRecord>] {
        &self.events
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn bound(
        &self,
        metadata: ConversationMetadata,
        composing_label: String,
        events: Vec<Arc<EventLogRecord>>,
    ) -> Self {
        Self {
            phase: ConversationPhase::Bound,
            subject: metadata.subject,
            is_group: metadata.is_group,
            is_read_only: metadata.is_read_only,
            composing_label,
            avatar: Some(metadata.avatar),
            group_avatar: Some(metadata.group_avatar),
            events: Arc::new(events),
            draft: self.draft.clone(),
        }
    }

    /// New snapshot with `records` appended after the current events.
    pub fn with_appended(&self, records: Vec<Arc<EventLogRecord>>) -> Self {
        let events = self
            .events
            .iter()
            .cloned()
            .chain(records)
            .collect::<Vec<_>>();

        Self {
            events: Arc::new(events),
            ..self.clone()
        }
    }

    /// New snapshot without the record carrying `id`, or `None` when no such
    /// record is visible.
    pub fn without_message(&self, id: &MessageId) -> Option<Self> {
        let position = self
            .events
            .iter()
            .position(|record| record.message_id() == Some(id))?;

        let mut events = self.events.as_ref().clone();
        events.remove(position);

        Some(Self {
            events: Arc::new(events),
            ..self.clone()
        })
    }

    pub fn with_composing_label(&self, composing_label: String) -> Self {
        Self {
            composing_label,
            ..self.clone()
        }
    }

    pub fn with_draft(&self, draft: String) -> Self {
        Self {
            draft,
            ..self.clone()
        }
    }

    pub fn torn_down(&self) -> Self {
        Self {
            phase: ConversationPhase::TornDown,
            composing_label: String::new(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event_log::{ChatMessage, EventLog};

    fn record(id: &str) -> Arc<EventLogRecord> {
        Arc::new(EventLogRecord::new(
            EventLog::message(ChatMessage {
                id: MessageId::new(id),
                from: "sip:alice@example.org".parse().expect("address"),
                text: format!("text {id}"),
                timestamp_ms: 1_000,
                is_outgoing: false,
            }),
            Arc::new(AvatarModel::placeholder()),
        ))
    }

    fn bound_with(ids: &[&str]) -> ConversationSnapshot {
        ConversationSnapshot::default().bound(
            ConversationMetadata {
                subject: "Alice".to_owned(),
                is_group: false,
                is_read_only: false,
                avatar: Arc::new(AvatarModel::placeholder()),
                group_avatar: GroupAvatarModel::default(),
            },
            String::new(),
            ids.iter().map(|id| record(id)).collect(),
        )
    }

    #[test]
    fn default_snapshot_is_unbound_and_empty() {
        let snapshot = ConversationSnapshot::default();

        assert_eq!(snapshot.phase(), ConversationPhase::Unbound);
        assert!(snapshot.events().is_empty());
        assert!(snapshot.avatar().is_none());
    }

    #[test]
    fn bound_keeps_pending_draft() {
        let snapshot = ConversationSnapshot::default()
            .with_draft("typing".to_owned())
            .bound(
                ConversationMetadata {
                    subject: "Team".to_owned(),
                    is_group: true,
                    is_read_only: true,
                    avatar: Arc::new(AvatarModel::placeholder()),
                    group_avatar: GroupAvatarModel::default(),
                },
                String::new(),
                Vec::new(),
            );

        assert!(snapshot.is_bound());
        assert_eq!(snapshot.subject(), "Team");
        assert!(snapshot.is_group());
        assert!(snapshot.is_read_only());
        assert_eq!(snapshot.draft(), "typing");
    }

    #[test]
    fn append_preserves_prefix_identity() {
        let before = bound_with(&["m1", "m2"]);

        let after = before.with_appended(vec![record("m3")]);

        assert_eq!(after.events().len(), 3);
        assert!(Arc::ptr_eq(&before.events()[0], &after.events()[0]));
        assert!(Arc::ptr_eq(&before.events()[1], &after.events()[1]));
        assert_eq!(before.events().len(), 2);
    }

    #[test]
    fn removing_a_message_leaves_others_untouched() {
        let before = bound_with(&["m1", "m2", "m3"]);

        let after = before
            .without_message(&MessageId::new("m2"))
            .expect("m2 should be found");

        let ids = after
            .events()
            .iter()
            .filter_map(|record| record.message_id().map(MessageId::as_str))
            .collect::<Vec<_>>();
        assert_eq!(ids, ["m1", "m3"]);
        assert!(Arc::ptr_eq(&before.events()[0], &after.events()[0]));
        assert!(Arc::ptr_eq(&before.events()[2], &after.events()[1]));
    }

    #[test]
    fn removing_an_absent_message_yields_nothing() {
        let before = bound_with(&["m1"]);

        assert!(before.without_message(&MessageId::new("nope")).is_none());
    }

    #[test]
    fn torn_down_clears_composing_label() {
        let snapshot = bound_with(&["m1"])
            .with_composing_label("Alice is composing…".to_owned())
            .torn_down();

        assert_eq!(snapshot.phase(), ConversationPhase::TornDown);
        assert_eq!(snapshot.composing_label(), "");
        assert_eq!(snapshot.events().len(), 1);
    }
}
