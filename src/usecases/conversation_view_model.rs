//! Presentation state of one open conversation.
//!
//! Every engine interaction is posted to the core thread; public methods only
//! enqueue work and return. State is published through a `watch` channel and
//! each update swaps in a complete snapshot.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

use thiserror::Error;
use tokio::sync::{oneshot, watch};

use crate::{
    domain::{
        address::{AddressParseError, SipAddress},
        avatar::GroupAvatarModel,
        composing::ComposingTemplate,
        conversation_state::{ConversationMetadata, ConversationSnapshot},
        event_log::{ChatMessage, EventLog},
    },
    engine::{
        contracts::{
            ContactDirectory, Conversation, ConversationListener, ListenerId, SessionDirectory,
        },
        core_thread::CoreThread,
    },
    usecases::{
        avatar_cache::AvatarCache,
        projector::{composing_label, project_event, project_events},
    },
};

const CONVERSATION_LOOKUP_FAILED: &str = "CONVERSATION_LOOKUP_FAILED";
const CONVERSATION_BOUND: &str = "CONVERSATION_BOUND";
const CONVERSATION_READ_ONLY: &str = "CONVERSATION_READ_ONLY";
const CONVERSATION_NOT_BOUND: &str = "CONVERSATION_NOT_BOUND";
const CONVERSATION_TORN_DOWN: &str = "CONVERSATION_TORN_DOWN";
const VIEW_MODEL_STATE_POISONED: &str = "VIEW_MODEL_STATE_POISONED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressRole {
    Local,
    Remote,
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("failed to parse {role} address {uri:?}: {source}")]
    InvalidAddress {
        role: AddressRole,
        uri: String,
        #[source]
        source: AddressParseError,
    },
    #[error("no conversation between {local} and {remote}")]
    NotFound { local: String, remote: String },
}

/// Fires once with the outcome of [`ConversationViewModel::find_conversation`].
/// The sender is dropped unanswered if the view model is torn down first.
pub type LookupSignal = oneshot::Receiver<Result<(), LookupError>>;

pub struct ConversationViewModel {
    core: CoreThread,
    sessions: Arc<dyn SessionDirectory>,
    shared: Arc<Shared>,
}

struct Shared {
    state_tx: watch::Sender<ConversationSnapshot>,
    inner: Mutex<Inner>,
    composing_template: ComposingTemplate,
}

struct Inner {
    binding: Option<Binding>,
    avatars: AvatarCache,
    torn_down: bool,
}

struct Binding {
    conversation: Arc<dyn Conversation>,
    listener_id: ListenerId,
}

impl ConversationViewModel {
    pub fn new(
        core: CoreThread,
        sessions: Arc<dyn SessionDirectory>,
        contacts: Arc<dyn ContactDirectory>,
        composing_template: ComposingTemplate,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConversationSnapshot::default());

        Self {
            core,
            sessions,
            shared: Arc::new(Shared {
                state_tx,
                inner: Mutex::new(Inner {
                    binding: None,
                    avatars: AvatarCache::new(contacts),
                    torn_down: false,
                }),
                composing_template,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationSnapshot> {
        self.shared.state_tx.subscribe()
    }

    pub fn snapshot(&self) -> ConversationSnapshot {
        self.shared.state_tx.borrow().clone()
    }

    pub fn find_conversation(&self, local_uri: &str, remote_uri: &str) -> LookupSignal {
        let (signal_tx, signal_rx) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let sessions = Arc::clone(&self.sessions);
        let local_uri = local_uri.to_owned();
        let remote_uri = remote_uri.to_owned();

        self.core.post(move || {
            tracing::info!(
                local = %local_uri,
                remote = %remote_uri,
                "looking for conversation"
            );

            let outcome = {
                let Some(mut inner) = shared.lock_inner() else {
                    return;
                };
                if inner.torn_down {
                    tracing::debug!("lookup dropped, view model already torn down");
                    return;
                }
                shared.bind(&mut inner, sessions.as_ref(), &local_uri, &remote_uri)
            };

            if let Err(error) = &outcome {
                tracing::error!(
                    code = CONVERSATION_LOOKUP_FAILED,
                    error = %error,
                    "conversation lookup failed"
                );
            }

            let _ = signal_tx.send(outcome);
        });

        signal_rx
    }

    /// Replaces the draft shown in the compose field.
    pub fn set_draft(&self, text: impl Into<String>) {
        let text = text.into();
        self.shared
            .publish(|snapshot| snapshot.with_draft(text));
    }

    /// Sends the trimmed draft, if any, and clears it.
    pub fn send_text(&self) {
        let shared = Arc::clone(&self.shared);

        self.core.post(move || {
            let draft = shared.state_tx.borrow().draft().trim().to_owned();

            match shared.bound_conversation() {
                Some(conversation) if !draft.is_empty() => {
                    let message = conversation.create_message(&draft);
                    tracing::info!(message_id = %message.id, "sending message");
                    conversation.send(message);
                }
                Some(_) => tracing::debug!("draft is empty, nothing to send"),
                None => tracing::warn!(
                    code = CONVERSATION_NOT_BOUND,
                    "send requested without a bound conversation"
                ),
            }

            shared.publish(|snapshot| snapshot.with_draft(String::new()));
        });
    }

    /// Hides `message` from the event list and asks the engine to delete it.
    pub fn delete_message(&self, message: ChatMessage) {
        let shared = Arc::clone(&self.shared);

        self.core.post(move || {
            let Some(conversation) = shared.bound_conversation() else {
                tracing::warn!(
                    code = CONVERSATION_NOT_BOUND,
                    message_id = %message.id,
                    "delete requested without a bound conversation"
                );
                return;
            };

            // Linear scan; histories are one conversation's worth of events.
            let removed =
                shared.publish_if(|snapshot| snapshot.without_message(&message.id));
            tracing::info!(message_id = %message.id, removed, "deleting message");
            conversation.delete(&message);
        });
    }

    /// Unregisters from the engine and releases every avatar and record.
    pub fn tear_down(&self) {
        let shared = Arc::clone(&self.shared);
        self.core.post(move || shared.tear_down());
    }
}

impl Drop for ConversationViewModel {
    fn drop(&mut self) {
        self.tear_down();
    }
}

impl Shared {
    fn lock_inner(&self) -> Option<MutexGuard<'_, Inner>> {
        match self.inner.lock() {
            Ok(inner) => Some(inner),
            Err(_) => {
                tracing::error!(
                    code = VIEW_MODEL_STATE_POISONED,
                    "conversation view model state is poisoned; skipping update"
                );
                None
            }
        }
    }

    fn publish<F>(&self, build: F)
    where
        F: FnOnce(&ConversationSnapshot) -> ConversationSnapshot,
    {
        self.publish_if(|snapshot| Some(build(snapshot)));
    }

    /// Swaps in the snapshot built by `build`; `None` leaves observers
    /// untouched. Returns whether a new snapshot was published.
    fn publish_if<F>(&self, build: F) -> bool
    where
        F: FnOnce(&ConversationSnapshot) -> Option<ConversationSnapshot>,
    {
        self.state_tx.send_if_modified(|snapshot| match build(snapshot) {
            Some(next) => {
                *snapshot = next;
                true
            }
            None => false,
        })
    }

    fn bound_conversation(&self) -> Option<Arc<dyn Conversation>> {
        let inner = self.lock_inner()?;
        if inner.torn_down {
            return None;
        }
        inner
            .binding
            .as_ref()
            .map(|binding| Arc::clone(&binding.conversation))
    }

    fn bind(
        self: &Arc<Self>,
        inner: &mut Inner,
        sessions: &dyn SessionDirectory,
        local_uri: &str,
        remote_uri: &str,
    ) -> Result<(), LookupError> {
        let local = parse_address(AddressRole::Local, local_uri)?;
        let remote = parse_address(AddressRole::Remote, remote_uri)?;

        let conversation =
            sessions
                .find_conversation(&local, &remote)
                .ok_or_else(|| LookupError::NotFound {
                    local: local.as_string_uri_only(),
                    remote: remote.as_string_uri_only(),
                })?;

        if let Some(previous) = inner.binding.take() {
            tracing::debug!("replacing previously bound conversation");
            previous.conversation.remove_listener(previous.listener_id);
            for record in self.state_tx.borrow().events() {
                record.release();
            }
            let released = inner.avatars.release_all();
            tracing::debug!(released_avatars = released, "previous avatars released");
        }

        let listener = Arc::new(ConversationEvents {
            shared: Arc::downgrade(self),
        });
        let listener_id = conversation.add_listener(listener);

        let metadata = describe(conversation.as_ref(), &mut inner.avatars);
        if metadata.is_read_only {
            tracing::warn!(
                code = CONVERSATION_READ_ONLY,
                subject = %metadata.subject,
                "conversation is read only"
            );
        }

        let label = composing_label(
            &mut inner.avatars,
            &conversation.composing_addresses(),
            &self.composing_template,
        );
        let events = project_events(&mut inner.avatars, conversation.history(0));
        conversation.mark_read();

        tracing::info!(
            code = CONVERSATION_BOUND,
            subject = %metadata.subject,
            events = events.len(),
            "conversation bound"
        );

        inner.binding = Some(Binding {
            conversation,
            listener_id,
        });
        self.publish(|snapshot| snapshot.bound(metadata, label, events));

        Ok(())
    }

    /// Runs `update` while a conversation is bound; late callbacks are dropped.
    fn with_bound<F>(&self, update: F)
    where
        F: FnOnce(&mut Inner),
    {
        let Some(mut inner) = self.lock_inner() else {
            return;
        };

        if inner.torn_down || inner.binding.is_none() {
            tracing::debug!("callback ignored, no conversation bound");
            return;
        }

        update(&mut inner);
    }

    fn tear_down(&self) {
        let Some(mut inner) = self.lock_inner() else {
            return;
        };
        if inner.torn_down {
            return;
        }
        inner.torn_down = true;

        if let Some(binding) = inner.binding.take() {
            binding.conversation.remove_listener(binding.listener_id);
        }

        let released_events = self
            .state_tx
            .borrow()
            .events()
            .iter()
            .filter(|record| record.release())
            .count();
        let released_avatars = inner.avatars.release_all();
        drop(inner);

        self.publish(ConversationSnapshot::torn_down);

        tracing::info!(
            code = CONVERSATION_TORN_DOWN,
            released_events,
            released_avatars,
            "conversation view model torn down"
        );
    }
}

struct ConversationEvents {
    shared: Weak<Shared>,
}

impl ConversationListener for ConversationEvents {
    fn on_message_sending(&self, _conversation: &dyn Conversation, event: &EventLog) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        tracing::info!(
            message_id = ?event.chat_message().map(|message| message.id.as_str()),
            "chat message is being sent"
        );

        shared.with_bound(|inner| {
            let record = project_event(&mut inner.avatars, event.clone());
            shared.publish(|snapshot| snapshot.with_appended(vec![record]));
        });
    }

    fn on_message_sent(&self, _conversation: &dyn Conversation, event: &EventLog) {
        tracing::info!(
            message_id = ?event.chat_message().map(|message| message.id.as_str()),
            "chat message has been sent"
        );
    }

    fn on_composing_received(
        &self,
        conversation: &dyn Conversation,
        address: &SipAddress,
        is_composing: bool,
    ) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        tracing::info!(
            remote = %address.as_string_uri_only(),
            is_composing,
            "remote composing state changed"
        );

        shared.with_bound(|inner| {
            let label = composing_label(
                &mut inner.avatars,
                &conversation.composing_addresses(),
                &shared.composing_template,
            );
            shared.publish(|snapshot| snapshot.with_composing_label(label));
        });
    }

    fn on_messages_received(&self, conversation: &dyn Conversation, events: &[EventLog]) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };

        tracing::info!(count = events.len(), "received new message(s)");

        shared.with_bound(|inner| {
            conversation.mark_read();
            let label = composing_label(
                &mut inner.avatars,
                &conversation.composing_addresses(),
                &shared.composing_template,
            );
            let records = project_events(&mut inner.avatars, events.iter().cloned());

            shared.publish(|snapshot| {
                snapshot
                    .with_composing_label(label)
                    .with_appended(records)
            });
        });
    }
}

fn parse_address(role: AddressRole, uri: &str) -> Result<SipAddress, LookupError> {
    uri.parse().map_err(|source| LookupError::InvalidAddress {
        role,
        uri: uri.to_owned(),
        source,
    })
}

fn describe(conversation: &dyn Conversation, avatars: &mut AvatarCache) -> ConversationMetadata {
    let capabilities = conversation.capabilities();
    let participants = conversation.participants();

    let is_group = !capabilities.one_to_one && capabilities.conference;
    let is_empty = capabilities.conference && participants.is_empty();

    let (avatar_address, group_contacts) = if capabilities.basic {
        (conversation.peer_address(), Vec::new())
    } else {
        (
            participants
                .first()
                .cloned()
                .unwrap_or_else(|| conversation.peer_address()),
            avatars.find_contacts(&participants),
        )
    };

    ConversationMetadata {
        subject: conversation.subject(),
        is_group,
        is_read_only: conversation.is_read_only() || is_empty,
        avatar: avatars.resolve(Some(&avatar_address)),
        group_avatar: GroupAvatarModel::new(&group_contacts),
    }
}
