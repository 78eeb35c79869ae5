//! Fixture-backed engine living entirely in process.
//!
//! It keeps the engine's threading contract: every listener callback is
//! posted to the core thread and looks up the current listeners only when it
//! runs, so a listener removed in the meantime never hears about it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::{
    domain::{
        address::{AddressKey, SipAddress},
        contact::Contact,
        event_log::{ChatMessage, EventLog, MessageId},
    },
    engine::{
        contracts::{
            Capabilities, ContactDirectory, Conversation, ConversationListener, ListenerId,
            SessionDirectory,
        },
        core_thread::CoreThread,
        fixture::{Fixture, FixtureConversation},
    },
};

#[derive(Debug, Clone, Default)]
pub struct MemoryContacts {
    contacts: Vec<Contact>,
}

impl MemoryContacts {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }
}

impl ContactDirectory for MemoryContacts {
    fn find_contact_by_address(&self, address: &SipAddress) -> Option<Contact> {
        let key = AddressKey::normalize(address);
        self.contacts
            .iter()
            .find(|contact| {
                contact
                    .addresses
                    .iter()
                    .any(|candidate| AddressKey::normalize(candidate) == key)
            })
            .cloned()
    }
}

#[derive(Default)]
struct ConversationState {
    history: Vec<EventLog>,
    composing: Vec<SipAddress>,
    listeners: Vec<(ListenerId, Arc<dyn ConversationListener>)>,
    next_listener_id: u64,
    next_message_seq: u64,
    unread_count: usize,
}

pub struct MemoryConversation {
    local: SipAddress,
    peer: SipAddress,
    subject: String,
    capabilities: Capabilities,
    read_only: bool,
    participants: Vec<SipAddress>,
    core: CoreThread,
    weak_self: Weak<MemoryConversation>,
    state: Mutex<ConversationState>,
}

impl MemoryConversation {
    pub fn from_fixture(fixture: FixtureConversation, core: CoreThread) -> Arc<Self> {
        let history = fixture
            .history
            .into_iter()
            .enumerate()
            .map(|(index, event)| event.into_event_log(|| format!("fixture-{index}")))
            .collect();

        Arc::new_cyclic(|weak_self| Self {
            local: fixture.local,
            peer: fixture.peer,
            subject: fixture.subject,
            capabilities: fixture.kind.capabilities(),
            read_only: fixture.read_only,
            participants: fixture.participants,
            core,
            weak_self: weak_self.clone(),
            state: Mutex::new(ConversationState {
                history,
                composing: fixture.composing,
                ..ConversationState::default()
            }),
        })
    }

    pub fn local_address(&self) -> &SipAddress {
        &self.local
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    pub fn unread_count(&self) -> usize {
        self.state().unread_count
    }

    pub fn history_len(&self) -> usize {
        self.state().history.len()
    }

    /// Simulates an incoming text message from `from`.
    pub fn receive(&self, from: SipAddress, text: &str) -> EventLog {
        let event = {
            let mut state = self.state();
            state.next_message_seq += 1;
            EventLog::message(ChatMessage {
                id: MessageId::new(format!("in-{}", state.next_message_seq)),
                from,
                text: text.to_owned(),
                timestamp_ms: now_unix_ms(),
                is_outgoing: false,
            })
        };

        self.receive_events(vec![event.clone()]);
        event
    }

    /// Simulates a batch of incoming events delivered in one callback.
    pub fn receive_events(&self, events: Vec<EventLog>) {
        {
            let mut state = self.state();
            for event in &events {
                if let Some(message) = event.chat_message() {
                    let sender = AddressKey::normalize(&message.from);
                    state
                        .composing
                        .retain(|address| AddressKey::normalize(address) != sender);
                    state.unread_count += 1;
                }
            }
            state.history.extend(events.iter().cloned());
        }

        self.notify(move |listener, conversation| {
            listener.on_messages_received(conversation, &events);
        });
    }

    /// Simulates a remote composing notification.
    pub fn set_composing(&self, address: SipAddress, is_composing: bool) {
        {
            let mut state = self.state();
            let key = AddressKey::normalize(&address);
            state
                .composing
                .retain(|candidate| AddressKey::normalize(candidate) != key);
            if is_composing {
                state.composing.push(address.clone());
            }
        }

        self.notify(move |listener, conversation| {
            listener.on_composing_received(conversation, &address, is_composing);
        });
    }

    fn state(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> Vec<Arc<dyn ConversationListener>> {
        self.state()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn notify<F>(&self, deliver: F)
    where
        F: Fn(&dyn ConversationListener, &dyn Conversation) + Send + 'static,
    {
        let weak_self = self.weak_self.clone();
        self.core.post(move || {
            let Some(conversation) = weak_self.upgrade() else {
                return;
            };

            for listener in conversation.listeners() {
                deliver(listener.as_ref(), conversation.as_ref());
            }
        });
    }
}

impl Conversation for MemoryConversation {
    fn subject(&self) -> String {
        self.subject.clone()
    }

    fn peer_address(&self) -> SipAddress {
        self.peer.clone()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn participants(&self) -> Vec<SipAddress> {
        self.participants.clone()
    }

    fn composing_addresses(&self) -> Vec<SipAddress> {
        self.state().composing.clone()
    }

    fn history(&self, since_index: usize) -> Vec<EventLog> {
        self.state()
            .history
            .iter()
            .skip(since_index)
            .cloned()
            .collect()
    }

    fn create_message(&self, text: &str) -> ChatMessage {
        let mut state = self.state();
        state.next_message_seq += 1;

        ChatMessage {
            id: MessageId::new(format!("out-{}", state.next_message_seq)),
            from: self.local.clone(),
            text: text.to_owned(),
            timestamp_ms: now_unix_ms(),
            is_outgoing: true,
        }
    }

    fn send(&self, message: ChatMessage) {
        let event = EventLog::message(message);
        self.state().history.push(event.clone());

        let sending = event.clone();
        self.notify(move |listener, conversation| {
            listener.on_message_sending(conversation, &sending);
        });
        self.notify(move |listener, conversation| {
            listener.on_message_sent(conversation, &event);
        });
    }

    fn delete(&self, message: &ChatMessage) {
        self.state()
            .history
            .retain(|event| event.chat_message().map(|existing| &existing.id) != Some(&message.id));
    }

    fn mark_read(&self) {
        self.state().unread_count = 0;
    }

    fn add_listener(&self, listener: Arc<dyn ConversationListener>) -> ListenerId {
        let mut state = self.state();
        state.next_listener_id += 1;
        let id = ListenerId(state.next_listener_id);
        state.listeners.push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.state()
            .listeners
            .retain(|(candidate, _)| *candidate != id);
    }
}

/// In-process engine serving the conversations and contacts of a fixture.
pub struct MemoryEngine {
    contacts: Arc<MemoryContacts>,
    conversations: Vec<Arc<MemoryConversation>>,
}

impl MemoryEngine {
    pub fn from_fixture(fixture: Fixture, core: &CoreThread) -> Self {
        Self {
            contacts: Arc::new(MemoryContacts::new(
                fixture.contacts.into_iter().map(Contact::from).collect(),
            )),
            conversations: fixture
                .conversations
                .into_iter()
                .map(|conversation| MemoryConversation::from_fixture(conversation, core.clone()))
                .collect(),
        }
    }

    pub fn contacts(&self) -> Arc<MemoryContacts> {
        Arc::clone(&self.contacts)
    }

    pub fn conversations(&self) -> &[Arc<MemoryConversation>] {
        &self.conversations
    }

    pub fn conversation(
        &self,
        local: &SipAddress,
        remote: &SipAddress,
    ) -> Option<Arc<MemoryConversation>> {
        let local = AddressKey::normalize(local);
        let remote = AddressKey::normalize(remote);

        self.conversations
            .iter()
            .find(|conversation| {
                AddressKey::normalize(&conversation.local) == local
                    && AddressKey::normalize(&conversation.peer) == remote
            })
            .cloned()
    }
}

impl SessionDirectory for MemoryEngine {
    fn find_conversation(
        &self,
        local: &SipAddress,
        remote: &SipAddress,
    ) -> Option<Arc<dyn Conversation>> {
        self.conversation(local, remote)
            .map(|conversation| conversation as Arc<dyn Conversation>)
    }
}

impl ContactDirectory for MemoryEngine {
    fn find_contact_by_address(&self, address: &SipAddress) -> Option<Contact> {
        self.contacts.find_contact_by_address(address)
    }
}

fn now_unix_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
