//! Seams towards the SIP engine and the contact directory.
//!
//! Implementations are called from the core thread only, and deliver listener
//! callbacks on that same thread.

use std::sync::Arc;

use crate::domain::{
    address::SipAddress,
    contact::Contact,
    event_log::{ChatMessage, EventLog},
};

/// Handle returned by [`Conversation::add_listener`]; hand it back to
/// [`Conversation::remove_listener`] to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Plain SIP MESSAGE exchange with a single peer, no conference server.
    pub basic: bool,
    pub one_to_one: bool,
    pub conference: bool,
}

impl Capabilities {
    pub fn basic() -> Self {
        Self {
            basic: true,
            one_to_one: true,
            conference: false,
        }
    }

    pub fn one_to_one() -> Self {
        Self {
            basic: false,
            one_to_one: true,
            conference: true,
        }
    }

    pub fn group() -> Self {
        Self {
            basic: false,
            one_to_one: false,
            conference: true,
        }
    }
}

pub trait ConversationListener: Send + Sync {
    fn on_message_sending(&self, conversation: &dyn Conversation, event: &EventLog);

    fn on_message_sent(&self, conversation: &dyn Conversation, event: &EventLog);

    fn on_composing_received(
        &self,
        conversation: &dyn Conversation,
        address: &SipAddress,
        is_composing: bool,
    );

    fn on_messages_received(&self, conversation: &dyn Conversation, events: &[EventLog]);
}

pub trait Conversation: Send + Sync {
    fn subject(&self) -> String;

    fn peer_address(&self) -> SipAddress;

    fn capabilities(&self) -> Capabilities;

    fn is_read_only(&self) -> bool;

    fn participants(&self) -> Vec<SipAddress>;

    fn composing_addresses(&self) -> Vec<SipAddress>;

    /// History entries from `since_index` on, oldest first.
    fn history(&self, since_index: usize) -> Vec<EventLog>;

    fn create_message(&self, text: &str) -> ChatMessage;

    fn send(&self, message: ChatMessage);

    fn delete(&self, message: &ChatMessage);

    fn mark_read(&self);

    fn add_listener(&self, listener: Arc<dyn ConversationListener>) -> ListenerId;

    fn remove_listener(&self, id: ListenerId);
}

pub trait SessionDirectory: Send + Sync {
    fn find_conversation(
        &self,
        local: &SipAddress,
        remote: &SipAddress,
    ) -> Option<Arc<dyn Conversation>>;
}

pub trait ContactDirectory: Send + Sync {
    fn find_contact_by_address(&self, address: &SipAddress) -> Option<Contact>;
}

impl<T: ContactDirectory + ?Sized> ContactDirectory for Arc<T> {
    fn find_contact_by_address(&self, address: &SipAddress) -> Option<Contact> {
        (**self).find_contact_by_address(address)
    }
}
