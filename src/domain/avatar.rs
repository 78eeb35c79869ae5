//! Presentation stand-ins for contact identities.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{
    address::SipAddress,
    contact::{Contact, SecurityLevel},
};

#[derive(Debug)]
pub struct AvatarModel {
    name: Option<String>,
    address: Option<SipAddress>,
    initials: String,
    images: Vec<String>,
    trust: SecurityLevel,
    released: AtomicBool,
}

impl AvatarModel {
    pub fn from_contact(contact: &Contact) -> Self {
        let address = contact.primary_address().cloned();
        let initials = initials_for(
            contact
                .name
                .clone()
                .or_else(|| address.as_ref().map(SipAddress::formatted_name))
                .as_deref()
                .unwrap_or_default(),
        );

        Self {
            name: contact.name.clone(),
            address,
            initials,
            images: contact.photo.iter().cloned().collect(),
            trust: contact.security_level,
            released: AtomicBool::new(false),
        }
    }

    /// Model for an absent address: no name, no picture.
    pub fn placeholder() -> Self {
        Self::from_contact(&Contact::placeholder(None))
    }

    /// Name coming from the contact directory, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn address(&self) -> Option<&SipAddress> {
        self.address.as_ref()
    }

    /// Contact name, falling back to the address' formatted name.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.address.as_ref().map(SipAddress::formatted_name))
            .unwrap_or_default()
    }

    pub fn initials(&self) -> &str {
        &self.initials
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn trust(&self) -> SecurityLevel {
        self.trust
    }

    /// Marks the model as released. Returns `true` only for the first call.
    pub fn release(&self) -> bool {
        !self.released.swap(true, Ordering::AcqRel)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Composite avatar for group conversations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupAvatarModel {
    images: Vec<String>,
    initials: Vec<String>,
}

impl GroupAvatarModel {
    pub fn new(contacts: &[Contact]) -> Self {
        Self {
            images: contacts
                .iter()
                .filter_map(|contact| contact.photo.clone())
                .collect(),
            initials: contacts
                .iter()
                .filter_map(|contact| contact.name.as_deref())
                .map(initials_for)
                .collect(),
        }
    }

    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn initials(&self) -> &[String] {
        &self.initials
    }
}

/// First letter of the first two words, upper-cased.
pub fn initials_for(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().find(|ch| ch.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}
