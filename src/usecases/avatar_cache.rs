//! Address-keyed memo of avatar models for one open conversation.

use std::{collections::HashMap, sync::Arc};

use crate::{
    domain::{
        address::{AddressKey, SipAddress},
        avatar::AvatarModel,
        contact::Contact,
    },
    engine::contracts::ContactDirectory,
};

/// Grows for as long as its conversation stays open; entries only go away
/// through [`AvatarCache::release_all`].
pub struct AvatarCache {
    contacts: Arc<dyn ContactDirectory>,
    entries: HashMap<AddressKey, Arc<AvatarModel>>,
}

impl AvatarCache {
    pub fn new(contacts: Arc<dyn ContactDirectory>) -> Self {
        Self {
            contacts,
            entries: HashMap::new(),
        }
    }

    pub fn resolve(&mut self, address: Option<&SipAddress>) -> Arc<AvatarModel> {
        let Some(address) = address else {
            tracing::trace!("no address given, using placeholder avatar");
            return Arc::new(AvatarModel::placeholder());
        };

        let cleaned = address.cleaned();
        let key = AddressKey::normalize(&cleaned);

        if let Some(found) = self.entries.get(&key) {
            return Arc::clone(found);
        }

        let avatar = match self.contacts.find_contact_by_address(&cleaned) {
            Some(contact) => AvatarModel::from_contact(&contact),
            None => {
                tracing::debug!(address = %key, "no contact matches address, using placeholder");
                AvatarModel::from_contact(&Contact::placeholder(Some(cleaned)))
            }
        };

        let avatar = Arc::new(avatar);
        self.entries.insert(key, Arc::clone(&avatar));
        avatar
    }

    pub fn find_contacts(&self, addresses: &[SipAddress]) -> Vec<Contact> {
        addresses
            .iter()
            .filter_map(|address| self.contacts.find_contact_by_address(address))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Releases and forgets every cached model; returns how many were held.
    pub fn release_all(&mut self) -> usize {
        let released = self.entries.len();
        for (_, avatar) in self.entries.drain() {
            avatar.release();
        }
        released
    }
}
