use serde::Deserialize;

use super::address::SipAddress;

/// Trust level attached to a contact or conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Unsafe,
    #[default]
    ClearText,
    Encrypted,
    Safe,
}

impl SecurityLevel {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Unsafe => "unsafe",
            Self::ClearText => "clear-text",
            Self::Encrypted => "encrypted",
            Self::Safe => "safe",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub name: Option<String>,
    pub addresses: Vec<SipAddress>,
    /// Reference to the contact picture, if the directory has one.
    pub photo: Option<String>,
    pub security_level: SecurityLevel,
}

impl Contact {
    /// Synthetic contact carrying only an address (or nothing at all).
    pub fn placeholder(address: Option<SipAddress>) -> Self {
        Self {
            name: None,
            addresses: address.into_iter().collect(),
            photo: None,
            security_level: SecurityLevel::default(),
        }
    }

    pub fn primary_address(&self) -> Option<&SipAddress> {
        self.addresses.first()
    }
}
