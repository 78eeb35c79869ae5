use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    domain::{address::SipAddress, contact::Contact},
    engine::{
        core_thread::CoreThread,
        fixture::parse_fixture,
        memory::MemoryEngine,
    },
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock should not be poisoned")
}

pub const SAMPLE_FIXTURE: &str = r#"
[[contacts]]
name = "Alice Liddell"
addresses = ["sip:alice@example.org"]
photo = "alice.png"
security_level = "encrypted"

[[contacts]]
name = "Bob Marley"
addresses = ["sip:bob@example.org"]
photo = "bob.png"

[[conversations]]
local = "sip:me@example.org"
peer = "sip:alice@example.org"
subject = "Alice"

[[conversations.history]]
type = "message"
id = "m1"
from = "sip:alice@example.org"
text = "hi there"
timestamp_ms = 1700000000000

[[conversations.history]]
type = "message"
id = "m2"
from = "sip:me@example.org"
text = "hello"
timestamp_ms = 1700000060000
outgoing = true

[[conversations]]
local = "sip:me@example.org"
peer = "sip:team@conference.example.org"
subject = "Team"
kind = "group"
participants = ["sip:alice@example.org", "sip:bob@example.org"]
composing = ["sip:bob@example.org"]

[[conversations.history]]
type = "participant_added"
address = "sip:bob@example.org"
timestamp_ms = 1700000000000

[[conversations.history]]
type = "message"
id = "m3"
from = "sip:bob@example.org"
text = "joined"
timestamp_ms = 1700000030000

[[conversations]]
local = "sip:me@example.org"
peer = "sip:archive@conference.example.org"
subject = "Archive"
kind = "group"
"#;

pub fn address(uri: &str) -> SipAddress {
    uri.parse().expect("test address should parse")
}

pub fn sample_contacts() -> Vec<Contact> {
    parse_fixture(SAMPLE_FIXTURE)
        .expect("sample fixture should parse")
        .contacts
        .into_iter()
        .map(Contact::from)
        .collect()
}

pub fn sample_engine() -> (CoreThread, Arc<MemoryEngine>) {
    let core = CoreThread::start().expect("core thread should start");
    let fixture = parse_fixture(SAMPLE_FIXTURE).expect("sample fixture should parse");
    let engine = Arc::new(MemoryEngine::from_fixture(fixture, &core));
    (core, engine)
}
