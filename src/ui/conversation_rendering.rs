//! Plain-text rendering of a published conversation snapshot.
//!
//! - Header with subject, group/read-only markers and the composing label
//! - Sender grouping (consecutive messages from one sender show the name once)
//! - Date separators between events from different days
//! - One-line notices for membership and subject changes

use std::sync::Arc;

use crate::{
    domain::{
        conversation_state::ConversationSnapshot,
        event_log::{EventKind, EventLogRecord},
    },
    ui::time_format::{date_label, local_date, time_label},
};

const OUTGOING_SENDER: &str = "You";
const EMPTY_MESSAGE: &str = "[Empty message]";
const INDENT: &str = "      ";

/// A visual element of the rendered event list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationElement {
    /// Date separator line (e.g., "——— 14 Feb 2026 ———").
    DateSeparator(String),
    Message {
        time: String,
        sender: Option<String>,
        content: String,
    },
    /// Membership or subject change.
    Notice { time: String, text: String },
}

/// Builds the element list for `records`, grouping consecutive messages of
/// one sender and inserting date separators.
pub fn build_conversation_elements(records: &[Arc<EventLogRecord>]) -> Vec<ConversationElement> {
    let mut elements = Vec::new();
    let mut prev_date: Option<chrono::NaiveDate> = None;
    let mut prev_sender: Option<String> = None;

    for record in records {
        let event = record.event();
        let date = local_date(event.timestamp_ms);

        if prev_date != Some(date) {
            elements.push(ConversationElement::DateSeparator(date_label(date)));
            prev_sender = None;
        }
        prev_date = Some(date);

        let time = time_label(event.timestamp_ms);
        let name = record.avatar().display_name();

        match &event.kind {
            EventKind::ChatMessage(message) => {
                let sender_name = if message.is_outgoing {
                    OUTGOING_SENDER.to_owned()
                } else {
                    name
                };
                let sender = (prev_sender.as_deref() != Some(sender_name.as_str()))
                    .then(|| sender_name.clone());

                elements.push(ConversationElement::Message {
                    time,
                    sender,
                    content: message.text.clone(),
                });
                prev_sender = Some(sender_name);
            }
            EventKind::ParticipantAdded(_) => {
                elements.push(ConversationElement::Notice {
                    time,
                    text: format!("{name} joined"),
                });
                prev_sender = None;
            }
            EventKind::ParticipantRemoved(_) => {
                elements.push(ConversationElement::Notice {
                    time,
                    text: format!("{name} left"),
                });
                prev_sender = None;
            }
            EventKind::SubjectChanged(subject) => {
                elements.push(ConversationElement::Notice {
                    time,
                    text: format!("Subject changed to \"{subject}\""),
                });
                prev_sender = None;
            }
        }
    }

    elements
}

pub fn render_header(snapshot: &ConversationSnapshot) -> Vec<String> {
    let mut title = snapshot.subject().to_owned();
    if title.is_empty() {
        title = snapshot
            .avatar()
            .map(|avatar| avatar.display_name())
            .unwrap_or_default();
    }

    let mut markers = Vec::new();
    if snapshot.is_group() {
        markers.push("group");
    }
    if snapshot.is_read_only() {
        markers.push("read-only");
    }
    if !markers.is_empty() {
        title = format!("{title} ({})", markers.join(", "));
    }

    let mut lines = vec![title];
    if !snapshot.composing_label().is_empty() {
        lines.push(snapshot.composing_label().to_owned());
    }
    lines
}

pub fn render_element(element: &ConversationElement) -> Vec<String> {
    match element {
        ConversationElement::DateSeparator(date) => vec![format!("——— {date} ———")],
        ConversationElement::Notice { time, text } => vec![format!("{time:>5} * {text}")],
        ConversationElement::Message {
            time,
            sender: Some(sender),
            content,
        } => {
            let mut lines = vec![format!("{time:>5} {sender}:")];
            if content.is_empty() {
                lines.push(format!("{INDENT}{EMPTY_MESSAGE}"));
            }
            lines.extend(content.lines().map(|line| format!("{INDENT}{line}")));
            lines
        }
        ConversationElement::Message {
            time,
            sender: None,
            content,
        } => {
            let mut content_lines = content.lines();
            let first = content_lines.next().unwrap_or(EMPTY_MESSAGE);
            let mut lines = vec![format!("{time:>5} {first}")];
            lines.extend(content_lines.map(|line| format!("{INDENT}{line}")));
            lines
        }
    }
}

/// Renders the header followed by every event of `snapshot`.
pub fn render_conversation(snapshot: &ConversationSnapshot) -> String {
    let mut lines = render_header(snapshot);
    lines.extend(
        build_conversation_elements(snapshot.events())
            .iter()
            .flat_map(render_element),
    );
    lines.join("\n")
}
