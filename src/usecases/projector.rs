//! Turns engine history into presentation records and computes the
//! composing label.

use std::sync::Arc;

use crate::{
    domain::{
        address::SipAddress,
        composing::ComposingTemplate,
        avatar::AvatarModel,
        event_log::{EventLog, EventLogRecord},
    },
    usecases::avatar_cache::AvatarCache,
};

/// Pairs `event` with the cached avatar of its originator. Events without an
/// originator get a placeholder owned by the record itself.
pub fn project_event(avatars: &mut AvatarCache, event: EventLog) -> Arc<EventLogRecord> {
    let avatar = event
        .origin_address()
        .map(|origin| avatars.resolve(Some(origin)));

    let record = match avatar {
        Some(avatar) => EventLogRecord::new(event, avatar),
        None => EventLogRecord::with_owned_avatar(event, Arc::new(AvatarModel::placeholder())),
    };

    Arc::new(record)
}

/// Projects `events` in source order.
pub fn project_events<I>(avatars: &mut AvatarCache, events: I) -> Vec<Arc<EventLogRecord>>
where
    I: IntoIterator<Item = EventLog>,
{
    events
        .into_iter()
        .map(|event| project_event(avatars, event))
        .collect()
}

pub fn composing_label(
    avatars: &mut AvatarCache,
    composing: &[SipAddress],
    template: &ComposingTemplate,
) -> String {
    let names = composing
        .iter()
        .map(|address| {
            avatars
                .resolve(Some(address))
                .name()
                .map(str::to_owned)
                .unwrap_or_else(|| address.formatted_name())
        })
        .collect::<Vec<_>>();

    template.format(&names)
}
