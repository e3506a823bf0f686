use serde::Serialize;
use uuid::Uuid;

use crate::models::Event;
use crate::utils::datetime;

/// Shape of an event in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// Event list: display timestamps, participant count.
    List,
    /// Single event: display timestamps, participant names.
    Detail,
    /// Create/update echo: RFC 3339 timestamps, participant count.
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ParticipantsView {
    Count(usize),
    Names(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub organizer: String,
    pub participants: ParticipantsView,
}

impl EventView {
    pub fn render(event: &Event, mode: ViewMode) -> Self {
        let (start_time, end_time) = match mode {
            ViewMode::List | ViewMode::Detail => (
                datetime::display(&event.start_time),
                datetime::display(&event.end_time),
            ),
            ViewMode::Write => (event.start_time.to_rfc3339(), event.end_time.to_rfc3339()),
        };

        let participants = match mode {
            ViewMode::Detail => ParticipantsView::Names(
                event.participants.iter().map(|p| p.display_name()).collect(),
            ),
            ViewMode::List | ViewMode::Write => ParticipantsView::Count(event.participants.len()),
        };

        Self {
            id: event.id,
            title: event.title.clone(),
            description: event.description.clone(),
            start_time,
            end_time,
            location: event.location.clone(),
            organizer: event.organizer.display_name(),
            participants,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, event, user};
    use serde_json::json;

    #[test]
    fn test_render_modes() {
        let alice = user("alice");
        let bob = user("bob");
        let mut meetup = event(
            "Meetup",
            "Cafe",
            at("2024-12-20 08:00"),
            at("2024-12-20 09:30"),
            &alice,
        );
        meetup.participants.push(bob);

        let list = EventView::render(&meetup, ViewMode::List);
        assert_eq!(list.start_time, "20 Dec 2024 08:00");
        assert_eq!(list.end_time, "20 Dec 2024 09:30");
        assert_eq!(list.organizer, "alice (alice@example.com)");
        assert_eq!(list.participants, ParticipantsView::Count(1));

        let detail = EventView::render(&meetup, ViewMode::Detail);
        assert_eq!(detail.start_time, list.start_time);
        assert_eq!(
            detail.participants,
            ParticipantsView::Names(vec!["bob (bob@example.com)".to_string()])
        );

        let write = EventView::render(&meetup, ViewMode::Write);
        assert_eq!(write.start_time, "2024-12-20T08:00:00+00:00");
        assert_eq!(write.participants, ParticipantsView::Count(1));
    }

    #[test]
    fn test_participants_serialize_untagged() {
        assert_eq!(serde_json::to_value(ParticipantsView::Count(3)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(ParticipantsView::Names(vec!["a (a@b.c)".into()])).unwrap(),
            json!(["a (a@b.c)"])
        );
    }
}
