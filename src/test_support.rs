//! Fixtures shared by unit tests.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Event, EventDraft, User};
use crate::utils::datetime::parse_timestamp;

/// Reference "now" used across tests: 13 Dec 2024 10:00 UTC.
pub fn now() -> DateTime<Utc> {
    at("2024-12-13 10:00")
}

pub fn at(raw: &str) -> DateTime<Utc> {
    parse_timestamp(raw).unwrap_or_else(|| panic!("bad fixture timestamp {raw}"))
}

pub fn user(username: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{}@example.com", username.to_lowercase()),
        created_at: at("2024-01-01 00:00"),
    }
}

pub fn draft(title: &str, location: &str, start: &str, end: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        description: Some(format!("About {title}")),
        start_time: at(start),
        end_time: at(end),
        location: location.to_string(),
    }
}

pub fn event(
    title: &str,
    location: &str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    organizer: &User,
) -> Event {
    Event::new(
        EventDraft {
            title: title.to_string(),
            description: Some(format!("About {title}")),
            start_time,
            end_time,
            location: location.to_string(),
        },
        organizer.clone(),
        at("2024-12-01 00:00"),
    )
}
