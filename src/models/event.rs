use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::rules::Schedule;
use crate::models::user::User;
use crate::utils::{datetime, text};

/// An event together with its organizer and participants.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: String,
    pub organizer: User,
    pub participants: Vec<User>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn new(draft: EventDraft, organizer: User, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            start_time: draft.start_time,
            end_time: draft.end_time,
            location: draft.location,
            organizer,
            participants: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites the writable fields. Organizer and participants are kept.
    pub fn apply(&mut self, draft: EventDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.description = draft.description;
        self.start_time = draft.start_time;
        self.end_time = draft.end_time;
        self.location = draft.location;
        self.updated_at = now;
    }

    pub fn schedule(&self) -> Schedule<'_> {
        Schedule {
            start_time: self.start_time,
            end_time: self.end_time,
            location: &self.location,
        }
    }

    pub fn is_organizer(&self, user_id: Uuid) -> bool {
        self.organizer.id == user_id
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }

    /// Upcoming events start at or after `now`.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time >= now
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start_time <= now
    }
}

/// Every writable field of an event. Body of `POST` and `PUT`.
#[derive(Debug, Clone, PartialEq, Deserialize, Validate)]
pub struct EventDraft {
    #[serde(deserialize_with = "text::deserialize_trimmed")]
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "datetime::deserialize")]
    pub start_time: DateTime<Utc>,
    #[serde(deserialize_with = "datetime::deserialize")]
    pub end_time: DateTime<Utc>,
    #[serde(deserialize_with = "text::deserialize_trimmed")]
    #[validate(length(min = 1, max = 255))]
    pub location: String,
}

impl EventDraft {
    pub fn schedule(&self) -> Schedule<'_> {
        Schedule {
            start_time: self.start_time,
            end_time: self.end_time,
            location: &self.location,
        }
    }
}

/// Body of `PATCH`: absent fields keep their current value.
///
/// `description` distinguishes an absent key from an explicit `null`, which
/// clears it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct EventPatch {
    #[serde(default, deserialize_with = "text::deserialize_trimmed_option")]
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "text::deserialize_trimmed_option")]
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
}

impl EventPatch {
    /// The effective field set after applying this patch to `event`.
    pub fn merge(&self, event: &Event) -> EventDraft {
        EventDraft {
            title: self.title.clone().unwrap_or_else(|| event.title.clone()),
            description: match &self.description {
                Some(description) => description.clone(),
                None => event.description.clone(),
            },
            start_time: self.start_time.unwrap_or(event.start_time),
            end_time: self.end_time.unwrap_or(event.end_time),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| event.location.clone()),
        }
    }
}

impl From<EventDraft> for EventPatch {
    fn from(draft: EventDraft) -> Self {
        Self {
            title: Some(draft.title),
            description: Some(draft.description),
            start_time: Some(draft.start_time),
            end_time: Some(draft.end_time),
            location: Some(draft.location),
        }
    }
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}
