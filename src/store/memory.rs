use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::error::{EventError, EventResult, UserError, UserResult};
use crate::domain::query::{self, EventQuery};
use crate::domain::rules;
use crate::models::{Event, EventDraft, EventPatch, NewUser, User};
use crate::store::{EventStore, UserStore};

/// In-memory event store for development and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<HashMap<Uuid, Event>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn get(&self, id: Uuid) -> EventResult<Option<Event>> {
        let events = self.events.read().await;
        Ok(events.get(&id).cloned())
    }

    async fn query(
        &self,
        event_query: &EventQuery,
        viewer: Option<&User>,
        now: DateTime<Utc>,
    ) -> EventResult<Vec<Event>> {
        let events = self.events.read().await;
        Ok(query::query(events.values().cloned(), event_query, viewer, now))
    }

    async fn create(
        &self,
        draft: EventDraft,
        organizer: &User,
        now: DateTime<Utc>,
    ) -> EventResult<Event> {
        let mut events = self.events.write().await;

        rules::validate(&draft.schedule(), events.values(), None, now)?;

        let event = Event::new(draft, organizer.clone(), now);
        events.insert(event.id, event.clone());

        tracing::info!(event_id = %event.id, organizer_id = %organizer.id, "Created event");
        Ok(event)
    }

    async fn update(&self, id: Uuid, patch: EventPatch, now: DateTime<Utc>) -> EventResult<Event> {
        let mut events = self.events.write().await;

        let mut event = events.get(&id).cloned().ok_or(EventError::NotFound(id))?;
        rules::ensure_mutable(&event, now)?;

        let merged = patch.merge(&event);
        rules::validate(&merged.schedule(), events.values(), Some(id), now)?;

        event.apply(merged, now);
        events.insert(id, event.clone());

        tracing::info!(event_id = %id, "Updated event");
        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> EventResult<bool> {
        let mut events = self.events.write().await;
        Ok(events.remove(&id).is_some())
    }

    async fn register(&self, id: Uuid, user: &User, now: DateTime<Utc>) -> EventResult<Event> {
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or(EventError::NotFound(id))?;

        rules::ensure_can_register(event, user, now)?;
        event.participants.push(user.clone());

        Ok(event.clone())
    }

    async fn unregister(&self, id: Uuid, user: &User) -> EventResult<Event> {
        let mut events = self.events.write().await;
        let event = events.get_mut(&id).ok_or(EventError::NotFound(id))?;

        rules::ensure_registered(event, user)?;
        event.participants.retain(|p| p.id != user.id);

        Ok(event.clone())
    }
}

/// In-memory user directory for development and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser, now: DateTime<Utc>) -> UserResult<User> {
        let mut users = self.users.write().await;
        let user = User::new(new_user, now);

        if users.values().any(|u| u.username == user.username) {
            return Err(UserError::DuplicateUsername(user.username));
        }
        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::DuplicateEmail(user.email));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }
}
