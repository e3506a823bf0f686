//! Persistence seams for events and users.
//!
//! Every mutating event operation validates and writes as one unit: the
//! in-memory stores under a single write guard, the Postgres stores inside
//! one transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::error::{EventResult, UserResult};
use crate::domain::query::EventQuery;
use crate::models::{Event, EventDraft, EventPatch, NewUser, User};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryEventStore, InMemoryUserStore};
pub use postgres::{PgEventStore, PgUserStore};

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn get(&self, id: Uuid) -> EventResult<Option<Event>>;

    /// Filtered and ranked events, see [`crate::domain::query::query`].
    async fn query(
        &self,
        query: &EventQuery,
        viewer: Option<&User>,
        now: DateTime<Utc>,
    ) -> EventResult<Vec<Event>>;

    async fn create(
        &self,
        draft: EventDraft,
        organizer: &User,
        now: DateTime<Utc>,
    ) -> EventResult<Event>;

    /// Fails with `ImmutablePastEvent` before looking at the patch.
    async fn update(&self, id: Uuid, patch: EventPatch, now: DateTime<Utc>) -> EventResult<Event>;

    /// Returns whether an event was removed.
    async fn delete(&self, id: Uuid) -> EventResult<bool>;

    async fn register(&self, id: Uuid, user: &User, now: DateTime<Utc>) -> EventResult<Event>;

    async fn unregister(&self, id: Uuid, user: &User) -> EventResult<Event>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, new_user: NewUser, now: DateTime<Utc>) -> UserResult<User>;

    async fn get(&self, id: Uuid) -> UserResult<Option<User>>;
}
