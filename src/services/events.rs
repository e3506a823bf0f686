use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::error::{EventError, EventResult};
use crate::domain::query::EventQuery;
use crate::domain::rules;
use crate::models::{Event, EventDraft, EventPatch, User};
use crate::notify::{templates, MailQueue};
use crate::store::EventStore;

/// Event operations: access checks, store calls and notifications.
///
/// Every operation reads the clock once and passes that instant down.
#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    mail: MailQueue,
}

impl EventService {
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>, mail: MailQueue) -> Self {
        Self { store, clock, mail }
    }

    pub async fn get(&self, id: Uuid) -> EventResult<Event> {
        self.store.get(id).await?.ok_or(EventError::NotFound(id))
    }

    #[instrument(skip(self, query, viewer))]
    pub async fn list(&self, query: &EventQuery, viewer: Option<&User>) -> EventResult<Vec<Event>> {
        self.store.query(query, viewer, self.clock.now()).await
    }

    #[instrument(skip(self, draft, organizer), fields(organizer_id = %organizer.id))]
    pub async fn create(&self, draft: EventDraft, organizer: &User) -> EventResult<Event> {
        let event = self.store.create(draft, organizer, self.clock.now()).await?;
        self.mail.enqueue(templates::created(&event));
        Ok(event)
    }

    /// Organizer only. `PUT` passes a full patch, `PATCH` a partial one.
    #[instrument(skip(self, patch, actor), fields(actor_id = %actor.id))]
    pub async fn update(&self, id: Uuid, patch: EventPatch, actor: &User) -> EventResult<Event> {
        let current = self.get(id).await?;
        rules::ensure_organizer(&current, actor)?;

        let event = self.store.update(id, patch, self.clock.now()).await?;
        self.mail.enqueue(templates::updated(&event));
        Ok(event)
    }

    #[instrument(skip(self, actor), fields(actor_id = %actor.id))]
    pub async fn delete(&self, id: Uuid, actor: &User) -> EventResult<()> {
        let current = self.get(id).await?;
        rules::ensure_organizer(&current, actor)?;

        if !self.store.delete(id).await? {
            return Err(EventError::NotFound(id));
        }

        info!(event_id = %id, "Deleted event");
        Ok(())
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn register(&self, id: Uuid, user: &User) -> EventResult<Event> {
        let event = self.store.register(id, user, self.clock.now()).await?;
        self.mail.enqueue(templates::registered(&event, user));

        info!(event_id = %id, "User registered for event");
        Ok(event)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn unregister(&self, id: Uuid, user: &User) -> EventResult<Event> {
        let event = self.store.unregister(id, user).await?;
        self.mail.enqueue(templates::unregistered(&event, user));

        info!(event_id = %id, "User unregistered from event");
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::notify::Notification;
    use crate::store::InMemoryEventStore;
    use crate::test_support::{at, draft, now, user};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn service() -> (EventService, UnboundedReceiver<Notification>) {
        let (mail, receiver) = MailQueue::channel();
        let service = EventService::new(
            Arc::new(InMemoryEventStore::new()),
            Arc::new(FixedClock(now())),
            mail,
        );
        (service, receiver)
    }

    #[tokio::test]
    async fn test_create_notifies_organizer() {
        let (service, mut mail) = service();
        let alice = user("alice");

        let event = service
            .create(draft("Launch", "Hall", "2025-01-01 10:00", "2025-01-01 12:00"), &alice)
            .await
            .unwrap();

        let sent = mail.try_recv().unwrap();
        assert_eq!(sent.recipients, vec![alice.email.clone()]);
        assert!(sent.subject.contains("Launch"));
        assert_eq!(service.get(event.id).await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_only_organizer_may_change_event() {
        let (service, _mail) = service();
        let alice = user("alice");
        let bob = user("bob");
        let event = service
            .create(draft("Launch", "Hall", "2025-01-01 10:00", "2025-01-01 12:00"), &alice)
            .await
            .unwrap();

        let patch = EventPatch {
            title: Some("Hijacked".into()),
            ..EventPatch::default()
        };
        let result = service.update(event.id, patch, &bob).await;
        assert!(matches!(result, Err(EventError::NotOrganizer)));

        let result = service.delete(event.id, &bob).await;
        assert!(matches!(result, Err(EventError::NotOrganizer)));

        service.delete(event.id, &alice).await.unwrap();
        let result = service.get(event.id).await;
        assert!(matches!(result, Err(EventError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_notifies_participants_only() {
        let (service, mut mail) = service();
        let alice = user("alice");
        let bob = user("bob");
        let event = service
            .create(draft("Launch", "Hall", "2025-01-01 10:00", "2025-01-01 12:00"), &alice)
            .await
            .unwrap();
        let _created = mail.try_recv().unwrap();

        let patch = EventPatch {
            title: Some("Launch v2".into()),
            ..EventPatch::default()
        };
        service.update(event.id, patch.clone(), &alice).await.unwrap();
        assert!(mail.try_recv().is_err());

        service.register(event.id, &bob).await.unwrap();
        let _registered = mail.try_recv().unwrap();

        let updated = service.update(event.id, patch, &alice).await.unwrap();
        assert_eq!(updated.end_time, at("2025-01-01 12:00"));
        let sent = mail.try_recv().unwrap();
        assert_eq!(sent.recipients, vec![bob.email.clone()]);
    }

    #[tokio::test]
    async fn test_register_rules_and_notifications() {
        let (service, mut mail) = service();
        let alice = user("alice");
        let bob = user("bob");
        let event = service
            .create(draft("Meetup", "Cafe", "2024-12-20 08:00", "2024-12-20 09:00"), &alice)
            .await
            .unwrap();
        let _created = mail.try_recv().unwrap();

        let own = service.register(event.id, &alice).await;
        assert!(matches!(own, Err(EventError::IsOrganizer)));

        let joined = service.register(event.id, &bob).await.unwrap();
        assert_eq!(joined.participants, vec![bob.clone()]);
        assert_eq!(mail.try_recv().unwrap().recipients, vec![bob.email.clone()]);

        let left = service.unregister(event.id, &bob).await.unwrap();
        assert!(left.participants.is_empty());
        assert_eq!(mail.try_recv().unwrap().recipients, vec![bob.email.clone()]);

        let again = service.unregister(event.id, &bob).await;
        assert!(matches!(again, Err(EventError::NotRegistered)));
        assert!(mail.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_list_uses_clock_for_ranking() {
        let alice = user("alice");
        let store = InMemoryEventStore::new();
        let past = store
            .create(
                draft("Past", "Hall", "2024-12-01 10:00", "2024-12-01 11:00"),
                &alice,
                at("2024-11-01 00:00"),
            )
            .await
            .unwrap();
        let upcoming = store
            .create(draft("Soon", "Hall", "2024-12-20 10:00", "2024-12-20 11:00"), &alice, now())
            .await
            .unwrap();
        let (mail, _receiver) = MailQueue::channel();
        let service = EventService::new(Arc::new(store), Arc::new(FixedClock(now())), mail);

        let events = service.list(&EventQuery::default(), None).await.unwrap();
        let ids: Vec<Uuid> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![upcoming.id, past.id]);
    }
}
