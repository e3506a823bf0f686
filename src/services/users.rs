use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::error::UserResult;
use crate::models::{NewUser, User};
use crate::store::UserStore;

/// User directory backed by a [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create(&self, new_user: NewUser) -> UserResult<User> {
        self.store.create(new_user, self.clock.now()).await
    }

    pub async fn get(&self, id: Uuid) -> UserResult<Option<User>> {
        self.store.get(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::FixedClock;
    use crate::store::InMemoryUserStore;
    use crate::test_support::now;

    #[tokio::test]
    async fn test_create_stamps_clock_time() {
        let service = UserService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(FixedClock(now())),
        );

        let user = service
            .create(NewUser {
                username: " carol ".into(),
                email: "Carol@Example.com".into(),
            })
            .await
            .unwrap();

        assert_eq!(user.username, "carol");
        assert_eq!(user.email, "carol@example.com");
        assert_eq!(user.created_at, now());
        assert_eq!(service.get(user.id).await.unwrap(), Some(user));
    }
}
