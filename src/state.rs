use crate::services::{EventService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub users: UserService,
}

impl AppState {
    pub fn new(events: EventService, users: UserService) -> Self {
        Self { events, users }
    }
}
