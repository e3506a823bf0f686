pub mod events;
pub mod users;

pub use events::EventService;
pub use users::UserService;
