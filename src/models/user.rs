use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::utils::text;

/// An account known to the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(new_user: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: new_user.username.trim().to_string(),
            email: new_user.email.trim().to_lowercase(),
            created_at: now,
        }
    }

    /// `"username (email)"`, the form shown to other users.
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.username, self.email)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewUser {
    #[serde(deserialize_with = "text::deserialize_trimmed")]
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[serde(deserialize_with = "text::deserialize_trimmed")]
    #[validate(email)]
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_normalizes_email() {
        let user = User::new(
            NewUser {
                username: " digital_dragon ".into(),
                email: "Dragon@Example.COM".into(),
            },
            Utc::now(),
        );

        assert_eq!(user.username, "digital_dragon");
        assert_eq!(user.email, "dragon@example.com");
        assert_eq!(user.display_name(), "digital_dragon (dragon@example.com)");
    }

    #[test]
    fn test_new_user_validation() {
        let invalid = NewUser {
            username: String::new(),
            email: "not-an-email".into(),
        };
        let errors = invalid.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
    }
}
