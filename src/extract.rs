//! Request extractors: caller identity and validated JSON bodies.

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use validator::Validate;

use crate::models::User;
use crate::state::AppState;
use crate::utils::error::AppError;

/// Header carrying the caller's user id, set by the upstream identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller.
///
/// Handlers that only need an optional viewer take `Option<CurrentUser>`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::AuthError(format!("Missing {USER_ID_HEADER} header")))?;

        let id = Uuid::parse_str(raw.trim())
            .map_err(|_| AppError::AuthError(format!("Invalid {USER_ID_HEADER} header")))?;

        let user = state
            .users
            .get(id)
            .await?
            .ok_or_else(|| AppError::AuthError("Unknown user".into()))?;

        Ok(CurrentUser(user))
    }
}

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::ValidationError(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
