use axum::extract::State;
use axum::response::Response;

use crate::extract::{CurrentUser, ValidatedJson};
use crate::models::NewUser;
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub async fn register_user(
    State(state): State<AppState>,
    ValidatedJson(new_user): ValidatedJson<NewUser>,
) -> Result<Response, AppError> {
    let user = state.users.create(new_user).await?;
    Ok(created(user, "User created successfully"))
}

pub async fn current_user(CurrentUser(user): CurrentUser) -> Response {
    success(user, "Current user retrieved successfully")
}
