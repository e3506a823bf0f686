use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::query::{EventFilter, EventQuery, SortKey};
use crate::domain::view::{EventView, ViewMode};
use crate::extract::{CurrentUser, ValidatedJson};
use crate::models::{EventDraft, EventPatch};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::pagination::{Page, PageRequest};
use crate::utils::response::{created, success};

/// Query string of `GET /api/events`. Empty values count as absent.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsParams {
    pub title: Option<String>,
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub participating: Option<String>,
    pub organizing: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

impl ListEventsParams {
    fn query(&self) -> Result<EventQuery, AppError> {
        let start_date = match non_empty(&self.start_date) {
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                AppError::ValidationError(format!("start_date '{raw}' is not a YYYY-MM-DD date"))
            })?),
            None => None,
        };

        Ok(EventQuery {
            filter: EventFilter {
                title: non_empty(&self.title).map(str::to_string),
                organizer: non_empty(&self.organizer).map(str::to_string),
                location: non_empty(&self.location).map(str::to_string),
                start_date,
                participating: flag("participating", &self.participating)?,
                organizing: flag("organizing", &self.organizing)?,
            },
            ordering: non_empty(&self.ordering)
                .map(SortKey::parse_list)
                .unwrap_or_default(),
        })
    }

    fn page(&self) -> Result<PageRequest, AppError> {
        let page = match non_empty(&self.page) {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| AppError::NotFound(format!("Invalid page '{raw}'")))?,
            ),
            None => None,
        };
        let per_page = non_empty(&self.per_page).and_then(|raw| raw.parse().ok());

        Ok(PageRequest::new(page, per_page))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn flag(name: &str, value: &Option<String>) -> Result<Option<bool>, AppError> {
    let Some(raw) = non_empty(value) else {
        return Ok(None);
    };

    match raw.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(Some(true)),
        "false" | "0" | "no" => Ok(Some(false)),
        _ => Err(AppError::ValidationError(format!(
            "{name} must be a boolean, got '{raw}'"
        ))),
    }
}

pub async fn list_events(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<ListEventsParams>,
    viewer: Option<CurrentUser>,
) -> Result<Response, AppError> {
    let query = params.query()?;
    let viewer = viewer.map(|CurrentUser(user)| user);

    let events = state.events.list(&query, viewer.as_ref()).await?;
    let page = Page::paginate(events, params.page()?, &uri)?
        .map(|event| EventView::render(&event, ViewMode::List));

    Ok(success(page, "Events retrieved successfully"))
}

pub async fn create_event(
    State(state): State<AppState>,
    CurrentUser(organizer): CurrentUser,
    ValidatedJson(draft): ValidatedJson<EventDraft>,
) -> Result<Response, AppError> {
    let event = state.events.create(draft, &organizer).await?;
    Ok(created(
        EventView::render(&event, ViewMode::Write),
        "Event created successfully",
    ))
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = state.events.get(id).await?;
    Ok(success(
        EventView::render(&event, ViewMode::Detail),
        "Event retrieved successfully",
    ))
}

/// `PUT`: every writable field is required.
pub async fn replace_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(draft): ValidatedJson<EventDraft>,
) -> Result<Response, AppError> {
    let event = state.events.update(id, draft.into(), &actor).await?;
    Ok(success(
        EventView::render(&event, ViewMode::Write),
        "Event updated successfully",
    ))
}

pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(actor): CurrentUser,
    ValidatedJson(patch): ValidatedJson<EventPatch>,
) -> Result<Response, AppError> {
    let event = state.events.update(id, patch, &actor).await?;
    Ok(success(
        EventView::render(&event, ViewMode::Write),
        "Event updated successfully",
    ))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(actor): CurrentUser,
) -> Result<Response, AppError> {
    state.events.delete(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn register(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let event = state.events.register(id, &user).await?;
    Ok(success(
        EventView::render(&event, ViewMode::Detail),
        "Successfully registered for the event.",
    ))
}

pub async fn unregister(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, AppError> {
    let event = state.events.unregister(id, &user).await?;
    Ok(success(
        EventView::render(&event, ViewMode::Detail),
        "Successfully unregistered from the event.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::SortField;

    #[test]
    fn test_params_build_query() {
        let params = ListEventsParams {
            title: Some("launch".into()),
            location: Some("  ".into()),
            start_date: Some("2024-12-20".into()),
            organizing: Some("True".into()),
            participating: Some("false".into()),
            ordering: Some("-title,bogus".into()),
            ..ListEventsParams::default()
        };

        let query = params.query().unwrap();
        assert_eq!(query.filter.title.as_deref(), Some("launch"));
        assert_eq!(query.filter.location, None);
        assert_eq!(query.filter.start_date, NaiveDate::from_ymd_opt(2024, 12, 20));
        assert_eq!(query.filter.organizing, Some(true));
        assert_eq!(query.filter.participating, Some(false));
        assert_eq!(query.ordering, vec![SortKey::desc(SortField::Title)]);
    }

    #[test]
    fn test_params_reject_bad_date_and_page() {
        let params = ListEventsParams {
            start_date: Some("20/12/2024".into()),
            page: Some("two".into()),
            per_page: Some("lots".into()),
            ..ListEventsParams::default()
        };

        assert!(matches!(params.query(), Err(AppError::ValidationError(_))));
        assert!(matches!(params.page(), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_params_reject_non_boolean_flag() {
        let params = ListEventsParams {
            participating: Some("maybe".into()),
            ..ListEventsParams::default()
        };
        assert!(matches!(params.query(), Err(AppError::ValidationError(_))));

        let params = ListEventsParams {
            organizing: Some("0".into()),
            ..ListEventsParams::default()
        };
        assert_eq!(params.query().unwrap().filter.organizing, Some(false));
    }
}
