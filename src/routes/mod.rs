use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{events, health_check, users};
use crate::state::AppState;

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(users::register_user))
        .route("/users/me", get(users::current_user))
        .route("/events", get(events::list_events).post(events::create_event))
        .route(
            "/events/:id",
            get(events::get_event)
                .put(events::replace_event)
                .patch(events::update_event)
                .delete(events::delete_event),
        )
        .route("/events/:id/register", post(events::register))
        .route("/events/:id/unregister", post(events::unregister))
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
}
