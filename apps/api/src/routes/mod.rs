pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            post(handlers::handle_generate).get(handlers::handle_list),
        )
        .route("/api/v1/resumes/preview", post(handlers::handle_preview))
        .route("/api/v1/resumes/improve", post(handlers::handle_improve))
        .route(
            "/api/v1/resumes/:code",
            get(handlers::handle_get)
                .put(handlers::handle_update)
                .delete(handlers::handle_delete),
        )
        .with_state(state)
}
