use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::health::health_check;
use super::{
    cycles, days, lifts, lookups, prescriptions, programs, progressions, sessions, users, weeks,
};
use super::AppState;

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/lifts", lifts::lifts_routes())
        .nest("/prescriptions", prescriptions::prescriptions_routes())
        .nest("/days", days::days_routes())
        .nest("/weeks", weeks::weeks_routes())
        .nest("/cycles", cycles::cycles_routes())
        .nest("/weekly-lookups", lookups::weekly_lookups_routes())
        .nest("/daily-lookups", lookups::daily_lookups_routes())
        .nest("/rotation-lookups", lookups::rotation_lookups_routes())
        .nest("/progressions", progressions::progressions_routes())
        .nest("/programs", programs::programs_routes())
        .nest("/users", users::users_routes())
        .nest("/sessions", sessions::sessions_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
