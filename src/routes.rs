// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, category, challenge, docs, leaderboard, profile, question},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Everything lives under `/api`, paths keep their trailing slash.
/// * Player routes sit behind `auth_middleware`; `/api/admin` additionally behind `admin_middleware`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let public_routes = Router::new()
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/auth/refresh/", post(auth::refresh))
        .route("/categories/", get(category::list_categories))
        .route("/categories/{slug}/", get(category::get_category))
        .route(
            "/categories/{slug}/questions/",
            get(category::category_questions),
        )
        .route("/questions/", get(question::list_questions))
        .route("/questions/{id}/", get(question::get_question))
        .route("/leaderboard/", get(leaderboard::get_leaderboard))
        .route("/openapi.json", get(docs::openapi_json));

    // Protected player routes
    let user_routes = Router::new()
        .route(
            "/user/profile/",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/questions/{id}/submit/", post(question::submit_answer))
        .route(
            "/challenges/",
            get(challenge::list_challenges).post(challenge::create_challenge),
        )
        .route("/challenges/{id}/", get(challenge::get_challenge))
        .route("/challenges/{id}/status/", get(challenge::challenge_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route(
            "/questions/",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/questions/{id}/",
            get(admin::get_question)
                .put(admin::update_question)
                .delete(admin::delete_question),
        )
        .route(
            "/categories/",
            get(admin::list_categories).post(admin::create_category),
        )
        .route(
            "/categories/{id}/",
            get(admin::get_category)
                .put(admin::update_category)
                .delete(admin::delete_category),
        )
        .route("/users/", get(admin::list_users))
        .route("/users/{id}/", get(admin::get_user))
        .route("/users/{id}/toggle_active/", patch(admin::toggle_active))
        .route("/users/{id}/change_role/", patch(admin::change_role))
        .route("/dashboard/stats/", get(admin::dashboard_stats))
        .route("/scores/", delete(admin::purge_scores))
        .route(
            "/challenges/{id}/status/",
            patch(admin::transition_challenge),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api = public_routes
        .merge(user_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
