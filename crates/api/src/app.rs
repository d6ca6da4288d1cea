use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use domain::services::{
    ConfirmationReconciler, ConfirmationStore, GuestStore, PhoneCanonicalizer,
};
use domain::ValidationError;
use persistence::repositories::{ConfirmationRepository, GuestRepository};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{confirmations, guests, health};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub guests: Arc<dyn GuestStore>,
    pub confirmations: Arc<dyn ConfirmationStore>,
    pub canonicalizer: Arc<PhoneCanonicalizer>,
    pub reconciler: Arc<ConfirmationReconciler>,
}

impl AppState {
    /// Builds the shared state; fails when the configured dialing plan is invalid.
    pub fn new(
        config: Config,
        guests: Arc<dyn GuestStore>,
        confirmations: Arc<dyn ConfirmationStore>,
    ) -> Result<Self, ValidationError> {
        let canonicalizer = PhoneCanonicalizer::new(config.phone.clone())?;
        let reconciler = ConfirmationReconciler::new(config.confirmations.clone());

        Ok(Self {
            config: Arc::new(config),
            guests,
            confirmations,
            canonicalizer: Arc::new(canonicalizer),
            reconciler: Arc::new(reconciler),
        })
    }
}

/// Builds the state on top of the PostgreSQL repositories.
pub fn create_app_with_pool(config: Config, pool: PgPool) -> Result<Router, ValidationError> {
    let state = AppState::new(
        config,
        Arc::new(GuestRepository::new(pool.clone())),
        Arc::new(ConfirmationRepository::new(pool)),
    )?;
    Ok(create_app(state))
}

pub fn create_app(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    let guest_routes = Router::new()
        .route("/api/v1/guests/import", post(guests::import_guests))
        .route(
            "/api/v1/guests/phones/renormalize",
            post(guests::renormalize_phones),
        )
        .route(
            "/api/v1/guests/:guest_id/events/:event_id/confirmation",
            get(confirmations::get_confirmation).put(confirmations::put_confirmation),
        )
        .route(
            "/api/v1/guests/:guest_id/confirmations",
            get(confirmations::list_guest_confirmations),
        );

    let event_routes = Router::new()
        .route(
            "/api/v1/events/:event_id/confirmations",
            get(confirmations::list_event_confirmations),
        )
        .route(
            "/api/v1/events/:event_id/confirmations/summary",
            get(confirmations::get_event_summary),
        );

    // Public routes (no authentication in this service)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(guest_routes)
        .merge(event_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware)) // Prometheus metrics
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .with_state(state)
}
