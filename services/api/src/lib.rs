//! Orthotics portal REST API.

/// Service configuration
pub mod config;

/// API errors
pub mod error;

/// Shared handler state
pub mod state;

/// Anti-forgery middleware
pub mod csrf;

pub mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tower::ServiceBuilder;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Scans are whole-foot meshes; allow well past axum's 2 MB default.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn app(state: AppState) -> Router {
    let steps_path = format!("/{}/steps/:file", state.config.portal_prefix);

    let api = Router::new()
        .route("/api/csrf/", get(routes::csrf))
        .route(
            "/api/patients/",
            get(routes::patients::list).post(routes::patients::create),
        )
        .route("/api/patients/:id/", get(routes::patients::get))
        .route(
            "/api/prescriptions/",
            get(routes::prescriptions::list).post(routes::prescriptions::create),
        )
        .route(
            "/api/prescriptions/submit/",
            post(routes::prescriptions::submit),
        )
        .route(
            "/api/prescriptions/:id/",
            get(routes::prescriptions::get).put(routes::prescriptions::update),
        )
        .route(
            "/api/prescriptions/:id/scans/",
            get(routes::files::list_scans).post(routes::files::upload_scans),
        )
        .route(
            "/api/prescriptions/:id/attachments/",
            post(routes::files::upload_attachment),
        )
        .route(
            "/api/prescriptions/:id/:resource/",
            get(routes::steps::fetch)
                .post(routes::steps::save)
                .put(routes::steps::save),
        )
        .route("/api/orders/", get(routes::billing::list_orders))
        .route("/api/invoices/", get(routes::billing::list_invoices))
        .route("/api/invoices/:id/", get(routes::billing::get_invoice))
        .route(&steps_path, get(routes::fragments::step));

    api.layer(
        ServiceBuilder::new()
            .layer(middleware::from_fn(csrf::protect))
            .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
    .with_state(state)
}
