use axum::http::StatusCode;

pub mod billing;
pub mod files;
pub mod fragments;
pub mod patients;
pub mod prescriptions;
pub mod steps;

/// Primes the anti-forgery cookie; the middleware attaches it.
pub async fn csrf() -> StatusCode {
    StatusCode::NO_CONTENT
}
