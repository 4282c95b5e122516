//! Anti-forgery check: double-submit cookie.
//!
//! Safe requests are issued a `csrftoken` cookie when they arrive without
//! one. Mutations must echo that cookie in the `X-CSRFToken` header.

use axum::extract::Request;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};
use ulid::Ulid;

use crate::error::ApiError;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "x-csrftoken";

pub fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix("csrftoken="))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

pub async fn protect(request: Request, next: Next) -> Response {
    let cookie = cookie_token(request.headers());

    if is_safe(request.method()) {
        let mut response = next.run(request).await;
        if cookie.is_none() {
            let token = Ulid::new().to_string();
            debug!("issuing {} cookie", CSRF_COOKIE);
            let value = format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Lax");
            if let Ok(value) = HeaderValue::from_str(&value) {
                response.headers_mut().append(SET_COOKIE, value);
            }
        }
        return response;
    }

    let header = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    let valid = matches!((cookie.as_deref(), header), (Some(c), Some(h)) if c == h);

    if valid {
        return next.run(request).await;
    }

    warn!(
        method = %request.method(),
        path = %request.uri().path(),
        "rejected request without a valid anti-forgery token"
    );
    ApiError::Forbidden("CSRF token missing or incorrect".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("sessionid=s1; csrftoken=abc; theme=dark"),
        );
        assert_eq!(cookie_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn empty_token_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("csrftoken="));
        assert_eq!(cookie_token(&headers), None);
        assert_eq!(cookie_token(&HeaderMap::new()), None);
    }
}
