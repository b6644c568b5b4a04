//! Admin dashboard API: password-gated stats, visitor management,
//! knowledge uploads and exports.
//!
//! There are no admin accounts: a single shared password from `ADMIN_PASSWORD`
//! is sent with every request, either as `x-admin-password` or as a bearer token.

use axum::http::{header, HeaderMap};

use crate::errors::AppError;

pub mod export;
pub mod handlers;

pub const PASSWORD_HEADER: &str = "x-admin-password";

/// Accepts the request if it carries the admin password, otherwise `AppError::Unauthorized`.
pub fn require_admin(headers: &HeaderMap, admin_password: &str) -> Result<(), AppError> {
    let supplied = headers
        .get(PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        });

    match supplied {
        Some(password) if password_matches(password, admin_password) => Ok(()),
        _ => Err(AppError::Unauthorized),
    }
}

/// Compares without short-circuiting on the first differing byte.
pub fn password_matches(supplied: &str, expected: &str) -> bool {
    let (a, b) = (supplied.as_bytes(), expected.as_bytes());
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
