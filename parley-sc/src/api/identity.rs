//! Verified-identity plumbing
//!
//! Authentication itself is an external collaborator: an upstream auth layer
//! verifies credentials and forwards the resulting identity in a trusted
//! header. These middlewares only lift that identity into request extensions
//! and reject requests that arrive without one.

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;

/// Header carrying the verified student id, set by the auth proxy
pub const STUDENT_HEADER: &str = "x-parley-student";

/// Header carrying the verified admin id, set by the auth proxy
pub const ADMIN_HEADER: &str = "x-parley-admin";

#[derive(Debug, Clone)]
pub struct StudentIdentity(pub String);

#[derive(Debug, Clone)]
pub struct AdminIdentity(pub String);

pub async fn require_student(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let student_id = header_value(&request, STUDENT_HEADER).ok_or_else(|| {
        ApiError::Forbidden("No verified student identity on request".to_string())
    })?;

    request.extensions_mut().insert(StudentIdentity(student_id));
    Ok(next.run(request).await)
}

pub async fn require_admin(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let admin_id = header_value(&request, ADMIN_HEADER)
        .ok_or_else(|| ApiError::Forbidden("No verified admin identity on request".to_string()))?;

    request.extensions_mut().insert(AdminIdentity(admin_id));
    Ok(next.run(request).await)
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}
