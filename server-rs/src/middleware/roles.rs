use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::AppError;
use crate::middleware::auth::AuthUser;

/// Middleware: requires the organizer role or higher. Must run after
/// `authenticate`. Use via `axum::middleware::from_fn(require_organizer)`.
pub async fn require_organizer(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))?;

    if !user.role.can_manage() {
        return Err(AppError::Forbidden(
            "Requires organizer role or higher".into(),
        ));
    }

    Ok(next.run(req).await)
}
