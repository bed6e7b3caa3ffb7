pub mod auth;
pub mod health;
pub mod matches;
pub mod news;
pub mod tournaments;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, Tournament};

/// Parses a path or body id, rejecting malformed values with
/// "Invalid <label> ID".
pub(crate) fn parse_id(raw: &str, label: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::BadRequest(format!("Invalid {label} ID")))
}

/// Like [`parse_id`] for optional query/body fields.
pub(crate) fn parse_opt_id(raw: Option<&str>, label: &str) -> AppResult<Option<Uuid>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_id(s, label).map(Some),
        None => Ok(None),
    }
}

/// Organizers manage their own tournaments; admins manage all of them.
pub(crate) fn ensure_owner(user: &AuthUser, tournament: &Tournament) -> AppResult<()> {
    if user.role == Role::Admin || tournament.organizer_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only manage your own tournaments".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_ids_name_the_resource() {
        match parse_id("not-a-uuid", "tournament") {
            Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid tournament ID"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(parse_opt_id(Some("  "), "match").unwrap().is_none());
        let id = Uuid::new_v4();
        assert_eq!(parse_opt_id(Some(&id.to_string()), "match").unwrap(), Some(id));
    }
}
