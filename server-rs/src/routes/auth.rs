use axum::{extract::State, Extension};
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult, ResultExt};
use crate::extract::ApiJson;
use crate::middleware::auth::{generate_tokens, verify_token, AuthUser, TokenType};
use crate::models::*;
use crate::response::ApiResponse;
use crate::store::{StoreError, UserStore};
use crate::AppState;

fn credentials_response(user: &User, state: &AppState) -> AppResult<serde_json::Value> {
    let tokens = generate_tokens(user.id, user.role, &state.config.jwt)?;
    Ok(json!({
        "user": user,
        "token": tokens.access_token,
        "refreshToken": tokens.refresh_token,
    }))
}

fn self_service_role(raw: Option<&str>) -> AppResult<Role> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Role::User);
    };
    match raw.parse::<Role>() {
        Ok(Role::Admin) => Err(AppError::BadRequest(
            "Admin accounts cannot be self-registered".into(),
        )),
        Ok(role) => Ok(role),
        Err(_) => Err(AppError::BadRequest(format!("Invalid role `{raw}`"))),
    }
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> AppResult<ApiResponse> {
    let (Some(email), Some(full_name), Some(password)) = (
        clean(body.email),
        clean(body.full_name),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Email, full name, and password are required".into(),
        ));
    };
    let role = self_service_role(body.role.as_deref())?;
    let email = normalize_email(&email);

    let existing = state
        .store
        .find_user_by_email(&email)
        .await
        .context("Server error during registration")?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "User with this email already exists".into(),
        ));
    }

    let password_hash = bcrypt::hash(&password, state.config.auth.bcrypt_cost)
        .context("Server error during registration")?;

    let user = match state
        .store
        .create_user(NewUser {
            email,
            full_name,
            password_hash,
            role,
            avatar_url: None,
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::BadRequest(
                "User with this email already exists".into(),
            ))
        }
        Err(e) => return Err(e).context("Server error during registration"),
    };

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    Ok(ApiResponse::created(
        "User registered successfully",
        credentials_response(&user, &state)?,
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> AppResult<ApiResponse> {
    let (Some(email), Some(password)) = (clean(body.email), body.password.filter(|p| !p.is_empty()))
    else {
        return Err(AppError::BadRequest(
            "Email and password are required".into(),
        ));
    };

    let invalid = || AppError::Unauthorized("Invalid credentials".into());
    let user = state
        .store
        .find_user_by_email(&normalize_email(&email))
        .await
        .context("Server error during login")?
        .ok_or_else(invalid)?;

    let valid = bcrypt::verify(&password, &user.password_hash).context("Server error during login")?;
    if !valid {
        return Err(invalid());
    }

    Ok(ApiResponse::ok(
        "Login successful",
        credentials_response(&user, &state)?,
    ))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> AppResult<ApiResponse> {
    let token = clean(body.refresh_token)
        .ok_or_else(|| AppError::BadRequest("Refresh token is required".into()))?;

    let claims = verify_token(&token, &state.config.jwt.secret)?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid token subject".into()))?;
    let user = state
        .store
        .find_user(user_id)
        .await
        .context("Server error while refreshing token")?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))?;

    Ok(ApiResponse::ok(
        "Token refreshed successfully",
        credentials_response(&user, &state)?,
    ))
}

/// Tokens are stateless; the client discards them.
pub async fn logout(Extension(user): Extension<AuthUser>) -> ApiResponse {
    tracing::debug!(user_id = %user.id, "user logged out");
    ApiResponse::message("Logged out successfully")
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> AppResult<ApiResponse> {
    let user = state
        .store
        .find_user(auth.id)
        .await
        .context("Server error while fetching profile")?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(ApiResponse::ok("Profile fetched successfully", json!({ "user": user })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<ProfileUpdateRequest>,
) -> AppResult<ApiResponse> {
    let update = ProfileUpdate {
        full_name: body.full_name.map(|n| n.trim().to_string()),
        avatar_url: body.avatar_url.map(clean),
    };

    let updated = if update.is_empty() {
        state.store.find_user(auth.id).await
    } else {
        state.store.update_profile(auth.id, update).await
    };
    let user = updated
        .context("Server error while updating profile")?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(ApiResponse::ok("Profile updated successfully", json!({ "user": user })))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(body): ApiJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse> {
    let (Some(current), Some(new)) = (
        body.current_password.filter(|p| !p.is_empty()),
        body.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Current password and new password are required".into(),
        ));
    };

    let user = state
        .store
        .find_user(auth.id)
        .await
        .context("Server error while changing password")?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    let matches = bcrypt::verify(&current, &user.password_hash)
        .context("Server error while changing password")?;
    if !matches {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    let hash = bcrypt::hash(&new, state.config.auth.bcrypt_cost)
        .context("Server error while changing password")?;
    let updated = state
        .store
        .set_password_hash(user.id, &hash)
        .await
        .context("Server error while changing password")?;
    if !updated {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(user_id = %user.id, "password changed");
    Ok(ApiResponse::message("Password changed successfully"))
}

/// Creates the configured admin account on first start. A no-op when the
/// credentials are unset or the account already exists.
pub async fn bootstrap_admin(state: &AppState) -> AppResult<()> {
    let auth = &state.config.auth;
    let (Some(email), Some(password)) = (&auth.admin_email, &auth.admin_password) else {
        return Ok(());
    };
    let email = normalize_email(email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let user = state
        .store
        .create_user(NewUser {
            email,
            full_name: "Administrator".to_string(),
            password_hash: bcrypt::hash(password, auth.bcrypt_cost)?,
            role: Role::Admin,
            avatar_url: None,
        })
        .await?;
    tracing::info!(user_id = %user.id, email = %user.email, "admin account created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_registration_roles() {
        assert_eq!(self_service_role(None).unwrap(), Role::User);
        assert_eq!(self_service_role(Some(" ")).unwrap(), Role::User);
        assert_eq!(self_service_role(Some("organizer")).unwrap(), Role::Organizer);
        assert!(matches!(
            self_service_role(Some("admin")),
            Err(AppError::BadRequest(_))
        ));
        assert!(self_service_role(Some("wizard")).is_err());
    }
}
