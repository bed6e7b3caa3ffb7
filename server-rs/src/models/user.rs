use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{de_nullable, SchemaCheck, UnknownVariant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }

    /// Organizers and admins may run tournaments, matches and news.
    pub fn can_manage(self) -> bool {
        self >= Role::Organizer
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "organizer" => Ok(Role::Organizer),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: Role,
    pub avatar_url: Option<String>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .require(&self.email, "Email is required")
            .ensure(
                self.email.trim().is_empty() || is_valid_email(&self.email),
                "Please provide a valid email",
            )
            .require(&self.full_name, "Full name is required")
            .require(&self.password_hash, "Password is required")
            .finish()
    }

    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            email: self.email,
            full_name: self.full_name,
            password_hash: self.password_hash,
            role: self.role,
            avatar_url: self.avatar_url,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    /// `Some(None)` clears the avatar.
    pub avatar_url: Option<Option<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.avatar_url.is_none()
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        SchemaCheck::new()
            .ensure(
                self.full_name.as_deref().map_or(true, |n| !n.trim().is_empty()),
                "Full name is required",
            )
            .finish()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.full_name {
            user.full_name = name.clone();
        }
        if let Some(avatar) = &self.avatar_url {
            user.avatar_url = avatar.clone();
        }
    }
}

/// Organizer/author as embedded in populated records.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<&User> for UserRef {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name.clone(),
            email: u.email.clone(),
        }
    }
}

/// The account behind a competitor, as shown in participant listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for UserCard {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            full_name: u.full_name.clone(),
            email: u.email.clone(),
            avatar_url: u.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "de_nullable")]
    pub avatar_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email("an a@example.com"));
        assert!(!is_valid_email("ana.example.com"));
    }

    #[test]
    fn roles_are_ordered_by_privilege() {
        assert!(!Role::User.can_manage());
        assert!(Role::Organizer.can_manage());
        assert!(Role::Admin.can_manage());
        assert_eq!("organizer".parse::<Role>().unwrap(), Role::Organizer);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn new_user_lists_all_missing_fields() {
        let errors = NewUser {
            email: String::new(),
            full_name: " ".into(),
            password_hash: "hash".into(),
            role: Role::User,
            avatar_url: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors, vec!["Email is required", "Full name is required"]);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let user = NewUser {
            email: "ana@example.com".into(),
            full_name: "Ana".into(),
            password_hash: "secret-hash".into(),
            role: Role::User,
            avatar_url: None,
        }
        .into_user();
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["fullName"], "Ana");
        assert_eq!(json["role"], "user");
    }
}
