//! User (borrower) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub email_verified: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Borrower summary embedded in loan listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct UserRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// User list query
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Case-insensitive match on name or email
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Create user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: Option<String>,
}

/// Update user request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    /// User ID (when not given in the path)
    pub id: Option<Uuid>,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role: Option<String>,
}

pub const DEFAULT_ROLE: &str = "user";
pub const EMAIL_REGISTERED: &str = "Email already registered";
pub const EMAIL_TAKEN: &str = "Email already taken by another user";

fn trimmed_role(role: Option<String>) -> Option<String> {
    role.map(|r| r.trim().to_string()).filter(|r| !r.is_empty())
}

impl CreateUser {
    /// Trim user input; validation runs on the stored form
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: trimmed_role(self.role),
        }
    }
}

impl UpdateUser {
    /// Trim user input; validation runs on the stored form
    pub fn normalized(self) -> Self {
        Self {
            id: self.id,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            role: trimmed_role(self.role),
        }
    }
}

/// Claims of a session token issued by the auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Signed-in user's ID
    pub sub: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Sign a session token (HS256)
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Verify signature and expiry of a session token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_validation() {
        let ok = CreateUser {
            name: "Ada Lovelace".into(),
            email: "ada@example.org".into(),
            role: None,
        };
        assert!(ok.validate().is_ok());

        let short_name = CreateUser {
            name: "A".into(),
            email: "ada@example.org".into(),
            role: None,
        };
        assert!(short_name.validate().is_err());

        let bad_email = CreateUser {
            name: "Ada".into(),
            email: "not-an-email".into(),
            role: None,
        };
        assert!(bad_email.validate().is_err());
    }

    #[test]
    fn test_validation_message_becomes_error_body() {
        let bad_email = UpdateUser {
            id: None,
            name: "Ada".into(),
            email: "nope".into(),
            role: None,
        };
        let err = crate::error::AppError::from(bad_email.validate().unwrap_err());
        assert_eq!(err.to_string(), "Validation error: Invalid email format");
    }

    #[test]
    fn test_name_is_checked_after_trimming() {
        for name in ["A ", "   ", " B\t"] {
            let request = CreateUser {
                name: name.into(),
                email: "ada@example.org".into(),
                role: None,
            }
            .normalized();
            let err = crate::error::AppError::from(request.validate().unwrap_err());
            assert_eq!(err.to_string(), "Validation error: Name must be at least 2 characters");
        }

        let request = UpdateUser {
            id: None,
            name: "  Ada  ".into(),
            email: " ada@example.org ".into(),
            role: Some("  ".into()),
        }
        .normalized();
        assert!(request.validate().is_ok());
        assert_eq!(request.name, "Ada");
        assert_eq!(request.email, "ada@example.org");
        assert_eq!(request.role, None);
    }

    fn claims(exp_offset_secs: i64) -> SessionClaims {
        let now = Utc::now().timestamp();
        SessionClaims {
            sub: Uuid::new_v4(),
            email: Some("librarian@example.org".into()),
            name: Some("Librarian".into()),
            exp: now + exp_offset_secs,
            iat: now,
        }
    }

    #[test]
    fn test_session_token_round_trip() {
        let claims = claims(3600);
        let token = claims.create_token("secret").unwrap();
        let decoded = SessionClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, claims.sub);
        assert_eq!(decoded.email, claims.email);
    }

    #[test]
    fn test_session_token_rejects_wrong_secret_and_expiry() {
        let token = claims(3600).create_token("secret").unwrap();
        assert!(SessionClaims::from_token(&token, "other-secret").is_err());

        // Well past the default 60s leeway
        let expired = claims(-3600).create_token("secret").unwrap();
        assert!(SessionClaims::from_token(&expired, "secret").is_err());
    }
}
