//! Signed session tokens carried in an http-only cookie.
//!
//! A session is an HS256 JWT holding `{userId, role, name, email}` with a
//! fixed 24 hour lifetime. There is no server-side session table and no
//! refresh: once the token expires the user logs in again.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::api::error::ApiError;
use crate::db::{Role, User};
use crate::AppState;

/// Session cookie name
pub const SESSION_COOKIE: &str = "session";

/// Session lifetime in hours
pub const SESSION_TTL_HOURS: i64 = 24;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: i64,
    pub role: Role,
    pub name: String,
    pub email: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
}

impl Claims {
    /// The single authorization predicate: the caller's role must be in `allowed`.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), ApiError> {
        if self.role.is_one_of(allowed) {
            Ok(())
        } else {
            tracing::debug!(user_id = self.user_id, role = %self.role, "Role not permitted");
            Err(ApiError::unauthorized("Unauthorized"))
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to sign session token: {0}")]
    Sign(#[from] jsonwebtoken::errors::Error),
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    secure_cookie: bool,
}

impl SessionManager {
    pub fn new(secret: &str, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            secure_cookie,
        }
    }

    /// Issue a token for the user, valid for 24 hours from now
    pub fn issue(&self, user: &User) -> Result<String, SessionError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, SessionError> {
        let claims = Claims {
            user_id: user.id,
            role: user.role_enum(),
            name: user.name.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Decode a token. Absent, malformed, forged and expired tokens all yield `None`.
    pub fn verify(&self, token: &str) -> Option<Claims> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Option<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the supplied clock, without leeway
        validation.validate_exp = false;
        let data = decode::<Claims>(token, &self.decoding, &validation).ok()?;
        if data.claims.exp <= now.timestamp() {
            return None;
        }
        Some(data.claims)
    }

    /// Build the cookie that stores a session token
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(SESSION_TTL_HOURS))
            .build()
    }

    /// Cookie that clears the session when added to a jar
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, "")).path("/").build()
    }

    /// Read and verify the session cookie from a jar
    pub fn claims_from_jar(&self, jar: &CookieJar) -> Option<Claims> {
        jar.get(SESSION_COOKIE).and_then(|c| self.verify(c.value()))
    }
}

/// Extractor for the authenticated caller. Rejects with 401.
#[async_trait]
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        state
            .sessions
            .claims_from_jar(&jar)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(role: &str) -> User {
        User {
            id: 7,
            email: "dr.smith@medflow.com".to_string(),
            password_hash: String::new(),
            name: "Dr. Smith".to_string(),
            role: role.to_string(),
            patient_id: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_token_round_trip_preserves_role() {
        let sessions = SessionManager::new("test-secret", false);
        for role in ["ADMIN", "DOCTOR", "RECEPTIONIST", "PATIENT"] {
            let token = sessions.issue(&user(role)).unwrap();
            let claims = sessions.verify(&token).unwrap();
            assert_eq!(claims.role.as_str(), role);
            assert_eq!(claims.user_id, 7);
            assert_eq!(claims.email, "dr.smith@medflow.com");
            assert_eq!(claims.name, "Dr. Smith");
        }
    }

    #[test]
    fn test_token_expires_after_24_hours() {
        let sessions = SessionManager::new("test-secret", false);
        let issued = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let token = sessions.issue_at(&user("DOCTOR"), issued).unwrap();

        let claims = sessions
            .verify_at(&token, issued + Duration::hours(23) + Duration::minutes(59))
            .unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);

        assert!(sessions.verify_at(&token, issued + Duration::hours(24)).is_none());
        assert!(sessions.verify_at(&token, issued + Duration::days(3)).is_none());
    }

    #[test]
    fn test_forged_and_malformed_tokens_rejected() {
        let sessions = SessionManager::new("test-secret", false);
        let other = SessionManager::new("other-secret", false);
        let token = other.issue(&user("ADMIN")).unwrap();
        assert!(sessions.verify(&token).is_none());
        assert!(sessions.verify("not-a-jwt").is_none());
        assert!(sessions.verify("").is_none());
    }

    #[test]
    fn test_require_role() {
        let sessions = SessionManager::new("test-secret", false);
        let token = sessions.issue(&user("PATIENT")).unwrap();
        let claims = sessions.verify(&token).unwrap();
        assert!(claims.require_role(&Role::FRONT_DESK).is_err());
        assert!(claims.require_role(&[Role::Patient]).is_ok());
    }

    #[test]
    fn test_cookie_attributes() {
        let sessions = SessionManager::new("test-secret", true);
        let cookie = sessions.cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));

        let dev = SessionManager::new("test-secret", false).cookie("abc".to_string());
        assert_eq!(dev.secure(), Some(false));
    }

    #[test]
    fn test_claims_from_jar() {
        let sessions = SessionManager::new("test-secret", false);
        let token = sessions.issue(&user("DOCTOR")).unwrap();

        let jar = CookieJar::new().add(sessions.cookie(token));
        let claims = sessions.claims_from_jar(&jar).unwrap();
        assert_eq!(claims.role, Role::Doctor);

        assert!(sessions.claims_from_jar(&CookieJar::new()).is_none());
        let removed = jar.add(sessions.removal_cookie());
        assert!(sessions.claims_from_jar(&removed).is_none());
    }
}
