use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::CookieJar;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, Role, User, UserResponse,
};
use crate::session::Claims;
use crate::AppState;

use super::error::ApiError;
use super::extract::ApiJson;
use super::validation::{non_empty, validate_email, validate_name};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Look up a user by email
pub async fn find_user_by_email(
    pool: &sqlx::SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Login endpoint
///
/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let (email, password) = match (non_empty(&request.email), request.password.as_deref()) {
        (Some(email), Some(password)) if !password.is_empty() => (email, password),
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    let user = find_user_by_email(&state.db, email).await?;

    let user = match user {
        Some(user) if verify_password(password, &user.password_hash) => user,
        Some(user) => {
            warn!(user_id = user.id, "Login failed: password mismatch");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
        None => {
            warn!(email = %email, "Login failed: unknown email");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    let token = state
        .sessions
        .issue(&user)
        .map_err(|e| ApiError::internal_logged("Internal server error", e))?;

    info!(user_id = user.id, role = %user.role, "User logged in");

    let jar = jar.add(state.sessions.cookie(token));
    Ok((
        jar,
        Json(LoginResponse {
            user: UserResponse::from(user),
        }),
    ))
}

/// Clear the session cookie
///
/// POST /api/logout
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (jar.remove(state.sessions.removal_cookie()), StatusCode::NO_CONTENT)
}

/// Current session claims
///
/// GET /api/session
pub async fn current_session(claims: Claims) -> Json<Claims> {
    Json(claims)
}

/// Self-service registration. Creates a PATIENT user and its linked patient record.
///
/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let (name, email, password) = match (
        non_empty(&request.name),
        non_empty(&request.email),
        request.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Some(name), Some(email), Some(password)) => (name, email, password),
        _ => return Err(ApiError::bad_request("Missing required fields")),
    };

    if let Err(e) = validate_name(name) {
        return Err(ApiError::validation_field("name", e));
    }
    if let Err(e) = validate_email(email) {
        return Err(ApiError::validation_field("email", e));
    }

    if find_user_by_email(&state.db, email).await?.is_some() {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let password_hash = hash_password(password)
        .map_err(|e| ApiError::internal_logged("Failed to register user", e))?;

    let mut tx = state.db.begin().await?;

    let user_id = sqlx::query(
        "INSERT INTO users (email, password_hash, name, role) VALUES (?, ?, ?, ?)",
    )
    .bind(email)
    .bind(&password_hash)
    .bind(name)
    .bind(Role::Patient.as_str())
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let patient_id = sqlx::query("INSERT INTO patients (name, email) VALUES (?, ?)")
        .bind(name)
        .bind(email)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    sqlx::query("UPDATE users SET patient_id = ? WHERE id = ?")
        .bind(patient_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(user_id, patient_id, "Registered new patient account");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("password").unwrap();
        assert_ne!(hash, "password");
        assert!(verify_password("password", &hash));
        assert!(!verify_password("Password", &hash));
    }

    #[test]
    fn test_verify_rejects_non_hash() {
        // A stored plaintext value never verifies
        assert!(!verify_password("password", "password"));
    }
}
