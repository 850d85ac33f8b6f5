//! User accounts and roles.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Clinic roles. Serialized in upper case to match the session claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Doctor,
    Receptionist,
    Patient,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Receptionist => "RECEPTIONIST",
            Role::Patient => "PATIENT",
        }
    }

    /// Roles that manage the front desk: patient intake and scheduling
    pub const FRONT_DESK: [Role; 2] = [Role::Admin, Role::Receptionist];

    /// Check whether this role is in the given allow-list
    pub fn is_one_of(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "DOCTOR" => Ok(Role::Doctor),
            "RECEPTIONIST" => Ok(Role::Receptionist),
            "PATIENT" => Ok(Role::Patient),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub patient_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Parsed role; unknown values fall back to the least privileged role
    pub fn role_enum(&self) -> Role {
        self.role.parse().unwrap_or(Role::Patient)
    }
}

/// Public view of a user (never carries the password hash)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let role = user.role_enum();
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role,
        }
    }
}

/// Doctor listing entry
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_strings() {
        for role in [Role::Admin, Role::Doctor, Role::Receptionist, Role::Patient] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("doctor".parse::<Role>().unwrap(), Role::Doctor);
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_upper_case() {
        assert_eq!(serde_json::to_string(&Role::Receptionist).unwrap(), "\"RECEPTIONIST\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }

    #[test]
    fn test_front_desk_allow_list() {
        assert!(Role::Admin.is_one_of(&Role::FRONT_DESK));
        assert!(Role::Receptionist.is_one_of(&Role::FRONT_DESK));
        assert!(!Role::Doctor.is_one_of(&Role::FRONT_DESK));
        assert!(!Role::Patient.is_one_of(&Role::FRONT_DESK));
    }
}
