//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an ApiError,
//! use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Pragmatic email check: local part, `@`, and a dotted domain
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$"
    ).unwrap();

    /// Phone numbers: digits with optional leading +, spaces, dashes, dots and parentheses
    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9 ().-]{3,32}$").unwrap();
}

/// Return the trimmed value if present and non-empty
pub fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a person's display name
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Name is required".to_string());
    }

    if name.len() > 200 {
        return Err("Name is too long (max 200 characters)".to_string());
    }

    Ok(())
}

/// Validate a phone number (optional field)
pub fn validate_phone(phone: &Option<String>) -> Result<(), String> {
    match non_empty(phone) {
        Some(p) if !PHONE_REGEX.is_match(p) => Err("Invalid phone number".to_string()),
        _ => Ok(()),
    }
}

/// Validate free-text medical history (optional field)
pub fn validate_medical_history(history: &Option<String>) -> Result<(), String> {
    match history {
        Some(h) if h.len() > 10_000 => {
            Err("Medical history is too long (max 10000 characters)".to_string())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("dr.smith@medflow.com").is_ok());
        assert!(validate_email("first+tag@clinic.co.uk").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("a b@c.com").is_err());
        assert!(validate_email("a@-b.com").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("A").is_ok());
        assert!(validate_name("Jane Doe").is_ok());

        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone(&None).is_ok());
        assert!(validate_phone(&Some(String::new())).is_ok());
        assert!(validate_phone(&Some("+1234567890".to_string())).is_ok());
        assert!(validate_phone(&Some("(555) 123-4567".to_string())).is_ok());

        assert!(validate_phone(&Some("call me".to_string())).is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(&Some("  x ".to_string())), Some("x"));
        assert_eq!(non_empty(&Some("   ".to_string())), None);
        assert_eq!(non_empty(&None), None);
    }

    #[test]
    fn test_validate_medical_history() {
        assert!(validate_medical_history(&None).is_ok());
        assert!(validate_medical_history(&Some("No known allergies.".to_string())).is_ok());
        assert!(validate_medical_history(&Some("x".repeat(10_001))).is_err());
    }
}
