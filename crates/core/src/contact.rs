//! Shared field validation for contact details and free text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::DomainError;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[\d\s\-()]+$").expect("phone pattern compiles"));

/// Trim, lowercase and check an email address.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("email is required"));
    }
    if !EMAIL.is_match(&email) {
        return Err(DomainError::validation(format!("invalid email: {email}")));
    }
    Ok(email)
}

/// Trim and check a phone number (digits, spaces, `+-()`).
pub fn normalize_phone(raw: &str) -> Result<String, DomainError> {
    let phone = raw.trim().to_string();
    if phone.is_empty() {
        return Err(DomainError::validation("phone is required"));
    }
    if !PHONE.is_match(&phone) {
        return Err(DomainError::validation(format!("invalid phone number: {phone}")));
    }
    Ok(phone)
}

/// Trim a required text field and enforce an optional length limit.
pub fn required_text(field: &str, raw: &str, max: Option<usize>) -> Result<String, DomainError> {
    let value = raw.trim().to_string();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    check_len(field, &value, max)?;
    Ok(value)
}

/// Trim optional free text; blank becomes `None`.
pub fn optional_text(field: &str, raw: Option<String>, max: usize) -> Result<Option<String>, DomainError> {
    match raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(value) => {
            check_len(field, &value, Some(max))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Ratings are whole stars from 1 to 5.
pub fn check_rating(rating: u8) -> Result<(), DomainError> {
    if !(1..=5).contains(&rating) {
        return Err(DomainError::validation("rating must be between 1 and 5"));
    }
    Ok(())
}

fn check_len(field: &str, value: &str, max: Option<usize>) -> Result<(), DomainError> {
    match max {
        Some(max) if value.chars().count() > max => Err(DomainError::validation(format!(
            "{field} cannot exceed {max} characters"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Ops.Team@Relief.ORG ").unwrap(),
            "ops.team@relief.org"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "no-at-sign.org", "a@b", "a@@b.org", "a b@c.org"] {
            assert!(normalize_email(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn phones_allow_common_punctuation() {
        assert!(normalize_phone("+254 (0) 700-123-456").is_ok());
        assert!(normalize_phone("call me").is_err());
        assert!(normalize_phone("   ").is_err());
    }

    #[test]
    fn text_limits_count_characters() {
        assert!(required_text("name", &"é".repeat(100), Some(100)).is_ok());
        assert!(required_text("name", &"é".repeat(101), Some(100)).is_err());
        assert_eq!(optional_text("notes", Some("  ".into()), 500).unwrap(), None);
    }

    #[test]
    fn ratings_are_bounded() {
        assert!(check_rating(0).is_err());
        assert!(check_rating(1).is_ok());
        assert!(check_rating(5).is_ok());
        assert!(check_rating(6).is_err());
    }
}
