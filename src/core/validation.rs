//! Input Validation
//!
//! Shape checks that turn raw request values into validated inputs.

use serde_json::Value;

use crate::error::ValidationError;
use crate::types::{Password, Subject, TokenId, TokenManagerConfig};

/// Validates subjects, passwords, token ids and the renewal intent flag.
#[derive(Debug, Clone, Copy)]
pub struct InputValidator {
    subject_length: usize,
    token_id_length: usize,
}

impl InputValidator {
    /// Create validator for the configured lengths.
    pub fn new(config: &TokenManagerConfig) -> Self {
        Self {
            subject_length: config.subject_length,
            token_id_length: config.token_id_length,
        }
    }

    /// Trimmed subject of exactly the configured length.
    pub fn subject(&self, raw: &str) -> Result<Subject, ValidationError> {
        let value = non_empty(raw, "subject")?;
        check_length(value, "subject", self.subject_length)?;
        Ok(Subject::new_unchecked(value.to_string()))
    }

    /// Trimmed, non-empty password.
    pub fn password(&self, raw: &str) -> Result<Password, ValidationError> {
        let value = non_empty(raw, "password")?;
        Ok(Password::new_unchecked(value.to_string()))
    }

    /// Trimmed alphanumeric token id of exactly the configured length.
    pub fn token_id(&self, raw: &str) -> Result<TokenId, ValidationError> {
        let value = non_empty(raw, "id")?;
        check_length(value, "id", self.token_id_length)?;

        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError::InvalidCharacters { field: "id" });
        }

        Ok(TokenId::new_unchecked(value.to_string()))
    }

    /// Renewal must be explicitly requested.
    pub fn extend(&self, extend: bool) -> Result<(), ValidationError> {
        if extend {
            Ok(())
        } else {
            Err(ValidationError::ExtendNotRequested)
        }
    }
}

/// Extract a string field from a loosely typed payload.
///
/// Missing, null and non-string values all count as missing.
pub fn required_str<'a>(
    payload: &'a Value,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField { field })
}

/// Extract a boolean field from a loosely typed payload.
///
/// Strings such as `"true"` are not coerced.
pub fn required_bool(payload: &Value, field: &'static str) -> Result<bool, ValidationError> {
    payload
        .get(field)
        .and_then(Value::as_bool)
        .ok_or(ValidationError::MissingField { field })
}

fn non_empty<'a>(raw: &'a str, field: &'static str) -> Result<&'a str, ValidationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    Ok(value)
}

fn check_length(value: &str, field: &'static str, expected: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual != expected {
        return Err(ValidationError::InvalidLength {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn validator() -> InputValidator {
        InputValidator::new(&TokenManagerConfig::default())
    }

    #[test]
    fn test_subject_is_trimmed() {
        let subject = validator().subject("  5551234567 ").unwrap();
        assert_eq!(subject.as_str(), "5551234567");
    }

    #[test]
    fn test_subject_wrong_length() {
        assert_eq!(
            validator().subject("555123456"),
            Err(ValidationError::InvalidLength {
                field: "subject",
                expected: 10,
                actual: 9
            })
        );
        assert!(validator().subject("55512345678").is_err());
        assert_eq!(
            validator().subject("   "),
            Err(ValidationError::MissingField { field: "subject" })
        );
    }

    #[test]
    fn test_password_empty_after_trim() {
        assert!(validator().password(" \t\n").is_err());
        assert_eq!(validator().password(" secret1 ").unwrap().expose(), "secret1");
    }

    #[test]
    fn test_token_id_shape() {
        let v = validator();
        assert!(v.token_id("abcdefghij0123456789").is_ok());
        assert!(v.token_id(" abcdefghij0123456789 ").is_ok());
        assert!(v.token_id("abcdefghij012345678").is_err());
        assert_eq!(
            v.token_id("../../../../etc/pass"),
            Err(ValidationError::InvalidCharacters { field: "id" })
        );
    }

    #[test]
    fn test_extend_flag() {
        assert!(validator().extend(true).is_ok());
        assert_eq!(
            validator().extend(false),
            Err(ValidationError::ExtendNotRequested)
        );
    }

    #[test]
    fn test_required_fields() {
        let payload = json!({"phone": 5551234567u64, "password": "pw", "extend": "true"});

        assert_eq!(
            required_str(&payload, "phone"),
            Err(ValidationError::MissingField { field: "phone" })
        );
        assert_eq!(required_str(&payload, "password"), Ok("pw"));
        assert!(required_bool(&payload, "extend").is_err());
        assert!(required_bool(&json!({"extend": true}), "extend").unwrap());
        assert!(required_str(&json!(null), "id").is_err());
    }
}
