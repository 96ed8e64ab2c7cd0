//! Client-side checks run before a request is allowed onto the network.
//!
//! The limits mirror the backend's request constraints so that an obviously
//! bad form never costs a round trip. The server still validates everything;
//! passing these checks guarantees nothing.

use crate::{LoginRequest, RegisterRequest};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const EMAIL_MAX: usize = 100;
const PASSWORD_MIN: usize = 6;
const PASSWORD_MAX: usize = 40;

/// A request failed a local check. Never produced by the server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The field is empty or only whitespace.
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("email is not a valid email address")]
    InvalidEmail,
}

/// Returns `true` for `local@domain.tld` shaped strings: no whitespace,
/// exactly one `@`, and a dot in the domain with something on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

impl LoginRequest {
    /// Both fields are required. Length limits are left to the server so
    /// that a wrong password is reported as bad credentials.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("usernameOrEmail", &self.username_or_email)?;
        required("password", &self.password)?;
        Ok(())
    }
}

impl RegisterRequest {
    /// Checks fields in form order and reports the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        required("username", &self.username)?;
        length("username", self.username.trim(), USERNAME_MIN, USERNAME_MAX)?;

        required("email", &self.email)?;
        let email = self.email.trim();
        if email.chars().count() > EMAIL_MAX {
            return Err(ValidationError::TooLong {
                field: "email",
                max: EMAIL_MAX,
            });
        }
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail);
        }

        required("password", &self.password)?;
        length("password", &self.password, PASSWORD_MIN, PASSWORD_MAX)?;
        Ok(())
    }
}
