//! Authentication primitives: login credentials and sign-up validation.
//!
//! Inbound payload parsing stays outside the domain; handlers pass raw strings
//! to these constructors before talking to [`crate::domain::AccountService`].

use zeroize::Zeroizing;

use super::{EmailAddress, FormErrors};

/// Minimum password length accepted at sign-up.
pub const PASSWORD_MIN: usize = 8;

/// Error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Validated login credentials.
///
/// ## Invariants
/// - `username` is trimmed and lowercased, never empty.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use forum::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada ", "hunter22").unwrap();
/// assert_eq!(creds.username(), "ada");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: normalized,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username or email used for the lookup.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Cleaned sign-up submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    /// Login name; defaults to the email local part.
    pub username: String,
    /// Contact address.
    pub email: EmailAddress,
    /// Display name.
    pub name: String,
    /// Plain-text password, zeroed on drop.
    pub password: Zeroizing<String>,
}

/// Validate a sign-up submission.
pub fn validate_signup(
    email: &str,
    name: Option<&str>,
    password1: &str,
    password2: &str,
) -> Result<SignupRequest, FormErrors> {
    let mut errors = FormErrors::new();
    let email = match EmailAddress::new(email) {
        Ok(email) => Some(email),
        Err(err) => {
            errors.add_field("email", err.to_string());
            None
        }
    };
    if password1.chars().count() < PASSWORD_MIN {
        errors.add_field(
            "password1",
            format!("password must be at least {PASSWORD_MIN} characters"),
        );
    }
    if password1 != password2 {
        errors.add_non_field("passwords do not match");
    }
    let Some(email) = email else {
        return Err(errors);
    };
    let username = email
        .as_str()
        .split_once('@')
        .map_or(email.as_str(), |(local, _)| local)
        .to_owned();
    let name = name
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map_or_else(|| username.clone(), str::to_owned);
    errors.finish(SignupRequest {
        username,
        email,
        name,
        password: Zeroizing::new(password1.to_owned()),
    })
}
