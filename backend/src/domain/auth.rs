//! Login and registration payloads.
//!
//! Handlers build [`LoginCredentials`] and [`Registration`] from raw request
//! fields so the account ports only ever see normalised input.

use std::fmt;
use std::ops::RangeInclusive;

use zeroize::Zeroizing;

use crate::domain::Role;

/// Accepted username length, in characters, after trimming.
pub const USERNAME_LENGTH: RangeInclusive<usize> = 3..=50;
/// Accepted password length, in characters.
pub const PASSWORD_LENGTH: RangeInclusive<usize> = 6..=255;
/// Longest accepted email address, in characters.
pub const EMAIL_MAX_LENGTH: usize = 255;

/// Trim and lowercase an email, checking for a single inner `@`.
fn normalise_email(email: &str) -> Result<String, LoginValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(LoginValidationError::EmptyEmail);
    }
    if trimmed.matches('@').count() != 1 || trimmed.starts_with('@') || trimmed.ends_with('@') {
        return Err(LoginValidationError::MalformedEmail);
    }
    Ok(trimmed.to_lowercase())
}

/// Reasons a login payload is rejected before authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    EmptyEmail,
    MalformedEmail,
    EmptyPassword,
}

impl LoginValidationError {
    /// Name of the offending request field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::MalformedEmail => "email",
            Self::EmptyPassword => "password",
        }
    }

    /// Stable machine-readable validation code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "empty_email",
            Self::MalformedEmail => "malformed_email",
            Self::EmptyPassword => "empty_password",
        }
    }
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::MalformedEmail => write!(f, "email must contain a single `@`"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Validated login credentials.
///
/// The email is trimmed and lowercased; the password is kept exactly as
/// supplied and wiped from memory on drop.
///
/// # Examples
/// ```
/// use courses_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" Ada@Example.com ", "secret").unwrap();
/// assert_eq!(creds.email(), "ada@example.com");
/// assert_eq!(creds.password(), "secret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, LoginValidationError> {
        let email = normalise_email(email)?;
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Reasons a registration payload is rejected before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationValidationError {
    UsernameLength,
    EmptyEmail,
    MalformedEmail,
    EmailTooLong,
    PasswordLength,
    UnknownRole { value: String },
}

impl RegistrationValidationError {
    /// Name of the offending request field.
    pub const fn field(&self) -> &'static str {
        match self {
            Self::UsernameLength => "username",
            Self::EmptyEmail | Self::MalformedEmail | Self::EmailTooLong => "email",
            Self::PasswordLength => "password",
            Self::UnknownRole { .. } => "role",
        }
    }

    /// Stable machine-readable validation code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UsernameLength => "username_length",
            Self::EmptyEmail => "empty_email",
            Self::MalformedEmail => "malformed_email",
            Self::EmailTooLong => "email_too_long",
            Self::PasswordLength => "password_length",
            Self::UnknownRole { .. } => "invalid_role",
        }
    }
}

impl fmt::Display for RegistrationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UsernameLength => write!(
                f,
                "username must be {}-{} characters",
                USERNAME_LENGTH.start(),
                USERNAME_LENGTH.end()
            ),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::MalformedEmail => write!(f, "email must contain a single `@`"),
            Self::EmailTooLong => write!(f, "email must be at most {EMAIL_MAX_LENGTH} characters"),
            Self::PasswordLength => write!(
                f,
                "password must be {}-{} characters",
                PASSWORD_LENGTH.start(),
                PASSWORD_LENGTH.end()
            ),
            Self::UnknownRole { value } => {
                write!(f, "role must be `instructor` or `student`, got `{value}`")
            }
        }
    }
}

impl std::error::Error for RegistrationValidationError {}

impl From<LoginValidationError> for RegistrationValidationError {
    fn from(err: LoginValidationError) -> Self {
        match err {
            LoginValidationError::EmptyEmail => Self::EmptyEmail,
            LoginValidationError::MalformedEmail => Self::MalformedEmail,
            LoginValidationError::EmptyPassword => Self::PasswordLength,
        }
    }
}

/// Validated sign-up request.
///
/// The username is trimmed and the email normalised as for login. The role
/// must name one of the closed [`Role`] variants.
///
/// # Examples
/// ```
/// use courses_backend::domain::{Registration, Role};
///
/// let reg = Registration::try_from_parts(" ada ", "Ada@Example.com", "secret", "student").unwrap();
/// assert_eq!(reg.username(), "ada");
/// assert_eq!(reg.email(), "ada@example.com");
/// assert_eq!(reg.role(), Role::Student);
/// assert!(Registration::try_from_parts("ada", "ada@example.com", "secret", "admin").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    username: String,
    email: String,
    password: Zeroizing<String>,
    role: Role,
}

impl Registration {
    /// Construct a registration from raw request fields.
    pub fn try_from_parts(
        username: &str,
        email: &str,
        password: &str,
        role: &str,
    ) -> Result<Self, RegistrationValidationError> {
        let username = username.trim();
        if !USERNAME_LENGTH.contains(&username.chars().count()) {
            return Err(RegistrationValidationError::UsernameLength);
        }
        let email = normalise_email(email)?;
        if email.chars().count() > EMAIL_MAX_LENGTH {
            return Err(RegistrationValidationError::EmailTooLong);
        }
        if !PASSWORD_LENGTH.contains(&password.chars().count()) {
            return Err(RegistrationValidationError::PasswordLength);
        }
        let role = role
            .parse::<Role>()
            .map_err(|_| RegistrationValidationError::UnknownRole {
                value: role.to_owned(),
            })?;

        Ok(Self {
            username: username.to_owned(),
            email,
            password: Zeroizing::new(password.to_owned()),
            role,
        })
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub const fn role(&self) -> Role {
        self.role
    }
}
