//! Users Data

use std::fmt;

use crate::{
    auth::PasswordDigest,
    domain::{
        users::records::UserRecord,
        validation::{Violations, looks_like_email},
    },
};

pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 255;
pub const MIN_PASSWORD_CHARS: usize = 6;
pub const MAX_PASSWORD_CHARS: usize = 255;

/// Registration input. Holds the plaintext password until it is hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewUser {
    /// # Errors
    ///
    /// Returns every offending field.
    pub fn validate(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();
        let name_chars = self.name.trim().chars().count();

        violations.check(
            (MIN_NAME_CHARS..=MAX_NAME_CHARS).contains(&name_chars),
            "name",
            format!("must be between {MIN_NAME_CHARS} and {MAX_NAME_CHARS} characters long"),
        );
        check_email(&mut violations, &self.email);
        violations.check(
            (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&self.password.chars().count()),
            "password",
            format!(
                "must be between {MIN_PASSWORD_CHARS} and {MAX_PASSWORD_CHARS} characters long"
            ),
        );

        violations.into_result()
    }
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// Email and plaintext password presented for an authentication token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns every offending field.
    pub fn validate(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();

        check_email(&mut violations, &self.email);
        violations.check(!self.password.is_empty(), "password", "must be provided");

        violations.into_result()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"**redacted**")
            .finish()
    }
}

/// Row written on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUserRecord {
    pub name: String,
    pub email: String,
    pub password: PasswordDigest,
}

/// Full payload written by a versioned user update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password: PasswordDigest,
    pub activated: bool,
}

impl UserChanges {
    #[must_use]
    pub fn from_record(record: &UserRecord) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            password: record.password.clone(),
            activated: record.activated,
        }
    }
}

fn check_email(violations: &mut Violations, email: &str) {
    violations.check(!email.is_empty(), "email", "must be provided");
    violations.check(
        looks_like_email(email),
        "email",
        "must be a valid email address",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            name: "Alice".to_owned(),
            email: "alice@example.com".to_owned(),
            password: "pa55word".to_owned(),
        }
    }

    #[test]
    fn valid_registration_passes() {
        assert!(new_user().validate().is_ok());
    }

    #[test]
    fn short_password_and_bad_email_are_reported() {
        let user = NewUser {
            email: "alice".to_owned(),
            password: "abc".to_owned(),
            ..new_user()
        };

        let violations = user.validate().err().unwrap_or_default();

        assert_eq!(violations.get("email"), Some("must be a valid email address"));
        assert!(violations.get("password").is_some());
        assert_eq!(violations.get("name"), None);
    }

    #[test]
    fn debug_hides_password() {
        assert!(!format!("{:?}", new_user()).contains("pa55word"));
        assert!(
            !format!(
                "{:?}",
                Credentials {
                    email: "alice@example.com".to_owned(),
                    password: "pa55word".to_owned(),
                }
            )
            .contains("pa55word")
        );
    }
}
