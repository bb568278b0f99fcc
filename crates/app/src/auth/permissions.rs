//! Permission sets.

use async_trait::async_trait;
use mockall::automock;
use smallvec::SmallVec;

use crate::domain::users::records::UserId;

pub const MOVIES_READ: &str = "movies:read";
pub const MOVIES_WRITE: &str = "movies:write";

/// Permissions granted to new accounts.
pub const DEFAULT_PERMISSIONS: &[&str] = &[MOVIES_READ];

/// Codes held by one user. Set semantics; duplicates collapse on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permissions(SmallVec<[String; 4]>);

impl Permissions {
    #[must_use]
    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|held| held == code)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut codes: SmallVec<[String; 4]> = SmallVec::new();

        for code in iter {
            let code = code.into();

            if !codes.contains(&code) {
                codes.push(code);
            }
        }

        Self(codes)
    }
}

#[automock]
#[async_trait]
pub trait PermissionsRepository: Send + Sync {
    async fn permissions_for_user(&self, user: UserId) -> Result<Permissions, sqlx::Error>;

    /// Add codes to a user's set. Codes already held are ignored.
    async fn grant_permissions(&self, user: UserId, codes: &[String]) -> Result<(), sqlx::Error>;
}
