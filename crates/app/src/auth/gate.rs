//! Authorization checks.

use std::{fmt, sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    auth::{AccessError, PermissionsRepository, Subject},
    database::{self, DEFAULT_STORE_TIMEOUT},
    domain::users::records::UserId,
};

/// Ordered access checks: authenticated, then activated, then permission.
///
/// The first failing check decides the error; later checks do not run.
#[derive(Clone)]
pub struct AuthorizationGate {
    permissions: Arc<dyn PermissionsRepository>,
    timeout: Duration,
}

impl fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(permissions: Arc<dyn PermissionsRepository>) -> Self {
        Self {
            permissions,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] for the anonymous subject.
    pub fn require_authenticated(subject: &Subject) -> Result<(), AccessError> {
        if subject.is_anonymous() {
            return Err(AccessError::Unauthenticated);
        }

        Ok(())
    }

    /// # Errors
    ///
    /// Returns the authentication error first, then
    /// [`AccessError::InactiveAccount`].
    pub fn require_activated(subject: &Subject) -> Result<(), AccessError> {
        Self::require_authenticated(subject)?;

        if !subject.activated {
            return Err(AccessError::InactiveAccount);
        }

        Ok(())
    }

    /// Full check chain for `code`.
    ///
    /// # Errors
    ///
    /// Returns the first failing check's error, or a store error if the
    /// permission set cannot be loaded.
    pub async fn require_permission(
        &self,
        subject: &Subject,
        code: &str,
    ) -> Result<(), AccessError> {
        Self::require_activated(subject)?;

        let permissions = database::bounded(
            "permissions.for_user",
            self.timeout,
            self.permissions.permissions_for_user(subject.id),
        )
        .await?;

        if !permissions.includes(code) {
            debug!(user = %subject.id, code, "permission denied");

            return Err(AccessError::Forbidden);
        }

        Ok(())
    }

    /// Add codes to a user's permission set.
    ///
    /// # Errors
    ///
    /// Returns a store error if the grant fails or times out.
    pub async fn grant(&self, user: UserId, codes: &[String]) -> Result<(), AccessError> {
        database::bounded(
            "permissions.grant",
            self.timeout,
            self.permissions.grant_permissions(user, codes),
        )
        .await?;

        Ok(())
    }
}
