//! Credential issuance, verification, and revocation.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use jiff::{SignedDuration, Timestamp};
use mockall::automock;
use tracing::debug;

use crate::{
    auth::{
        AccessError, Scope, Subject, TokenDigest, digest_token, format_token,
        generate_token_secret, is_well_formed,
    },
    clock::Clock,
    database::{self, DEFAULT_STORE_TIMEOUT},
    domain::users::records::UserId,
    errors::capture_internal,
};

/// Lifetime of an activation token.
pub const ACTIVATION_TOKEN_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Lifetime of an authentication token.
pub const AUTHENTICATION_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Token row as written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewToken {
    pub digest: TokenDigest,
    pub user: UserId,
    pub scope: Scope,
    pub expiry: Timestamp,
}

/// Freshly issued token. The plaintext exists only here.
#[derive(Clone)]
pub struct IssuedToken {
    pub plaintext: String,
    pub user: UserId,
    pub scope: Scope,
    pub expiry: Timestamp,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("plaintext", &"**redacted**")
            .field("user", &self.user)
            .field("scope", &self.scope)
            .field("expiry", &self.expiry)
            .finish()
    }
}

#[automock]
#[async_trait]
pub trait TokensRepository: Send + Sync {
    async fn insert_token(&self, token: &NewToken) -> Result<(), sqlx::Error>;

    /// Resolve the owner of an unexpired token, joined with its activation state.
    async fn find_subject(
        &self,
        digest: &TokenDigest,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<Subject>, sqlx::Error>;

    async fn delete_tokens(&self, user: UserId, scope: Scope) -> Result<u64, sqlx::Error>;
}

#[derive(Clone)]
pub struct CredentialStore {
    tokens: Arc<dyn TokensRepository>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("clock", &self.clock)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl CredentialStore {
    #[must_use]
    pub fn new(tokens: Arc<dyn TokensRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tokens,
            clock,
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Deadline applied to every token store call.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issue a token for `user` that expires `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidTtl`] for a zero or unrepresentable
    /// lifetime, or a store error if the digest cannot be persisted.
    pub async fn issue_token(
        &self,
        user: UserId,
        ttl: Duration,
        scope: Scope,
    ) -> Result<IssuedToken, AccessError> {
        let expiry = SignedDuration::try_from(ttl)
            .ok()
            .filter(|ttl| ttl.is_positive())
            .and_then(|ttl| self.clock.now().checked_add(ttl).ok());

        let Some(expiry) = expiry else {
            return Err(capture_internal("tokens.issue", AccessError::InvalidTtl));
        };

        let plaintext = format_token(&generate_token_secret());
        let token = NewToken {
            digest: digest_token(&plaintext),
            user,
            scope,
            expiry,
        };

        database::bounded("tokens.insert", self.timeout, self.tokens.insert_token(&token)).await?;

        debug!(user = %user, scope = %scope, "issued token");

        Ok(IssuedToken {
            plaintext,
            user,
            scope,
            expiry,
        })
    }

    /// Resolve the subject a plaintext token belongs to.
    ///
    /// Malformed plaintext is rejected before any lookup. Unknown, expired, and
    /// wrong-scope tokens are indistinguishable to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthenticated`] when no live token matches, or a
    /// store error.
    pub async fn verify_token(&self, plaintext: &str, scope: Scope) -> Result<Subject, AccessError> {
        if !is_well_formed(plaintext) {
            return Err(AccessError::Unauthenticated);
        }

        let digest = digest_token(plaintext);
        let now = self.clock.now();

        database::bounded(
            "tokens.find_subject",
            self.timeout,
            self.tokens.find_subject(&digest, scope, now),
        )
        .await?
        .ok_or(AccessError::Unauthenticated)
    }

    /// Delete every token of `scope` held by `user`. Returns how many went.
    ///
    /// # Errors
    ///
    /// Returns a store error if the delete fails or times out.
    pub async fn revoke_all(&self, user: UserId, scope: Scope) -> Result<u64, AccessError> {
        let revoked = database::bounded(
            "tokens.delete",
            self.timeout,
            self.tokens.delete_tokens(user, scope),
        )
        .await?;

        debug!(user = %user, scope = %scope, revoked, "revoked tokens");

        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use testresult::TestResult;

    use crate::{
        clock::ManualClock,
        errors::{Classify, FailureKind},
        test::{CapturedLogs, InMemoryTokens},
    };

    use super::*;

    fn user(id: i64) -> UserId {
        UserId::from_i64(id)
    }

    fn store_with(
        tokens: &Arc<InMemoryTokens>,
    ) -> (CredentialStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Timestamp::UNIX_EPOCH));
        let store = CredentialStore::new(tokens.clone(), clock.clone());

        (store, clock)
    }

    #[tokio::test]
    async fn issued_token_verifies_in_its_own_scope() -> TestResult {
        let tokens = Arc::new(InMemoryTokens::default());
        tokens.add_user(user(7), true);
        let (store, _clock) = store_with(&tokens);

        let issued = store
            .issue_token(user(7), AUTHENTICATION_TOKEN_TTL, Scope::Authentication)
            .await?;

        assert_eq!(issued.plaintext.len(), 26);
        assert!(is_well_formed(&issued.plaintext));

        let subject = store
            .verify_token(&issued.plaintext, Scope::Authentication)
            .await?;

        assert_eq!(subject, Subject::new(user(7), true));

        Ok(())
    }

    #[tokio::test]
    async fn only_the_digest_is_stored() -> TestResult {
        let tokens = Arc::new(InMemoryTokens::default());
        tokens.add_user(user(7), true);
        let (store, _clock) = store_with(&tokens);

        let issued = store
            .issue_token(user(7), AUTHENTICATION_TOKEN_TTL, Scope::Authentication)
            .await?;

        let stored = tokens.stored();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].digest, digest_token(&issued.plaintext));
        assert_eq!(stored[0].expiry, issued.expiry);

        Ok(())
    }

    #[tokio::test]
    async fn token_never_verifies_for_another_scope() -> TestResult {
        let tokens = Arc::new(InMemoryTokens::default());
        tokens.add_user(user(7), false);
        let (store, _clock) = store_with(&tokens);

        let issued = store
            .issue_token(user(7), ACTIVATION_TOKEN_TTL, Scope::Activation)
            .await?;

        let result = store
            .verify_token(&issued.plaintext, Scope::Authentication)
            .await;

        assert!(matches!(result, Err(AccessError::Unauthenticated)));

        Ok(())
    }

    #[tokio::test]
    async fn token_expires_exactly_at_its_expiry() -> TestResult {
        let tokens = Arc::new(InMemoryTokens::default());
        tokens.add_user(user(7), true);
        let (store, clock) = store_with(&tokens);

        let issued = store
            .issue_token(user(7), Duration::from_secs(60), Scope::Authentication)
            .await?;

        clock.advance(Duration::from_secs(59));
        assert!(
            store
                .verify_token(&issued.plaintext, Scope::Authentication)
                .await
                .is_ok()
        );

        clock.advance(Duration::from_secs(1));
        assert!(matches!(
            store
                .verify_token(&issued.plaintext, Scope::Authentication)
                .await,
            Err(AccessError::Unauthenticated)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn malformed_plaintext_never_reaches_the_store() {
        let mut repository = MockTokensRepository::new();
        repository.expect_find_subject().never();

        let store = CredentialStore::new(
            Arc::new(repository),
            Arc::new(ManualClock::default()),
        );

        for plaintext in ["", "short", "abcdefghijklmnopqrstuvwxyz", "ABCDEFGHIJKLMNOPQRSTUVWXYZ0"] {
            let result = store.verify_token(plaintext, Scope::Authentication).await;

            assert!(matches!(result, Err(AccessError::Unauthenticated)));
        }
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected_and_logged_as_internal() {
        let logs = CapturedLogs::start();
        let tokens = Arc::new(InMemoryTokens::default());
        let (store, _clock) = store_with(&tokens);

        let result = store
            .issue_token(user(7), Duration::ZERO, Scope::Authentication)
            .await;

        assert!(matches!(result, Err(AccessError::InvalidTtl)));
        assert!(tokens.stored().is_empty());

        let output = logs.contents();
        assert!(output.contains("tokens.issue"), "missing context: {output}");
        assert!(output.contains("backtrace"), "missing backtrace: {output}");
    }

    #[test]
    fn default_timeout_is_the_store_default() {
        let store = CredentialStore::new(
            Arc::new(MockTokensRepository::new()),
            Arc::new(ManualClock::default()),
        );

        assert_eq!(store.timeout(), DEFAULT_STORE_TIMEOUT);
        assert_eq!(
            store.with_timeout(Duration::from_secs(9)).timeout(),
            Duration::from_secs(9)
        );
    }

    #[tokio::test]
    async fn revoke_all_only_touches_one_scope_of_one_user() -> TestResult {
        let tokens = Arc::new(InMemoryTokens::default());
        tokens.add_user(user(7), true);
        tokens.add_user(user(8), true);
        let (store, _clock) = store_with(&tokens);

        let activation = store
            .issue_token(user(7), ACTIVATION_TOKEN_TTL, Scope::Activation)
            .await?;
        let authentication = store
            .issue_token(user(7), AUTHENTICATION_TOKEN_TTL, Scope::Authentication)
            .await?;
        let other_user = store
            .issue_token(user(8), ACTIVATION_TOKEN_TTL, Scope::Activation)
            .await?;

        let revoked = store.revoke_all(user(7), Scope::Activation).await?;

        assert_eq!(revoked, 1);
        assert!(
            store
                .verify_token(&activation.plaintext, Scope::Activation)
                .await
                .is_err()
        );
        assert!(
            store
                .verify_token(&authentication.plaintext, Scope::Authentication)
                .await
                .is_ok()
        );
        assert!(
            store
                .verify_token(&other_user.plaintext, Scope::Activation)
                .await
                .is_ok()
        );

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_surfaces_as_timeout() {
        let tokens = Arc::new(InMemoryTokens::default().stalled());
        let store = CredentialStore::new(tokens, Arc::new(ManualClock::default()))
            .with_timeout(Duration::from_millis(50));

        let result = store
            .verify_token(&"A".repeat(26), Scope::Authentication)
            .await;

        assert!(matches!(&result, Err(error) if error.kind() == FailureKind::Timeout));
    }
}
