//! Users service.

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use sqlx::PgPool;
use tracing::{error, info};

use crate::{
    auth::{
        ACTIVATION_TOKEN_TTL, AUTHENTICATION_TOKEN_TTL, AccessError, AuthorizationGate,
        CredentialStore, DEFAULT_PERMISSIONS, IssuedToken, Scope, hash_password, verify_password,
    },
    concurrency::{ConcurrencyGuard, ConflictReporting, Version, VersionedStore},
    database::{self, DEFAULT_STORE_TIMEOUT},
    domain::{
        mailer::{Mailer, Message, Template},
        users::{
            data::{Credentials, NewUser, NewUserRecord, UserChanges},
            errors::{INSERT_USER, UsersServiceError},
            records::{UserId, UserRecord},
            repository::{PgUsersRepository, UsersRepository},
        },
    },
    lifecycle::Lifecycle,
};

#[automock]
#[async_trait]
pub trait UsersService: Send + Sync {
    /// Create an inactive account and queue its activation mail.
    async fn register_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError>;

    /// Consume an activation token and mark its owner activated.
    async fn activate_user(&self, plaintext: &str) -> Result<UserRecord, UsersServiceError>;

    /// Exchange an email and password for an authentication token.
    async fn create_authentication_token(
        &self,
        credentials: Credentials,
    ) -> Result<IssuedToken, UsersServiceError>;
}

#[derive(Clone)]
pub struct PgUsersService {
    repository: Arc<dyn UsersRepository>,
    credentials: CredentialStore,
    gate: AuthorizationGate,
    mailer: Arc<dyn Mailer>,
    lifecycle: Lifecycle,
    guard: ConcurrencyGuard,
    timeout: Duration,
}

impl fmt::Debug for PgUsersService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgUsersService")
            .field("credentials", &self.credentials)
            .field("gate", &self.gate)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PgUsersService {
    #[must_use]
    pub fn new(
        pool: PgPool,
        credentials: CredentialStore,
        gate: AuthorizationGate,
        mailer: Arc<dyn Mailer>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self::with_repository(
            Arc::new(PgUsersRepository::new(pool)),
            credentials,
            gate,
            mailer,
            lifecycle,
        )
    }

    #[must_use]
    pub fn with_repository(
        repository: Arc<dyn UsersRepository>,
        credentials: CredentialStore,
        gate: AuthorizationGate,
        mailer: Arc<dyn Mailer>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            repository,
            credentials,
            gate,
            mailer,
            lifecycle,
            guard: ConcurrencyGuard::new(DEFAULT_STORE_TIMEOUT),
            timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.guard = ConcurrencyGuard::new(timeout);
        self.timeout = timeout;
        self
    }

    fn queue_welcome_mail(&self, user: &UserRecord, token: IssuedToken) {
        let mailer = Arc::clone(&self.mailer);
        let message = Message {
            recipient: user.email.clone(),
            template: Template::UserWelcome,
            user: user.id,
            activation_token: token.plaintext,
        };

        self.lifecycle.spawn("users.welcome_mail", async move {
            if let Err(source) = mailer.send(&message).await {
                error!(user = %message.user, "failed to send welcome mail: {source}");
            }
        });
    }
}

#[async_trait]
impl UsersService for PgUsersService {
    async fn register_user(&self, user: NewUser) -> Result<UserRecord, UsersServiceError> {
        user.validate()?;

        let NewUser {
            name,
            email,
            password,
        } = user;

        let password = hash_password(password).await?;

        let created = database::bounded(
            INSERT_USER,
            self.timeout,
            self.repository.insert_user(&NewUserRecord {
                name,
                email,
                password,
            }),
        )
        .await?;

        let defaults: Vec<String> = DEFAULT_PERMISSIONS.iter().map(|code| (*code).to_owned()).collect();
        self.gate.grant(created.id, &defaults).await?;

        let token = self
            .credentials
            .issue_token(created.id, ACTIVATION_TOKEN_TTL, Scope::Activation)
            .await?;

        self.queue_welcome_mail(&created, token);

        info!(user = %created.id, "registered user");

        Ok(created)
    }

    async fn activate_user(&self, plaintext: &str) -> Result<UserRecord, UsersServiceError> {
        let subject = match self.credentials.verify_token(plaintext, Scope::Activation).await {
            Ok(subject) => subject,
            Err(AccessError::Unauthenticated) => {
                return Err(UsersServiceError::InvalidActivationToken);
            }
            Err(other) => return Err(other.into()),
        };

        let user = database::bounded(
            "users.find_by_id",
            self.timeout,
            self.repository.find_by_id(subject.id),
        )
        .await?
        .ok_or(UsersServiceError::NotFound)?;

        let changes = UserChanges {
            activated: true,
            ..UserChanges::from_record(&user)
        };

        let version = self
            .guard
            .apply(
                &UserVersions(self.repository.as_ref()),
                user.id,
                user.version,
                &changes,
                ConflictReporting::Distinguish,
            )
            .await?;

        self.credentials
            .revoke_all(user.id, Scope::Activation)
            .await?;

        info!(user = %user.id, "activated user");

        Ok(UserRecord {
            activated: true,
            version,
            ..user
        })
    }

    async fn create_authentication_token(
        &self,
        credentials: Credentials,
    ) -> Result<IssuedToken, UsersServiceError> {
        credentials.validate()?;

        let Credentials { email, password } = credentials;

        let user = database::bounded(
            "users.find_by_email",
            self.timeout,
            self.repository.find_by_email(&email),
        )
        .await?
        .ok_or(UsersServiceError::InvalidCredentials)?;

        if !verify_password(user.password.clone(), password).await? {
            return Err(UsersServiceError::InvalidCredentials);
        }

        let token = self
            .credentials
            .issue_token(user.id, AUTHENTICATION_TOKEN_TTL, Scope::Authentication)
            .await?;

        Ok(token)
    }
}

/// Exposes a users repository's conditional write to the guard.
struct UserVersions<'a>(&'a dyn UsersRepository);

#[async_trait]
impl VersionedStore<UserId, UserChanges> for UserVersions<'_> {
    async fn compare_and_increment(
        &self,
        id: UserId,
        expected: Version,
        changes: &UserChanges,
    ) -> Result<Option<Version>, sqlx::Error> {
        self.0.update_user(id, expected, changes).await
    }

    async fn exists(&self, id: UserId) -> Result<bool, sqlx::Error> {
        self.0.user_exists(id).await
    }
}
