//! Users Repository

use async_trait::async_trait;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as, query_scalar};

use crate::{
    auth::PasswordDigest,
    concurrency::Version,
    domain::users::{
        data::{NewUserRecord, UserChanges},
        records::{UserId, UserRecord},
    },
};

const INSERT_USER_SQL: &str = include_str!("sql/insert_user.sql");
const FIND_USER_BY_EMAIL_SQL: &str = include_str!("sql/find_user_by_email.sql");
const FIND_USER_BY_ID_SQL: &str = include_str!("sql/find_user_by_id.sql");
const UPDATE_USER_SQL: &str = include_str!("sql/update_user.sql");
const USER_EXISTS_SQL: &str = include_str!("sql/user_exists.sql");

#[automock]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn insert_user(&self, user: &NewUserRecord) -> Result<UserRecord, sqlx::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, sqlx::Error>;

    /// Conditional write; `None` when no row had `expected` as its version.
    async fn update_user(
        &self,
        id: UserId,
        expected: Version,
        changes: &UserChanges,
    ) -> Result<Option<Version>, sqlx::Error>;

    async fn user_exists(&self, id: UserId) -> Result<bool, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgUsersRepository {
    pool: PgPool,
}

impl PgUsersRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UsersRepository for PgUsersRepository {
    async fn insert_user(&self, user: &NewUserRecord) -> Result<UserRecord, sqlx::Error> {
        query_as::<Postgres, UserRecord>(INSERT_USER_SQL)
            .bind(&user.name)
            .bind(&user.email)
            .bind(user.password.as_str())
            .fetch_one(&self.pool)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        query_as::<Postgres, UserRecord>(FIND_USER_BY_EMAIL_SQL)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>, sqlx::Error> {
        query_as::<Postgres, UserRecord>(FIND_USER_BY_ID_SQL)
            .bind(id.into_i64())
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_user(
        &self,
        id: UserId,
        expected: Version,
        changes: &UserChanges,
    ) -> Result<Option<Version>, sqlx::Error> {
        let version = query_scalar::<Postgres, i32>(UPDATE_USER_SQL)
            .bind(id.into_i64())
            .bind(expected.get())
            .bind(&changes.name)
            .bind(&changes.email)
            .bind(changes.password.as_str())
            .bind(changes.activated)
            .fetch_optional(&self.pool)
            .await?;

        Ok(version.map(Version::new))
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, sqlx::Error> {
        query_scalar::<Postgres, bool>(USER_EXISTS_SQL)
            .bind(id.into_i64())
            .fetch_one(&self.pool)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for UserRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: UserId::from_i64(row.try_get("id")?),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password: PasswordDigest::from_stored(row.try_get("password_hash")?),
            activated: row.try_get("activated")?,
            version: Version::new(row.try_get("version")?),
        })
    }
}
