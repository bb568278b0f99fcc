//! Auth repositories.

use async_trait::async_trait;
use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{PgPool, Postgres, query, query_as, query_scalar};

use crate::{
    auth::{NewToken, Permissions, PermissionsRepository, Scope, Subject, TokenDigest, TokensRepository},
    domain::users::records::UserId,
};

const INSERT_TOKEN_SQL: &str = include_str!("sql/insert_token.sql");
const FIND_SUBJECT_BY_TOKEN_SQL: &str = include_str!("sql/find_subject_by_token.sql");
const DELETE_TOKENS_FOR_USER_SQL: &str = include_str!("sql/delete_tokens_for_user.sql");
const PERMISSIONS_FOR_USER_SQL: &str = include_str!("sql/permissions_for_user.sql");
const GRANT_PERMISSIONS_SQL: &str = include_str!("sql/grant_permissions.sql");

#[derive(Debug, Clone)]
pub struct PgTokensRepository {
    pool: PgPool,
}

impl PgTokensRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokensRepository for PgTokensRepository {
    async fn insert_token(&self, token: &NewToken) -> Result<(), sqlx::Error> {
        query(INSERT_TOKEN_SQL)
            .bind(token.digest.as_bytes().as_slice())
            .bind(token.user.into_i64())
            .bind(SqlxTimestamp::from(token.expiry))
            .bind(token.scope.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_subject(
        &self,
        digest: &TokenDigest,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<Subject>, sqlx::Error> {
        let row: Option<(i64, bool)> = query_as::<Postgres, (i64, bool)>(FIND_SUBJECT_BY_TOKEN_SQL)
            .bind(digest.as_bytes().as_slice())
            .bind(scope.as_str())
            .bind(SqlxTimestamp::from(now))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, activated)| Subject::new(UserId::from_i64(id), activated)))
    }

    async fn delete_tokens(&self, user: UserId, scope: Scope) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_TOKENS_FOR_USER_SQL)
            .bind(user.into_i64())
            .bind(scope.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

#[derive(Debug, Clone)]
pub struct PgPermissionsRepository {
    pool: PgPool,
}

impl PgPermissionsRepository {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionsRepository for PgPermissionsRepository {
    async fn permissions_for_user(&self, user: UserId) -> Result<Permissions, sqlx::Error> {
        let codes: Vec<String> = query_scalar::<Postgres, String>(PERMISSIONS_FOR_USER_SQL)
            .bind(user.into_i64())
            .fetch_all(&self.pool)
            .await?;

        Ok(codes.into_iter().collect())
    }

    async fn grant_permissions(&self, user: UserId, codes: &[String]) -> Result<(), sqlx::Error> {
        query(GRANT_PERMISSIONS_SQL)
            .bind(user.into_i64())
            .bind(codes)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
