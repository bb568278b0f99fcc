//! Postgres for repository tests: one container per test binary, one freshly
//! migrated database per test.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use sqlx::{Connection, PgConnection, PgPool};
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::OnceCell;

use crate::domain::users::records::UserId;

const USER: &str = "reel_test";
const PASSWORD: &str = "reel_test_password";

static CONTAINER: Lazy<OnceCell<ContainerAsync<PostgresImage>>> = Lazy::new(OnceCell::new);
static NEXT_DATABASE: AtomicU64 = AtomicU64::new(0);

async fn start_container() -> ContainerAsync<PostgresImage> {
    PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name(USER)
        .start()
        .await
        .expect("Failed to start PostgreSQL container")
}

/// A migrated database of its own inside the shared container.
#[derive(Debug, Clone)]
pub struct TestDb {
    pub pool: PgPool,
}

impl TestDb {
    pub async fn new() -> Self {
        let container = CONTAINER.get_or_init(start_container).await;

        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get container port");

        let host = std::env::var("TESTCONTAINERS_HOST_OVERRIDE")
            .unwrap_or_else(|_| "localhost".to_owned());

        let name = format!(
            "reel_{}_{}",
            std::process::id(),
            NEXT_DATABASE.fetch_add(1, Ordering::Relaxed)
        );

        let mut admin =
            PgConnection::connect(&format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{USER}"))
                .await
                .expect("Failed to connect to the admin database");

        sqlx::query(&format!("CREATE DATABASE \"{name}\""))
            .execute(&mut admin)
            .await
            .expect("Failed to create test database");

        admin
            .close()
            .await
            .expect("Failed to close admin connection");

        let pool = PgPool::connect(&format!("postgresql://{USER}:{PASSWORD}@{host}:{port}/{name}"))
            .await
            .expect("Failed to connect to test database");

        crate::database::migrate(&pool)
            .await
            .expect("Failed to run migrations");

        Self { pool }
    }
}

/// Insert an account directly, bypassing registration and password hashing.
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    activated: bool,
) -> Result<UserId, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, password_hash, activated) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind("Test User")
    .bind(email)
    .bind("$argon2id$v=19$m=19456,t=2,p=1$stub$stub")
    .bind(activated)
    .fetch_one(pool)
    .await?;

    Ok(UserId::from_i64(id))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn databases_are_isolated_and_migrated() -> TestResult {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        insert_user(&first.pool, "first@example.com", true).await?;

        let in_first: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(&first.pool)
            .await?;
        let in_second: i64 = sqlx::query_scalar("SELECT count(*) FROM users")
            .fetch_one(&second.pool)
            .await?;

        assert_eq!(in_first, 1);
        assert_eq!(in_second, 0);

        Ok(())
    }
}
