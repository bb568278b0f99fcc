use std::sync::Arc;

use clap::Args;
use reel_app::{
    auth::{CredentialStore, PgTokensRepository},
    clock::SystemClock,
    database,
    domain::users::records::UserId,
};

use super::ScopeArg;

#[derive(Debug, Args)]
pub(crate) struct RevokeTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User whose tokens are revoked
    #[arg(long)]
    user_id: i64,

    /// Scope to revoke
    #[arg(long, value_enum)]
    scope: ScopeArg,
}

pub(crate) async fn run(args: RevokeTokenArgs) -> Result<(), String> {
    let user = UserId::from_i64(args.user_id);

    let pool = database::connect(&args.database_url, 1)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let credentials = CredentialStore::new(
        Arc::new(PgTokensRepository::new(pool.clone())),
        Arc::new(SystemClock),
    );

    let revoked = credentials
        .revoke_all(user, args.scope.into())
        .await
        .map_err(|error| format!("failed to revoke tokens: {error}"))?;

    pool.close().await;

    if revoked == 0 {
        println!("user {user} held no matching tokens");
    } else {
        println!("revoked {revoked} token(s) for user {user}");
    }

    Ok(())
}
