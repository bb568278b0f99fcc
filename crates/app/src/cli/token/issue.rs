use std::{sync::Arc, time::Duration};

use clap::Args;
use reel_app::{
    auth::{CredentialStore, PgTokensRepository},
    clock::SystemClock,
    database,
    domain::users::records::UserId,
};

use super::ScopeArg;

#[derive(Debug, Args)]
pub(crate) struct IssueTokenArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User that should own the token
    #[arg(long)]
    user_id: i64,

    /// What the token may be used for
    #[arg(long, value_enum, default_value = "authentication")]
    scope: ScopeArg,

    /// Token lifetime in hours
    #[arg(long, default_value_t = 24)]
    ttl_hours: u64,
}

pub(crate) async fn run(args: IssueTokenArgs) -> Result<(), String> {
    let user = UserId::from_i64(args.user_id);

    if !user.is_valid() {
        return Err("user-id must be positive".to_string());
    }

    let ttl = args
        .ttl_hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| "ttl-hours is too large".to_string())?;

    let pool = database::connect(&args.database_url, 1)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let credentials = CredentialStore::new(
        Arc::new(PgTokensRepository::new(pool.clone())),
        Arc::new(SystemClock),
    );

    let issued = credentials
        .issue_token(user, ttl, args.scope.into())
        .await
        .map_err(|error| format!("failed to issue token: {error}"))?;

    pool.close().await;

    println!("user_id: {}", issued.user);
    println!("scope: {}", issued.scope);
    println!("expiry: {}", issued.expiry);
    println!("token: {}", issued.plaintext);
    println!("store this token now; it is only shown once");

    Ok(())
}
