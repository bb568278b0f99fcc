use std::sync::Arc;

use clap::Args;
use reel_app::{
    auth::{AuthorizationGate, PgPermissionsRepository},
    database,
    domain::users::records::UserId,
};

#[derive(Debug, Args)]
pub(crate) struct GrantPermissionsArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// User that receives the permission codes
    #[arg(long)]
    user_id: i64,

    /// Permission code to grant, e.g. `movies:write`; repeatable
    #[arg(long = "code", required = true)]
    codes: Vec<String>,
}

pub(crate) async fn run(args: GrantPermissionsArgs) -> Result<(), String> {
    let user = UserId::from_i64(args.user_id);

    if !user.is_valid() {
        return Err("user-id must be positive".to_string());
    }

    if args.codes.iter().any(|code| code.trim().is_empty()) {
        return Err("permission codes cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url, 1)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let gate = AuthorizationGate::new(Arc::new(PgPermissionsRepository::new(pool.clone())));

    gate.grant(user, &args.codes)
        .await
        .map_err(|error| format!("failed to grant permissions: {error}"))?;

    pool.close().await;

    println!("granted {} to user {user}", args.codes.join(", "));

    Ok(())
}
