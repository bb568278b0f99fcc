use clap::Args;
use reel_app::database;

#[derive(Debug, Args)]
pub(crate) struct MigrateArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,
}

pub(crate) async fn run(args: MigrateArgs) -> Result<(), String> {
    let pool = database::connect(&args.database_url, 1)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    database::migrate(&pool)
        .await
        .map_err(|error| format!("failed to run migrations: {error}"))?;

    pool.close().await;

    println!("migrations applied");

    Ok(())
}
