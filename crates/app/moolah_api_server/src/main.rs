//! Moolah API server binary.

use std::sync::Arc;

use clap::Parser;
use moolah_api::config::ApiConfig;
use moolah_api::i18n::Messages;
use moolah_core::auth::{AuthService, DiscordOAuthClient};
use moolah_core::store::PgStore;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "moolah_api_server", about = "Moolah API server")]
struct Args {
    /// Port to listen on. Overrides the port of `BIND_ADDR`.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().or_else(|_| {
                tracing_subscriber::EnvFilter::try_new("info,moolah_api=debug,moolah_core=debug")
            })?,
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    if let Some(url) = args.database_url {
        config.pg_connection_url = url;
    }
    if let Some(port) = args.port {
        let host = config
            .bind_addr
            .rsplit_once(':')
            .map_or("127.0.0.1", |(host, _)| host);
        config.bind_addr = format!("{host}:{port}");
    }
    if config.discord_client_id.is_empty() || config.discord_client_secret.is_empty() {
        warn!("DISCORD_CLIENT_ID / DISCORD_CLIENT_SECRET not set; Discord login will fail");
    }

    info!(
        bind_addr = %config.bind_addr,
        max_connections = args.max_connections,
        "starting moolah_api_server"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    moolah_api::migrate(&pool).await?;

    let store = Arc::new(PgStore::new(pool));
    let oauth = Arc::new(DiscordOAuthClient::new(config.discord()));
    let auth = AuthService::new(store.clone(), store.clone(), oauth, &config.jwt_secret);
    let state = moolah_api::AppState::new(auth, store, Arc::new(Messages));

    let app = moolah_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "RPC API listening");

    axum::serve(listener, app).await?;

    Ok(())
}
