use anyhow::Result;
use axum::{routing::get, Router};
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

mod config;
mod cycle;
mod error;
mod models;
mod routes;
mod schedule;
mod store;

use config::Config;
use store::{HealthStore, PgStore};

fn app<S: HealthStore>(store: S) -> Router {
    Router::new()
        .merge(routes::cycle::routes(store.clone()))
        .merge(routes::medication_logs::routes(store.clone()))
        .merge(routes::journal::routes(store.clone()))
        .merge(routes::schedule::routes(store))
        .route("/health", get(|| async { "✅ Backend up" }))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;

    let addr = config.socket_addr();
    tracing::info!("🧠 Server running at {}", addr);

    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app(PgStore::new(pool)).into_make_service(),
    )
    .await?;

    Ok(())
}
