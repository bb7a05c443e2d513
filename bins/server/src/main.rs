//! Folio API Server
//!
//! Main entry point for the Folio backend service.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use folio_api::{AppState, create_router};
use folio_core::storage::{BucketConfig, S3ObjectStore, StorageGateway};
use folio_db::{connect_with_pool, migration::Migrator};
use folio_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "folio=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = connect_with_pool(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");

    Migrator::up(&db, None).await?;
    info!("Database schema up to date");

    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        expires_in_secs: i64::try_from(config.jwt.token_expiry_secs)
            .context("jwt.token_expiry_secs out of range")?,
    });

    // Object store problems never stop the server; uploads fall back inline
    let bucket_config = Arc::new(BucketConfig::from(&config.object_store));
    info!(
        endpoint = %bucket_config.endpoint_url(),
        bucket = %bucket_config.bucket_name,
        public_url = ?bucket_config.public_base_url,
        "Object store configured"
    );
    let client = Arc::new(S3ObjectStore::new(&bucket_config));
    let storage = StorageGateway::new(client, bucket_config);
    storage.warm_up().await;

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
