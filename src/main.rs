use account_data::repositories::{AccountRepository, MongoAccountRepository};
use account_data::InMemoryAccountRepository;
use account_domain::{JwtTokenService, Pbkdf2HashingService};
use account_service::{router, AppState, Settings, StorageBackend};
use anyhow::Context;
use clap::Parser;
use mongodb::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file_loaded = dotenvy::dotenv().is_ok();
    let settings = Settings::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if env_file_loaded {
        info!("loaded .env file");
    }

    settings.validate().context("invalid configuration")?;

    let token_service = JwtTokenService::new(settings.token_config()?)
        .context("failed to build token service")?;
    let hashing_service = Pbkdf2HashingService::new(settings.iterations()?);
    let account_repository = build_repository(&settings).await?;

    let state = AppState::new(
        account_repository,
        Arc::new(token_service),
        Arc::new(hashing_service),
    );
    let app = router(state);

    let addr = settings.bind_address()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "account service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("account service stopped");
    Ok(())
}

async fn build_repository(settings: &Settings) -> anyhow::Result<Arc<dyn AccountRepository>> {
    match settings.storage_backend {
        StorageBackend::Memory => {
            warn!("using in-memory storage, accounts are lost on restart");
            Ok(Arc::new(InMemoryAccountRepository::new()))
        }
        StorageBackend::Mongo => {
            let client = Client::with_uri_str(&settings.mongo_uri)
                .await
                .context("failed to connect to MongoDB")?;
            let db = client.database(&settings.mongo_db_name);

            let repository = MongoAccountRepository::new(
                Arc::new(RwLock::new(db)),
                settings.accounts_collection.clone(),
            );
            repository
                .ensure_indexes()
                .await
                .context("failed to create account indexes")?;
            info!(
                database = %settings.mongo_db_name,
                collection = %settings.accounts_collection,
                "MongoDB storage ready"
            );

            Ok(Arc::new(repository))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
