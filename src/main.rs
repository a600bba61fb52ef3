use authcore::api::{build_router, AppState};
use authcore::config::AppConfig;
use authcore::errors::Result;
use authcore::{observability, storage};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env for local development before anything reads the environment.
    let _ = dotenvy::dotenv();

    observability::init_tracing()?;

    let config = AppConfig::from_env()?;
    info!(version = authcore::VERSION, "starting {}", authcore::APP_NAME);

    let pool = storage::create_pool(&config.database).await?;
    storage::check_connection(&pool).await?;

    let state = AppState::new(pool, &config)?;
    let router = build_router(state, &config);

    let bind_address = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(address = %bind_address, "listening");

    axum::serve(listener, router).await?;

    Ok(())
}
