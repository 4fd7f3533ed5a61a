use power_pro::api::routes::create_routes;
use power_pro::api::AppState;
use power_pro::config::{run_migrations, AppConfig, DatabaseConfig};
use power_pro::repos::Repos;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let app_config = AppConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;

    // Create database connection pool and bring the schema up to date
    let db = db_config.create_pool().await?;
    run_migrations(&db).await?;

    // Wire the repositories and services into the router
    let state = AppState::new(Repos::postgres(db), app_config.engine_config());
    let app = create_routes(state);

    // Start the server
    let listener = TcpListener::bind(&app_config.server_address()).await?;
    info!("PowerPro server starting on http://{}", app_config.server_address());
    info!("Health check available at http://{}/health", app_config.server_address());

    axum::serve(listener, app).await?;

    Ok(())
}
