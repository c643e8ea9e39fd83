use std::sync::Arc;

use gumshoe::persist::{PersistenceMode, Persistor};
use gumshoe::server;
use gumshoe::settings::Settings;
use tracing::info;
use tracing_subscriber::EnvFilter;

// usage: gumshoe [config name], defaults to ./gumshoe.{toml,json,yaml} if present
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gumshoe=info")),
        )
        .init();

    let config_name = std::env::args().nth(1).unwrap_or_else(|| "gumshoe".into());
    let settings = Settings::load(&config_name)?;

    let store = Persistor::new(PersistenceMode::from(settings.database.path.clone()))?;
    if let Some(seed_file) = &settings.database.seed_file {
        store.seed_from_file(seed_file)?;
    }

    let bind = settings.server.bind.clone();
    let app = server::router(Arc::new(store), Arc::new(settings))?;
    let listener = tokio::net::TcpListener::bind(bind.as_str()).await?;
    info!(%bind, "gumshoe listening");
    axum::serve(listener, app).await?;
    Ok(())
}
