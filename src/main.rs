use anyhow::Result;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    match env_file {
        Some(path) => info!("Loaded environment from {}", path.display()),
        None => debug!("No .env file, using process environment"),
    }
    // TMDB_API_KEY is validated when the client is built, before any request.
    moviefinder::app::run_server().await
}
