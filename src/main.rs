use std::net::SocketAddr;

use axum_file_service::{build_router, config::Config, logging, LocalFileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("FILE_SERVICE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load_or_default(&config_path)?;

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        logging::init_console_only(&config.logging.level);
    }

    let store = LocalFileStore::new(&config.storage);
    let app = build_router(&config.server, store);

    let addr: SocketAddr = config.bind_address().parse()?;
    tracing::info!(
        "Serving files from {} on {}",
        config.storage.root.display(),
        addr
    );

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;

    Ok(())
}
