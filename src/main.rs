use std::sync::Arc;

use tracing::info;

use docshelf::store::DocumentStore;
use docshelf::{Config, WebServer};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load("config.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = docshelf::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        docshelf::logging::init_console_only(&config.logging.level);
    }

    info!("docshelf - document catalog service");

    let store = match DocumentStore::open(
        config.storage.blobs_dir(),
        config.storage.index_path(),
    )
    .await
    {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("Failed to open document store: {e}");
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config.server, store) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("Failed to configure web server: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}
