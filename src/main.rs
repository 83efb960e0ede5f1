use std::sync::Arc;

use hostmetrics::config::load_config;
use hostmetrics::startup::run;
use hostmetrics::utils::logger::init_logging;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = load_config();

    // load_config already validated the level.
    let level = config.level_filter().unwrap_or(LevelFilter::INFO);
    if let Err(e) = init_logging(&config.logging, level) {
        eprintln!("Error initializing logging: {}", e);
        std::process::exit(1);
    }

    info!("Starting metrics collector application");
    if let Err(e) = run(Arc::new(config)).await {
        error!("Critical error: {}", e);
        std::process::exit(1);
    }
}
