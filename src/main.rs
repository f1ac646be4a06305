use irlfeed::config::env_loader::load_config;
use irlfeed::pipeline;
use irlfeed::tracing::setup_loki;
use std::error::Error;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let loki = setup_loki().await;
    let config = load_config();

    info!("Starting run with {:?}", config);

    let result = pipeline::run(&config).await;

    match &result {
        Ok(summary) => info!(
            "Run finished: {} candidates, {} events",
            summary.candidates, summary.events
        ),
        Err(err) => error!("Run failed: {}", err),
    }

    if let Some((controller, handle)) = loki {
        controller.shutdown().await;
        let _ = handle.await;
    }

    result.map(|_| ()).map_err(Into::into)
}
