use anyhow::{Context, Result};
use eess_prices::config::Config;
use eess_prices::registry::SensorRegistry;
use eess_prices::web::{self, AppState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    eess_prices::logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    info!(
        "eess-prices {} starting with {} configured sensor(s)",
        env!("APP_VERSION"),
        config.sensors.len()
    );
    if config.sensors.is_empty() {
        warn!("No sensors configured; the API will report an empty registry");
    }

    let registry = SensorRegistry::from_config(&config)
        .await
        .context("Invalid sensor configuration")?;
    let state = AppState::new(registry);

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let web_task = if config.web.enabled {
        let web_state = state.clone();
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            let shutdown = async move {
                let _ = stop_rx.await;
            };
            if let Err(e) = web::serve(web_state, &host, port, shutdown).await {
                error!("{e}");
            }
        }))
    } else {
        info!("Web API disabled");
        None
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutdown signal received");

    let _ = stop_tx.send(());
    if let Some(task) = web_task
        && let Err(e) = task.await
    {
        error!("Web server task failed: {e}");
    }

    state.registry.write().await.shutdown_all().await;
    info!("Shutdown complete");
    Ok(())
}
