use crate::config::Config;
use crate::prediction::PredictionService;
use crate::server::HttpServer;
use crate::upload::SessionRegistry;

use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let prediction_service = match PredictionService::new(&config.prediction_service) {
        Ok(service) => service,
        Err(e) => {
            tracing::error!("Failed to initialize prediction service: {:?}", e);
            return Err(Box::new(e));
        }
    };
    tracing::info!(
        predict_url = prediction_service.predict_url(),
        "Prediction endpoint configured"
    );

    let sessions = Arc::new(SessionRegistry::new(
        prediction_service,
        config.upload.max_sessions,
    ));
    let server = HttpServer::new(sessions, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Err(e)) => tracing::error!("Server stopped with an error: {:?}", e),
        Err(e) => tracing::error!("Server task failed: {:?}", e),
        Ok(Ok(())) => {}
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
