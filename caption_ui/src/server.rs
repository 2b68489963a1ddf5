use crate::{
    config::Config, prediction::PredictionService, routes::api_routes, telemetry::Metrics,
    upload::SessionRegistry,
};
use axum::Router;
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

#[derive(Clone)]
pub struct SharedState {
    pub sessions: Arc<SessionRegistry<PredictionService>>,
    pub metrics: Arc<Metrics>,
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(
        sessions: Arc<SessionRegistry<PredictionService>>,
        config: &Config,
    ) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let metrics = Arc::new(Metrics::new()?);
        let metrics_layer = HttpMetricsLayerBuilder::new().build();

        let app_state = SharedState {
            sessions,
            metrics,
        };

        let router = Router::new()
            .merge(api_routes(config.upload.max_upload_bytes))
            .with_state(app_state)
            .layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(
        self,
        shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn({
            let mut shutdown_rx = shutdown_rx.resubscribe();
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown_rx.recv().await.ok();
                    })
                    .await?;
                Ok(())
            }
        });

        Ok(server_handle)
    }
}
