use crate::prediction::{CaptionBackend, PredictionOutcome};
use crate::upload::file::ImageFile;
use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::{net::TcpListener, sync::Notify};

pub fn png(name: &str) -> ImageFile {
    ImageFile::new(name, "image/png", Bytes::from_static(b"\x89PNG\r\n\x1a"))
}

pub fn test_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

pub async fn spawn_endpoint(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Address that refuses connections: the listener is dropped right away.
pub async fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[derive(Clone)]
pub struct MockBackend {
    outcome: PredictionOutcome,
    calls: Arc<AtomicUsize>,
    gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl MockBackend {
    pub fn new(outcome: PredictionOutcome) -> Self {
        Self {
            outcome,
            calls: Arc::new(AtomicUsize::new(0)),
            gate: None,
        }
    }

    /// The backend signals `entered` once called and waits for `release`.
    pub fn gated(outcome: PredictionOutcome, entered: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((entered, release)),
            ..Self::new(outcome)
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }
}

#[async_trait]
impl CaptionBackend for MockBackend {
    async fn predict(&self, _file: ImageFile) -> PredictionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.notify_one();
            release.notified().await;
        }
        self.outcome.clone()
    }
}
