use crate::config::PredictionServiceConfig;
use crate::error::ENDPOINT_FALLBACK_MESSAGE;
use crate::upload::file::ImageFile;
use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

/// Multipart field the prediction endpoint reads the upload from.
pub const IMAGE_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum PredictionServiceError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Result of one round trip to the prediction endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionOutcome {
    Success(String),
    EndpointFailure(String),
    TransportFailure,
}

#[derive(Deserialize)]
struct PredictResponse {
    caption: String,
}

#[derive(Deserialize)]
struct PredictErrorBody {
    error: Option<String>,
}

#[async_trait]
pub trait CaptionBackend: Send + Sync + 'static {
    async fn predict(&self, file: ImageFile) -> PredictionOutcome;
}

pub struct PredictionService {
    client: Client,
    predict_url: String,
}

impl PredictionService {
    pub fn new(config: &PredictionServiceConfig) -> Result<Self, PredictionServiceError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config.get_predict_url()))
    }

    pub fn with_client(client: Client, predict_url: impl Into<String>) -> Self {
        Self {
            client,
            predict_url: predict_url.into(),
        }
    }

    pub fn predict_url(&self) -> &str {
        &self.predict_url
    }

    fn build_form(file: ImageFile) -> Result<multipart::Form, reqwest::Error> {
        // Streams the shared upload buffer instead of copying it.
        let length = file.bytes.len() as u64;
        let part = multipart::Part::stream_with_length(file.bytes, length)
            .file_name(file.name)
            .mime_str(&file.mime_type)?;

        Ok(multipart::Form::new().part(IMAGE_FIELD, part))
    }
}

#[async_trait]
impl CaptionBackend for PredictionService {
    #[instrument(skip(self, file), fields(file = %file.name, mime_type = %file.mime_type, size = file.size))]
    async fn predict(&self, file: ImageFile) -> PredictionOutcome {
        let form = match Self::build_form(file) {
            Ok(form) => form,
            Err(e) => {
                tracing::error!("Failed to build multipart payload: {:?}", e);
                return PredictionOutcome::TransportFailure;
            }
        };

        let response = match self.client.post(&self.predict_url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Prediction request failed: {:?}", e);
                return PredictionOutcome::TransportFailure;
            }
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<PredictResponse>().await {
                Ok(body) => {
                    tracing::debug!(caption = %body.caption, "Prediction succeeded");
                    PredictionOutcome::Success(body.caption)
                }
                // No caption to show, so this is reported like a failed upload.
                Err(e) => {
                    tracing::error!("Failed to decode prediction response: {:?}", e);
                    PredictionOutcome::TransportFailure
                }
            };
        }

        let message = response
            .json::<PredictErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| ENDPOINT_FALLBACK_MESSAGE.to_string());

        tracing::warn!(status = %status, "Prediction endpoint returned an error: {}", message);
        PredictionOutcome::EndpointFailure(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{png, spawn_endpoint, test_client, unreachable_endpoint};
    use axum::{extract::Multipart, http::StatusCode, routing::post, Json, Router};
    use bytes::Bytes;
    use serde_json::{json, Value};

    async fn describe_upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap();

            if name == IMAGE_FIELD {
                let caption = format!("{file_name} {content_type} {}", bytes.len());
                return (StatusCode::OK, Json(json!({ "caption": caption })));
            }
        }

        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No image field" })),
        )
    }

    fn service(base_url: &str) -> PredictionService {
        PredictionService::with_client(test_client(), format!("{base_url}/predict"))
    }

    #[test]
    fn test_predict_url_from_config() {
        let config = PredictionServiceConfig {
            base_url: "http://backend:5000/".to_string(),
        };
        let service = PredictionService::new(&config).unwrap();
        assert_eq!(service.predict_url(), "http://backend:5000/predict");
    }

    #[tokio::test]
    async fn test_sends_file_under_image_field() {
        let base_url =
            spawn_endpoint(Router::new().route("/predict", post(describe_upload))).await;

        let outcome = service(&base_url).predict(png("dog.png")).await;

        assert_eq!(
            outcome,
            PredictionOutcome::Success("dog.png image/png 7".to_string())
        );
    }

    #[tokio::test]
    async fn test_sends_file_bytes_unchanged() {
        async fn checksum(mut multipart: Multipart) -> Json<Value> {
            let mut summary = String::new();
            while let Some(field) = multipart.next_field().await.unwrap() {
                if field.name() == Some(IMAGE_FIELD) {
                    let bytes = field.bytes().await.unwrap();
                    let sum: u64 = bytes.iter().map(|b| u64::from(*b)).sum();
                    summary = format!("{} {}", bytes.len(), sum);
                }
            }
            Json(json!({ "caption": summary }))
        }
        let base_url = spawn_endpoint(Router::new().route("/predict", post(checksum))).await;
        let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
        let expected_sum: u64 = payload.iter().map(|b| u64::from(*b)).sum();
        let file = ImageFile::new("large.png", "image/png", Bytes::from(payload));

        let outcome = service(&base_url).predict(file).await;

        assert_eq!(
            outcome,
            PredictionOutcome::Success(format!("{} {}", 256 * 1024, expected_sum))
        );
    }

    #[tokio::test]
    async fn test_success_returns_caption() {
        let router = Router::new().route(
            "/predict",
            post(|| async { Json(json!({ "caption": "a dog running" })) }),
        );
        let base_url = spawn_endpoint(router).await;

        let outcome = service(&base_url).predict(png("dog.png")).await;

        assert_eq!(outcome, PredictionOutcome::Success("a dog running".into()));
    }

    #[tokio::test]
    async fn test_error_body_message_is_surfaced() {
        let router = Router::new().route(
            "/predict",
            post(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad image" }))) }),
        );
        let base_url = spawn_endpoint(router).await;

        let outcome = service(&base_url).predict(png("dog.png")).await;

        assert_eq!(outcome, PredictionOutcome::EndpointFailure("bad image".into()));
    }

    #[tokio::test]
    async fn test_error_without_message_uses_fallback() {
        let router = Router::new()
            .route(
                "/predict",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/empty/predict",
                post(|| async { (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))) }),
            );
        let base_url = spawn_endpoint(router).await;

        let unparseable = service(&base_url).predict(png("dog.png")).await;
        let no_field = service(&format!("{base_url}/empty"))
            .predict(png("dog.png"))
            .await;

        let fallback = PredictionOutcome::EndpointFailure(ENDPOINT_FALLBACK_MESSAGE.into());
        assert_eq!(unparseable, fallback);
        assert_eq!(no_field, fallback);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let base_url = unreachable_endpoint().await;

        let outcome = service(&base_url).predict(png("dog.png")).await;

        assert_eq!(outcome, PredictionOutcome::TransportFailure);
    }

    #[tokio::test]
    async fn test_undecodable_success_is_transport_failure() {
        let router = Router::new().route("/predict", post(|| async { "not json" }));
        let base_url = spawn_endpoint(router).await;

        let outcome = service(&base_url).predict(png("dog.png")).await;

        assert_eq!(outcome, PredictionOutcome::TransportFailure);
    }
}
