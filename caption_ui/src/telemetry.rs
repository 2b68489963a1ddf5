use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    upload_counter: Counter<u64>,
    submission_counter: Counter<u64>,
    prediction_duration: Histogram<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        // TODO: deprecated crate to be replaced with an OLTP exporter
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = opentelemetry_sdk::metrics::SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("caption_ui");
        global::set_meter_provider(provider);

        let upload_counter = meter
            .u64_counter("uploads_total")
            .with_description("Total number of images offered to the page")
            .build();

        let submission_counter = meter
            .u64_counter("submissions_total")
            .with_description("Total number of caption submissions")
            .build();

        let boundaries = generate_boundaries(
            &[100, 500, 2_000, 10_000, 30_000],
            &[100, 250, 1_000, 5_000],
        );

        let prediction_duration = meter
            .u64_histogram("prediction_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Round trip to the prediction endpoint in milliseconds")
            .build();

        Ok(Metrics {
            upload_counter,
            submission_counter,
            prediction_duration,
            registry,
        })
    }

    pub fn record_upload(&self, source: &str, outcome: &str) {
        let attributes = vec![
            KeyValue::new("source", source.to_string()),
            KeyValue::new("outcome", outcome.to_string()),
        ];
        self.upload_counter.add(1, &attributes);
    }

    pub fn record_submission(&self, outcome: &str) {
        let attributes = vec![KeyValue::new("outcome", outcome.to_string())];
        self.submission_counter.add(1, &attributes);
    }

    pub fn record_prediction_duration(&self, duration_ms: u64, outcome: &str) {
        let attributes = vec![KeyValue::new("outcome", outcome.to_string())];
        self.prediction_duration.record(duration_ms, &attributes);
    }
}

/// Bucket boundaries walking `edges` pairwise, each span with its own step.
fn generate_boundaries(edges: &[i32], steps: &[usize]) -> Vec<f64> {
    let mut seen = HashSet::new();
    edges
        .windows(2)
        .zip(steps)
        .flat_map(|(span, &step)| (span[0]..=span[1]).step_by(step))
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
