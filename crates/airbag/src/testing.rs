// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Test utilities shared by unit tests.

#[cfg(feature = "logs")]
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use opentelemetry::KeyValue;
use opentelemetry_sdk::metrics::data::{AggregatedMetrics, Metric, MetricData};
use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
#[cfg(feature = "logs")]
use tracing_subscriber::fmt::MakeWriter;

use crate::telemetry::{EventKind, Severity, Telemetry, TelemetryEvent, TelemetryOptions, TelemetrySink, TelemetrySource};

/// An owned copy of a telemetry event.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedEvent {
    pub pipeline_name: String,
    pub instance_name: Option<String>,
    pub strategy_name: Option<String>,
    pub operation_key: Option<String>,
    pub severity: Severity,
    pub kind: EventKind,
}

/// Sink that records every event it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().into_iter().map(|e| e.kind).collect()
    }
}

impl TelemetrySink for RecordingSink {
    fn on_event(&self, event: &TelemetryEvent<'_>) {
        let source = event.source();
        self.events.lock().unwrap().push(RecordedEvent {
            pipeline_name: source.pipeline_name().to_owned(),
            instance_name: source.instance_name().map(ToOwned::to_owned),
            strategy_name: source.strategy_name().map(ToOwned::to_owned),
            operation_key: event.operation_key().map(ToOwned::to_owned),
            severity: event.severity(),
            kind: event.kind(),
        });
    }
}

/// Creates telemetry for a pipeline named `pipeline` that records every event.
pub(crate) fn recording_telemetry() -> (Arc<RecordingSink>, Telemetry) {
    let sink = Arc::new(RecordingSink::default());
    let options = TelemetryOptions {
        sinks: vec![Arc::clone(&sink) as Arc<dyn TelemetrySink>],
        severity_provider: None,
    };

    (sink, Telemetry::new(TelemetrySource::new("pipeline".into(), None), Arc::new(options)))
}

/// Value that counts how many of its instances were dropped.
#[derive(Debug)]
pub(crate) struct DropCounter {
    pub id: u32,
    drops: Arc<AtomicUsize>,
}

impl DropCounter {
    pub fn new(id: u32, drops: &Arc<AtomicUsize>) -> Self {
        Self {
            id,
            drops: Arc::clone(drops),
        }
    }
}

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test helper for collecting and asserting on `OTel` metrics.
#[derive(Debug)]
pub(crate) struct MetricTester {
    exporter: InMemoryMetricExporter,
    provider: SdkMeterProvider,
}

impl MetricTester {
    #[must_use]
    pub fn new() -> Self {
        let in_memory = InMemoryMetricExporter::default();

        Self {
            exporter: in_memory.clone(),
            provider: SdkMeterProvider::builder().with_periodic_exporter(in_memory).build(),
        }
    }

    #[must_use]
    pub fn meter_provider(&self) -> &SdkMeterProvider {
        &self.provider
    }

    #[must_use]
    pub fn collect_attributes(&self) -> Vec<KeyValue> {
        self.provider.force_flush().unwrap();
        self.exporter
            .get_finished_metrics()
            .unwrap()
            .iter()
            .flat_map(opentelemetry_sdk::metrics::data::ResourceMetrics::scope_metrics)
            .flat_map(opentelemetry_sdk::metrics::data::ScopeMetrics::metrics)
            .flat_map(collect_attributes_for_metric)
            .collect()
    }

    pub fn assert_attributes_contain(&self, key_values: &[KeyValue]) {
        let attributes = self.collect_attributes();

        for attr in key_values {
            assert!(
                attributes.contains(attr),
                "attribute {attr:?} not found in collected attributes: {attributes:?}"
            );
        }
    }
}

fn collect_attributes_for_metric(metric: &Metric) -> Vec<KeyValue> {
    match metric.data() {
        AggregatedMetrics::U64(MetricData::Sum(data)) => data.data_points().flat_map(|v| v.attributes().cloned()).collect(),
        _ => Vec::new(),
    }
}

/// Log capture buffer for testing.
#[cfg(feature = "logs")]
///
/// Use with `tracing::subscriber::set_default()` for thread-local capture.
#[derive(Debug, Clone, Default)]
pub(crate) struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

#[cfg(feature = "logs")]
impl LogCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }

    pub fn assert_contains(&self, expected: &str) {
        let output = self.output();
        assert!(
            output.contains(expected),
            "log output does not contain '{expected}', got:\n{output}"
        );
    }

    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish()
    }
}

#[cfg(feature = "logs")]
impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogCaptureWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}

#[cfg(feature = "logs")]
pub(crate) struct LogCaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

#[cfg(feature = "logs")]
impl Write for LogCaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
