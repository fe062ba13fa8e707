// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Sink that counts telemetry events with an `OpenTelemetry` counter.

use opentelemetry::metrics::{Counter, Meter, MeterProvider};
use opentelemetry::{InstrumentationScope, KeyValue};

use super::{
    ATTEMPT_HANDLED, ATTEMPT_NUMBER, EVENT_NAME, EVENT_SEVERITY, EventKind, OPERATION_KEY, PIPELINE_INSTANCE, PIPELINE_NAME,
    STRATEGY_NAME, Severity, TelemetryEvent, TelemetrySink,
};

const METER_NAME: &str = "airbag";
const VERSION: &str = "v0.1.0";
const SCHEMA_URL: &str = "https://opentelemetry.io/schemas/1.47.0";

pub(crate) fn create_meter(meter_provider: &dyn MeterProvider) -> Meter {
    meter_provider.meter_with_scope(
        InstrumentationScope::builder(METER_NAME)
            .with_version(VERSION)
            .with_schema_url(SCHEMA_URL)
            .build(),
    )
}

pub(crate) fn create_resilience_event_counter(meter: &Meter) -> Counter<u64> {
    meter
        .u64_counter("resilience.event")
        .with_description("Emitted upon the occurrence of a resilience event.")
        .with_unit("u64")
        .build()
}

#[derive(Debug)]
pub(crate) struct MetricSink {
    resilience_events: Counter<u64>,
}

impl MetricSink {
    pub(crate) fn new(meter_provider: &dyn MeterProvider) -> Self {
        Self {
            resilience_events: create_resilience_event_counter(&create_meter(meter_provider)),
        }
    }
}

fn severity_name(severity: Severity) -> &'static str {
    match severity {
        Severity::None => "none",
        Severity::Debug => "debug",
        Severity::Information => "information",
        Severity::Warning => "warning",
        Severity::Error => "error",
        Severity::Critical => "critical",
    }
}

impl TelemetrySink for MetricSink {
    fn on_event(&self, event: &TelemetryEvent<'_>) {
        let source = event.source();
        let mut attributes = Vec::with_capacity(8);

        attributes.push(KeyValue::new(PIPELINE_NAME, source.pipeline_name().to_owned()));
        if let Some(instance) = source.instance_name() {
            attributes.push(KeyValue::new(PIPELINE_INSTANCE, instance.to_owned()));
        }
        if let Some(strategy) = source.strategy_name() {
            attributes.push(KeyValue::new(STRATEGY_NAME, strategy.to_owned()));
        }
        if let Some(key) = event.operation_key() {
            attributes.push(KeyValue::new(OPERATION_KEY, key.to_owned()));
        }
        attributes.push(KeyValue::new(EVENT_NAME, event.kind().name()));
        attributes.push(KeyValue::new(EVENT_SEVERITY, severity_name(event.severity())));

        match event.kind() {
            EventKind::ExecutionAttempt {
                attempt_number, handled, ..
            } => {
                attributes.push(KeyValue::new(ATTEMPT_NUMBER, i64::from(attempt_number)));
                attributes.push(KeyValue::new(ATTEMPT_HANDLED, handled));
            }
            EventKind::OnRetry { attempt_number, .. } | EventKind::OnHedging { attempt_number } => {
                attributes.push(KeyValue::new(ATTEMPT_NUMBER, i64::from(attempt_number)));
            }
            _ => {}
        }

        self.resilience_events.add(1, &attributes);
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
#[cfg(not(miri))]
mod tests {
    use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};

    use super::*;
    use crate::telemetry::TelemetrySource;
    use crate::testing::MetricTester;

    #[test]
    fn assert_definitions() {
        let exporter = InMemoryMetricExporter::default();
        let meter_provider = SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build();

        let meter = create_meter(&meter_provider);
        let resilience_events = create_resilience_event_counter(&meter);
        resilience_events.add(1, &[]);

        meter_provider.force_flush().unwrap();

        let metrics = exporter.get_finished_metrics().unwrap();
        let str = format!("{metrics:?}");

        assert!(str.contains("resilience.event"));
        assert!(str.contains("u64"));
        assert!(str.contains("airbag"));
        assert!(str.contains("v0.1.0"));
        assert!(str.contains("https://opentelemetry.io/schemas/1.47"));
    }

    #[test]
    fn attempt_event_attributes() {
        let tester = MetricTester::new();
        let sink = MetricSink::new(tester.meter_provider());
        let source = TelemetrySource::new("orders".into(), None).with_strategy("retry".into());

        sink.on_event(&TelemetryEvent {
            source: &source,
            severity: Severity::Warning,
            operation_key: Some("get_order"),
            kind: EventKind::ExecutionAttempt {
                attempt_number: 1,
                duration: std::time::Duration::ZERO,
                handled: true,
            },
        });

        tester.assert_attributes_contain(&[
            KeyValue::new(PIPELINE_NAME, "orders"),
            KeyValue::new(STRATEGY_NAME, "retry"),
            KeyValue::new(OPERATION_KEY, "get_order"),
            KeyValue::new(EVENT_NAME, "execution_attempt"),
            KeyValue::new(EVENT_SEVERITY, "warning"),
            KeyValue::new(ATTEMPT_NUMBER, 1_i64),
            KeyValue::new(ATTEMPT_HANDLED, true),
        ]);
    }

    #[test]
    fn pipeline_event_has_no_strategy_name() {
        let tester = MetricTester::new();
        let sink = MetricSink::new(tester.meter_provider());
        let source = TelemetrySource::new("orders".into(), Some("eu".into()));

        sink.on_event(&TelemetryEvent {
            source: &source,
            severity: Severity::Debug,
            operation_key: None,
            kind: EventKind::PipelineExecuting,
        });

        let attributes = tester.collect_attributes();
        assert!(attributes.contains(&KeyValue::new(PIPELINE_INSTANCE, "eu")));
        assert!(attributes.iter().all(|kv| kv.key.as_str() != STRATEGY_NAME));
    }
}
