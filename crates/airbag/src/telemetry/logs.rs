// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Sink that reports telemetry events as `tracing` events.

use super::{EventKind, Severity, TelemetryEvent, TelemetrySink};

#[derive(Debug, Default)]
pub(crate) struct LogSink;

impl TelemetrySink for LogSink {
    fn on_event(&self, event: &TelemetryEvent<'_>) {
        let source = event.source();
        let pipeline_name = source.pipeline_name();
        let instance_name = source.instance_name().unwrap_or_default();
        let strategy_name = source.strategy_name().unwrap_or_default();
        let operation_key = event.operation_key().unwrap_or_default();
        let event_name = event.kind().name();

        // Tracing level must be constant, so we use a macro to select the appropriate level.
        macro_rules! emit_event {
            (@level $level:ident, $($fields:tt)*) => {
                tracing::$level!(
                    resilience.pipeline.name = pipeline_name,
                    resilience.pipeline.instance = instance_name,
                    resilience.strategy.name = strategy_name,
                    resilience.operation.key = operation_key,
                    resilience.event.name = event_name,
                    $($fields)*
                    "airbag.event"
                )
            };
            ($($fields:tt)*) => {
                match event.severity() {
                    Severity::Critical | Severity::Error => emit_event!(@level error, $($fields)*),
                    Severity::Warning => emit_event!(@level warn, $($fields)*),
                    Severity::Information => emit_event!(@level info, $($fields)*),
                    Severity::Debug => emit_event!(@level debug, $($fields)*),
                    Severity::None => {}
                }
            };
        }

        match event.kind() {
            EventKind::PipelineExecuting | EventKind::OnCircuitHalfOpened => emit_event!(),
            EventKind::PipelineExecuted { duration, healthy } => emit_event!(
                resilience.execution.duration_ms = duration.as_millis(),
                resilience.execution.healthy = healthy,
            ),
            EventKind::ExecutionAttempt {
                attempt_number,
                duration,
                handled,
            } => emit_event!(
                resilience.attempt.number = attempt_number,
                resilience.attempt.duration_ms = duration.as_millis(),
                resilience.attempt.handled = handled,
            ),
            EventKind::OnRetry {
                attempt_number,
                delay,
                duration,
            } => emit_event!(
                resilience.attempt.number = attempt_number,
                resilience.attempt.duration_ms = duration.as_millis(),
                resilience.retry.delay_ms = delay.as_millis(),
            ),
            EventKind::OnHedging { attempt_number } => emit_event!(resilience.attempt.number = attempt_number,),
            EventKind::OnTimeout { timeout } => emit_event!(resilience.timeout_ms = timeout.as_millis(),),
            EventKind::OnCircuitOpened { break_duration, is_manual } => emit_event!(
                resilience.circuit_breaker.break_duration_ms = break_duration.as_millis(),
                resilience.circuit_breaker.manual = is_manual,
            ),
            EventKind::OnCircuitClosed { is_manual } => emit_event!(resilience.circuit_breaker.manual = is_manual,),
        }
    }
}
