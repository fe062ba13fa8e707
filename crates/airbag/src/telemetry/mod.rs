// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Telemetry emitted by pipelines and strategies.
//!
//! Every notable occurrence (an attempt, a retry, a hedge, a timeout, a circuit transition)
//! is described by a [`TelemetryEvent`] and delivered to every [`TelemetrySink`] registered
//! on the pipeline builder. The crate ships two sinks:
//!
//! - a `tracing` sink enabled with [`PipelineBuilder::enable_logs`][crate::PipelineBuilder::enable_logs]
//!   (`logs` feature)
//! - an `OpenTelemetry` sink enabled with
//!   [`PipelineBuilder::enable_metrics`][crate::PipelineBuilder::enable_metrics] (`metrics` feature)
//!
//! Each event carries a [`Severity`]. The default severity can be overridden per event with
//! [`PipelineBuilder::severity_provider`][crate::PipelineBuilder::severity_provider]; events
//! with [`Severity::None`] are dropped before reaching any sink.
//!
//! # Conventions
//!
//! Attribute keys follow the [OpenTelemetry naming guidelines](https://opentelemetry.io/docs/specs/semconv/general/naming/#general-naming-considerations):
//! keys are dot-separated and values are short, preferably in `snake_case`.

mod event;
mod reporter;
mod sink;

#[cfg(feature = "logs")]
pub(crate) mod logs;
#[cfg(any(feature = "metrics", test))]
pub(crate) mod metrics;

pub use event::{EventKind, Severity, TelemetryEvent, TelemetrySource};
pub(crate) use reporter::{SeverityProvider, Telemetry, TelemetryOptions};
pub use sink::TelemetrySink;

/// Key used to annotate the name of a resilience pipeline.
///
/// Examples: `user_auth`, `data_processing`, `payment_flow`.
pub const PIPELINE_NAME: &str = "resilience.pipeline.name";

/// Key used to annotate the instance name of a resilience pipeline.
pub const PIPELINE_INSTANCE: &str = "resilience.pipeline.instance";

/// Key used to annotate the name of a resilience strategy.
///
/// Examples: `retry`, `circuit_breaker`, `timeout`, `hedging`.
pub const STRATEGY_NAME: &str = "resilience.strategy.name";

/// Key used to annotate the specific resilience event being emitted.
///
/// Examples: `on_retry`, `on_timeout`, `on_circuit_opened`.
pub const EVENT_NAME: &str = "resilience.event.name";

/// Key used to annotate the severity of the event.
pub const EVENT_SEVERITY: &str = "resilience.event.severity";

/// Key used to annotate the operation key of the execution.
pub const OPERATION_KEY: &str = "resilience.operation.key";

/// Key used to annotate the zero-based attempt number.
pub const ATTEMPT_NUMBER: &str = "resilience.attempt.number";

/// Key used to annotate whether an attempt outcome was handled.
pub const ATTEMPT_HANDLED: &str = "resilience.attempt.handled";
