// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::time::Duration;

/// The severity of a telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// The event is not reported.
    None,
    /// Diagnostic detail.
    Debug,
    /// Normal operation.
    Information,
    /// Something recoverable went wrong.
    Warning,
    /// Something went wrong and was surfaced to the caller.
    Error,
    /// The event requires immediate attention.
    Critical,
}

/// Identifies where a telemetry event originated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySource {
    pipeline_name: Cow<'static, str>,
    instance_name: Option<Cow<'static, str>>,
    strategy_name: Option<Cow<'static, str>>,
}

impl TelemetrySource {
    pub(crate) fn new(pipeline_name: Cow<'static, str>, instance_name: Option<Cow<'static, str>>) -> Self {
        Self {
            pipeline_name,
            instance_name,
            strategy_name: None,
        }
    }

    pub(crate) fn with_strategy(&self, strategy_name: Cow<'static, str>) -> Self {
        Self {
            strategy_name: Some(strategy_name),
            ..self.clone()
        }
    }

    /// The name of the pipeline.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// The instance name of the pipeline, if one was configured.
    #[must_use]
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// The name of the strategy, or `None` for pipeline-level events.
    #[must_use]
    pub fn strategy_name(&self) -> Option<&str> {
        self.strategy_name.as_deref()
    }
}

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum EventKind {
    /// A pipeline execution is about to start.
    PipelineExecuting,

    /// A pipeline execution completed.
    PipelineExecuted {
        /// Total duration of the execution.
        duration: Duration,
        /// Whether the final outcome was a success.
        healthy: bool,
    },

    /// A single attempt of a retry or hedging strategy completed.
    ExecutionAttempt {
        /// Zero-based attempt number.
        attempt_number: u32,
        /// Duration of the attempt.
        duration: Duration,
        /// Whether the outcome was handled by the strategy predicate.
        handled: bool,
    },

    /// A retry is about to be performed.
    OnRetry {
        /// Zero-based number of the attempt that is being retried.
        attempt_number: u32,
        /// Delay before the next attempt.
        delay: Duration,
        /// Duration of the attempt that was just completed.
        duration: Duration,
    },

    /// A hedged attempt is about to be launched.
    OnHedging {
        /// Zero-based number of the launched attempt.
        attempt_number: u32,
    },

    /// The timeout strategy cancelled an execution.
    OnTimeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The circuit opened.
    OnCircuitOpened {
        /// How long the circuit stays open.
        break_duration: Duration,
        /// Whether the transition was requested through manual control.
        is_manual: bool,
    },

    /// The circuit closed.
    OnCircuitClosed {
        /// Whether the transition was requested through manual control.
        is_manual: bool,
    },

    /// The circuit moved to half-open and lets a probe through.
    OnCircuitHalfOpened,
}

impl EventKind {
    /// The name of the event, as reported to sinks.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PipelineExecuting => "pipeline_executing",
            Self::PipelineExecuted { .. } => "pipeline_executed",
            Self::ExecutionAttempt { .. } => "execution_attempt",
            Self::OnRetry { .. } => "on_retry",
            Self::OnHedging { .. } => "on_hedging",
            Self::OnTimeout { .. } => "on_timeout",
            Self::OnCircuitOpened { .. } => "on_circuit_opened",
            Self::OnCircuitClosed { .. } => "on_circuit_closed",
            Self::OnCircuitHalfOpened => "on_circuit_half_opened",
        }
    }

    pub(crate) fn default_severity(&self) -> Severity {
        match self {
            Self::PipelineExecuting => Severity::Debug,
            Self::PipelineExecuted { .. } | Self::OnCircuitClosed { .. } => Severity::Information,
            Self::ExecutionAttempt { handled: true, .. }
            | Self::OnRetry { .. }
            | Self::OnHedging { .. }
            | Self::OnCircuitHalfOpened => Severity::Warning,
            Self::ExecutionAttempt { handled: false, .. } => Severity::Information,
            Self::OnTimeout { .. } | Self::OnCircuitOpened { .. } => Severity::Error,
        }
    }
}

/// A structured event emitted by a pipeline or one of its strategies.
#[derive(Debug, Clone)]
pub struct TelemetryEvent<'a> {
    pub(crate) source: &'a TelemetrySource,
    pub(crate) severity: Severity,
    pub(crate) operation_key: Option<&'a str>,
    pub(crate) kind: EventKind,
}

impl TelemetryEvent<'_> {
    /// Where the event originated.
    #[must_use]
    pub fn source(&self) -> &TelemetrySource {
        self.source
    }

    /// The severity of the event.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// The operation key of the execution that raised the event.
    #[must_use]
    pub fn operation_key(&self) -> Option<&str> {
        self.operation_key
    }

    /// What happened.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}
