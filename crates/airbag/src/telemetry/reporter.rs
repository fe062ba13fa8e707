// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;

use super::{EventKind, Severity, TelemetryEvent, TelemetrySink, TelemetrySource};
use crate::options::define_fn_wrapper;

define_fn_wrapper!(SeverityProvider(Fn(&TelemetryEvent<'_>) -> Severity));

/// Sinks and severity overrides shared by a pipeline and all of its strategies.
#[derive(Debug, Clone, Default)]
pub(crate) struct TelemetryOptions {
    pub(crate) sinks: Vec<Arc<dyn TelemetrySink>>,
    pub(crate) severity_provider: Option<SeverityProvider>,
}

/// Reports events on behalf of a single source.
#[derive(Debug, Clone)]
pub(crate) struct Telemetry {
    source: Arc<TelemetrySource>,
    options: Arc<TelemetryOptions>,
}

impl Telemetry {
    pub(crate) fn new(source: TelemetrySource, options: Arc<TelemetryOptions>) -> Self {
        Self {
            source: Arc::new(source),
            options,
        }
    }

    pub(crate) fn for_strategy(&self, strategy_name: Cow<'static, str>) -> Self {
        Self {
            source: Arc::new(self.source.with_strategy(strategy_name)),
            options: Arc::clone(&self.options),
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled() -> Self {
        Self::new(TelemetrySource::new("test".into(), None), Arc::default())
    }

    #[cfg(test)]
    pub(crate) fn source(&self) -> &TelemetrySource {
        &self.source
    }

    pub(crate) fn report(&self, operation_key: Option<&str>, kind: EventKind) {
        self.report_with_severity(operation_key, kind.default_severity(), kind);
    }

    pub(crate) fn report_with_severity(&self, operation_key: Option<&str>, severity: Severity, kind: EventKind) {
        if self.options.sinks.is_empty() {
            return;
        }

        let mut event = TelemetryEvent {
            source: &self.source,
            severity,
            operation_key,
            kind,
        };

        if let Some(provider) = &self.options.severity_provider {
            event.severity = provider.call(&event);
        }

        if event.severity == Severity::None {
            return;
        }

        for sink in &self.options.sinks {
            sink.on_event(&event);
        }
    }
}
