// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use super::TelemetryEvent;

/// Receives telemetry events emitted by a pipeline.
///
/// Sinks are invoked synchronously on the execution path, so implementations should return
/// quickly and must not block.
///
/// # Examples
///
/// ```rust
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// use airbag::telemetry::{TelemetryEvent, TelemetrySink};
///
/// #[derive(Debug, Default)]
/// struct CountingSink(AtomicUsize);
///
/// impl TelemetrySink for CountingSink {
///     fn on_event(&self, _event: &TelemetryEvent<'_>) {
///         self.0.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait TelemetrySink: Debug + Send + Sync {
    /// Called for every event whose severity is not [`Severity::None`][super::Severity::None].
    fn on_event(&self, event: &TelemetryEvent<'_>);
}
