// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Arc, OnceLock};

use super::controller::CircuitController;
use crate::{BuildError, ControlError};

/// Opens and closes a circuit breaker independently of its traffic.
///
/// A manual control is handed to [`CircuitBreakerOptions::manual_control`][super::CircuitBreakerOptions::manual_control]
/// and becomes usable once the pipeline is built. One manual control serves exactly one circuit
/// breaker; clones share the same attachment.
///
/// # Examples
///
/// ```rust
/// use airbag::PipelineBuilder;
/// use airbag::breaker::{CircuitBreakerManualControl, CircuitBreakerOptions, CircuitBreakerStateProvider, CircuitState};
/// use tick::Clock;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let control = CircuitBreakerManualControl::new();
/// let state = CircuitBreakerStateProvider::new();
///
/// let _pipeline = PipelineBuilder::new(&Clock::new_frozen())
///     .add_circuit_breaker(CircuitBreakerOptions::new().manual_control(&control).state_provider(&state))
///     .build()?;
///
/// control.isolate().await?;
/// assert_eq!(state.circuit_state(), CircuitState::Isolated);
///
/// control.close().await?;
/// assert_eq!(state.circuit_state(), CircuitState::Closed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerManualControl {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    controller: OnceLock<Arc<CircuitController>>,
    isolated_on_attach: bool,
}

impl CircuitBreakerManualControl {
    /// Creates a manual control that leaves the circuit closed when attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manual control that isolates the circuit as soon as it is attached.
    #[must_use]
    pub fn new_isolated() -> Self {
        Self {
            inner: Arc::new(Inner {
                controller: OnceLock::new(),
                isolated_on_attach: true,
            }),
        }
    }

    /// Returns `true` once the control is attached to the circuit breaker of a built pipeline.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.controller.get().is_some()
    }

    /// Isolates the circuit: every execution is rejected with [`IsolatedCircuit`][crate::IsolatedCircuit]
    /// until [`close`][Self::close] is called. Isolating an isolated circuit does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotAttached`] when the control is not attached yet.
    #[expect(clippy::unused_async, reason = "part of the public async contract")]
    pub async fn isolate(&self) -> Result<(), ControlError> {
        self.controller()?.isolate();
        Ok(())
    }

    /// Closes the circuit and resets its sampled health. Closing a closed circuit only resets the health.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::NotAttached`] when the control is not attached yet.
    #[expect(clippy::unused_async, reason = "part of the public async contract")]
    pub async fn close(&self) -> Result<(), ControlError> {
        self.controller()?.close();
        Ok(())
    }

    pub(super) fn ensure_detached(&self) -> Result<(), BuildError> {
        if self.is_attached() {
            return Err(BuildError::ManualControlAttached);
        }

        Ok(())
    }

    pub(super) fn attach(&self, controller: &Arc<CircuitController>) -> Result<(), BuildError> {
        self.inner
            .controller
            .set(Arc::clone(controller))
            .map_err(|_already_attached| BuildError::ManualControlAttached)?;

        if self.inner.isolated_on_attach {
            controller.isolate();
        }

        Ok(())
    }

    fn controller(&self) -> Result<&CircuitController, ControlError> {
        self.inner.controller.get().map(AsRef::as_ref).ok_or(ControlError::NotAttached)
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn detached_control_rejects_commands() {
        let control = CircuitBreakerManualControl::new();

        assert!(!control.is_attached());
        assert_eq!(block_on(control.isolate()), Err(ControlError::NotAttached));
        assert_eq!(block_on(control.close()), Err(ControlError::NotAttached));
        control.ensure_detached().unwrap();
    }

    #[test]
    fn clones_share_attachment_state() {
        let control = CircuitBreakerManualControl::new_isolated();
        let clone = control.clone();

        assert!(control.inner.isolated_on_attach);
        assert!(Arc::ptr_eq(&control.inner, &clone.inner));
    }
}
