// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::{Arc, OnceLock};

use super::CircuitState;
use super::controller::CircuitController;
use crate::{BuildError, Failure};

/// Read-only view of the state of a circuit breaker.
///
/// Handed to [`CircuitBreakerOptions::state_provider`][super::CircuitBreakerOptions::state_provider]
/// and initialized when the pipeline is built. One provider serves exactly one circuit breaker.
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerStateProvider {
    controller: Arc<OnceLock<Arc<CircuitController>>>,
}

impl CircuitBreakerStateProvider {
    /// Creates a provider that is not attached to any circuit breaker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the provider is attached to the circuit breaker of a built pipeline.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.controller.get().is_some()
    }

    /// The current state of the circuit. [`CircuitState::Closed`] before initialization.
    ///
    /// An open circuit whose break duration elapsed reports [`CircuitState::HalfOpen`].
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.controller
            .get()
            .map_or(CircuitState::Closed, |controller| controller.circuit_state())
    }

    /// The last failure handled by the circuit breaker since the circuit was last closed.
    #[must_use]
    pub fn last_failure(&self) -> Option<Failure> {
        self.controller.get().and_then(|controller| controller.last_failure())
    }

    pub(super) fn ensure_detached(&self) -> Result<(), BuildError> {
        if self.is_initialized() {
            return Err(BuildError::StateProviderAttached);
        }

        Ok(())
    }

    pub(super) fn attach(&self, controller: &Arc<CircuitController>) -> Result<(), BuildError> {
        self.controller
            .set(Arc::clone(controller))
            .map_err(|_already_attached| BuildError::StateProviderAttached)
    }
}
