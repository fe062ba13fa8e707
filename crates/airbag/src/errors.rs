// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::time::Duration;

use crate::Failure;

/// The execution was cancelled by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the operation was canceled")]
pub struct ExecutionCanceled;

/// The timeout strategy cancelled the execution because it did not complete in time.
///
/// This error is distinct from [`ExecutionCanceled`], which is only produced when the
/// caller requested cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the operation didn't complete within the allowed timeout of '{timeout:?}'")]
pub struct TimeoutRejected {
    timeout: Duration,
}

impl TimeoutRejected {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The timeout that elapsed.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// The circuit breaker rejected the execution because the circuit is open or a probe is
/// already in flight.
#[derive(Debug, Clone, thiserror::Error)]
#[error("the circuit is now open and is not allowing calls")]
pub struct BrokenCircuit {
    retry_after: Option<Duration>,
    #[source]
    last_failure: Option<Failure>,
}

impl BrokenCircuit {
    pub(crate) fn new(retry_after: Option<Duration>, last_failure: Option<Failure>) -> Self {
        Self { retry_after, last_failure }
    }

    /// How long until the circuit allows a trial call again, when known.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// The last failure handled by the circuit breaker before it opened.
    #[must_use]
    pub fn last_failure(&self) -> Option<&Failure> {
        self.last_failure.as_ref()
    }
}

/// The circuit breaker rejected the execution because the circuit was manually isolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("the circuit is manually held open and is not allowing calls")]
pub struct IsolatedCircuit;

/// An error raised while building a pipeline.
///
/// Every configuration problem surfaces here, before any execution happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    /// Options of a strategy failed validation.
    #[error("the options of the '{strategy}' strategy are invalid: {reason}")]
    InvalidOptions {
        /// Name of the strategy.
        strategy: Cow<'static, str>,
        /// What is wrong with the options.
        reason: Cow<'static, str>,
    },

    /// A composite pipeline was requested with fewer than two strategies.
    #[error("a composite pipeline requires at least two strategies, but {count} were provided")]
    TooFewStrategies {
        /// Number of strategies provided.
        count: usize,
    },

    /// The same strategy instance was added more than once.
    #[error("the strategy '{name}' was added to the pipeline more than once")]
    DuplicateStrategy {
        /// Name of the duplicated strategy.
        name: Cow<'static, str>,
    },

    /// A manual control is already attached to another circuit breaker.
    #[error("this circuit breaker manual control is already attached to a different circuit breaker")]
    ManualControlAttached,

    /// A state provider is already attached to another circuit breaker.
    #[error("this circuit breaker state provider is already attached to a different circuit breaker")]
    StateProviderAttached,

    /// A configuration document could not be applied.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: Cow<'static, str>,
    },
}

impl BuildError {
    pub(crate) fn invalid_options(strategy: &Cow<'static, str>, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidOptions {
            strategy: strategy.clone(),
            reason: reason.into(),
        }
    }
}

/// An error raised by [`CircuitBreakerManualControl`][crate::breaker::CircuitBreakerManualControl].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ControlError {
    /// The manual control is not attached to a circuit breaker of a built pipeline.
    #[error("the manual control is not attached to any circuit breaker")]
    NotAttached,
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::io;

    use super::*;

    #[test]
    fn timeout_rejected_message() {
        let err = TimeoutRejected::new(Duration::from_secs(2));
        assert_eq!(err.timeout(), Duration::from_secs(2));
        assert_eq!(err.to_string(), "the operation didn't complete within the allowed timeout of '2s'");
    }

    #[test]
    fn broken_circuit_exposes_last_failure_as_source() {
        let failure = Failure::new(io::Error::other("upstream down"));
        let err = BrokenCircuit::new(Some(Duration::from_secs(3)), Some(failure.clone()));

        assert_eq!(err.retry_after(), Some(Duration::from_secs(3)));
        assert!(Failure::ptr_eq(err.last_failure().unwrap(), &failure));
        assert_eq!(err.source().unwrap().to_string(), "upstream down");
    }

    #[test]
    fn broken_circuit_without_failure_has_no_source() {
        let err = BrokenCircuit::new(None, None);
        assert!(err.source().is_none());
        assert!(err.retry_after().is_none());
    }

    #[test]
    fn build_error_messages() {
        let err = BuildError::invalid_options(&Cow::Borrowed("Retry"), "base delay is too large");
        assert_eq!(err.to_string(), "the options of the 'Retry' strategy are invalid: base delay is too large");

        let err = BuildError::TooFewStrategies { count: 1 };
        assert_eq!(
            err.to_string(),
            "a composite pipeline requires at least two strategies, but 1 were provided"
        );
    }

    #[test]
    fn cancellation_and_isolation_messages() {
        assert_eq!(ExecutionCanceled.to_string(), "the operation was canceled");
        assert_eq!(IsolatedCircuit.to_string(), "the circuit is manually held open and is not allowing calls");
        assert_eq!(ControlError::NotAttached.to_string(), "the manual control is not attached to any circuit breaker");
    }
}
