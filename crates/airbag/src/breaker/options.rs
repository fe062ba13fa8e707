// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error;
use std::time::Duration;

use super::constants::{
    DEFAULT_BREAK_DURATION, DEFAULT_FAILURE_RATIO, DEFAULT_MINIMUM_THROUGHPUT, DEFAULT_NAME, DEFAULT_SAMPLING_DURATION,
    MAX_BREAK_DURATION, MAX_SAMPLING_COUNT, MIN_BREAK_DURATION, MIN_MINIMUM_THROUGHPUT, MIN_SAMPLING_COUNT,
    MIN_SAMPLING_DURATION,
};
use super::{
    BreakDurationGenerator, BreakDurationGeneratorArgs, CircuitBreakerManualControl, CircuitBreakerStateProvider, OnCircuitClosedArgs,
    OnCircuitHalfOpenedArgs, OnCircuitOpenedArgs, OnClosed, OnHalfOpened, OnOpened, SamplingWindow,
};
use crate::predicate::ShouldHandle;
use crate::{BuildError, Outcome, PredicateArgs};

/// Options of the circuit breaker strategy.
///
/// Added to a pipeline with [`PipelineBuilder::add_circuit_breaker`][crate::PipelineBuilder::add_circuit_breaker].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use airbag::breaker::{CircuitBreakerOptions, SamplingWindow};
///
/// let options = CircuitBreakerOptions::new()
///     .failure_ratio(0.5)
///     .minimum_throughput(10)
///     .sampling(SamplingWindow::Time(Duration::from_secs(10)))
///     .break_duration(Duration::from_secs(30))
///     .handle_error::<std::io::Error>();
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreakerOptions {
    pub(crate) name: Cow<'static, str>,
    pub(crate) failure_ratio: f32,
    pub(crate) minimum_throughput: u32,
    pub(crate) sampling: SamplingWindow,
    pub(crate) break_duration: Duration,
    pub(crate) break_duration_generator: Option<BreakDurationGenerator>,
    pub(crate) should_handle: ShouldHandle,
    pub(crate) on_opened: Option<OnOpened>,
    pub(crate) on_closed: Option<OnClosed>,
    pub(crate) on_half_opened: Option<OnHalfOpened>,
    pub(crate) manual_control: Option<CircuitBreakerManualControl>,
    pub(crate) state_provider: Option<CircuitBreakerStateProvider>,
}

impl Default for CircuitBreakerOptions {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_NAME),
            failure_ratio: DEFAULT_FAILURE_RATIO,
            minimum_throughput: DEFAULT_MINIMUM_THROUGHPUT,
            sampling: SamplingWindow::Time(DEFAULT_SAMPLING_DURATION),
            break_duration: DEFAULT_BREAK_DURATION,
            break_duration_generator: None,
            should_handle: ShouldHandle::default(),
            on_opened: None,
            on_closed: None,
            on_half_opened: None,
            manual_control: None,
            state_provider: None,
        }
    }
}

impl CircuitBreakerOptions {
    /// Creates options with the defaults: opens at a 10% failure ratio with at least 100
    /// executions in a 30 second window, and stays open for 5 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name reported in telemetry and introspection.
    ///
    /// **Default**: `"CircuitBreaker"`
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the ratio of handled outcomes in the sampling window that opens the circuit.
    /// Accepted range is greater than 0 and at most 1.
    ///
    /// **Default**: 0.1
    #[must_use]
    pub fn failure_ratio(mut self, ratio: f32) -> Self {
        self.failure_ratio = ratio;
        self
    }

    /// Sets how many executions the sampling window must hold before the circuit can open.
    /// Must be at least 2.
    ///
    /// **Default**: 100
    #[must_use]
    pub fn minimum_throughput(mut self, throughput: u32) -> Self {
        self.minimum_throughput = throughput;
        self
    }

    /// Sets how outcomes are sampled. A time window must span at least one second. A count
    /// window holds between 2 and 100 000 executions and no fewer than the
    /// [minimum throughput][Self::minimum_throughput].
    ///
    /// **Default**: `SamplingWindow::Time(30s)`
    #[must_use]
    pub fn sampling(mut self, sampling: SamplingWindow) -> Self {
        self.sampling = sampling;
        self
    }

    /// Sets how long the circuit stays open. Accepted range is 500 milliseconds to 1 day.
    ///
    /// **Default**: 5 seconds
    #[must_use]
    pub fn break_duration(mut self, duration: Duration) -> Self {
        self.break_duration = duration;
        self
    }

    /// Computes the break duration every time the circuit opens, overriding the fixed one.
    ///
    /// The generator runs while the circuit is being opened and must not call back into the
    /// same circuit breaker.
    #[must_use]
    pub fn break_duration_generator(
        mut self,
        generator: impl Fn(&BreakDurationGeneratorArgs<'_>) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.break_duration_generator = Some(BreakDurationGenerator::new(generator));
        self
    }

    /// Handles outcomes of result type `T` for which `predicate` returns `true`.
    ///
    /// The first configured predicate replaces the default one; further predicates are
    /// combined, so an outcome is handled when any of them returns `true`.
    #[must_use]
    pub fn should_handle<T, F>(mut self, predicate: F) -> Self
    where
        T: Any,
        F: Fn(Outcome<&T>, &PredicateArgs<'_>) -> bool + Send + Sync + 'static,
    {
        self.should_handle.add_typed(predicate);
        self
    }

    /// Handles outcomes of any result type for which `predicate` returns `true`.
    #[must_use]
    pub fn should_handle_any<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Outcome<&dyn Any>, &PredicateArgs<'_>) -> bool + Send + Sync + 'static,
    {
        self.should_handle.add_untyped(predicate);
        self
    }

    /// Handles failures caused by an error of type `E`.
    #[must_use]
    pub fn handle_error<E: Error + 'static>(mut self) -> Self {
        self.should_handle.add_error::<E>();
        self
    }

    /// Invoked when the circuit opens, including manual isolation.
    #[must_use]
    pub fn on_opened(mut self, on_opened: impl Fn(&OnCircuitOpenedArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_opened = Some(OnOpened::new(on_opened));
        self
    }

    /// Invoked when the circuit closes, including manual closing.
    #[must_use]
    pub fn on_closed(mut self, on_closed: impl Fn(&OnCircuitClosedArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_closed = Some(OnClosed::new(on_closed));
        self
    }

    /// Invoked when the break duration elapsed and a trial execution is let through.
    #[must_use]
    pub fn on_half_opened(mut self, on_half_opened: impl Fn(&OnCircuitHalfOpenedArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_half_opened = Some(OnHalfOpened::new(on_half_opened));
        self
    }

    /// Attaches `control` to the circuit breaker when the pipeline is built.
    #[must_use]
    pub fn manual_control(mut self, control: &CircuitBreakerManualControl) -> Self {
        self.manual_control = Some(control.clone());
        self
    }

    /// Attaches `provider` to the circuit breaker when the pipeline is built.
    #[must_use]
    pub fn state_provider(mut self, provider: &CircuitBreakerStateProvider) -> Self {
        self.state_provider = Some(provider.clone());
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.failure_ratio.is_nan() || self.failure_ratio <= 0.0 || self.failure_ratio > 1.0 {
            return Err(BuildError::invalid_options(&self.name, "failure ratio must be greater than 0 and at most 1"));
        }

        if self.minimum_throughput < MIN_MINIMUM_THROUGHPUT {
            return Err(BuildError::invalid_options(&self.name, "minimum throughput must be at least 2"));
        }

        match self.sampling {
            SamplingWindow::Time(duration) if duration < MIN_SAMPLING_DURATION => {
                return Err(BuildError::invalid_options(&self.name, "sampling duration must be at least 1 second"));
            }
            SamplingWindow::Count(count) if !(MIN_SAMPLING_COUNT..=MAX_SAMPLING_COUNT).contains(&count) => {
                return Err(BuildError::invalid_options(&self.name, "sampling count must be between 2 and 100000"));
            }
            SamplingWindow::Count(count) if count < self.minimum_throughput => {
                return Err(BuildError::invalid_options(
                    &self.name,
                    "sampling count must be at least the minimum throughput",
                ));
            }
            _ => {}
        }

        if self.break_duration < MIN_BREAK_DURATION || self.break_duration > MAX_BREAK_DURATION {
            return Err(BuildError::invalid_options(
                &self.name,
                "break duration must be between 500 milliseconds and 1 day",
            ));
        }

        if let Some(control) = &self.manual_control {
            control.ensure_detached()?;
        }

        if let Some(provider) = &self.state_provider {
            provider.ensure_detached()?;
        }

        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    #[expect(clippy::float_cmp, reason = "Test")]
    fn defaults() {
        let options = CircuitBreakerOptions::new();

        assert_eq!(options.name, "CircuitBreaker");
        assert_eq!(options.failure_ratio, 0.1);
        assert_eq!(options.minimum_throughput, 100);
        assert_eq!(options.sampling, SamplingWindow::Time(Duration::from_secs(30)));
        assert_eq!(options.break_duration, Duration::from_secs(5));
        options.validate().unwrap();
    }

    #[rstest]
    #[case::zero_ratio(CircuitBreakerOptions::new().failure_ratio(0.0))]
    #[case::ratio_above_one(CircuitBreakerOptions::new().failure_ratio(1.5))]
    #[case::nan_ratio(CircuitBreakerOptions::new().failure_ratio(f32::NAN))]
    #[case::throughput(CircuitBreakerOptions::new().minimum_throughput(1))]
    #[case::short_window(CircuitBreakerOptions::new().sampling(SamplingWindow::Time(Duration::from_millis(999))))]
    #[case::small_count(CircuitBreakerOptions::new().minimum_throughput(2).sampling(SamplingWindow::Count(1)))]
    #[case::huge_count(CircuitBreakerOptions::new().minimum_throughput(2).sampling(SamplingWindow::Count(100_001)))]
    #[case::count_below_throughput(CircuitBreakerOptions::new().sampling(SamplingWindow::Count(10)))]
    #[case::short_break(CircuitBreakerOptions::new().break_duration(Duration::from_millis(499)))]
    #[case::long_break(CircuitBreakerOptions::new().break_duration(Duration::from_secs(86_401)))]
    fn invalid_options_are_rejected(#[case] options: CircuitBreakerOptions) {
        assert!(matches!(options.validate(), Err(BuildError::InvalidOptions { .. })));
    }

    #[rstest]
    #[case(CircuitBreakerOptions::new().failure_ratio(1.0))]
    #[case(CircuitBreakerOptions::new().minimum_throughput(2))]
    #[case(CircuitBreakerOptions::new().minimum_throughput(2).sampling(SamplingWindow::Count(2)))]
    #[case(CircuitBreakerOptions::new().minimum_throughput(10).sampling(SamplingWindow::Count(10)))]
    #[case(CircuitBreakerOptions::new().sampling(SamplingWindow::Count(100_000)))]
    #[case(CircuitBreakerOptions::new().break_duration(Duration::from_millis(500)))]
    fn boundary_options_are_accepted(#[case] options: CircuitBreakerOptions) {
        options.validate().unwrap();
    }

    #[test]
    fn callbacks_are_stored() {
        let control = CircuitBreakerManualControl::new();
        let provider = CircuitBreakerStateProvider::new();
        let options = CircuitBreakerOptions::new()
            .name("db")
            .break_duration_generator(|_| Duration::from_secs(1))
            .on_opened(|_| {})
            .on_closed(|_| {})
            .on_half_opened(|_| {})
            .manual_control(&control)
            .state_provider(&provider);

        assert_eq!(options.name, "db");
        assert!(options.break_duration_generator.is_some());
        assert!(options.on_opened.is_some());
        assert!(options.on_closed.is_some());
        assert!(options.on_half_opened.is_some());
        assert!(options.manual_control.is_some());
        assert!(options.state_provider.is_some());
    }
}
