// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error;
use std::time::Duration;

use super::action::ActionGenerator;
use super::constants::{
    DEFAULT_HEDGING_DELAY, DEFAULT_MAX_HEDGED_ATTEMPTS, DEFAULT_NAME, MAX_MAX_HEDGED_ATTEMPTS, MIN_MAX_HEDGED_ATTEMPTS,
};
use super::{DelayGenerator, HedgedAction, HedgingActionArgs, HedgingDelayArgs, OnHedging, OnHedgingArgs};
use crate::predicate::ShouldHandle;
use crate::{BuildError, Outcome, PredicateArgs};

/// Options of the hedging strategy.
///
/// Added to a pipeline with [`PipelineBuilder::add_hedging`][crate::PipelineBuilder::add_hedging].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use airbag::hedging::HedgingOptions;
///
/// let options = HedgingOptions::new()
///     .max_hedged_attempts(3)
///     .delay(Duration::from_millis(200))
///     .handle_error::<std::io::Error>();
/// ```
#[derive(Debug, Clone)]
pub struct HedgingOptions {
    pub(crate) name: Cow<'static, str>,
    pub(crate) max_hedged_attempts: u32,
    pub(crate) delay: Duration,
    pub(crate) delay_generator: Option<DelayGenerator>,
    pub(crate) action_generator: Option<ActionGenerator>,
    pub(crate) should_handle: ShouldHandle,
    pub(crate) on_hedging: Option<OnHedging>,
}

impl Default for HedgingOptions {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_NAME),
            max_hedged_attempts: DEFAULT_MAX_HEDGED_ATTEMPTS,
            delay: DEFAULT_HEDGING_DELAY,
            delay_generator: None,
            action_generator: None,
            should_handle: ShouldHandle::default(),
            on_hedging: None,
        }
    }
}

impl HedgingOptions {
    /// Creates options with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name reported in telemetry and introspection.
    ///
    /// **Default**: `"Hedging"`
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the total number of attempts, including the primary one. Accepted range is 2 to 10.
    ///
    /// **Default**: 2
    #[must_use]
    pub fn max_hedged_attempts(mut self, max_hedged_attempts: u32) -> Self {
        self.max_hedged_attempts = max_hedged_attempts;
        self
    }

    /// Sets how long to wait for an outstanding attempt before launching the next one.
    ///
    /// [`Duration::ZERO`] launches every attempt at once. [`Duration::MAX`] launches the next
    /// attempt only after the previous one completed with a handled outcome.
    ///
    /// **Default**: 2 seconds
    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Computes the delay before each hedged attempt, overriding the fixed delay.
    #[must_use]
    pub fn delay_generator(
        mut self,
        delay_generator: impl Fn(&HedgingDelayArgs<'_>) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay_generator = Some(DelayGenerator::new(delay_generator));
        self
    }

    /// Produces the action of each hedged attempt of callbacks returning `T`.
    ///
    /// Returning `None` stops launching further attempts. The primary attempt always runs the
    /// original callback, and executions of other result types ignore the generator.
    #[must_use]
    pub fn action_generator<T, F>(mut self, generator: F) -> Self
    where
        T: Any + Send,
        F: Fn(&HedgingActionArgs<'_>) -> Option<HedgedAction<T>> + Send + Sync + 'static,
    {
        self.action_generator = Some(ActionGenerator::new(generator));
        self
    }

    /// Handles outcomes of callbacks producing `T` for which `predicate` returns `true`.
    ///
    /// Handled outcomes are not accepted as the result and cause another attempt to be launched.
    /// The first configured predicate replaces the default one; later predicates are combined
    /// with a logical or.
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

    /// Invoked once per hedged attempt, right before it is launched.
    #[must_use]
    pub fn on_hedging(mut self, on_hedging: impl Fn(&OnHedgingArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_hedging = Some(OnHedging::new(on_hedging));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if !(MIN_MAX_HEDGED_ATTEMPTS..=MAX_MAX_HEDGED_ATTEMPTS).contains(&self.max_hedged_attempts) {
            return Err(BuildError::invalid_options(
                &self.name,
                format!("max hedged attempts must be between {MIN_MAX_HEDGED_ATTEMPTS} and {MAX_MAX_HEDGED_ATTEMPTS}"),
            ));
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
    fn defaults() {
        let options = HedgingOptions::new();

        assert_eq!(options.name, "Hedging");
        assert_eq!(options.max_hedged_attempts, 2);
        assert_eq!(options.delay, Duration::from_secs(2));
        assert!(options.delay_generator.is_none());
        assert!(options.action_generator.is_none());
        assert!(options.on_hedging.is_none());
        options.validate().unwrap();
    }

    #[test]
    fn setters() {
        let options = HedgingOptions::new()
            .name("custom")
            .max_hedged_attempts(5)
            .delay(Duration::ZERO)
            .delay_generator(|_| Duration::from_millis(1))
            .action_generator(|_| Some(HedgedAction::<u32>::original()))
            .on_hedging(|_| {});

        assert_eq!(options.name, "custom");
        assert_eq!(options.max_hedged_attempts, 5);
        assert_eq!(options.delay, Duration::ZERO);
        assert!(options.delay_generator.is_some());
        assert!(options.action_generator.is_some());
        assert!(options.on_hedging.is_some());
    }

    #[rstest]
    #[case(0, false)]
    #[case(1, false)]
    #[case(2, true)]
    #[case(10, true)]
    #[case(11, false)]
    fn max_hedged_attempts_range(#[case] attempts: u32, #[case] valid: bool) {
        let result = HedgingOptions::new().max_hedged_attempts(attempts).validate();

        assert_eq!(result.is_ok(), valid);
        if let Err(err) = result {
            assert_eq!(
                err.to_string(),
                "the options of the 'Hedging' strategy are invalid: max hedged attempts must be between 2 and 10"
            );
        }
    }
}
