// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::borrow::Cow;
use std::error::Error;
use std::time::Duration;

use super::backoff::BackoffSchedule;
use super::constants::{DEFAULT_NAME, DEFAULT_RETRY_ATTEMPTS, MAX_BASE_DELAY, MAX_RETRY_ATTEMPTS};
use super::{DelayGenerator, OnRetry, OnRetryArgs, RetryDelayArgs};
use crate::options::MaxAttempts;
use crate::predicate::ShouldHandle;
use crate::rnd::Rnd;
use crate::{Backoff, BuildError, Outcome, PredicateArgs};

/// Options of the retry strategy.
///
/// Added to a pipeline with [`PipelineBuilder::add_retry`][crate::PipelineBuilder::add_retry].
/// The options are validated when the pipeline is built.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use airbag::Backoff;
/// use airbag::retry::RetryOptions;
///
/// let options = RetryOptions::new()
///     .max_retry_attempts(5)
///     .backoff(Backoff::Linear)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(2))
///     .should_handle::<u16, _>(|outcome, _| outcome.value().is_some_and(|status| **status >= 500));
/// ```
#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub(crate) name: Cow<'static, str>,
    pub(crate) max_attempts: MaxAttempts,
    pub(crate) schedule: BackoffSchedule,
    pub(crate) delay_generator: Option<DelayGenerator>,
    pub(crate) should_handle: ShouldHandle,
    pub(crate) on_retry: Option<OnRetry>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_NAME),
            max_attempts: MaxAttempts::Finite(DEFAULT_RETRY_ATTEMPTS.saturating_add(1)),
            schedule: BackoffSchedule::default(),
            delay_generator: None,
            should_handle: ShouldHandle::default(),
            on_retry: None,
        }
    }
}

impl RetryOptions {
    /// Creates options with the defaults: 3 retries, exponential backoff from 2 seconds with
    /// jitter, handling every failure except cancellation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name reported in telemetry and introspection.
    ///
    /// **Default**: `"Retry"`
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the maximum number of retries, in addition to the original call.
    ///
    /// With `3`, the callback runs at most 4 times. Accepted range is `0..=100`.
    ///
    /// **Default**: 3
    #[must_use]
    pub fn max_retry_attempts(mut self, max_retry_attempts: u32) -> Self {
        self.max_attempts = MaxAttempts::Finite(max_retry_attempts.saturating_add(1));
        self
    }

    /// Retries until the outcome is not handled or the execution is cancelled.
    #[must_use]
    pub fn infinite_retry_attempts(mut self) -> Self {
        self.max_attempts = MaxAttempts::Infinite;
        self
    }

    /// Sets how the delay grows between attempts.
    ///
    /// **Default**: [`Backoff::Exponential`]
    #[must_use]
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.schedule.backoff = backoff;
        self
    }

    /// Sets the base delay of the backoff. A zero base delay retries immediately.
    ///
    /// **Default**: 2 seconds, at most 1 day
    #[must_use]
    pub fn base_delay(mut self, base_delay: Duration) -> Self {
        self.schedule.base_delay = base_delay;
        self
    }

    /// Caps every computed delay.
    ///
    /// **Default**: no cap
    #[must_use]
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.schedule.max_delay = Some(max_delay);
        self
    }

    /// Raises every non-zero computed delay to at least `min_delay`.
    ///
    /// **Default**: no floor
    #[must_use]
    pub fn min_delay(mut self, min_delay: Duration) -> Self {
        self.schedule.min_delay = Some(min_delay);
        self
    }

    /// Enables or disables jitter.
    ///
    /// Constant and linear delays are jittered by up to ±25%; exponential delays use
    /// decorrelated jitter.
    ///
    /// **Default**: true
    #[must_use]
    pub fn use_jitter(mut self, use_jitter: bool) -> Self {
        self.schedule.use_jitter = use_jitter;
        self
    }

    /// Replaces the source of randomness used for jitter.
    ///
    /// The function must return values in `[0, 1)`.
    #[must_use]
    pub fn randomizer(mut self, randomizer: impl Fn() -> f64 + Send + Sync + 'static) -> Self {
        self.schedule.rnd = Rnd::new_function(randomizer);
        self
    }

    /// Computes the delay before each retry.
    ///
    /// Returning `Some` overrides the backoff; returning `None` uses the backoff delay, which is
    /// available as [`RetryDelayArgs::delay_hint`].
    #[must_use]
    pub fn delay_generator(
        mut self,
        delay_generator: impl Fn(&RetryDelayArgs<'_>) -> Option<Duration> + Send + Sync + 'static,
    ) -> Self {
        self.delay_generator = Some(DelayGenerator::new(delay_generator));
        self
    }

    /// Handles outcomes of callbacks producing `T` for which `predicate` returns `true`.
    ///
    /// The predicate declines outcomes of every other result type. The first configured
    /// predicate replaces the default one; later predicates are combined with a logical or.
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

    /// Invoked before every retry, after the delay was computed.
    #[must_use]
    pub fn on_retry(mut self, on_retry: impl Fn(&OnRetryArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_retry = Some(OnRetry::new(on_retry));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if let MaxAttempts::Finite(total) = self.max_attempts
            && total.saturating_sub(1) > MAX_RETRY_ATTEMPTS
        {
            return Err(BuildError::invalid_options(
                &self.name,
                format!("max retry attempts must be at most {MAX_RETRY_ATTEMPTS}"),
            ));
        }

        if self.schedule.base_delay > MAX_BASE_DELAY {
            return Err(BuildError::invalid_options(&self.name, "base delay must be at most 1 day"));
        }

        if let (Some(min), Some(max)) = (self.schedule.min_delay, self.schedule.max_delay)
            && min > max
        {
            return Err(BuildError::invalid_options(&self.name, "min delay must not exceed max delay"));
        }

        Ok(())
    }
}
