// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::time::Duration;

use crate::{ExecutionContext, Outcome};

/// Arguments for the [`delay_generator`][super::RetryOptions::delay_generator] callback.
#[derive(Debug)]
pub struct RetryDelayArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) outcome: Outcome<&'a dyn Any>,
    pub(super) attempt_number: u32,
    pub(super) delay_hint: Duration,
}

impl<'a> RetryDelayArgs<'a> {
    /// The context of the execution being retried.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// The outcome of the attempt that is being retried.
    #[must_use]
    pub fn outcome(&self) -> &Outcome<&'a dyn Any> {
        &self.outcome
    }

    /// Zero-based number of the attempt that is being retried.
    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// The delay computed by the configured backoff.
    #[must_use]
    pub fn delay_hint(&self) -> Duration {
        self.delay_hint
    }
}

/// Arguments for the [`on_retry`][super::RetryOptions::on_retry] callback.
#[derive(Debug)]
pub struct OnRetryArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) outcome: Outcome<&'a dyn Any>,
    pub(super) attempt_number: u32,
    pub(super) retry_delay: Duration,
    pub(super) duration: Duration,
}

impl<'a> OnRetryArgs<'a> {
    /// The context of the execution being retried.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// The outcome of the attempt that is being retried.
    #[must_use]
    pub fn outcome(&self) -> &Outcome<&'a dyn Any> {
        &self.outcome
    }

    /// Zero-based number of the attempt that is being retried.
    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }

    /// The delay before the next attempt.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// How long the attempt that is being retried took.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use tick::Clock;

    use super::*;

    #[test]
    fn on_retry_args() {
        let context = ExecutionContext::new(&Clock::new_frozen());
        let value = 5_u32;
        let args = OnRetryArgs {
            context: &context,
            outcome: Outcome::Value(&value),
            attempt_number: 2,
            retry_delay: Duration::from_secs(5),
            duration: Duration::from_millis(40),
        };

        assert_eq!(args.attempt_number(), 2);
        assert_eq!(args.retry_delay(), Duration::from_secs(5));
        assert_eq!(args.duration(), Duration::from_millis(40));
        assert!(args.outcome().value().is_some_and(|v| v.is::<u32>()));
        assert!(!args.context().is_cancelled());
    }

    #[test]
    fn delay_args() {
        let context = ExecutionContext::new(&Clock::new_frozen());
        let args = RetryDelayArgs {
            context: &context,
            outcome: Outcome::from_error(std::io::Error::other("boom")),
            attempt_number: 0,
            delay_hint: Duration::from_secs(2),
        };

        assert_eq!(args.attempt_number(), 0);
        assert_eq!(args.delay_hint(), Duration::from_secs(2));
        assert!(args.outcome().is_failure());
        assert!(args.context().operation_key().is_none());
    }
}
