// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::time::Duration;

use super::constants::{DEFAULT_NAME, DEFAULT_TIMEOUT, MAX_TIMEOUT, MIN_TIMEOUT};
use super::{OnTimeout, OnTimeoutArgs, TimeoutGenerator, TimeoutGeneratorArgs};
use crate::BuildError;

/// Options of the timeout strategy.
///
/// Added to a pipeline with [`PipelineBuilder::add_timeout`][crate::PipelineBuilder::add_timeout].
#[derive(Debug, Clone)]
pub struct TimeoutOptions {
    pub(crate) name: Cow<'static, str>,
    pub(crate) timeout: Duration,
    pub(crate) timeout_generator: Option<TimeoutGenerator>,
    pub(crate) on_timeout: Option<OnTimeout>,
}

impl Default for TimeoutOptions {
    fn default() -> Self {
        Self {
            name: Cow::Borrowed(DEFAULT_NAME),
            timeout: DEFAULT_TIMEOUT,
            timeout_generator: None,
            on_timeout: None,
        }
    }
}

impl TimeoutOptions {
    /// Creates options with a 30 second timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with the given timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::default().timeout(timeout)
    }

    /// Sets the name reported in telemetry and introspection.
    ///
    /// **Default**: `"Timeout"`
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the fixed timeout. Accepted range is 10 milliseconds to 1 day.
    ///
    /// **Default**: 30 seconds
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Computes the timeout of each execution, overriding the fixed timeout.
    ///
    /// Returning [`Duration::ZERO`] or [`Duration::MAX`] runs that execution without a timeout.
    #[must_use]
    pub fn timeout_generator(
        mut self,
        generator: impl Fn(&TimeoutGeneratorArgs<'_>) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.timeout_generator = Some(TimeoutGenerator::new(generator));
        self
    }

    /// Invoked when an execution times out, after its cancellation was requested.
    #[must_use]
    pub fn on_timeout(mut self, on_timeout: impl Fn(&OnTimeoutArgs<'_>) + Send + Sync + 'static) -> Self {
        self.on_timeout = Some(OnTimeout::new(on_timeout));
        self
    }

    pub(crate) fn validate(&self) -> Result<(), BuildError> {
        if self.timeout < MIN_TIMEOUT || self.timeout > MAX_TIMEOUT {
            return Err(BuildError::invalid_options(
                &self.name,
                "timeout must be between 10 milliseconds and 1 day",
            ));
        }

        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = TimeoutOptions::new();

        assert_eq!(options.name, "Timeout");
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert!(options.timeout_generator.is_none());
        assert!(options.on_timeout.is_none());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validation_bounds() {
        assert!(TimeoutOptions::with_timeout(Duration::from_millis(10)).validate().is_ok());
        assert!(TimeoutOptions::with_timeout(Duration::from_secs(86_400)).validate().is_ok());
        assert!(TimeoutOptions::with_timeout(Duration::from_millis(9)).validate().is_err());
        assert!(TimeoutOptions::with_timeout(Duration::from_secs(86_401)).validate().is_err());
    }

    #[test]
    fn setters() {
        let options = TimeoutOptions::new()
            .name("slow")
            .timeout_generator(|_| Duration::ZERO)
            .on_timeout(|_| {});

        assert_eq!(options.name, "slow");
        assert!(options.timeout_generator.is_some());
        assert!(options.on_timeout.is_some());
    }
}
