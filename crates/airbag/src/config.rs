// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Pipelines described by configuration documents.
//!
//! A [`PipelineConfig`] is deserialized from any `serde` format and applied with
//! [`PipelineBuilder::apply_config`][crate::PipelineBuilder::apply_config]. Strategies are listed
//! in execution order and tagged by `type`. Durations use the formats accepted by
//! [`jiff::SignedDuration`], such as `"250ms"`, `"2s"` or `"PT2S"`. Unset values keep the
//! defaults of the strategy options.
//!
//! # Examples
//!
//! ```rust
//! use airbag::PipelineBuilder;
//! use airbag::config::PipelineConfig;
//! use tick::Clock;
//!
//! let config: PipelineConfig = serde_json::from_str(
//!     r#"{
//!         "name": "inventory",
//!         "strategies": [
//!             { "type": "retry", "max_retry_attempts": 2, "base_delay": "100ms" },
//!             { "type": "timeout", "timeout": "1s" }
//!         ]
//!     }"#,
//! )?;
//!
//! let pipeline = PipelineBuilder::new(&Clock::new_frozen()).apply_config(&config).build()?;
//! assert_eq!(pipeline.descriptor().name(), "inventory");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use crate::BuildError;
use crate::breaker::{CircuitBreakerOptions, SamplingWindow};
use crate::hedging::HedgingOptions;
use crate::options::Backoff;
use crate::retry::RetryOptions;
use crate::timeout::TimeoutOptions;

/// A pipeline configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Name of the pipeline.
    pub name: Option<String>,

    /// Name of the pipeline instance.
    pub instance_name: Option<String>,

    /// Number of idle execution contexts kept for reuse.
    pub context_pool_capacity: Option<usize>,

    /// Strategies in execution order, outermost first.
    pub strategies: Vec<StrategyConfig>,
}

/// Configuration of one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyConfig {
    /// A retry strategy.
    Retry(RetryConfig),

    /// A timeout strategy.
    Timeout(TimeoutConfig),

    /// A circuit breaker strategy.
    CircuitBreaker(CircuitBreakerConfig),

    /// A hedging strategy.
    Hedging(HedgingConfig),
}

/// Configuration of a retry strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Name of the strategy.
    pub name: Option<String>,
    /// Number of retries after the initial attempt.
    pub max_retry_attempts: Option<u32>,
    /// Retries until the outcome is no longer handled. Overrides `max_retry_attempts`.
    pub infinite_retry_attempts: Option<bool>,
    /// Growth of the delay between retries.
    pub backoff: Option<Backoff>,
    /// Base delay between retries.
    pub base_delay: Option<SignedDuration>,
    /// Upper bound of the delay between retries.
    pub max_delay: Option<SignedDuration>,
    /// Lower bound of the delay between retries.
    pub min_delay: Option<SignedDuration>,
    /// Whether delays are randomized.
    pub use_jitter: Option<bool>,
}

/// Configuration of a timeout strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Name of the strategy.
    pub name: Option<String>,
    /// Time allowed for each execution.
    pub timeout: Option<SignedDuration>,
}

/// Configuration of a circuit breaker strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    /// Name of the strategy.
    pub name: Option<String>,
    /// Ratio of handled outcomes that opens the circuit.
    pub failure_ratio: Option<f32>,
    /// Number of sampled executions required before the circuit can open.
    pub minimum_throughput: Option<u32>,
    /// Samples executions over this duration. Exclusive with `sampling_count`.
    pub sampling_duration: Option<SignedDuration>,
    /// Samples this many most recent executions. Exclusive with `sampling_duration`.
    pub sampling_count: Option<u32>,
    /// How long the circuit stays open.
    pub break_duration: Option<SignedDuration>,
}

/// Configuration of a hedging strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HedgingConfig {
    /// Name of the strategy.
    pub name: Option<String>,
    /// Total number of attempts, the primary one included.
    pub max_hedged_attempts: Option<u32>,
    /// Delay before each hedged attempt.
    pub delay: Option<SignedDuration>,
}

/// Strategy options resolved from a configuration document.
pub(crate) enum ConfiguredStrategy {
    Retry(RetryOptions),
    Timeout(TimeoutOptions),
    CircuitBreaker(CircuitBreakerOptions),
    Hedging(HedgingOptions),
}

impl PipelineConfig {
    /// Converts the configured strategies into options, in order.
    pub(crate) fn resolve(&self) -> Result<Vec<ConfiguredStrategy>, BuildError> {
        self.strategies.iter().map(StrategyConfig::resolve).collect()
    }
}

impl StrategyConfig {
    fn resolve(&self) -> Result<ConfiguredStrategy, BuildError> {
        match self {
            Self::Retry(config) => config.resolve().map(ConfiguredStrategy::Retry),
            Self::Timeout(config) => config.resolve().map(ConfiguredStrategy::Timeout),
            Self::CircuitBreaker(config) => config.resolve().map(ConfiguredStrategy::CircuitBreaker),
            Self::Hedging(config) => config.resolve().map(ConfiguredStrategy::Hedging),
        }
    }
}

impl RetryConfig {
    fn resolve(&self) -> Result<RetryOptions, BuildError> {
        let mut options = RetryOptions::new();

        if let Some(name) = &self.name {
            options = options.name(name.clone());
        }
        if let Some(attempts) = self.max_retry_attempts {
            options = options.max_retry_attempts(attempts);
        }
        if self.infinite_retry_attempts == Some(true) {
            options = options.infinite_retry_attempts();
        }
        if let Some(backoff) = self.backoff {
            options = options.backoff(backoff);
        }
        if let Some(delay) = self.base_delay {
            options = options.base_delay(to_duration("base_delay", delay)?);
        }
        if let Some(delay) = self.max_delay {
            options = options.max_delay(to_duration("max_delay", delay)?);
        }
        if let Some(delay) = self.min_delay {
            options = options.min_delay(to_duration("min_delay", delay)?);
        }
        if let Some(use_jitter) = self.use_jitter {
            options = options.use_jitter(use_jitter);
        }

        Ok(options)
    }
}

impl TimeoutConfig {
    fn resolve(&self) -> Result<TimeoutOptions, BuildError> {
        let mut options = TimeoutOptions::new();

        if let Some(name) = &self.name {
            options = options.name(name.clone());
        }
        if let Some(timeout) = self.timeout {
            options = options.timeout(to_duration("timeout", timeout)?);
        }

        Ok(options)
    }
}

impl CircuitBreakerConfig {
    fn resolve(&self) -> Result<CircuitBreakerOptions, BuildError> {
        let mut options = CircuitBreakerOptions::new();

        if let Some(name) = &self.name {
            options = options.name(name.clone());
        }
        if let Some(ratio) = self.failure_ratio {
            options = options.failure_ratio(ratio);
        }
        if let Some(throughput) = self.minimum_throughput {
            options = options.minimum_throughput(throughput);
        }
        match (self.sampling_duration, self.sampling_count) {
            (Some(_), Some(_)) => {
                return Err(BuildError::InvalidConfig {
                    reason: "'sampling_duration' and 'sampling_count' cannot both be set".into(),
                });
            }
            (Some(duration), None) => {
                options = options.sampling(SamplingWindow::Time(to_duration("sampling_duration", duration)?));
            }
            (None, Some(count)) => options = options.sampling(SamplingWindow::Count(count)),
            (None, None) => {}
        }
        if let Some(duration) = self.break_duration {
            options = options.break_duration(to_duration("break_duration", duration)?);
        }

        Ok(options)
    }
}

impl HedgingConfig {
    fn resolve(&self) -> Result<HedgingOptions, BuildError> {
        let mut options = HedgingOptions::new();

        if let Some(name) = &self.name {
            options = options.name(name.clone());
        }
        if let Some(attempts) = self.max_hedged_attempts {
            options = options.max_hedged_attempts(attempts);
        }
        if let Some(delay) = self.delay {
            options = options.delay(to_duration("delay", delay)?);
        }

        Ok(options)
    }
}

fn to_duration(field: &str, value: SignedDuration) -> Result<Duration, BuildError> {
    Duration::try_from(value).map_err(|error| BuildError::InvalidConfig {
        reason: format!("'{field}' must not be negative: {error}").into(),
    })
}
