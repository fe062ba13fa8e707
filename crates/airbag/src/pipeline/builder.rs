// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::borrow::Cow;
use std::sync::Arc;

use tick::Clock;

use super::composite::CompositeStrategy;
use super::execution::PipelineInner;
use super::{Pipeline, StrategyDescriptor};
use crate::breaker::{CircuitBreakerOptions, CircuitBreakerStrategy};
use crate::context::DEFAULT_POOL_CAPACITY;
use crate::hedging::{HedgingOptions, HedgingStrategy};
use crate::retry::{RetryOptions, RetryStrategy};
use crate::telemetry::{Severity, SeverityProvider, Telemetry, TelemetryEvent, TelemetryOptions, TelemetrySink, TelemetrySource};
use crate::timeout::{TimeoutOptions, TimeoutStrategy};
use crate::{BuildError, ContextPool, Strategy};

pub(crate) const DEFAULT_PIPELINE_NAME: &str = "default";

/// A strategy waiting to be built.
#[derive(Debug)]
enum Entry {
    Retry(RetryOptions),
    Timeout(TimeoutOptions),
    CircuitBreaker(CircuitBreakerOptions),
    Hedging(HedgingOptions),
    Custom {
        strategy: Arc<dyn Strategy>,
        type_name: &'static str,
    },
}

/// Builds a [`Pipeline`].
///
/// Strategies execute in the order they are added: the first one added is the outermost and
/// sees the final outcome, the last one added wraps the callback directly. Every options object
/// is validated by [`build`][PipelineBuilder::build], so configuration errors never surface
/// while executing.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use airbag::PipelineBuilder;
/// use airbag::breaker::CircuitBreakerOptions;
/// use airbag::hedging::HedgingOptions;
/// use airbag::retry::RetryOptions;
/// use airbag::timeout::TimeoutOptions;
/// use tick::Clock;
///
/// let pipeline = PipelineBuilder::new(&Clock::new_frozen())
///     .name("inventory")
///     .instance_name("west")
///     .add_retry(RetryOptions::new())
///     .add_circuit_breaker(CircuitBreakerOptions::new())
///     .add_hedging(HedgingOptions::new())
///     .add_timeout(TimeoutOptions::with_timeout(Duration::from_secs(1)))
///     .build()?;
///
/// assert_eq!(pipeline.descriptor().strategies().len(), 4);
/// # Ok::<(), airbag::BuildError>(())
/// ```
#[derive(Debug)]
pub struct PipelineBuilder {
    clock: Clock,
    name: Cow<'static, str>,
    instance_name: Option<Cow<'static, str>>,
    pool_capacity: usize,
    entries: Vec<Entry>,
    sinks: Vec<Arc<dyn TelemetrySink>>,
    severity_provider: Option<SeverityProvider>,
    config_error: Option<BuildError>,
}

impl PipelineBuilder {
    /// Creates a builder whose strategies use `clock` for all timing.
    ///
    /// The pipeline is named `"default"` until [`name`][Self::name] is called.
    #[must_use]
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            name: Cow::Borrowed(DEFAULT_PIPELINE_NAME),
            instance_name: None,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            entries: Vec::new(),
            sinks: Vec::new(),
            severity_provider: None,
            config_error: None,
        }
    }

    /// Sets the pipeline name used for telemetry correlation. Prefer `snake_case`.
    #[must_use]
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the name of this pipeline instance, for pipelines built more than once.
    #[must_use]
    pub fn instance_name(mut self, instance_name: impl Into<Cow<'static, str>>) -> Self {
        self.instance_name = Some(instance_name.into());
        self
    }

    /// Sets how many idle execution contexts the pipeline keeps for reuse.
    ///
    /// **Default**: 64
    #[must_use]
    pub fn context_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }

    /// Adds a retry strategy.
    #[must_use]
    pub fn add_retry(mut self, options: RetryOptions) -> Self {
        self.entries.push(Entry::Retry(options));
        self
    }

    /// Adds a timeout strategy.
    #[must_use]
    pub fn add_timeout(mut self, options: TimeoutOptions) -> Self {
        self.entries.push(Entry::Timeout(options));
        self
    }

    /// Adds a circuit breaker strategy.
    #[must_use]
    pub fn add_circuit_breaker(mut self, options: CircuitBreakerOptions) -> Self {
        self.entries.push(Entry::CircuitBreaker(options));
        self
    }

    /// Adds a hedging strategy.
    #[must_use]
    pub fn add_hedging(mut self, options: HedgingOptions) -> Self {
        self.entries.push(Entry::Hedging(options));
        self
    }

    /// Adds a custom strategy.
    ///
    /// Adding the same instance twice fails the build with [`BuildError::DuplicateStrategy`].
    #[must_use]
    pub fn add_strategy<S: Strategy>(mut self, strategy: Arc<S>) -> Self {
        self.entries.push(Entry::Custom {
            strategy,
            type_name: type_name::<S>(),
        });
        self
    }

    /// Adds a sink receiving every telemetry event of the pipeline.
    #[must_use]
    pub fn add_telemetry_sink(mut self, sink: impl TelemetrySink + 'static) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Overrides the severity of telemetry events. Events mapped to [`Severity::None`] are dropped.
    #[must_use]
    pub fn severity_provider(
        mut self,
        provider: impl Fn(&TelemetryEvent<'_>) -> Severity + Send + Sync + 'static,
    ) -> Self {
        self.severity_provider = Some(SeverityProvider::new(provider));
        self
    }

    /// Reports telemetry events as `tracing` events.
    #[must_use]
    #[cfg(feature = "logs")]
    pub fn enable_logs(mut self) -> Self {
        self.sinks.push(Arc::new(crate::telemetry::logs::LogSink));
        self
    }

    /// Counts telemetry events with the `resilience.event` counter of `meter_provider`.
    #[must_use]
    #[cfg(any(feature = "metrics", test))]
    pub fn enable_metrics(mut self, meter_provider: &dyn opentelemetry::metrics::MeterProvider) -> Self {
        self.sinks
            .push(Arc::new(crate::telemetry::metrics::MetricSink::new(meter_provider)));
        self
    }

    /// Applies a configuration document, adding its strategies after the ones already added.
    ///
    /// Invalid values are reported by [`build`][Self::build].
    #[must_use]
    #[cfg(feature = "serde")]
    pub fn apply_config(mut self, config: &crate::config::PipelineConfig) -> Self {
        use crate::config::ConfiguredStrategy;

        let strategies = match config.resolve() {
            Ok(strategies) => strategies,
            Err(error) => {
                self.config_error.get_or_insert(error);
                return self;
            }
        };

        if let Some(name) = config.name.clone() {
            self.name = name.into();
        }

        if let Some(instance_name) = config.instance_name.clone() {
            self.instance_name = Some(instance_name.into());
        }

        if let Some(capacity) = config.context_pool_capacity {
            self.pool_capacity = capacity;
        }

        for strategy in strategies {
            self.entries.push(match strategy {
                ConfiguredStrategy::Retry(options) => Entry::Retry(options),
                ConfiguredStrategy::Timeout(options) => Entry::Timeout(options),
                ConfiguredStrategy::CircuitBreaker(options) => Entry::CircuitBreaker(options),
                ConfiguredStrategy::Hedging(options) => Entry::Hedging(options),
            });
        }

        self
    }

    /// Validates the options and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] when any options object is invalid, when a manual control or
    /// state provider is already attached to another circuit breaker, when the same custom
    /// strategy was added twice, or when an applied configuration document is invalid.
    pub fn build(self) -> Result<Pipeline, BuildError> {
        if let Some(error) = self.config_error {
            return Err(error);
        }

        for entry in &self.entries {
            match entry {
                Entry::Retry(options) => options.validate()?,
                Entry::Timeout(options) => options.validate()?,
                Entry::CircuitBreaker(options) => options.validate()?,
                Entry::Hedging(options) => options.validate()?,
                Entry::Custom { .. } => {}
            }
        }

        let telemetry = Telemetry::new(
            TelemetrySource::new(self.name.clone(), self.instance_name.clone()),
            Arc::new(TelemetryOptions {
                sinks: self.sinks,
                severity_provider: self.severity_provider,
            }),
        );

        let mut strategies = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            strategies.push(match entry {
                Entry::Retry(options) => describe(RetryStrategy::new(options, &telemetry)),
                Entry::Timeout(options) => describe(TimeoutStrategy::new(options, &telemetry)),
                Entry::CircuitBreaker(options) => describe(CircuitBreakerStrategy::new(options, &telemetry, &self.clock)?),
                Entry::Hedging(options) => describe(HedgingStrategy::new(options, &telemetry)),
                Entry::Custom { strategy, type_name } => StrategyDescriptor::new(strategy, type_name),
            });
        }

        let root: Option<Arc<dyn Strategy>> = match strategies.as_slice() {
            [] => None,
            [single] => Some(single.strategy()),
            _ => Some(Arc::new(CompositeStrategy::compose(
                strategies.iter().map(StrategyDescriptor::strategy).collect(),
            )?)),
        };

        Ok(Pipeline::new(PipelineInner {
            name: self.name,
            instance_name: self.instance_name,
            root,
            strategies,
            pool: ContextPool::with_capacity(&self.clock, self.pool_capacity),
            telemetry,
        }))
    }
}

fn describe<S: Strategy>(strategy: S) -> StrategyDescriptor {
    StrategyDescriptor::new(Arc::new(strategy), type_name::<S>())
}
