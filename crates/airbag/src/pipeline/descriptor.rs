// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::Strategy;

/// Describes the strategies of a built [`Pipeline`][crate::Pipeline].
///
/// # Examples
///
/// ```rust
/// use airbag::PipelineBuilder;
/// use airbag::breaker::{CircuitBreakerOptions, CircuitBreakerStrategy, CircuitState};
/// use airbag::retry::RetryOptions;
/// use tick::Clock;
///
/// let pipeline = PipelineBuilder::new(&Clock::new_frozen())
///     .add_retry(RetryOptions::new())
///     .add_circuit_breaker(CircuitBreakerOptions::new())
///     .build()?;
///
/// let descriptor = pipeline.descriptor();
/// let names: Vec<_> = descriptor.strategies().iter().map(|s| s.name()).collect();
/// assert_eq!(names, ["Retry", "CircuitBreaker"]);
///
/// let breaker = descriptor.strategies()[1].downcast_ref::<CircuitBreakerStrategy>().unwrap();
/// assert_eq!(breaker.circuit_state(), CircuitState::Closed);
/// # Ok::<(), airbag::BuildError>(())
/// ```
#[derive(Debug, Clone)]
pub struct PipelineDescriptor {
    pub(crate) name: String,
    pub(crate) instance_name: Option<String>,
    pub(crate) strategies: Vec<StrategyDescriptor>,
}

impl PipelineDescriptor {
    /// The name of the pipeline.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The instance name of the pipeline, if one was set.
    #[must_use]
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_deref()
    }

    /// The strategies in execution order, outermost first.
    #[must_use]
    pub fn strategies(&self) -> &[StrategyDescriptor] {
        &self.strategies
    }

    /// Returns `true` when the pipeline has no strategies and runs callbacks directly.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Describes one strategy of a pipeline.
#[derive(Clone)]
pub struct StrategyDescriptor {
    strategy: Arc<dyn Strategy>,
    type_name: &'static str,
}

impl StrategyDescriptor {
    pub(crate) fn new(strategy: Arc<dyn Strategy>, type_name: &'static str) -> Self {
        Self { strategy, type_name }
    }

    pub(crate) fn strategy(&self) -> Arc<dyn Strategy> {
        Arc::clone(&self.strategy)
    }

    /// The name of the strategy.
    #[must_use]
    pub fn name(&self) -> &str {
        self.strategy.name()
    }

    /// The Rust type name of the strategy.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the strategy as `S`, if it is of that type.
    #[must_use]
    pub fn downcast_ref<S: Strategy>(&self) -> Option<&S> {
        let strategy: &dyn Any = &*self.strategy;
        strategy.downcast_ref::<S>()
    }

    /// Returns `true` when the strategy is of type `S`.
    #[must_use]
    pub fn is<S: Strategy>(&self) -> bool {
        self.downcast_ref::<S>().is_some()
    }
}

impl Debug for StrategyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyDescriptor")
            .field("name", &self.name())
            .field("type_name", &self.type_name)
            .finish()
    }
}
