// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::sync::Arc;

use tick::Clock;

use super::controller::CircuitController;
use super::engine::{CircuitEngine, EngineOptions};
use super::health::HealthSettings;
use super::{CircuitBreakerOptions, CircuitState};
use crate::predicate::ShouldHandle;
use crate::strategy::ExecutionFuture;
use crate::telemetry::Telemetry;
use crate::{AnyResult, BuildError, Callback, ExecutionContext, Failure, Outcome, PredicateArgs, Strategy};

/// Rejects executions while the sampled failure ratio of the protected callback is too high.
///
/// Created by [`PipelineBuilder::add_circuit_breaker`][crate::PipelineBuilder::add_circuit_breaker].
/// The circuit state is shared by every concurrent execution of the pipeline.
#[derive(Debug)]
pub struct CircuitBreakerStrategy {
    name: Cow<'static, str>,
    controller: Arc<CircuitController>,
    should_handle: ShouldHandle,
}

impl CircuitBreakerStrategy {
    pub(crate) fn new(options: CircuitBreakerOptions, telemetry: &Telemetry, clock: &Clock) -> Result<Self, BuildError> {
        options.validate()?;

        let engine = CircuitEngine::new(
            EngineOptions {
                break_duration: options.break_duration,
                break_duration_generator: options.break_duration_generator,
                health: HealthSettings {
                    sampling: options.sampling,
                    failure_ratio: options.failure_ratio,
                    minimum_throughput: options.minimum_throughput,
                },
            },
            clock.clone(),
        );

        let controller = Arc::new(CircuitController::new(
            engine,
            options.on_opened,
            options.on_closed,
            options.on_half_opened,
            telemetry.for_strategy(options.name.clone()),
        ));

        // both are checked before either is attached so a failure leaves neither bound
        if let Some(provider) = &options.state_provider {
            provider.ensure_detached()?;
        }

        if let Some(control) = &options.manual_control {
            control.ensure_detached()?;
        }

        if let Some(provider) = &options.state_provider {
            provider.attach(&controller)?;
        }

        if let Some(control) = &options.manual_control {
            control.attach(&controller)?;
        }

        Ok(Self {
            name: options.name,
            controller,
            should_handle: options.should_handle,
        })
    }

    /// The current state of the circuit.
    #[must_use]
    pub fn circuit_state(&self) -> CircuitState {
        self.controller.circuit_state()
    }

    async fn run(&self, next: &dyn Callback, context: &mut ExecutionContext) -> Outcome<AnyResult> {
        if let Err(rejection) = self.controller.enter(context) {
            return Outcome::Failure(rejection);
        }

        let outcome = next.invoke(context).await;

        // cancelled executions say nothing about the health of the callback
        if outcome.failure().is_some_and(Failure::is_cancellation) {
            return outcome;
        }

        let args = PredicateArgs {
            context,
            attempt_number: 0,
        };
        let handled = self.should_handle.invoke(&outcome, next.result_type(), &args);
        self.controller.record(context, &outcome, handled);

        outcome
    }
}

impl Strategy for CircuitBreakerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        Box::pin(self.run(next, context))
    }
}
