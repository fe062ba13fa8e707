// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::time::Duration;

use super::engine::{CircuitEngine, EnterResult, ExitResult};
use super::health::ExecutionResult;
use super::{
    CircuitState, OnCircuitClosedArgs, OnCircuitHalfOpenedArgs, OnCircuitOpenedArgs, OnClosed, OnHalfOpened, OnOpened,
};
use crate::telemetry::{EventKind, Telemetry};
use crate::{AnyResult, BrokenCircuit, ExecutionContext, Failure, IsolatedCircuit, Outcome};

/// Shared state of one circuit breaker: the engine plus everything that reacts to its transitions.
///
/// Referenced by the strategy, the manual control and the state provider.
#[derive(Debug)]
pub(super) struct CircuitController {
    engine: CircuitEngine,
    on_opened: Option<OnOpened>,
    on_closed: Option<OnClosed>,
    on_half_opened: Option<OnHalfOpened>,
    telemetry: Telemetry,
}

impl CircuitController {
    pub fn new(
        engine: CircuitEngine,
        on_opened: Option<OnOpened>,
        on_closed: Option<OnClosed>,
        on_half_opened: Option<OnHalfOpened>,
        telemetry: Telemetry,
    ) -> Self {
        Self {
            engine,
            on_opened,
            on_closed,
            on_half_opened,
            telemetry,
        }
    }

    pub fn enter(&self, context: &ExecutionContext) -> Result<(), Failure> {
        match self.engine.enter() {
            EnterResult::Accepted { half_opened } => {
                if half_opened {
                    self.half_opened(context);
                }
                Ok(())
            }
            EnterResult::Broken { retry_after, last_failure } => Err(Failure::new(BrokenCircuit::new(retry_after, last_failure))),
            EnterResult::Isolated => Err(Failure::new(IsolatedCircuit)),
        }
    }

    pub fn record(&self, context: &ExecutionContext, outcome: &Outcome<AnyResult>, handled: bool) {
        let result = if handled {
            ExecutionResult::Failure
        } else {
            ExecutionResult::Success
        };

        match self.engine.exit(result, outcome.failure(), context) {
            ExitResult::Unchanged => {}
            ExitResult::Opened { break_duration } => {
                self.opened(context, Some(outcome.erased_view()), break_duration, false);
            }
            ExitResult::Closed => self.closed(context, false),
        }
    }

    pub fn isolate(&self) {
        if self.engine.isolate() {
            let context = ExecutionContext::new(self.engine.clock());
            self.opened(&context, None, Duration::MAX, true);
        }
    }

    pub fn close(&self) {
        if self.engine.close() {
            let context = ExecutionContext::new(self.engine.clock());
            self.closed(&context, true);
        }
    }

    pub fn circuit_state(&self) -> CircuitState {
        self.engine.circuit_state()
    }

    pub fn last_failure(&self) -> Option<Failure> {
        self.engine.last_failure()
    }

    fn opened(&self, context: &ExecutionContext, outcome: Option<Outcome<&dyn Any>>, break_duration: Duration, is_manual: bool) {
        if let Some(on_opened) = &self.on_opened {
            on_opened.call(&OnCircuitOpenedArgs {
                context,
                outcome,
                break_duration,
                is_manual,
            });
        }

        self.telemetry
            .report(context.operation_key(), EventKind::OnCircuitOpened { break_duration, is_manual });
    }

    fn closed(&self, context: &ExecutionContext, is_manual: bool) {
        if let Some(on_closed) = &self.on_closed {
            on_closed.call(&OnCircuitClosedArgs { context, is_manual });
        }

        self.telemetry
            .report(context.operation_key(), EventKind::OnCircuitClosed { is_manual });
    }

    fn half_opened(&self, context: &ExecutionContext) {
        if let Some(on_half_opened) = &self.on_half_opened {
            on_half_opened.call(&OnCircuitHalfOpenedArgs { context });
        }

        self.telemetry.report(context.operation_key(), EventKind::OnCircuitHalfOpened);
    }
}
