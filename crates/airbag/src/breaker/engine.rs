// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tick::Clock;

use super::health::{ExecutionResult, HealthInfo, HealthMetrics, HealthSettings, HealthStatus};
use super::{BreakDurationGenerator, BreakDurationGeneratorArgs, CircuitState};
use crate::constants::ERR_POISONED_LOCK;
use crate::{ExecutionContext, Failure};

#[derive(Debug)]
pub(super) struct EngineOptions {
    pub break_duration: Duration,
    pub break_duration_generator: Option<BreakDurationGenerator>,
    pub health: HealthSettings,
}

#[derive(Debug)]
pub(super) enum EnterResult {
    Accepted { half_opened: bool },
    Broken { retry_after: Option<Duration>, last_failure: Option<Failure> },
    Isolated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ExitResult {
    Unchanged,
    Opened { break_duration: Duration },
    Closed,
}

/// State machine of a circuit breaker.
///
/// Every transition happens under one lock and is returned to exactly one caller, which is then
/// responsible for reporting it.
#[derive(Debug)]
pub(super) struct CircuitEngine {
    state: Mutex<State>,
    options: EngineOptions,
    clock: Clock,
}

impl CircuitEngine {
    pub fn new(options: EngineOptions, clock: Clock) -> Self {
        Self {
            state: Mutex::new(State {
                circuit: Circuit::Closed,
                health: options.health.build(),
                last_failure: None,
                half_open_attempts: 0,
            }),
            options,
            clock,
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn enter(&self) -> EnterResult {
        // NOTE: read the clock outside the lock.
        let now = self.clock.instant();

        self.state.lock().expect(ERR_POISONED_LOCK).enter(now, &self.options)
    }

    /// Records the result of an accepted execution.
    ///
    /// The break duration generator runs under the lock, so it must not call back into this breaker.
    pub fn exit(&self, result: ExecutionResult, failure: Option<&Failure>, context: &ExecutionContext) -> ExitResult {
        let now = self.clock.instant();

        self.state
            .lock()
            .expect(ERR_POISONED_LOCK)
            .exit(result, failure, now, context, &self.options)
    }

    /// Returns `true` when the circuit was not isolated before.
    pub fn isolate(&self) -> bool {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        if state.circuit == Circuit::Isolated {
            return false;
        }

        state.circuit = Circuit::Isolated;
        true
    }

    /// Returns `true` when the circuit was not closed before.
    pub fn close(&self) -> bool {
        let mut state = self.state.lock().expect(ERR_POISONED_LOCK);
        let was_closed = state.circuit == Circuit::Closed;
        state.close();
        !was_closed
    }

    pub fn circuit_state(&self) -> CircuitState {
        let now = self.clock.instant();

        match self.state.lock().expect(ERR_POISONED_LOCK).circuit {
            Circuit::Closed => CircuitState::Closed,
            Circuit::Open { blocked_until } if elapsed(blocked_until, now) => CircuitState::HalfOpen,
            Circuit::Open { .. } => CircuitState::Open,
            Circuit::HalfOpen { .. } => CircuitState::HalfOpen,
            Circuit::Isolated => CircuitState::Isolated,
        }
    }

    pub fn last_failure(&self) -> Option<Failure> {
        self.state.lock().expect(ERR_POISONED_LOCK).last_failure.clone()
    }
}

/// `None` means the circuit is blocked for longer than the clock can represent.
type BlockedUntil = Option<Instant>;

fn elapsed(blocked_until: BlockedUntil, now: Instant) -> bool {
    blocked_until.is_some_and(|until| now >= until)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Circuit {
    Closed,
    Open { blocked_until: BlockedUntil },
    HalfOpen { blocked_until: BlockedUntil },
    Isolated,
}

#[derive(Debug)]
struct State {
    circuit: Circuit,
    health: HealthMetrics,
    last_failure: Option<Failure>,
    half_open_attempts: u32,
}

impl State {
    fn enter(&mut self, now: Instant, options: &EngineOptions) -> EnterResult {
        match self.circuit {
            Circuit::Closed => EnterResult::Accepted { half_opened: false },
            Circuit::Isolated => EnterResult::Isolated,
            Circuit::Open { blocked_until } | Circuit::HalfOpen { blocked_until } if elapsed(blocked_until, now) => {
                let half_opened = matches!(self.circuit, Circuit::Open { .. });

                // one trial execution per break duration
                self.circuit = Circuit::HalfOpen {
                    blocked_until: now.checked_add(options.break_duration),
                };

                EnterResult::Accepted { half_opened }
            }
            Circuit::Open { blocked_until } | Circuit::HalfOpen { blocked_until } => EnterResult::Broken {
                retry_after: blocked_until.map(|until| until.saturating_duration_since(now)),
                last_failure: self.last_failure.clone(),
            },
        }
    }

    fn exit(
        &mut self,
        result: ExecutionResult,
        failure: Option<&Failure>,
        now: Instant,
        context: &ExecutionContext,
        options: &EngineOptions,
    ) -> ExitResult {
        if result == ExecutionResult::Success {
            return match self.circuit {
                Circuit::HalfOpen { .. } => {
                    self.close();
                    ExitResult::Closed
                }
                Circuit::Closed => {
                    self.health.record(result, now);
                    ExitResult::Unchanged
                }
                // the state changed between enter and exit, the result is stale
                Circuit::Open { .. } | Circuit::Isolated => ExitResult::Unchanged,
            };
        }

        if let Some(failure) = failure {
            self.last_failure = Some(failure.clone());
        }

        match self.circuit {
            Circuit::HalfOpen { .. } => {
                self.half_open_attempts = self.half_open_attempts.saturating_add(1);
                let info = self.health.health_info(now);
                let break_duration = self.open(now, info, true, context, options);
                ExitResult::Opened { break_duration }
            }
            Circuit::Closed => {
                self.health.record(result, now);
                let info = self.health.health_info(now);

                match info.status() {
                    HealthStatus::Healthy => ExitResult::Unchanged,
                    HealthStatus::Unhealthy => {
                        let break_duration = self.open(now, info, false, context, options);
                        ExitResult::Opened { break_duration }
                    }
                }
            }
            Circuit::Open { .. } | Circuit::Isolated => ExitResult::Unchanged,
        }
    }

    fn open(&mut self, now: Instant, info: HealthInfo, is_half_open: bool, context: &ExecutionContext, options: &EngineOptions) -> Duration {
        let break_duration = options.break_duration_generator.as_ref().map_or(options.break_duration, |generator| {
            generator.call(&BreakDurationGeneratorArgs {
                context,
                failure_rate: info.failure_rate(),
                failure_count: info.failures(),
                half_open_attempts: self.half_open_attempts,
                is_half_open,
            })
        });

        self.circuit = Circuit::Open {
            blocked_until: now.checked_add(break_duration),
        };

        break_duration
    }

    fn close(&mut self) {
        self.circuit = Circuit::Closed;
        self.health.reset();
        self.last_failure = None;
        self.half_open_attempts = 0;
    }
}
