// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::Any;
use std::time::Duration;

use crate::{ExecutionContext, Outcome};

/// Arguments for the [`break_duration_generator`][super::CircuitBreakerOptions::break_duration_generator] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct BreakDurationGeneratorArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) failure_rate: f32,
    pub(super) failure_count: u32,
    pub(super) half_open_attempts: u32,
    pub(super) is_half_open: bool,
}

impl BreakDurationGeneratorArgs<'_> {
    /// The context of the execution that opened the circuit.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// Ratio of handled outcomes in the sampling window, between 0 and 1.
    #[must_use]
    pub fn failure_rate(&self) -> f32 {
        self.failure_rate
    }

    /// Number of handled outcomes in the sampling window.
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    /// Number of consecutive failed trial executions since the circuit was last closed.
    ///
    /// Useful for growing the break duration while the protected resource stays unhealthy.
    #[must_use]
    pub fn half_open_attempts(&self) -> u32 {
        self.half_open_attempts
    }

    /// Returns `true` when the circuit opens again after a failed trial execution.
    #[must_use]
    pub fn is_half_open(&self) -> bool {
        self.is_half_open
    }
}

/// Arguments for the [`on_opened`][super::CircuitBreakerOptions::on_opened] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnCircuitOpenedArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) outcome: Option<Outcome<&'a dyn Any>>,
    pub(super) break_duration: Duration,
    pub(super) is_manual: bool,
}

impl OnCircuitOpenedArgs<'_> {
    /// The context of the execution that opened the circuit.
    ///
    /// For manual isolation this is a fresh context.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// The outcome that opened the circuit, or `None` when it was isolated manually.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome<&dyn Any>> {
        self.outcome.as_ref()
    }

    /// How long the circuit stays open. [`Duration::MAX`] for manual isolation.
    #[must_use]
    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    /// Returns `true` when the circuit was isolated manually.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.is_manual
    }
}

/// Arguments for the [`on_closed`][super::CircuitBreakerOptions::on_closed] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnCircuitClosedArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) is_manual: bool,
}

impl OnCircuitClosedArgs<'_> {
    /// The context of the trial execution that closed the circuit, or a fresh context when the
    /// circuit was closed manually.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// Returns `true` when the circuit was closed manually.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.is_manual
    }
}

/// Arguments for the [`on_half_opened`][super::CircuitBreakerOptions::on_half_opened] callback.
#[derive(Debug)]
#[non_exhaustive]
pub struct OnCircuitHalfOpenedArgs<'a> {
    pub(super) context: &'a ExecutionContext,
}

impl OnCircuitHalfOpenedArgs<'_> {
    /// The context of the trial execution.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }
}
