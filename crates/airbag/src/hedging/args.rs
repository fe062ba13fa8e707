// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::ExecutionContext;

/// Arguments for the [`delay_generator`][super::HedgingOptions::delay_generator] callback.
#[derive(Debug)]
pub struct HedgingDelayArgs<'a> {
    pub(super) context: &'a ExecutionContext,
    pub(super) attempt_number: u32,
}

impl HedgingDelayArgs<'_> {
    /// The context of the caller.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// Zero-based number of the attempt that launches once the delay elapses.
    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }
}

/// Arguments for the [`action_generator`][super::HedgingOptions::action_generator] callback.
#[derive(Debug)]
pub struct HedgingActionArgs<'a> {
    pub(super) primary_context: &'a ExecutionContext,
    pub(super) action_context: &'a ExecutionContext,
    pub(super) attempt_number: u32,
}

impl HedgingActionArgs<'_> {
    /// The context of the caller.
    #[must_use]
    pub fn primary_context(&self) -> &ExecutionContext {
        self.primary_context
    }

    /// The forked context the hedged action runs with.
    ///
    /// Clone its cancellation token into the action to observe cancellation of losing attempts.
    #[must_use]
    pub fn action_context(&self) -> &ExecutionContext {
        self.action_context
    }

    /// Zero-based number of the hedged attempt.
    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }
}

/// Arguments for the [`on_hedging`][super::HedgingOptions::on_hedging] callback.
#[derive(Debug)]
pub struct OnHedgingArgs<'a> {
    pub(super) primary_context: &'a ExecutionContext,
    pub(super) action_context: &'a ExecutionContext,
    pub(super) attempt_number: u32,
}

impl OnHedgingArgs<'_> {
    /// The context of the caller.
    #[must_use]
    pub fn primary_context(&self) -> &ExecutionContext {
        self.primary_context
    }

    /// The forked context of the attempt being launched.
    #[must_use]
    pub fn action_context(&self) -> &ExecutionContext {
        self.action_context
    }

    /// Zero-based number of the attempt being launched.
    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use tick::Clock;

    use super::*;

    #[test]
    fn accessors() {
        let primary = ExecutionContext::new(&Clock::new_frozen());
        let action = primary.fork();

        let args = OnHedgingArgs {
            primary_context: &primary,
            action_context: &action,
            attempt_number: 2,
        };
        assert!(std::ptr::eq(args.primary_context(), &primary));
        assert!(std::ptr::eq(args.action_context(), &action));
        assert_eq!(args.attempt_number(), 2);

        let args = HedgingDelayArgs {
            context: &primary,
            attempt_number: 1,
        };
        assert_eq!(args.attempt_number(), 1);
        assert!(std::ptr::eq(args.context(), &primary));
    }
}
