// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{Either, select};

use super::backoff::BackoffSchedule;
use super::{DelayGenerator, OnRetry, OnRetryArgs, RetryDelayArgs, RetryOptions};
use crate::options::{Attempt, MaxAttempts};
use crate::predicate::ShouldHandle;
use crate::strategy::ExecutionFuture;
use crate::telemetry::{EventKind, Severity, Telemetry};
use crate::{AnyResult, Callback, ExecutionContext, Outcome, PredicateArgs, Strategy};

/// Re-executes the callback while its outcome is handled, waiting between attempts.
///
/// Created by [`PipelineBuilder::add_retry`][crate::PipelineBuilder::add_retry].
#[derive(Debug)]
pub struct RetryStrategy {
    name: Cow<'static, str>,
    max_attempts: MaxAttempts,
    schedule: BackoffSchedule,
    delay_generator: Option<DelayGenerator>,
    should_handle: ShouldHandle,
    on_retry: Option<OnRetry>,
    telemetry: Telemetry,
}

impl RetryStrategy {
    pub(crate) fn new(options: RetryOptions, telemetry: &Telemetry) -> Self {
        Self {
            telemetry: telemetry.for_strategy(options.name.clone()),
            name: options.name,
            max_attempts: options.max_attempts,
            schedule: options.schedule,
            delay_generator: options.delay_generator,
            should_handle: options.should_handle,
            on_retry: options.on_retry,
        }
    }

    async fn run(&self, next: &dyn Callback, context: &mut ExecutionContext) -> Outcome<AnyResult> {
        let result_type = next.result_type();
        let mut attempt = self.max_attempts.first_attempt();
        let mut delays = self.schedule.delays();

        loop {
            let stopwatch = context.clock().stopwatch();
            let outcome = if context.is_cancelled() {
                Outcome::cancelled()
            } else {
                next.invoke(context).await
            };
            let duration = stopwatch.elapsed();

            let args = PredicateArgs {
                context,
                attempt_number: attempt.index(),
            };
            let handled = self.should_handle.invoke(&outcome, result_type, &args);
            self.report_attempt(context, attempt, duration, handled);

            if !handled {
                return outcome;
            }

            let Some(next_attempt) = attempt.increment(self.max_attempts) else {
                return outcome;
            };

            if context.is_cancelled() {
                return Outcome::cancelled();
            }

            let delay = self.retry_delay(context, &outcome, attempt, delays.next().unwrap_or_default());

            if let Some(on_retry) = &self.on_retry {
                on_retry.call(&OnRetryArgs {
                    context,
                    outcome: outcome.erased_view(),
                    attempt_number: attempt.index(),
                    retry_delay: delay,
                    duration,
                });
            }

            self.telemetry.report(
                context.operation_key(),
                EventKind::OnRetry {
                    attempt_number: attempt.index(),
                    delay,
                    duration,
                },
            );

            // the discarded outcome is released before waiting
            drop(outcome);

            if !delay.is_zero() {
                let token = context.cancellation_token().clone();
                let clock = context.clock().clone();

                if let Either::Right(_) = select(pin!(clock.delay(delay)), pin!(token.cancelled())).await {
                    return Outcome::cancelled();
                }
            }

            attempt = next_attempt;
        }
    }

    fn retry_delay(&self, context: &ExecutionContext, outcome: &Outcome<AnyResult>, attempt: Attempt, hint: Duration) -> Duration {
        let Some(generator) = &self.delay_generator else {
            return hint;
        };

        generator
            .call(&RetryDelayArgs {
                context,
                outcome: outcome.erased_view(),
                attempt_number: attempt.index(),
                delay_hint: hint,
            })
            .unwrap_or(hint)
    }

    fn report_attempt(&self, context: &ExecutionContext, attempt: Attempt, duration: Duration, handled: bool) {
        let severity = match (handled, attempt.is_last()) {
            (true, true) => Severity::Error,
            (true, false) => Severity::Warning,
            (false, _) => Severity::Information,
        };

        self.telemetry.report_with_severity(
            context.operation_key(),
            severity,
            EventKind::ExecutionAttempt {
                attempt_number: attempt.index(),
                duration,
                handled,
            },
        );
    }
}

impl Strategy for RetryStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        Box::pin(self.run(next, context))
    }
}
