// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::pin::pin;
use std::time::Duration;

use futures_util::future::{Either, select};
use tokio_util::sync::CancellationToken;

use super::{OnTimeout, OnTimeoutArgs, TimeoutGenerator, TimeoutGeneratorArgs, TimeoutOptions};
use crate::strategy::ExecutionFuture;
use crate::telemetry::{EventKind, Telemetry};
use crate::{AnyResult, Callback, ExecutionContext, Failure, Outcome, Strategy, TimeoutRejected};

/// Cancels the callback when it does not complete within the configured timeout.
///
/// Created by [`PipelineBuilder::add_timeout`][crate::PipelineBuilder::add_timeout].
#[derive(Debug)]
pub struct TimeoutStrategy {
    name: Cow<'static, str>,
    timeout: Duration,
    timeout_generator: Option<TimeoutGenerator>,
    on_timeout: Option<OnTimeout>,
    telemetry: Telemetry,
}

impl TimeoutStrategy {
    pub(crate) fn new(options: TimeoutOptions, telemetry: &Telemetry) -> Self {
        Self {
            telemetry: telemetry.for_strategy(options.name.clone()),
            name: options.name,
            timeout: options.timeout,
            timeout_generator: options.timeout_generator,
            on_timeout: options.on_timeout,
        }
    }

    fn timeout_for(&self, context: &ExecutionContext) -> Duration {
        self.timeout_generator
            .as_ref()
            .map_or(self.timeout, |generator| generator.call(&TimeoutGeneratorArgs { context }))
    }

    async fn run(&self, next: &dyn Callback, context: &mut ExecutionContext) -> Outcome<AnyResult> {
        let timeout = self.timeout_for(context);
        if timeout.is_zero() || timeout == Duration::MAX {
            return next.invoke(context).await;
        }

        let timer = context.clock().delay(timeout);
        let parent = context.cancellation_token().clone();
        let child = parent.child_token();
        context.replace_cancellation_token(child.clone());

        let completed = {
            let execution = next.invoke(context);

            match select(execution, pin!(timer)).await {
                Either::Left((outcome, _)) => Some(outcome),
                Either::Right(((), _)) => {
                    // the pending execution is dropped when this arm ends
                    child.cancel();
                    None
                }
            }
        };

        context.replace_cancellation_token(parent.clone());

        match completed {
            Some(outcome) if !Self::cancelled_by_timeout(&outcome, &child, &parent) => outcome,
            _ => self.timed_out(context, timeout),
        }
    }

    // the callback may finish with a cancellation right after the child token fired
    fn cancelled_by_timeout(outcome: &Outcome<AnyResult>, child: &CancellationToken, parent: &CancellationToken) -> bool {
        child.is_cancelled() && !parent.is_cancelled() && outcome.failure().is_some_and(Failure::is_cancellation)
    }

    fn timed_out(&self, context: &ExecutionContext, timeout: Duration) -> Outcome<AnyResult> {
        if let Some(on_timeout) = &self.on_timeout {
            on_timeout.call(&OnTimeoutArgs { context, timeout });
        }

        self.telemetry.report(context.operation_key(), EventKind::OnTimeout { timeout });

        Outcome::from_error(TimeoutRejected::new(timeout))
    }
}

impl Strategy for TimeoutStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        Box::pin(self.run(next, context))
    }
}
