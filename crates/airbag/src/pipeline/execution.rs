// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::sync::Arc;

use super::{PipelineDescriptor, StrategyDescriptor};
use crate::strategy::TypedCallback;
use crate::telemetry::{EventKind, Severity, Telemetry};
use crate::{AnyResult, Callback, ContextPool, ExecutionContext, Outcome, Strategy};

/// A built resilience pipeline.
///
/// Pipelines are immutable and cheap to clone; clones share the same strategies, including
/// the state of circuit breakers. A pipeline serves any number of concurrent executions.
///
/// Created with [`PipelineBuilder`][crate::PipelineBuilder].
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
///
/// use airbag::retry::RetryOptions;
/// use airbag::timeout::TimeoutOptions;
/// use airbag::{Outcome, PipelineBuilder};
/// use tick::Clock;
///
/// # async fn example(clock: Clock) -> Result<(), Box<dyn std::error::Error>> {
/// let pipeline = PipelineBuilder::new(&clock)
///     .name("orders")
///     .add_retry(RetryOptions::new().max_retry_attempts(2))
///     .add_timeout(TimeoutOptions::with_timeout(Duration::from_secs(1)))
///     .build()?;
///
/// let outcome = pipeline
///     .execute(|_context, order_id: &u64| {
///         let order_id = *order_id;
///         async move { Outcome::from_value(format!("order {order_id}")) }
///     }, &42)
///     .await;
///
/// assert_eq!(outcome.into_result()?, "order 42");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    inner: Arc<PipelineInner>,
}

#[derive(Debug)]
pub(crate) struct PipelineInner {
    pub(crate) name: Cow<'static, str>,
    pub(crate) instance_name: Option<Cow<'static, str>>,
    pub(crate) root: Option<Arc<dyn Strategy>>,
    pub(crate) strategies: Vec<StrategyDescriptor>,
    pub(crate) pool: ContextPool,
    pub(crate) telemetry: Telemetry,
}

/// The pipeline produced a value of another type than the executed callback.
#[derive(Debug, thiserror::Error)]
#[error("the pipeline produced a value that is not of the expected type '{expected}'")]
pub(crate) struct UnexpectedResultType {
    expected: &'static str,
}

impl Pipeline {
    pub(crate) fn new(inner: PipelineInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Executes `callback` with `state`, using a context rented from the pipeline's pool.
    ///
    /// The context is reset and returned to the pool once the execution completes.
    pub async fn execute<T, S, F, Fut>(&self, callback: F, state: &S) -> Outcome<T>
    where
        F: Fn(&mut ExecutionContext, &S) -> Fut + Sync,
        S: ?Sized + Sync,
        Fut: Future<Output = Outcome<T>> + Send,
        T: Send + 'static,
    {
        let mut context = self.inner.pool.get();
        let outcome = self.execute_with_context(callback, &mut context, state).await;
        self.inner.pool.put(context);
        outcome
    }

    /// Executes `callback` with `state` and a caller-provided context.
    ///
    /// Use this to pass a cancellation token, an operation key or properties into the execution,
    /// and to read the properties set by the strategies afterwards.
    pub async fn execute_with_context<T, S, F, Fut>(&self, callback: F, context: &mut ExecutionContext, state: &S) -> Outcome<T>
    where
        F: Fn(&mut ExecutionContext, &S) -> Fut + Sync,
        S: ?Sized + Sync,
        Fut: Future<Output = Outcome<T>> + Send,
        T: Send + 'static,
    {
        let callback = TypedCallback::new(&callback, state);
        let telemetry = &self.inner.telemetry;

        telemetry.report(context.operation_key(), EventKind::PipelineExecuting);
        let stopwatch = context.clock().stopwatch();

        let outcome = match &self.inner.root {
            _ if context.is_cancelled() => Outcome::cancelled(),
            Some(strategy) => strategy.execute(&callback, context).await,
            None => callback.invoke(context).await,
        };

        let healthy = outcome.is_success();
        telemetry.report_with_severity(
            context.operation_key(),
            if healthy { Severity::Information } else { Severity::Warning },
            EventKind::PipelineExecuted {
                duration: stopwatch.elapsed(),
                healthy,
            },
        );

        recover_type(outcome)
    }

    /// Describes the strategies of this pipeline, in execution order.
    #[must_use]
    pub fn descriptor(&self) -> PipelineDescriptor {
        PipelineDescriptor {
            name: self.inner.name.to_string(),
            instance_name: self.inner.instance_name.as_deref().map(ToOwned::to_owned),
            strategies: self.inner.strategies.clone(),
        }
    }

    /// The pool the pipeline rents contexts from.
    #[must_use]
    pub fn context_pool(&self) -> &ContextPool {
        &self.inner.pool
    }
}

fn recover_type<T: Any>(outcome: Outcome<AnyResult>) -> Outcome<T> {
    match outcome {
        Outcome::Value(value) => value
            .downcast::<T>()
            .map_or_else(|_| Outcome::from_error(UnexpectedResultType { expected: type_name::<T>() }), Outcome::Value),
        Outcome::Failure(failure) => Outcome::Failure(failure),
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn recover_type_keeps_matching_values() {
        let outcome = recover_type::<u32>(Outcome::Value(AnyResult::new(3_u32)));
        assert_eq!(outcome.into_value(), Some(3));
    }

    #[test]
    fn recover_type_rejects_other_values() {
        let outcome = recover_type::<u32>(Outcome::Value(AnyResult::new("text")));

        let failure = outcome.failure().unwrap();
        assert!(failure.is::<UnexpectedResultType>());
        assert_eq!(
            failure.to_string(),
            "the pipeline produced a value that is not of the expected type 'u32'"
        );
    }

    #[test]
    fn recover_type_keeps_failure_identity() {
        let outcome = Outcome::<AnyResult>::from_error(io::Error::other("boom"));
        let failure = outcome.failure().unwrap().clone();

        let recovered = recover_type::<u32>(outcome);

        assert!(crate::Failure::ptr_eq(recovered.failure().unwrap(), &failure));
    }

    #[test]
    fn pipeline_is_send_sync_clone() {
        static_assertions::assert_impl_all!(Pipeline: Send, Sync, Clone);
    }
}
