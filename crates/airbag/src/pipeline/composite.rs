// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use futures_util::future;

use crate::strategy::{ExecutionFuture, ResultType};
use crate::{BuildError, Callback, ExecutionContext, Outcome, Strategy};

/// Name reported by a composite strategy.
const COMPOSITE_NAME: &str = "Composite";

/// A strategy that runs an ordered chain of strategies, the first one outermost.
#[derive(Debug)]
pub(crate) struct CompositeStrategy {
    first: Link,
}

/// One position in the chain.
#[derive(Debug)]
enum Link {
    /// Runs the strategy with the rest of the chain as its callback.
    Delegating { strategy: Arc<dyn Strategy>, next: Box<Self> },

    /// Runs the last strategy with the user callback.
    Terminal { strategy: Arc<dyn Strategy> },
}

/// The rest of the chain, presented to a strategy as its callback.
struct Continuation<'a> {
    link: &'a Link,
    callback: &'a dyn Callback,
}

impl CompositeStrategy {
    /// Links `strategies` so that they execute in order.
    ///
    /// # Errors
    ///
    /// Fails when fewer than two strategies are given, or when the same strategy instance
    /// appears more than once.
    pub(crate) fn compose(strategies: Vec<Arc<dyn Strategy>>) -> Result<Self, BuildError> {
        if strategies.len() < 2 {
            return Err(BuildError::TooFewStrategies { count: strategies.len() });
        }

        for (index, strategy) in strategies.iter().enumerate() {
            if strategies[..index].iter().any(|other| Arc::ptr_eq(other, strategy)) {
                return Err(BuildError::DuplicateStrategy {
                    name: strategy.name().to_owned().into(),
                });
            }
        }

        let mut strategies = strategies.into_iter().rev();
        let mut first = match strategies.next() {
            Some(strategy) => Link::Terminal { strategy },
            None => return Err(BuildError::TooFewStrategies { count: 0 }),
        };

        for strategy in strategies {
            first = Link::Delegating {
                strategy,
                next: Box::new(first),
            };
        }

        Ok(Self { first })
    }

    /// The linked strategies, outermost first.
    #[cfg(test)]
    pub(crate) fn strategies(&self) -> Vec<Arc<dyn Strategy>> {
        let mut strategies = Vec::new();
        let mut link = &self.first;

        loop {
            match link {
                Link::Delegating { strategy, next } => {
                    strategies.push(Arc::clone(strategy));
                    link = next;
                }
                Link::Terminal { strategy } => {
                    strategies.push(Arc::clone(strategy));
                    return strategies;
                }
            }
        }
    }
}

impl Link {
    fn execute<'a>(&'a self, callback: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        match self {
            Self::Terminal { strategy } => strategy.execute(callback, context),
            Self::Delegating { strategy, next } => Box::pin(async move {
                let continuation = Continuation { link: next, callback };
                strategy.execute(&continuation, context).await
            }),
        }
    }
}

impl Callback for Continuation<'_> {
    fn invoke<'a>(&'a self, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        if context.is_cancelled() {
            return Box::pin(future::ready(Outcome::cancelled()));
        }

        self.link.execute(self.callback, context)
    }

    fn result_type(&self) -> ResultType {
        self.callback.result_type()
    }
}

impl Strategy for CompositeStrategy {
    fn name(&self) -> &str {
        COMPOSITE_NAME
    }

    fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        if context.is_cancelled() {
            return Box::pin(future::ready(Outcome::cancelled()));
        }

        self.first.execute(next, context)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tick::Clock;

    use super::*;
    use crate::{AnyResult, ExecutionCanceled};

    /// Strategy that records when it runs and then delegates.
    #[derive(Debug)]
    struct Recording {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        cancel_inner: bool,
    }

    impl Recording {
        fn new(name: &'static str, log: &Arc<Mutex<Vec<&'static str>>>) -> Arc<dyn Strategy> {
            Arc::new(Self {
                name,
                log: Arc::clone(log),
                cancel_inner: false,
            })
        }
    }

    impl Strategy for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
            self.log.lock().unwrap().push(self.name);
            if self.cancel_inner {
                context.cancellation_token().cancel();
            }
            next.invoke(context)
        }
    }

    struct Value(Arc<Mutex<Vec<&'static str>>>);

    impl Callback for Value {
        fn invoke<'a>(&'a self, _context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
            self.0.lock().unwrap().push("callback");
            Box::pin(async { Outcome::Value(AnyResult::new(1_u8)) })
        }

        fn result_type(&self) -> ResultType {
            ResultType::of::<u8>()
        }
    }

    #[tokio::test]
    async fn strategies_run_in_order() {
        let log = Arc::default();
        let composite =
            CompositeStrategy::compose(vec![Recording::new("a", &log), Recording::new("b", &log), Recording::new("c", &log)])
                .unwrap();
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = composite.execute(&Value(Arc::clone(&log)), &mut context).await;

        assert!(outcome.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c", "callback"]);
        assert_eq!(composite.name(), "Composite");

        let names: Vec<_> = composite.strategies().iter().map(|s| s.name().to_owned()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn fewer_than_two_strategies_is_rejected() {
        let log = Arc::default();

        let err = CompositeStrategy::compose(vec![Recording::new("a", &log)]).unwrap_err();
        assert_eq!(err, BuildError::TooFewStrategies { count: 1 });

        let err = CompositeStrategy::compose(Vec::new()).unwrap_err();
        assert_eq!(err, BuildError::TooFewStrategies { count: 0 });
    }

    #[test]
    fn same_instance_twice_is_rejected() {
        let log = Arc::default();
        let strategy = Recording::new("a", &log);

        let err = CompositeStrategy::compose(vec![Arc::clone(&strategy), Recording::new("b", &log), strategy]).unwrap_err();

        assert_eq!(err, BuildError::DuplicateStrategy { name: "a".into() });
    }

    #[tokio::test]
    async fn cancelled_context_runs_nothing() {
        let log = Arc::default();
        let composite = CompositeStrategy::compose(vec![Recording::new("a", &log), Recording::new("b", &log)]).unwrap();
        let mut context = ExecutionContext::new(&Clock::new_frozen());
        context.cancellation_token().cancel();

        let outcome = composite.execute(&Value(Arc::clone(&log)), &mut context).await;

        assert!(outcome.failure().unwrap().is::<ExecutionCanceled>());
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_is_observed_between_strategies() {
        let log: Arc<Mutex<Vec<&'static str>>> = Arc::default();
        let cancelling: Arc<dyn Strategy> = Arc::new(Recording {
            name: "a",
            log: Arc::clone(&log),
            cancel_inner: true,
        });
        let composite = CompositeStrategy::compose(vec![cancelling, Recording::new("b", &log)]).unwrap();
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = composite.execute(&Value(Arc::clone(&log)), &mut context).await;

        assert!(outcome.failure().unwrap().is_cancellation());
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
    }
}
