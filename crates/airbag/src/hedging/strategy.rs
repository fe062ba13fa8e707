// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::borrow::Cow;
use std::pin::pin;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::future::{BoxFuture, Either, select};
use futures_util::stream::FuturesUnordered;
use tick::Delay;
use tokio_util::sync::CancellationToken;

use super::action::{ActionGenerator, ErasedAction};
use super::{DelayGenerator, HedgingActionArgs, HedgingDelayArgs, HedgingOptions, OnHedging, OnHedgingArgs};
use crate::predicate::ShouldHandle;
use crate::strategy::{ExecutionFuture, ResultType};
use crate::telemetry::{EventKind, Telemetry};
use crate::{AnyResult, Callback, ExecutionContext, Outcome, PredicateArgs, Strategy};

/// Races concurrent attempts of the callback and returns the first acceptable outcome.
///
/// Created by [`PipelineBuilder::add_hedging`][crate::PipelineBuilder::add_hedging].
#[derive(Debug)]
pub struct HedgingStrategy {
    name: Cow<'static, str>,
    max_hedged_attempts: u32,
    delay: Duration,
    delay_generator: Option<DelayGenerator>,
    action_generator: Option<ActionGenerator>,
    should_handle: ShouldHandle,
    on_hedging: Option<OnHedging>,
    telemetry: Telemetry,
}

/// A finished attempt together with the context it ran with.
struct Completed {
    attempt_number: u32,
    context: ExecutionContext,
    outcome: Outcome<AnyResult>,
    duration: Duration,
}

/// Attempts launched by one execution.
struct Attempts<'a> {
    pending: FuturesUnordered<BoxFuture<'a, Completed>>,
    tokens: Vec<CancellationToken>,
    launched: u32,
    stopped: bool,
}

impl Attempts<'_> {
    fn new() -> Self {
        Self {
            pending: FuturesUnordered::new(),
            tokens: Vec::new(),
            launched: 0,
            stopped: false,
        }
    }

    fn can_launch(&self, max_hedged_attempts: u32) -> bool {
        !self.stopped && self.launched < max_hedged_attempts
    }

    /// Cancels every attempt and drops the ones still running.
    fn abandon(self) {
        for token in &self.tokens {
            token.cancel();
        }
    }
}

enum Event {
    Completed(Option<Completed>),
    DelayElapsed,
    Cancelled,
}

impl HedgingStrategy {
    pub(crate) fn new(options: HedgingOptions, telemetry: &Telemetry) -> Self {
        Self {
            telemetry: telemetry.for_strategy(options.name.clone()),
            name: options.name,
            max_hedged_attempts: options.max_hedged_attempts,
            delay: options.delay,
            delay_generator: options.delay_generator,
            action_generator: options.action_generator,
            should_handle: options.should_handle,
            on_hedging: options.on_hedging,
        }
    }

    async fn run<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> Outcome<AnyResult> {
        if context.is_cancelled() {
            return Outcome::cancelled();
        }

        let result_type = next.result_type();
        let token = context.cancellation_token().clone();
        let clock = context.clock().clone();
        let mut attempts = Attempts::new();
        let mut last: Option<Completed> = None;

        self.launch(next, context, result_type, &mut attempts);

        loop {
            let delay = attempts
                .can_launch(self.max_hedged_attempts)
                .then(|| self.hedging_delay(context, attempts.launched));

            // zero delay launches the remaining attempts in order, before any of them is polled
            if delay == Some(Duration::ZERO) {
                self.launch(next, context, result_type, &mut attempts);
                continue;
            }

            let event = next_event(&mut attempts.pending, delay.map(|delay| clock.delay(delay)), &token).await;

            match event {
                Event::Cancelled => {
                    attempts.abandon();
                    return Outcome::cancelled();
                }
                Event::DelayElapsed => self.launch(next, context, result_type, &mut attempts),
                Event::Completed(None) => break,
                Event::Completed(Some(completed)) => {
                    let handled = self.should_handle.invoke(
                        &completed.outcome,
                        result_type,
                        &PredicateArgs {
                            context: &completed.context,
                            attempt_number: completed.attempt_number,
                        },
                    );

                    self.telemetry.report(
                        context.operation_key(),
                        EventKind::ExecutionAttempt {
                            attempt_number: completed.attempt_number,
                            duration: completed.duration,
                            handled,
                        },
                    );

                    if !handled {
                        attempts.abandon();
                        return accept(context, completed);
                    }

                    if token.is_cancelled() {
                        attempts.abandon();
                        return Outcome::cancelled();
                    }

                    // the previous unacceptable outcome is released here
                    last = Some(completed);

                    if attempts.can_launch(self.max_hedged_attempts) {
                        self.launch(next, context, result_type, &mut attempts);
                    }
                }
            }
        }

        match last {
            Some(completed) => accept(context, completed),
            None => Outcome::cancelled(),
        }
    }

    fn launch<'a>(
        &self,
        next: &'a dyn Callback,
        primary: &ExecutionContext,
        result_type: ResultType,
        attempts: &mut Attempts<'a>,
    ) {
        let attempt_number = attempts.launched;
        let mut action_context = primary.fork();

        let action = match (&self.action_generator, attempt_number) {
            (Some(generator), 1..) => generator.generate(
                result_type,
                &HedgingActionArgs {
                    primary_context: primary,
                    action_context: &action_context,
                    attempt_number,
                },
            ),
            _ => Some(ErasedAction::Original),
        };

        let Some(action) = action else {
            attempts.stopped = true;
            return;
        };

        if attempt_number > 0 {
            if let Some(on_hedging) = &self.on_hedging {
                on_hedging.call(&OnHedgingArgs {
                    primary_context: primary,
                    action_context: &action_context,
                    attempt_number,
                });
            }

            self.telemetry
                .report(primary.operation_key(), EventKind::OnHedging { attempt_number });
        }

        attempts.launched += 1;
        attempts.tokens.push(action_context.cancellation_token().clone());

        let stopwatch = primary.clock().stopwatch();
        let future: BoxFuture<'a, Completed> = match action {
            ErasedAction::Original => Box::pin(async move {
                let outcome = next.invoke(&mut action_context).await;
                Completed {
                    attempt_number,
                    context: action_context,
                    outcome,
                    duration: stopwatch.elapsed(),
                }
            }),
            ErasedAction::Custom(future) => Box::pin(async move {
                let outcome = future.await;
                Completed {
                    attempt_number,
                    context: action_context,
                    outcome,
                    duration: stopwatch.elapsed(),
                }
            }),
        };

        attempts.pending.push(future);
    }

    fn hedging_delay(&self, context: &ExecutionContext, attempt_number: u32) -> Duration {
        match &self.delay_generator {
            Some(generator) => generator.call(&HedgingDelayArgs { context, attempt_number }),
            None => self.delay,
        }
    }
}

/// Copies the properties of the accepted attempt into the caller's context.
fn accept(context: &mut ExecutionContext, completed: Completed) -> Outcome<AnyResult> {
    context.properties_mut().replace_with(completed.context.properties());
    completed.outcome
}

async fn next_event(
    pending: &mut FuturesUnordered<BoxFuture<'_, Completed>>,
    delay: Option<Delay>,
    token: &CancellationToken,
) -> Event {
    let completed = pin!(pending.next());
    let cancelled = pin!(token.cancelled());

    match delay {
        Some(delay) => match select(completed, select(pin!(delay), cancelled)).await {
            Either::Left((completed, _)) => Event::Completed(completed),
            Either::Right((Either::Left(_), _)) => Event::DelayElapsed,
            Either::Right((Either::Right(_), _)) => Event::Cancelled,
        },
        None => match select(completed, cancelled).await {
            Either::Left((completed, _)) => Event::Completed(completed),
            Either::Right(_) => Event::Cancelled,
        },
    }
}

impl Strategy for HedgingStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        Box::pin(self.run(next, context))
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use futures_util::FutureExt;
    use tick::{Clock, ClockControl};

    use super::*;
    use crate::hedging::HedgedAction;
    use crate::telemetry::Severity;
    use crate::testing::{DropCounter, recording_telemetry};
    use crate::{ExecutionCanceled, ResiliencePropertyKey};

    const WINNER: ResiliencePropertyKey<u32> = ResiliencePropertyKey::new("winner");

    /// What a scripted call does.
    #[derive(Clone, Copy)]
    enum Step {
        Succeed,
        Fail,
        Block,
    }

    /// Callback following a script, one step per call; blocked calls wait for cancellation.
    struct Scripted {
        steps: Vec<Step>,
        calls: Mutex<Vec<(Instant, CancellationToken)>>,
    }

    impl Scripted {
        fn new(steps: &[Step]) -> Self {
            Self {
                steps: steps.to_vec(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_times(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().iter().map(|(time, _)| *time).collect()
        }

        fn token(&self, call: usize) -> CancellationToken {
            self.calls.lock().unwrap()[call].1.clone()
        }
    }

    impl Callback for Scripted {
        fn invoke<'a>(&'a self, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
            let token = context.cancellation_token().clone();
            let call = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((context.clock().instant(), token.clone()));
                u32::try_from(calls.len() - 1).unwrap()
            };
            context.properties_mut().set(&WINNER, call);

            let step = self.steps.get(call as usize).copied().unwrap_or(Step::Fail);
            Box::pin(async move {
                match step {
                    Step::Succeed => Outcome::Value(AnyResult::new(call)),
                    Step::Fail => Outcome::from_error(io::Error::other(format!("failure {call}"))),
                    Step::Block => {
                        token.cancelled().await;
                        Outcome::cancelled()
                    }
                }
            })
        }

        fn result_type(&self) -> ResultType {
            ResultType::of::<u32>()
        }
    }

    fn strategy(options: HedgingOptions) -> HedgingStrategy {
        HedgingStrategy::new(options, &Telemetry::disabled())
    }

    fn auto_clock() -> (ClockControl, Clock) {
        let control = ClockControl::new().auto_advance_timers(true);
        let clock = control.to_clock();
        (control, clock)
    }

    fn value(outcome: &Outcome<AnyResult>) -> Option<u32> {
        outcome.value().and_then(AnyResult::downcast_ref::<u32>).copied()
    }

    #[tokio::test]
    async fn blocked_primary_is_hedged_after_each_delay() {
        let (_control, clock) = auto_clock();
        let delay = Duration::from_millis(300);
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3).delay(delay));
        let callback = Scripted::new(&[Step::Block, Step::Block, Step::Succeed]);
        let mut context = ExecutionContext::new(&clock);

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(2));
        assert_eq!(callback.call_count(), 3);

        let times = callback.call_times();
        assert_eq!(times[1] - times[0], delay);
        assert_eq!(times[2] - times[1], delay);

        assert!(callback.token(0).is_cancelled());
        assert!(callback.token(1).is_cancelled());
        assert!(!context.is_cancelled());
    }

    #[tokio::test]
    async fn fast_primary_is_not_hedged() {
        let (sink, telemetry) = recording_telemetry();
        let hedging = HedgingStrategy::new(HedgingOptions::new(), &telemetry);
        let callback = Scripted::new(&[Step::Succeed]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(0));
        assert_eq!(callback.call_count(), 1);
        assert_eq!(
            sink.kinds(),
            vec![EventKind::ExecutionAttempt {
                attempt_number: 0,
                duration: Duration::ZERO,
                handled: false,
            }]
        );
    }

    #[tokio::test]
    async fn handled_outcome_launches_next_attempt_immediately() {
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3));
        let callback = Scripted::new(&[Step::Fail, Step::Succeed]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(1));
        assert_eq!(callback.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_attempts_return_last_outcome() {
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3));
        let callback = Scripted::new(&[Step::Fail, Step::Fail, Step::Fail]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(callback.call_count(), 3);
        assert_eq!(outcome.failure().unwrap().to_string(), "failure 2");
        assert_eq!(context.properties().get(&WINNER), Some(&2));
    }

    /// Cancels the caller's token and fails, counting its calls.
    struct CancelCaller {
        caller: CancellationToken,
        calls: AtomicU32,
    }

    impl Callback for CancelCaller {
        fn invoke<'a>(&'a self, _context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.caller.cancel();
            Box::pin(async { Outcome::from_error(io::Error::other("primary failed")) })
        }

        fn result_type(&self) -> ResultType {
            ResultType::of::<u32>()
        }
    }

    #[tokio::test]
    async fn cancellation_wins_over_handled_outcome() {
        let (_control, clock) = auto_clock();
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3).delay(Duration::from_secs(1)));
        let caller = CancellationToken::new();
        let callback = CancelCaller {
            caller: caller.clone(),
            calls: AtomicU32::new(0),
        };
        let mut context = ExecutionContext::new(&clock);
        context.set_cancellation_token(caller.clone());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert!(caller.is_cancelled());
        assert!(outcome.failure().unwrap().is_cancellation());
        assert_eq!(callback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_delay_launches_every_attempt_in_order() {
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3).delay(Duration::ZERO));
        let callback = Scripted::new(&[Step::Block, Step::Block, Step::Succeed]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(2));
        assert_eq!(callback.call_count(), 3);
        assert!(callback.token(0).is_cancelled());
        assert!(callback.token(1).is_cancelled());
    }

    #[tokio::test]
    async fn max_delay_hedges_sequentially() {
        let (_control, clock) = auto_clock();
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3).delay(Duration::MAX));

        let blocked = Scripted::new(&[Step::Block]);
        let mut context = ExecutionContext::new(&clock);
        assert!(hedging.execute(&blocked, &mut context).now_or_never().is_none());
        assert_eq!(blocked.call_count(), 1);

        let callback = Scripted::new(&[Step::Fail, Step::Fail, Step::Succeed]);
        let mut context = ExecutionContext::new(&clock);
        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(2));
        assert_eq!(callback.call_count(), 3);
    }

    #[tokio::test]
    async fn delay_generator_receives_next_attempt_number() {
        let (_control, clock) = auto_clock();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3).delay_generator(move |args| {
            seen_clone.lock().unwrap().push(args.attempt_number());
            Duration::from_secs(u64::from(args.attempt_number()))
        }));
        let callback = Scripted::new(&[Step::Block, Step::Block, Step::Succeed]);
        let mut context = ExecutionContext::new(&clock);

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(2));
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);

        let times = callback.call_times();
        assert_eq!(times[1] - times[0], Duration::from_secs(1));
        assert_eq!(times[2] - times[1], Duration::from_secs(2));
    }

    #[tokio::test]
    async fn winner_properties_are_copied_to_caller() {
        let hedging = strategy(HedgingOptions::new().delay(Duration::ZERO));
        let callback = Scripted::new(&[Step::Block, Step::Succeed]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(1));
        assert_eq!(context.properties().get(&WINNER), Some(&1));
    }

    #[tokio::test]
    async fn caller_cancellation_aborts_hedging() {
        let hedging = strategy(HedgingOptions::new().max_hedged_attempts(3));
        let callback = Scripted::new(&[Step::Block, Step::Block, Step::Block]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());
        let token = context.cancellation_token().clone();

        let mut execution = hedging.execute(&callback, &mut context);
        assert!((&mut execution).now_or_never().is_none());

        token.cancel();
        let outcome = execution.await;

        assert!(outcome.failure().unwrap().is::<ExecutionCanceled>());
        assert_eq!(callback.call_count(), 1);
        assert!(callback.token(0).is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_caller_launches_nothing() {
        let hedging = strategy(HedgingOptions::new());
        let callback = Scripted::new(&[Step::Succeed]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());
        context.cancellation_token().cancel();

        let outcome = hedging.execute(&callback, &mut context).await;

        assert!(outcome.failure().unwrap().is_cancellation());
        assert_eq!(callback.call_count(), 0);
    }

    #[tokio::test]
    async fn action_generator_provides_hedged_action() {
        let hedging = strategy(
            HedgingOptions::new()
                .delay(Duration::ZERO)
                .action_generator(|args| {
                    assert_eq!(args.attempt_number(), 1);
                    assert!(!args.action_context().is_cancelled());
                    Some(HedgedAction::from_future(async { Outcome::from_value(99_u32) }))
                }),
        );
        let callback = Scripted::new(&[Step::Block]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(99));
        assert_eq!(callback.call_count(), 1);
        assert!(callback.token(0).is_cancelled());
    }

    #[tokio::test]
    async fn action_generator_none_stops_hedging() {
        let hedging = strategy(
            HedgingOptions::new()
                .max_hedged_attempts(5)
                .action_generator(|_| None::<HedgedAction<u32>>),
        );
        let callback = Scripted::new(&[Step::Fail]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(outcome.failure().unwrap().to_string(), "failure 0");
        assert_eq!(callback.call_count(), 1);
    }

    #[tokio::test]
    async fn action_generator_of_other_type_repeats_callback() {
        let hedging = strategy(
            HedgingOptions::new()
                .action_generator(|_| Some(HedgedAction::from_future(async { Outcome::from_value("other") }))),
        );
        let callback = Scripted::new(&[Step::Fail, Step::Succeed]);
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(value(&outcome), Some(1));
        assert_eq!(callback.call_count(), 2);
    }

    #[tokio::test]
    async fn on_hedging_and_telemetry_per_hedged_attempt() {
        let (_control, clock) = auto_clock();
        let (sink, telemetry) = recording_telemetry();
        let hedged = Arc::new(Mutex::new(Vec::new()));
        let hedged_clone = Arc::clone(&hedged);
        let hedging = HedgingStrategy::new(
            HedgingOptions::new().max_hedged_attempts(3).on_hedging(move |args| {
                assert!(!args.primary_context().is_cancelled());
                assert!(!args.action_context().is_cancelled());
                hedged_clone.lock().unwrap().push(args.attempt_number());
            }),
            &telemetry,
        );
        let callback = Scripted::new(&[Step::Block, Step::Block, Step::Succeed]);
        let mut context = ExecutionContext::new(&clock);
        context.set_operation_key("op");

        let _ = hedging.execute(&callback, &mut context).await;

        assert_eq!(*hedged.lock().unwrap(), vec![1, 2]);

        let events = sink.events();
        let hedging_events: Vec<_> = events
            .iter()
            .filter(|e| matches!(e.kind, EventKind::OnHedging { .. }))
            .collect();
        assert_eq!(hedging_events.len(), 2);
        assert_eq!(hedging_events[0].kind, EventKind::OnHedging { attempt_number: 1 });
        assert_eq!(hedging_events[0].severity, Severity::Warning);
        assert_eq!(hedging_events[0].strategy_name.as_deref(), Some("Hedging"));
        assert_eq!(hedging_events[0].operation_key.as_deref(), Some("op"));

        assert!(events.iter().any(|e| e.kind
            == EventKind::ExecutionAttempt {
                attempt_number: 2,
                duration: Duration::ZERO,
                handled: false,
            }));
    }

    #[tokio::test]
    async fn discarded_results_are_dropped() {
        struct Values {
            calls: AtomicU32,
            drops: Arc<AtomicUsize>,
        }

        impl Callback for Values {
            fn invoke<'a>(&'a self, _context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
                let id = self.calls.fetch_add(1, Ordering::SeqCst);
                let value = DropCounter::new(id, &self.drops);
                Box::pin(async move { Outcome::Value(AnyResult::new(value)) })
            }

            fn result_type(&self) -> ResultType {
                ResultType::of::<DropCounter>()
            }
        }

        let drops = Arc::new(AtomicUsize::new(0));
        let hedging = strategy(
            HedgingOptions::new()
                .delay(Duration::ZERO)
                .should_handle::<DropCounter, _>(|outcome, _| outcome.value().is_some_and(|v| v.id == 0)),
        );
        let callback = Values {
            calls: AtomicU32::new(0),
            drops: Arc::clone(&drops),
        };
        let mut context = ExecutionContext::new(&Clock::new_frozen());

        let outcome = hedging.execute(&callback, &mut context).await;

        assert_eq!(drops.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.value().and_then(AnyResult::downcast_ref::<DropCounter>).unwrap().id, 1);
        drop(outcome);
        assert_eq!(drops.load(Ordering::SeqCst), 2);
    }
}
