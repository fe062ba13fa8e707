// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::fmt::{self, Debug};
use std::sync::Arc;

use futures_util::future::BoxFuture;

use super::HedgingActionArgs;
use crate::strategy::ResultType;
use crate::{AnyResult, Outcome};

/// The work performed by one hedged attempt.
///
/// Returned by the [`action_generator`][super::HedgingOptions::action_generator] callback.
///
/// # Examples
///
/// ```rust
/// use airbag::Outcome;
/// use airbag::hedging::{HedgedAction, HedgingOptions};
///
/// let options = HedgingOptions::new().action_generator(|args| {
///     if args.attempt_number() == 1 {
///         // query a fallback replica instead of repeating the original call
///         Some(HedgedAction::from_future(async { Outcome::from_value("replica".to_string()) }))
///     } else {
///         Some(HedgedAction::original())
///     }
/// });
/// ```
pub struct HedgedAction<T>(Action<T>);

enum Action<T> {
    Original,
    Custom(BoxFuture<'static, Outcome<T>>),
}

impl<T> HedgedAction<T> {
    /// Repeats the callback the pipeline is executing.
    #[must_use]
    pub fn original() -> Self {
        Self(Action::Original)
    }

    /// Runs `future` as the hedged attempt.
    #[must_use]
    pub fn from_future(future: impl Future<Output = Outcome<T>> + Send + 'static) -> Self {
        Self(Action::Custom(Box::pin(future)))
    }
}

impl<T> Debug for HedgedAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            Action::Original => "original",
            Action::Custom(_) => "custom",
        };

        f.debug_tuple("HedgedAction").field(&kind).finish()
    }
}

/// A hedged action with its result type erased.
pub(super) enum ErasedAction {
    Original,
    Custom(BoxFuture<'static, Outcome<AnyResult>>),
}

type GenerateFn = dyn Fn(&HedgingActionArgs<'_>) -> Option<ErasedAction> + Send + Sync;

/// Type-erased action generator bound to one result type.
#[derive(Clone)]
pub(crate) struct ActionGenerator {
    result_type: TypeId,
    generate: Arc<GenerateFn>,
}

impl ActionGenerator {
    pub(crate) fn new<T, F>(generator: F) -> Self
    where
        T: Any + Send,
        F: Fn(&HedgingActionArgs<'_>) -> Option<HedgedAction<T>> + Send + Sync + 'static,
    {
        let generate = move |args: &HedgingActionArgs<'_>| {
            generator(args).map(|action| match action.0 {
                Action::Original => ErasedAction::Original,
                Action::Custom(future) => ErasedAction::Custom(Box::pin(async move { future.await.map(AnyResult::new) })),
            })
        };

        Self {
            result_type: TypeId::of::<T>(),
            generate: Arc::new(generate),
        }
    }

    /// Generates the action of a hedged attempt; `None` stops hedging.
    ///
    /// Executions producing another result type than the generator's repeat the original callback.
    pub(super) fn generate(&self, result_type: ResultType, args: &HedgingActionArgs<'_>) -> Option<ErasedAction> {
        if result_type.id() == self.result_type {
            (self.generate)(args)
        } else {
            Some(ErasedAction::Original)
        }
    }
}

impl Debug for ActionGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionGenerator").finish_non_exhaustive()
    }
}
