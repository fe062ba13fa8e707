// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::error::Error;
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::strategy::ResultType;
use crate::{AnyResult, ExecutionContext, Outcome};

/// Arguments passed to `should_handle` predicates.
#[derive(Debug, Clone, Copy)]
pub struct PredicateArgs<'a> {
    pub(crate) context: &'a ExecutionContext,
    pub(crate) attempt_number: u32,
}

impl PredicateArgs<'_> {
    /// The context of the execution that produced the outcome.
    #[must_use]
    pub fn context(&self) -> &ExecutionContext {
        self.context
    }

    /// Zero-based number of the attempt that produced the outcome.
    ///
    /// Always zero for strategies that do not repeat the execution.
    #[must_use]
    pub fn attempt_number(&self) -> u32 {
        self.attempt_number
    }
}

type UntypedFn = dyn Fn(Outcome<&dyn Any>, &PredicateArgs<'_>) -> bool + Send + Sync;
type ErasedTypedFn = dyn Fn(&Outcome<AnyResult>, &PredicateArgs<'_>) -> bool + Send + Sync;

/// A single predicate, tagged by how it was declared.
#[derive(Clone)]
enum Predicate {
    /// Declared against any result type; sees the value up-cast to `Any`.
    Untyped(Arc<UntypedFn>),

    /// Declared against one result type; declines every other type.
    Typed { result_type: TypeId, predicate: Arc<ErasedTypedFn> },
}

impl Predicate {
    fn invoke(&self, outcome: &Outcome<AnyResult>, result_type: ResultType, args: &PredicateArgs<'_>) -> bool {
        match self {
            Self::Untyped(predicate) => predicate(outcome.erased_view(), args),
            Self::Typed {
                result_type: expected,
                predicate,
            } => *expected == result_type.id() && predicate(outcome, args),
        }
    }
}

/// Decides which outcomes a strategy handles.
///
/// Holds the default predicate until the first predicate is configured; after that, an outcome
/// is handled when any configured predicate returns `true`.
#[derive(Clone)]
pub(crate) struct ShouldHandle {
    predicates: Vec<Predicate>,
    is_default: bool,
}

impl Default for ShouldHandle {
    fn default() -> Self {
        Self {
            predicates: vec![Predicate::Untyped(Arc::new(handles_failure))],
            is_default: true,
        }
    }
}

fn handles_failure(outcome: Outcome<&dyn Any>, _args: &PredicateArgs<'_>) -> bool {
    outcome.failure().is_some_and(|failure| !failure.is_cancellation())
}

impl ShouldHandle {
    pub(crate) fn add_typed<T, F>(&mut self, predicate: F)
    where
        T: Any,
        F: Fn(Outcome<&T>, &PredicateArgs<'_>) -> bool + Send + Sync + 'static,
    {
        let erased = move |outcome: &Outcome<AnyResult>, args: &PredicateArgs<'_>| {
            outcome.typed_view::<T>().is_some_and(|view| predicate(view, args))
        };

        self.push(Predicate::Typed {
            result_type: TypeId::of::<T>(),
            predicate: Arc::new(erased),
        });
    }

    pub(crate) fn add_untyped<F>(&mut self, predicate: F)
    where
        F: Fn(Outcome<&dyn Any>, &PredicateArgs<'_>) -> bool + Send + Sync + 'static,
    {
        self.push(Predicate::Untyped(Arc::new(predicate)));
    }

    pub(crate) fn add_error<E: Error + 'static>(&mut self) {
        self.add_untyped(|outcome, _| outcome.failure().is_some_and(|failure| failure.is::<E>()));
    }

    fn push(&mut self, predicate: Predicate) {
        if self.is_default {
            self.predicates.clear();
            self.is_default = false;
        }

        self.predicates.push(predicate);
    }

    pub(crate) fn invoke(&self, outcome: &Outcome<AnyResult>, result_type: ResultType, args: &PredicateArgs<'_>) -> bool {
        self.predicates
            .iter()
            .any(|predicate| predicate.invoke(outcome, result_type, args))
    }
}

impl Debug for ShouldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShouldHandle")
            .field("predicates", &self.predicates.len())
            .field("is_default", &self.is_default)
            .finish()
    }
}
