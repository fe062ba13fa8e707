// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::{Any, TypeId};
use std::fmt::Debug;
use std::marker::PhantomData;

use futures_util::future::BoxFuture;

use crate::{AnyResult, ExecutionContext, Outcome};

/// The future returned by strategies and callbacks.
pub type ExecutionFuture<'a> = BoxFuture<'a, Outcome<AnyResult>>;

/// Identifies the result type produced by a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultType {
    id: TypeId,
    name: &'static str,
}

impl ResultType {
    /// The result type `T`.
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns `true` when this is the result type `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// The type identifier.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name, for diagnostics only.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// The rest of the execution, as seen by a strategy.
///
/// Invoking the callback runs the next strategy of the pipeline, or the user callback when the
/// strategy is the last one. A strategy may invoke it any number of times, including zero.
pub trait Callback: Send + Sync {
    /// Runs the rest of the execution with `context`.
    fn invoke<'a>(&'a self, context: &'a mut ExecutionContext) -> ExecutionFuture<'a>;

    /// The result type produced by the user callback at the end of the chain.
    fn result_type(&self) -> ResultType;
}

/// A resilience strategy.
///
/// Strategies wrap the execution of a [`Callback`] and decide whether, when and how often it
/// runs. A single strategy instance serves callbacks of every result type; typed decisions are
/// made by type-erased predicates that compare [`Callback::result_type`] with the type they were
/// registered for.
///
/// # Examples
///
/// ```rust
/// use airbag::{Callback, ExecutionContext, ExecutionFuture, Strategy};
///
/// #[derive(Debug)]
/// struct Tagging;
///
/// impl Strategy for Tagging {
///     fn name(&self) -> &str {
///         "Tagging"
///     }
///
///     fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
///         context.set_operation_key("tagged");
///         next.invoke(context)
///     }
/// }
/// ```
pub trait Strategy: Any + Debug + Send + Sync {
    /// The name of the strategy, used in telemetry and introspection.
    fn name(&self) -> &str;

    /// Executes `next` under the control of this strategy.
    fn execute<'a>(&'a self, next: &'a dyn Callback, context: &'a mut ExecutionContext) -> ExecutionFuture<'a>;
}

/// Binds a typed user callback and its state to the type-erased [`Callback`] seam.
pub(crate) struct TypedCallback<'s, F, S: ?Sized, T> {
    callback: &'s F,
    state: &'s S,
    _result: PhantomData<fn() -> T>,
}

impl<'s, F, S: ?Sized, T> TypedCallback<'s, F, S, T> {
    pub(crate) fn new(callback: &'s F, state: &'s S) -> Self {
        Self {
            callback,
            state,
            _result: PhantomData,
        }
    }
}

impl<'s, F, S, T, Fut> Callback for TypedCallback<'s, F, S, T>
where
    F: Fn(&mut ExecutionContext, &S) -> Fut + Sync,
    S: ?Sized + Sync,
    Fut: Future<Output = Outcome<T>> + Send + 's,
    T: Send + 'static,
{
    fn invoke<'a>(&'a self, context: &'a mut ExecutionContext) -> ExecutionFuture<'a> {
        let future = (self.callback)(context, self.state);
        Box::pin(async move { future.await.map(AnyResult::new) })
    }

    fn result_type(&self) -> ResultType {
        ResultType::of::<T>()
    }
}
