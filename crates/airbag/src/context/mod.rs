// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-call execution state.

mod execution_context;
mod pool;
mod properties;

pub use execution_context::ExecutionContext;
pub use pool::ContextPool;
pub(crate) use pool::DEFAULT_POOL_CAPACITY;
pub use properties::{ResilienceProperties, ResiliencePropertyKey};
