// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

mod attempt;
mod backoff;
mod define_fn_wrapper;

pub(crate) use attempt::{Attempt, MaxAttempts};
pub use backoff::Backoff;
pub(crate) use define_fn_wrapper::define_fn_wrapper;
