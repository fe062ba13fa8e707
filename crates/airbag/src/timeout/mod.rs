// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Timeout strategy.
//!
//! Gives the callback a child cancellation token and cancels it when the callback does not
//! complete in time. A timed out execution ends with [`TimeoutRejected`][crate::TimeoutRejected],
//! which is distinct from the [`ExecutionCanceled`][crate::ExecutionCanceled] produced when the
//! caller cancels.
//!
//! # Defaults
//!
//! | Parameter | Default Value | Configured By |
//! |-----------|---------------|---------------|
//! | Timeout | `30` seconds | [`timeout`][TimeoutOptions::timeout], [`timeout_generator`][TimeoutOptions::timeout_generator] |
//!
//! A generated timeout of [`Duration::ZERO`][std::time::Duration::ZERO] or
//! [`Duration::MAX`][std::time::Duration::MAX] runs the callback without a timeout.

mod args;
mod callbacks;
mod constants;
mod options;
mod strategy;

pub use args::{OnTimeoutArgs, TimeoutGeneratorArgs};
pub(crate) use callbacks::{OnTimeout, TimeoutGenerator};
pub use options::TimeoutOptions;
pub use strategy::TimeoutStrategy;
