// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Hedging strategy.
//!
//! Launches the callback, and when it has not produced an acceptable outcome once the hedging
//! delay elapses, launches another attempt alongside it. The first attempt whose outcome is not
//! handled wins; every other attempt is cancelled and its result discarded.
//!
//! Each attempt runs with its own fork of the caller's context, so cancelling a losing attempt
//! never affects the caller or the other attempts. The properties of the winning attempt are
//! copied back into the caller's context.
//!
//! # Delays
//!
//! - A positive delay launches a new attempt each time it elapses, and immediately after an
//!   attempt completes with a handled outcome.
//! - [`Duration::ZERO`][std::time::Duration::ZERO] launches every attempt at once, in attempt order.
//! - [`Duration::MAX`][std::time::Duration::MAX] launches an attempt only after the previous one
//!   completed with a handled outcome, which behaves like a retry without delays.
//!
//! When every attempt is handled, the outcome of the last completed attempt is returned.
//!
//! # Defaults
//!
//! | Parameter | Default Value | Configured By |
//! |-----------|---------------|---------------|
//! | Max hedged attempts | `2` (primary included) | [`max_hedged_attempts`][HedgingOptions::max_hedged_attempts] |
//! | Delay | `2` seconds | [`delay`][HedgingOptions::delay], [`delay_generator`][HedgingOptions::delay_generator] |
//! | Handled outcomes | failures other than cancellation | [`should_handle`][HedgingOptions::should_handle] |

mod action;
mod args;
mod callbacks;
mod constants;
mod options;
mod strategy;

pub use action::HedgedAction;
pub use args::{HedgingActionArgs, HedgingDelayArgs, OnHedgingArgs};
pub(crate) use callbacks::{DelayGenerator, OnHedging};
pub use options::HedgingOptions;
pub use strategy::HedgingStrategy;
