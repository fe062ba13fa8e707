// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::{HedgingDelayArgs, OnHedgingArgs};
use crate::options::define_fn_wrapper;

define_fn_wrapper!(DelayGenerator(Fn(&HedgingDelayArgs<'_>) -> Duration));
define_fn_wrapper!(OnHedging(Fn(&OnHedgingArgs<'_>)));
