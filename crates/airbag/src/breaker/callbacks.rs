// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use super::{BreakDurationGeneratorArgs, OnCircuitClosedArgs, OnCircuitHalfOpenedArgs, OnCircuitOpenedArgs};
use crate::options::define_fn_wrapper;

define_fn_wrapper!(BreakDurationGenerator(Fn(&BreakDurationGeneratorArgs<'_>) -> Duration));
define_fn_wrapper!(OnOpened(Fn(&OnCircuitOpenedArgs<'_>)));
define_fn_wrapper!(OnClosed(Fn(&OnCircuitClosedArgs<'_>)));
define_fn_wrapper!(OnHalfOpened(Fn(&OnCircuitHalfOpenedArgs<'_>)));
