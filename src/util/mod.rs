// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Common utility functions.

mod text;

pub use text::*;

use std::env;
use std::ffi::OsStr;

/// Retrieves a boolean flag from the given environment variable.
///
/// Only `true` and `1` enable the flag, a missing variable or any other value disables it.
pub fn bool_from_env<K: AsRef<OsStr>>(key: K) -> bool {
    matches!(env::var(key).as_deref(), Ok("true") | Ok("1"))
}
