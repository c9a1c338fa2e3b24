// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

/// A string whose [`fmt::Debug`] output is the string itself. This is useful
/// for storing a [`std::process::Command`] or a shell command line in an error
/// type without requiring it to be [`Clone`].
#[derive(Clone, PartialEq, Eq)]
pub struct DebugString(String);

impl DebugString {
    pub fn new<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Self(format!("{value:?}"))
    }
}

impl fmt::Debug for DebugString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trim trailing line endings, but not other whitespace.
pub fn trim_newlines(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}
