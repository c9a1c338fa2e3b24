// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! flashutils is primarily a command line tool, but the file access and
//! checksum layers are usable on their own by anything that needs to touch
//! protected partitions on an Android device through a root shell.
//!
//! The CLI source files use concrete types wherever possible for simplicity,
//! while the "library"-style source files aim to be generic over the
//! [`channel::PrivilegedChannel`] in use.

pub mod channel;
pub mod checksum;
pub mod cli;
pub mod command;
pub mod config;
pub mod file;
pub mod path;
pub mod stream;
pub mod util;
