// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! File operations that either go directly through the filesystem or through a
//! [`PrivilegedChannel`].
//!
//! Writes, deletions, and mounts always go through the channel because they
//! target protected partitions. Reads and existence checks can use either mode.
//! Failures are deliberately coarse: a missing file, a permission error, and a
//! channel that could not run the command are all reported the same way.

use std::{fmt, fs, path::Path};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    channel::PrivilegedChannel,
    checksum::{self, Algorithm},
    command::{CommandBuilder, Fetcher},
    config::Config,
    util,
};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("File not found or unavailable")]
    NotFoundOrUnavailable,
}

/// How a single operation is executed.
#[derive(Clone, Copy)]
pub enum ExecMode<'a> {
    /// Direct filesystem access with the current process' privileges.
    Plain,
    /// Access through a privileged channel, eg. a reusable root session.
    Privileged(&'a dyn PrivilegedChannel),
}

impl fmt::Debug for ExecMode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "Plain"),
            Self::Privileged(_) => f.debug_tuple("Privileged").finish_non_exhaustive(),
        }
    }
}

fn execute(channel: &dyn PrivilegedChannel, command: &str) -> Result<String, Error> {
    channel.execute(command).map_err(|e| {
        debug!("Privileged command failed: {command:?}: {e:?}");
        Error::NotFoundOrUnavailable
    })
}

/// File operations backed by a default privileged channel. Construct one and
/// pass it to whatever needs it.
pub struct FileAccess<C> {
    channel: C,
    command: CommandBuilder,
    checksum_algorithm: Algorithm,
    curl_path: String,
}

impl<C: PrivilegedChannel> FileAccess<C> {
    pub fn new(channel: C, config: &Config) -> Self {
        Self {
            channel,
            command: CommandBuilder::new(config.quoting),
            checksum_algorithm: config.checksum_algorithm,
            curl_path: config.curl_path.clone(),
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn command(&self) -> &CommandBuilder {
        &self.command
    }

    /// Execution mode that uses this instance's default channel.
    pub fn privileged(&self) -> ExecMode<'_> {
        ExecMode::Privileged(&self.channel)
    }

    fn run(&self, command: &str) -> Result<String, Error> {
        trace!("Running: {command:?}");
        execute(&self.channel, command)
    }

    /// Check if a path exists. Paths that cannot be accessed are reported as
    /// not existing.
    pub fn exists(&self, path: &str, mode: ExecMode<'_>) -> bool {
        match mode {
            ExecMode::Plain => Path::new(path).exists(),
            ExecMode::Privileged(channel) => execute(channel, &self.command.exists(path))
                .is_ok_and(|output| output.trim() == "true"),
        }
    }

    /// Read a text file. Trailing newlines are removed.
    pub fn read_text(&self, path: &str, mode: ExecMode<'_>) -> Result<String, Error> {
        match mode {
            ExecMode::Plain => match fs::read_to_string(path) {
                Ok(data) => Ok(util::trim_newlines(&data).to_owned()),
                Err(e) => {
                    debug!("Failed to read {path:?}: {e}");
                    Err(Error::NotFoundOrUnavailable)
                }
            },
            ExecMode::Privileged(channel) => execute(channel, &self.command.read(path)),
        }
    }

    /// Write `text` followed by a newline to `path`, replacing or appending to
    /// the existing contents.
    ///
    /// With [`crate::command::Quoting::Raw`], the text is not escaped and a
    /// single quote in the text produces a broken command.
    pub fn write_text(&self, text: &str, path: &str, append: bool) -> Result<String, Error> {
        self.run(&self.command.write(text, path, append))
    }

    pub fn create(&self, text: &str, path: &str) -> Result<String, Error> {
        self.write_text(text, path, false)
    }

    pub fn append(&self, text: &str, path: &str) -> Result<String, Error> {
        self.write_text(text, path, true)
    }

    /// Recursively delete a path. If it does not exist, nothing is done and
    /// [`None`] is returned.
    pub fn delete(&self, path: &str) -> Result<Option<String>, Error> {
        if !self.exists(path, self.privileged()) {
            debug!("Not deleting nonexistent path: {path:?}");
            return Ok(None);
        }

        self.run(&self.command.remove(path)).map(Some)
    }

    /// Mount with arbitrary flags. Nothing is validated.
    pub fn mount(&self, flags: &str, source: &str, dest: &str) -> Result<String, Error> {
        self.run(&self.command.mount(flags, source, dest))
    }

    pub fn remount(&self, target: &str, read_write: bool) -> Result<String, Error> {
        self.run(&self.command.remount(target, read_write))
    }

    /// Raw output of the device-side digest tool for `path`.
    pub fn checksum(&self, path: &str) -> Option<String> {
        checksum::compute_checksum(&self.channel, &self.command, self.checksum_algorithm, path)
    }

    /// Download `url` to `path` on the device. curl is used if it exists at
    /// the configured location. Otherwise, wget is used.
    pub fn download(&self, path: &str, url: &str) -> Result<String, Error> {
        let fetcher = if self.exists(&self.curl_path, self.privileged()) {
            Fetcher::Curl
        } else {
            Fetcher::Wget
        };

        debug!("Downloading {url:?} to {path:?} with {fetcher:?}");

        self.run(&self.command.download(fetcher, path, url))
    }

    /// Sync all filesystems and reboot. If any step fails, the device does not
    /// reboot.
    pub fn safe_reboot(&self) -> Result<String, Error> {
        self.run(self.command.safe_reboot())
    }
}
