// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{checksum::Algorithm, command::Quoting, path::DEFAULT_EXTERNAL_STORAGE_ROOT};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config: {0:?}")]
    Read(PathBuf, #[source] io::Error),
    #[error("Failed to parse config: {0:?}")]
    Parse(PathBuf, #[source] toml_edit::de::Error),
}

/// Device-specific settings. Every field is optional in the TOML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Mount point of the primary shared storage.
    pub external_storage_root: String,
    /// Name of the working directory under the external storage root.
    pub data_dir_name: String,
    /// Program used for privileged commands when not already root.
    pub su_program: String,
    /// If this file exists on the device, downloads use curl instead of wget.
    pub curl_path: String,
    pub quoting: Quoting,
    /// Digest used by the device-side checksum tool.
    pub checksum_algorithm: Algorithm,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            external_storage_root: DEFAULT_EXTERNAL_STORAGE_ROOT.to_owned(),
            data_dir_name: "flashutils".to_owned(),
            su_program: "su".to_owned(),
            curl_path: "/system/bin/curl".to_owned(),
            quoting: Quoting::default(),
            checksum_algorithm: Algorithm::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path).map_err(|e| Error::Read(path.to_owned(), e))?;

        toml_edit::de::from_str(&contents).map_err(|e| Error::Parse(path.to_owned(), e))
    }

    /// Load the config if a path is given. Otherwise, use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
