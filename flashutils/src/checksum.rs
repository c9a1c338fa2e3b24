// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Digests for verifying downloaded and flashable images. Digests are always
//! computed from the current file contents and never cached.

use std::{
    fmt,
    fs::File,
    io,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use md5::Md5;
use ring::digest::Context;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    channel::PrivilegedChannel,
    command::CommandBuilder,
    stream::{self, HashingReader},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to open for reading: {0:?}")]
    Open(PathBuf, #[source] io::Error),
    #[error("Failed to read: {0:?}")]
    Read(PathBuf, #[source] io::Error),
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Md5,
    #[default]
    Sha1,
    Sha256,
}

impl Algorithm {
    /// Size of the digest in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
        }
    }

    /// Name of the coreutils/toybox program that computes this digest.
    pub fn tool(self) -> &'static str {
        match self {
            Self::Md5 => "md5sum",
            Self::Sha1 => "sha1sum",
            Self::Sha256 => "sha256sum",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Md5 => "MD5",
            Self::Sha1 => "SHA-1",
            Self::Sha256 => "SHA-256",
        })
    }
}

/// Incremental digest computation for any supported [`Algorithm`].
pub enum Hasher {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Context),
}

impl Hasher {
    pub fn new(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Md5 => Self::Md5(Md5::new()),
            Algorithm::Sha1 => Self::Sha1(Sha1::new()),
            Algorithm::Sha256 => Self::Sha256(Context::new(&ring::digest::SHA256)),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Md5(_) => Algorithm::Md5,
            Self::Sha1(_) => Algorithm::Sha1,
            Self::Sha256(_) => Algorithm::Sha256,
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha1(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
        }
    }

    pub fn finish(self) -> Vec<u8> {
        match self {
            Self::Md5(h) => h.finalize().to_vec(),
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Sha256(h) => h.finish().as_ref().to_vec(),
        }
    }
}

/// A digest as lowercase hex, paired with the algorithm that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checksum {
    algorithm: Algorithm,
    hex: String,
}

impl Checksum {
    /// Every byte becomes exactly two hex digits, so leading zero bytes are
    /// preserved and the length is always twice the digest size.
    pub fn from_digest(algorithm: Algorithm, digest: &[u8]) -> Self {
        Self {
            algorithm,
            hex: hex::encode(digest),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    pub fn into_hex(self) -> String {
        self.hex
    }

    /// Case-insensitive comparison against an expected hex digest.
    pub fn matches(&self, expected: &str) -> bool {
        self.hex.eq_ignore_ascii_case(expected.trim())
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// Compute the digest of a file by streaming it in fixed-size chunks.
pub fn compute(algorithm: Algorithm, path: &Path) -> Result<Checksum, Error> {
    let file = File::open(path).map_err(|e| Error::Open(path.to_owned(), e))?;
    let mut reader = HashingReader::new(file, Hasher::new(algorithm));

    stream::drain(&mut reader).map_err(|e| Error::Read(path.to_owned(), e))?;

    let (_, hasher) = reader.finish();

    Ok(Checksum::from_digest(algorithm, &hasher.finish()))
}

/// Compute the MD5 digest of a file as 32 lowercase hex digits. Returns
/// [`None`] if the file cannot be opened or read.
pub fn compute_md5(path: &Path) -> Option<String> {
    match compute(Algorithm::Md5, path) {
        Ok(checksum) => Some(checksum.into_hex()),
        Err(e) => {
            debug!("Failed to compute MD5: {e:?}");
            None
        }
    }
}

/// Check a file against an expected digest. This is `false` if there's no
/// expected digest or no file, or if the digest could not be computed.
pub fn verify(algorithm: Algorithm, expected: Option<&str>, path: Option<&Path>) -> bool {
    let (Some(expected), Some(path)) = (expected.filter(|e| !e.is_empty()), path) else {
        warn!("{algorithm} digest is empty or file is missing");
        return false;
    };

    match compute(algorithm, path) {
        Ok(checksum) => {
            let matches = checksum.matches(expected);
            if !matches {
                debug!("{algorithm} mismatch for {path:?}: expected {expected}, got {checksum}");
            }
            matches
        }
        Err(e) => {
            warn!("Failed to compute {algorithm} digest: {e:?}");
            false
        }
    }
}

/// Check a file against an expected MD5 digest, ignoring case.
pub fn verify_md5(expected: Option<&str>, path: Option<&Path>) -> bool {
    verify(Algorithm::Md5, expected, path)
}

/// Run the digest tool for `algorithm` through `channel`. The raw output is
/// returned, which usually includes the file name after the digest. See
/// [`parse_checksum_output()`].
pub fn compute_checksum<C: PrivilegedChannel + ?Sized>(
    channel: &C,
    command: &CommandBuilder,
    algorithm: Algorithm,
    path: &str,
) -> Option<String> {
    match channel.execute(&command.checksum(algorithm.tool(), path)) {
        Ok(output) => Some(output),
        Err(e) => {
            debug!("Failed to run {}: {e:?}", algorithm.tool());
            None
        }
    }
}

/// Extract the digest from `<tool>` output of the form `<hex>  <path>`. The
/// digest must be valid hex of the expected length.
pub fn parse_checksum_output(algorithm: Algorithm, output: &str) -> Option<Checksum> {
    let token = output.split_whitespace().next()?;
    let digest = hex::decode(token).ok()?;

    if digest.len() != algorithm.digest_len() {
        return None;
    }

    Some(Checksum::from_digest(algorithm, &digest))
}
