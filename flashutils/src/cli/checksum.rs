// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};

use crate::{
    checksum::{self, Algorithm},
    cli::{file::ChannelGroup, status},
    config::Config,
};

pub fn checksum_main(cli: &ChecksumCli, config: &Config) -> Result<()> {
    match &cli.command {
        ChecksumCommand::Compute(c) => {
            for path in &c.input {
                let checksum = checksum::compute(c.algorithm, path)
                    .with_context(|| format!("Failed to compute {} digest", c.algorithm))?;

                println!("{checksum}  {}", path.display());
            }
        }
        ChecksumCommand::Verify(c) => {
            if !checksum::verify(
                c.algorithm,
                Some(c.expected.as_str()),
                Some(c.input.as_path()),
            ) {
                bail!("{} digest does not match: {:?}", c.algorithm, c.input);
            }

            status!("{} digest matches: {:?}", c.algorithm, c.input);
        }
        ChecksumCommand::Device(c) => {
            let mut config = config.clone();
            if let Some(algorithm) = c.algorithm {
                config.checksum_algorithm = algorithm;
            }
            let algorithm = config.checksum_algorithm;

            super::file::with_file_access(&c.channel, &config, |access| {
                let output = access
                    .checksum(&c.path)
                    .ok_or_else(|| anyhow!("Failed to run {}", algorithm.tool()))?;
                let checksum = checksum::parse_checksum_output(algorithm, &output)
                    .ok_or_else(|| anyhow!("Unexpected {} output: {output:?}", algorithm.tool()))?;

                println!("{checksum}  {}", c.path);

                Ok(())
            })?;
        }
    }

    Ok(())
}

/// Compute digests of local files.
#[derive(Debug, Parser)]
struct ComputeCli {
    /// Digest algorithm.
    #[arg(short, long, value_name = "ALGORITHM", value_enum, default_value_t = Algorithm::Md5)]
    algorithm: Algorithm,

    /// Files to hash.
    #[arg(value_name = "FILE", value_parser, required = true)]
    input: Vec<PathBuf>,
}

/// Verify a local file against an expected digest.
///
/// The comparison is case-insensitive.
#[derive(Debug, Parser)]
struct VerifyCli {
    /// Digest algorithm.
    #[arg(short, long, value_name = "ALGORITHM", value_enum, default_value_t = Algorithm::Md5)]
    algorithm: Algorithm,

    /// Expected digest as hex.
    #[arg(short, long, value_name = "HEX")]
    expected: String,

    /// File to verify.
    #[arg(value_name = "FILE", value_parser)]
    input: PathBuf,
}

/// Compute a digest on the device with a root shell.
#[derive(Debug, Parser)]
struct DeviceCli {
    /// Digest algorithm.
    ///
    /// This overrides the value from the config file.
    #[arg(short, long, value_name = "ALGORITHM", value_enum)]
    algorithm: Option<Algorithm>,

    /// Path on the device.
    #[arg(value_name = "PATH")]
    path: String,

    #[command(flatten)]
    channel: ChannelGroup,
}

#[derive(Debug, Subcommand)]
enum ChecksumCommand {
    Compute(ComputeCli),
    Verify(VerifyCli),
    Device(DeviceCli),
}

/// Compute and verify file digests.
#[derive(Debug, Parser)]
pub struct ChecksumCli {
    #[command(subcommand)]
    command: ChecksumCommand,
}
