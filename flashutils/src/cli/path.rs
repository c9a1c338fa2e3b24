// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use crate::{
    config::Config,
    path::{self, PathNormalizer},
};

pub fn path_main(cli: &PathCli, config: &Config) -> Result<()> {
    match &cli.command {
        PathCommand::Normalize(c) => {
            let root = c
                .storage_root
                .as_deref()
                .unwrap_or(&config.external_storage_root);
            let normalizer = PathNormalizer::new(root);

            for p in &c.paths {
                println!("{}", normalizer.normalize(p));
            }
        }
        PathCommand::Extension(c) => match path::file_extension(&c.url) {
            Some(ext) => println!("{ext}"),
            None => bail!("No file extension: {:?}", c.url),
        },
        PathCommand::DataDir => {
            let normalizer = PathNormalizer::new(&config.external_storage_root);
            println!("{}", normalizer.data_dir(&config.data_dir_name).display());
        }
    }

    Ok(())
}

/// Convert document provider paths to filesystem paths.
///
/// The rules are purely string-based and the filesystem is never accessed.
#[derive(Debug, Parser)]
struct NormalizeCli {
    /// Paths to normalize.
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<String>,

    /// Mount point of the primary external storage.
    ///
    /// This overrides the value from the config file.
    #[arg(long, value_name = "DIR")]
    storage_root: Option<String>,
}

/// Print the file extension of a URL or path.
#[derive(Debug, Parser)]
struct ExtensionCli {
    /// URL or path.
    #[arg(value_name = "URL")]
    url: String,
}

#[derive(Debug, Subcommand)]
enum PathCommand {
    Normalize(NormalizeCli),
    Extension(ExtensionCli),
    /// Print the working directory on the device.
    DataDir,
}

/// Path helpers.
#[derive(Debug, Parser)]
pub struct PathCli {
    #[command(subcommand)]
    command: PathCommand,
}
