// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};

use crate::{
    channel::{self, PrivilegedChannel, ShellChannel, SuSession},
    cli::{status, warning},
    command::Quoting,
    config::Config,
    file::{ExecMode, FileAccess},
    path::PathNormalizer,
};

/// Run `f` with a [`FileAccess`] backed by either a one-shot `su -c` channel
/// or a persistent session, depending on the CLI options. A session is closed
/// once `f` returns.
pub fn with_file_access<F>(group: &ChannelGroup, config: &Config, f: F) -> Result<()>
where
    F: FnOnce(&FileAccess<&dyn PrivilegedChannel>) -> Result<()>,
{
    let mut config = config.clone();
    if group.raw {
        config.quoting = Quoting::Raw;
    }

    if group.session {
        let program = if channel::is_root() {
            "sh"
        } else {
            config.su_program.as_str()
        };
        let session = SuSession::spawn(program)
            .with_context(|| format!("Failed to start shell session: {program:?}"))?;

        let channel: &dyn PrivilegedChannel = &session;
        let result = f(&FileAccess::new(channel, &config));

        session.close().context("Failed to close shell session")?;

        result
    } else {
        let channel = ShellChannel::detect(&config.su_program);
        let channel: &dyn PrivilegedChannel = &channel;

        f(&FileAccess::new(channel, &config))
    }
}

fn mode<'a, C: PrivilegedChannel>(access: &'a FileAccess<C>, plain: bool) -> ExecMode<'a> {
    if plain {
        ExecMode::Plain
    } else {
        access.privileged()
    }
}

pub fn file_main(cli: &FileCli, config: &Config) -> Result<()> {
    let normalizer = PathNormalizer::new(&config.external_storage_root);
    let normalize = |p: &str| {
        if cli.no_normalize {
            p.to_owned()
        } else {
            normalizer.normalize(p)
        }
    };

    with_file_access(&cli.channel, config, |access| {
        match &cli.command {
            FileCommand::Exists(c) => {
                let path = normalize(&c.path);
                println!("{}", access.exists(&path, mode(access, c.plain)));
            }
            FileCommand::Read(c) => {
                let path = normalize(&c.path);
                let data = access
                    .read_text(&path, mode(access, c.plain))
                    .map_err(|e| anyhow!("{e}: {path:?}"))?;
                println!("{data}");
            }
            FileCommand::Write(c) => {
                let path = normalize(&c.path);
                let output = access
                    .write_text(&c.text, &path, c.append)
                    .map_err(|e| anyhow!("Failed to write: {path:?}: {e}"))?;
                if !output.is_empty() {
                    warning!("{output}");
                }
            }
            FileCommand::Delete(c) => {
                let path = normalize(&c.path);
                match access.delete(&path) {
                    Ok(Some(_)) => status!("Deleted {path:?}"),
                    Ok(None) => status!("Nothing to delete: {path:?}"),
                    Err(e) => return Err(anyhow!("Failed to delete: {path:?}: {e}")),
                }
            }
            FileCommand::Mount(c) => {
                let output = access
                    .mount(&c.flags, &c.source, &c.dest)
                    .map_err(|e| anyhow!("Failed to mount {:?}: {e}", c.dest))?;
                if !output.is_empty() {
                    println!("{output}");
                }
            }
            FileCommand::Remount(c) => {
                let output = access
                    .remount(&c.target, !c.read_only)
                    .map_err(|e| anyhow!("Failed to remount {:?}: {e}", c.target))?;
                if !output.is_empty() {
                    println!("{output}");
                }
            }
            FileCommand::Download(c) => {
                let path = normalize(&c.output);
                status!("Downloading {} to {path:?}", c.url);
                access
                    .download(&path, &c.url)
                    .map_err(|e| anyhow!("Failed to download {}: {e}", c.url))?;

                if !access.exists(&path, access.privileged()) {
                    return Err(anyhow!("Download did not produce a file: {path:?}"));
                }
            }
        }

        Ok(())
    })
}

#[derive(Debug, Args)]
pub struct ChannelGroup {
    /// Run all commands in a single persistent root shell.
    #[arg(long, global = true)]
    pub session: bool,

    /// Do not escape text and paths embedded in shell commands.
    ///
    /// Text containing a single quote will produce a broken command.
    #[arg(long, global = true)]
    pub raw: bool,
}

/// Check whether a path exists.
#[derive(Debug, Parser)]
struct ExistsCli {
    /// Path to check.
    #[arg(value_name = "PATH")]
    path: String,

    /// Access the filesystem directly instead of through a root shell.
    #[arg(long)]
    plain: bool,
}

/// Print the contents of a text file.
#[derive(Debug, Parser)]
struct ReadCli {
    /// Path to read.
    #[arg(value_name = "PATH")]
    path: String,

    /// Access the filesystem directly instead of through a root shell.
    #[arg(long)]
    plain: bool,
}

/// Write a line of text to a file as root.
#[derive(Debug, Parser)]
struct WriteCli {
    /// Path to write.
    #[arg(value_name = "PATH")]
    path: String,

    /// Text to write. A newline is always appended.
    #[arg(value_name = "TEXT")]
    text: String,

    /// Append instead of replacing the existing contents.
    #[arg(short, long)]
    append: bool,
}

/// Recursively delete a path as root.
#[derive(Debug, Parser)]
struct DeleteCli {
    /// Path to delete.
    #[arg(value_name = "PATH")]
    path: String,
}

/// Mount a filesystem as root.
#[derive(Debug, Parser)]
struct MountCli {
    /// Options passed to mount as-is (eg. "-t ext4 -o ro").
    #[arg(long, value_name = "FLAGS", default_value = "", allow_hyphen_values = true)]
    flags: String,

    /// Block device or source directory.
    #[arg(value_name = "SOURCE")]
    source: String,

    /// Mount point.
    #[arg(value_name = "DEST")]
    dest: String,
}

/// Remount a mount point as read-write or read-only.
#[derive(Debug, Parser)]
struct RemountCli {
    /// Mount point (eg. /system).
    #[arg(value_name = "TARGET")]
    target: String,

    /// Remount as read-only instead of read-write.
    #[arg(long)]
    read_only: bool,
}

/// Download a file on the device with curl or wget.
#[derive(Debug, Parser)]
struct DownloadCli {
    /// URL to download.
    #[arg(short, long, value_name = "URL")]
    url: String,

    /// Output path on the device.
    #[arg(value_name = "PATH")]
    output: String,
}

#[derive(Debug, Subcommand)]
enum FileCommand {
    Exists(ExistsCli),
    Read(ReadCli),
    Write(WriteCli),
    Delete(DeleteCli),
    Mount(MountCli),
    Remount(RemountCli),
    Download(DownloadCli),
}

/// File operations, either as root or with direct filesystem access.
#[derive(Debug, Parser)]
pub struct FileCli {
    #[command(subcommand)]
    command: FileCommand,

    #[command(flatten)]
    channel: ChannelGroup,

    /// Use paths as-is instead of converting document provider paths.
    #[arg(long, global = true)]
    no_normalize: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_flag_overrides_config() {
        let mut quoting = None;

        with_file_access(
            &ChannelGroup {
                session: false,
                raw: true,
            },
            &Config::default(),
            |access| {
                quoting = Some(access.command().quoting());
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(quoting, Some(Quoting::Raw));
    }

    #[test]
    fn session_runs_commands() {
        let config = Config {
            su_program: "sh".to_owned(),
            ..Default::default()
        };
        let mut output = None;

        with_file_access(
            &ChannelGroup {
                session: true,
                raw: false,
            },
            &config,
            |access| {
                assert_eq!(access.command().quoting(), Quoting::Escaped);
                output = Some(access.channel().execute("echo hello")?);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(output.as_deref(), Some("hello"));
    }
}
