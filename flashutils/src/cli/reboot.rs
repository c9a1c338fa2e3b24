// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use anyhow::{Result, anyhow};
use clap::Parser;

use crate::{
    cli::{file::ChannelGroup, status},
    command::SAFE_REBOOT,
    config::Config,
};

pub fn reboot_main(cli: &RebootCli, config: &Config) -> Result<()> {
    if cli.dry_run {
        println!("{SAFE_REBOOT}");
        return Ok(());
    }

    super::file::with_file_access(&cli.channel, config, |access| {
        status!("Syncing filesystems and rebooting");

        access
            .safe_reboot()
            .map_err(|e| anyhow!("Failed to reboot: {e}"))?;

        Ok(())
    })
}

/// Flush filesystem buffers and reboot the device.
///
/// The shutdown broadcast, syncs, and cache drop must all succeed before the
/// reboot is issued.
#[derive(Debug, Parser)]
pub struct RebootCli {
    /// Print the command instead of running it.
    #[arg(long)]
    dry_run: bool,

    #[command(flatten)]
    channel: ChannelGroup,
}
