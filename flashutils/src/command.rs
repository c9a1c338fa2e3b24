// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Shell command lines sent through a [`crate::channel::PrivilegedChannel`].

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Flush all data to disk before rebooting. Each step must succeed for the
/// next one to run, so the device never reboots with an unsynced filesystem.
pub const SAFE_REBOOT: &str = "am broadcast android.intent.action.ACTION_SHUTDOWN \
    && sync \
    && echo 3 > /proc/sys/vm/drop_caches \
    && sync \
    && sleep 1 \
    && reboot";

/// How user-provided strings are embedded into command lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quoting {
    /// Paths and text are single-quoted and embedded single quotes are
    /// escaped.
    #[default]
    Escaped,
    /// Text is wrapped in single quotes without escaping and paths are
    /// inserted verbatim. Text containing a single quote produces a malformed
    /// command. Callers are responsible for sanitizing their input.
    Raw,
}

/// Which fetcher to use for downloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fetcher {
    Curl,
    Wget,
}

/// Quote a string for POSIX shells.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandBuilder {
    quoting: Quoting,
}

impl CommandBuilder {
    pub fn new(quoting: Quoting) -> Self {
        Self { quoting }
    }

    pub fn quoting(&self) -> Quoting {
        self.quoting
    }

    fn arg<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self.quoting {
            Quoting::Escaped => Cow::Owned(shell_quote(s)),
            Quoting::Raw => Cow::Borrowed(s),
        }
    }

    fn text<'a>(&self, s: &'a str) -> Cow<'a, str> {
        match self.quoting {
            Quoting::Escaped => Cow::Owned(shell_quote(s)),
            Quoting::Raw => Cow::Owned(format!("'{s}'")),
        }
    }

    /// `echo '<text>' > <path>` or `>>` if appending. `echo` always adds a
    /// trailing newline.
    pub fn write(&self, text: &str, path: &str, append: bool) -> String {
        let redirect = if append { ">>" } else { ">" };
        format!("echo {} {redirect} {}", self.text(text), self.arg(path))
    }

    pub fn remove(&self, path: &str) -> String {
        format!("rm -r {}", self.arg(path))
    }

    /// Flags are always inserted verbatim since they are usually multiple
    /// arguments, eg. `-t ext4 -o ro`.
    pub fn mount(&self, flags: &str, source: &str, dest: &str) -> String {
        format!("mount {flags} {} {}", self.arg(source), self.arg(dest))
    }

    pub fn remount(&self, target: &str, read_write: bool) -> String {
        let mode = if read_write { "rw" } else { "ro" };
        format!("mount -o remount,{mode} {}", self.arg(target))
    }

    pub fn exists(&self, path: &str) -> String {
        format!("[ -e {} ] && echo true", self.arg(path))
    }

    pub fn read(&self, path: &str) -> String {
        format!("cat {}", self.arg(path))
    }

    /// `<tool> <path>`, eg. `sha1sum /sdcard/rom.zip`.
    pub fn checksum(&self, tool: &str, path: &str) -> String {
        format!("{tool} {}", self.arg(path))
    }

    pub fn download(&self, fetcher: Fetcher, path: &str, url: &str) -> String {
        let (path, url) = (self.arg(path), self.arg(url));

        match fetcher {
            Fetcher::Curl => format!("curl -L -o {path} {url}"),
            Fetcher::Wget => format!("wget -O {path} {url}"),
        }
    }

    pub fn safe_reboot(&self) -> &'static str {
        SAFE_REBOOT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RAW: CommandBuilder = CommandBuilder {
        quoting: Quoting::Raw,
    };
    const ESCAPED: CommandBuilder = CommandBuilder {
        quoting: Quoting::Escaped,
    };

    #[test]
    fn safe_reboot_is_fixed() {
        assert_eq!(
            ESCAPED.safe_reboot(),
            "am broadcast android.intent.action.ACTION_SHUTDOWN && sync && \
                echo 3 > /proc/sys/vm/drop_caches && sync && sleep 1 && reboot",
        );
        assert_eq!(RAW.safe_reboot(), ESCAPED.safe_reboot());
        assert_eq!(SAFE_REBOOT.matches(" && ").count(), 5);
    }

    #[test]
    fn raw_commands() {
        assert_eq!(RAW.write("1", "/sys/foo", false), "echo '1' > /sys/foo");
        assert_eq!(RAW.write("1", "/sys/foo", true), "echo '1' >> /sys/foo");
        assert_eq!(RAW.remove("/data/foo"), "rm -r /data/foo");
        assert_eq!(
            RAW.mount("-o rw,remount", "/dev/block/sda1", "/system"),
            "mount -o rw,remount /dev/block/sda1 /system",
        );
        assert_eq!(RAW.remount("/system", true), "mount -o remount,rw /system");
        assert_eq!(RAW.remount("/vendor", false), "mount -o remount,ro /vendor");
        assert_eq!(RAW.exists("/a"), "[ -e /a ] && echo true");
        assert_eq!(RAW.read("/a"), "cat /a");
        assert_eq!(RAW.checksum("sha1sum", "/a.zip"), "sha1sum /a.zip");
        assert_eq!(
            RAW.download(Fetcher::Curl, "/a.zip", "https://x/a.zip"),
            "curl -L -o /a.zip https://x/a.zip",
        );
        assert_eq!(
            RAW.download(Fetcher::Wget, "/a.zip", "https://x/a.zip"),
            "wget -O /a.zip https://x/a.zip",
        );
    }

    #[test]
    fn raw_does_not_escape() {
        // Known limitation: the quote terminates the string early.
        assert_eq!(RAW.write("it's", "/a", false), "echo 'it's' > /a");
    }

    #[test]
    fn escaped_commands() {
        assert_eq!(
            ESCAPED.write("it's", "/my dir/a", true),
            r"echo 'it'\''s' >> '/my dir/a'",
        );
        assert_eq!(ESCAPED.remove("/a b"), "rm -r '/a b'");
        assert_eq!(ESCAPED.exists("/a"), "[ -e '/a' ] && echo true");
        assert_eq!(
            ESCAPED.mount("-t ext4", "/dev/x", "/mnt/x"),
            "mount -t ext4 '/dev/x' '/mnt/x'",
        );
    }

    #[test]
    fn quote() {
        assert_eq!(shell_quote(""), "''");
        assert_eq!(shell_quote("abc"), "'abc'");
        assert_eq!(shell_quote("'"), r"''\'''");
    }
}
