// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Conversion of the paths handed out by Android's document providers into
//! real filesystem paths that a root shell can operate on.

use std::{path::PathBuf, sync::LazyLock};

use regex::Regex;

/// Mount point of the primary shared storage for user 0.
pub const DEFAULT_EXTERNAL_STORAGE_ROOT: &str = "/storage/emulated/0";

const DOCUMENT_RAW: &str = "/document/raw:";
const DOCUMENT_PRIMARY: &str = "/document/primary:";
const DOCUMENT: &str = "/document/";
const STORAGE_ROOT_EMULATED: &str = "/storage_root/storage/emulated/0";
const STORAGE_ROOT: &str = "/storage_root";
const EXTERNAL: &str = "/external";
const ROOT: &str = "/root/";
const ENCODED_FILE_URI: &str = "file%3A%2F%2F%2F";

static EXTENSION_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.()%\-]+$").unwrap());

/// Rewrites provider paths relative to a specific external storage root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathNormalizer {
    external_storage_root: String,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_EXTERNAL_STORAGE_ROOT)
    }
}

impl PathNormalizer {
    pub fn new(external_storage_root: impl Into<String>) -> Self {
        let mut root = external_storage_root.into();
        while root.len() > 1 && root.ends_with('/') {
            root.pop();
        }

        Self {
            external_storage_root: root,
        }
    }

    pub fn external_storage_root(&self) -> &str {
        &self.external_storage_root
    }

    /// Normalize a path. The rules are applied in a fixed order:
    ///
    /// 1. `/document/raw:<path>` -> `<path>`
    /// 2. `/document/primary:<rel>` -> `<root>/<rel>`
    /// 3. `/document/<volume>:<rel>` -> `/storage/<volume>/<rel>`
    /// 4. `/storage_root/storage/emulated/0` -> `/storage/emulated/0`
    /// 5. `/storage_root<rest>` -> `/storage/emulated/0<rest>`
    /// 6. `/external<rest>` -> `/storage/emulated/0<rest>`
    /// 7. `/root/<rest>` -> `/<rest>`, repeated while `/root/` is still a prefix
    /// 8. Percent-encoded `file:///` markers are removed and `%2F` is decoded.
    ///
    /// Within each of the groups (1-3) and (4-5), only the first matching rule
    /// is applied. Paths that match no rule are returned unchanged. This never
    /// touches the filesystem.
    pub fn normalize(&self, raw: &str) -> String {
        let mut path = if let Some(rest) = raw.strip_prefix(DOCUMENT_RAW) {
            rest.to_owned()
        } else if let Some(rest) = raw.strip_prefix(DOCUMENT_PRIMARY) {
            let root = self.external_storage_root.trim_end_matches('/');
            format!("{root}/{rest}")
        } else if let Some(rest) = raw.strip_prefix(DOCUMENT) {
            format!("/storage/{}", rest.replace(':', "/"))
        } else {
            raw.to_owned()
        };

        if let Some(rest) = path.strip_prefix(STORAGE_ROOT_EMULATED) {
            path = format!("/storage/emulated/0{rest}");
        } else if let Some(rest) = path.strip_prefix(STORAGE_ROOT) {
            path = format!("/storage/emulated/0{rest}");
        }

        if let Some(rest) = path.strip_prefix(EXTERNAL) {
            path = format!("/storage/emulated/0{rest}");
        }

        while path.starts_with(ROOT) {
            path.replace_range(..ROOT.len() - 1, "");
        }

        if path.contains(ENCODED_FILE_URI) {
            path = path.replace(ENCODED_FILE_URI, "").replace("%2F", "/");
        }

        path
    }

    /// Working directory for files downloaded or generated by flashutils.
    pub fn data_dir(&self, name: &str) -> PathBuf {
        PathBuf::from(&self.external_storage_root).join(name)
    }
}

/// Normalize a path relative to [`DEFAULT_EXTERNAL_STORAGE_ROOT`].
pub fn normalize(raw: &str) -> String {
    PathNormalizer::default().normalize(raw)
}

/// Get the file extension from the last path segment of a URL or path. The
/// fragment and query string are ignored. Like Android's `MimeTypeMap`, no
/// extension is reported if the file name contains characters outside of
/// `[A-Za-z0-9_.()%-]`.
pub fn file_extension(url: &str) -> Option<&str> {
    let url = url.split_once('#').map_or(url, |(u, _)| u);
    let url = url.split_once('?').map_or(url, |(u, _)| u);
    let file_name = url.rsplit_once('/').map_or(url, |(_, n)| n);

    if file_name.is_empty() || !EXTENSION_FILE_NAME.is_match(file_name) {
        return None;
    }

    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPPORTED: &[&str] = &[
        "/document/raw:/storage/emulated/0/Download/a.zip",
        "/document/primary:Download/a.zip",
        "/document/1A2B-3C4D:Download/a.zip",
        "/storage_root/storage/emulated/0/x",
        "/storage_root/Download/a.zip",
        "/external/Download/a.zip",
        "/root/sdcard/a.zip",
        "/storage/emulated/0/file%3A%2F%2F%2Fsdcard%2Fa.zip",
        "/data/local/tmp/a.zip",
    ];

    #[test]
    fn document_providers() {
        let n = PathNormalizer::default();

        assert_eq!(
            n.normalize("/document/raw:/storage/emulated/0/Download/a.zip"),
            "/storage/emulated/0/Download/a.zip",
        );
        assert_eq!(
            n.normalize("/document/primary:Download/a.zip"),
            "/storage/emulated/0/Download/a.zip",
        );
        assert_eq!(
            n.normalize("/document/1A2B-3C4D:Download/a.zip"),
            "/storage/1A2B-3C4D/Download/a.zip",
        );
    }

    #[test]
    fn filesystem_root_as_storage_root() {
        let n = PathNormalizer::new("/");
        assert_eq!(n.external_storage_root(), "/");
        assert_eq!(n.normalize("/document/primary:Download/a.zip"), "/Download/a.zip");
        assert_eq!(n.normalize("/document/primary:"), "/");
        assert_eq!(n.data_dir("flashutils"), PathBuf::from("/flashutils"));
    }

    #[test]
    fn custom_storage_root() {
        let n = PathNormalizer::new("/mnt/user/0/primary/");
        assert_eq!(n.external_storage_root(), "/mnt/user/0/primary");
        assert_eq!(
            n.normalize("/document/primary:Download/a.zip"),
            "/mnt/user/0/primary/Download/a.zip",
        );
    }

    #[test]
    fn storage_aliases() {
        assert_eq!(
            normalize("/storage_root/storage/emulated/0/x"),
            "/storage/emulated/0/x",
        );
        assert_eq!(
            normalize("/storage_root/Download/a.zip"),
            "/storage/emulated/0/Download/a.zip",
        );
        assert_eq!(
            normalize("/external/Download/a.zip"),
            "/storage/emulated/0/Download/a.zip",
        );
        assert_eq!(normalize("/root/sdcard/a.zip"), "/sdcard/a.zip");
        // Only the leading alias is rewritten.
        assert_eq!(
            normalize("/external/external_sd/a.zip"),
            "/storage/emulated/0/external_sd/a.zip",
        );
        assert_eq!(normalize("/root/rootfs.img"), "/rootfs.img");
        assert_eq!(normalize("/root/root/root/x"), "/x");
        assert_eq!(normalize("/root/root"), "/root");
        assert_eq!(normalize("/rootfs.img"), "/rootfs.img");
    }

    #[test]
    fn encoded_file_uri() {
        assert_eq!(
            normalize("/storage/emulated/0/file%3A%2F%2F%2Fsdcard%2Fa.zip"),
            "/storage/emulated/0/sdcard/a.zip",
        );
    }

    #[test]
    fn unmatched_is_unchanged() {
        for p in ["", "/", "/data/local/tmp/a.zip", "relative/path", "/documents/a"] {
            assert_eq!(normalize(p), p);
        }
    }

    #[test]
    fn idempotent() {
        let n = PathNormalizer::default();

        for p in SUPPORTED {
            let once = n.normalize(p);
            assert_eq!(n.normalize(&once), once, "Input: {p:?}");
        }
    }

    #[test]
    fn data_dir() {
        let n = PathNormalizer::default();
        assert_eq!(
            n.data_dir("flashutils"),
            PathBuf::from("/storage/emulated/0/flashutils"),
        );
    }

    #[test]
    fn extension() {
        assert_eq!(file_extension("https://example.com/rom.zip"), Some("zip"));
        assert_eq!(
            file_extension("https://example.com/a/twrp-3.7.0.img?dl=1#top"),
            Some("img"),
        );
        assert_eq!(file_extension("/sdcard/boot.img.tar"), Some("tar"));
        assert_eq!(file_extension("/sdcard/README"), None);
        assert_eq!(file_extension("/sdcard/"), None);
        assert_eq!(file_extension("/sdcard/a file.zip"), None);
        assert_eq!(file_extension("/sdcard/trailing."), None);
    }
}
