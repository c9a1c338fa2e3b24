// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

use flashutils::path::{self, PathNormalizer};

const PREFIXES: &[&str] = &[
    "/document/raw:",
    "/document/primary:",
    "/document/0123-4567:",
    "/storage_root/storage/emulated/0/",
    "/storage_root/",
    "/external/",
    "/root/",
    "/storage/emulated/0/file%3A%2F%2F%2F",
    "/",
];

const SUFFIXES: &[&str] = &[
    "",
    "Download/rom.zip",
    "/storage/emulated/0/Download/rom.zip",
    "TWRP/backups/a:b/boot.emmc.win",
    "sdcard%2FDownload%2From.zip",
    "root/Download/rom.zip",
    "root/root/boot.img",
];

#[test]
fn normalize_is_idempotent() {
    for root in ["/storage/emulated/0", "/sdcard", "/mnt/media_rw/0123-4567", "/"] {
        let normalizer = PathNormalizer::new(root);

        for prefix in PREFIXES {
            for suffix in SUFFIXES {
                let raw = format!("{prefix}{suffix}");
                let once = normalizer.normalize(&raw);
                let twice = normalizer.normalize(&once);

                assert_eq!(twice, once, "Root: {root:?}, input: {raw:?}");
            }
        }
    }
}

#[test]
fn normalized_paths_have_no_provider_artifacts() {
    let normalizer = PathNormalizer::default();

    for prefix in PREFIXES {
        for suffix in SUFFIXES {
            let raw = format!("{prefix}{suffix}");
            let normalized = normalizer.normalize(&raw);

            assert!(!normalized.starts_with("/document/"), "{raw:?} -> {normalized:?}");
            assert!(!normalized.starts_with("/storage_root"), "{raw:?} -> {normalized:?}");
            assert!(!normalized.starts_with("/external"), "{raw:?} -> {normalized:?}");
            assert!(!normalized.contains("file%3A"), "{raw:?} -> {normalized:?}");
        }
    }
}

#[test]
fn documented_examples() {
    assert_eq!(
        path::normalize("/document/primary:Download/a.zip"),
        "/storage/emulated/0/Download/a.zip",
    );
    assert_eq!(
        path::normalize("/storage_root/storage/emulated/0/x"),
        "/storage/emulated/0/x",
    );
}
