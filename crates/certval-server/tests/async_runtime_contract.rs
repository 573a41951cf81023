// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path, out: &mut Vec<PathBuf>) {
    if let Ok(entries) = fs::read_dir(root) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                collect_rs_files(&path, out);
            } else if path.extension().and_then(|x| x.to_str()) == Some("rs") {
                out.push(path);
            }
        }
    }
}

fn server_sources() -> Vec<(PathBuf, String)> {
    let mut files = Vec::new();
    collect_rs_files(
        &Path::new(env!("CARGO_MANIFEST_DIR")).join("src"),
        &mut files,
    );
    files
        .into_iter()
        .map(|path| {
            let text = fs::read_to_string(&path).expect("read server source file");
            (path, text)
        })
        .collect()
}

#[test]
fn server_source_forbids_reqwest_blocking_usage() {
    for (path, text) in server_sources() {
        assert!(
            !text.contains("reqwest::blocking"),
            "blocking reqwest usage is forbidden in server source: {}",
            path.display()
        );
    }
}

#[test]
fn server_reaches_sqlite_only_through_the_store_crate() {
    for (path, text) in server_sources() {
        assert!(
            !text.contains("rusqlite::"),
            "server source must reach sqlite through certval-store: {}",
            path.display()
        );
    }
}
