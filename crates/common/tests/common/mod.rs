//! Shared fixtures for archive and bucket integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use ::common::archive::{extract_to_workspace, ArchiveLimits, Workspace};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// An entry to place in a test archive. Names ending in `/` become
/// directory entries.
pub struct Entry<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
}

pub fn file<'a>(name: &'a str, data: &'a [u8]) -> Entry<'a> {
    Entry { name, data }
}

pub fn dir(name: &str) -> Entry<'_> {
    Entry { name, data: b"" }
}

/// Write a ZIP archive to `path` holding `entries` in order.
pub fn write_zip(path: &Path, entries: &[Entry<'_>]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let file = std::fs::File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for entry in entries {
        if entry.name.ends_with('/') {
            zip.add_directory(entry.name, options).unwrap();
        } else {
            zip.start_file(entry.name, options).unwrap();
            zip.write_all(entry.data).unwrap();
        }
    }
    zip.finish().unwrap();
}

/// Storage root and scratch root under one temporary directory.
pub struct Fixture {
    pub temp: TempDir,
    pub storage: PathBuf,
    pub scratch: PathBuf,
}

pub fn setup() -> Fixture {
    let temp = TempDir::new().unwrap();
    let storage = temp.path().join("data");
    let scratch = temp.path().join("tmp");
    std::fs::create_dir_all(&storage).unwrap();
    std::fs::create_dir_all(&scratch).unwrap();
    Fixture {
        temp,
        storage,
        scratch,
    }
}

impl Fixture {
    /// Unpack `archive` under the scratch root with default limits.
    pub fn unpack(&self, archive: &Path) -> Workspace {
        extract_to_workspace(archive, &self.scratch, &ArchiveLimits::default()).unwrap()
    }
}

/// Number of directories currently present under `scratch`.
pub fn scratch_dirs(scratch: &Path) -> usize {
    std::fs::read_dir(scratch).unwrap().count()
}
