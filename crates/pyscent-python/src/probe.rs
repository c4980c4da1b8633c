//! Filesystem probing for package detection.
//!
//! Package membership is decided by `__init__.py` markers. The probe is a
//! trait so analysis of in-editor buffers and tests can answer existence
//! questions without touching the disk.

use std::path::{Path, PathBuf};

/// Answers "does this path exist" for package and relative-import checks.
pub trait FileProbe {
    fn exists(&self, path: &Path) -> bool;
}

/// Probe backed by the real filesystem.
#[derive(Debug, Default)]
pub struct OsProbe;

impl FileProbe for OsProbe {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Probe answering from a fixed set of paths.
#[derive(Debug, Default)]
pub struct StaticProbe {
    known: Vec<PathBuf>,
}

impl StaticProbe {
    pub fn new(known: Vec<PathBuf>) -> Self {
        StaticProbe { known }
    }
}

impl FileProbe for StaticProbe {
    fn exists(&self, path: &Path) -> bool {
        self.known.iter().any(|p| p == path)
    }
}

/// Walk up from `directory` while `__init__.py` markers continue, returning
/// the package names root-first. A directory without a marker is not a
/// package at all and yields nothing.
pub fn root_package_list(probe: &dyn FileProbe, directory: &Path) -> Vec<String> {
    let is_package = |dir: &Path| probe.exists(&dir.join("__init__.py"));
    if !is_package(directory) {
        return Vec::new();
    }
    let mut packages = Vec::new();
    let mut current = directory.to_path_buf();
    loop {
        if !is_package(&current) {
            break;
        }
        let Some(name) = current.file_name() else {
            break;
        };
        packages.push(name.to_string_lossy().into_owned());
        match current.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => current = parent.to_path_buf(),
            _ => break,
        }
    }
    packages.reverse();
    packages
}

/// Dotted package path of a directory, empty when it is not a package.
pub fn package_of(probe: &dyn FileProbe, directory: &Path) -> String {
    root_package_list(probe, directory).join(".")
}
