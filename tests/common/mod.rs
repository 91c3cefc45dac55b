//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: temporary
//! repositories with PKGBUILD units, built package archives and repository
//! databases.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test repository context
///
/// Creates a temporary directory laid out like a package repository and
/// provides utilities for setting up test scenarios.
pub struct TestRepo {
    /// Temporary directory for the test repository
    pub dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test repository
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test repository
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test repository
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test repository
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Add a unit directory with a PKGBUILD
    pub fn add_unit(&self, dir: &str, names: &[&str], version: &str, depends: &[&str]) {
        self.add_unit_full(dir, names, version, depends, &[]);
    }

    /// Add a unit directory with runtime and build dependencies
    ///
    /// `version` is `pkgver-pkgrel`.
    pub fn add_unit_full(
        &self,
        dir: &str,
        names: &[&str],
        version: &str,
        depends: &[&str],
        makedepends: &[&str],
    ) {
        let (pkgver, pkgrel) = version.rsplit_once('-').expect("version must be pkgver-pkgrel");
        let content = format!(
            "pkgname=({})\npkgver={pkgver}\npkgrel={pkgrel}\narch=('x86_64')\ndepends=({})\nmakedepends=({})\n",
            quoted(names),
            quoted(depends),
            quoted(makedepends),
        );
        self.create_file(&format!("{dir}/PKGBUILD"), &content);
    }

    /// Build a `.pkg.tar.zst` archive holding only a `.PKGINFO`
    pub fn add_archive(&self, file: &str, name: &str, version: &str, provides: &[&str], depends: &[&str]) -> PathBuf {
        let path = self.dir.path().join(file);
        write_archive(&path, &pkginfo(name, version, provides, depends));
        path
    }

    /// Build a repository database listing `(name, version)` pairs
    pub fn add_db(&self, file: &str, packages: &[(&str, &str)]) -> PathBuf {
        let path = self.dir.path().join(file);
        write_db(&path, packages);
        path
    }

    /// Run the pkgplan binary in the repository
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_pkgplan"))
            .current_dir(self.path())
            .args(args)
            .env_remove("GITHUB_OUTPUT")
            .env_remove("GITHUB_REPOSITORY")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute pkgplan")
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

fn quoted(items: &[&str]) -> String {
    items
        .iter()
        .map(|i| format!("'{i}'"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `.PKGINFO` content as written by makepkg
pub fn pkginfo(name: &str, version: &str, provides: &[&str], depends: &[&str]) -> String {
    let mut content = format!("# Generated by makepkg\npkgname = {name}\npkgver = {version}\narch = x86_64\n");
    for p in provides {
        content.push_str(&format!("provides = {p}\n"));
    }
    for d in depends {
        content.push_str(&format!("depend = {d}\n"));
    }
    content
}

fn append_member<W: std::io::Write>(builder: &mut tar::Builder<W>, name: &str, content: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, name, content)
        .expect("Failed to append tar member");
}

/// Write a zstd-compressed tar with a `.PKGINFO` member and one payload file
pub fn write_archive(path: &Path, pkginfo: &str) {
    let file = std::fs::File::create(path).expect("Failed to create archive");
    let encoder = zstd::Encoder::new(file, 3).expect("Failed to create zstd encoder");
    let mut builder = tar::Builder::new(encoder);
    append_member(&mut builder, ".PKGINFO", pkginfo.as_bytes());
    append_member(&mut builder, "usr/share/doc/README", b"payload");
    let encoder = builder.into_inner().expect("Failed to finish tar");
    encoder.finish().expect("Failed to finish zstd stream");
}

/// Write a gzip-compressed repository database
pub fn write_db(path: &Path, packages: &[(&str, &str)]) {
    let file = std::fs::File::create(path).expect("Failed to create database");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, version) in packages {
        let desc = format!(
            "%FILENAME%\n{name}-{version}-x86_64.pkg.tar.zst\n\n%NAME%\n{name}\n\n%VERSION%\n{version}\n\n%ARCH%\nx86_64\n"
        );
        append_member(&mut builder, &format!("{name}-{version}/desc"), desc.as_bytes());
    }
    let encoder = builder.into_inner().expect("Failed to finish tar");
    encoder.finish().expect("Failed to finish gzip stream");
}

/// Whether bash is available to interpret PKGBUILDs
pub fn has_bash() -> bool {
    which::which("bash").is_ok()
}
