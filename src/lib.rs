//! pkgplan - incremental build planner for pacman package repositories
//!
//! This library discovers the PKGBUILD units of a repository, builds their
//! dependency graph, compares it against the published repository database
//! and plans which units to rebuild, in which order, and which published
//! packages to remove.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Planning logic (no I/O operations)
//! - [`infra`] - Infrastructure layer (network, filesystem, processes)
//! - [`config`] - Constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
