//! Infrastructure layer
//!
//! Handles all I/O operations: network, filesystem, archives and the
//! external bash process. This module is the only place where side
//! effects occur.

pub mod discovery;
pub mod download;
pub mod filesystem;
pub mod github_output;
pub mod pkgbuild;
pub mod pkginfo;
pub mod repo_db;
