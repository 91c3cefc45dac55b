//! Core planning logic
//!
//! This module contains the build planning logic for pkgplan.
//! It has NO I/O operations - those belong in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`unit`] - Build units and manifest records
//! - [`graph`] - Name index and dependency graph
//! - [`levels`] - Level scheduling and depth computation
//! - [`reconcile`] - Desired vs published state reconciliation
//! - [`closure`] - Transitive closure over built archives
//! - [`assets`] - Release asset keep/delete decisions
//! - [`plan`] - Build plan assembly and CI output
//! - [`config`] - Repository configuration (`pkgplan.toml`)

pub mod assets;
pub mod closure;
pub mod config;
pub mod graph;
pub mod levels;
pub mod plan;
pub mod reconcile;
pub mod unit;
