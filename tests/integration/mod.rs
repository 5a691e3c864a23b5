//! Integration test suite for the skeleton installer
//!
//! End-to-end tests running the binary against temporary projects.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **optional**: `optional` command, prompt and restricted install
//! - **remove_self**: `remove-self` command, vendor, lock and manifest cleanup
//! - **run**: `run` command, event-driven prompt followed by self-removal
//! - **config**: configuration loading and manifest discovery

#[path = "../common/mod.rs"]
mod common;

mod config;
mod optional;
mod remove_self;
mod run;
