//! `jim_rust` - JIRA to GitHub issue migration library
//!
//! This crate provides the core functionality for the `jim` CLI tool,
//! a Rust port of the classic JIM issue migrator.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (`CompositeKey`, Issue, Comment, Project)
//! - [`jira`] - Batched XML export retrieval and normalization
//! - [`github`] - Destination client and asynchronous import protocol
//! - [`migrate`] - Import orchestration (prerequisites, submit, poll)
//! - [`checkpoint`] - Project snapshot persistence
//! - [`markup`] - Text normalization and cross-reference rewriting
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod jira;
pub mod logging;
pub mod markup;
pub mod migrate;
pub mod model;

pub use error::{JimError, Result};
