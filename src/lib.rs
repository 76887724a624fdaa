// file: src/lib.rs
// version: 3.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb4

//! # Pages Agent
//!
//! Turns app briefs into single-page apps published on GitHub Pages, and
//! provisions the host those builds run on.
//!
//! A build task arrives over HTTP (or from a file), a language model writes
//! the page, `git` and `gh` publish it, and the evaluation server is told
//! where it landed. Round 2 tasks revise an existing repository.

pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod executor;
pub mod llm;
pub mod logging;
pub mod network;
pub mod pipeline;
pub mod provision;
pub mod security;
pub mod server;
pub mod steps;
pub mod task;
pub mod utils;

pub use error::{AgentError, Result};

/// Version information for the agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
