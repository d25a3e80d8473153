//! Restaurant name and menu generation driven by LLM prompt chains.
//!
//! A cuisine seeds a two-step pipeline: the first prompt suggests a
//! restaurant name, the second turns that name into menu items. Results go
//! to the console and to a timestamped report file. The same chain core
//! also backs a memory-aware chat loop and an embedding similarity demo.

/// Prompt templates, pipelines, runners, and provider clients.
pub mod chain;
/// CLI command implementations.
pub mod commands;
/// TOML profile configuration.
pub mod config;
/// Console and file reporting for execution results.
pub mod report;
