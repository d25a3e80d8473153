//! Prompt-chaining building blocks.
//!
//! The module contains prompt templates, the linear pipeline model, the two
//! runner strategies, and typed clients for chat-completion and embedding
//! providers used by CLI commands.

/// The text-completion seam and its provider-backed client.
pub mod completion;
/// Embedding client and vector similarity helpers.
pub mod embeddings;
/// Fireworks chat-completions helper functions.
pub mod fireworks;
pub(crate) mod http;
/// Bounded-window conversation memory.
pub mod memory;
/// OpenAI chat-completions helper functions.
pub mod openai;
/// Steps, pipelines, and execution results.
pub mod pipeline;
/// Provider-agnostic chat interfaces and dispatch.
pub mod provider;
/// Manual and validate-first pipeline runners.
pub mod runner;
/// Prompt templates with named placeholders.
pub mod template;
