//! CLI command implementations.

use std::io::{self, Write};

use crate::chain::provider::Usage;

/// Conversational chat with bounded-window memory.
pub mod chat;
/// Config file inspection.
pub mod config;
/// Embedding and similarity ranking.
pub mod embed;
/// Restaurant name and menu generation.
pub mod generate;
/// Shared flag resolution across commands.
pub mod settings;

/// Prompts on stderr and reads one line from stdin. Returns `None` at end
/// of input. The trailing newline is stripped; other whitespace is kept.
pub(crate) fn prompt_line(prompt: &str) -> Result<Option<String>, String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    match io::stdin().read_line(&mut line) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
        Err(err) => Err(format!("Failed to read input: {err}")),
    }
}

pub(crate) fn print_usage_line(usage: Option<&Usage>, latency_ms: u128) {
    match usage {
        Some(usage) => eprintln!(
            "usage: prompt={} completion={} total={} latency_ms={latency_ms}",
            format_count(usage.prompt_tokens),
            format_count(usage.completion_tokens),
            format_count(usage.total_tokens)
        ),
        None => eprintln!("usage: unavailable latency_ms={latency_ms}"),
    }
}

fn format_count(count: Option<u32>) -> String {
    count
        .map(|value| value.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
