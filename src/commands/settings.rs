use std::env;
use std::str::FromStr;

use clap::Args;
use serde::Serialize;

use crate::chain::provider::{CompletionOptions, Provider};
use crate::config::{self, ProfileConfig};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Flags shared by the completion-backed commands. Each value resolves as
/// CLI flag, then MG_* environment variable, then config profile, then
/// built-in default.
#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    /// Provider to use: openai or fireworks
    #[arg(long)]
    pub provider: Option<String>,

    /// Model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in each completion
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retries for transient provider failures
    #[arg(long)]
    pub retries: Option<u32>,

    /// Base delay between retries in milliseconds
    #[arg(long)]
    pub retry_delay: Option<u64>,

    /// Named profile from the config file
    #[arg(long)]
    pub profile: Option<String>,

    /// Print the resolved plan as JSON and exit without calling a provider
    #[arg(long)]
    pub dry_run: bool,

    /// Log request diagnostics to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Suppress non-error diagnostics
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: Provider,
    pub model: String,
    pub options: CompletionOptions,
    pub verbose: bool,
    pub quiet: bool,
}

/// The request portion of a `--dry-run` plan.
#[derive(Debug, Serialize)]
pub struct RequestPlan {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

impl RequestPlan {
    pub fn from_options(options: &CompletionOptions) -> Self {
        Self {
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            timeout_secs: options.timeout_secs,
            retries: options.retries,
            retry_delay_ms: options.retry_delay_ms,
        }
    }
}

/// Resolves the full completion settings for a command. Also hands back
/// the loaded profile so commands can pick up their own profile fields.
pub fn resolve(args: &ModelArgs) -> Result<(Settings, ProfileConfig), String> {
    let profile = load_profile_or_default(args.profile.as_deref())?;
    let provider = resolve_provider(args.provider.as_deref(), &profile)?;
    let model = args
        .model
        .clone()
        .or_else(|| env_string("MG_MODEL"))
        .or_else(|| profile.model.clone())
        .ok_or_else(|| "No model provided. Use --model or set MG_MODEL.".to_string())?;

    let temperature =
        resolve_setting(args.temperature, "MG_TEMPERATURE", "a number", profile.temperature)?
            .unwrap_or(DEFAULT_TEMPERATURE);
    let max_tokens =
        resolve_setting(args.max_tokens, "MG_MAX_TOKENS", "an integer", profile.max_tokens)?;
    let timeout_secs =
        resolve_setting(args.timeout, "MG_TIMEOUT", "an integer", profile.timeout)?;
    let retries =
        resolve_setting(args.retries, "MG_RETRIES", "an integer", profile.retries)?.unwrap_or(0);
    let retry_delay_ms =
        resolve_setting(args.retry_delay, "MG_RETRY_DELAY", "an integer", profile.retry_delay)?
            .unwrap_or(500);

    let options = CompletionOptions {
        temperature: Some(temperature),
        max_tokens,
        timeout_secs,
        retries,
        retry_delay_ms,
    };

    let settings = Settings {
        provider,
        model,
        options,
        verbose: args.verbose,
        quiet: args.quiet,
    };
    Ok((settings, profile))
}

pub fn load_profile_or_default(profile: Option<&str>) -> Result<ProfileConfig, String> {
    match profile {
        Some(name) => config::load_profile(name),
        None => Ok(ProfileConfig::default()),
    }
}

pub fn resolve_provider(cli: Option<&str>, profile: &ProfileConfig) -> Result<Provider, String> {
    if let Some(value) = cli {
        return Provider::parse(value)
            .ok_or_else(|| invalid_provider_message("--provider", value));
    }
    if let Some(value) = env_string("MG_PROVIDER") {
        return Provider::parse(&value)
            .ok_or_else(|| invalid_provider_message("MG_PROVIDER", &value));
    }
    if let Some(value) = &profile.provider {
        return Provider::parse(value).ok_or_else(|| {
            format!("Invalid profile provider '{value}'. Supported values: openai, fireworks.")
        });
    }
    Ok(Provider::Openai)
}

/// Embedding models resolve independently of chat models so one profile
/// can carry both.
pub fn resolve_embedding_model(
    cli: Option<&str>,
    profile: &ProfileConfig,
) -> Result<String, String> {
    cli.map(str::to_string)
        .or_else(|| env_string("MG_EMBEDDING_MODEL"))
        .or_else(|| profile.embedding_model.clone())
        .ok_or_else(|| {
            "No embedding model provided. Use --model or set MG_EMBEDDING_MODEL.".to_string()
        })
}

pub fn resolve_setting<T: FromStr>(
    cli: Option<T>,
    env_key: &str,
    expected: &str,
    profile: Option<T>,
) -> Result<Option<T>, String> {
    if cli.is_some() {
        return Ok(cli);
    }
    if let Some(value) = env_parsed(env_key, expected)? {
        return Ok(Some(value));
    }
    Ok(profile)
}

fn invalid_provider_message(origin: &str, value: &str) -> String {
    format!("Invalid {origin} '{value}'. Supported values: openai, fireworks.")
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parsed<T: FromStr>(key: &str, expected: &str) -> Result<Option<T>, String> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("Invalid {key} '{raw}'. Expected {expected}.")),
    }
}
