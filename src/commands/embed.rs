use std::cmp::Ordering;

use clap::Args;
use serde::Serialize;

use crate::chain::embeddings::{EmbeddingsClient, cosine_similarity};
use crate::chain::provider::is_api_key_present;
use crate::commands::settings;

#[derive(Debug, Args, Clone)]
pub struct EmbedArgs {
    /// Texts to embed. With several, the first is the query and the rest
    /// are ranked against it by cosine similarity.
    #[arg(required = true)]
    texts: Vec<String>,

    /// Requested vector dimensionality, when the model supports it
    #[arg(long)]
    dimensions: Option<u32>,

    /// Provider to use: openai or fireworks
    #[arg(long)]
    provider: Option<String>,

    /// Embedding model identifier
    #[arg(long)]
    model: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Named profile from the config file
    #[arg(long)]
    profile: Option<String>,

    /// Print the resolved plan as JSON and exit without calling a provider
    #[arg(long)]
    dry_run: bool,

    /// Log request diagnostics to stderr
    #[arg(long)]
    verbose: bool,

    /// Suppress non-error diagnostics
    #[arg(long)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
struct EmbedPlan<'a> {
    dry_run: bool,
    command: &'a str,
    provider: &'a str,
    model: &'a str,
    dimensions: Option<u32>,
    timeout_secs: Option<u64>,
    inputs: usize,
}

pub async fn run(args: EmbedArgs) -> Result<(), String> {
    let profile = settings::load_profile_or_default(args.profile.as_deref())?;
    let provider = settings::resolve_provider(args.provider.as_deref(), &profile)?;
    let model = settings::resolve_embedding_model(args.model.as_deref(), &profile)?;
    let timeout_secs =
        settings::resolve_setting(args.timeout, "MG_TIMEOUT", "an integer", profile.timeout)?;
    let dimensions = args.dimensions.or(profile.dimensions);

    if args.verbose && !args.quiet {
        eprintln!(
            "embed provider={} model={} inputs={} api_key_present={}",
            provider.as_str(),
            model,
            args.texts.len(),
            is_api_key_present(provider)
        );
    }

    if args.dry_run {
        let plan = EmbedPlan {
            dry_run: true,
            command: "embed",
            provider: provider.as_str(),
            model: &model,
            dimensions,
            timeout_secs,
            inputs: args.texts.len(),
        };
        let encoded =
            serde_json::to_string(&plan).map_err(|err| format!("Failed to encode plan: {err}"))?;
        println!("{encoded}");
        return Ok(());
    }

    let client = EmbeddingsClient::new(provider, model)
        .with_dimensions(dimensions)
        .with_timeout(timeout_secs);

    if args.texts.len() == 1 {
        let vector = client
            .embed_query(&args.texts[0])
            .await
            .map_err(|err| err.to_string())?;
        println!("dims={}", vector.len());
        let encoded = serde_json::to_string(&vector)
            .map_err(|err| format!("Failed to encode vector: {err}"))?;
        println!("{encoded}");
        return Ok(());
    }

    let vectors = client
        .embed_documents(&args.texts)
        .await
        .map_err(|err| err.to_string())?;
    let query_vector = &vectors[0];
    let mut ranked: Vec<(f64, &str)> = args.texts[1..]
        .iter()
        .zip(&vectors[1..])
        .map(|(text, vector)| (cosine_similarity(query_vector, vector), text.as_str()))
        .collect();
    ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    println!("query: {}", args.texts[0]);
    for (score, text) in ranked {
        println!("{score:.4}  {text}");
    }
    Ok(())
}
