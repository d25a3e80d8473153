use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use serde::Serialize;

use crate::chain::completion::CompletionClient;
use crate::chain::pipeline::{ChainStep, Pipeline};
use crate::chain::provider::is_api_key_present;
use crate::chain::runner::{self, ChainError};
use crate::chain::template::PromptTemplate;
use crate::commands::settings::{self, ModelArgs, RequestPlan, Settings};
use crate::commands::{print_usage_line, prompt_line};
use crate::report::{self, CUISINE_KEY, Destination, MENU_ITEMS_KEY, RESTAURANT_NAME_KEY};

const NAME_TEMPLATE: &str = "I want to open a restaurant for {cuisine} food. \
                             Suggest a fancy name for this. Reply with a single name only.";
const MENU_TEMPLATE: &str = "Suggest some veg menu items for {restaurant_name}. \
                             Return it as a comma separated list.";

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Cuisine to generate for; prompted interactively when omitted
    #[arg(long)]
    cuisine: Option<String>,

    /// Runner strategy: manual or sequential; prompted interactively when
    /// omitted
    #[arg(long)]
    runner: Option<String>,

    /// Directory that receives the report file
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip writing the report file
    #[arg(long)]
    no_save: bool,

    /// Print aggregated token usage and latency to stderr
    #[arg(long)]
    show_usage: bool,

    /// Print version and build metadata
    #[arg(long)]
    version: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Manual,
    Sequential,
}

impl Strategy {
    fn as_str(self) -> &'static str {
        match self {
            Strategy::Manual => "manual",
            Strategy::Sequential => "sequential",
        }
    }
}

#[derive(Debug, Serialize)]
struct GeneratePlan<'a> {
    dry_run: bool,
    command: &'a str,
    provider: &'a str,
    model: &'a str,
    runner: &'a str,
    cuisine: &'a str,
    pipeline: PipelinePlan,
    request: RequestPlan,
    save: SavePlan,
}

#[derive(Debug, Serialize)]
struct PipelinePlan {
    input_variables: Vec<String>,
    output_variables: Vec<String>,
    steps: Vec<StepPlan>,
}

#[derive(Debug, Serialize)]
struct StepPlan {
    output_key: String,
    input_variables: Vec<String>,
    template: String,
}

#[derive(Debug, Serialize)]
struct SavePlan {
    enabled: bool,
    output_dir: String,
}

pub async fn run(args: GenerateArgs) -> Result<(), String> {
    if args.version {
        print_version();
        return Ok(());
    }

    let (settings, profile) = settings::resolve(&args.model)?;
    let strategy = resolve_strategy(args.runner.as_deref())?;
    let cuisine = resolve_cuisine(args.cuisine.clone())?;
    let show_usage = args.show_usage || profile.show_usage.unwrap_or(false);
    let output_dir = args
        .output_dir
        .clone()
        .or(profile.output_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    let pipeline = restaurant_pipeline().map_err(|err| err.to_string())?;
    let inputs = HashMap::from([(CUISINE_KEY.to_string(), cuisine.clone())]);

    if settings.verbose && !settings.quiet {
        eprintln!(
            "generate provider={} model={} runner={} api_key_present={}",
            settings.provider.as_str(),
            settings.model,
            strategy.as_str(),
            is_api_key_present(settings.provider)
        );
    }

    if args.model.dry_run {
        print_plan(&settings, strategy, &cuisine, &pipeline, !args.no_save, &output_dir)?;
        if show_usage && !settings.quiet {
            eprintln!("usage: unavailable latency_ms=0 (dry-run)");
        }
        return Ok(());
    }

    let client = CompletionClient::new(settings.provider, &settings.model)
        .with_verbose(settings.verbose && !settings.quiet);
    let started = Instant::now();
    let result = match strategy {
        Strategy::Manual => {
            runner::run_manual(&client, &pipeline, &inputs, &settings.options).await
        }
        Strategy::Sequential => {
            runner::run_sequential(&client, &pipeline, &inputs, &settings.options).await
        }
    }
    .map_err(|err| err.to_string())?;
    let latency_ms = started.elapsed().as_millis();

    report::emit(&result, &Destination::Console);
    if !args.no_save {
        report::emit(&result, &Destination::File(output_dir));
    }
    if show_usage && !settings.quiet {
        print_usage_line(result.usage(), latency_ms);
    }
    Ok(())
}

/// The two-step restaurant pipeline: cuisine feeds the name prompt, the
/// generated name feeds the menu prompt.
pub fn restaurant_pipeline() -> Result<Pipeline, ChainError> {
    let name_template = PromptTemplate::new(NAME_TEMPLATE, &[CUISINE_KEY])?;
    let menu_template = PromptTemplate::new(MENU_TEMPLATE, &[RESTAURANT_NAME_KEY])?;
    let pipeline = Pipeline::new(
        vec![
            ChainStep::new(name_template, RESTAURANT_NAME_KEY),
            ChainStep::new(menu_template, MENU_ITEMS_KEY),
        ],
        &[CUISINE_KEY],
        &[RESTAURANT_NAME_KEY, MENU_ITEMS_KEY],
    )?;
    Ok(pipeline)
}

fn resolve_strategy(flag: Option<&str>) -> Result<Strategy, String> {
    match flag {
        Some("manual") => Ok(Strategy::Manual),
        Some("sequential") => Ok(Strategy::Sequential),
        Some(other) => Err(format!(
            "Invalid --runner '{other}'. Supported values: manual, sequential."
        )),
        None => {
            eprintln!("Choose implementation:");
            eprintln!("1. Manual chains");
            eprintln!("2. Sequential pipeline");
            let choice = prompt_line("Enter your choice (1 or 2): ")?.unwrap_or_default();
            match choice.trim() {
                "1" => Ok(Strategy::Manual),
                "2" => Ok(Strategy::Sequential),
                other => Err(format!("Invalid choice '{other}'. Enter 1 or 2.")),
            }
        }
    }
}

fn resolve_cuisine(flag: Option<String>) -> Result<String, String> {
    match flag {
        Some(cuisine) => Ok(cuisine),
        None => {
            let line = prompt_line("Enter the cuisine type (e.g., Italian, Mexican, Chinese): ")?
                .unwrap_or_default();
            Ok(line.trim().to_string())
        }
    }
}

fn print_plan(
    settings: &Settings,
    strategy: Strategy,
    cuisine: &str,
    pipeline: &Pipeline,
    save_enabled: bool,
    output_dir: &Path,
) -> Result<(), String> {
    let plan = GeneratePlan {
        dry_run: true,
        command: "generate",
        provider: settings.provider.as_str(),
        model: &settings.model,
        runner: strategy.as_str(),
        cuisine,
        pipeline: PipelinePlan {
            input_variables: pipeline.input_variables().to_vec(),
            output_variables: pipeline.output_variables().to_vec(),
            steps: pipeline
                .steps()
                .iter()
                .map(|step| StepPlan {
                    output_key: step.output_key().to_string(),
                    input_variables: step.template().input_variables().to_vec(),
                    template: step.template().template().to_string(),
                })
                .collect(),
        },
        request: RequestPlan::from_options(&settings.options),
        save: SavePlan {
            enabled: save_enabled,
            output_dir: output_dir.display().to_string(),
        },
    };
    let encoded =
        serde_json::to_string(&plan).map_err(|err| format!("Failed to encode plan: {err}"))?;
    println!("{encoded}");
    Ok(())
}

fn print_version() {
    println!(
        "menugen {} (commit: {}, built: {})",
        env!("CARGO_PKG_VERSION"),
        env!("MG_GIT_SHA"),
        env!("MG_BUILD_TS")
    );
}
