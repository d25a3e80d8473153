use std::collections::HashMap;
use std::time::Instant;

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::chain::completion::{CompletionClient, TextCompletion};
use crate::chain::memory::WindowMemory;
use crate::chain::provider::is_api_key_present;
use crate::chain::template::PromptTemplate;
use crate::commands::settings::{self, ModelArgs, RequestPlan};
use crate::commands::{print_usage_line, prompt_line};

const CONVERSATION_TEMPLATE: &str = "You are a helpful and friendly assistant. \
                                     Continue the conversation naturally.\n\n\
                                     Current conversation:\n\
                                     {history}\n\
                                     Human: {input}\n\
                                     AI:";

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

#[derive(Debug, Args, Clone)]
pub struct ChatArgs {
    /// Number of recent exchanges kept in memory
    #[arg(long)]
    window: Option<usize>,

    /// Print token usage and latency after each reply
    #[arg(long)]
    show_usage: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Debug, Serialize)]
struct ChatPlan<'a> {
    dry_run: bool,
    command: &'a str,
    provider: &'a str,
    model: &'a str,
    window: usize,
    template_variables: Vec<String>,
    request: RequestPlan,
}

pub async fn run(args: ChatArgs) -> Result<(), String> {
    let (settings, profile) = settings::resolve(&args.model)?;
    let window = args
        .window
        .or(profile.window)
        .unwrap_or(WindowMemory::DEFAULT_WINDOW);
    let show_usage = args.show_usage || profile.show_usage.unwrap_or(false);
    let template = PromptTemplate::new(CONVERSATION_TEMPLATE, &["history", "input"])
        .map_err(|err| err.to_string())?;

    if settings.verbose && !settings.quiet {
        eprintln!(
            "chat provider={} model={} window={} api_key_present={}",
            settings.provider.as_str(),
            settings.model,
            window,
            is_api_key_present(settings.provider)
        );
    }

    if args.model.dry_run {
        let plan = ChatPlan {
            dry_run: true,
            command: "chat",
            provider: settings.provider.as_str(),
            model: &settings.model,
            window,
            template_variables: template.input_variables().to_vec(),
            request: RequestPlan::from_options(&settings.options),
        };
        let encoded =
            serde_json::to_string(&plan).map_err(|err| format!("Failed to encode plan: {err}"))?;
        println!("{encoded}");
        return Ok(());
    }

    println!("=== Conversational assistant with memory ===");
    println!("Type 'exit' or 'quit' to end the conversation");
    println!("{}", "-".repeat(50));

    let client = CompletionClient::new(settings.provider, &settings.model)
        .with_verbose(settings.verbose && !settings.quiet);
    let mut memory = WindowMemory::new(window);

    loop {
        let Some(line) = prompt_line("\nYou: ")? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit_word(input) {
            println!("\n{} Goodbye! Have a great day!", "AI:".bold());
            break;
        }

        let bindings = HashMap::from([
            ("history".to_string(), memory.history()),
            ("input".to_string(), input.to_string()),
        ]);
        let prompt = template.render(&bindings).map_err(|err| err.to_string())?;

        let started = Instant::now();
        match client.complete(&prompt, &settings.options).await {
            Ok(completion) => {
                let reply = completion.text.trim().to_string();
                println!("\n{} {reply}", "AI:".bold());
                memory.record(input, reply);
                if show_usage && !settings.quiet {
                    print_usage_line(completion.usage.as_ref(), started.elapsed().as_millis());
                }
            }
            // One failed turn does not end the conversation.
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Please try again.");
            }
        }
    }

    Ok(())
}

fn is_exit_word(input: &str) -> bool {
    let lowered = input.to_lowercase();
    EXIT_WORDS.iter().any(|word| *word == lowered)
}
