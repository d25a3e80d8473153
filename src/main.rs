use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::shells;
use menugen::commands::chat::{self, ChatArgs};
use menugen::commands::config::{self, ConfigArgs};
use menugen::commands::embed::{self, EmbedArgs};
use menugen::commands::generate::{self, GenerateArgs};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  menugen generate --cuisine Italian --runner sequential --model gpt-4o-mini\n  menugen generate --dry-run --cuisine Mexican --runner manual --model gpt-4o-mini\n  menugen chat --model gpt-4o-mini --window 5\n  menugen config check\n  menugen completion bash > ~/.local/share/bash-completion/completions/menugen";

const GENERATE_HELP_EXAMPLES: &str = "Examples:\n  menugen generate --cuisine Italian --runner sequential --model gpt-4o-mini\n  menugen generate --provider fireworks --model accounts/fireworks/models/kimi-k2-instruct-0905 --cuisine Chinese --runner manual\n  menugen generate --cuisine Arabic --runner sequential --model gpt-4o-mini --dry-run";

const EMBED_HELP_EXAMPLES: &str = "Examples:\n  menugen embed --model nomic-ai/nomic-embed-text-v1.5 --provider fireworks \"What is the capital of India?\" \"Delhi is the capital of India\" \"The Everest is the highest mountain\"\n  menugen embed --model text-embedding-3-small \"a single text to embed\"";

#[derive(Debug, Parser)]
#[command(
    name = "menugen",
    about = "Restaurant name and menu generation via LLM prompt chains",
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(
        about = "Generate a restaurant name and menu for a cuisine",
        after_help = GENERATE_HELP_EXAMPLES
    )]
    Generate(GenerateArgs),
    #[command(about = "Chat with a model that remembers recent exchanges")]
    Chat(ChatArgs),
    #[command(about = "Embed texts and rank them by similarity", after_help = EMBED_HELP_EXAMPLES)]
    Embed(EmbedArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => {
            clap_complete::generate(shells::Bash, &mut cmd, "menugen", &mut io::stdout())
        }
        CompletionShell::Zsh => {
            clap_complete::generate(shells::Zsh, &mut cmd, "menugen", &mut io::stdout())
        }
        CompletionShell::Fish => {
            clap_complete::generate(shells::Fish, &mut cmd, "menugen", &mut io::stdout())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate(args) => generate::run(args).await,
        Commands::Chat(args) => chat::run(args).await,
        Commands::Embed(args) => embed::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
