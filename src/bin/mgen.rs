use std::process;

use clap::Parser;
use menugen::commands::generate::{self, GenerateArgs};

#[derive(Debug, Parser)]
#[command(
    name = "mgen",
    about = "Generate a restaurant name and menu for a cuisine",
    disable_version_flag = true
)]
struct Cli {
    #[command(flatten)]
    generate: GenerateArgs,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = generate::run(cli.generate).await {
        eprintln!("{err}");
        process::exit(1);
    }
}
