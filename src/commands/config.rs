use clap::{Args, Subcommand};

use crate::config;

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Parse the config file and optionally check one profile
    Check {
        #[arg(long)]
        profile: Option<String>,
    },
    /// Print the config file path currently in effect
    Path,
}

pub fn run(args: ConfigArgs) -> Result<(), String> {
    match args.command {
        ConfigSubcommand::Check { profile } => {
            let path = config::validate_config(profile.as_deref())?;
            println!("config OK: {}", path.display());
            Ok(())
        }
        ConfigSubcommand::Path => {
            let path = config::config_path()?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
