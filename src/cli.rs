use crate::config::Overrides;
use clap::{ArgAction, Parser, Subcommand};

/// Tools for interacting with the Immich API
#[derive(Parser, Debug)]
#[command(name = "immich-tools", version, disable_help_flag = true)]
pub struct Cli {
    /// The Immich host to talk to
    #[arg(short = 'h', long, global = true)]
    pub host: Option<String>,

    /// The Immich API key
    #[arg(short = 'k', long = "api-key", global = true)]
    pub api_key: Option<String>,

    /// Print help
    #[arg(long, action = ArgAction::Help, global = true)]
    help: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Automatically combines assets with matching basename into stacks
    #[command(disable_help_flag = true)]
    Autostack {
        /// The directory in which the assets should be searched
        directory: String,

        /// Recursively include subdirectories
        #[arg(short = 'r')]
        recursive: bool,

        /// Copy metadata from raw image to edited versions
        #[arg(short = 'm')]
        copy_metadata: bool,

        /// Only report the changes that would be made
        #[arg(short = 'd')]
        dry_run: bool,
    },
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            host: self.host.clone(),
            api_key: self.api_key.clone(),
            ..Default::default()
        };
        match &self.command {
            Command::Autostack {
                recursive,
                copy_metadata,
                dry_run,
                ..
            } => {
                overrides.recursive = *recursive;
                overrides.copy_metadata = *copy_metadata;
                overrides.dry_run = *dry_run;
            }
        }
        overrides
    }
}
