use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sensectl",
    about = "Lighting, fan, thermal profile and charge limit control for Acer Predator/Nitro laptops",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output as JSON instead of formatted tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Read configuration from this file only, ignoring system and user config
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Talk to an in-memory firmware model instead of the real dispatcher.
    /// Nothing reaches the hardware, and `set` does not require root.
    #[arg(long, global = true)]
    pub emulate: bool,

    /// Log every firmware call to stderr (repeat for trace output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// List attributes and their feature status
    List,

    /// Read an attribute from firmware
    Get {
        /// Attribute name (e.g., per_zone_mode)
        attribute: String,
    },

    /// Write an attribute (requires root)
    Set {
        /// Attribute name (e.g., back_logo)
        attribute: String,
        /// Value in the attribute's text format (e.g., ff0000,100,1)
        value: String,
    },

    /// Show platform identity, capabilities and every supported attribute
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (auto-detected if omitted)
        shell: Option<Shell>,
    },
}

/// Print shell completions to stdout.
pub fn print_completions(shell: Option<Shell>) {
    let shell = shell.or_else(Shell::from_env).unwrap_or_else(|| {
        eprintln!(
            "Could not detect shell. Specify one: sensectl completions bash|zsh|fish|elvish|powershell"
        );
        std::process::exit(1);
    });
    clap_complete::generate(
        shell,
        &mut Cli::command(),
        "sensectl",
        &mut std::io::stdout(),
    );
}
