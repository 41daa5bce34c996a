use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use sensectl::Bridge;
use sensectl::cli::{Cli, Command};
use sensectl::config::{self, TransportKind};
use sensectl::report::{AttributeReport, StatusReport};
use sensectl::sysfs::SysfsRoot;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::Completions { shell } = cli.command {
        sensectl::cli::print_completions(shell);
        return Ok(());
    }

    let bridge = open_bridge(&cli);

    match &cli.command {
        Command::List => cmd_list(&bridge, cli.json)?,
        Command::Get { attribute } => cmd_get(&bridge, attribute, cli.json)?,
        Command::Set { attribute, value } => cmd_set(&bridge, attribute, value, cli.emulate)?,
        Command::Status => cmd_status(&bridge, cli.json)?,
        Command::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// `RUST_LOG` wins unless `-v` was given.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("sensectl=debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_bridge(cli: &Cli) -> Bridge {
    let mut config = config::load(cli.config.as_ref());
    if cli.emulate {
        config.transport.kind = TransportKind::Emulated;
    }
    Bridge::open(&SysfsRoot::system(), &config)
}

fn cmd_list(bridge: &Bridge, json: bool) -> Result<()> {
    let attributes: Vec<AttributeReport> = bridge
        .attributes()
        .map(|attr| AttributeReport {
            name: attr.name().to_string(),
            feature: attr.feature(),
            writable: attr.writable(),
            status: attr.status(),
            value: None,
            error: None,
        })
        .collect();

    if json {
        sensectl::output::print_json(&attributes)?;
    } else {
        sensectl::output::print_attributes(&attributes);
    }
    Ok(())
}

fn cmd_get(bridge: &Bridge, attribute: &str, json: bool) -> Result<()> {
    let value = bridge
        .get(attribute)
        .with_context(|| format!("Failed to read {}", attribute))?;

    if json {
        sensectl::output::print_json(&serde_json::json!({
            "attribute": attribute,
            "value": value,
        }))?;
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn cmd_set(bridge: &Bridge, attribute: &str, value: &str, emulated: bool) -> Result<()> {
    if !emulated && !nix::unistd::geteuid().is_root() {
        anyhow::bail!("Must run as root: sudo sensectl set {} {}", attribute, value);
    }

    bridge
        .set(attribute, value)
        .with_context(|| format!("Failed to set {}", attribute))?;

    println!(
        "{} {} = {}",
        "Applied:".green().bold(),
        attribute,
        value.trim()
    );
    Ok(())
}

fn cmd_status(bridge: &Bridge, json: bool) -> Result<()> {
    let report = StatusReport::collect(bridge);

    if json {
        sensectl::output::print_json(&report)?;
    } else {
        sensectl::output::print_status(&report);
        if bridge.platform().is_generic() {
            println!();
            println!(
                "  {} No platform record matched. Only the platform profile is available.",
                "Note:".yellow()
            );
            println!(
                "  Add a {} entry to {} to describe this model.",
                "[[platform]]".cyan(),
                "/etc/sensectl/config.toml".cyan()
            );
        }
    }
    Ok(())
}
