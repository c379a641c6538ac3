//! kbundle
//!
//! Command-line front end for maintaining and packing resource bundles

use clap::{Parser, Subcommand};
use kbundle::{Bundle, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Bundle could not be loaded
const EXIT_LOAD_FAILED: u8 = 2;
/// Command ran and failed
const EXIT_COMMAND_FAILED: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "kbundle")]
#[command(about = "Build, tag and pack Krita resource bundles")]
struct Args {
    /// Root directory of a bundle tree
    #[arg(short, long, value_name = "DIR", default_value = ".", env = "KBUNDLE_ROOT")]
    root: PathBuf,

    /// Log per-file detail (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rebuild the bundle manifest
    Update,

    /// List all entries in the manifest
    List {
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Zip a bundle tree into a bundle archive
    Pack {
        /// Output bundle file
        path: PathBuf,
    },

    /// Unzip a bundle archive into a bundle tree
    Unpack {
        /// Input bundle file
        path: PathBuf,
    },

    /// Inspect or modify resource tags
    Tag {
        #[command(subcommand)]
        command: TagCommand,
    },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    /// List tags
    Ls {
        /// Resource file
        path: PathBuf,
    },

    /// Add a tag
    Add {
        /// Tag to add
        tag: String,
        /// Resource file to tag
        path: PathBuf,
    },

    /// Remove a tag
    Remove {
        /// Tag to remove
        tag: String,
        /// Resource file to untag
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut bundle = Bundle::new(&args.root);

    // Unpacking targets a tree that may not exist yet
    if !matches!(args.command, Command::Unpack { .. }) {
        if let Err(e) = bundle.load() {
            error!("Failed to load bundle: {}", e);
            return ExitCode::from(EXIT_LOAD_FAILED);
        }
    }

    match run(&mut bundle, args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_COMMAND_FAILED)
        }
    }
}

fn run(bundle: &mut Bundle, command: Command) -> Result<()> {
    match command {
        Command::Update => {
            let report = bundle.update_manifest()?;
            info!(
                "Manifest updated: {} inserted, {} updated, {} removed",
                report.inserted.len(),
                report.updated.len(),
                report.removed.len()
            );
        }
        Command::List { json } => {
            if json {
                let entries: Vec<_> = bundle.manifest().entries().collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                println!("{}", bundle.manifest());
            }
        }
        Command::Pack { path } => {
            bundle.pack(&path)?;
            info!("Wrote {:?}", path);
        }
        Command::Unpack { path } => {
            let members = bundle.unpack(&path)?;
            info!("Extracted {} files into {:?}", members.len(), bundle.root());
        }
        Command::Tag { command } => match command {
            TagCommand::Ls { path } => print_tags(bundle, &path)?,
            TagCommand::Add { tag, path } => {
                bundle.add_tag(&path, &tag)?;
                print_tags(bundle, &path)?;
            }
            TagCommand::Remove { tag, path } => {
                bundle.remove_tag(&path, &tag)?;
                print_tags(bundle, &path)?;
            }
        },
    }

    Ok(())
}

fn print_tags(bundle: &Bundle, path: &Path) -> Result<()> {
    for tag in bundle.tags(path)? {
        println!("{}", tag);
    }
    Ok(())
}
