//! `mnemo` - categorized persistent memory for coding agents
//!
//! This binary exposes the memory store to an agent host (stdio or
//! WebSocket) and to people at a terminal (one subcommand per operation).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, WriteArgs};
use mnemo_core::memory::ops::{
    DeleteParams, ListParams, PruneParams, ReadParams, SearchParams, WriteParams,
};
use mnemo_core::config::CONFIG_FILE_NAME;
use mnemo_core::output::OutputFormatter;
use mnemo_core::protocol::operation_descriptors;
use mnemo_core::{MemoryConfig, MemoryRequest, MemoryStore, RequestHandler};

mod cli;
mod server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries protocol traffic when serving, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Runs before load so a broken config file can be replaced
    if let Commands::Init { global, force } = cli.command {
        return init_config(global, force, cli.dir.as_deref());
    }

    let mut config = MemoryConfig::load().context("Failed to load configuration")?;
    if let Some(dir) = &cli.dir {
        config.base_dir = mnemo_core::util::expand_home(dir);
    }

    let formatter = OutputFormatter::new();

    let request = match cli.command {
        Commands::Serve { ws, port } => {
            let store = Arc::new(MemoryStore::new(config));
            return if ws {
                server::start_server(port, store).await
            } else {
                server::stdio::serve_stdio(store).await
            };
        }
        Commands::Operations => {
            formatter.print_operations(&operation_descriptors());
            return Ok(());
        }
        Commands::Paths => {
            formatter.print_paths(&config.base_dir, MemoryConfig::locate().as_deref());
            return Ok(());
        }
        Commands::Init { .. } => unreachable!("handled before config load"),
        Commands::Read {
            category,
            key,
            limit,
        } => MemoryRequest::Read(ReadParams {
            category,
            key,
            limit,
        }),
        Commands::Write(args) => MemoryRequest::Write(write_params(args)),
        Commands::Search {
            query,
            categories,
            exact,
            threshold,
            limit,
        } => MemoryRequest::Search(SearchParams {
            query,
            categories: (!categories.is_empty()).then_some(categories),
            fuzzy: Some(!exact),
            threshold,
            limit,
        }),
        Commands::List {
            category,
            timestamps,
        } => MemoryRequest::List(ListParams {
            category,
            include_timestamps: timestamps,
        }),
        Commands::Delete {
            category,
            key,
            confirm,
        } => MemoryRequest::Delete(DeleteParams {
            category,
            key,
            confirm,
        }),
        Commands::Prune {
            category,
            max_age_days,
            max_entries,
            apply,
            confirm,
        } => MemoryRequest::Prune(PruneParams {
            category,
            max_age_days,
            max_entries,
            dry_run: Some(!apply),
            confirm,
        }),
    };

    let store = MemoryStore::new(config);
    let result = store.handle(request).await;
    formatter.print_result(&result, cli.json);

    if !result.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

fn init_config(global: bool, force: bool, dir: Option<&Path>) -> Result<()> {
    let path = if global {
        MemoryConfig::user_config_path().context("No user config directory on this platform")?
    } else {
        PathBuf::from(CONFIG_FILE_NAME)
    };

    let mut config = MemoryConfig::default();
    if let Some(dir) = dir {
        config.base_dir = dir.to_path_buf();
    }
    config
        .create(&path, force)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    println!("{}", path.display());
    Ok(())
}

fn write_params(args: WriteArgs) -> WriteParams {
    let mut params = WriteParams::new(args.category, args.key, args.value);
    params.reason = args.reason;
    params.context = args.context;
    params.wrong = args.wrong;
    params.correct = args.correct;
    params.frequency = args.frequency;
    params.files = (!args.files.is_empty()).then_some(args.files);
    params.alternatives_considered = (!args.alternatives.is_empty()).then_some(args.alternatives);
    params
}
