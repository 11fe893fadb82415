//! Arbor - command line entry point
//!
//! `arbor run` loads a model description, runs it and prints the tables the
//! run produced; `arbor check` only loads and links it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use arbor::core::error::SimError;
use arbor::datastore::{DataStore, MemoryDataStore};
use arbor::links::resolve_links;
use arbor::loader::{LoadedSimulation, ModelRegistry, TreeLoader};
use arbor::models::summary;
use arbor::runner::Runner;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(about = "Assemble and run model trees described in TOML")]
struct Cli {
    /// Log filter directive, overriding the description's [run] log_filter
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, link and run a model description
    Run {
        /// Path to the TOML description
        file: PathBuf,

        /// Number of steps, overriding [run] steps
        #[arg(long)]
        steps: Option<u32>,

        /// Record failed steps and keep going instead of halting
        #[arg(long)]
        continue_on_error: bool,

        /// Print the outcome and tables as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load and link a description without running it
    Check {
        /// Path to the TOML description
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    outcome: &'a arbor::runner::RunOutcome,
    tables: Vec<JsonTable<'a>>,
}

#[derive(Serialize)]
struct JsonTable<'a> {
    name: String,
    #[serde(flatten)]
    table: &'a arbor::datastore::Table,
}

fn init_tracing(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(file: &Path) -> Result<LoadedSimulation, String> {
    let registry = ModelRegistry::with_builtins();
    TreeLoader::new(&registry)
        .load_file(file)
        .map_err(|e| format!("{}: {}", file.display(), e))
}

fn print_error(err: &SimError) {
    match err.root_cause() {
        SimError::UnresolvedLinks(links) => {
            eprintln!("{} unresolved link(s):", links.len());
            for link in links {
                eprintln!("  {}", link);
            }
        }
        _ => eprintln!("Error: {}", err),
    }
}

fn run(
    file: PathBuf,
    steps: Option<u32>,
    continue_on_error: bool,
    json: bool,
    log_filter: Option<String>,
) -> ExitCode {
    let loaded = match load(&file) {
        Ok(loaded) => loaded,
        Err(message) => {
            init_tracing(log_filter.as_deref().unwrap_or("arbor=info"));
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };
    let mut config = loaded.config;
    if let Some(filter) = log_filter {
        config.log_filter = filter;
    }
    if let Some(steps) = steps {
        config.steps = steps;
    }
    if continue_on_error {
        config.halt_on_step_error = false;
    }
    init_tracing(&config.log_filter);

    let mut runner = Runner::new(loaded.tree, config);
    let mut store = MemoryDataStore::new();
    let outcome = match runner.run(&mut store) {
        Ok(outcome) => outcome,
        Err(err) => {
            print_error(&err);
            return ExitCode::FAILURE;
        }
    };

    let simulation = outcome.simulation.clone();
    let names = store.table_names(&simulation);
    if json {
        let tables = names
            .iter()
            .filter_map(|name| {
                store.table(&simulation, name).map(|table| JsonTable {
                    name: name.clone(),
                    table,
                })
            })
            .collect();
        let output = JsonOutput {
            outcome: &outcome,
            tables,
        };
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: failed to serialize output: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        for name in &names {
            if name == summary::MESSAGES_TABLE {
                continue;
            }
            if let Some(table) = store.table(&simulation, name) {
                println!("== {} ==", name);
                println!("{}", table.to_text());
                println!();
            }
        }
        print!("{}", summary::render_log(&store, &simulation));
        println!(
            "\nRun {}: {} step(s), {} failed",
            outcome.run_id,
            outcome.steps_run,
            outcome.failed_steps.len()
        );
    }

    if outcome.failed_steps.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

fn check(file: PathBuf, log_filter: Option<String>) -> ExitCode {
    init_tracing(log_filter.as_deref().unwrap_or("arbor=warn"));
    let mut loaded = match load(&file) {
        Ok(loaded) => loaded,
        Err(message) => {
            eprintln!("Error: {}", message);
            return ExitCode::FAILURE;
        }
    };
    match resolve_links(&mut loaded.tree) {
        Ok(report) => {
            println!(
                "{}: {} node(s), {} link(s) bound, {} optional link(s) unbound",
                file.display(),
                loaded.tree.len(),
                report.bound,
                report.optional_unbound.len()
            );
            for (owner, slot) in &report.optional_unbound {
                println!("  optional: {} '{}'", owner, slot);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            print_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            file,
            steps,
            continue_on_error,
            json,
        } => run(file, steps, continue_on_error, json, cli.log_filter),
        Command::Check { file } => check(file, cli.log_filter),
    }
}
