//! Database value finder.
//!
//! This binary connects to a database, walks every base table and every
//! searchable column, and reports which columns hold the requested value.
//!
//! # Security Guarantees
//! - Read-only database operations only
//! - The search value is always bound as a query parameter
//! - No credentials stored or logged

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tablefinder::console;
use tablefinder::output::save_report;
use tablefinder::progress::BarProgress;
use tablefinder::{
    Cli, Command, build_connection_config, build_search_config, load_env_file,
    resolve_database_url, resolve_search_value,
};
use tablefinder_core::adapters::{create_adapter, detect_database_type};
use tablefinder_core::error::{TableFinderError, redact_database_url};
use tablefinder_core::logging::init_logging;
use tablefinder_core::report::SearchReport;
use tablefinder_core::search::{TracingProgress, search_database};
use tracing::{debug, error, info};
use zeroize::Zeroizing;

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so `.env` can supply DATABASE_URL
    let env_file = match load_env_file() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    if let Some(path) = env_file {
        debug!("Loaded environment from {}", path.display());
    }

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("\nError: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    tablefinder_core::initialize_schema_validator()
        .context("Failed to initialize report validator")?;

    match cli.command {
        Some(Command::Test) => test_connection(cli).await,
        None => search(cli).await,
    }
}

/// Connects and reads the catalog without searching.
async fn test_connection(cli: &Cli) -> anyhow::Result<()> {
    let database_url = resolve_database_url(&cli.connection, prompt_password)?;
    info!("Testing connection to {}", redact_database_url(&database_url));

    let adapter = create_adapter(
        &database_url,
        build_connection_config(&cli.connection, &cli.search),
    )
    .await
    .context("Failed to create database adapter")?;

    adapter
        .test_connection()
        .await
        .context("Connection test failed")?;

    println!(
        "Connection to {} database successful",
        adapter.database_type()
    );
    Ok(())
}

async fn search(cli: &Cli) -> anyhow::Result<()> {
    let search_value = resolve_search_value(cli.search_value.as_deref(), prompt_search_value)?;

    let database_url = resolve_database_url(&cli.connection, prompt_password)?;
    let database_type = detect_database_type(&database_url)?;
    let config = build_search_config(&search_value, &cli.search, database_type)?;

    if !cli.global.quiet {
        print!("{}", console::format_header(&config));
        println!("Connecting to database...");
    }
    info!("Target: {}", redact_database_url(&database_url));

    let adapter = create_adapter(
        &database_url,
        build_connection_config(&cli.connection, &cli.search),
    )
    .await
    .context("Failed to create database adapter")?;

    // Pools connect lazily; fail here rather than once per table
    adapter
        .test_connection()
        .await
        .context("Failed to connect to database")?;

    if !cli.global.quiet {
        println!("Connected successfully!\n");
    }

    // Without a bar, per-table progress goes to the log
    let bar = (!cli.no_progress && !cli.global.quiet).then(BarProgress::new);
    let run = match &bar {
        Some(bar) => {
            let run = search_database(adapter.as_ref(), &config, bar).await;
            bar.finish();
            run
        }
        None => search_database(adapter.as_ref(), &config, &TracingProgress).await,
    }?;

    if !cli.global.quiet {
        print!("{}", console::format_selection(&run.selection));
        println!("\n{}", "=".repeat(80));
        println!("Search complete!");
        println!("{}", "=".repeat(80));
    }
    print!(
        "{}",
        console::format_results(&run.result, &config.search_value)
    );
    if !cli.global.quiet {
        print!("{}", console::format_footer(&run.result));
    }

    if let Some(output_path) = &cli.output {
        let report = SearchReport::new(&config, &run).with_database_type(adapter.database_type());
        save_report(&report, output_path, cli.compress)
            .await
            .with_context(|| format!("Failed to save results to {}", output_path.display()))?;
        println!("\nResults saved to: {}", output_path.display());
    }

    Ok(())
}

/// Interactive prompt used when no search value was given.
fn prompt_search_value() -> tablefinder_core::Result<String> {
    println!("\n{}", "=".repeat(80));
    println!("Database Table Value Finder - Interactive Mode");
    println!("{}\n", "=".repeat(80));

    dialoguer::Input::<String>::new()
        .with_prompt("Enter the value to search for")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| {
            TableFinderError::configuration(format!("Failed to read search value: {}", e))
        })
}

fn prompt_password() -> tablefinder_core::Result<Zeroizing<String>> {
    let password = rpassword::prompt_password("Database password: ")
        .map_err(|e| TableFinderError::io("Failed to read password", e))?;
    if password.is_empty() {
        return Err(TableFinderError::configuration("Password cannot be empty"));
    }
    Ok(Zeroizing::new(password))
}
