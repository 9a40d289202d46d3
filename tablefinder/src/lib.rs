//! Library module for the `tablefinder` binary.
//!
//! Argument parsing, connection URL assembly and search configuration live
//! here so they can be tested without a database. `main.rs` drives the run.

pub mod console;
pub mod output;
pub mod progress;

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tablefinder_core::config::{
    ConnectionConfig, DEFAULT_MSSQL_PORT, MAX_POOL_SIZE, SearchConfig, WildcardMode, parse_skip_list,
};
use tablefinder_core::error::TableFinderError;
use tablefinder_core::models::DatabaseType;
use tablefinder_core::search::UnsearchableTypes;
use zeroize::Zeroizing;

/// Environment variables used to assemble a SQL Server URL when no
/// `--database-url` / `DATABASE_URL` is given.
pub const ENV_HOST: &str = "DATABASE__HOST";
pub const ENV_PORT: &str = "DATABASE__PORT";
pub const ENV_DATABASE: &str = "DATABASE__DATABASE";
pub const ENV_USER: &str = "DATABASE__USER";
pub const ENV_PASSWORD: &str = "DATABASE__PASSWORD";

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "tablefinder")]
#[command(about = "Search every table and column of a database for a value")]
#[command(version)]
#[command(long_about = "
TableFinder - locate a value in an undocumented database

Every base table is listed, every searchable column is queried with a
COUNT and the columns holding the value are reported with sample values.
All statements are read-only SELECTs and the search value is always bound
as a parameter.

CONNECTION:
  --database-url / DATABASE_URL, or the DATABASE__HOST, DATABASE__PORT,
  DATABASE__DATABASE, DATABASE__USER and DATABASE__PASSWORD variables
  (SQL Server).

SUPPORTED DATABASES:
- SQL Server (mssql:// or sqlserver://)
- PostgreSQL (postgres://)
- MySQL (mysql://) [if compiled with --features mysql]
- SQLite (sqlite:// or .db/.sqlite files)

EXAMPLES:
  tablefinder                                  # prompts for the search value
  tablefinder \"John Doe\"
  tablefinder 12345 --exact
  tablefinder ACME --case-sensitive --table-pattern \"ny%\"
  tablefinder value --start-from cmem --skip-tables cmlog,temp
  tablefinder value --stop-on-first --output results.json
  tablefinder -- test                          # search for the word \"test\"
  tablefinder test                             # only check connectivity
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Command>,

    /// Value to search for (prompted for when omitted)
    pub search_value: Option<String>,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Save results to a JSON file
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Compress the JSON output with Zstandard
    #[arg(long, requires = "output")]
    pub compress: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Available subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check connectivity and catalog access without searching
    Test,
}

/// How the value is matched and which tables are visited.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Match the whole column value instead of a substring
    #[arg(long)]
    pub exact: bool,

    /// Compare case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// SQL LIKE pattern table names must satisfy (e.g. "ny%")
    #[arg(long, value_name = "PATTERN")]
    pub table_pattern: Option<String>,

    /// Search this table first, then all others
    #[arg(long, value_name = "TABLE")]
    pub start_from: Option<String>,

    /// Comma-separated table names to leave out (e.g. "cmlog,temp")
    #[arg(long, value_name = "TABLES")]
    pub skip_tables: Option<String>,

    /// Stop after the first matching column
    #[arg(long)]
    pub stop_on_first: bool,

    /// Let % and _ in the value act as LIKE wildcards
    #[arg(long)]
    pub raw_wildcards: bool,

    /// Comma-separated extra column types to skip (e.g. "xml,text")
    #[arg(long, value_delimiter = ',', value_name = "TYPES")]
    pub skip_types: Vec<String>,

    /// Tables searched at once (pooled backends only)
    #[arg(long, default_value_t = 1, value_name = "N")]
    pub concurrency: usize,
}

/// Where and how to connect.
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Database connection string (credentials are redacted in logs)
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Per-query timeout in seconds
    #[arg(long, default_value_t = 30, value_name = "SECONDS")]
    pub query_timeout: u64,

    /// Prompt for the database password instead of reading it from the
    /// URL or environment
    #[arg(long)]
    pub password_prompt: bool,
}

/// Logging flags shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Resolves the connection string.
///
/// `--database-url` (or `DATABASE_URL`) wins; otherwise a SQL Server URL is
/// assembled from the `DATABASE__*` variables. `prompt_password` is only
/// called when `--password-prompt` is set or, for the environment route,
/// when `DATABASE__PASSWORD` is absent and prompting was requested.
///
/// # Security
///
/// - The prompted password is zeroized once embedded in the URL
/// - Error messages never include the password
///
/// # Errors
///
/// Returns a configuration error if required variables are missing, the
/// URL cannot hold a password, or the prompt fails.
pub fn resolve_database_url<F>(args: &ConnectionArgs, prompt_password: F) -> tablefinder_core::Result<String>
where
    F: FnOnce() -> tablefinder_core::Result<Zeroizing<String>>,
{
    if let Some(url) = args
        .database_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    {
        if args.password_prompt {
            let password = prompt_password()?;
            return inject_password(url, &password);
        }
        return Ok(url.to_string());
    }

    let env = EnvConnection::from_env()?;
    let password = match env.password {
        Some(password) if !args.password_prompt => password,
        _ if args.password_prompt => prompt_password()?,
        _ => {
            return Err(TableFinderError::configuration(format!(
                "Missing required environment variables: {}",
                ENV_PASSWORD
            )));
        }
    };

    assemble_mssql_url(&env.host, env.port, &env.database, &env.user, Some(&password))
}

/// Loads a `.env` file from the working directory or one of its parents.
///
/// Variables already present in the process environment are left alone.
/// Returns the path of the file that was read, or `None` when there is none.
///
/// # Errors
/// Returns a configuration error if the file exists but cannot be parsed.
pub fn load_env_file() -> tablefinder_core::Result<Option<PathBuf>> {
    env_file_outcome(dotenvy::dotenv())
}

/// Loads variables from the `.env`-format file at `path`.
///
/// # Errors
/// Returns a configuration error if the file exists but cannot be parsed.
pub fn load_env_file_from(path: &Path) -> tablefinder_core::Result<Option<PathBuf>> {
    env_file_outcome(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn env_file_outcome(
    result: dotenvy::Result<PathBuf>,
) -> tablefinder_core::Result<Option<PathBuf>> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        // Parse errors quote the offending line, which may hold a password
        Err(dotenvy::Error::LineParse(_, index)) => Err(TableFinderError::configuration(
            format!("Failed to parse .env file near character {}", index),
        )),
        Err(e) => Err(TableFinderError::configuration(format!(
            "Failed to read .env file: {}",
            e
        ))),
    }
}

/// Connection settings read from the `DATABASE__*` variables.
pub struct EnvConnection {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for EnvConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .finish()
    }
}

impl EnvConnection {
    /// Reads the variables, applying the host and port defaults.
    ///
    /// # Errors
    /// Returns a configuration error naming every missing variable, or if
    /// the port is not a number.
    pub fn from_env() -> tablefinder_core::Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database = read(ENV_DATABASE);
        let user = read(ENV_USER);
        let missing: Vec<&str> = [(ENV_DATABASE, &database), (ENV_USER, &user)]
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

        let (Some(database), Some(user)) = (database, user) else {
            return Err(TableFinderError::configuration(format!(
                "No database URL given and missing required environment variables: {}",
                missing.join(", ")
            )));
        };

        let port = match read(ENV_PORT) {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                TableFinderError::configuration(format!("{} must be a port number", ENV_PORT))
            })?,
            None => DEFAULT_MSSQL_PORT,
        };

        Ok(Self {
            host: read(ENV_HOST).unwrap_or_else(|| "localhost".to_string()),
            port,
            database,
            user,
            // Passwords are not trimmed
            password: std::env::var(ENV_PASSWORD)
                .ok()
                .filter(|p| !p.is_empty())
                .map(Zeroizing::new),
        })
    }
}

/// Builds an `mssql://` URL that trusts the server certificate.
///
/// User, password and database are percent-encoded.
///
/// # Errors
/// Returns a configuration error if the host is not a valid URL host.
pub fn assemble_mssql_url(
    host: &str,
    port: u16,
    database: &str,
    user: &str,
    password: Option<&str>,
) -> tablefinder_core::Result<String> {
    let mut url = url::Url::parse(&format!("mssql://{}:{}/", host, port)).map_err(|e| {
        TableFinderError::configuration(format!("Invalid {} '{}': {}", ENV_HOST, host, e))
    })?;

    url.set_username(user)
        .and_then(|()| url.set_password(password))
        .map_err(|()| TableFinderError::configuration("Cannot embed credentials in URL"))?;
    url.set_path(database);
    url.query_pairs_mut()
        .append_pair("TrustServerCertificate", "true");

    Ok(url.to_string())
}

/// Replaces the password of `connection_string`.
///
/// # Errors
/// Returns a configuration error if the string is not a URL with a host,
/// such as a bare SQLite file path.
pub fn inject_password(connection_string: &str, password: &str) -> tablefinder_core::Result<String> {
    let mut url = url::Url::parse(connection_string).map_err(|_| {
        TableFinderError::configuration("--password-prompt requires a URL-style connection string")
    })?;

    url.set_password(Some(password)).map_err(|()| {
        TableFinderError::configuration(format!(
            "{} connection strings cannot carry a password",
            url.scheme()
        ))
    })?;

    Ok(url.to_string())
}

/// Connection settings derived from the command line.
pub fn build_connection_config(args: &ConnectionArgs, search: &SearchArgs) -> ConnectionConfig {
    let max_connections = u32::try_from(search.concurrency)
        .unwrap_or(MAX_POOL_SIZE)
        .clamp(1, MAX_POOL_SIZE);
    ConnectionConfig::default()
        .with_query_timeout(Duration::from_secs(args.query_timeout.max(1)))
        .with_max_connections(max_connections)
}

/// Builds and validates the search configuration.
///
/// The unsearchable type list starts from the backend's defaults and is
/// extended with `--skip-types`.
///
/// # Errors
/// Returns a configuration error if validation fails, e.g. for an empty
/// value or a zero concurrency.
pub fn build_search_config(
    search_value: &str,
    args: &SearchArgs,
    database_type: DatabaseType,
) -> tablefinder_core::Result<SearchConfig> {
    let mut config = SearchConfig::new(search_value)
        .with_exact(args.exact)
        .with_case_sensitive(args.case_sensitive)
        .with_stop_on_first(args.stop_on_first)
        .with_wildcards(if args.raw_wildcards {
            WildcardMode::Raw
        } else {
            WildcardMode::Escaped
        })
        .with_unsearchable_types(
            UnsearchableTypes::for_database(database_type).with_additional(&args.skip_types),
        )
        .with_max_concurrency(args.concurrency);

    if let Some(pattern) = &args.table_pattern {
        config = config.with_table_pattern(pattern.clone());
    }
    if let Some(start) = &args.start_from {
        config = config.with_start_from(start.clone());
    }
    if let Some(skip) = &args.skip_tables {
        config = config.with_skip_tables(parse_skip_list(skip));
    }

    config.validate()?;
    Ok(config)
}

/// Returns the search value from the command line or `prompt`.
///
/// A value given on the command line is used as is. `prompt` runs when the
/// value is missing or empty, and only its reply is trimmed.
///
/// # Errors
/// Returns a configuration error if the resulting value is empty.
pub fn resolve_search_value<F>(given: Option<&str>, prompt: F) -> tablefinder_core::Result<String>
where
    F: FnOnce() -> tablefinder_core::Result<String>,
{
    let value = match given {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => prompt()?.trim().to_string(),
    };

    if value.is_empty() {
        return Err(TableFinderError::configuration(
            "Search value cannot be empty",
        ));
    }
    Ok(value)
}
