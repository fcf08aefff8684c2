//! Argument parsing, credential scope selection, and command dispatch.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ditto_telemetry::{LogFormat, LogLevel, LoggingConfig, init_logging};
use url::Url;
use uuid::Uuid;

use crate::client::{
    AppContext, ClientSettings, CliResult, CredentialScope, Credentials, DEFAULT_BASE_URL,
    DEFAULT_TIMEOUT_SECS, parse_url,
};
use crate::commands::connections::{
    handle_connection_create, handle_connection_delete, handle_connection_get,
    handle_connection_list,
};
use crate::commands::devops::{handle_config_get, handle_logging_get, handle_logging_update};
use crate::commands::permission::handle_permission_check;
use crate::commands::policies::{
    handle_policy_create, handle_policy_delete, handle_policy_entries, handle_policy_get,
};
use crate::commands::search::{handle_search_count, handle_search_query};
use crate::commands::things::{
    handle_thing_create, handle_thing_delete, handle_thing_diff, handle_thing_get,
    handle_thing_list, handle_thing_update,
};
use crate::commands::whoami::handle_whoami;
use crate::output::OutputFormat;

/// Parses CLI arguments, executes the requested command, and maps the outcome
/// to a process exit code.
pub async fn run() -> i32 {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.logging_config()) {
        eprintln!("warning: {err}");
    }
    if let Err(err) = dotenv {
        if !err.not_found() {
            tracing::warn!(error = %err, "failed to load .env file");
        }
    }

    let command_name = command_label(&cli.command);
    let correlation_id = Uuid::new_v4().to_string();
    tracing::debug!(command = command_name, correlation_id = %correlation_id, "starting command");

    match execute(cli, &correlation_id).await {
        Ok(()) => 0,
        Err(err) => {
            let exit_code = err.exit_code();
            tracing::debug!(command = command_name, exit_code, "command failed");
            eprintln!("error: {}", err.display_message());
            exit_code
        }
    }
}

async fn execute(cli: Cli, correlation_id: &str) -> CliResult<()> {
    let credentials = Credentials::from_env(credential_scope(&cli.command))?;
    let settings = ClientSettings {
        base_url: cli.base_url,
        timeout: Duration::from_secs(cli.http_timeout),
        output: OutputFormat::from_table_flag(cli.table),
    };
    let ctx = AppContext::connect(settings, &credentials, correlation_id)?;
    dispatch(&ctx, cli.command).await
}

async fn dispatch(ctx: &AppContext, command: Command) -> CliResult<()> {
    match command {
        Command::Thing(thing) => match thing {
            ThingCommand::Create(args) => handle_thing_create(ctx, args).await,
            ThingCommand::List(args) => handle_thing_list(ctx, args).await,
            ThingCommand::Get(args) => handle_thing_get(ctx, args).await,
            ThingCommand::Update(args) => handle_thing_update(ctx, args).await,
            ThingCommand::Diff(args) => handle_thing_diff(ctx, args).await,
            ThingCommand::Delete(args) => handle_thing_delete(ctx, args).await,
        },
        Command::Policy(policy) => match policy {
            PolicyCommand::Create(args) => handle_policy_create(ctx, args).await,
            PolicyCommand::Get(args) => handle_policy_get(ctx, args).await,
            PolicyCommand::Entries(args) => handle_policy_entries(ctx, args).await,
            PolicyCommand::Delete(args) => handle_policy_delete(ctx, args).await,
        },
        Command::Connection(connection) => match connection {
            ConnectionCommand::Create(args) => handle_connection_create(ctx, args).await,
            ConnectionCommand::List(args) => handle_connection_list(ctx, args).await,
            ConnectionCommand::Get(args) => handle_connection_get(ctx, args).await,
            ConnectionCommand::Delete(args) => handle_connection_delete(ctx, args).await,
        },
        Command::Search(search) => match search {
            SearchCommand::Query(args) => handle_search_query(ctx, args).await,
            SearchCommand::Count(args) => handle_search_count(ctx, args).await,
        },
        Command::Permission(PermissionCommand::Check(args)) => {
            handle_permission_check(ctx, args).await
        }
        Command::Devops(devops) => match devops {
            DevopsCommand::Config(ConfigCommand::Get) => handle_config_get(ctx).await,
            DevopsCommand::Logging(LoggingCommand::Get(args)) => {
                handle_logging_get(ctx, args).await
            }
            DevopsCommand::Logging(LoggingCommand::Update(args)) => {
                handle_logging_update(ctx, args).await
            }
        },
        Command::Whoami => handle_whoami(ctx).await,
    }
}

#[derive(Parser)]
#[command(
    name = "ditto",
    version,
    about = "Manage things, policies, and connections of an Eclipse Ditto instance"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "DITTO_BASE_URL",
        value_parser = parse_url,
        default_value = DEFAULT_BASE_URL
    )]
    base_url: Url,
    #[arg(
        long,
        global = true,
        env = "DITTO_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "Client-side HTTP timeout in seconds"
    )]
    http_timeout: u64,
    #[arg(
        short = 'l',
        long,
        global = true,
        value_enum,
        default_value_t = LogLevelArg::Warning
    )]
    loglevel: LogLevelArg,
    #[arg(long, global = true, value_enum, default_value_t = LogFormatArg::Pretty)]
    log_format: LogFormatArg,
    #[arg(
        long,
        global = true,
        help = "Render list and whoami output as a table instead of JSON"
    )]
    table: bool,
    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.loglevel.into(),
            format: self.log_format.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevelArg {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl From<LogLevelArg> for LogLevel {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Debug => Self::Debug,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Warning => Self::Warning,
            LogLevelArg::Error => Self::Error,
            LogLevelArg::Critical => Self::Critical,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Manage things.
    #[command(subcommand)]
    Thing(ThingCommand),
    /// Manage policies.
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Manage connections (devops credentials).
    #[command(subcommand)]
    Connection(ConnectionCommand),
    /// Search things.
    #[command(subcommand)]
    Search(SearchCommand),
    /// Check permissions on resources.
    #[command(subcommand)]
    Permission(PermissionCommand),
    /// Service configuration and logging (devops credentials).
    #[command(subcommand)]
    Devops(DevopsCommand),
    /// Show the authenticated user.
    Whoami,
}

#[derive(Subcommand)]
enum ThingCommand {
    /// Create a thing from a JSON file.
    Create(PayloadArgs),
    /// List things.
    List(ThingListArgs),
    /// Get a thing, optionally at a historical revision.
    Get(ThingGetArgs),
    /// Merge-patch a thing with the contents of a JSON file.
    Update(ThingUpdateArgs),
    /// Compare the current thing with a historical revision.
    Diff(ThingDiffArgs),
    /// Delete a thing.
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum PolicyCommand {
    /// Create a policy from a JSON file.
    Create(PayloadArgs),
    /// Get a policy.
    Get(IdArgs),
    /// List the entries of a policy.
    Entries(IdArgs),
    /// Delete a policy.
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum ConnectionCommand {
    /// Create a connection from a JSON file.
    Create(PayloadArgs),
    /// List connections.
    List(ConnectionListArgs),
    /// Get a connection.
    Get(ConnectionGetArgs),
    /// Delete a connection.
    Delete(DeleteArgs),
}

#[derive(Subcommand)]
enum SearchCommand {
    /// Search things with an RQL filter.
    Query(SearchQueryArgs),
    /// Count things matching an RQL filter.
    Count(SearchCountArgs),
}

#[derive(Subcommand)]
enum PermissionCommand {
    /// Check permissions described by a JSON request file.
    Check(PermissionCheckArgs),
}

#[derive(Subcommand)]
enum DevopsCommand {
    #[command(subcommand)]
    Config(ConfigCommand),
    #[command(subcommand)]
    Logging(LoggingCommand),
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Get the service configuration.
    Get,
}

#[derive(Subcommand)]
enum LoggingCommand {
    /// Get the logging configuration.
    Get(LoggingGetArgs),
    /// Update the logging configuration from a JSON file.
    Update(LoggingUpdateArgs),
}

#[derive(Args, Debug)]
pub(crate) struct IdArgs {
    pub(crate) id: String,
}

#[derive(Args, Debug)]
pub(crate) struct PayloadArgs {
    pub(crate) id: String,
    /// JSON file holding the resource body.
    pub(crate) file: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct DeleteArgs {
    pub(crate) id: String,
    /// Skip the confirmation prompt.
    #[arg(long)]
    pub(crate) confirm: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ThingListArgs {
    /// Comma-separated fields to include (e.g. `thingId,attributes`).
    #[arg(short = 'f', long)]
    pub(crate) fields: Option<String>,
    /// Comma-separated thing identifiers to retrieve.
    #[arg(long)]
    pub(crate) ids: Option<String>,
    /// Server-side request timeout (e.g. `30s`).
    #[arg(long)]
    pub(crate) timeout: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ThingGetArgs {
    pub(crate) id: String,
    /// Historical revision to retrieve.
    #[arg(long)]
    pub(crate) revision: Option<u64>,
}

#[derive(Args, Debug)]
pub(crate) struct ThingUpdateArgs {
    pub(crate) id: String,
    /// JSON file holding the merge patch.
    pub(crate) patch_file: PathBuf,
}

#[derive(Args, Debug)]
pub(crate) struct ThingDiffArgs {
    pub(crate) id: String,
    /// Historical revision to compare against.
    pub(crate) revision: u64,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ConnectionListArgs {
    /// Comma-separated fields to include (e.g. `id,connectionStatus,uri`).
    #[arg(long)]
    pub(crate) fields: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ConnectionGetArgs {
    pub(crate) id: String,
    #[arg(long)]
    pub(crate) fields: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SearchQueryArgs {
    /// RQL filter (e.g. `eq(attributes/location,"kitchen")`).
    #[arg(long)]
    pub(crate) filter: Option<String>,
    #[arg(long)]
    pub(crate) fields: Option<String>,
    #[arg(long)]
    pub(crate) namespaces: Option<String>,
    /// Search options (e.g. `size(10),sort(+thingId)`).
    #[arg(long)]
    pub(crate) option: Option<String>,
    #[arg(long)]
    pub(crate) timeout: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct SearchCountArgs {
    #[arg(long)]
    pub(crate) filter: Option<String>,
    #[arg(long)]
    pub(crate) namespaces: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct PermissionCheckArgs {
    pub(crate) request_file: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct LoggingGetArgs {
    #[arg(long)]
    pub(crate) module_name: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct LoggingUpdateArgs {
    pub(crate) update_file: PathBuf,
    #[arg(long)]
    pub(crate) module_name: Option<String>,
}

/// Devops and connection management require the administrative user.
const fn credential_scope(command: &Command) -> CredentialScope {
    match command {
        Command::Connection(_) | Command::Devops(_) => CredentialScope::DevOps,
        Command::Thing(_)
        | Command::Policy(_)
        | Command::Search(_)
        | Command::Permission(_)
        | Command::Whoami => CredentialScope::Ditto,
    }
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Thing(ThingCommand::Create(_)) => "thing_create",
        Command::Thing(ThingCommand::List(_)) => "thing_list",
        Command::Thing(ThingCommand::Get(_)) => "thing_get",
        Command::Thing(ThingCommand::Update(_)) => "thing_update",
        Command::Thing(ThingCommand::Diff(_)) => "thing_diff",
        Command::Thing(ThingCommand::Delete(_)) => "thing_delete",
        Command::Policy(PolicyCommand::Create(_)) => "policy_create",
        Command::Policy(PolicyCommand::Get(_)) => "policy_get",
        Command::Policy(PolicyCommand::Entries(_)) => "policy_entries",
        Command::Policy(PolicyCommand::Delete(_)) => "policy_delete",
        Command::Connection(ConnectionCommand::Create(_)) => "connection_create",
        Command::Connection(ConnectionCommand::List(_)) => "connection_list",
        Command::Connection(ConnectionCommand::Get(_)) => "connection_get",
        Command::Connection(ConnectionCommand::Delete(_)) => "connection_delete",
        Command::Search(SearchCommand::Query(_)) => "search_query",
        Command::Search(SearchCommand::Count(_)) => "search_count",
        Command::Permission(PermissionCommand::Check(_)) => "permission_check",
        Command::Devops(DevopsCommand::Config(ConfigCommand::Get)) => "devops_config_get",
        Command::Devops(DevopsCommand::Logging(LoggingCommand::Get(_))) => "devops_logging_get",
        Command::Devops(DevopsCommand::Logging(LoggingCommand::Update(_))) => {
            "devops_logging_update"
        }
        Command::Whoami => "whoami",
    }
}
