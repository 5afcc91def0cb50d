use crate::config::{HOST_ENV, TOKEN_ENV};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "terraform-provider-waypoint")]
#[command(version)]
#[command(about = "Provider plugin managing HashiCorp Waypoint resources", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (logs go to stderr)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the plugin protocol on stdin/stdout
    Serve,

    /// Print the provider, resource and data source schemas as JSON
    Schema(SchemaArgs),

    /// Check that a Waypoint server is reachable with the given credentials
    Check(CheckArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct SchemaArgs {
    /// Only print the schema of this resource or data source type
    #[arg(long, value_name = "TYPE")]
    pub resource: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Waypoint server address
    #[arg(long, env = HOST_ENV)]
    pub host: Option<String>,

    /// Waypoint API token
    #[arg(long, env = TOKEN_ENV, hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}
