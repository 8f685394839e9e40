use crate::output::OutputFormat;
use crate::policy::AccessMode;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    /// Workbook holding the catalog (overrides the config file)
    #[clap(long, value_parser, global = true)]
    pub data: Option<PathBuf>,

    /// Config file to use instead of the default locations
    #[clap(long, value_parser, global = true)]
    pub config: Option<PathBuf>,

    /// Access mode (overrides the config file)
    #[clap(long, value_enum, global = true)]
    pub mode: Option<AccessMode>,

    #[clap(long, value_parser, default_value_t = false, global = true)]
    pub verbose: bool,

    #[clap(long, value_parser, global = true)]
    pub log: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Default, Clone)]
pub struct AuthArgs {
    /// User id to log in with; prompts for the password if it is not given
    #[clap(long, value_parser)]
    pub user: Option<String>,

    #[clap(long, value_parser)]
    pub password: Option<String>,

    /// Embed key, for the embed access mode
    #[clap(long, value_parser)]
    pub embed_key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search performers and song titles
    Search {
        query: String,

        #[clap(flatten)]
        auth: AuthArgs,

        /// Treat the query as a case-insensitive regular expression
        #[clap(long, value_parser, default_value_t = false)]
        regex: bool,

        #[clap(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show the first rows of the catalog
    List {
        #[clap(long, value_parser)]
        limit: Option<usize>,

        #[clap(flatten)]
        auth: AuthArgs,

        #[clap(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Interactive search session with login and quota unlocks
    Session {
        #[clap(flatten)]
        auth: AuthArgs,

        #[clap(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Generate shell completions
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}
