use std::ffi::OsString;

use clap::{Parser, Subcommand};

/// Elm toolchain version manager.
///
/// Any command elmvm does not know is passed to the `elm` the current project
/// asks for, installing it first when needed.
#[derive(Parser, Debug)]
#[command(name = "elmvm", version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Log to stderr and to the debug log
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install a version (`latest`, exact or prefix such as `0.19`)
    Install { version: String },

    /// Remove an installed version
    Remove { version: String },

    /// List installed versions
    List {
        /// List installable versions instead
        #[arg(long)]
        remote: bool,
    },

    /// Show the version the current project resolves to
    Current,

    /// Query the registry and rewrite the version cache
    Refresh,

    /// Run npm inside the current project's Elm installation
    Npm {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },

    #[command(external_subcommand)]
    Elm(Vec<OsString>),
}
