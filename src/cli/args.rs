// src/cli/args.rs

use crate::core::completion::Shell;
use clap::Parser;

/// Flags that follow the `--` of a command line and control the run itself
/// instead of the component graph.
#[derive(Parser, Debug, Default, Clone, PartialEq, Eq)]
#[command(
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true,
    args_override_self = true
)]
pub struct FlagArgs {
    /// Include private members in help, completion and the REPL.
    #[arg(long, short)]
    pub verbose: bool,

    /// Drop into a REPL once the command has been resolved.
    #[arg(long, short)]
    pub interactive: bool,

    /// The token that ends the arguments of one call. Defaults to '-'.
    #[arg(long)]
    pub separator: Option<String>,

    /// Print a completion script for the command instead of running it.
    /// Without a shell, the configured one is used.
    #[arg(long, value_enum, num_args = 0..=1)]
    pub completion: Option<Option<Shell>>,

    /// Show the help screen of the resolved component.
    #[arg(long, short)]
    pub help: bool,

    /// Show the resolution trace.
    #[arg(long, short)]
    pub trace: bool,
}
