// src/core/error.rs

use crate::core::config_loader::ConfigError;
use crate::core::trace::FireTrace;
use thiserror::Error;

/// A resolution-time diagnostic. Captured as the last element of the trace,
/// never raised past the boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("The function received no value for the required argument: {0}")]
    MissingArgument(String),
    #[error("The function received no value for the required argument: {0} (pass it as a flag: --{0}=VALUE)")]
    MissingFlagArgument(String),
    #[error(
        "The argument '{flag}' is ambiguous as it could refer to any of the following arguments: {}",
        .candidates.join(", ")
    )]
    AmbiguousFlag {
        flag: String,
        candidates: Vec<String>,
    },
    #[error("Unexpected kwargs present: {}", .0.join(", "))]
    UnexpectedKwargs(Vec<String>),
    #[error("Missing required flags: {}", .0.join(", "))]
    MissingFlags(Vec<String>),
    #[error("Unable to index into component with argument: {0}")]
    BadIndex(String),
    #[error("Cannot find key: {0}")]
    KeyNotFound(String),
    #[error("Could not consume arg: {0}")]
    UnknownMember(String),
    #[error("Could not consume arguments: {}", .0.join(" "))]
    UnconsumedArgs(Vec<String>),
}

/// Everything that can end a run without a result.
#[derive(Error, Debug)]
pub enum FireError {
    /// A controlled exit: a usage error (code 2) or a requested screen such as
    /// help, trace or completion (code 0). The trace explains why.
    #[error("ignite exited with code {code}")]
    Exit { code: i32, trace: Box<FireTrace> },
    /// An error raised by the user's own code, passed through untouched.
    #[error(transparent)]
    Component(#[from] anyhow::Error),
    #[error("The command could not be split into tokens: {0}")]
    InvalidCommand(String),
    #[error("Cannot make completion script without command name")]
    MissingName,
    #[error("Interactive session failed: {0}")]
    Interactive(#[source] anyhow::Error),
    #[error("Could not write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("Invalid forwarded flags: {0}")]
    Flags(#[from] clap::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FireError {
    /// The process exit status this outcome maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Exit { code, .. } => *code,
            Self::Flags(_) => 2,
            _ => 1,
        }
    }

    /// The trace of a controlled exit.
    pub fn trace(&self) -> Option<&FireTrace> {
        match self {
            Self::Exit { trace, .. } => Some(trace),
            _ => None,
        }
    }
}
