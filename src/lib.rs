//! ignite: turns an in-memory component graph into a command-line
//! interface. Tokens walk the graph: members are accessed, sequences
//! indexed and callables called with the arguments that follow them.

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

pub mod cli;
pub mod constants;
pub mod core;
pub mod fire;
pub mod models;

pub use crate::core::config_loader::Config;
pub use crate::core::decorators::{Registry, logged};
pub use crate::core::error::{FireError, UsageError};
pub use crate::core::interact::{Embed, NoEmbed, Repl, Session};
pub use crate::core::trace::FireTrace;
pub use crate::fire::Fire;
pub use crate::models::{CallArgs, Class, Component, Object, Record, Routine, Signature};
