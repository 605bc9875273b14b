// src/core/mod.rs

pub mod arg_parser;
pub mod completion;
pub mod config_loader;
pub mod decorators;
pub mod docstrings;
pub mod engine;
pub mod error;
pub mod formatting;
pub mod helptext;
pub mod inspect;
pub mod interact;
pub mod literal;
pub mod output;
pub mod parameters;
pub mod trace;
pub mod value_types;

#[cfg(test)]
pub(crate) mod test_components;
