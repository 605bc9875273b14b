// src/cli/mod.rs

//! Parsing of the forwarded flags, the tokens after the first `--`.

use clap::Parser;

pub mod args;

pub use args::FlagArgs;

const SWITCHES: [&str; 8] = [
    "--verbose",
    "-v",
    "--interactive",
    "-i",
    "--help",
    "-h",
    "--trace",
    "-t",
];

/// Parses forwarded flags, ignoring tokens that are not ignite flags.
///
/// # Logic:
/// Known switches pass through. `--separator` keeps its value (inline or
/// next token) and `--completion` keeps the next token only when it names
/// a shell. Combined short switches such as `-vt` are accepted. Everything
/// else is dropped with a debug log before clap sees the tokens.
pub fn parse_flags(tokens: &[String]) -> Result<FlagArgs, clap::Error> {
    let mut known = Vec::new();
    let mut iter = tokens.iter().peekable();
    while let Some(token) = iter.next() {
        let token = token.as_str();
        if SWITCHES.contains(&token) || token.starts_with("--separator=") || token.starts_with("--completion=") {
            known.push(token.to_string());
        } else if token == "--separator" {
            known.push(token.to_string());
            if let Some(value) = iter.next() {
                known.push(value.clone());
            }
        } else if token == "--completion" {
            known.push(token.to_string());
            if let Some(shell) = iter.next_if(|next| is_shell_name(next)) {
                known.push(shell.clone());
            }
        } else if is_short_switch_group(token) {
            known.push(token.to_string());
        } else {
            log::debug!("Ignoring unknown forwarded token '{}'", token);
        }
    }
    log::trace!("Forwarded flags kept for parsing: {:?}", known);
    FlagArgs::try_parse_from(&known)
}

fn is_shell_name(token: &str) -> bool {
    matches!(token, "bash" | "fish")
}

/// `-vit` and the like: every letter a short switch.
fn is_short_switch_group(token: &str) -> bool {
    token
        .strip_prefix('-')
        .filter(|letters| letters.len() > 1 && !letters.starts_with('-'))
        .is_some_and(|letters| letters.chars().all(|c| matches!(c, 'v' | 'i' | 'h' | 't')))
}
