// src/core/interact.rs

//! Interactive mode: a small REPL over the variables of a finished resolution.

use crate::core::decorators::Registry;
use crate::core::engine::{Engine, ResolveOptions};
use crate::core::error::FireError;
use crate::core::output;
use crate::models::Component;
use anyhow::{Result, anyhow};
use colored::Colorize;
use dialoguer::{Input, theme::ColorfulTheme};
use std::io::Write;

/// What an interactive session gets to work with.
#[derive(Debug)]
pub struct Session<'a> {
    /// Named variables in the order they were bound.
    pub variables: Vec<(String, Component)>,
    pub verbose: bool,
    pub registry: &'a Registry,
}

impl Session<'_> {
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.variables
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }
}

/// Hands a finished resolution over to the user.
pub trait Embed {
    fn embed(&mut self, session: Session<'_>) -> Result<()>;
}

/// An embedder that only announces the session, for hosts without a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEmbed;

impl Embed for NoEmbed {
    fn embed(&mut self, session: Session<'_>) -> Result<()> {
        log::debug!(
            "Interactive mode skipped for {} variables",
            session.variables.len()
        );
        Ok(())
    }
}

/// A line-oriented REPL. Each line starts with a variable name and is
/// resolved against that variable: `result double 3`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Repl;

impl Embed for Repl {
    fn embed(&mut self, session: Session<'_>) -> Result<()> {
        println!("{}", available_string(&session.variables, session.verbose));
        loop {
            let line: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt(">>>")
                .allow_empty(true)
                .interact_text()
                .map_err(|e| anyhow!(e))?;
            let line = line.trim();
            if line.is_empty() || line == "exit" {
                return Ok(());
            }
            let mut stdout = std::io::stdout();
            if let Err(e) = evaluate(&session, line, &mut stdout) {
                println!("{}", format!("Error: {}", e).red());
            }
        }
    }
}

/// Resolves one REPL line and writes its result.
pub fn evaluate(session: &Session<'_>, line: &str, out: &mut dyn Write) -> Result<()> {
    let tokens = shlex::split(line).ok_or_else(|| anyhow!("Unbalanced quotes in '{}'", line))?;
    let Some((head, rest)) = tokens.split_first() else {
        return Ok(());
    };
    let component = session
        .get(head)
        .cloned()
        .ok_or_else(|| anyhow!("Unknown variable '{}'", head))?;

    let options = ResolveOptions {
        name: Some(head.clone()),
        verbose: session.verbose,
        ..ResolveOptions::default()
    };
    let mut nested = NoEmbed;
    let trace = match Engine::new(session.registry, &mut nested).resolve(
        component,
        rest.to_vec(),
        &options,
    ) {
        Ok(trace) => trace,
        Err(FireError::Component(e)) => return Err(e),
        Err(e) => return Err(anyhow!("{}", e)),
    };
    if let Some(error) = trace.error() {
        return Err(anyhow!("{}", error));
    }
    output::print_result(trace.get_result(), &trace, None, session.registry, out)?;
    Ok(())
}

/// The banner printed before the prompt. Names with `-` or `/` cannot be
/// typed as variables and are left out.
pub fn available_string(variables: &[(String, Component)], verbose: bool) -> String {
    let mut names: Vec<&str> = variables
        .iter()
        .map(|(name, _)| name.as_str())
        .filter(|name| verbose || !name.starts_with('_'))
        .filter(|name| !name.contains('-') && !name.contains('/'))
        .collect();
    names.sort_unstable();
    let listing = if names.is_empty() {
        String::new()
    } else {
        format!("Objects: {}", names.join(", "))
    };
    format!("{}\n{}\n", t!("fire.repl.banner"), listing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_components as tc;

    fn session(registry: &Registry) -> Session<'_> {
        Session {
            variables: vec![
                ("component".into(), tc::with_defaults()),
                ("result".into(), tc::number_words()),
                ("my-tool".into(), Component::None),
                ("_private".into(), Component::None),
            ],
            verbose: false,
            registry,
        }
    }

    #[test]
    fn test_available_string() {
        let registry = Registry::new();
        let session = session(&registry);
        assert_eq!(
            available_string(&session.variables, false),
            "ignite is starting a REPL with the following objects:\nObjects: component, result\n"
        );
        assert!(available_string(&session.variables, true).contains("_private, component"));
    }

    #[test]
    fn test_evaluate_resolves_against_variable() {
        colored::control::set_override(false);
        let registry = Registry::new();
        let session = session(&registry);
        let mut out = Vec::new();
        evaluate(&session, "component double 21", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "42\n");

        let mut out = Vec::new();
        evaluate(&session, "result -1", &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "three\n");
    }

    #[test]
    fn test_evaluate_reports_problems() {
        let registry = Registry::new();
        let session = session(&registry);
        let mut out = Vec::new();
        let err = evaluate(&session, "missing 1", &mut out).unwrap_err();
        assert_eq!(err.to_string(), "Unknown variable 'missing'");

        let err = evaluate(&session, "result 9", &mut out).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unable to index into component with argument: 9"
        );

        let err = evaluate(&session, "component divide 1 0", &mut out).unwrap_err();
        assert!(err.downcast_ref::<tc::DivisionByZero>().is_some());
    }
}
