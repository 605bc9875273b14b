// src/fire.rs

//! The entry point: turns a component graph and a command line into output.

use crate::cli;
use crate::constants::HELP_FLAGS;
use crate::core::config_loader::Config;
use crate::core::decorators::Registry;
use crate::core::engine::{Engine, ResolveOptions};
use crate::core::error::FireError;
use crate::core::formatting;
use crate::core::helptext;
use crate::core::interact::{Embed, Repl};
use crate::core::literal;
use crate::core::output::{self, SerializeFn};
use crate::core::trace::FireTrace;
use crate::models::Component;
use std::io::Write;
use std::path::Path;

/// Runs a component graph as a command-line program.
///
/// ```no_run
/// use ignite::{Component, Fire};
///
/// let greeting: Component = "hello".into();
/// let result = Fire::new(greeting).run();
/// ```
pub struct Fire {
    component: Component,
    command: Option<Vec<String>>,
    name: Option<String>,
    serialize: Option<Box<SerializeFn>>,
    registry: Registry,
    config: Option<Config>,
    embedder: Box<dyn Embed>,
}

impl std::fmt::Debug for Fire {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fire")
            .field("component", &self.component)
            .field("command", &self.command)
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Fire {
    /// Fires `component` with the process arguments, named after the binary.
    pub fn new(component: impl Into<Component>) -> Self {
        Self {
            component: component.into(),
            command: None,
            name: None,
            serialize: None,
            registry: Registry::new(),
            config: None,
            embedder: Box::new(Repl),
        }
    }

    /// Uses `tokens` instead of the process arguments.
    pub fn command<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Uses a single command string, split with shell quoting rules.
    pub fn command_line(self, line: &str) -> Result<Self, FireError> {
        let tokens = shlex::split(line).ok_or_else(|| FireError::InvalidCommand(line.to_string()))?;
        Ok(self.command(tokens))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Passes every printed result through `serialize` first.
    pub fn serialize(mut self, serialize: impl Fn(&Component) -> Component + 'static) -> Self {
        self.serialize = Some(Box::new(serialize));
        self
    }

    /// Uses the parse functions and positional settings of `registry`.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Uses `config` instead of loading the configuration file.
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Replaces the REPL started by `--interactive`.
    pub fn embedder(mut self, embedder: impl Embed + 'static) -> Self {
        self.embedder = Box::new(embedder);
        self
    }

    /// Runs against stdout and stderr.
    pub fn run(self) -> Result<Component, FireError> {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        self.run_with(&mut stdout.lock(), &mut stderr.lock())
    }

    /// Runs and writes results to `out`, diagnostics and screens to `err`.
    ///
    /// # Logic:
    /// 1. Tokens before the first `--` drive the component graph; tokens after
    ///    it are forwarded flags.
    /// 2. Forwarded flags override the configuration file.
    /// 3. A usage error prints the usage text and exits with code 2. Trace and
    ///    help screens exit with code 0. Anything else prints the result.
    pub fn run_with(mut self, out: &mut dyn Write, err: &mut dyn Write) -> Result<Component, FireError> {
        let (tokens, name) = match self.command.take() {
            Some(tokens) => (tokens, self.name.take()),
            None => {
                let mut process_args = std::env::args();
                let program = process_args.next().as_deref().and_then(program_name);
                (process_args.collect(), self.name.take().or(program))
            }
        };

        let (front, forwarded) = literal::split_on_separator(&tokens, "--");
        let flags = cli::parse_flags(&forwarded)?;
        let config = match self.config.take() {
            Some(config) => config,
            None => Config::load()?,
        };
        formatting::apply_color_choice(config.color_choice());
        log::debug!("Firing {:?} with tokens {:?} and flags {:?}", name, front, flags);

        let options = ResolveOptions {
            name,
            separator: flags.separator.unwrap_or(config.separator),
            verbose: flags.verbose || config.verbose,
            show_help: flags.help,
            show_trace: flags.trace,
            interactive: flags.interactive,
            completion: flags
                .completion
                .map(|shell| shell.unwrap_or(config.completion_shell)),
        };

        let trace = Engine::new(&self.registry, self.embedder.as_mut()).resolve(
            self.component.clone(),
            front,
            &options,
        )?;
        self.finish(trace, out, err)
    }

    fn finish(&self, trace: FireTrace, out: &mut dyn Write, err: &mut dyn Write) -> Result<Component, FireError> {
        let result = trace.get_result().clone();
        let verbose = trace.verbose();

        if let Some(error) = trace.error() {
            let help_in_args = trace
                .elements()
                .last()
                .is_some_and(|element| element.args().iter().any(|arg| HELP_FLAGS.contains(&arg.as_str())));
            if help_in_args {
                let command = format!("{} -- --help", trace.get_command(true));
                let command = command.trim_start();
                let quoted = shlex::try_quote(command).map_or_else(|_| command.to_string(), |q| q.into_owned());
                writeln!(err, "{}", format!(t!("fire.info.help_shortcut"), command = quoted))?;
            }
            if help_in_args || trace.show_help() {
                writeln!(err, "{}", helptext::help_text(&result, Some(&trace), verbose, &self.registry))?;
            } else {
                writeln!(err, "{}{}", formatting::error(t!("fire.error_prefix")), error)?;
                writeln!(err, "{}", helptext::usage_text(&result, Some(&trace), verbose, &self.registry))?;
            }
            return Err(exit(2, trace));
        }

        if let Some(command) = trace.help_shortcut() {
            let quoted = shlex::try_quote(command).map_or_else(|_| command.to_string(), |q| q.into_owned());
            writeln!(err, "{}", format!(t!("fire.info.help_shortcut"), command = quoted))?;
            writeln!(err, "{}", helptext::help_text(&result, Some(&trace), verbose, &self.registry))?;
            return Err(exit(0, trace));
        }

        if trace.show_trace() {
            writeln!(err, "{}\n{}", t!("fire.trace_header"), trace)?;
            if trace.show_help() {
                writeln!(err)?;
                writeln!(err, "{}", helptext::help_text(&result, Some(&trace), verbose, &self.registry))?;
            }
            return Err(exit(0, trace));
        }

        if trace.show_help() {
            writeln!(err, "{}", helptext::help_text(&result, Some(&trace), verbose, &self.registry))?;
            return Err(exit(0, trace));
        }

        output::print_result(&result, &trace, self.serialize.as_deref(), &self.registry, out)?;
        Ok(result)
    }
}

fn exit(code: i32, trace: FireTrace) -> FireError {
    FireError::Exit {
        code,
        trace: Box::new(trace),
    }
}

fn program_name(arg0: &str) -> Option<String> {
    Path::new(arg0)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}
