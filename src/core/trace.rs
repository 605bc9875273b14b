// src/core/trace.rs

//! The execution trace: an append-only record of every resolution step.
//!
//! The trace is what help and error screens are rendered from, and it can
//! rebuild the command line that produced the current result.

use crate::core::error::UsageError;
use crate::core::inspect;
use crate::models::{Component, SourceLocation};
use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    InitialComponent,
    InstantiatedClass,
    CalledRoutine,
    CalledCallable,
    AccessedProperty,
    CompletionScript,
    InteractiveMode,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InitialComponent => "Initial component",
            Self::InstantiatedClass => "Instantiated class",
            Self::CalledRoutine => "Called routine",
            Self::CalledCallable => "Called callable",
            Self::AccessedProperty => "Accessed property",
            Self::CompletionScript => "Generated completion script",
            Self::InteractiveMode => "Entered interactive mode",
        };
        f.write_str(label)
    }
}

/// One resolution step.
#[derive(Debug, Clone)]
pub struct TraceElement {
    component: Component,
    action: Option<Action>,
    target: Option<String>,
    args: Option<Vec<String>>,
    source: Option<SourceLocation>,
    error: Option<UsageError>,
    capacity: bool,
    separator: bool,
}

impl TraceElement {
    fn new(component: Component, action: Action) -> Self {
        Self {
            component,
            action: Some(action),
            target: None,
            args: None,
            source: None,
            error: None,
            capacity: false,
            separator: false,
        }
    }

    pub fn component(&self) -> &Component {
        &self.component
    }

    pub fn action(&self) -> Option<Action> {
        self.action
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The tokens this step consumed.
    pub fn args(&self) -> &[String] {
        self.args.as_deref().unwrap_or(&[])
    }

    pub fn error(&self) -> Option<&UsageError> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// True when the call left room for more arguments (a default was used
    /// or the callable is variadic).
    pub fn has_capacity(&self) -> bool {
        self.capacity
    }

    pub fn has_separator(&self) -> bool {
        self.separator
    }
}

impl fmt::Display for TraceElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "{}", error);
        }
        if let Some(action) = self.action {
            write!(f, "{}", action)?;
        }
        if let Some(target) = &self.target {
            write!(f, " \"{}\"", target)?;
        }
        if let Some(source) = &self.source {
            match source.line {
                Some(line) => write!(f, " ({}:{})", source.file, line)?,
                None => write!(f, " ({})", source.file)?,
            }
        }
        Ok(())
    }
}

/// The ordered record of a single resolution.
#[derive(Debug, Clone)]
pub struct FireTrace {
    name: Option<String>,
    separator: String,
    elements: Vec<TraceElement>,
    verbose: bool,
    show_help: bool,
    show_trace: bool,
    help_shortcut: Option<String>,
}

impl FireTrace {
    pub fn new(
        initial: Component,
        name: Option<String>,
        separator: &str,
        verbose: bool,
        show_help: bool,
        show_trace: bool,
    ) -> Self {
        Self {
            name,
            separator: separator.to_string(),
            elements: vec![TraceElement::new(initial, Action::InitialComponent)],
            verbose,
            show_help,
            show_trace,
            help_shortcut: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    pub fn elements(&self) -> &[TraceElement] {
        &self.elements
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn show_trace(&self) -> bool {
        self.show_trace
    }

    /// When help was requested by a `-h`/`--help` front token rather than a
    /// forwarded flag: the equivalent command with the flag forwarded.
    pub fn help_shortcut(&self) -> Option<&str> {
        self.help_shortcut.as_deref()
    }

    pub(crate) fn request_help(&mut self) {
        self.show_help = true;
        let command = self.get_command(true);
        self.help_shortcut = Some(format!("{} -- --help", command).trim_start().to_string());
    }

    pub fn get_last_healthy_element(&self) -> &TraceElement {
        self.elements
            .iter()
            .rev()
            .find(|element| !element.has_error())
            .or_else(|| self.elements.first())
            .unwrap_or_else(|| unreachable!("the initial element is never removed"))
    }

    /// The component produced by the last successful step.
    pub fn get_result(&self) -> &Component {
        self.get_last_healthy_element().component()
    }

    pub fn has_error(&self) -> bool {
        self.elements.last().is_some_and(TraceElement::has_error)
    }

    pub fn error(&self) -> Option<&UsageError> {
        self.elements.last().and_then(TraceElement::error)
    }

    pub fn add_accessed_property(
        &mut self,
        component: Component,
        target: impl Into<String>,
        args: Vec<String>,
        source: Option<SourceLocation>,
    ) {
        let mut element = TraceElement::new(component, Action::AccessedProperty);
        element.target = Some(target.into());
        element.args = Some(args);
        element.source = source;
        self.elements.push(element);
    }

    pub fn add_called_component(
        &mut self,
        component: Component,
        target: impl Into<String>,
        args: Vec<String>,
        source: Option<SourceLocation>,
        capacity: bool,
        action: Action,
    ) {
        let mut element = TraceElement::new(component, action);
        element.target = Some(target.into());
        element.args = Some(args);
        element.source = source;
        element.capacity = capacity;
        self.elements.push(element);
    }

    pub fn add_completion_script(&mut self, script: String) {
        self.elements.push(TraceElement::new(
            Component::Str(script),
            Action::CompletionScript,
        ));
    }

    pub fn add_interactive_mode(&mut self) {
        self.elements
            .push(TraceElement::new(Component::None, Action::InteractiveMode));
    }

    pub fn add_error(&mut self, error: UsageError, args: Vec<String>) {
        log::debug!("Resolution failed: {}", error);
        let mut element = TraceElement::new(Component::None, Action::InitialComponent);
        element.action = None;
        element.error = Some(error);
        element.args = Some(args);
        self.elements.push(element);
    }

    /// Marks the last step as explicitly ended by a separator.
    pub fn add_separator(&mut self) {
        if let Some(last) = self.elements.last_mut() {
            last.separator = true;
        }
    }

    /// Whether the rebuilt command needs a trailing separator to end the
    /// last call before more tokens are appended.
    pub fn needs_separator(&self) -> bool {
        let element = self.get_last_healthy_element();
        element.has_capacity() && !element.has_separator()
    }

    /// Whether `--<flag>` would be consumed by the current component, so that
    /// the flag has to go after a `--`.
    pub fn needs_separating_hyphen_hyphen(&self, flag: &str) -> bool {
        let spec = inspect::get_arg_spec(self.get_result());
        spec.varkw.is_some() || spec.accepts_name(flag)
    }

    /// Rebuilds the command line that leads to the current result.
    pub fn get_command(&self, include_separators: bool) -> String {
        let mut args: Vec<&str> = Vec::new();
        if let Some(name) = &self.name {
            args.push(name);
        }
        for element in self.elements.iter().filter(|e| !e.has_error()) {
            args.extend(element.args().iter().map(String::as_str));
            if element.has_separator() && include_separators {
                args.push(&self.separator);
            }
        }
        if self.needs_separator() && include_separators {
            args.push(&self.separator);
        }
        args.into_iter()
            .map(quote_arg)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(text: &str) -> Cow<'_, str> {
    shlex::try_quote(text).unwrap_or(Cow::Borrowed(text))
}

/// Quotes one token; for `--flag=value` only the two halves are quoted.
fn quote_arg(arg: &str) -> String {
    if arg.starts_with("--")
        && let Some((prefix, value)) = arg.split_once('=')
    {
        return format!("{}={}", quote(prefix), quote(value));
    }
    quote(arg).into_owned()
}

impl fmt::Display for FireTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = self
            .elements
            .iter()
            .enumerate()
            .map(|(index, element)| format!("{}. {}", index + 1, element))
            .collect::<Vec<_>>();
        f.write_str(&lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    fn trace(initial: impl Into<Component>) -> FireTrace {
        FireTrace::new(initial.into(), None, "-", false, false, false)
    }

    #[test]
    fn test_initial_trace() {
        let t = trace(1);
        assert_eq!(t.get_result(), &Component::Int(1));
        assert_eq!(t.to_string(), "1. Initial component");
        assert!(!t.has_error());
    }

    #[test]
    fn test_result_tracks_last_healthy_element() {
        let mut t = trace("start");
        t.add_accessed_property("t".into(), "t", vec![], None);
        t.add_called_component(
            "result".into(),
            "cell",
            vec![],
            None,
            false,
            Action::CalledRoutine,
        );
        assert_eq!(t.get_result(), &Component::from("result"));
        t.add_error(UsageError::UnknownMember("x".into()), to_cli_params(&["x"]));
        assert!(t.has_error());
        assert_eq!(t.get_result(), &Component::from("result"));
    }

    #[test]
    fn test_rendering() {
        let mut t = trace("start");
        t.add_accessed_property(
            "t".into(),
            "t",
            vec![],
            Some(SourceLocation::new("sample.py", 12)),
        );
        t.add_called_component(
            "t".into(),
            "cell",
            vec![],
            Some(SourceLocation::new("sample.py", 20)),
            false,
            Action::CalledCallable,
        );
        t.add_completion_script("script".into());
        t.add_interactive_mode();
        t.add_error(UsageError::UnknownMember("x".into()), vec![]);
        assert_eq!(
            t.to_string(),
            "1. Initial component\n\
             2. Accessed property \"t\" (sample.py:12)\n\
             3. Called callable \"cell\" (sample.py:20)\n\
             4. Generated completion script\n\
             5. Entered interactive mode\n\
             6. Could not consume arg: x"
        );
    }

    #[test]
    fn test_get_command_quotes_arguments() {
        let mut t = trace("start");
        t.add_called_component(
            "result".into(),
            "cell",
            to_cli_params(&["example", "args"]),
            None,
            false,
            Action::CalledRoutine,
        );
        assert_eq!(t.get_command(true), "example args");

        let mut t = trace("start");
        t.add_called_component(
            "result".into(),
            "cell",
            to_cli_params(&["example", "spaced arg"]),
            None,
            false,
            Action::CalledRoutine,
        );
        assert_eq!(t.get_command(true), "example 'spaced arg'");

        let mut t = trace("start");
        t.add_called_component(
            "result".into(),
            "cell",
            to_cli_params(&["--example=spaced arg"]),
            None,
            false,
            Action::CalledRoutine,
        );
        assert_eq!(t.get_command(true), "--example='spaced arg'");
    }

    #[test]
    fn test_get_command_with_name_and_separators() {
        let mut t = FireTrace::new("start".into(), Some("tool".into()), "-", false, false, false);
        t.add_called_component(
            "result".into(),
            "cell",
            to_cli_params(&["a", "b"]),
            None,
            true,
            Action::CalledRoutine,
        );
        assert!(t.needs_separator());
        assert_eq!(t.get_command(true), "tool a b -");
        assert_eq!(t.get_command(false), "tool a b");

        t.add_separator();
        assert!(!t.needs_separator());
        t.add_accessed_property("x".into(), "upper", to_cli_params(&["upper"]), None);
        assert_eq!(t.get_command(true), "tool a b - upper");

        t.add_error(UsageError::UnknownMember("zzz".into()), to_cli_params(&["zzz"]));
        assert_eq!(t.get_command(true), "tool a b - upper");
    }
}
