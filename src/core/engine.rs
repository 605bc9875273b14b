// src/core/engine.rs

//! The resolution engine: walks a token stream against a component graph.
//!
//! Each step looks at the component in focus and tries, in order, to call
//! it (routines and classes), index into it (sequences), look a key up
//! (maps and records), access a member, or invoke its call operator. The
//! first handler that succeeds produces the next component; when none does,
//! the first failure is recorded as the trace's error. User code errors
//! raised while calling are returned untouched.

use crate::core::arg_parser;
use crate::core::completion::{self, Shell};
use crate::core::decorators::Registry;
use crate::core::error::{FireError, UsageError};
use crate::core::inspect;
use crate::core::interact::{Embed, Session};
use crate::core::parameters;
use crate::core::trace::{Action, FireTrace};
use crate::core::value_types;
use crate::models::{CallArgs, Component};

/// Switches that shape one resolution, usually taken from forwarded flags.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub name: Option<String>,
    pub separator: String,
    pub verbose: bool,
    pub show_help: bool,
    pub show_trace: bool,
    pub interactive: bool,
    pub completion: Option<Shell>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            name: None,
            separator: crate::constants::DEFAULT_SEPARATOR.to_string(),
            verbose: false,
            show_help: false,
            show_trace: false,
            interactive: false,
            completion: None,
        }
    }
}

impl ResolveOptions {
    fn wants_terminal_screen(&self) -> bool {
        self.show_help || self.show_trace || self.interactive || self.completion.is_some()
    }
}

/// What calling a component produced.
enum CallOutcome {
    Called {
        component: Component,
        remaining: Vec<String>,
    },
    Rejected(UsageError),
}

/// Resolves the engine over one component graph. Holds what stays fixed
/// for the whole resolution.
pub struct Engine<'a> {
    registry: &'a Registry,
    embedder: &'a mut dyn Embed,
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", self.registry)
            .finish_non_exhaustive()
    }
}

impl<'a> Engine<'a> {
    pub fn new(registry: &'a Registry, embedder: &'a mut dyn Embed) -> Self {
        Self { registry, embedder }
    }

    /// Runs `args` against `component`.
    ///
    /// Usage errors end up as the last element of the returned trace. Only
    /// errors raised by user code (and failures of the terminal screens)
    /// are returned as `Err`.
    pub fn resolve(
        &mut self,
        component: Component,
        args: Vec<String>,
        options: &ResolveOptions,
    ) -> Result<FireTrace, FireError> {
        let initial = component.clone();
        let mut trace = FireTrace::new(
            initial.clone(),
            options.name.clone(),
            &options.separator,
            options.verbose,
            options.show_help,
            options.show_trace,
        );
        let separator = options.separator.as_str();
        let mut component = component;
        let mut instance: Option<Component> = None;
        let mut remaining = args;
        let mut initial_args: Vec<String>;

        loop {
            let last_component = component.clone();
            initial_args = remaining.clone();
            log::debug!(
                "Resolving {} with tokens {:?}",
                component.type_name(),
                remaining
            );

            if remaining.is_empty() && options.wants_terminal_screen() {
                break;
            }
            if is_help_shortcut(&component, &remaining) {
                trace.request_help();
                remaining.clear();
                break;
            }

            // --- 1. Only tokens up to the next separator belong to this step ---
            let saved = match remaining.iter().position(|t| t == separator) {
                Some(index) => {
                    let saved = remaining.split_off(index + 1);
                    remaining.pop();
                    Some(saved)
                }
                None => None,
            };

            // --- 2. Handlers, in order ---
            let mut handled = false;
            let mut candidate_errors: Vec<(UsageError, Vec<String>)> = Vec::new();

            let command = match &component {
                Component::Class(class) => Some((class.name.clone(), Action::InstantiatedClass)),
                Component::Routine(routine) => Some((routine.name.clone(), Action::CalledRoutine)),
                _ => None,
            };
            if let Some((target, action)) = command {
                match self.call_and_update_trace(&component, &remaining, &mut trace, target, action)? {
                    CallOutcome::Called {
                        component: next,
                        remaining: rest,
                    } => {
                        component = next;
                        remaining = rest;
                        handled = true;
                    }
                    CallOutcome::Rejected(error) => {
                        trace.add_error(error, initial_args);
                        return Ok(trace);
                    }
                }
                if last_component.is_same(&initial) {
                    instance = Some(component.clone());
                }
            }

            if !handled
                && let Some(arg) = remaining.first().cloned()
                && matches!(
                    component,
                    Component::List(_) | Component::Tuple(_) | Component::Record(_)
                )
            {
                match index_into(&component, &arg) {
                    Some(item) => {
                        trace.add_accessed_property(item.clone(), arg.clone(), vec![arg], None);
                        component = item;
                        remaining.remove(0);
                        handled = true;
                    }
                    None => candidate_errors.push((UsageError::BadIndex(arg), initial_args.clone())),
                }
            }

            if !handled
                && let Some(arg) = remaining.first().cloned()
                && matches!(component, Component::Dict(_) | Component::Record(_))
            {
                match lookup_key(&component, &arg) {
                    Some(value) => {
                        trace.add_accessed_property(value.clone(), arg.clone(), vec![arg], None);
                        component = value;
                        remaining.remove(0);
                        handled = true;
                    }
                    None => candidate_errors.push((UsageError::KeyNotFound(arg), initial_args.clone())),
                }
            }

            if !handled && let Some(arg) = remaining.first().cloned() {
                match get_member(&component, &arg, options.verbose) {
                    Some((name, member)) => {
                        let source = inspect::get_source_location(&member);
                        trace.add_accessed_property(member.clone(), name, vec![arg], source);
                        component = member;
                        remaining.remove(0);
                        handled = true;
                    }
                    None => candidate_errors.push((UsageError::UnknownMember(arg), initial_args.clone())),
                }
            }

            if !handled
                && let Component::Object(object) = &component
                && object.call.is_some()
            {
                let target = object.class_name.clone();
                match self.call_and_update_trace(
                    &component,
                    &remaining,
                    &mut trace,
                    target,
                    Action::CalledCallable,
                )? {
                    CallOutcome::Called {
                        component: next,
                        remaining: rest,
                    } => {
                        component = next;
                        remaining = rest;
                        handled = true;
                    }
                    CallOutcome::Rejected(error) => {
                        trace.add_error(error, initial_args);
                        return Ok(trace);
                    }
                }
            }

            if !handled && let Some((error, args)) = candidate_errors.into_iter().next() {
                trace.add_error(error, args);
                return Ok(trace);
            }

            // --- 3. Give the saved tokens back ---
            if let Some(saved) = saved {
                if !remaining.is_empty() {
                    remaining.push(separator.to_string());
                    remaining.extend(saved);
                } else if value_types::is_command(&last_component) {
                    remaining = saved;
                    trace.add_separator();
                } else if !component.is_same(&last_component) {
                    remaining = std::iter::once(separator.to_string()).chain(saved).collect();
                } else {
                    remaining = saved;
                }
            }

            if component.is_same(&last_component) && remaining == initial_args {
                break;
            }
        }

        if !remaining.is_empty() {
            trace.add_error(UsageError::UnconsumedArgs(remaining), initial_args);
            return Ok(trace);
        }

        // --- 4. Terminal screens ---
        if let Some(shell) = options.completion {
            let name = options.name.as_deref().ok_or(FireError::MissingName)?;
            let script = completion::script(name, &initial, shell, options.verbose);
            trace.add_completion_script(script);
        }

        if options.interactive {
            let mut variables = Vec::new();
            if let Some(name) = &options.name {
                variables.push((name.clone(), initial.clone()));
            }
            variables.push(("component".to_string(), initial.clone()));
            variables.push(("result".to_string(), component.clone()));
            variables.push(("trace".to_string(), trace_component(&trace)));
            if let Some(instance) = instance {
                variables.push(("self".to_string(), instance));
            }
            self.embedder
                .embed(Session {
                    variables,
                    verbose: options.verbose,
                    registry: self.registry,
                })
                .map_err(FireError::Interactive)?;
            trace.add_interactive_mode();
        }

        Ok(trace)
    }

    /// Binds `args` to the callable and calls it, recording the call.
    fn call_and_update_trace(
        &self,
        component: &Component,
        args: &[String],
        trace: &mut FireTrace,
        target: String,
        action: Action,
    ) -> Result<CallOutcome, FireError> {
        let spec = inspect::get_arg_spec(component);
        let metadata = self.registry.metadata(component);
        let accepts_positional = self.registry.accepts_positional_args(component);
        let binding = match parameters::bind(args, &spec, &metadata, accepts_positional) {
            Ok(binding) => binding,
            Err(error) => return Ok(CallOutcome::Rejected(error)),
        };

        log::debug!("{} {}", action, target);
        let result = invoke(component, binding.call_args)?;
        trace.add_called_component(
            result.clone(),
            target,
            binding.consumed,
            inspect::get_source_location(component),
            binding.capacity,
            action,
        );
        Ok(CallOutcome::Called {
            component: result,
            remaining: binding.remaining,
        })
    }
}

/// Runs the user's code. Its errors pass through unchanged.
fn invoke(component: &Component, args: CallArgs) -> anyhow::Result<Component> {
    match component {
        Component::Routine(routine) => routine.call(args),
        Component::Class(class) => class.instantiate(args),
        Component::Object(object) => match &object.call {
            Some(call) => call.call(args),
            None => Ok(component.clone()),
        },
        other => Ok(other.clone()),
    }
}

/// `-h`/`--help` as the next token shows help, unless the component would
/// take it as an argument or a member.
fn is_help_shortcut(component: &Component, remaining: &[String]) -> bool {
    let Some(target) = remaining.first() else {
        return false;
    };
    if !crate::constants::HELP_FLAGS.contains(&target.as_str()) {
        return false;
    }
    if value_types::is_command(component) {
        let spec = inspect::get_arg_spec(component);
        match arg_parser::parse_keyword_args(remaining, &spec) {
            Ok(parsed) => parsed.remaining_kwargs.contains(target),
            Err(_) => false,
        }
    } else {
        !member_names(component).any(|name| name == target)
    }
}

fn index_into(component: &Component, arg: &str) -> Option<Component> {
    let index: i64 = arg.trim().replace('_', "").parse().ok()?;
    let items: Vec<&Component> = match component {
        Component::List(items) | Component::Tuple(items) => items.iter().collect(),
        Component::Record(record) => record.fields.iter().map(|(_, v)| v).collect(),
        _ => return None,
    };
    let len = i64::try_from(items.len()).ok()?;
    let position = if index < 0 { index + len } else { index };
    let position = usize::try_from(position).ok()?;
    items.get(position).map(|item| (*item).clone())
}

/// Exact key, then the underscore spelling, then any key whose text matches.
fn lookup_key(component: &Component, arg: &str) -> Option<Component> {
    let underscored = arg.replace('-', "_");
    match component {
        Component::Dict(entries) => {
            let by_str = |wanted: &str| {
                entries
                    .iter()
                    .find(|(k, _)| k.as_str() == Some(wanted))
                    .map(|(_, v)| v.clone())
            };
            by_str(arg).or_else(|| by_str(&underscored)).or_else(|| {
                entries
                    .iter()
                    .find(|(k, _)| k.to_string() == arg)
                    .map(|(_, v)| v.clone())
            })
        }
        Component::Record(record) => record
            .get(arg)
            .or_else(|| record.get(&underscored))
            .cloned(),
        _ => None,
    }
}

fn member_names(component: &Component) -> Box<dyn Iterator<Item = &str> + '_> {
    match component {
        Component::Object(object) => Box::new(object.members.iter().map(|(k, _)| k.as_str())),
        Component::Class(class) => Box::new(class.members.iter().map(|(k, _)| k.as_str())),
        Component::Record(record) => Box::new(record.fields.iter().map(|(k, _)| k.as_str())),
        _ => Box::new(std::iter::empty()),
    }
}

/// Member lookup trying the token as given, then with hyphens as
/// underscores; verbose mode also tries a leading underscore.
fn get_member(component: &Component, arg: &str, verbose: bool) -> Option<(String, Component)> {
    let underscored = arg.replace('-', "_");
    let mut candidates = vec![arg.to_string(), underscored.clone()];
    if verbose {
        candidates.push(format!("_{}", underscored));
    }
    let members: Vec<(String, Component)> = match component {
        Component::Object(object) => object.members.clone(),
        Component::Class(class) => class.members.clone(),
        Component::Record(record) => record.fields.clone(),
        _ => return None,
    };
    candidates.iter().find_map(|candidate| {
        members
            .iter()
            .find(|(name, _)| name == candidate)
            .cloned()
    })
}

/// The trace as offered to an interactive session.
fn trace_component(trace: &FireTrace) -> Component {
    let rendered = trace.to_string();
    crate::models::Object::new("FireTrace")
        .member("command", trace.get_command(true))
        .member(
            "elements",
            Component::list(
                trace
                    .elements()
                    .iter()
                    .map(|element| Component::from(element.to_string()))
                    .collect(),
            ),
        )
        .describe(move || rendered.clone())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interact::NoEmbed;
    use crate::core::test_components as tc;

    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    fn resolve_with(
        component: Component,
        params: &[&str],
        options: &ResolveOptions,
    ) -> Result<FireTrace, FireError> {
        let registry = Registry::new();
        let mut embedder = NoEmbed;
        Engine::new(&registry, &mut embedder).resolve(component, to_cli_params(params), options)
    }

    fn resolve(component: Component, params: &[&str]) -> FireTrace {
        resolve_with(component, params, &ResolveOptions::default()).unwrap()
    }

    fn result(component: Component, params: &[&str]) -> Component {
        let trace = resolve(component, params);
        assert!(!trace.has_error(), "unexpected error: {}", trace);
        trace.get_result().clone()
    }

    fn error(component: Component, params: &[&str]) -> UsageError {
        let trace = resolve(component, params);
        trace.error().cloned().expect("resolution should fail")
    }

    #[test]
    fn test_function_binding() {
        let f = tc::f_a_b();
        assert_eq!(result(f.clone(), &["5"]), Component::from("5 2"));
        assert_eq!(result(f.clone(), &["--b=9", "5"]), Component::from("5 9"));
        assert_eq!(
            error(f, &["--b=9"]),
            UsageError::MissingArgument("a".into())
        );
    }

    #[test]
    fn test_member_access_and_calls() {
        let root = tc::with_defaults();
        assert_eq!(result(root.clone(), &["double", "5"]), Component::Int(10));
        assert_eq!(result(root.clone(), &["double", "--count=4"]), Component::Int(8));
        assert_eq!(result(root.clone(), &["triple"]), Component::Int(0));
        assert_eq!(
            error(root, &["missing"]),
            UsageError::UnknownMember("missing".into())
        );
    }

    #[test]
    fn test_hyphens_reach_underscored_members() {
        let root = tc::underscores();
        assert_eq!(
            result(root.clone(), &["underscore-example"]),
            Component::from("fish fingers")
        );
        assert_eq!(
            result(root, &["underscore_function", "--underscore-arg=score"]),
            Component::from("score")
        );
    }

    #[test]
    fn test_sequence_indexing() {
        let numbers = tc::number_words();
        assert_eq!(result(numbers.clone(), &["-1"]), Component::from("three"));
        assert_eq!(result(numbers.clone(), &["0"]), Component::from("zero"));
        assert_eq!(
            error(numbers, &["4"]),
            UsageError::BadIndex("4".into())
        );
    }

    #[test]
    fn test_dict_and_record_lookup() {
        let dict = Component::dict(vec![
            ("long_key".into(), 1.into()),
            (Component::Int(7), "seven".into()),
        ]);
        assert_eq!(result(dict.clone(), &["long-key"]), Component::Int(1));
        assert_eq!(result(dict.clone(), &["7"]), Component::from("seven"));
        assert_eq!(error(dict, &["nope"]), UsageError::KeyNotFound("nope".into()));

        let point = tc::point(11, 22);
        assert_eq!(result(point.clone(), &["x"]), Component::Int(11));
        assert_eq!(result(point, &["1"]), Component::Int(22));
    }

    #[test]
    fn test_class_instantiation_uses_flags() {
        let class = tc::greeter_class();
        assert_eq!(
            result(class.clone(), &["--name=Ada", "greet"]),
            Component::from("Hello, Ada!")
        );
        assert_eq!(
            error(class, &["Ada", "greet"]),
            UsageError::MissingFlagArgument("name".into())
        );
    }

    #[test]
    fn test_bool_negation() {
        let f = tc::thing_nothing();
        assert_eq!(
            result(f.clone(), &["--thing", "--nonothing"]),
            Component::tuple(vec![true.into(), false.into()])
        );
        assert_eq!(
            error(f, &["--nothing", "--nonothing"]),
            UsageError::MissingArgument("thing".into())
        );
    }

    #[test]
    fn test_user_errors_propagate_unchanged() {
        let root = tc::with_defaults();
        let err = resolve_with(root, &["divide", "1", "0"], &ResolveOptions::default()).unwrap_err();
        match err {
            FireError::Component(inner) => {
                assert!(inner.downcast_ref::<tc::DivisionByZero>().is_some());
            }
            other => panic!("expected a component error, got {:?}", other),
        }
    }

    #[test]
    fn test_leftover_arguments() {
        let f = tc::f_a_b();
        assert_eq!(
            error(f, &["1", "2", "3"]),
            UsageError::UnknownMember("3".into())
        );
        let value: Component = 5.into();
        assert_eq!(error(value, &["x"]), UsageError::UnknownMember("x".into()));
    }

    #[test]
    fn test_varargs_and_separator_chaining() {
        let root = tc::varargs_object();
        let joined = result(root.clone(), &["cumsums", "1", "2", "3"]);
        assert_eq!(
            joined,
            Component::list(vec![1.into(), 3.into(), 6.into()])
        );
        assert_eq!(
            result(root.clone(), &["get-obj", "a", "b", "-", "as-bool", "True"])
                .to_string(),
            "True"
        );
        let trace = resolve(root, &["get-obj", "a", "b", "-", "as-bool", "True"]);
        assert_eq!(trace.get_command(true), "get-obj a b - as-bool True");
    }

    #[test]
    fn test_separator_without_pending_call_is_harmless() {
        let root = tc::with_defaults();
        assert_eq!(
            result(root.clone(), &["-", "-", "double", "2"]),
            Component::Int(4)
        );
        let class = tc::empty_class();
        assert!(!resolve(class, &["-", "-"]).has_error());
    }

    #[test]
    fn test_nested_path_records_one_element_per_level() {
        let root = tc::nested();
        let trace = resolve(root.clone(), &["child", "grandchild", "--value=3", "double"]);
        assert!(!trace.has_error(), "{}", trace);
        let actions: Vec<_> = trace.elements().iter().filter_map(|e| e.action()).collect();
        assert_eq!(
            actions,
            vec![
                Action::InitialComponent,
                Action::AccessedProperty,
                Action::CalledRoutine,
                Action::AccessedProperty,
                Action::CalledRoutine,
                Action::AccessedProperty,
            ]
        );
        assert_eq!(trace.get_result(), &Component::Int(6));
        let command = trace.get_command(true);
        let tokens = shlex::split(&command).unwrap();
        let again = resolve(root, &tokens.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(again.get_result(), trace.get_result());
    }

    #[test]
    fn test_help_shortcut() {
        let root = tc::with_defaults();
        let trace = resolve(root.clone(), &["--help"]);
        assert!(trace.show_help());
        assert_eq!(trace.help_shortcut(), Some("-- --help"));

        let trace = resolve(root, &["double", "-h"]);
        assert!(trace.show_help());
        assert!(!trace.has_error());

        // A parameter named `help` takes the flag instead.
        let trace = resolve(tc::takes_help(), &["--help=yes"]);
        assert!(!trace.show_help());
        assert_eq!(trace.get_result(), &Component::from("yes"));
    }

    #[test]
    fn test_terminal_flags_stop_before_final_call() {
        let options = ResolveOptions {
            show_help: true,
            ..ResolveOptions::default()
        };
        let trace = resolve_with(tc::with_defaults(), &["double"], &options).unwrap();
        assert!(matches!(trace.get_result(), Component::Routine(_)));
    }

    #[test]
    fn test_callable_objects() {
        let adder = tc::callable_adder();
        assert_eq!(result(adder.clone(), &["--x=2"]), Component::Int(3));
        assert_eq!(result(adder.clone(), &["offset"]), Component::Int(1));
        let trace = resolve(adder, &["--x=2"]);
        assert_eq!(
            trace.elements().last().and_then(|e| e.action()),
            Some(Action::CalledCallable)
        );
    }

    #[test]
    fn test_short_flags_and_ambiguity() {
        let f = tc::similar_args();
        assert_eq!(
            result(f.clone(), &["-g", "1"]),
            Component::tuple(vec![Component::None, 1.into(), Component::None])
        );
        assert!(matches!(
            error(f, &["-a", "1"]),
            UsageError::AmbiguousFlag { .. }
        ));
    }

    #[test]
    fn test_verbose_private_fallback() {
        let root = tc::with_private();
        assert_eq!(
            error(root.clone(), &["secret"]),
            UsageError::UnknownMember("secret".into())
        );
        assert_eq!(result(root.clone(), &["_secret"]), Component::Int(42));
        let options = ResolveOptions {
            verbose: true,
            ..ResolveOptions::default()
        };
        let trace = resolve_with(root, &["secret"], &options).unwrap();
        assert_eq!(trace.get_result(), &Component::Int(42));
    }

    #[test]
    fn test_completion_requires_name() {
        let options = ResolveOptions {
            completion: Some(Shell::Bash),
            ..ResolveOptions::default()
        };
        let err = resolve_with(tc::with_defaults(), &[], &options).unwrap_err();
        assert!(matches!(err, FireError::MissingName));

        let options = ResolveOptions {
            name: Some("tool".into()),
            ..options
        };
        let trace = resolve_with(tc::with_defaults(), &[], &options).unwrap();
        assert_eq!(
            trace.elements().last().and_then(|e| e.action()),
            Some(Action::CompletionScript)
        );
        assert!(trace.get_result().to_string().contains("complete -F"));
    }

    #[test]
    fn test_interactive_session_receives_variables() {
        struct Recorder(Vec<String>);
        impl Embed for Recorder {
            fn embed(&mut self, session: Session<'_>) -> anyhow::Result<()> {
                self.0 = session.variables.iter().map(|(k, _)| k.clone()).collect();
                Ok(())
            }
        }
        let registry = Registry::new();
        let mut recorder = Recorder(Vec::new());
        let options = ResolveOptions {
            interactive: true,
            name: Some("tool".into()),
            ..ResolveOptions::default()
        };
        let trace = Engine::new(&registry, &mut recorder)
            .resolve(tc::greeter_class(), to_cli_params(&["--name=Ada"]), &options)
            .unwrap();
        assert_eq!(recorder.0, vec!["tool", "component", "result", "trace", "self"]);
        assert_eq!(
            trace.elements().last().and_then(|e| e.action()),
            Some(Action::InteractiveMode)
        );
    }
}
