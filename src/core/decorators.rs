// src/core/decorators.rs

//! Per-callable parsing metadata: custom value parsers and whether a
//! callable accepts bare positional tokens.

use crate::core::literal;
use crate::models::{CallableId, Component, Routine};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::Level;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Converts a raw token into a value.
pub type ParseFn = Rc<dyn Fn(&str) -> Component>;

#[derive(Error, Debug)]
pub enum DecoratorError {
    #[error("Parsing metadata can only be attached to callables, got: {0}")]
    NotCallable(String),
    #[error("Invalid log level '{0}': expected debug, info, warning or error")]
    InvalidLogLevel(String),
}

/// Custom parsers for one callable. Positional parsers (by parameter index)
/// win over named ones, which win over the default parser.
#[derive(Clone, Default)]
pub struct ParseFns {
    pub default: Option<ParseFn>,
    pub positional: Vec<ParseFn>,
    pub named: HashMap<String, ParseFn>,
}

impl fmt::Debug for ParseFns {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseFns")
            .field("default", &self.default.is_some())
            .field("positional", &self.positional.len())
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub parse_fns: ParseFns,
    pub accepts_positional_args: Option<bool>,
}

impl Metadata {
    /// Picks the parser for a parameter and applies it.
    ///
    /// `annotation` is the declared type of the parameter, used when no
    /// custom parser applies.
    pub fn parse_value(
        &self,
        token: &str,
        index: Option<usize>,
        name: Option<&str>,
        annotation: Option<&str>,
    ) -> Component {
        let parse_fn = index
            .and_then(|i| self.parse_fns.positional.get(i))
            .or_else(|| name.and_then(|n| self.parse_fns.named.get(n)))
            .or(self.parse_fns.default.as_ref());
        match (parse_fn, annotation) {
            (Some(parse_fn), _) => parse_fn(token),
            (None, Some(annotation)) => parse_annotated(token, annotation),
            (None, None) => literal::parse_value(token),
        }
    }
}

/// Applies a declared parameter type; falls back to literal parsing when the
/// token does not fit the type.
///
/// # Logic:
/// - `str` and path types keep the raw token.
/// - `int` accepts integral numbers; any other token stays a string.
/// - `float` widens integers.
/// - `bool` understands `true/false`, `yes/no` and `1/0`.
/// - Dates, times and patterns are checked and kept as text in their
///   canonical form; a token that does not fit stays verbatim.
fn parse_annotated(token: &str, annotation: &str) -> Component {
    match annotation {
        "str" | "Path" | "pathlib.Path" | "PurePath" | "pathlib.PurePath" | "url" => {
            Component::Str(token.to_string())
        }
        "int" => match literal::parse_value(token) {
            value @ Component::Int(_) => value,
            Component::Float(f) if f.is_finite() && f.fract() == 0.0 => format!("{:.0}", f)
                .parse()
                .map_or_else(|_| Component::Str(token.to_string()), Component::Int),
            _ => {
                log::debug!("'{}' is not an int, keeping the raw token", token);
                Component::Str(token.to_string())
            }
        },
        "float" => match literal::parse_value(token) {
            Component::Int(i) => Component::Float(i as f64),
            other => other,
        },
        "bool" => match token.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Component::Bool(true),
            "false" | "no" | "0" => Component::Bool(false),
            _ => literal::parse_value(token),
        },
        "datetime" | "datetime.datetime" => canonical(token, annotation, parse_datetime),
        "date" | "datetime.date" => canonical(token, annotation, |t| {
            t.parse::<NaiveDate>().ok().map(|d| d.to_string())
        }),
        "time" | "datetime.time" => canonical(token, annotation, |t| {
            t.parse::<NaiveTime>().ok().map(|t| t.to_string())
        }),
        "Pattern" | "re.Pattern" | "typing.Pattern" => canonical(token, annotation, |t| {
            Regex::new(t).ok().map(|re| re.as_str().to_string())
        }),
        _ => literal::parse_value(token),
    }
}

fn canonical(token: &str, annotation: &str, parse: impl Fn(&str) -> Option<String>) -> Component {
    match parse(token) {
        Some(text) => Component::Str(text),
        None => {
            log::debug!("'{}' does not parse as {}, keeping the raw token", token, annotation);
            Component::Str(token.to_string())
        }
    }
}

/// ISO 8601 with either `T` or a space between date and time.
fn parse_datetime(token: &str) -> Option<String> {
    let normalized = token.replacen(' ', "T", 1);
    normalized
        .parse::<NaiveDateTime>()
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        .or_else(|| token.parse::<NaiveDate>().ok().map(|d| format!("{}T00:00:00", d)))
}

// --- Logging wrapper ---

/// Wraps `inner` so that a failed call is logged at `level` before the error
/// is passed on. Introspection still reports the signature of `inner`.
///
/// `level` is one of `debug`, `info`, `warn`/`warning` or `error`, in any case.
pub fn logged(inner: Rc<Routine>, level: &str) -> Result<Routine, DecoratorError> {
    let level = match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Level::Warn,
        other => match other.parse::<Level>() {
            Ok(level) if level != Level::Trace => level,
            _ => return Err(DecoratorError::InvalidLogLevel(level.to_string())),
        },
    };
    let name = inner.name.clone();
    let target = inner.clone();
    Ok(Routine::wrapping(&name, inner, move |args| {
        target.call(args).inspect_err(|e| {
            log::log!(level, "There was an exception in {}(): {}", target.name, e);
        })
    }))
}

/// Metadata attached to callables, keyed by callable identity.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<CallableId, Metadata>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, target: &Component) -> Result<&mut Metadata, DecoratorError> {
        let id = callable_id(target).ok_or_else(|| DecoratorError::NotCallable(target.repr()))?;
        Ok(self.entries.entry(id).or_default())
    }

    /// Uses `parse_fn` for the named parameters of `target`, or as its default
    /// parser when `names` is empty.
    pub fn set_parse_fn(
        &mut self,
        target: &Component,
        parse_fn: impl Fn(&str) -> Component + 'static,
        names: &[&str],
    ) -> Result<&mut Self, DecoratorError> {
        let parse_fn: ParseFn = Rc::new(parse_fn);
        let metadata = self.entry(target)?;
        if names.is_empty() {
            metadata.parse_fns.default = Some(parse_fn);
        } else {
            for name in names {
                metadata
                    .parse_fns
                    .named
                    .insert((*name).to_string(), parse_fn.clone());
            }
        }
        Ok(self)
    }

    /// Installs parsers by parameter position and by parameter name.
    pub fn set_parse_fns(
        &mut self,
        target: &Component,
        positional: Vec<ParseFn>,
        named: Vec<(&str, ParseFn)>,
    ) -> Result<&mut Self, DecoratorError> {
        let metadata = self.entry(target)?;
        metadata.parse_fns.positional = positional;
        metadata.parse_fns.named.extend(
            named
                .into_iter()
                .map(|(name, parse_fn)| (name.to_string(), parse_fn)),
        );
        Ok(self)
    }

    pub fn set_accepts_positional_args(
        &mut self,
        target: &Component,
        accepts: bool,
    ) -> Result<&mut Self, DecoratorError> {
        self.entry(target)?.accepts_positional_args = Some(accepts);
        Ok(self)
    }

    /// Metadata for `component`, empty when nothing was attached.
    pub fn metadata(&self, component: &Component) -> Metadata {
        callable_id(component)
            .and_then(|id| self.entries.get(&id))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether bare tokens may fill positional parameters of `component`.
    /// Classes and call operators default to flags only.
    pub fn accepts_positional_args(&self, component: &Component) -> bool {
        self.metadata(component)
            .accepts_positional_args
            .unwrap_or(matches!(component, Component::Routine(_)))
    }
}

fn callable_id(component: &Component) -> Option<CallableId> {
    match component {
        Component::Routine(routine) => Some(routine.id()),
        Component::Class(class) => Some(class.id()),
        Component::Object(object) => object.call.as_ref().map(|call| call.id()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallArgs, Class, Object, Signature};

    fn routine() -> Component {
        Routine::function("f", Signature::new().param("a").param("b"), |_| {
            Ok(Component::None)
        })
        .into()
    }

    #[test]
    fn test_parse_precedence() {
        let target = routine();
        let mut registry = Registry::new();
        registry
            .set_parse_fn(&target, |s| Component::from(format!("default:{s}")), &[])
            .unwrap()
            .set_parse_fns(
                &target,
                vec![Rc::new(|s: &str| Component::from(format!("pos:{s}")))],
                vec![("b", Rc::new(|s: &str| Component::from(format!("named:{s}"))))],
            )
            .unwrap();
        let metadata = registry.metadata(&target);
        assert_eq!(
            metadata.parse_value("1", Some(0), Some("a"), None),
            Component::from("pos:1")
        );
        assert_eq!(
            metadata.parse_value("1", Some(1), Some("b"), None),
            Component::from("named:1")
        );
        assert_eq!(
            metadata.parse_value("1", None, None, None),
            Component::from("default:1")
        );
    }

    #[test]
    fn test_annotations_and_literal_fallback() {
        let metadata = Metadata::default();
        assert_eq!(
            metadata.parse_value("5", None, None, Some("str")),
            Component::from("5")
        );
        assert_eq!(
            metadata.parse_value("5", None, None, Some("float")),
            Component::Float(5.0)
        );
        assert_eq!(
            metadata.parse_value("yes", None, None, Some("bool")),
            Component::Bool(true)
        );
        assert_eq!(metadata.parse_value("5", None, None, None), Component::Int(5));
    }

    #[test]
    fn test_accepts_positional_defaults() {
        let registry = Registry::new();
        assert!(registry.accepts_positional_args(&routine()));
        let class: Component = Class::without_init("C", || Ok(Component::None)).into();
        assert!(!registry.accepts_positional_args(&class));
        let callable: Component = Object::new("O")
            .callable(Routine::method("__call__", Signature::new(), |_| {
                Ok(Component::None)
            }))
            .into();
        assert!(!registry.accepts_positional_args(&callable));
    }

    #[test]
    fn test_override_and_non_callable_target() {
        let target = routine();
        let mut registry = Registry::new();
        registry.set_accepts_positional_args(&target, false).unwrap();
        assert!(!registry.accepts_positional_args(&target));
        assert!(registry
            .set_accepts_positional_args(&Component::Int(1), true)
            .is_err());
    }

    #[test]
    fn test_int_annotation() {
        let metadata = Metadata::default();
        assert_eq!(metadata.parse_value("7", None, None, Some("int")), Component::Int(7));
        assert_eq!(metadata.parse_value("7.0", None, None, Some("int")), Component::Int(7));
        assert_eq!(
            metadata.parse_value("7.5", None, None, Some("int")),
            Component::from("7.5")
        );
        assert_eq!(
            metadata.parse_value("seven", None, None, Some("int")),
            Component::from("seven")
        );
    }

    #[test]
    fn test_rich_annotations() {
        let metadata = Metadata::default();
        let parse = |token: &str, annotation: &str| metadata.parse_value(token, None, None, Some(annotation));

        assert_eq!(parse("123", "pathlib.Path"), Component::from("123"));
        assert_eq!(parse("[1, 2]", "url"), Component::from("[1, 2]"));
        assert_eq!(
            parse("2019-05-20 15:28:42", "datetime"),
            Component::from("2019-05-20T15:28:42")
        );
        assert_eq!(parse("2019-05-20", "datetime"), Component::from("2019-05-20T00:00:00"));
        assert_eq!(parse("2019-05-20", "date"), Component::from("2019-05-20"));
        assert_eq!(parse("15:28:42", "time"), Component::from("15:28:42"));
        assert_eq!(parse("not-a-date", "date"), Component::from("not-a-date"));
        assert_eq!(parse("^a+$", "Pattern"), Component::from("^a+$"));
        assert_eq!(parse("(", "re.Pattern"), Component::from("("));
    }

    // --- Logging wrapper ---

    thread_local! {
        static RECORDS: std::cell::RefCell<Vec<(Level, String)>> = const { std::cell::RefCell::new(Vec::new()) };
    }

    struct CaptureLogger;

    impl log::Log for CaptureLogger {
        fn enabled(&self, _: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            RECORDS.with(|r| r.borrow_mut().push((record.level(), record.args().to_string())));
        }

        fn flush(&self) {}
    }

    static CAPTURE: CaptureLogger = CaptureLogger;

    fn captured(level: Level) -> Vec<String> {
        RECORDS.with(|r| {
            r.borrow()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, message)| message.clone())
                .collect()
        })
    }

    fn divide() -> Rc<Routine> {
        Rc::new(Routine::function(
            "divide",
            Signature::new().param("x").param("y"),
            |args| {
                let x = args.require("x")?.as_f64().unwrap_or_default();
                let y = args.require("y")?.as_f64().unwrap_or_default();
                if y == 0.0 {
                    anyhow::bail!("division by zero");
                }
                Ok(Component::Float(x / y))
            },
        ))
    }

    fn call_args(x: i64, y: i64) -> CallArgs {
        CallArgs {
            positional: vec![x.into(), y.into()],
            names: vec!["x".into(), "y".into()],
            keywords: vec![],
        }
    }

    #[test]
    fn test_logged_reports_failures_and_passes_them_on() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Trace);

        let wrapped = logged(divide(), "WARNING").unwrap();
        assert_eq!(wrapped.call(call_args(6, 3)).unwrap(), Component::Float(2.0));
        assert!(captured(Level::Warn).is_empty());

        let error = wrapped.call(call_args(1, 0)).unwrap_err();
        assert_eq!(error.to_string(), "division by zero");
        assert_eq!(
            captured(Level::Warn),
            vec!["There was an exception in divide(): division by zero".to_string()]
        );
    }

    #[test]
    fn test_logged_keeps_inner_signature() {
        let wrapped: Component = logged(divide(), "info").unwrap().into();
        let spec = crate::core::inspect::get_arg_spec(&wrapped);
        assert_eq!(spec.args, vec!["x", "y"]);
    }

    #[test]
    fn test_logged_rejects_unknown_levels() {
        assert!(matches!(
            logged(divide(), "loud"),
            Err(DecoratorError::InvalidLogLevel(level)) if level == "loud"
        ));
        assert!(logged(divide(), "trace").is_err());
        assert!(logged(divide(), " Error ").is_ok());
    }
}
