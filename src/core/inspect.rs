// src/core/inspect.rs

//! Introspection over components: normalized argument specs, source
//! locations and descriptive info used by help output.

use crate::models::{ClassKind, Component, Param, RoutineKind, Signature, SourceLocation};
use std::collections::HashMap;

/// Normalized description of what a callable accepts.
///
/// `defaults` aligns to the tail of `args`: the last `defaults.len()`
/// entries of `args` are optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgSpec {
    pub args: Vec<String>,
    pub defaults: Vec<Component>,
    pub varargs: Option<String>,
    pub varkw: Option<String>,
    pub kwonlyargs: Vec<String>,
    pub kwonlydefaults: Vec<(String, Component)>,
    pub annotations: HashMap<String, String>,
}

impl ArgSpec {
    /// Number of leading positional parameters without a default.
    pub fn num_required(&self) -> usize {
        self.args.len().saturating_sub(self.defaults.len())
    }

    /// Default for the positional parameter at `index`, if it has one.
    pub fn default_for(&self, index: usize) -> Option<&Component> {
        index
            .checked_sub(self.num_required())
            .and_then(|i| self.defaults.get(i))
    }

    pub fn kwonly_default(&self, name: &str) -> Option<&Component> {
        self.kwonlydefaults
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Keyword-only parameters without a default.
    pub fn required_kwonly(&self) -> impl Iterator<Item = &String> {
        self.kwonlyargs
            .iter()
            .filter(|name| self.kwonly_default(name).is_none())
    }

    /// True when `name` is a positional or keyword-only parameter.
    pub fn accepts_name(&self, name: &str) -> bool {
        self.args.iter().any(|a| a == name) || self.kwonlyargs.iter().any(|a| a == name)
    }

    fn from_signature(signature: &Signature, skip_receiver: bool) -> Self {
        let params: &[Param] = if skip_receiver {
            signature.params.get(1..).unwrap_or(&[])
        } else {
            &signature.params
        };
        let mut annotations = HashMap::new();
        for param in params.iter().chain(&signature.kwonly) {
            if let Some(annotation) = &param.annotation {
                annotations.insert(param.name.clone(), annotation.clone());
            }
        }
        Self {
            args: params.iter().map(|p| p.name.clone()).collect(),
            defaults: params.iter().filter_map(|p| p.default.clone()).collect(),
            varargs: signature.varargs.clone(),
            varkw: signature.varkw.clone(),
            kwonlyargs: signature.kwonly.iter().map(|p| p.name.clone()).collect(),
            kwonlydefaults: signature
                .kwonly
                .iter()
                .filter_map(|p| p.default.clone().map(|d| (p.name.clone(), d)))
                .collect(),
            annotations,
        }
    }

    /// The spec reported for callables that cannot be introspected.
    fn opaque() -> Self {
        Self {
            varargs: Some("vars".to_string()),
            varkw: Some("kwargs".to_string()),
            ..Self::default()
        }
    }
}

/// Extracts the argument spec of a callable component.
///
/// Decorated routines report the signature of the routine they wrap; the
/// receiver of methods and constructors is dropped. Components that are
/// not callable have an empty spec.
pub fn get_arg_spec(component: &Component) -> ArgSpec {
    match component {
        Component::Routine(routine) => {
            let target = routine.innermost();
            match (&target.signature, target.kind) {
                (Some(signature), RoutineKind::Method | RoutineKind::ClassMethod) => {
                    ArgSpec::from_signature(signature, true)
                }
                (Some(signature), _) => ArgSpec::from_signature(signature, false),
                (None, _) => ArgSpec::opaque(),
            }
        }
        Component::Class(class) => match &class.kind {
            ClassKind::Plain {
                init: Some(signature),
                ..
            } => ArgSpec::from_signature(signature, true),
            ClassKind::Plain { init: None, .. } => ArgSpec::default(),
            ClassKind::Record { fields } => ArgSpec {
                args: fields.clone(),
                ..ArgSpec::default()
            },
        },
        Component::Object(object) => match &object.call {
            Some(call) => get_arg_spec(&Component::Routine(call.clone())),
            None => ArgSpec::default(),
        },
        _ => ArgSpec::default(),
    }
}

/// Where the component was defined, when known.
pub fn get_source_location(component: &Component) -> Option<SourceLocation> {
    match component {
        Component::Routine(routine) => routine
            .source
            .clone()
            .or_else(|| routine.innermost().source.clone()),
        Component::Class(class) => class.source.clone(),
        _ => None,
    }
}

/// Descriptive facts about a component, consumed by help and usage output.
#[derive(Debug, Clone, Default)]
pub struct Info {
    pub type_name: String,
    pub string_form: Option<String>,
    pub docstring: Option<String>,
    pub source: Option<SourceLocation>,
    pub length: Option<usize>,
}

pub fn info(component: &Component) -> Info {
    let docstring = match component {
        Component::Routine(routine) => routine
            .doc
            .clone()
            .or_else(|| routine.innermost().doc.clone()),
        Component::Class(class) => class.doc.clone(),
        Component::Object(object) => object.doc.clone(),
        _ => None,
    };
    let length = match component {
        Component::List(items) | Component::Tuple(items) | Component::Set(items) => {
            Some(items.len())
        }
        Component::Dict(entries) => Some(entries.len()),
        Component::Record(record) => Some(record.fields.len()),
        Component::Str(s) => Some(s.chars().count()),
        _ => None,
    };
    let string_form = match component {
        Component::Routine(_) | Component::Class(_) => None,
        Component::Object(object) if !object.has_custom_str() => None,
        other => Some(other.to_string()),
    };
    Info {
        type_name: component.type_name(),
        string_form,
        docstring: docstring.map(|d| dedent(&d)),
        source: get_source_location(component),
        length,
    }
}

/// Removes the common indentation of all lines but the first.
pub fn dedent(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);
    let mut out = vec![first.to_string()];
    out.extend(
        rest.iter()
            .map(|line| line.get(indent..).unwrap_or("").trim_end().to_string()),
    );
    out.join("\n").trim().to_string()
}
