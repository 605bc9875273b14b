// src/core/parameters.rs

//! Binds command-line tokens to the parameters of a callable.

use crate::core::arg_parser::{self, KeywordArgs};
use crate::core::decorators::Metadata;
use crate::core::error::UsageError;
use crate::core::inspect::ArgSpec;
use crate::models::{CallArgs, Component};
use std::collections::VecDeque;

/// Arguments ready for a call, plus what happened to the tokens.
#[derive(Debug, Clone)]
pub struct Binding {
    pub call_args: CallArgs,
    /// The tokens this call used.
    pub consumed: Vec<String>,
    /// Tokens left for the next resolution step.
    pub remaining: Vec<String>,
    /// A default was used or the callable is variadic, so the call could
    /// have taken more arguments.
    pub capacity: bool,
}

/// Binds `args` against `spec`.
///
/// # Logic:
/// 1. Flags are extracted first (see [`arg_parser::parse_keyword_args`]).
/// 2. Each declared positional parameter takes its keyword value, else the
///    next bare token (when positional use is allowed), else its default.
///    A required parameter with nothing to take is an error.
/// 3. Required keyword-only parameters must have been given as flags.
/// 4. A variadic positional slot takes every bare token left.
/// 5. Leftover bare tokens and unclaimed flags are returned as `remaining`.
pub fn bind(
    args: &[String],
    spec: &ArgSpec,
    metadata: &Metadata,
    accepts_positional: bool,
) -> Result<Binding, UsageError> {
    let mut parsed = arg_parser::parse_keyword_args(args, spec)?;
    let mut bare: VecDeque<String> = std::mem::take(&mut parsed.remaining_args).into();
    let parse = |raw: &str, index: Option<usize>, name: Option<&str>| {
        let annotation = name
            .and_then(|n| spec.annotations.get(n))
            .map(String::as_str);
        metadata.parse_value(raw, index, name, annotation)
    };

    // --- 1. Declared positional parameters ---
    let mut positional = Vec::with_capacity(spec.args.len());
    let mut capacity = false;
    for (index, name) in spec.args.iter().enumerate() {
        let given = match parsed.take(name) {
            Some(raw) => Some(raw),
            None if accepts_positional => bare.pop_front(),
            None => None,
        };
        match given {
            Some(raw) => positional.push(parse(&raw, Some(index), Some(name))),
            None => match spec.default_for(index) {
                Some(default) => {
                    capacity = true;
                    positional.push(default.clone());
                }
                None if accepts_positional => {
                    return Err(UsageError::MissingArgument(name.clone()));
                }
                None => return Err(UsageError::MissingFlagArgument(name.clone())),
            },
        }
    }

    if spec.varargs.is_some() || spec.varkw.is_some() {
        capacity = true;
    }

    // --- 2. Keyword-only parameters and extra keywords ---
    let KeywordArgs {
        kwargs,
        remaining_kwargs,
        ..
    } = parsed;
    let extra: Vec<String> = kwargs
        .iter()
        .map(|(k, _)| k.clone())
        .filter(|k| !spec.kwonlyargs.contains(k))
        .collect();
    if spec.varkw.is_none() && !extra.is_empty() {
        return Err(UsageError::UnexpectedKwargs(extra));
    }
    let mut missing: Vec<String> = spec
        .required_kwonly()
        .filter(|name| !kwargs.iter().any(|(k, _)| k == *name))
        .cloned()
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(UsageError::MissingFlags(missing));
    }

    let mut keywords: Vec<(String, Component)> = kwargs
        .iter()
        .map(|(name, raw)| (name.clone(), parse(raw, None, Some(name))))
        .collect();
    for (name, default) in &spec.kwonlydefaults {
        if !keywords.iter().any(|(k, _)| k == name) {
            keywords.push((name.clone(), default.clone()));
        }
    }

    // --- 3. Variadic positional slot ---
    if spec.varargs.is_some() {
        positional.extend(bare.drain(..).map(|raw| parse(&raw, None, None)));
    }

    let mut remaining: Vec<String> = bare.into();
    remaining.extend(remaining_kwargs);
    let mut leftover = remaining.clone();
    let consumed: Vec<String> = args
        .iter()
        .filter(|token| match leftover.iter().position(|l| l == *token) {
            Some(index) => {
                leftover.remove(index);
                false
            }
            None => true,
        })
        .cloned()
        .collect();
    log::debug!(
        "Bound {} positional and {} keyword values; consumed {:?}, remaining {:?}",
        positional.len(),
        keywords.len(),
        consumed,
        remaining
    );

    Ok(Binding {
        call_args: CallArgs {
            positional,
            names: spec.args.clone(),
            keywords,
        },
        consumed,
        remaining,
        capacity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inspect::get_arg_spec;
    use crate::core::decorators::Registry;
    use crate::models::{Routine, Signature};

    // --- Helper to create a Vec<String> from &str slices ---
    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    fn spec_of(signature: Signature) -> ArgSpec {
        get_arg_spec(&Routine::function("f", signature, |_| Ok(Component::None)).into())
    }

    fn f_a_b() -> ArgSpec {
        spec_of(Signature::new().param("a").param_default("b", 2))
    }

    fn bind_routine(spec: &ArgSpec, params: &[&str]) -> Result<Binding, UsageError> {
        bind(&to_cli_params(params), spec, &Metadata::default(), true)
    }

    #[test]
    fn test_positional_and_default() {
        let binding = bind_routine(&f_a_b(), &["5"]).unwrap();
        assert_eq!(
            binding.call_args.positional,
            vec![Component::Int(5), Component::Int(2)]
        );
        assert!(binding.capacity);
        assert_eq!(binding.consumed, to_cli_params(&["5"]));
        assert!(binding.remaining.is_empty());
    }

    #[test]
    fn test_flag_before_positional() {
        let binding = bind_routine(&f_a_b(), &["--b=9", "5"]).unwrap();
        assert_eq!(
            binding.call_args.positional,
            vec![Component::Int(5), Component::Int(9)]
        );
        assert!(!binding.capacity);
        assert_eq!(binding.call_args.get("b"), Some(&Component::Int(9)));
    }

    #[test]
    fn test_missing_required_argument() {
        let error = bind_routine(&f_a_b(), &["--b=9"]).unwrap_err();
        assert_eq!(error, UsageError::MissingArgument("a".into()));
        assert_eq!(
            error.to_string(),
            "The function received no value for the required argument: a"
        );
    }

    #[test]
    fn test_flags_only_callables() {
        let spec = f_a_b();
        let error = bind(&to_cli_params(&["5"]), &spec, &Metadata::default(), false).unwrap_err();
        assert_eq!(error, UsageError::MissingFlagArgument("a".into()));

        let binding = bind(&to_cli_params(&["--a=5", "rest"]), &spec, &Metadata::default(), false).unwrap();
        assert_eq!(binding.call_args.get("a"), Some(&Component::Int(5)));
        assert_eq!(binding.remaining, to_cli_params(&["rest"]));
    }

    #[test]
    fn test_consumed_skips_interleaved_leftovers() {
        let spec = spec_of(Signature::new().param("a"));
        let binding = bind_routine(&spec, &["--other", "1", "5"]).unwrap();
        assert_eq!(binding.consumed, to_cli_params(&["5"]));
        assert_eq!(binding.remaining, to_cli_params(&["--other", "1"]));
    }

    #[test]
    fn test_leftovers_are_returned() {
        let spec = spec_of(Signature::new().param("a"));
        let binding = bind_routine(&spec, &["5", "extra", "--unknown", "x"]).unwrap();
        assert_eq!(binding.remaining, to_cli_params(&["extra", "--unknown", "x"]));
        assert_eq!(binding.consumed, to_cli_params(&["5"]));
    }

    #[test]
    fn test_varargs_take_all_bare_tokens() {
        let spec = spec_of(Signature::new().param("a").varargs("rest"));
        let binding = bind_routine(&spec, &["1", "2", "three"]).unwrap();
        assert_eq!(binding.call_args.get("a"), Some(&Component::Int(1)));
        assert_eq!(
            binding.call_args.rest(),
            &[Component::Int(2), Component::from("three")]
        );
        assert!(binding.capacity);
        assert!(binding.remaining.is_empty());
    }

    #[test]
    fn test_varkw_collects_extra_flags() {
        let spec = spec_of(Signature::new().param("thing").varkw("kwargs"));
        let binding = bind_routine(&spec, &["--nothing", "--nothing=True"]).unwrap();
        assert_eq!(binding.call_args.get("thing"), Some(&Component::Bool(false)));
        let extra: Vec<_> = binding.call_args.extra_keywords().cloned().collect();
        assert_eq!(extra, vec![("nothing".to_string(), Component::Bool(true))]);
    }

    #[test]
    fn test_negation_leaves_required_unbound() {
        let spec = spec_of(Signature::new().param("thing").param("nothing"));
        let binding = bind_routine(&spec, &["--thing", "--nonothing"]).unwrap();
        assert_eq!(
            binding.call_args.positional,
            vec![Component::Bool(true), Component::Bool(false)]
        );
        let error = bind_routine(&spec, &["--nothing", "--nonothing"]).unwrap_err();
        assert_eq!(error, UsageError::MissingArgument("thing".into()));
    }

    #[test]
    fn test_keyword_only_parameters() {
        let spec = spec_of(
            Signature::new()
                .kwonly("required")
                .kwonly_default("optional", "x"),
        );
        let error = bind_routine(&spec, &[]).unwrap_err();
        assert_eq!(error, UsageError::MissingFlags(vec!["required".into()]));

        let binding = bind_routine(&spec, &["--required=1"]).unwrap();
        assert_eq!(binding.call_args.keyword("required"), Some(&Component::Int(1)));
        assert_eq!(binding.call_args.keyword("optional"), Some(&Component::from("x")));
    }

    #[test]
    fn test_custom_parse_functions() {
        let target: Component = Routine::function(
            "f",
            Signature::new().param("a").param("b"),
            |_| Ok(Component::None),
        )
        .into();
        let mut registry = Registry::new();
        registry
            .set_parse_fn(&target, |s| Component::from(s.to_uppercase()), &["b"])
            .unwrap();
        let binding = bind(
            &to_cli_params(&["1", "text"]),
            &get_arg_spec(&target),
            &registry.metadata(&target),
            true,
        )
        .unwrap();
        assert_eq!(
            binding.call_args.positional,
            vec![Component::Int(1), Component::from("TEXT")]
        );
    }

    #[test]
    fn test_annotations_drive_parsing() {
        let spec = spec_of(Signature::new().param("name").annotated("str"));
        let binding = bind_routine(&spec, &["42"]).unwrap();
        assert_eq!(binding.call_args.get("name"), Some(&Component::from("42")));
    }
}
