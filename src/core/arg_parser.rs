// src/core/arg_parser.rs

//! Splits the tokens offered to a callable into keyword arguments, flags it
//! does not know about, and bare tokens.

use crate::core::error::UsageError;
use crate::core::inspect::ArgSpec;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `--anything` or `-x...` with a letter; `-5` is a negative number.
    static ref FLAG_RE: Regex = Regex::new(r"^(?:--|-[a-zA-Z])").expect("valid flag regex");
}

/// True when the token is written as a flag.
pub fn is_flag(token: &str) -> bool {
    FLAG_RE.is_match(token)
}

/// The outcome of keyword extraction. Raw string values; parsing happens
/// at binding time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordArgs {
    /// Matched keywords in first-seen order. A repeated keyword keeps its
    /// position and takes the last value.
    pub kwargs: Vec<(String, String)>,
    /// Flag tokens (and their values) no parameter claimed.
    pub remaining_kwargs: Vec<String>,
    /// Bare tokens, in order.
    pub remaining_args: Vec<String>,
}

impl KeywordArgs {
    fn insert(&mut self, key: String, value: String) {
        match self.kwargs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.kwargs.push((key, value)),
        }
    }

    /// Removes and returns the value given for `key`.
    pub fn take(&mut self, key: &str) -> Option<String> {
        let index = self.kwargs.iter().position(|(k, _)| k == key)?;
        Some(self.kwargs.remove(index).1)
    }
}

/// Extracts keyword arguments for a callable with the given spec.
///
/// # Logic:
/// - `--name=value` and `--name value` bind `name`; hyphens in names become
///   underscores.
/// - A flag followed by another flag (or by nothing) is boolean: `--name`
///   binds `True`, `--noname` binds `name` to `False`.
/// - `-x` resolves to the only parameter starting with `x`; an exact name
///   wins, several candidates are an error.
/// - With a variadic keyword slot every flag is a keyword.
/// - Any other flag is left over, together with its value.
pub fn parse_keyword_args(args: &[String], spec: &ArgSpec) -> Result<KeywordArgs, UsageError> {
    let mut parsed = KeywordArgs::default();
    let fn_args: Vec<&str> = spec
        .args
        .iter()
        .chain(&spec.kwonlyargs)
        .map(String::as_str)
        .collect();
    let has_varkw = spec.varkw.is_some();
    let mut tokens = args.iter().peekable();

    while let Some(argument) = tokens.next() {
        if !is_flag(argument) {
            parsed.remaining_args.push(argument.clone());
            continue;
        }

        let stripped = argument.trim_start_matches('-');
        let (raw_key, inline_value) = match stripped.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (stripped, None),
        };
        let key = raw_key.replace('-', "_");
        let next_is_flag = tokens.peek().is_none_or(|next| is_flag(next));
        let is_bool_syntax = inline_value.is_none() && next_is_flag;

        let negated = key
            .strip_prefix("no")
            .is_some_and(|rest| fn_args.contains(&rest));
        let mut keyword = if fn_args.contains(&key.as_str()) || (is_bool_syntax && negated) || has_varkw {
            Some(key.clone())
        } else {
            None
        };

        if keyword.is_none() && key.chars().count() == 1 {
            let matching: Vec<&str> = fn_args
                .iter()
                .copied()
                .filter(|name| name.starts_with(key.as_str()))
                .collect();
            match matching.as_slice() {
                [only] => keyword = Some((*only).to_string()),
                [] => {}
                _ => {
                    return Err(UsageError::AmbiguousFlag {
                        flag: argument.clone(),
                        candidates: matching.iter().map(ToString::to_string).collect(),
                    });
                }
            }
        }

        match keyword {
            Some(keyword) => {
                let (keyword, value) = match inline_value {
                    Some(value) => (keyword, value.to_string()),
                    None if is_bool_syntax => {
                        if fn_args.contains(&keyword.as_str()) {
                            (keyword, "True".to_string())
                        } else if let Some(positive) = keyword.strip_prefix("no") {
                            (positive.to_string(), "False".to_string())
                        } else {
                            (keyword, "True".to_string())
                        }
                    }
                    None => match tokens.next() {
                        Some(value) => (keyword, value.clone()),
                        None => (keyword, "True".to_string()),
                    },
                };
                log::trace!("Flag {} bound to keyword {}={}", argument, keyword, value);
                parsed.insert(keyword, value);
            }
            None => {
                parsed.remaining_kwargs.push(argument.clone());
                if !is_bool_syntax
                    && inline_value.is_none()
                    && let Some(value) = tokens.next()
                {
                    parsed.remaining_kwargs.push(value.clone());
                }
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_cli_params(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    fn spec(args: &[&str]) -> ArgSpec {
        ArgSpec {
            args: args.iter().map(|s| s.to_string()).collect(),
            ..ArgSpec::default()
        }
    }

    fn kv(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_is_flag() {
        assert!(is_flag("--name"));
        assert!(is_flag("-x"));
        assert!(is_flag("-x=3"));
        assert!(is_flag("--"));
        assert!(!is_flag("-5"));
        assert!(!is_flag("-"));
        assert!(!is_flag("name"));
    }

    #[test]
    fn test_value_forms() {
        let params = to_cli_params(&["--alpha=1", "--beta", "2", "pos", "--gamma"]);
        let parsed = parse_keyword_args(&params, &spec(&["alpha", "beta", "gamma"])).unwrap();
        assert_eq!(
            parsed.kwargs,
            kv(&[("alpha", "1"), ("beta", "2"), ("gamma", "True")])
        );
        assert_eq!(parsed.remaining_args, to_cli_params(&["pos"]));
        assert!(parsed.remaining_kwargs.is_empty());
    }

    #[test]
    fn test_hyphens_become_underscores() {
        let params = to_cli_params(&["--long-name=x"]);
        let parsed = parse_keyword_args(&params, &spec(&["long_name"])).unwrap();
        assert_eq!(parsed.kwargs, kv(&[("long_name", "x")]));
    }

    #[test]
    fn test_negation() {
        let parsed =
            parse_keyword_args(&to_cli_params(&["--thing", "--nonothing"]), &spec(&["thing", "nothing"]))
                .unwrap();
        assert_eq!(parsed.kwargs, kv(&[("thing", "True"), ("nothing", "False")]));

        let parsed =
            parse_keyword_args(&to_cli_params(&["--nothing", "--nonothing"]), &spec(&["thing", "nothing"]))
                .unwrap();
        assert_eq!(parsed.kwargs, kv(&[("nothing", "False")]));
    }

    #[test]
    fn test_negation_with_explicit_value_is_not_bool_syntax() {
        let parsed =
            parse_keyword_args(&to_cli_params(&["--nothing=True"]), &spec(&["thing"])).unwrap();
        assert!(parsed.kwargs.is_empty());
        assert_eq!(parsed.remaining_kwargs, to_cli_params(&["--nothing=True"]));
    }

    #[test]
    fn test_short_flags() {
        let parsed = parse_keyword_args(&to_cli_params(&["-a", "5"]), &spec(&["alpha", "beta"])).unwrap();
        assert_eq!(parsed.kwargs, kv(&[("alpha", "5")]));

        let parsed = parse_keyword_args(&to_cli_params(&["-a"]), &spec(&["a", "alpha"])).unwrap();
        assert_eq!(parsed.kwargs, kv(&[("a", "True")]));

        let error = parse_keyword_args(&to_cli_params(&["-a"]), &spec(&["alpha", "apple"])).unwrap_err();
        assert_eq!(
            error.to_string(),
            "The argument '-a' is ambiguous as it could refer to any of the following arguments: alpha, apple"
        );

        let parsed = parse_keyword_args(&to_cli_params(&["-D"]), &spec(&["Delta", "delta"])).unwrap();
        assert_eq!(parsed.kwargs, kv(&[("Delta", "True")]));
    }

    #[test]
    fn test_unknown_flags_keep_their_values() {
        let params = to_cli_params(&["--other", "value", "--flag", "--x=1", "bare"]);
        let parsed = parse_keyword_args(&params, &spec(&["a"])).unwrap();
        assert!(parsed.kwargs.is_empty());
        assert_eq!(
            parsed.remaining_kwargs,
            to_cli_params(&["--other", "value", "--flag", "--x=1"])
        );
        assert_eq!(parsed.remaining_args, to_cli_params(&["bare"]));
    }

    #[test]
    fn test_varkw_accepts_everything() {
        let mut with_varkw = spec(&["thing"]);
        with_varkw.varkw = Some("kwargs".into());
        let parsed =
            parse_keyword_args(&to_cli_params(&["--nothing", "--nothing=True"]), &with_varkw).unwrap();
        assert_eq!(parsed.kwargs, kv(&[("thing", "False"), ("nothing", "True")]));
    }

    #[test]
    fn test_last_value_wins() {
        let mut parsed =
            parse_keyword_args(&to_cli_params(&["--a=1", "--b=2", "--a=3"]), &spec(&["a", "b"])).unwrap();
        assert_eq!(parsed.kwargs, kv(&[("a", "3"), ("b", "2")]));
        assert_eq!(parsed.take("a").as_deref(), Some("3"));
        assert_eq!(parsed.kwargs, kv(&[("b", "2")]));
    }
}
