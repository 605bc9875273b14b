// src/core/completion.rs

//! Shell completion scripts generated from a component graph.

use crate::core::inspect;
use crate::models::Component;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeSet;

/// How deep the member graph is walked for commands.
const MAX_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    #[default]
    Bash,
    Fish,
}

/// Builds a completion script for the command `name` backed by `component`.
pub fn script(name: &str, component: &Component, shell: Shell, verbose: bool) -> String {
    let mut visited = Vec::new();
    let commands = commands(component, MAX_DEPTH, verbose, &mut visited);
    log::debug!("Generating {:?} completion for {} commands", shell, commands.len());
    let options = options_by_prefix(name, &commands);
    match shell {
        Shell::Bash => bash_script(name, &options),
        Shell::Fish => fish_script(name, &options),
    }
}

/// The tokens that can follow a command resolving to `component`.
pub fn completions(component: &Component, verbose: bool) -> Vec<String> {
    match component {
        Component::Routine(_) | Component::Class(_) => {
            let spec = inspect::get_arg_spec(component);
            spec.args
                .iter()
                .chain(&spec.kwonlyargs)
                .map(|arg| format!("--{}", arg.replace('_', "-")))
                .collect()
        }
        Component::List(items) | Component::Tuple(items) => {
            (0..items.len()).map(|index| index.to_string()).collect()
        }
        _ => members(component, verbose)
            .into_iter()
            .map(|(name, _)| format_for_command(&name))
            .collect(),
    }
}

/// Hyphens read better on a command line, but a leading hyphen would look
/// like a flag, so names starting with `_` are kept as they are.
pub fn format_for_command(token: &str) -> String {
    if token.starts_with('_') {
        token.to_string()
    } else {
        token.replace('_', "-")
    }
}

/// Named members a command can reach, private ones only when verbose.
pub(crate) fn members(component: &Component, verbose: bool) -> Vec<(String, Component)> {
    let all: Vec<(String, Component)> = match component {
        Component::Object(object) => object.members.clone(),
        Component::Class(class) => class.members.clone(),
        Component::Record(record) => record.fields.clone(),
        Component::Dict(entries) => entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect(),
        _ => Vec::new(),
    };
    all.into_iter()
        .filter(|(name, _)| verbose || !name.starts_with('_'))
        .collect()
}

/// Every command reachable from `component`, as token lists.
fn commands(
    component: &Component,
    depth: usize,
    verbose: bool,
    visited: &mut Vec<Component>,
) -> Vec<Vec<String>> {
    if depth == 0 || visited.iter().any(|seen| seen.is_same(component)) {
        return Vec::new();
    }
    visited.push(component.clone());

    let mut found = Vec::new();
    for (name, member) in members(component, verbose) {
        let name = format_for_command(&name);
        found.push(vec![name.clone()]);

        if matches!(member, Component::Routine(_) | Component::Class(_)) {
            found.extend(
                completions(&member, verbose)
                    .into_iter()
                    .map(|completion| vec![name.clone(), completion]),
            );
            continue;
        }

        for mut command in commands(&member, depth - 1, verbose, visited) {
            command.insert(0, name.clone());
            found.push(command);
        }
    }
    found
}

/// Groups the last token of each command under the command line preceding it.
fn options_by_prefix(name: &str, commands: &[Vec<String>]) -> Vec<(String, BTreeSet<String>)> {
    let mut options: Vec<(String, BTreeSet<String>)> = Vec::new();
    let mut add = |start: String, completion: &str| {
        match options.iter_mut().find(|(existing, _)| *existing == start) {
            Some((_, set)) => {
                set.insert(completion.to_string());
            }
            None => options.push((start, BTreeSet::from([completion.to_string()]))),
        }
    };
    for command in commands {
        let Some((last, init)) = command.split_last() else {
            continue;
        };
        let start = format!("{} {}", name, init.join(" ")).trim().to_string();
        add(start.replace('_', "-"), last);
        add(start, last);
    }
    options
}

fn identifier(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '/' | '.' | ',')).collect()
}

fn bash_script(name: &str, options: &[(String, BTreeSet<String>)]) -> String {
    let start_checks = options
        .iter()
        .map(|(start, completions)| {
            format!(
                "\n  if [[ \"$start\" == \"{}\" ]] ; then\n    opts=\"{}\"\n  fi",
                start,
                completions.iter().cloned().collect::<Vec<_>>().join(" ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    let identifier = identifier(name);

    format!(
        r#"# bash completion support for {name}
# DO NOT EDIT.
# This script is autogenerated by ignite.

_complete-{identifier}()
{{
  local start cur opts
  COMPREPLY=()
  start="${{COMP_WORDS[@]:0:COMP_CWORD}}"
  cur="${{COMP_WORDS[COMP_CWORD]}}"

  opts=""

{start_checks}

  COMPREPLY=( $(compgen -W "${{opts}}" -- ${{cur}}) )
  return 0
}}

complete -F _complete-{identifier} {name}
"#
    )
}

fn fish_script(name: &str, options: &[(String, BTreeSet<String>)]) -> String {
    let identifier = identifier(name);
    let mut script = format!(
        r#"# fish completion support for {name}
# DO NOT EDIT.
# This script is autogenerated by ignite.

function __fish_{identifier}_start_is
    set -l cmd (commandline -opc)
    test "$cmd" = "$argv"
end

complete -c {name} -f
"#
    );
    for (start, completions) in options {
        for completion in completions {
            script.push_str(&format!(
                "complete -c {} -n '__fish_{}_start_is {}' -a '{}'\n",
                name, identifier, start, completion
            ));
        }
    }
    script
}
