// src/core/helptext.rs

//! Help screens and the short usage block shown after a usage error.
//!
//! A help screen is a list of titled sections (`NAME`, `SYNOPSIS`,
//! `DESCRIPTION`, argument and flag sections, member listings and notes),
//! each rendered as a bold title over an indented body.

use crate::core::completion;
use crate::core::decorators::Registry;
use crate::core::docstrings::{self, DocstringInfo};
use crate::core::formatting;
use crate::core::inspect::{self, ArgSpec};
use crate::core::trace::FireTrace;
use crate::core::value_types;
use crate::models::Component;
use std::collections::HashMap;

const LINE_LENGTH: usize = 80;
const SECTION_INDENTATION: usize = 4;
const SUBSECTION_INDENTATION: usize = 4;
const STRING_DESC_PREFIX: &str = "The string ";
const TWO_DOUBLE_QUOTES: usize = 2;

type Section = (String, String);

/// Members of one kind, as listed in help and usage output.
#[derive(Debug)]
struct ActionGroup {
    name: &'static str,
    plural: &'static str,
    title: &'static str,
    names: Vec<String>,
    members: Vec<Component>,
}

impl ActionGroup {
    fn new(name: &'static str, plural: &'static str, title: &'static str) -> Self {
        Self {
            name,
            plural,
            title,
            names: Vec::new(),
            members: Vec::new(),
        }
    }

    fn add(&mut self, name: String, member: Component) {
        self.names.push(name);
        self.members.push(member);
    }

    fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn items(&self) -> impl Iterator<Item = (&String, &Component)> {
        self.names.iter().zip(&self.members)
    }
}

/// Groups, commands, values and indexes of a component, in that order.
struct ActionsByKind {
    groups: ActionGroup,
    commands: ActionGroup,
    values: ActionGroup,
    indexes: ActionGroup,
}

impl ActionsByKind {
    fn collect(component: &Component, verbose: bool) -> Self {
        let mut actions = Self {
            groups: ActionGroup::new("group", "groups", t!("help.section.groups")),
            commands: ActionGroup::new("command", "commands", t!("help.section.commands")),
            values: ActionGroup::new("value", "values", t!("help.section.values")),
            indexes: ActionGroup::new("index", "indexes", t!("help.section.indexes")),
        };
        let mut members = completion::members(component, verbose);
        members.sort_by(|(a, _), (b, _)| a.cmp(b));
        for (name, member) in members {
            if value_types::is_group(&member) {
                actions.groups.add(name.clone(), member.clone());
            }
            if value_types::is_command(&member) {
                actions.commands.add(name.clone(), member.clone());
            }
            if value_types::is_value(&member) {
                actions.values.add(name, member);
            }
        }
        if let Component::List(items) | Component::Tuple(items) = component
            && !items.is_empty()
        {
            let name = if items.len() < 10 {
                (0..items.len())
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            } else {
                format!("0..{}", items.len() - 1)
            };
            actions.indexes.add(name, Component::None);
        }
        actions
    }

    fn all(&self) -> [&ActionGroup; 4] {
        [&self.groups, &self.commands, &self.values, &self.indexes]
    }

    fn possible(&self) -> Vec<&'static str> {
        self.all()
            .iter()
            .filter(|group| !group.is_empty())
            .map(|group| group.name)
            .collect()
    }
}

/// Whether the component can be called: routines, classes and objects
/// with a call operator.
fn is_callable(component: &Component) -> bool {
    match component {
        Component::Routine(_) | Component::Class(_) => true,
        Component::Object(object) => object.call.is_some(),
        _ => false,
    }
}

/// Primitives and containers get generated descriptions instead of
/// whatever documentation their type carries.
fn needs_custom_description(component: &Component) -> bool {
    matches!(
        component,
        Component::Str(_)
            | Component::Int(_)
            | Component::Float(_)
            | Component::Complex(..)
            | Component::Bool(_)
            | Component::Dict(_)
            | Component::Tuple(_)
            | Component::List(_)
            | Component::Set(_)
    )
}

fn custom_summary(component: &Component, available_space: usize) -> Option<String> {
    let Component::Str(text) = component else {
        return None;
    };
    let content = if text.chars().count() + TWO_DOUBLE_QUOTES <= available_space {
        text.clone()
    } else {
        let space = if available_space < TWO_DOUBLE_QUOTES + formatting::ELLIPSIS.len() {
            LINE_LENGTH
        } else {
            available_space
        };
        formatting::ellipsis_truncate(text, space - TWO_DOUBLE_QUOTES, LINE_LENGTH)
    };
    Some(formatting::double_quote(&content))
}

fn custom_description(component: &Component, available_space: usize) -> Option<String> {
    let Component::Str(text) = component else {
        return None;
    };
    let needed = STRING_DESC_PREFIX.len() + TWO_DOUBLE_QUOTES + formatting::ELLIPSIS.len();
    let space = if available_space < needed {
        LINE_LENGTH
    } else {
        available_space
    };
    let truncated = formatting::ellipsis_truncate(
        text,
        space - STRING_DESC_PREFIX.len() - TWO_DOUBLE_QUOTES,
        LINE_LENGTH,
    );
    Some(format!("{}{}", STRING_DESC_PREFIX, formatting::double_quote(&truncated)))
}

fn docstring_info(component: &Component) -> DocstringInfo {
    docstrings::parse(inspect::info(component).docstring.as_deref())
}

fn current_command(trace: Option<&FireTrace>, include_separators: bool) -> String {
    trace
        .map(|trace| trace.get_command(include_separators))
        .unwrap_or_default()
}

/// The full help screen for `component`.
pub fn help_text(
    component: &Component,
    trace: Option<&FireTrace>,
    verbose: bool,
    registry: &Registry,
) -> String {
    let info = docstring_info(component);
    let actions = ActionsByKind::collect(component, verbose);
    let spec = inspect::get_arg_spec(component);
    let accepts_positional = registry.accepts_positional_args(component);

    let mut sections: Vec<Section> = vec![
        name_section(component, &info, trace, verbose),
        synopsis_section(component, &actions, &spec, accepts_positional, trace),
    ];
    sections.extend(description_section(component, &info));

    let mut notes = Vec::new();
    if is_callable(component) {
        let (args_and_flags, callable_notes) = args_and_flags_sections(&info, &spec, accepts_positional);
        sections.extend(args_and_flags);
        notes = callable_notes;
    }
    sections.extend(usage_details_sections(component, &actions));
    sections.extend(notes);

    sections
        .iter()
        .map(|(title, content)| create_output_section(title, content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn name_section(
    component: &Component,
    info: &DocstringInfo,
    trace: Option<&FireTrace>,
    verbose: bool,
) -> Section {
    let command = current_command(trace, verbose);
    let summary = if needs_custom_description(component) {
        let used = SECTION_INDENTATION + command.chars().count() + " - ".len();
        custom_summary(component, LINE_LENGTH.saturating_sub(used))
    } else {
        info.summary.clone()
    };
    let text = match summary {
        Some(summary) => format!("{} - {}", command, summary),
        None => command,
    };
    (t!("help.section.name").to_string(), text)
}

fn synopsis_section(
    component: &Component,
    actions: &ActionsByKind,
    spec: &ArgSpec,
    accepts_positional: bool,
    trace: Option<&FireTrace>,
) -> Section {
    let command = current_command(trace, true);
    let mut continuations = Vec::new();
    let possible = actions.possible();
    if !possible.is_empty() {
        continuations.push(
            possible
                .iter()
                .map(|action| formatting::underline(&action.to_uppercase()))
                .collect::<Vec<_>>()
                .join(" | "),
        );
    }
    if is_callable(component) {
        let args_and_flags = args_and_flags_string(spec, accepts_positional);
        if !args_and_flags.is_empty() {
            continuations.push(args_and_flags);
        } else if let Some(trace) = trace {
            continuations.push(trace.separator().to_string());
        }
    }
    (
        t!("help.section.synopsis").to_string(),
        format!("{} {}", command, continuations.join(" | ")),
    )
}

fn description_section(component: &Component, info: &DocstringInfo) -> Option<Section> {
    let text = if needs_custom_description(component) {
        let space = LINE_LENGTH - SECTION_INDENTATION;
        custom_description(component, space).or_else(|| custom_summary(component, space))
    } else {
        info.description.clone().or_else(|| info.summary.clone())
    };
    text.map(|text| (t!("help.section.description").to_string(), text))
}

/// `ARG1 ARG2 <flags> [VARARGS]...`, or flag syntax for required
/// arguments when bare tokens are not accepted.
fn args_and_flags_string(spec: &ArgSpec, accepts_positional: bool) -> String {
    let (required, optional) = spec.args.split_at(spec.num_required());
    let mut parts: Vec<String> = required
        .iter()
        .map(|arg| {
            let upper = formatting::underline(&arg.to_uppercase());
            if accepts_positional {
                upper
            } else {
                format!("--{}={}", arg, upper)
            }
        })
        .collect();
    if !optional.is_empty() || !spec.kwonlyargs.is_empty() || spec.varkw.is_some() {
        parts.push("<flags>".to_string());
    }
    if let Some(varargs) = &spec.varargs {
        parts.push(format!("[{}]...", formatting::underline(&varargs.to_uppercase())));
    }
    parts.join(" ")
}

/// First letters that start exactly one of the names.
fn unique_short_flags(names: &[String]) -> Vec<char> {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let firsts: Vec<char> = names.iter().filter_map(|n| n.chars().next()).collect();
    for first in &firsts {
        *counts.entry(*first).or_default() += 1;
    }
    firsts
        .into_iter()
        .filter(|c| counts.get(c) == Some(&1))
        .collect()
}

fn has_unique_short(name: &str, unique: &[char]) -> bool {
    name.chars().next().is_some_and(|c| unique.contains(&c))
}

fn args_and_flags_sections(
    info: &DocstringInfo,
    spec: &ArgSpec,
    accepts_positional: bool,
) -> (Vec<Section>, Vec<Section>) {
    let (required, optional) = spec.args.split_at(spec.num_required());
    let mut sections = Vec::new();
    let mut notes = Vec::new();

    let mut arg_items: Vec<String> = required
        .iter()
        .map(|arg| create_arg_item(arg, info, spec))
        .collect();
    if let Some(varargs) = &spec.varargs {
        arg_items.push(create_arg_item(varargs, info, spec));
    }
    if !arg_items.is_empty() {
        let title = if accepts_positional {
            t!("help.section.positional_arguments")
        } else {
            t!("help.section.arguments")
        };
        sections.push((
            title.to_string(),
            arg_items.join("\n").trim_end_matches('\n').to_string(),
        ));
        if !required.is_empty() && accepts_positional {
            notes.push((
                t!("help.section.notes").to_string(),
                t!("help.notes.flags_syntax").to_string(),
            ));
        }
    }

    let unique_optional = unique_short_flags(optional);
    let mut flag_items: Vec<String> = optional
        .iter()
        .map(|flag| {
            create_flag_item(flag, info, spec, false, None, has_unique_short(flag, &unique_optional))
        })
        .collect();
    let unique_kwonly = unique_short_flags(&spec.kwonlyargs);
    flag_items.extend(spec.kwonlyargs.iter().map(|flag| {
        create_flag_item(
            flag,
            info,
            spec,
            spec.kwonly_default(flag).is_none(),
            None,
            has_unique_short(flag, &unique_kwonly),
        )
    }));

    if let Some(varkw) = &spec.varkw {
        let documented_names: Vec<String> = info.args.iter().map(|a| a.name.clone()).collect();
        let unique_documented = unique_short_flags(&documented_names);
        let documented: Vec<String> = info
            .args
            .iter()
            .filter(|arg| arg.is_kwarg)
            .map(|arg| {
                let flag_string = if has_unique_short(&arg.name, &unique_documented) {
                    let short: String = arg.name.chars().take(1).collect();
                    format!("-{}, --{}", short, arg.name)
                } else {
                    format!("--{}", arg.name)
                };
                create_flag_item(&arg.name, info, spec, false, Some(flag_string), false)
            })
            .collect();
        if !documented.is_empty() && !flag_items.is_empty() {
            flag_items.push(create_item(t!("help.flags.also_accepted"), None, 4));
        }
        let message = if !documented.is_empty() {
            t!("help.flags.undocumented")
        } else if !flag_items.is_empty() {
            t!("help.flags.additional")
        } else {
            t!("help.flags.accepted")
        };
        flag_items.extend(documented);
        flag_items.push(create_item(message, info.arg_description(varkw), 4));
    }

    if !flag_items.is_empty() {
        sections.push((t!("help.section.flags").to_string(), flag_items.join("\n")));
    }
    (sections, notes)
}

fn usage_details_sections(component: &Component, actions: &ActionsByKind) -> Vec<Section> {
    let mut sections = Vec::new();
    if !actions.groups.is_empty() {
        sections.push(make_usage_details_section(&actions.groups));
    }
    if !actions.commands.is_empty() {
        sections.push(make_usage_details_section(&actions.commands));
    }
    if !actions.values.is_empty() {
        sections.push(values_usage_details_section(component, &actions.values));
    }
    if !actions.indexes.is_empty() {
        sections.push((
            actions.indexes.title.to_string(),
            new_choices_section("INDEX", &actions.indexes.names),
        ));
    }
    sections
}

fn make_usage_details_section(group: &ActionGroup) -> Section {
    let items: Vec<String> = group
        .items()
        .map(|(name, member)| {
            let summary = if needs_custom_description(member) {
                custom_summary(member, LINE_LENGTH - SECTION_INDENTATION)
            } else {
                docstring_info(member).summary
            };
            create_item(name, summary.as_deref(), 2)
        })
        .collect();
    (
        group.title.to_string(),
        new_choices_section(&group.name.to_uppercase(), &items),
    )
}

/// Values are described by the owner's documented arguments of the same
/// name, when there are any.
fn values_usage_details_section(component: &Component, values: &ActionGroup) -> Section {
    let owner_info = docstring_info(component);
    let items: Vec<String> = values
        .names
        .iter()
        .map(|name| match owner_info.arg_description(name) {
            Some(description) => create_item(name, Some(description), 2),
            None => name.clone(),
        })
        .collect();
    (values.title.to_string(), new_choices_section("VALUE", &items))
}

fn new_choices_section(name: &str, choices: &[String]) -> String {
    create_item(
        &format!(
            t!("help.choices"),
            name = formatting::bold(&formatting::underline(name))
        ),
        Some(&format!("\n{}", choices.join("\n\n"))),
        1,
    )
}

fn create_output_section(name: &str, content: &str) -> String {
    format!(
        "{}\n{}",
        formatting::bold(name),
        formatting::indent(content, SECTION_INDENTATION)
    )
}

fn create_item(name: &str, description: Option<&str>, indent: usize) -> String {
    match description {
        Some(description) if !description.is_empty() => {
            format!("{}\n{}", name, formatting::indent(description, indent))
        }
        _ => name.to_string(),
    }
}

fn arg_type(arg: &str, spec: &ArgSpec) -> String {
    spec.annotations.get(arg).cloned().unwrap_or_default()
}

fn arg_default(flag: &str, spec: &ArgSpec) -> Option<String> {
    if let Some(index) = spec.args.iter().position(|a| a == flag)
        && let Some(default) = spec.default_for(index)
    {
        return Some(default.repr());
    }
    spec.kwonly_default(flag).map(Component::repr)
}

fn max_item_length() -> usize {
    LINE_LENGTH - SECTION_INDENTATION - SUBSECTION_INDENTATION
}

fn truncated_line(text: String) -> String {
    let max = max_item_length();
    let available = max.saturating_sub(text.chars().count());
    formatting::ellipsis_truncate(&text, available, max)
}

fn create_arg_item(arg: &str, info: &DocstringInfo, spec: &ArgSpec) -> String {
    let ty = arg_type(arg, spec);
    let ty = if ty.is_empty() {
        String::new()
    } else {
        truncated_line(format!(t!("help.type"), ty = ty))
    };
    let description: Vec<&str> = [Some(ty.as_str()), info.arg_description(arg)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();
    create_item(
        &formatting::bold_underline(&arg.to_uppercase()),
        Some(&description.join("\n")),
        SUBSECTION_INDENTATION,
    )
}

fn create_flag_item(
    flag: &str,
    info: &DocstringInfo,
    spec: &ArgSpec,
    required: bool,
    flag_string: Option<String>,
    short_arg: bool,
) -> String {
    let mut flag_string = flag_string.unwrap_or_else(|| {
        format!("--{}={}", flag, formatting::underline(&flag.to_uppercase()))
    });
    if required {
        flag_string = format!("{} {}", flag_string, t!("help.required"));
    }
    if short_arg {
        let short: String = flag.chars().take(1).collect();
        flag_string = format!("-{}, {}", short, flag_string);
    }

    let default = arg_default(flag, spec);
    let mut ty = arg_type(flag, spec);
    if !ty.is_empty() && default.as_deref() == Some("None") {
        ty = format!("Optional[{}]", ty);
    }
    let ty = if ty.is_empty() {
        String::new()
    } else {
        truncated_line(format!(t!("help.type"), ty = ty))
    };
    let default = default
        .map(|value| truncated_line(format!(t!("help.default"), value = value)))
        .unwrap_or_default();

    let description: Vec<&str> = [Some(ty.as_str()), Some(default.as_str()), info.arg_description(flag)]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect();
    create_item(&flag_string, Some(&description.join("\n")), SUBSECTION_INDENTATION)
}

// --- Usage text ---

/// The short usage block shown after a usage error.
pub fn usage_text(
    component: &Component,
    trace: Option<&FireTrace>,
    verbose: bool,
    registry: &Registry,
) -> String {
    let command = current_command(trace, true);
    let needs_hyphens = trace.is_some_and(|trace| trace.needs_separating_hyphen_hyphen("help"));
    let spec = inspect::get_arg_spec(component);
    let accepts_positional = registry.accepts_positional_args(component);
    let actions = ActionsByKind::collect(component, verbose);

    let mut continuations = Vec::new();
    let possible = actions.possible();
    if !possible.is_empty() {
        continuations.push(format!("<{}>", possible.join("|")));
    }
    let mut availability_lines: Vec<String> = actions
        .all()
        .iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            create_availability_line(
                &format!(t!("usage.available"), plural = group.plural),
                &group.names,
                2,
            )
        })
        .collect();

    if is_callable(component) {
        let items = callable_usage_items(&spec, accepts_positional);
        if !items.is_empty() {
            continuations.push(items.join(" "));
        } else if let Some(trace) = trace {
            continuations.push(trace.separator().to_string());
        }
        availability_lines.extend(callable_availability_lines(&spec));
    }

    let mut continued = command.clone();
    if !continuations.is_empty() {
        continued = format!("{} {}", continued, continuations.join(" | "));
    }
    let help_command = format!(
        "{}{}--help",
        command,
        if needs_hyphens { " -- " } else { " " }
    );

    format!(
        "{}\n{}\n{}\n  {}",
        format!(t!("usage.header"), command = continued),
        availability_lines.concat(),
        t!("usage.help_hint"),
        help_command
    )
}

fn callable_usage_items(spec: &ArgSpec, accepts_positional: bool) -> Vec<String> {
    let (required, optional) = spec.args.split_at(spec.num_required());
    let mut items: Vec<String> = required
        .iter()
        .map(|arg| {
            if accepts_positional {
                arg.to_uppercase()
            } else {
                format!("--{}={}", arg, arg.to_uppercase())
            }
        })
        .collect();
    if !optional.is_empty() || !spec.kwonlyargs.is_empty() || spec.varkw.is_some() {
        items.push("<flags>".to_string());
    }
    if let Some(varargs) = &spec.varargs {
        items.push(format!("[{}]...", varargs.to_uppercase()));
    }
    items
}

fn callable_availability_lines(spec: &ArgSpec) -> Vec<String> {
    let optional_flags: Vec<String> = spec
        .args
        .get(spec.num_required()..)
        .unwrap_or_default()
        .iter()
        .chain(
            spec.kwonlyargs
                .iter()
                .filter(|flag| spec.kwonly_default(flag).is_some()),
        )
        .map(|flag| format!("--{}", flag))
        .collect();
    let required_flags: Vec<String> = spec.required_kwonly().map(|flag| format!("--{}", flag)).collect();

    let mut lines = Vec::new();
    if !optional_flags.is_empty() {
        lines.push(create_availability_line(t!("usage.optional_flags"), &optional_flags, 2));
    }
    if !required_flags.is_empty() {
        lines.push(create_availability_line(t!("usage.required_flags"), &required_flags, 2));
    }
    if spec.varkw.is_some() {
        let header = if optional_flags.is_empty() && required_flags.is_empty() {
            t!("usage.flags_accepted")
        } else {
            t!("usage.additional_flags")
        };
        lines.push(create_availability_line(header, &[], 2));
    }
    lines
}

/// A header followed by items in a column starting at a fixed offset.
fn create_availability_line(header: &str, items: &[String], header_indent: usize) -> String {
    const ITEMS_INDENT: usize = 25;
    let items_text = formatting::wrapped_join(items, " | ", LINE_LENGTH - ITEMS_INDENT).join("\n");
    let indented_items = formatting::indent(&items_text, ITEMS_INDENT);
    let indented_header = formatting::indent(header, header_indent);
    let skip = indented_header.chars().count();
    let tail: String = indented_items.chars().skip(skip).collect();
    format!("{}{}\n", indented_header, tail)
}
