// src/core/docstrings.rs

//! A permissive docstring reader for Google, reStructuredText and NumPy
//! layouts. It never fails: text it cannot place ends up in the
//! description.

use crate::core::inspect::dedent;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ARG_NAME_RE: Regex = Regex::new(r"^[a-zA-Z_]\w*$").expect("valid arg name regex");
}

/// One documented parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgInfo {
    pub name: String,
    pub type_name: Option<String>,
    pub description: Option<String>,
    /// Documented with `:key name:`, i.e. accepted through `**kwargs`.
    pub is_kwarg: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocstringInfo {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub args: Vec<ArgInfo>,
    pub returns: Option<String>,
    pub yields: Option<String>,
    pub raises: Option<String>,
}

impl DocstringInfo {
    /// The description of the parameter `name` (also matched as `*name`
    /// and `**name`).
    pub fn arg_description(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|arg| {
                arg.name == name
                    || arg.name.strip_prefix('*') == Some(name)
                    || arg.name.strip_prefix("**") == Some(name)
            })
            .and_then(|arg| arg.description.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Args,
    Returns,
    Yields,
    Raises,
    Type,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Google,
    Numpy,
    Rst,
}

const SECTION_TITLES: &[(Section, &[&str])] = &[
    (Section::Args, &["argument", "arg", "parameter", "param", "key"]),
    (Section::Returns, &["return"]),
    (Section::Yields, &["yield"]),
    (Section::Raises, &["raise", "except", "exception", "throw", "error", "warn"]),
    (Section::Type, &["type"]),
];

#[derive(Debug, Default)]
struct PendingArg {
    name: String,
    type_lines: Vec<String>,
    description_lines: Vec<String>,
    is_kwarg: bool,
}

#[derive(Debug)]
struct LineInfo<'a> {
    line: &'a str,
    stripped: &'a str,
    remaining: String,
    remaining_raw: String,
    indentation: usize,
    next_stripped: Option<&'a str>,
    next_indentation: Option<usize>,
    previous_line: Option<&'a str>,
    previous_indentation: Option<usize>,
}

impl<'a> LineInfo<'a> {
    fn new(line: &'a str, next: Option<&'a str>, previous: Option<&'a str>) -> Self {
        Self {
            line,
            stripped: line.trim(),
            remaining: line.trim().to_string(),
            remaining_raw: line.to_string(),
            indentation: indentation(line),
            next_stripped: next.map(str::trim),
            next_indentation: next.map(indentation),
            previous_line: previous,
            previous_indentation: previous.map(indentation),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    title: Option<Section>,
    format: Option<Format>,
    indentation: Option<usize>,
    line1_indentation: Option<usize>,
    new_section: bool,
    summary_permitted: bool,
    summary: Vec<String>,
    description: Vec<String>,
    args: Vec<PendingArg>,
    current_arg: Option<usize>,
    returns: Vec<String>,
    yields: Vec<String>,
    raises: Vec<String>,
}

impl State {
    fn arg_by_name(&mut self, name: &str, is_kwarg: bool) -> usize {
        if let Some(index) = self.args.iter().position(|arg| arg.name == name) {
            return index;
        }
        self.args.push(PendingArg {
            name: name.to_string(),
            is_kwarg,
            ..PendingArg::default()
        });
        self.args.len() - 1
    }

    fn current(&mut self) -> Option<&mut PendingArg> {
        self.current_arg.and_then(|index| self.args.get_mut(index))
    }
}

/// Reads a docstring.
pub fn parse(docstring: Option<&str>) -> DocstringInfo {
    let Some(docstring) = docstring else {
        return DocstringInfo::default();
    };
    let lines: Vec<&str> = docstring.trim().split('\n').collect();
    let mut state = State {
        summary_permitted: true,
        ..State::default()
    };

    for (index, line) in lines.iter().enumerate() {
        let previous = index.checked_sub(1).and_then(|i| lines.get(i)).copied();
        let next = lines.get(index + 1).copied();
        let mut info = LineInfo::new(line, next, previous);
        consume_line(&mut info, &mut state);
    }

    let summary = (!state.summary.is_empty()).then(|| state.summary.join(" "));
    let description = dedent(&strip_blank_lines(&state.description).join("\n"));
    let description = (!description.is_empty()).then_some(description);
    let args = state
        .args
        .into_iter()
        .map(|arg| ArgInfo {
            type_name: join_lines(&arg.type_lines).map(|t| t.trim_end_matches('.').to_string()),
            description: join_lines(&arg.description_lines),
            name: arg.name,
            is_kwarg: arg.is_kwarg,
        })
        .collect::<Vec<_>>();
    // Keyword-documented flags follow the ordinary parameters.
    let (mut args, kwargs): (Vec<_>, Vec<_>) = args.into_iter().partition(|arg| !arg.is_kwarg);
    args.extend(kwargs);

    DocstringInfo {
        summary,
        description,
        args,
        returns: join_lines(&state.returns),
        yields: join_lines(&state.yields),
        raises: join_lines(&state.raises),
    }
}

fn indentation(line: &str) -> usize {
    line.chars().count() - line.trim_start().chars().count()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn strip_blank_lines(lines: &[String]) -> &[String] {
    let start = lines.iter().position(|l| !is_blank(l)).unwrap_or(lines.len());
    let end = lines.iter().rposition(|l| !is_blank(l)).map_or(start, |i| i + 1);
    lines.get(start..end).unwrap_or_default()
}

/// Joins lines into paragraphs: consecutive lines with a space, blank lines
/// as paragraph breaks.
fn join_lines(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    let mut groups = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in lines {
        let stripped = line.trim();
        if stripped.is_empty() {
            if !current.is_empty() {
                groups.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(stripped);
        }
    }
    if !current.is_empty() {
        groups.push(current.join(" "));
    }
    let joined = groups.join("\n\n");
    (!joined.is_empty()).then_some(joined)
}

fn is_arg_name(name: &str) -> bool {
    ARG_NAME_RE.is_match(name.trim())
}

/// `name (type)` split into its parts.
fn as_arg_name_and_type(text: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let (first, rest) = tokens.split_first()?;
    if rest.is_empty() || !is_arg_name(first) {
        return None;
    }
    let type_token = rest
        .join(" ")
        .trim_start_matches(['{', '(', '['])
        .trim_end_matches([']', ')', '}'])
        .to_string();
    Some((first.to_string(), type_token))
}

fn as_arg_names(text: &str) -> Option<Vec<String>> {
    let names: Vec<String> = text
        .split([',', ' '])
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect();
    if names.is_empty() || !names.iter().all(|name| is_arg_name(name)) {
        return None;
    }
    Some(names)
}

fn matches_section_title(title: &str, section_title: &str) -> bool {
    let title = title.to_lowercase();
    let mut chars = title.chars();
    chars.next_back();
    title == section_title || chars.as_str() == section_title
}

fn section_from_possible_title(title: &str) -> Option<Section> {
    SECTION_TITLES
        .iter()
        .find(|(_, titles)| titles.iter().any(|t| matches_section_title(title, t)))
        .map(|(section, _)| *section)
}

fn google_section(info: &LineInfo<'_>) -> Option<Section> {
    let possible_title = match info.remaining.find(':') {
        Some(index) => info.remaining.get(..index).unwrap_or_default(),
        None => {
            let mut chars = info.remaining.chars();
            chars.next_back();
            chars.as_str()
        }
    };
    section_from_possible_title(possible_title)
}

fn after_google_header(info: &LineInfo<'_>) -> String {
    match info.remaining.split_once(':') {
        Some((_, rest)) => rest.to_string(),
        None => info.remaining.clone(),
    }
}

fn directive<'a>(info: &LineInfo<'a>) -> Option<&'a str> {
    let rest = info.stripped.strip_prefix(':')?;
    Some(rest.split(':').next().unwrap_or_default())
}

fn after_directive(info: &LineInfo<'_>) -> String {
    let sections: Vec<&str> = info.stripped.splitn(3, ':').collect();
    match sections.as_slice() {
        [_, _, last] => (*last).to_string(),
        _ => String::new(),
    }
}

fn rst_section(info: &LineInfo<'_>) -> Option<Section> {
    let possible_title = directive(info)?.split_whitespace().next()?;
    section_from_possible_title(possible_title)
}

fn line_is_hyphens(line: &str) -> bool {
    !line.is_empty() && line.trim_matches('-').is_empty()
}

fn numpy_section(info: &LineInfo<'_>) -> Option<Section> {
    if info.next_stripped.is_some_and(line_is_hyphens) {
        section_from_possible_title(&info.remaining)
    } else {
        None
    }
}

/// A `name : type` line, not a description line that happens to contain a
/// colon under another colon line.
fn line_is_numpy_parameter_type(info: &LineInfo<'_>) -> bool {
    if !info.remaining.trim().contains(':') {
        return false;
    }
    let previous_has_colon = info.previous_line.is_some_and(|line| line.contains(':'));
    let deeper = info
        .previous_indentation
        .is_some_and(|previous| info.indentation > previous);
    !(previous_has_colon && deeper)
}

fn google_section_permitted(info: &LineInfo<'_>, state: &State) -> bool {
    match state.indentation {
        None => true,
        Some(section_indent) => {
            info.indentation <= section_indent
                || state
                    .line1_indentation
                    .is_some_and(|line1| info.indentation < line1)
        }
    }
}

fn update_section_state(info: &mut LineInfo<'_>, state: &mut State) {
    let mut updated = false;

    if google_section_permitted(info, state)
        && let Some(section) = google_section(info)
    {
        state.format = Some(Format::Google);
        state.title = Some(section);
        info.remaining = after_google_header(info);
        info.remaining_raw = info.remaining.clone();
        updated = true;
    }
    if let Some(section) = rst_section(info) {
        state.format = Some(Format::Rst);
        state.title = Some(section);
        info.remaining = after_directive(info);
        info.remaining_raw = info.remaining.clone();
        updated = true;
    }
    if let Some(section) = numpy_section(info) {
        state.format = Some(Format::Numpy);
        state.title = Some(section);
        info.remaining = String::new();
        info.remaining_raw = String::new();
        updated = true;
    }

    state.new_section = updated;
    if updated {
        state.indentation = Some(info.indentation);
        state.line1_indentation = info.next_indentation;
    }
}

fn consume_google_args_line(info: &LineInfo<'_>, state: &mut State) {
    if let Some((first, second)) = info.remaining.split_once(':') {
        if is_arg_name(first) {
            let index = state.arg_by_name(first.trim(), false);
            if let Some(arg) = state.args.get_mut(index) {
                arg.description_lines.push(second.trim().to_string());
            }
            state.current_arg = Some(index);
            return;
        }
        if let Some((name, type_name)) = as_arg_name_and_type(first) {
            let index = state.arg_by_name(&name, false);
            if let Some(arg) = state.args.get_mut(index) {
                arg.type_lines.push(type_name);
                arg.description_lines.push(second.trim().to_string());
            }
            state.current_arg = Some(index);
            return;
        }
        if let Some(arg) = state.current() {
            arg.description_lines.push(first.to_string());
        }
    } else if let Some(arg) = state.current() {
        arg.description_lines.push(info.remaining.clone());
    }
}

fn consume_numpy_args_line(info: &LineInfo<'_>, state: &mut State) {
    let stripped = info.remaining.trim();
    if is_arg_name(stripped) {
        state.current_arg = Some(state.arg_by_name(stripped, false));
        return;
    }
    if line_is_numpy_parameter_type(info)
        && let Some((possible_args, type_data)) = stripped.split_once(':')
        && let Some(names) = as_arg_names(possible_args)
    {
        for name in names {
            let index = state.arg_by_name(&name, false);
            if let Some(arg) = state.args.get_mut(index) {
                arg.type_lines.push(type_data.to_string());
            }
            state.current_arg = Some(index);
        }
        return;
    }
    if let Some(arg) = state.current() {
        arg.description_lines.push(stripped.to_string());
    }
}

fn consume_line(info: &mut LineInfo<'_>, state: &mut State) {
    update_section_state(info, state);

    if state.title.is_none() {
        if state.summary_permitted {
            if !info.remaining.is_empty() {
                state.summary.push(info.remaining.clone());
            } else if !state.summary.is_empty() {
                state.summary_permitted = false;
            }
        } else {
            state.description.push(info.remaining_raw.clone());
        }
    } else {
        state.summary_permitted = false;
    }

    if state.new_section
        && state.format == Some(Format::Rst)
        && let Some(directive) = directive(info)
    {
        let tokens: Vec<&str> = directive.split_whitespace().collect();
        if let Some(name) = tokens.last() {
            match state.title {
                Some(Section::Args) => {
                    let is_kwarg = tokens.first() == Some(&"key");
                    let index = state.arg_by_name(name, is_kwarg);
                    if let [_, type_name, _] = tokens.as_slice()
                        && let Some(arg) = state.args.get_mut(index)
                    {
                        arg.type_lines.push((*type_name).to_string());
                    }
                    state.current_arg = Some(index);
                }
                Some(Section::Type) => {
                    state.current_arg = Some(state.arg_by_name(name, false));
                }
                _ => {}
            }
        }
    }

    if state.format == Some(Format::Numpy) && line_is_hyphens(&info.remaining) {
        return;
    }

    let text = info.remaining.trim().to_string();
    match (state.title, state.format) {
        (Some(Section::Args), Some(Format::Google)) => consume_google_args_line(info, state),
        (Some(Section::Args), Some(Format::Rst)) => {
            if let Some(arg) = state.current() {
                arg.description_lines.push(text);
            }
        }
        (Some(Section::Args), Some(Format::Numpy)) => consume_numpy_args_line(info, state),
        (Some(Section::Returns), _) => state.returns.push(text),
        (Some(Section::Yields), _) => state.yields.push(text),
        (Some(Section::Raises), _) => state.raises.push(text),
        (Some(Section::Type), Some(Format::Rst)) => {
            if let Some(arg) = state.current() {
                arg.type_lines.push(text);
            }
        }
        _ => {}
    }
    log::trace!("Docstring line {:?} read as {:?}", info.line, state.title);
}
