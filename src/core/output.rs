// src/core/output.rs

//! Printing of resolved values.

use crate::core::decorators::Registry;
use crate::core::helptext;
use crate::core::trace::FireTrace;
use crate::core::value_types;
use crate::models::{Component, format_float};
use serde_json::{Map, Number, Value};
use std::io::{self, Write};

/// A hook that turns a result into something printable before output.
pub type SerializeFn = dyn Fn(&Component) -> Component;

/// Writes `result` to `out`.
///
/// # Logic:
/// Self-describing values print their description. Lists and sets print one
/// line per element, simple dicts print as an aligned table, tuples and
/// records print on one line and plain values print as text. `None` prints
/// nothing. Anything else shows its help screen.
pub fn print_result(
    result: &Component,
    trace: &FireTrace,
    serialize: Option<&SerializeFn>,
    registry: &Registry,
    out: &mut dyn Write,
) -> io::Result<()> {
    let serialized;
    let result = match serialize {
        Some(serialize) => {
            serialized = serialize(result);
            &serialized
        }
        None => result,
    };
    log::trace!("Printing a result of type {}", result.type_name());

    match result {
        Component::None => Ok(()),
        Component::Object(object) if object.has_custom_str() => {
            writeln!(out, "{}", result)
        }
        Component::List(items) | Component::Set(items) => {
            for item in items.iter() {
                writeln!(out, "{}", one_line_result(item))?;
            }
            Ok(())
        }
        Component::Dict(entries) if value_types::is_simple_group(entries) => {
            writeln!(out, "{}", dict_as_string(entries, trace.verbose()))
        }
        Component::Tuple(_) | Component::Record(_) => {
            writeln!(out, "{}", one_line_result(result))
        }
        value if value_types::is_value(value) => writeln!(out, "{}", value),
        other => writeln!(
            out,
            "{}",
            helptext::help_text(other, Some(trace), trace.verbose(), registry)
        ),
    }
}

/// A single-line rendering: strings verbatim, routines by name, everything
/// else as JSON when it has a JSON form.
pub fn one_line_result(result: &Component) -> String {
    match result {
        Component::Str(text) => text.replace('\n', " "),
        Component::Routine(routine) => format!("<{} {}>", result.type_name(), routine.name),
        other => to_json(other)
            .and_then(|value| dumps(&value))
            .unwrap_or_else(|| other.to_string().replace('\n', " ")),
    }
}

/// An aligned `key: value` table of the visible entries.
fn dict_as_string(entries: &[(Component, Component)], verbose: bool) -> String {
    let visible: Vec<(String, &Component)> = entries
        .iter()
        .map(|(key, value)| (key.to_string(), value))
        .filter(|(key, _)| verbose || !key.starts_with('_'))
        .collect();
    let Some(longest) = visible.iter().map(|(key, _)| key.chars().count()).max() else {
        return "{}".to_string();
    };
    visible
        .iter()
        .map(|(key, value)| {
            format!(
                "{:width$} {}",
                format!("{}:", key),
                one_line_result(value),
                width = longest + 1
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// --- JSON rendering ---

fn to_json(component: &Component) -> Option<Value> {
    Some(match component {
        Component::None => Value::Null,
        Component::Bool(b) => Value::Bool(*b),
        Component::Int(i) => Value::Number((*i).into()),
        Component::Float(f) => Value::Number(Number::from_f64(*f)?),
        Component::Str(s) => Value::String(s.clone()),
        Component::List(items) | Component::Tuple(items) | Component::Set(items) => {
            Value::Array(items.iter().map(to_json).collect::<Option<_>>()?)
        }
        Component::Record(record) => Value::Array(
            record
                .fields
                .iter()
                .map(|(_, value)| to_json(value))
                .collect::<Option<_>>()?,
        ),
        Component::Dict(entries) => {
            let mut map = Map::new();
            for (key, value) in entries.iter() {
                let key = match key {
                    Component::Str(s) => s.clone(),
                    Component::Int(_) | Component::Float(_) | Component::Bool(_) => {
                        key.to_string().to_lowercase()
                    }
                    Component::None => "null".to_string(),
                    _ => return None,
                };
                map.insert(key, to_json(value)?);
            }
            Value::Object(map)
        }
        _ => return None,
    })
}

/// JSON with `", "` and `": "` separators and floats in the same form as
/// plain printing.
fn dumps(value: &Value) -> Option<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    serde::Serialize::serialize(value, &mut serializer).ok()?;
    String::from_utf8(buffer).ok()
}

struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        writer.write_all(format_float(value).as_bytes())
    }
}
