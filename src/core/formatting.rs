// src/core/formatting.rs

//! Text styling and layout helpers for help and usage screens.

use colored::Colorize;

pub const ELLIPSIS: &str = "...";

/// Turns styling on or off for the whole process. `None` leaves the
/// terminal detection of `colored` in charge.
pub fn apply_color_choice(enabled: Option<bool>) {
    match enabled {
        Some(enabled) => colored::control::set_override(enabled),
        None => colored::control::unset_override(),
    }
}

/// Indents every non-empty line.
pub fn indent(text: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn bold(text: &str) -> String {
    text.bold().to_string()
}

pub fn underline(text: &str) -> String {
    text.underline().to_string()
}

pub fn bold_underline(text: &str) -> String {
    text.bold().underline().to_string()
}

pub fn error(text: &str) -> String {
    text.red().bold().to_string()
}

pub fn double_quote(text: &str) -> String {
    format!("\"{}\"", text)
}

/// Joins `items` with `separator`, starting a new line whenever the next
/// item would pass `width`.
pub fn wrapped_join(items: &[String], separator: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for (index, item) in items.iter().enumerate() {
        let is_last = index + 1 == items.len();
        let needed = if is_last {
            item.chars().count()
        } else {
            item.chars().count() + separator.chars().count()
        };
        if current.chars().count() + needed > width {
            lines.push(current.trim_end().to_string());
            current = String::new();
        }
        current.push_str(item);
        if !is_last {
            current.push_str(separator);
        }
    }
    lines.push(current);
    lines
}

/// Cuts `text` to `available_space` characters, ending in an ellipsis.
/// Too little space falls back to the full line length.
pub fn ellipsis_truncate(text: &str, available_space: usize, line_length: usize) -> String {
    let space = if available_space < ELLIPSIS.len() {
        line_length
    } else {
        available_space
    };
    if text.chars().count() <= space {
        return text.to_string();
    }
    let kept: String = text.chars().take(space.saturating_sub(ELLIPSIS.len())).collect();
    format!("{}{}", kept, ELLIPSIS)
}

/// Like [`ellipsis_truncate`], but keeps both ends of the text.
pub fn ellipsis_middle_truncate(text: &str, available_space: usize, line_length: usize) -> String {
    let space = if available_space < ELLIPSIS.len() {
        line_length
    } else {
        available_space
    };
    let length = text.chars().count();
    if length < space {
        return text.to_string();
    }
    let kept = space.saturating_sub(ELLIPSIS.len());
    let first_half = kept / 2;
    let second_half = kept - first_half;
    let head: String = text.chars().take(first_half).collect();
    let tail: String = text.chars().skip(length - second_half).collect();
    format!("{}{}{}", head, ELLIPSIS, tail)
}
