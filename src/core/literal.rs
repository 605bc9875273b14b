// src/core/literal.rs

//! Converts raw command-line tokens into typed values.
//!
//! A token is read as a literal (number, string, boolean, null or container)
//! when it is one; bare words are treated as strings, also inside containers,
//! so `[alpha, 2]` becomes a two-element list. Whatever cannot be read falls
//! back to the verbatim token. Parsing never fails.

use crate::models::Component;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref INT_RE: Regex = Regex::new(
        r"^(?:0[xX](?:_?[0-9a-fA-F])+|0[oO](?:_?[0-7])+|0[bB](?:_?[01])+|[1-9](?:_?[0-9])*|0(?:_?0)*)$"
    )
    .expect("valid int regex");
    static ref FLOAT_RE: Regex = Regex::new(
        r"^(?:(?:[0-9](?:_?[0-9])*)?\.[0-9](?:_?[0-9])*(?:[eE][+-]?[0-9](?:_?[0-9])*)?|[0-9](?:_?[0-9])*\.(?:[eE][+-]?[0-9](?:_?[0-9])*)?|[0-9](?:_?[0-9])*[eE][+-]?[0-9](?:_?[0-9])*)$"
    )
    .expect("valid float regex");
    static ref DIGITS_RE: Regex = Regex::new(r"^[0-9](?:_?[0-9])*$").expect("valid digits regex");
}

/// Splits `tokens` at the first occurrence of `marker`.
///
/// Returns the tokens before the marker and the tokens after it; the marker
/// itself is dropped. Without a marker everything is in front.
pub fn split_on_separator(tokens: &[String], marker: &str) -> (Vec<String>, Vec<String>) {
    match tokens.iter().position(|t| t == marker) {
        Some(index) => (
            tokens.iter().take(index).cloned().collect(),
            tokens.iter().skip(index + 1).cloned().collect(),
        ),
        None => (tokens.to_vec(), Vec::new()),
    }
}

/// Reads `token` as a value. Never fails: unreadable input comes back as
/// the verbatim string.
pub fn parse_value(token: &str) -> Component {
    let mut parser = Parser::new(token);
    match parser.parse_top() {
        Some(value) => value,
        None => {
            log::trace!("Token {:?} is not a literal, keeping it as a string", token);
            Component::Str(token.to_string())
        }
    }
}

/// Reads a single bare word: `None`, booleans and numbers, else `None`.
pub fn parse_scalar(text: &str) -> Option<Component> {
    match text {
        "None" => Some(Component::None),
        "True" => Some(Component::Bool(true)),
        "False" => Some(Component::Bool(false)),
        _ => parse_number(text),
    }
}

// --- Numbers ---

fn strip_sign(text: &str) -> (f64, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (-1.0, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (1.0, rest)
    } else {
        (1.0, text)
    }
}

fn parse_number(text: &str) -> Option<Component> {
    let (sign, body) = strip_sign(text);
    if body.starts_with(['+', '-']) || body.is_empty() {
        return None;
    }
    if let Some(value) = parse_unsigned(body) {
        return Some(match value {
            Component::Int(i) if sign < 0.0 => Component::Int(i.checked_neg()?),
            Component::Float(f) => Component::Float(sign * f),
            Component::Complex(re, im) => Component::Complex(re, sign * im),
            other => other,
        });
    }
    // `real+imagj` / `real-imagj`
    let split = body
        .char_indices()
        .skip(1)
        .find(|&(i, c)| {
            matches!(c, '+' | '-')
                && !body
                    .get(..i)
                    .is_some_and(|head| head.ends_with(['e', 'E']))
        })
        .map(|(i, _)| i)?;
    let (real_text, imag_text) = body.split_at(split);
    let real = match parse_unsigned(real_text)? {
        Component::Int(i) => i as f64,
        Component::Float(f) => f,
        _ => return None,
    };
    let (imag_sign, imag_body) = strip_sign(imag_text);
    match parse_unsigned(imag_body)? {
        Component::Complex(_, im) => Some(Component::Complex(sign * real, imag_sign * im)),
        _ => None,
    }
}

fn parse_unsigned(body: &str) -> Option<Component> {
    if let Some(imag) = body.strip_suffix(['j', 'J']) {
        let value = if DIGITS_RE.is_match(imag) || FLOAT_RE.is_match(imag) {
            imag.replace('_', "").parse::<f64>().ok()?
        } else {
            return None;
        };
        return Some(Component::Complex(0.0, value));
    }
    if INT_RE.is_match(body) {
        let clean = body.replace('_', "");
        let (radix, digits) = match clean.get(..2) {
            Some("0x" | "0X") => (16, clean.get(2..)?),
            Some("0o" | "0O") => (8, clean.get(2..)?),
            Some("0b" | "0B") => (2, clean.get(2..)?),
            _ => (10, clean.as_str()),
        };
        return match i64::from_str_radix(digits, radix) {
            Ok(value) => Some(Component::Int(value)),
            Err(e) => {
                log::debug!("Integer literal '{}' does not fit in 64 bits ({}), keeping it as text", body, e);
                None
            }
        };
    }
    if FLOAT_RE.is_match(body) {
        return body.replace('_', "").parse::<f64>().ok().map(Component::Float);
    }
    None
}

// --- Recursive descent over containers ---

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while self.peek().is_some_and(|c| c != '\n') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_trivia();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_top(&mut self) -> Option<Component> {
        self.skip_trivia();
        if self.at_end() {
            return None;
        }
        let first = self.parse_element(0)?;
        self.skip_trivia();
        if self.at_end() {
            return Some(first);
        }
        // A top-level comma makes a tuple.
        let mut items = vec![first];
        while self.eat(',') {
            self.skip_trivia();
            if self.at_end() {
                break;
            }
            items.push(self.parse_element(0)?);
        }
        self.skip_trivia();
        self.at_end().then(|| Component::tuple(items))
    }

    /// `brace_depth` counts enclosing `{...}`; inside them `:` ends a word.
    fn parse_element(&mut self, brace_depth: usize) -> Option<Component> {
        self.skip_trivia();
        match self.peek()? {
            '[' => {
                self.pos += 1;
                let items = self.parse_sequence(']', brace_depth)?;
                Some(Component::list(items))
            }
            '(' => {
                self.pos += 1;
                if self.eat(')') {
                    return Some(Component::tuple(Vec::new()));
                }
                let first = self.parse_element(brace_depth)?;
                if self.eat(')') {
                    return Some(first);
                }
                if !self.eat(',') {
                    return None;
                }
                let mut items = vec![first];
                items.extend(self.parse_sequence(')', brace_depth)?);
                Some(Component::tuple(items))
            }
            '{' => {
                self.pos += 1;
                self.parse_braces(brace_depth + 1)
            }
            '\'' | '"' => self.parse_string(),
            _ => self.parse_bareword(brace_depth),
        }
    }

    /// Comma separated elements up to `close`, trailing comma allowed.
    fn parse_sequence(&mut self, close: char, brace_depth: usize) -> Option<Vec<Component>> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Some(items);
            }
            items.push(self.parse_element(brace_depth)?);
            if self.eat(close) {
                return Some(items);
            }
            if !self.eat(',') {
                return None;
            }
        }
    }

    fn parse_braces(&mut self, brace_depth: usize) -> Option<Component> {
        if self.eat('}') {
            return Some(Component::dict(Vec::new()));
        }
        let first = self.parse_element(brace_depth)?;
        if self.eat(':') {
            let mut entries = Vec::new();
            let mut key = first;
            loop {
                if !is_hashable(&key) {
                    return None;
                }
                let value = self.parse_element(brace_depth)?;
                entries.push((key, value));
                if self.eat('}') {
                    return Some(Component::dict(entries));
                }
                if !self.eat(',') {
                    return None;
                }
                if self.eat('}') {
                    return Some(Component::dict(entries));
                }
                key = self.parse_element(brace_depth)?;
                if !self.eat(':') {
                    return None;
                }
            }
        }
        if !is_hashable(&first) {
            return None;
        }
        let mut items = vec![first];
        if !self.eat('}') {
            if !self.eat(',') {
                return None;
            }
            items.extend(self.parse_sequence('}', brace_depth)?);
        }
        if !items.iter().all(is_hashable) {
            return None;
        }
        Some(Component::set(items))
    }

    fn parse_string(&mut self) -> Option<Component> {
        let quote = self.peek()?;
        let triple = self.chars.get(self.pos..self.pos + 3) == Some(&[quote, quote, quote][..]);
        self.pos += if triple { 3 } else { 1 };
        let mut out = String::new();
        loop {
            let c = self.peek()?;
            if c == quote {
                if !triple {
                    self.pos += 1;
                    return Some(Component::Str(out));
                }
                if self.chars.get(self.pos..self.pos + 3) == Some(&[quote, quote, quote][..]) {
                    self.pos += 3;
                    return Some(Component::Str(out));
                }
            }
            if c == '\n' && !triple {
                return None;
            }
            self.pos += 1;
            if c == '\\' {
                let escaped = self.peek()?;
                self.pos += 1;
                match escaped {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '0' => out.push('\0'),
                    '\\' | '\'' | '"' => out.push(escaped),
                    '\n' => {}
                    'x' => out.push(self.parse_code_point(2)?),
                    'u' => out.push(self.parse_code_point(4)?),
                    'U' => out.push(self.parse_code_point(8)?),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            } else {
                out.push(c);
            }
        }
    }

    fn parse_code_point(&mut self, width: usize) -> Option<char> {
        let digits: String = self.chars.get(self.pos..self.pos + width)?.iter().collect();
        self.pos += width;
        char::from_u32(u32::from_str_radix(&digits, 16).ok()?)
    }

    fn parse_bareword(&mut self, brace_depth: usize) -> Option<Component> {
        let start = self.pos;
        let in_container = brace_depth > 0 || self.inside_container(start);
        while let Some(c) = self.peek() {
            let ends = match c {
                ',' | ']' | ')' | '}' => true,
                ':' => brace_depth > 0,
                '[' | '(' | '{' => in_container,
                _ => false,
            };
            if ends {
                break;
            }
            self.pos += 1;
        }
        let word: String = self.chars.get(start..self.pos)?.iter().collect();
        classify_word(word.trim())
    }

    fn inside_container(&self, start: usize) -> bool {
        self.chars
            .get(..start)
            .is_some_and(|before| before.iter().any(|c| matches!(c, '[' | '(' | '{')))
    }
}

/// A bare word is a scalar literal, a literal followed by a `#` comment, or
/// a plain string.
fn classify_word(word: &str) -> Option<Component> {
    if word.is_empty() {
        return None;
    }
    if word == "..." {
        return Some(Component::Str(word.to_string()));
    }
    if let Some(value) = parse_scalar(word) {
        return Some(value);
    }
    if let Some((head, _comment)) = word.split_once('#')
        && let Some(value) = parse_scalar(head.trim())
    {
        return Some(value);
    }
    Some(Component::Str(word.to_string()))
}

fn is_hashable(value: &Component) -> bool {
    match value {
        Component::List(_) | Component::Dict(_) | Component::Set(_) => false,
        Component::Tuple(items) => items.iter().all(is_hashable),
        _ => true,
    }
}
