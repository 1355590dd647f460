//! Tolerant JSON repair.
//!
//! Reads "almost JSON" the way language models tend to emit it and re-emits
//! strict JSON text: fences are stripped, single/typographic quotes are
//! normalised, keys and bare words get quoted, trailing commas are dropped,
//! missing commas are inserted and brackets left open by truncation are
//! closed. The output still has to go through `serde_json`.

use std::fmt;

/// Same nesting limit `serde_json` enforces; anything deeper could not be
/// parsed afterwards anyway.
const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepairError {
    Empty,
    UnexpectedCharacter { found: char, position: usize },
    TrailingContent { position: usize },
    TooDeep { position: usize },
}

impl fmt::Display for RepairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairError::Empty => write!(f, "Nothing to repair"),
            RepairError::UnexpectedCharacter { found, position } => {
                write!(f, "Unexpected character '{}' at position {}", found, position)
            }
            RepairError::TrailingContent { position } => {
                write!(f, "Unexpected content after JSON value at position {}", position)
            }
            RepairError::TooDeep { position } => {
                write!(f, "Nesting deeper than {} levels at position {}", MAX_DEPTH, position)
            }
        }
    }
}

impl std::error::Error for RepairError {}

/// Repair `input` into strict JSON text.
pub fn repair_json(input: &str) -> Result<String, RepairError> {
    let mut repairer = Repairer::new(strip_fences(input));

    repairer.skip_insignificant();
    if repairer.at_end() {
        return Err(RepairError::Empty);
    }

    repairer.value()?;

    repairer.skip_insignificant();
    if !repairer.at_end() {
        return Err(RepairError::TrailingContent {
            position: repairer.pos,
        });
    }

    Ok(repairer.output)
}

fn strip_fences(input: &str) -> &str {
    let mut text = input.trim();

    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        };
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    text.trim()
}

struct Repairer {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    output: String,
}

impl Repairer {
    fn new(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
            output: String::with_capacity(text.len()),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Whitespace plus `//` and `/* */` comments.
    fn skip_insignificant(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => self.pos += 1,
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while !self.at_end() && !(self.peek() == Some('*') && self.peek_at(1) == Some('/')) {
                        self.pos += 1;
                    }
                    self.pos = (self.pos + 2).min(self.chars.len());
                }
                _ => break,
            }
        }
    }

    fn value(&mut self) -> Result<(), RepairError> {
        self.skip_insignificant();

        match self.peek() {
            // Truncated right where a value was expected, or `"key": }`
            None | Some('}') | Some(']') | Some(',') => {
                self.output.push_str("null");
                Ok(())
            }
            Some('{') => self.object(),
            Some('[') => self.array(),
            Some(c) if is_quote(c) => {
                self.string();
                Ok(())
            }
            Some(c) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => {
                self.number();
                Ok(())
            }
            Some(':') => Err(RepairError::UnexpectedCharacter {
                found: ':',
                position: self.pos,
            }),
            Some(_) => {
                self.bare_word();
                Ok(())
            }
        }
    }

    fn enter(&mut self) -> Result<(), RepairError> {
        if self.depth >= MAX_DEPTH {
            return Err(RepairError::TooDeep { position: self.pos });
        }
        self.depth += 1;
        self.pos += 1;
        Ok(())
    }

    fn object(&mut self) -> Result<(), RepairError> {
        self.enter()?;
        self.output.push('{');

        let mut first = true;
        loop {
            self.skip_insignificant();
            match self.peek() {
                None => break,
                Some('}') | Some(']') => {
                    self.pos += 1;
                    break;
                }
                Some(',') => self.pos += 1,
                Some(_) => {
                    if !first {
                        self.output.push(',');
                    }
                    self.key()?;

                    self.skip_insignificant();
                    if self.peek() == Some(':') {
                        self.pos += 1;
                    }
                    self.output.push(':');

                    self.value()?;
                    first = false;
                }
            }
        }

        self.output.push('}');
        self.depth -= 1;
        Ok(())
    }

    fn array(&mut self) -> Result<(), RepairError> {
        self.enter()?;
        self.output.push('[');

        let mut first = true;
        loop {
            self.skip_insignificant();
            match self.peek() {
                None => break,
                Some(']') | Some('}') => {
                    self.pos += 1;
                    break;
                }
                Some(',') => self.pos += 1,
                Some(':') => {
                    return Err(RepairError::UnexpectedCharacter {
                        found: ':',
                        position: self.pos,
                    })
                }
                Some(_) => {
                    if !first {
                        self.output.push(',');
                    }
                    self.value()?;
                    first = false;
                }
            }
        }

        self.output.push(']');
        self.depth -= 1;
        Ok(())
    }

    fn key(&mut self) -> Result<(), RepairError> {
        match self.peek() {
            Some(c) if is_quote(c) => {
                self.string();
                Ok(())
            }
            Some(c) if is_bare_key_char(c) => {
                let start = self.pos;
                while self.peek().map_or(false, is_bare_key_char) {
                    self.pos += 1;
                }
                let key: String = self.chars[start..self.pos].iter().collect();
                push_json_string(&mut self.output, &key);
                Ok(())
            }
            Some(c) => Err(RepairError::UnexpectedCharacter {
                found: c,
                position: self.pos,
            }),
            None => Err(RepairError::Empty),
        }
    }

    fn string(&mut self) {
        let open = match self.bump() {
            Some(c) => c,
            None => return,
        };
        let close = closing_quote(open);

        self.output.push('"');
        while let Some(c) = self.bump() {
            if c == '\\' {
                match self.bump() {
                    Some(e @ ('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u')) => {
                        self.output.push('\\');
                        self.output.push(e);
                    }
                    Some('\'') => self.output.push('\''),
                    Some(other) => {
                        self.output.push_str("\\\\");
                        push_string_char(&mut self.output, other);
                    }
                    None => self.output.push_str("\\\\"),
                }
                continue;
            }
            if c == close {
                self.output.push('"');
                return;
            }
            push_string_char(&mut self.output, c);
        }

        // Truncated inside a string.
        self.output.push('"');
    }

    fn number(&mut self) {
        let start = self.pos;
        while self
            .peek()
            .map_or(false, |c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();

        // "5 stars", "3-4 hours" and friends are text, not numbers.
        let followed_by_text = self.chars[self.pos..]
            .iter()
            .take_while(|c| !is_bare_word_delimiter(**c))
            .any(|c| !c.is_whitespace());

        match normalize_number(&token) {
            Some(number) if !followed_by_text => self.output.push_str(&number),
            _ => {
                self.pos = start;
                self.bare_word();
            }
        }
    }

    fn bare_word(&mut self) {
        let start = self.pos;
        while self.peek().map_or(false, |c| !is_bare_word_delimiter(c)) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let word = word.trim_end();

        match word {
            "true" | "True" | "TRUE" => self.output.push_str("true"),
            "false" | "False" | "FALSE" => self.output.push_str("false"),
            "null" | "Null" | "NULL" | "None" | "undefined" | "NaN" => self.output.push_str("null"),
            _ => push_json_string(&mut self.output, word),
        }
    }
}

fn is_quote(c: char) -> bool {
    matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}' | '\u{2018}' | '\u{2019}')
}

fn closing_quote(open: char) -> char {
    match open {
        '\u{201C}' | '\u{201D}' => '\u{201D}',
        '\u{2018}' | '\u{2019}' => '\u{2019}',
        other => other,
    }
}

fn is_bare_key_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, ':' | ',' | '{' | '}' | '[' | ']') && !is_quote(c)
}

fn is_bare_word_delimiter(c: char) -> bool {
    matches!(c, ',' | '}' | ']' | '\n' | '\r')
}

fn normalize_number(token: &str) -> Option<String> {
    let mut number = token.trim_start_matches('+').to_string();

    if number.starts_with('.') {
        number.insert(0, '0');
    } else if number.starts_with("-.") {
        number.insert(1, '0');
    }
    if number.ends_with(&['.', 'e', 'E'][..]) {
        number.push('0');
    }

    // JSON forbids leading zeros ("007")
    let digits = number.trim_start_matches('-');
    if digits.len() > 1 && digits.starts_with('0') && !digits[1..].starts_with(&['.', 'e', 'E'][..]) {
        return None;
    }

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(number),
        _ => None,
    }
}

fn push_json_string(output: &mut String, text: &str) {
    output.push('"');
    for c in text.chars() {
        match c {
            '\\' => output.push_str("\\\\"),
            other => push_string_char(output, other),
        }
    }
    output.push('"');
}

/// Push one unescaped character into an open JSON string.
fn push_string_char(output: &mut String, c: char) {
    match c {
        '"' => output.push_str("\\\""),
        '\n' => output.push_str("\\n"),
        '\r' => output.push_str("\\r"),
        '\t' => output.push_str("\\t"),
        c if (c as u32) < 0x20 => output.push_str(&format!("\\u{:04x}", c as u32)),
        c => output.push(c),
    }
}
