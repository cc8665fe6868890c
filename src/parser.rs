//! CSS text adapter
//!
//! Turns stylesheet text into [`Rule`]s (one per selector in a selector
//! list, `@media` blocks recorded on the rule) and declaration blocks into
//! [`Declaration`]s. Other at-rules are skipped.

use crate::error::{CascadeError, Result};
use crate::types::{Declaration, Rule};
use regex::Regex;
use std::sync::OnceLock;

pub struct CssParser {
    chars: Vec<char>,
    position: usize,
    line: usize,
}

impl CssParser {
    pub fn new(source: &str) -> Self {
        Self {
            chars: strip_comments(source).chars().collect(),
            position: 0,
            line: 1,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Rule>> {
        self.parse_block(None, false)
    }

    fn parse_block(&mut self, media: Option<String>, nested: bool) -> Result<Vec<Rule>> {
        let mut rules = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None if nested => {
                    return Err(CascadeError::parse(self.line, "unclosed '@media' block"));
                }
                None => break,
                Some('}') if nested => {
                    self.advance();
                    break;
                }
                Some('}') => {
                    return Err(CascadeError::parse(self.line, "unexpected '}'"));
                }
                Some('@') => {
                    let line = self.line;
                    let (prelude, terminator) = self.read_prelude(&[';', '{'])?;
                    let name = prelude.split_whitespace().next().unwrap_or("").to_ascii_lowercase();
                    if terminator == ';' {
                        log::debug!("Skipping at-rule '{}' at line {}", name, line);
                        continue;
                    }
                    if name == "@media" {
                        let condition = prelude["@media".len()..].trim().to_string();
                        let condition = match &media {
                            Some(outer) => format!("{} and {}", outer, condition),
                            None => condition,
                        };
                        rules.extend(self.parse_block(Some(condition), true)?);
                    } else {
                        log::debug!("Skipping '{}' block at line {}", name, line);
                        self.skip_block(line)?;
                    }
                }
                Some(_) => {
                    let line = self.line;
                    let (prelude, terminator) = self.read_prelude(&['{', ';', '}'])?;
                    if terminator != '{' {
                        return Err(CascadeError::parse(
                            line,
                            format!("expected '{{' after selector '{}'", prelude.trim()),
                        ));
                    }
                    let body_line = self.line;
                    let body = self.read_body(line)?;
                    let declarations = parse_declarations_at(&body, body_line)?;
                    for selector in split_selector_list(&prelude) {
                        if selector.is_empty() {
                            return Err(CascadeError::parse(line, "empty selector"));
                        }
                        let mut rule = Rule::new(&selector).with_declarations(declarations.clone());
                        rule.media = media.clone();
                        rules.push(rule);
                    }
                }
            }
        }

        Ok(rules)
    }

    /// Reads up to (and consumes) one of `terminators` outside quotes and
    /// parentheses.
    fn read_prelude(&mut self, terminators: &[char]) -> Result<(String, char)> {
        let start_line = self.line;
        let mut text = String::new();
        let mut depth = 0i32;
        let mut quote: Option<char> = None;

        while let Some(c) = self.advance() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                text.push(c);
                continue;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '(' | '[' => depth += 1,
                ')' | ']' => depth -= 1,
                c if depth == 0 && terminators.contains(&c) => return Ok((text, c)),
                _ => {}
            }
            text.push(c);
        }
        Err(CascadeError::parse(
            start_line,
            format!("unexpected end of input after '{}'", text.trim()),
        ))
    }

    fn read_body(&mut self, start_line: usize) -> Result<String> {
        let mut body = String::new();
        let mut quote: Option<char> = None;

        while let Some(c) = self.advance() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                body.push(c);
                continue;
            }
            match c {
                '"' | '\'' => quote = Some(c),
                '}' => return Ok(body),
                '{' => {
                    return Err(CascadeError::parse(self.line, "nested rules are not supported"));
                }
                _ => {}
            }
            body.push(c);
        }
        Err(CascadeError::parse(start_line, "unclosed declaration block"))
    }

    fn skip_block(&mut self, start_line: usize) -> Result<()> {
        let mut depth = 1;
        while let Some(c) = self.advance() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Err(CascadeError::parse(start_line, "unclosed at-rule block"))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.get(self.position).copied()?;
        self.position += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }
}

/// Blanks out comments while keeping line breaks for error positions
fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            out.push(c);
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
            out.push(c);
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = ' ';
            for inner in chars.by_ref() {
                if inner == '\n' {
                    out.push('\n');
                }
                if previous == '*' && inner == '/' {
                    break;
                }
                previous = inner;
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

fn split_top_level(text: &str, separator: char) -> Vec<(String, usize)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut line_offset = 0;
    let mut part_offset = 0;

    for c in text.chars() {
        if c == '\n' {
            line_offset += 1;
        }
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            current.push(c);
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            c if c == separator && depth == 0 => {
                parts.push((std::mem::take(&mut current), part_offset));
                part_offset = line_offset;
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    parts.push((current, part_offset));
    parts
}

/// Splits `a, b:hover` into trimmed selectors
pub fn split_selector_list(prelude: &str) -> Vec<String> {
    split_top_level(prelude, ',')
        .into_iter()
        .map(|(s, _)| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect()
}

/// Parses `color: red; margin: 0 !important`
pub fn parse_declarations(text: &str) -> Result<Vec<Declaration>> {
    parse_declarations_at(&strip_comments(text), 1)
}

fn parse_declarations_at(body: &str, first_line: usize) -> Result<Vec<Declaration>> {
    let mut declarations = Vec::new();

    for (part, offset) in split_top_level(body, ';') {
        let leading_lines = part.chars().take_while(|c| c.is_whitespace()).filter(|c| *c == '\n').count();
        let line = first_line + offset + leading_lines;
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (property, value) = part.split_once(':').ok_or_else(|| {
            CascadeError::parse(line, format!("expected ':' in declaration '{}'", part))
        })?;
        let property = property.trim();
        if property.is_empty() || !property.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Err(CascadeError::parse(line, format!("invalid property name '{}'", property)));
        }
        if value.trim().is_empty() {
            return Err(CascadeError::parse(line, format!("missing value for '{}'", property)));
        }
        declarations.push(Declaration::new(property, value));
    }

    Ok(declarations)
}

pub fn parse_stylesheet(text: &str) -> Result<Vec<Rule>> {
    CssParser::new(text).parse()
}

fn class_attribute() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
            .expect("class attribute pattern is valid")
    })
}

/// Class names of the first element carrying a `class` attribute, in
/// order and without repeats.
pub fn extract_classes(html: &str) -> Vec<String> {
    let Some(captures) = class_attribute().captures(html) else {
        return Vec::new();
    };
    let value = captures
        .get(1)
        .or_else(|| captures.get(2))
        .or_else(|| captures.get(3))
        .map(|m| m.as_str())
        .unwrap_or("");

    let mut classes: Vec<String> = Vec::new();
    for class in value.split_whitespace() {
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }
    classes
}
