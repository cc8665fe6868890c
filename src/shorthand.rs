//! Shorthand expansion and collapse
//!
//! `expand` turns a shorthand declaration into its components following the
//! group's value-slot rule, `collapse` rebuilds the shorthand when every
//! component is present with a uniform importance flag.

use crate::core::constants::{
    CSS_WIDE_KEYWORDS, INITIAL_LINE_COLOR, INITIAL_LINE_STYLE, INITIAL_LINE_WIDTH,
    LINE_STYLE_KEYWORDS, LINE_WIDTH_KEYWORDS,
};
use crate::core::properties::{self, ShorthandGroup, SlotRule, SHORTHAND_GROUPS};
use crate::types::Declaration;
use std::fmt;

/// Splits a value on top-level whitespace, keeping `rgb(0, 0, 0)` and
/// quoted strings as single tokens.
pub fn tokenize_value(value: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;

    for c in value.trim().chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => {
                    quote = Some(c);
                    current.push(c);
                }
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth -= 1;
                    current.push(c);
                }
                c if c.is_whitespace() && depth <= 0 => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            },
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineSlot {
    Width,
    Style,
    Color,
}

fn classify_line_token(token: &str) -> LineSlot {
    let lower = token.to_ascii_lowercase();
    if LINE_WIDTH_KEYWORDS.contains(&lower.as_str()) || is_length_like(&lower) {
        LineSlot::Width
    } else if LINE_STYLE_KEYWORDS.contains(&lower.as_str()) {
        LineSlot::Style
    } else {
        LineSlot::Color
    }
}

pub(crate) fn is_length_like(token: &str) -> bool {
    let first = token.chars().next();
    match first {
        Some(c) if c.is_ascii_digit() || c == '.' => true,
        Some('-') | Some('+') => token[1..].starts_with(|c: char| c.is_ascii_digit() || c == '.'),
        _ => ["calc(", "min(", "max(", "clamp("].iter().any(|f| token.starts_with(f)),
    }
}

fn is_number(token: &str) -> bool {
    token.parse::<f64>().is_ok()
}

/// Component values for a shorthand value, in the group's longhand order.
/// `None` when the value cannot be split safely.
pub fn decompose(group: &ShorthandGroup, value: &str) -> Option<Vec<String>> {
    if !group.is_decomposable() || value.contains("var(") {
        return None;
    }
    let tokens = tokenize_value(value);
    if tokens.is_empty() {
        return None;
    }

    let n = group.longhands.len();
    if tokens.len() == 1 && CSS_WIDE_KEYWORDS.contains(&tokens[0].to_ascii_lowercase().as_str()) {
        return Some(vec![tokens[0].clone(); n]);
    }

    match group.slots {
        SlotRule::Box => {
            if tokens.iter().any(|t| t.contains('/')) {
                return None;
            }
            let [top, right, bottom, left] = match tokens.as_slice() {
                [a] => [a, a, a, a],
                [a, b] => [a, b, a, b],
                [a, b, c] => [a, b, c, b],
                [a, b, c, d] => [a, b, c, d],
                _ => return None,
            };
            Some(vec![top.clone(), right.clone(), bottom.clone(), left.clone()])
        }
        SlotRule::Pair => match tokens.as_slice() {
            [a] => Some(vec![a.clone(), a.clone()]),
            [a, b] => Some(vec![a.clone(), b.clone()]),
            _ => None,
        },
        SlotRule::Keyword => {
            let mut width = None;
            let mut style = None;
            let mut color = None;
            for token in &tokens {
                let slot = match classify_line_token(token) {
                    LineSlot::Width => &mut width,
                    LineSlot::Style => &mut style,
                    LineSlot::Color => &mut color,
                };
                if slot.is_some() {
                    return None;
                }
                *slot = Some(token.clone());
            }
            Some(vec![
                width.unwrap_or_else(|| INITIAL_LINE_WIDTH.to_string()),
                style.unwrap_or_else(|| INITIAL_LINE_STYLE.to_string()),
                color.unwrap_or_else(|| INITIAL_LINE_COLOR.to_string()),
            ])
        }
        SlotRule::Flex => decompose_flex(&tokens),
        SlotRule::Opaque => None,
    }
}

fn decompose_flex(tokens: &[String]) -> Option<Vec<String>> {
    let owned = |a: &str, b: &str, c: &str| Some(vec![a.to_string(), b.to_string(), c.to_string()]);
    match tokens {
        [single] => match single.to_ascii_lowercase().as_str() {
            "none" => owned("0", "0", "auto"),
            "auto" => owned("1", "1", "auto"),
            v if is_number(v) => owned(single, "1", "0%"),
            _ => owned("1", "1", single),
        },
        [grow, second] if is_number(grow) => {
            if is_number(second) {
                owned(grow, second, "0%")
            } else {
                owned(grow, "1", second)
            }
        }
        [grow, shrink, basis] if is_number(grow) && is_number(shrink) => owned(grow, shrink, basis),
        _ => None,
    }
}

/// Shorthand value for component values given in longhand order.
/// Produces the shortest form that expands back to the same values.
pub fn compose(group: &ShorthandGroup, values: &[String]) -> Option<String> {
    if values.len() != group.longhands.len() || values.iter().any(|v| v.is_empty()) {
        return None;
    }
    if let Some(first) = values.first() {
        let keyword = CSS_WIDE_KEYWORDS.contains(&first.to_ascii_lowercase().as_str());
        if keyword && values.iter().all(|v| v == first) {
            return Some(first.clone());
        }
    }
    if values
        .iter()
        .any(|v| CSS_WIDE_KEYWORDS.contains(&v.to_ascii_lowercase().as_str()))
    {
        return None;
    }

    match group.slots {
        SlotRule::Box => {
            let (t, r, b, l) = (&values[0], &values[1], &values[2], &values[3]);
            let parts: Vec<&String> = if t == r && t == b && t == l {
                vec![t]
            } else if t == b && r == l {
                vec![t, r]
            } else if r == l {
                vec![t, r, b]
            } else {
                vec![t, r, b, l]
            };
            Some(join(&parts))
        }
        SlotRule::Pair => {
            if values[0] == values[1] {
                Some(values[0].clone())
            } else {
                Some(format!("{} {}", values[0], values[1]))
            }
        }
        SlotRule::Keyword => {
            if values.iter().any(|v| tokenize_value(v).len() != 1) {
                return None;
            }
            let initials = [INITIAL_LINE_WIDTH, INITIAL_LINE_STYLE, INITIAL_LINE_COLOR];
            let parts: Vec<&String> = values
                .iter()
                .zip(initials.iter())
                .filter(|(v, initial)| !v.eq_ignore_ascii_case(initial))
                .map(|(v, _)| v)
                .collect();
            if parts.is_empty() {
                Some(INITIAL_LINE_STYLE.to_string())
            } else {
                Some(join(&parts))
            }
        }
        SlotRule::Flex => {
            if values.iter().any(|v| tokenize_value(v).len() != 1) {
                return None;
            }
            Some(format!("{} {} {}", values[0], values[1], values[2]))
        }
        SlotRule::Opaque => None,
    }
}

fn join(parts: &[&String]) -> String {
    parts.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(" ")
}

/// Direct components of a shorthand declaration, each inheriting its
/// importance. `None` for longhands and undecomposable values.
pub fn expand(decl: &Declaration) -> Option<Vec<Declaration>> {
    let group = properties::shorthand_group(&decl.property)?;
    let values = decompose(group, &decl.value)?;
    Some(
        group
            .longhands
            .iter()
            .zip(values)
            .map(|(longhand, value)| Declaration {
                property: longhand.to_string(),
                value,
                important: decl.important,
            })
            .collect(),
    )
}

/// Expands down to leaf longhands. A longhand expands to itself; `None`
/// when any shorthand on the way cannot be decomposed.
pub fn expand_fully(decl: &Declaration) -> Option<Vec<Declaration>> {
    if !properties::is_shorthand(&decl.property) {
        return Some(vec![decl.clone()]);
    }
    let mut out = Vec::new();
    for component in expand(decl)? {
        out.extend(expand_fully(&component)?);
    }
    Some(out)
}

pub fn can_expand(decl: &Declaration) -> bool {
    !properties::is_shorthand(&decl.property) || expand_fully(decl).is_some()
}

/// Why a collapse was refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollapseFailure {
    MissingComponent(String),
    MixedImportance,
    Incompatible,
}

impl fmt::Display for CollapseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingComponent(p) => write!(f, "component '{}' is not defined", p),
            Self::MixedImportance => write!(f, "components have mixed !important flags"),
            Self::Incompatible => write!(f, "component values cannot be combined"),
        }
    }
}

/// Rebuilds `group` from its components. The last declaration of each
/// component wins.
pub fn try_collapse(
    group: &ShorthandGroup,
    components: &[Declaration],
) -> Result<Declaration, CollapseFailure> {
    let mut picked: Vec<&Declaration> = Vec::with_capacity(group.longhands.len());
    for longhand in group.longhands {
        let decl = components
            .iter()
            .rev()
            .find(|d| d.property == *longhand)
            .ok_or_else(|| CollapseFailure::MissingComponent(longhand.to_string()))?;
        picked.push(decl);
    }

    let important = picked[0].important;
    if picked.iter().any(|d| d.important != important) {
        return Err(CollapseFailure::MixedImportance);
    }

    let values: Vec<String> = picked.iter().map(|d| d.value.clone()).collect();
    let value = compose(group, &values).ok_or(CollapseFailure::Incompatible)?;
    Ok(Declaration {
        property: group.name.to_string(),
        value,
        important,
    })
}

pub fn collapse(group: &ShorthandGroup, components: &[Declaration]) -> Option<Declaration> {
    try_collapse(group, components).ok()
}

/// Collapses, in place, every decomposable group overlapping one of
/// `related` whose components are all present. The shorthand takes the
/// position of its first component. Groups blocked only by mixed
/// importance are reported back so the caller can warn.
pub fn collapse_related(decls: &mut Vec<Declaration>, related: &[&str]) -> Vec<(String, CollapseFailure)> {
    let mut refused = Vec::new();

    for group in SHORTHAND_GROUPS.iter().filter(|g| g.is_decomposable()) {
        if !related.iter().any(|r| properties::overlaps(group.name, r)) {
            continue;
        }

        let positions: Vec<usize> = decls
            .iter()
            .enumerate()
            .filter(|(_, d)| group.position(&d.property).is_some())
            .map(|(i, _)| i)
            .collect();
        if positions.is_empty() {
            continue;
        }
        let first = positions[0];
        let last = positions[positions.len() - 1];

        // Another overlapping declaration inside the span would be reordered.
        let blocked = decls[first..=last].iter().any(|d| {
            group.position(&d.property).is_none() && properties::overlaps(group.name, &d.property)
        });
        if blocked {
            continue;
        }

        let components: Vec<Declaration> = positions.iter().map(|&i| decls[i].clone()).collect();
        match try_collapse(group, &components) {
            Ok(shorthand) => {
                for &i in positions.iter().rev() {
                    decls.remove(i);
                }
                decls.insert(first, shorthand);
            }
            Err(CollapseFailure::MixedImportance) => {
                refused.push((group.name.to_string(), CollapseFailure::MixedImportance));
            }
            Err(_) => {}
        }
    }

    refused
}
