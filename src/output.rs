//! Rule formatting and inline-style naming

use crate::core::constants::INDENT;
use crate::types::{Declaration, Rule};

/// `color: red; margin: 0 !important;`
pub fn format_declarations(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{};", d))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-line rule: `.btn { color: red; }`, wrapped in its media block.
/// A rule without a selector renders as a bare declaration block.
pub fn format_rule_compact(rule: &Rule) -> String {
    let selector = rule.full_selector();
    let inner = if selector.is_empty() {
        format_declarations(&rule.declarations)
    } else if rule.declarations.is_empty() {
        format!("{} {{}}", selector)
    } else {
        format!("{} {{ {} }}", selector, format_declarations(&rule.declarations))
    };

    match &rule.media {
        Some(media) => format!("@media {} {{ {} }}", media, inner),
        None => inner,
    }
}

/// Multi-line rule with one declaration per line
pub fn format_rule_expanded(rule: &Rule) -> String {
    let (outer, depth) = match &rule.media {
        Some(_) => (INDENT, 2),
        None => ("", 1),
    };
    let mut lines = vec![format!("{}{} {{", outer, rule.full_selector())];
    for decl in &rule.declarations {
        lines.push(format!("{}{};", INDENT.repeat(depth), decl));
    }
    lines.push(format!("{}}}", outer));
    let body = lines.join("\n");

    match &rule.media {
        Some(media) => format!("@media {} {{\n{}\n}}", media, body),
        None => body,
    }
}

/// `padding-top` -> `paddingTop`, `-webkit-transition` -> `WebkitTransition`,
/// `-ms-transform` -> `msTransform`. Custom properties are left alone.
pub fn to_camel_case(property: &str) -> String {
    if property.starts_with("--") {
        return property.to_string();
    }
    let (mut out, rest) = if let Some(rest) = property.strip_prefix("-ms-") {
        (String::from("ms"), rest)
    } else if let Some(rest) = property.strip_prefix('-') {
        (String::new(), rest)
    } else {
        (String::new(), property)
    };
    let vendor = property.starts_with('-') && !property.starts_with("-ms-");

    for (i, part) in rest.split('-').filter(|p| !p.is_empty()).enumerate() {
        let capitalize = i > 0 || vendor || !out.is_empty();
        if capitalize {
            let mut chars = part.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(part);
        }
    }
    out
}
