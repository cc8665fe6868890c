//! Selector helpers: pseudo splitting, specificity and `apply_to` matching

use crate::types::Rule;
use regex::Regex;
use std::cmp::Ordering;

/// CSS specificity as (ids, classes, types). Pseudo-classes and attribute
/// selectors count at class level, pseudo-elements at type level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Specificity {
    pub ids: u32,
    pub classes: u32,
    pub types: u32,
}

impl Specificity {
    pub fn new(ids: u32, classes: u32, types: u32) -> Self {
        Self { ids, classes, types }
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.ids, self.classes, self.types).cmp(&(other.ids, other.classes, other.types))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::ops::Add for Specificity {
    type Output = Specificity;

    fn add(self, rhs: Specificity) -> Specificity {
        Specificity::new(self.ids + rhs.ids, self.classes + rhs.classes, self.types + rhs.types)
    }
}

/// Specificity of a single complex selector (no selector lists).
pub fn specificity(selector: &str) -> Specificity {
    let chars: Vec<char> = selector.chars().collect();
    let mut spec = Specificity::default();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '#' => {
                spec.ids += 1;
                i = skip_ident(&chars, i + 1);
            }
            '.' => {
                spec.classes += 1;
                i = skip_ident(&chars, i + 1);
            }
            '[' => {
                spec.classes += 1;
                i = skip_balanced(&chars, i, '[', ']');
            }
            ':' => {
                let element = chars.get(i + 1) == Some(&':');
                let start = if element { i + 2 } else { i + 1 };
                let end = skip_ident(&chars, start);
                let name: String = chars[start..end].iter().collect::<String>().to_ascii_lowercase();
                let mut next = end;
                let mut argument = None;
                if chars.get(end) == Some(&'(') {
                    next = skip_balanced(&chars, end, '(', ')');
                    let inner_end = next.saturating_sub(1).max(end + 1);
                    argument = Some(chars[end + 1..inner_end].iter().collect::<String>());
                }

                if element || is_legacy_pseudo_element(&name) {
                    spec.types += 1;
                } else {
                    match (name.as_str(), argument) {
                        ("where", _) => {}
                        ("not" | "is" | "has", Some(arg)) => {
                            let inner = arg
                                .split(',')
                                .map(|part| specificity(part.trim()))
                                .max()
                                .unwrap_or_default();
                            spec = spec + inner;
                        }
                        _ => spec.classes += 1,
                    }
                }
                i = next;
            }
            '*' | ' ' | '>' | '+' | '~' | '\t' | '\n' => i += 1,
            c if c.is_alphabetic() || c == '_' || c == '-' => {
                spec.types += 1;
                i = skip_ident(&chars, i);
            }
            _ => i += 1,
        }
    }

    spec
}

fn is_legacy_pseudo_element(name: &str) -> bool {
    matches!(name, "before" | "after" | "first-line" | "first-letter")
}

fn skip_ident(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 2;
        } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            i += 1;
        } else {
            break;
        }
    }
    i.min(chars.len())
}

fn skip_balanced(chars: &[char], start: usize, open: char, close: char) -> usize {
    let mut depth = 0;
    let mut i = start;
    while i < chars.len() {
        if chars[i] == open {
            depth += 1;
        } else if chars[i] == close {
            depth -= 1;
            if depth == 0 {
                return i + 1;
            }
        }
        i += 1;
    }
    chars.len()
}

/// Splits `.btn:hover` into (`.btn`, `Some(":hover")`). Selectors whose
/// pseudo part is followed by a combinator are kept whole.
pub fn split_pseudo(selector: &str) -> (String, Option<String>) {
    let selector = selector.trim();
    let mut depth = 0i32;
    let mut escaped = false;

    for (idx, c) in selector.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ':' if depth == 0 => {
                let (base, pseudo) = selector.split_at(idx);
                if base.is_empty() || has_top_level_combinator(pseudo) {
                    return (selector.to_string(), None);
                }
                return (base.to_string(), Some(pseudo.to_string()));
            }
            _ => {}
        }
    }
    (selector.to_string(), None)
}

fn has_top_level_combinator(part: &str) -> bool {
    let mut depth = 0i32;
    for c in part.chars() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ' ' | '>' | '+' | '~' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

/// Returns the class name and pseudo part of a simple class selector such
/// as `.p-3`, `.btn:hover` or `.md\:flex`; `None` for anything compound.
pub fn simple_class(selector: &str) -> Option<(String, Option<String>)> {
    let (base, pseudo) = split_pseudo(selector);
    let rest = base.strip_prefix('.')?;
    let mut name = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => name.push(chars.next()?),
            c if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => name.push(c),
            _ => return None,
        }
    }
    if name.is_empty() {
        return None;
    }
    Some((name, pseudo))
}

/// Class name of a selector that is exactly one class, e.g. `.btn`
pub fn class_name(selector: &str) -> Option<String> {
    match simple_class(selector) {
        Some((name, None)) => Some(name),
        _ => None,
    }
}

/// Lowercase alphanumeric runs joined by `-`, used as a naming seed.
pub fn slug(selector: &str) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in selector.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "style".to_string()
    } else {
        out
    }
}

/// Decides whether a rule is addressed by an `apply_to` list.
///
/// Keywords: `all`, `base` (no pseudo state), `states` (any pseudo state),
/// `.*` (any class rule without a pseudo state).
/// A bare `:hover` matches rules in that state, patterns containing `*`
/// are globs over the full selector, anything else must equal it.
pub fn matches_apply_to(rule: &Rule, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| matches_pattern(rule, pattern.trim()))
}

fn matches_pattern(rule: &Rule, pattern: &str) -> bool {
    let full = rule.full_selector();
    match pattern {
        "all" | "*" => true,
        "base" => rule.pseudo.is_none(),
        ".*" => rule.pseudo.is_none() && rule.selector.starts_with('.'),
        "states" => rule.pseudo.is_some(),
        p if p.starts_with(':') => rule.pseudo.as_deref() == Some(p),
        p if p.contains('*') => glob_matches(p, &full),
        p => p == full,
    }
}

fn glob_matches(pattern: &str, text: &str) -> bool {
    let expr = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("^{}$", expr)) {
        Ok(re) => re.is_match(text),
        Err(e) => {
            log::warn!("Ignoring apply_to pattern '{}': {}", pattern, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specificity_ordering() {
        assert_eq!(specificity("#main"), Specificity::new(1, 0, 0));
        assert_eq!(specificity(".btn"), Specificity::new(0, 1, 0));
        assert_eq!(specificity(".btn:hover"), Specificity::new(0, 2, 0));
        assert_eq!(specificity("a"), Specificity::new(0, 0, 1));
        assert_eq!(specificity("div.card > p::before"), Specificity::new(0, 1, 3));
        assert_eq!(specificity("input[type=text]"), Specificity::new(0, 1, 1));
        assert_eq!(specificity(":where(#a) .x"), Specificity::new(0, 1, 0));
        assert_eq!(specificity(".a:not(#b)"), Specificity::new(1, 1, 0));
        assert_eq!(specificity("*"), Specificity::default());

        assert!(specificity("#x") > specificity(".a.b.c.d"));
        assert!(specificity(".btn:hover") > specificity(".btn"));
    }

    #[test]
    fn test_split_pseudo() {
        assert_eq!(split_pseudo(".btn"), (".btn".to_string(), None));
        assert_eq!(split_pseudo(".btn:hover"), (".btn".to_string(), Some(":hover".to_string())));
        assert_eq!(
            split_pseudo("a:visited:hover"),
            ("a".to_string(), Some(":visited:hover".to_string()))
        );
        assert_eq!(
            split_pseudo("li:nth-child(2n+1)"),
            ("li".to_string(), Some(":nth-child(2n+1)".to_string()))
        );
        assert_eq!(split_pseudo("a:hover .icon"), ("a:hover .icon".to_string(), None));
        assert_eq!(split_pseudo(".md\\:flex"), (".md\\:flex".to_string(), None));
    }

    #[test]
    fn test_simple_class() {
        assert_eq!(simple_class(".p-3"), Some(("p-3".to_string(), None)));
        assert_eq!(
            simple_class(".btn:focus"),
            Some(("btn".to_string(), Some(":focus".to_string())))
        );
        assert_eq!(simple_class(".md\\:flex"), Some(("md:flex".to_string(), None)));
        assert_eq!(simple_class(".card .title"), None);
        assert_eq!(simple_class(".btn.primary"), None);
        assert_eq!(simple_class("#id"), None);
        assert_eq!(class_name(".btn:hover"), None);
        assert_eq!(class_name(".btn"), Some("btn".to_string()));
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug(".btn-primary"), "btn-primary");
        assert_eq!(slug("#main .nav > a"), "main-nav-a");
        assert_eq!(slug(""), "style");
    }

    #[test]
    fn test_apply_to_matching() {
        let base = Rule::new(".btn");
        let hover = Rule::new(".btn:hover");
        let patterns = |p: &[&str]| p.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        assert!(matches_apply_to(&base, &patterns(&["all"])));
        assert!(matches_apply_to(&hover, &patterns(&["all"])));
        assert!(matches_apply_to(&base, &patterns(&["base"])));
        assert!(!matches_apply_to(&hover, &patterns(&["base"])));
        assert!(matches_apply_to(&hover, &patterns(&["states"])));
        assert!(matches_apply_to(&hover, &patterns(&["*:hover"])));
        assert!(!matches_apply_to(&base, &patterns(&["*:hover"])));
        assert!(matches_apply_to(&base, &patterns(&[".*"])));
        assert!(!matches_apply_to(&hover, &patterns(&[".*"])));
        assert!(!matches_apply_to(&Rule::new("a"), &patterns(&[".*"])));
        assert!(matches_apply_to(&hover, &patterns(&[".b*"])));
        assert!(matches_apply_to(&hover, &patterns(&[":hover"])));
        assert!(matches_apply_to(&base, &patterns(&[".card", ".btn"])));
        assert!(!matches_apply_to(&hover, &patterns(&[".btn"])));
    }
}
