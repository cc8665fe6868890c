//! Property-name and value sanity checks

use crate::config::ValidationConfig;
use crate::core::constants::LENGTH_UNITS;
use crate::core::properties;
use crate::error::{CascadeError, Result};
use crate::resolver::Diagnostics;
use crate::shorthand::{is_length_like, tokenize_value};
use crate::types::{Declaration, OverrideSpec};
use regex::Regex;

const COMMON_TYPOS: &[(&str, &str)] = &[
    ("colour", "color"),
    ("backround", "background"),
    ("backgroud", "background"),
    ("boder", "border"),
    ("heigth", "height"),
    ("widht", "width"),
    ("maring", "margin"),
    ("pading", "padding"),
    ("dispaly", "display"),
    ("postion", "position"),
    ("z-idx", "z-index"),
];

// Properties whose single-token values must carry a unit unless zero
const LENGTH_PROPERTIES: &[&str] = &[
    "width", "height", "min-width", "min-height", "max-width", "max-height",
    "margin-top", "margin-right", "margin-bottom", "margin-left",
    "padding-top", "padding-right", "padding-bottom", "padding-left",
    "top", "right", "bottom", "left", "font-size", "letter-spacing", "word-spacing",
    "border-top-width", "border-right-width", "border-bottom-width", "border-left-width",
    "outline-width", "outline-offset", "row-gap", "column-gap", "text-indent",
];

pub struct CssValidator {
    config: ValidationConfig,
    hex_color: Regex,
}

impl CssValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            hex_color: Regex::new(r"^#([0-9a-fA-F]{3,4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$")
                .expect("hex color pattern is valid"),
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Checks every override declaration. Issues become warnings, or an
    /// error in strict mode.
    pub fn validate_overrides(&self, overrides: &OverrideSpec, diag: &mut Diagnostics) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        for (_, decl) in overrides.flatten() {
            self.validate_declaration(decl, diag)?;
        }
        if self.config.check_duplicates {
            self.report_duplicates(&overrides.base, "overrides", diag);
        }
        Ok(())
    }

    pub fn validate_declaration(&self, decl: &Declaration, diag: &mut Diagnostics) -> Result<()> {
        for issue in self.declaration_issues(decl) {
            if self.config.strict {
                return Err(CascadeError::validation(issue));
            }
            diag.warn(issue);
        }
        Ok(())
    }

    /// Every problem found with one declaration, as messages
    pub fn declaration_issues(&self, decl: &Declaration) -> Vec<String> {
        let mut issues = Vec::new();
        let name = decl.property.as_str();

        if self.config.check_properties {
            if decl.is_custom() {
                if !self.config.allow_custom {
                    issues.push(format!("custom property '{}' is not allowed", name));
                }
            } else if properties::is_vendor_prefixed(name) {
                if !self.config.allow_vendor {
                    issues.push(format!("vendor-prefixed property '{}' is not allowed", name));
                }
            } else if !properties::is_known(name) {
                match suggest_property(name) {
                    Some(suggestion) => issues.push(format!(
                        "unknown property '{}' (did you mean '{}'?)",
                        name, suggestion
                    )),
                    None => issues.push(format!("unknown property '{}'", name)),
                }
            }
        }

        if self.config.check_values {
            if let Some(issue) = self.value_issue(decl) {
                issues.push(issue);
            }
        }

        issues
    }

    fn value_issue(&self, decl: &Declaration) -> Option<String> {
        let value = decl.value.trim();
        if value.is_empty() {
            return Some(format!("empty value for '{}'", decl.property));
        }
        if value.contains(|c| c == ';' || c == '{' || c == '}') {
            return Some(format!("invalid character in value '{}' for '{}'", value, decl.property));
        }
        if !balanced(value) {
            return Some(format!("unbalanced parentheses or quotes in '{}' for '{}'", value, decl.property));
        }
        if decl.is_custom() {
            return None;
        }

        let tokens = tokenize_value(value);
        if decl.property.ends_with("color") {
            if let Some(bad) = tokens.iter().find(|t| t.starts_with('#') && !self.hex_color.is_match(t)) {
                return Some(format!("invalid color '{}' for '{}'", bad, decl.property));
            }
        }
        if LENGTH_PROPERTIES.contains(&decl.property.as_str()) && tokens.len() == 1 {
            let token = tokens[0].to_ascii_lowercase();
            if is_length_like(&token) && !has_valid_unit(&token) {
                return Some(format!("invalid length '{}' for '{}'", tokens[0], decl.property));
            }
        }
        None
    }

    /// Repeated properties in one declaration list. Source-side repeats are
    /// common fallbacks, so they are info only.
    pub fn report_duplicates(&self, decls: &[Declaration], context: &str, diag: &mut Diagnostics) {
        if !self.config.check_duplicates {
            return;
        }
        let mut seen: Vec<&str> = Vec::new();
        let mut reported: Vec<&str> = Vec::new();
        for decl in decls {
            let name = decl.property.as_str();
            if seen.contains(&name) {
                if !reported.contains(&name) {
                    let message = format!("duplicate property '{}' in {}", name, context);
                    if context == "overrides" {
                        diag.warn(message);
                    } else {
                        diag.note(message);
                    }
                    reported.push(name);
                }
            } else {
                seen.push(name);
            }
        }
    }
}

fn has_valid_unit(token: &str) -> bool {
    if token.starts_with("calc(") || token.starts_with("min(") || token.starts_with("max(") || token.starts_with("clamp(") {
        return true;
    }
    let numeric_end = token
        .char_indices()
        .find(|(i, c)| !(c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(token.len());
    let (number, unit) = token.split_at(numeric_end);
    if unit.is_empty() {
        return number.parse::<f64>().map(|n| n == 0.0).unwrap_or(false);
    }
    LENGTH_UNITS.contains(&unit)
}

fn balanced(value: &str) -> bool {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    for c in value.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth < 0 {
                        return false;
                    }
                }
                _ => {}
            },
        }
    }
    depth == 0 && quote.is_none()
}

/// Closest known property within edit distance 2
pub fn suggest_property(name: &str) -> Option<String> {
    if let Some((_, fix)) = COMMON_TYPOS.iter().find(|(typo, _)| *typo == name) {
        return Some(fix.to_string());
    }
    properties::known_properties()
        .into_iter()
        .map(|known| (levenshtein(name, known), known))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, known)| known.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        previous = current;
    }
    previous[b.len()]
}
