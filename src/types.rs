//! Value types shared by the merge engine and the combinator

use crate::error::{CascadeError, Result};
use crate::selector;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// A single `property: value [!important]` declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    /// Builds a declaration, normalising the property name and lifting a
    /// trailing `!important` out of the value.
    pub fn new(property: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        let (value, important) = split_important(value.as_ref());
        Self {
            property: normalize_property(property.as_ref()),
            value,
            important,
        }
    }

    pub fn important(property: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        Self::new(property, value).with_important(true)
    }

    pub fn with_important(mut self, important: bool) -> Self {
        self.important = important;
        self
    }

    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            property: self.property.clone(),
            value: value.into(),
            important: self.important,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.property.starts_with("--")
    }

    /// Value as written in CSS, including the importance flag
    pub fn css_value(&self) -> String {
        if self.important {
            format!("{} !important", self.value)
        } else {
            self.value.clone()
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.css_value())
    }
}

/// Custom properties are case-sensitive; everything else is lowercased.
pub fn normalize_property(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        name.to_string()
    } else {
        name.to_ascii_lowercase()
    }
}

/// Splits `"red !important"` into `("red", true)`. Accepts `! important`.
pub fn split_important(raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    if let Some(head) = lower.strip_suffix("important") {
        let head = head.trim_end();
        if let Some(head) = head.strip_suffix('!') {
            let len = head.trim_end().len();
            return (trimmed[..len].to_string(), true);
        }
    }
    (trimmed.to_string(), false)
}

/// The (pseudo-state, media-condition) part of a target; the base selector
/// is carried by the rule itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Scope {
    pub pseudo: Option<String>,
    pub media: Option<String>,
}

impl Scope {
    pub fn base() -> Self {
        Self::default()
    }

    pub fn pseudo(pseudo: impl Into<String>) -> Self {
        Self {
            pseudo: Some(pseudo.into()),
            media: None,
        }
    }

    pub fn media(condition: impl Into<String>) -> Self {
        Self {
            pseudo: None,
            media: Some(condition.into()),
        }
    }

    pub fn is_base(&self) -> bool {
        self.pseudo.is_none() && self.media.is_none()
    }

    /// The override-mapping key for this scope (`":hover"`, `"@media (...)"`)
    pub fn key(&self) -> String {
        match (&self.media, &self.pseudo) {
            (None, None) => String::new(),
            (None, Some(p)) => p.clone(),
            (Some(m), None) => format!("@media {}", m),
            (Some(m), Some(p)) => format!("@media {} {}", m, p),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_base() {
            write!(f, "base")
        } else {
            write!(f, "{}", self.key())
        }
    }
}

/// A style rule for one logical target: base selector, optional pseudo
/// state, optional media condition and its declarations in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: String,
    pub pseudo: Option<String>,
    pub media: Option<String>,
    pub declarations: Vec<Declaration>,
}

impl Rule {
    /// Creates an empty rule; any pseudo part of `selector` is split off.
    pub fn new(selector: &str) -> Self {
        let (base, pseudo) = selector::split_pseudo(selector);
        Self {
            selector: base,
            pseudo,
            media: None,
            declarations: Vec::new(),
        }
    }

    pub fn in_media(mut self, condition: impl Into<String>) -> Self {
        self.media = Some(condition.into());
        self
    }

    pub fn with_declarations(mut self, declarations: Vec<Declaration>) -> Self {
        self.declarations = declarations;
        self
    }

    pub fn declare(mut self, property: &str, value: &str) -> Self {
        self.declarations.push(Declaration::new(property, value));
        self
    }

    pub fn full_selector(&self) -> String {
        match &self.pseudo {
            Some(pseudo) => format!("{}{}", self.selector, pseudo),
            None => self.selector.clone(),
        }
    }

    pub fn scope(&self) -> Scope {
        Scope {
            pseudo: self.pseudo.clone(),
            media: self.media.clone(),
        }
    }

    /// Last declaration of `property`, the one that wins the cascade
    pub fn get(&self, property: &str) -> Option<&Declaration> {
        self.declarations.iter().rev().find(|d| d.property == property)
    }
}

/// Override declarations for one non-base scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedOverride {
    pub scope: Scope,
    pub declarations: Vec<Declaration>,
}

/// Requested overrides: base-target declarations plus pseudo and media
/// scopes, all kept in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideSpec {
    pub base: Vec<Declaration>,
    pub scoped: Vec<ScopedOverride>,
}

impl OverrideSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a base-scope declaration (builder style)
    pub fn set(mut self, property: &str, value: &str) -> Self {
        self.base.push(Declaration::new(property, value));
        self
    }

    pub fn pseudo(self, pseudo: &str, pairs: &[(&str, &str)]) -> Self {
        self.scope(Scope::pseudo(pseudo), pairs)
    }

    pub fn media(self, condition: &str, pairs: &[(&str, &str)]) -> Self {
        let condition = condition.trim_start_matches("@media").trim();
        self.scope(Scope::media(condition), pairs)
    }

    fn scope(mut self, scope: Scope, pairs: &[(&str, &str)]) -> Self {
        let declarations = pairs.iter().map(|(p, v)| Declaration::new(p, v));
        self.push_scoped(scope, declarations);
        self
    }

    fn push_scoped(&mut self, scope: Scope, declarations: impl IntoIterator<Item = Declaration>) {
        match self.scoped.iter_mut().find(|s| s.scope == scope) {
            Some(existing) => existing.declarations.extend(declarations),
            None => self.scoped.push(ScopedOverride {
                scope,
                declarations: declarations.into_iter().collect(),
            }),
        }
    }

    /// Reads an override mapping. Top-level string (or number) values are
    /// base declarations; `:pseudo` and `@media ...` keys open a nested scope.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            CascadeError::malformed(format!(
                "override payload must be a mapping, got {}",
                json_kind(value)
            ))
        })?;

        let mut spec = Self::new();
        for (key, value) in map {
            let key = key.trim();
            if key.starts_with(':') || key.starts_with('@') {
                let scope = parse_scope_key(key)?;
                let nested = value.as_object().ok_or_else(|| {
                    CascadeError::malformed(format!(
                        "scope '{}' must map to a properties mapping",
                        key
                    ))
                })?;
                let mut declarations = Vec::with_capacity(nested.len());
                for (property, value) in nested {
                    if property.starts_with(':') || property.starts_with('@') {
                        return Err(CascadeError::malformed(format!(
                            "nested scope '{}' inside '{}' is not supported",
                            property, key
                        )));
                    }
                    declarations.push(Declaration::new(property, scalar_value(property, value)?));
                }
                spec.push_scoped(scope, declarations);
            } else {
                spec.base.push(Declaration::new(key, scalar_value(key, value)?));
            }
        }
        Ok(spec)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            CascadeError::malformed(format!("override payload is not valid JSON: {}", e))
        })?;
        Self::from_json(&value)
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.scoped.iter().all(|s| s.declarations.is_empty())
    }

    /// Every override declaration with its scope, base scope first
    pub fn flatten(&self) -> Vec<(Scope, &Declaration)> {
        let mut out: Vec<(Scope, &Declaration)> =
            self.base.iter().map(|d| (Scope::base(), d)).collect();
        for scoped in &self.scoped {
            out.extend(scoped.declarations.iter().map(|d| (scoped.scope.clone(), d)));
        }
        out
    }

    pub fn declarations_for(&self, scope: &Scope) -> &[Declaration] {
        if scope.is_base() {
            return &self.base;
        }
        self.scoped
            .iter()
            .find(|s| &s.scope == scope)
            .map(|s| s.declarations.as_slice())
            .unwrap_or(&[])
    }
}

fn parse_scope_key(key: &str) -> Result<Scope> {
    if key.starts_with(':') {
        if key.trim_start_matches(':').is_empty() {
            return Err(CascadeError::malformed(format!("empty pseudo key '{}'", key)));
        }
        return Ok(Scope::pseudo(key));
    }
    match key.strip_prefix("@media") {
        Some(condition) if !condition.trim().is_empty() => Ok(Scope::media(condition.trim())),
        Some(_) => Err(CascadeError::malformed("'@media' key without a condition")),
        None => Err(CascadeError::malformed(format!(
            "unsupported at-rule key '{}' in overrides",
            key
        ))),
    }
}

fn scalar_value(property: &str, value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(CascadeError::malformed(format!(
            "value for '{}' must be a string or number, got {}",
            property,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "a mapping",
    }
}

/// Produced whenever more than one source claims the same property for
/// the same target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    pub property: String,
    pub source_classes: Vec<String>,
    pub resolution: String,
    pub strategy_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Outcome of a merge. Every list is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeResult {
    pub css: Vec<String>,
    pub add: Vec<String>,
    pub remove: Vec<String>,
    pub preserve: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub conflicts: Vec<ConflictRecord>,
    pub inline_excluded: Vec<String>,
}

impl MergeResult {
    pub fn css_text(&self) -> String {
        self.css.join("\n")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CascadeError::InvalidFormat {
            message: format!("Failed to serialize merge result: {}", e),
        })
    }

    pub fn print_summary(&self) {
        println!("Merge Result:");
        println!("  Rules: {}", self.css.len());
        if !self.add.is_empty() {
            println!("  Add: {}", self.add.join(", "));
        }
        if !self.remove.is_empty() {
            println!("  Remove: {}", self.remove.join(", "));
        }
        if !self.preserve.is_empty() {
            println!("  Preserve: {}", self.preserve.join(", "));
        }
        println!("  Conflicts resolved: {}", self.conflicts.len());
        for warning in &self.warnings {
            println!("  warning: {}", warning);
        }
    }
}

/// Ordered `property -> value` mapping serialised as a JSON object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleMap(Vec<(String, String)>);

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces, keeping the first insertion position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StyleMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Outcome of combinator conflict detection for one element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CombinatorResult {
    pub remove_classes: Vec<String>,
    pub keep_classes: Vec<String>,
    pub add_classes: Vec<String>,
    pub generated_css: String,
    pub fallback_inline: StyleMap,
    /// Scope keys left to inline/runtime handling by the pseudo or media strategy
    pub inline_excluded: Vec<String>,
    pub conflicts_found: Vec<ConflictRecord>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}
