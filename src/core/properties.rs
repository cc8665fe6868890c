// FILE: src/core/properties.rs

use crate::core::constants::VENDOR_PREFIXES;
use serde::Serialize;

/// Broad family a property belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyCategory {
    BoxModel,
    Border,
    Background,
    Font,
    Other,
    /// Not in the static table, vendor-prefixed or custom: atomic
    Opaque,
}

/// How a shorthand value maps onto its longhand components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRule {
    /// 1-4 values: all / vertical horizontal / top horizontal bottom / t r b l
    Box,
    /// 1-2 values: the second defaults to the first
    Pair,
    /// Unordered typed tokens (width, style, color)
    Keyword,
    /// `flex: grow shrink basis` with its keyword forms
    Flex,
    /// Known components but never decomposed
    Opaque,
}

#[derive(Debug)]
pub struct ShorthandGroup {
    pub name: &'static str,
    pub longhands: &'static [&'static str],
    pub slots: SlotRule,
    pub category: PropertyCategory,
}

impl ShorthandGroup {
    pub fn is_decomposable(&self) -> bool {
        self.slots != SlotRule::Opaque
    }

    pub fn position(&self, longhand: &str) -> Option<usize> {
        self.longhands.iter().position(|l| *l == longhand)
    }
}

macro_rules! group {
    ($name:expr, $slots:ident, $category:ident, [$($longhand:expr),* $(,)?]) => {
        ShorthandGroup {
            name: $name,
            longhands: &[$($longhand),*],
            slots: SlotRule::$slots,
            category: PropertyCategory::$category,
        }
    };
}

/// Static shorthand table. Side-level box groups come before the keyword
/// groups that share their longhands so collapsing prefers `border-color`
/// over `border-top`.
pub static SHORTHAND_GROUPS: &[ShorthandGroup] = &[
    group!("margin", Box, BoxModel, ["margin-top", "margin-right", "margin-bottom", "margin-left"]),
    group!("padding", Box, BoxModel, ["padding-top", "padding-right", "padding-bottom", "padding-left"]),
    group!("inset", Box, Other, ["top", "right", "bottom", "left"]),
    group!("border-width", Box, Border, [
        "border-top-width", "border-right-width", "border-bottom-width", "border-left-width",
    ]),
    group!("border-style", Box, Border, [
        "border-top-style", "border-right-style", "border-bottom-style", "border-left-style",
    ]),
    group!("border-color", Box, Border, [
        "border-top-color", "border-right-color", "border-bottom-color", "border-left-color",
    ]),
    group!("border-radius", Box, Border, [
        "border-top-left-radius", "border-top-right-radius",
        "border-bottom-right-radius", "border-bottom-left-radius",
    ]),
    group!("border-top", Keyword, Border, ["border-top-width", "border-top-style", "border-top-color"]),
    group!("border-right", Keyword, Border, ["border-right-width", "border-right-style", "border-right-color"]),
    group!("border-bottom", Keyword, Border, ["border-bottom-width", "border-bottom-style", "border-bottom-color"]),
    group!("border-left", Keyword, Border, ["border-left-width", "border-left-style", "border-left-color"]),
    group!("border", Keyword, Border, ["border-width", "border-style", "border-color"]),
    group!("outline", Keyword, Other, ["outline-width", "outline-style", "outline-color"]),
    group!("gap", Pair, BoxModel, ["row-gap", "column-gap"]),
    group!("overflow", Pair, Other, ["overflow-x", "overflow-y"]),
    group!("place-content", Pair, Other, ["align-content", "justify-content"]),
    group!("place-items", Pair, Other, ["align-items", "justify-items"]),
    group!("place-self", Pair, Other, ["align-self", "justify-self"]),
    group!("flex", Flex, Other, ["flex-grow", "flex-shrink", "flex-basis"]),
    group!("flex-flow", Opaque, Other, ["flex-direction", "flex-wrap"]),
    group!("background", Opaque, Background, [
        "background-color", "background-image", "background-repeat", "background-attachment",
        "background-position", "background-size", "background-origin", "background-clip",
    ]),
    group!("font", Opaque, Font, [
        "font-style", "font-variant", "font-weight", "font-stretch", "font-size", "line-height",
        "font-family",
    ]),
    group!("list-style", Opaque, Other, ["list-style-type", "list-style-position", "list-style-image"]),
    group!("grid-template", Opaque, Other, [
        "grid-template-rows", "grid-template-columns", "grid-template-areas",
    ]),
    group!("grid", Opaque, Other, [
        "grid-template", "grid-auto-rows", "grid-auto-columns", "grid-auto-flow",
    ]),
    group!("animation", Opaque, Other, [
        "animation-name", "animation-duration", "animation-timing-function", "animation-delay",
        "animation-iteration-count", "animation-direction", "animation-fill-mode",
        "animation-play-state",
    ]),
    group!("transition", Opaque, Other, [
        "transition-property", "transition-duration", "transition-timing-function",
        "transition-delay",
    ]),
    group!("text-decoration", Opaque, Other, [
        "text-decoration-line", "text-decoration-color", "text-decoration-style",
        "text-decoration-thickness",
    ]),
    group!("columns", Opaque, Other, ["column-width", "column-count"]),
    group!("column-rule", Opaque, Other, ["column-rule-width", "column-rule-style", "column-rule-color"]),
];

/// Known properties that are neither shorthands nor shorthand components
static STANDALONE_PROPERTIES: &[(&str, PropertyCategory)] = &[
    ("width", PropertyCategory::BoxModel),
    ("height", PropertyCategory::BoxModel),
    ("min-width", PropertyCategory::BoxModel),
    ("min-height", PropertyCategory::BoxModel),
    ("max-width", PropertyCategory::BoxModel),
    ("max-height", PropertyCategory::BoxModel),
    ("box-sizing", PropertyCategory::BoxModel),
    ("aspect-ratio", PropertyCategory::BoxModel),
    ("border-image", PropertyCategory::Border),
    ("border-collapse", PropertyCategory::Border),
    ("border-spacing", PropertyCategory::Border),
    ("box-shadow", PropertyCategory::Border),
    ("letter-spacing", PropertyCategory::Font),
    ("word-spacing", PropertyCategory::Font),
    ("text-transform", PropertyCategory::Font),
    ("font-feature-settings", PropertyCategory::Font),
    ("color", PropertyCategory::Other),
    ("display", PropertyCategory::Other),
    ("position", PropertyCategory::Other),
    ("z-index", PropertyCategory::Other),
    ("float", PropertyCategory::Other),
    ("clear", PropertyCategory::Other),
    ("visibility", PropertyCategory::Other),
    ("opacity", PropertyCategory::Other),
    ("cursor", PropertyCategory::Other),
    ("content", PropertyCategory::Other),
    ("transform", PropertyCategory::Other),
    ("transform-origin", PropertyCategory::Other),
    ("text-align", PropertyCategory::Other),
    ("text-indent", PropertyCategory::Other),
    ("text-overflow", PropertyCategory::Other),
    ("text-shadow", PropertyCategory::Other),
    ("white-space", PropertyCategory::Other),
    ("word-break", PropertyCategory::Other),
    ("overflow-wrap", PropertyCategory::Other),
    ("vertical-align", PropertyCategory::Other),
    ("order", PropertyCategory::Other),
    ("grid-row", PropertyCategory::Other),
    ("grid-column", PropertyCategory::Other),
    ("grid-area", PropertyCategory::Other),
    ("pointer-events", PropertyCategory::Other),
    ("user-select", PropertyCategory::Other),
    ("filter", PropertyCategory::Other),
    ("backdrop-filter", PropertyCategory::Other),
    ("object-fit", PropertyCategory::Other),
    ("object-position", PropertyCategory::Other),
    ("resize", PropertyCategory::Other),
    ("outline-offset", PropertyCategory::Other),
    ("table-layout", PropertyCategory::Other),
    ("will-change", PropertyCategory::Other),
    ("mix-blend-mode", PropertyCategory::Other),
    ("clip-path", PropertyCategory::Other),
    ("appearance", PropertyCategory::Other),
    ("caret-color", PropertyCategory::Other),
    ("accent-color", PropertyCategory::Other),
    ("scroll-behavior", PropertyCategory::Other),
    ("isolation", PropertyCategory::Other),
    ("direction", PropertyCategory::Other),
    ("writing-mode", PropertyCategory::Other),
    ("hyphens", PropertyCategory::Other),
    ("tab-size", PropertyCategory::Other),
];

/// Result of classifying a property name
#[derive(Debug, Clone, Copy)]
pub struct PropertyInfo {
    pub category: PropertyCategory,
    /// Set when the property is itself a shorthand
    pub shorthand: Option<&'static ShorthandGroup>,
}

pub fn classify(name: &str) -> PropertyInfo {
    if is_vendor_prefixed(name) || name.starts_with("--") {
        return PropertyInfo {
            category: PropertyCategory::Opaque,
            shorthand: None,
        };
    }

    if let Some(group) = shorthand_group(name) {
        return PropertyInfo {
            category: group.category,
            shorthand: Some(group),
        };
    }

    let category = parent_groups(name)
        .next()
        .map(|g| g.category)
        .or_else(|| {
            STANDALONE_PROPERTIES
                .iter()
                .find(|(p, _)| *p == name)
                .map(|(_, c)| *c)
        })
        .unwrap_or(PropertyCategory::Opaque);

    PropertyInfo {
        category,
        shorthand: None,
    }
}

pub fn shorthand_group(name: &str) -> Option<&'static ShorthandGroup> {
    SHORTHAND_GROUPS.iter().find(|g| g.name == name)
}

pub fn is_shorthand(name: &str) -> bool {
    shorthand_group(name).is_some()
}

/// Groups that list `name` as a direct component, in table order
pub fn parent_groups(name: &str) -> impl Iterator<Item = &'static ShorthandGroup> + '_ {
    SHORTHAND_GROUPS
        .iter()
        .filter(move |g| g.longhands.iter().any(|l| *l == name))
}

/// Every group that transitively covers `name`, innermost first
pub fn ancestor_groups(name: &str) -> Vec<&'static ShorthandGroup> {
    let mut out: Vec<&'static ShorthandGroup> = Vec::new();
    let mut frontier = vec![name.to_string()];
    while let Some(current) = frontier.pop() {
        for group in parent_groups(&current) {
            if !out.iter().any(|g| g.name == group.name) {
                out.push(group);
                frontier.insert(0, group.name.to_string());
            }
        }
    }
    out
}

/// Longhands a property ultimately sets; a non-shorthand sets itself
pub fn leaves(name: &str) -> Vec<&str> {
    match shorthand_group(name) {
        Some(group) => group.longhands.iter().flat_map(|l| leaves(*l)).collect(),
        None => vec![name],
    }
}

/// True when the two properties set at least one common longhand
pub fn overlaps(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    if classify(a).category == PropertyCategory::Opaque
        || classify(b).category == PropertyCategory::Opaque
    {
        return false;
    }
    let left = leaves(a);
    leaves(b).iter().any(|l| left.contains(l))
}

/// True when every longhand set by `inner` is also set by `outer`
pub fn covers(outer: &str, inner: &str) -> bool {
    if outer == inner {
        return true;
    }
    let outer_leaves = leaves(outer);
    leaves(inner).iter().all(|l| outer_leaves.contains(l))
}

pub fn is_vendor_prefixed(name: &str) -> bool {
    VENDOR_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Properties present in the static table
pub fn is_known(name: &str) -> bool {
    shorthand_group(name).is_some()
        || parent_groups(name).next().is_some()
        || STANDALONE_PROPERTIES.iter().any(|(p, _)| *p == name)
}

/// Every known property name, used for typo suggestions
pub fn known_properties() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for group in SHORTHAND_GROUPS {
        names.push(group.name);
        names.extend(group.longhands.iter().copied());
    }
    names.extend(STANDALONE_PROPERTIES.iter().map(|(p, _)| *p));
    names.sort_unstable();
    names.dedup();
    names
}
