// FILE: src/core/constants.rs

// Naming defaults
pub const DEFAULT_PREFIX: &str = "csscade-";
pub const DEFAULT_SUFFIX: &str = "";
pub const DEFAULT_HASH_LENGTH: usize = 8;
pub const MAX_HASH_LENGTH: usize = 32; // hex digits in an md5 digest
pub const SEMANTIC_DIGEST_LENGTH: usize = 6;

// Selector used when a bare declaration list has no rule of its own
pub const BARE_SELECTOR: &str = "";

// Output indentation for expanded rule formatting
pub const INDENT: &str = "    ";

// CSS-wide keywords valid for every property
pub const CSS_WIDE_KEYWORDS: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

// Border/outline value classification
pub const LINE_STYLE_KEYWORDS: &[&str] = &[
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
    "auto",
];
pub const LINE_WIDTH_KEYWORDS: &[&str] = &["thin", "medium", "thick"];

// Initial values used to fill components a keyword shorthand leaves out
pub const INITIAL_LINE_WIDTH: &str = "medium";
pub const INITIAL_LINE_STYLE: &str = "none";
pub const INITIAL_LINE_COLOR: &str = "currentcolor";

// Length units accepted by value sanity checks
pub const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "%", "vh", "vw", "vmin", "vmax", "ch", "ex", "cm", "mm", "in", "pt", "pc",
    "q", "fr", "svh", "lvh", "dvh", "svw", "lvw", "dvw", "cqw", "cqh", "lh", "rlh",
];

// Vendor prefixes treated as opaque but valid properties
pub const VENDOR_PREFIXES: &[&str] = &["-webkit-", "-moz-", "-ms-", "-o-"];
