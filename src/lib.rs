//! Csscade: CSS Property Merge Engine
//!
//! Applies user-specified style overrides to existing CSS without breaking
//! pseudo-state behaviour, responsive rules or specificity ordering.
//!
//! # Features
//!
//! - Shorthand/longhand algebra for margin, padding, inset, border and friends
//! - Per-axis conflict resolution (importance, shorthand, pseudo, media,
//!   multi-rule) with ordered fallback chains
//! - Permanent, component and replace merge modes
//! - Semantic, hash and sequential class naming
//! - Class combinator that removes only the classes an override makes obsolete
//! - Optional validation with typo suggestions and a strict mode
//!
//! # Basic Usage
//!
//! ```rust
//! use csscade::{MergeConfig, MergeEngine, MergeMode, OverrideSpec, Result};
//!
//! fn main() -> Result<()> {
//!     let mut engine = MergeEngine::new(MergeConfig::with_mode(MergeMode::Permanent))?;
//!     let overrides = OverrideSpec::new().set("color", "red");
//!     let result = engine.merge(".btn { color: blue; padding: 4px; }", &overrides)?;
//!     assert_eq!(result.css, vec![".btn { color: red; padding: 4px; }"]);
//!     Ok(())
//! }
//! ```
//!
//! # Merge Pipeline
//!
//! 1. **Source**: text, declarations or rules resolved into one rule list
//! 2. **Validation**: override names and values checked (optional)
//! 3. **Base scope**: target rules chosen, declarations cascaded
//! 4. **Pseudo / media scopes**: routed by their strategy chains
//! 5. **Naming**: a class generated for component and replace modes
//! 6. **Output**: compact CSS plus add/remove/preserve bookkeeping

pub mod error;
pub mod types;
pub mod core;
pub mod selector;
pub mod parser;
pub mod shorthand;
pub mod resolver;
pub mod cascade;
pub mod naming;
pub mod validation;
pub mod output;
pub mod config;
pub mod merger;
pub mod catalog;
pub mod combinator;
pub mod cli;

use std::fs;
use std::path::Path;

// Re-export commonly used types and functions
pub use error::{CascadeError, Result};
pub use types::{
    CombinatorResult, ConflictRecord, Declaration, MergeResult, OverrideSpec, Rule, Scope,
    ScopedOverride, StyleMap,
};
pub use config::{
    CombinatorConfig, ConflictResolutionConfig, MergeConfig, MergeMode, NamingConfig,
    NamingStrategy, RuleSelection, ValidationConfig,
};
pub use resolver::{
    ConflictResolver, ImportanceStrategy, MediaStrategy, MultiRuleStrategy, PseudoStrategy,
    ShorthandStrategy, StrategyChain,
};
pub use merger::{BatchMerger, MergeEngine, MergeSource};
pub use combinator::{Combinator, ElementRequest};
pub use catalog::CssCatalog;
pub use naming::NameGenerator;
pub use validation::CssValidator;
pub use cli::CssCli;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Build information
pub const BUILD_INFO: EngineInfo = EngineInfo {
    version: VERSION,
    name: NAME,
    description: DESCRIPTION,
    supported_features: &[
        "shorthand-algebra",
        "fallback-chains",
        "pseudo-scopes",
        "media-scopes",
        "multi-rule",
        "naming",
        "combinator",
        "validation",
    ],
};

#[derive(Debug, Clone)]
pub struct EngineInfo {
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub supported_features: &'static [&'static str],
}

/// Merges with the default configuration (component mode)
pub fn merge(source: &str, overrides: &OverrideSpec) -> Result<MergeResult> {
    MergeEngine::new(MergeConfig::default())?.merge(source, overrides)
}

/// Merges a stylesheet file. `overrides_json` is an override mapping such
/// as `{"color": "red", ":hover": {"color": "blue"}}`.
pub fn merge_file(
    path: impl AsRef<Path>,
    overrides_json: &str,
    config: MergeConfig,
) -> Result<MergeResult> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| CascadeError::FileNotFound {
        path: format!("{}: {}", path.display(), e),
    })?;
    let overrides = OverrideSpec::from_json_str(overrides_json)?;

    log::info!("{} v{}", NAME, VERSION);
    log::info!("Merging overrides into '{}'", path.display());

    MergeEngine::new(config)?.merge(source, &overrides)
}
