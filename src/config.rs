//! Typed configuration records for merging and class combination

use crate::core::constants::{DEFAULT_HASH_LENGTH, DEFAULT_PREFIX, DEFAULT_SUFFIX, MAX_HASH_LENGTH};
use crate::error::{CascadeError, Result};
use crate::resolver::{
    ImportanceStrategy, MediaStrategy, MultiRuleStrategy, PseudoStrategy, ShorthandStrategy,
    StrategyChain,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Identity bookkeeping of a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeMode {
    /// Rewrite the source rule under its own selector
    Permanent,
    /// New class next to the original
    #[default]
    Component,
    /// New class standing in for the original
    Replace,
}

impl std::str::FromStr for MergeMode {
    type Err = CascadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "permanent" => Ok(Self::Permanent),
            "component" => Ok(Self::Component),
            "replace" => Ok(Self::Replace),
            other => Err(CascadeError::config(format!(
                "unknown mode '{}': expected permanent, component or replace",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSelection {
    #[default]
    First,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    #[default]
    Semantic,
    Hash,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    pub strategy: NamingStrategy,
    pub prefix: String,
    pub suffix: String,
    pub hash_length: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            strategy: NamingStrategy::Semantic,
            prefix: DEFAULT_PREFIX.to_string(),
            suffix: DEFAULT_SUFFIX.to_string(),
            hash_length: DEFAULT_HASH_LENGTH,
        }
    }
}

/// Per-axis fallback chains. Older flat configs (`{"important": "match"}`)
/// read as the same record through the alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConflictResolutionConfig {
    #[serde(alias = "important")]
    pub importance: StrategyChain<ImportanceStrategy>,
    pub shorthand: StrategyChain<ShorthandStrategy>,
    pub pseudo: StrategyChain<PseudoStrategy>,
    pub media: StrategyChain<MediaStrategy>,
    #[serde(alias = "multiple_rules")]
    pub multi_rule: StrategyChain<MultiRuleStrategy>,
}

impl Default for ConflictResolutionConfig {
    fn default() -> Self {
        Self {
            importance: StrategyChain::single(ImportanceStrategy::Match),
            shorthand: StrategyChain::single(ShorthandStrategy::Cascade),
            pseudo: StrategyChain::single(PseudoStrategy::Preserve),
            media: StrategyChain::single(MediaStrategy::Preserve),
            multi_rule: StrategyChain::single(MultiRuleStrategy::First),
        }
    }
}

impl ConflictResolutionConfig {
    fn validate(&self) -> Result<()> {
        let empty = [
            ("importance", self.importance.is_empty()),
            ("shorthand", self.shorthand.is_empty()),
            ("pseudo", self.pseudo.is_empty()),
            ("media", self.media.is_empty()),
            ("multi_rule", self.multi_rule.is_empty()),
        ];
        match empty.iter().find(|(_, is_empty)| *is_empty) {
            Some((axis, _)) => Err(CascadeError::config(format!(
                "conflict_resolution.{} must name at least one strategy",
                axis
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub strict: bool,
    pub check_properties: bool,
    pub check_values: bool,
    pub allow_vendor: bool,
    pub allow_custom: bool,
    pub check_duplicates: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            strict: false,
            check_properties: true,
            check_values: false,
            allow_vendor: true,
            allow_custom: true,
            check_duplicates: true,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApplyToInput {
    One(String),
    Many(Vec<String>),
}

fn deserialize_apply_to<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match ApplyToInput::deserialize(deserializer)? {
        ApplyToInput::One(pattern) => vec![pattern],
        ApplyToInput::Many(patterns) => patterns,
    })
}

/// Options for the merge engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    pub mode: MergeMode,
    pub rule_selection: RuleSelection,
    /// Keywords `all`/`base`/`states`, globs or explicit selectors
    #[serde(deserialize_with = "deserialize_apply_to")]
    pub apply_to: Vec<String>,
    pub naming: NamingConfig,
    pub conflict_resolution: ConflictResolutionConfig,
    pub validation: ValidationConfig,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            mode: MergeMode::Component,
            rule_selection: RuleSelection::First,
            apply_to: vec!["all".to_string()],
            naming: NamingConfig::default(),
            conflict_resolution: ConflictResolutionConfig::default(),
            validation: ValidationConfig::default(),
        }
    }
}

impl MergeConfig {
    pub fn with_mode(mode: MergeMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.apply_to.is_empty() {
            return Err(CascadeError::config("apply_to must contain at least one pattern"));
        }
        validate_naming(&self.naming)?;
        self.conflict_resolution.validate()
    }
}

fn validate_naming(naming: &NamingConfig) -> Result<()> {
    if naming.hash_length == 0 || naming.hash_length > MAX_HASH_LENGTH {
        return Err(CascadeError::config(format!(
            "naming.hash_length must be between 1 and {}, got {}",
            MAX_HASH_LENGTH, naming.hash_length
        )));
    }
    Ok(())
}

/// Options for the combinator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinatorConfig {
    pub naming: NamingConfig,
    pub conflict_resolution: ConflictResolutionConfig,
    /// Fold the untouched declarations of removed classes into the
    /// generated rule so removal never loses styling
    pub carry_over: bool,
}

impl Default for CombinatorConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
            conflict_resolution: ConflictResolutionConfig::default(),
            carry_over: true,
        }
    }
}

impl CombinatorConfig {
    pub fn validate(&self) -> Result<()> {
        validate_naming(&self.naming)?;
        self.conflict_resolution.validate()
    }
}

/// Reads a `.json` or `.toml` file into any config record
pub fn load_file<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| CascadeError::FileNotFound {
        path: format!("Config file {}: {}", path.display(), e),
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| CascadeError::InvalidFormat {
            message: format!("Invalid JSON config: {}", e),
        }),
        Some("toml") => toml::from_str(&content).map_err(|e| CascadeError::InvalidFormat {
            message: format!("Invalid TOML config: {}", e),
        }),
        _ => Err(CascadeError::InvalidFormat {
            message: "Config file must be .json or .toml format".to_string(),
        }),
    }
}

pub fn load_merge_config(path: impl AsRef<Path>) -> Result<MergeConfig> {
    let config: MergeConfig = load_file(&path)?;
    config.validate()?;
    log::info!("Loaded merge configuration from {}", path.as_ref().display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MergeConfig::default();
        assert_eq!(config.mode, MergeMode::Component);
        assert_eq!(config.rule_selection, RuleSelection::First);
        assert_eq!(config.apply_to, vec!["all"]);
        assert_eq!(config.naming.prefix, "csscade-");
        assert_eq!(config.naming.hash_length, 8);
        assert_eq!(config.conflict_resolution.importance.strategies(), &[ImportanceStrategy::Match]);
        assert_eq!(config.conflict_resolution.shorthand.strategies(), &[ShorthandStrategy::Cascade]);
        assert!(!config.validation.enabled);
        assert!(config.validation.check_duplicates);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_config() {
        let config: MergeConfig = serde_json::from_str(
            r#"{
                "mode": "replace",
                "rule_selection": "all",
                "apply_to": "base",
                "naming": {"strategy": "hash", "hash_length": 12},
                "conflict_resolution": {
                    "important": "force",
                    "shorthand": ["smart", "cascade"],
                    "multiple_rules": "most_specific"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(config.mode, MergeMode::Replace);
        assert_eq!(config.apply_to, vec!["base"]);
        assert_eq!(config.naming.strategy, NamingStrategy::Hash);
        assert_eq!(config.naming.prefix, "csscade-");
        let cr = &config.conflict_resolution;
        assert_eq!(cr.importance.strategies(), &[ImportanceStrategy::Force]);
        assert_eq!(cr.shorthand.strategies(), &[ShorthandStrategy::Smart, ShorthandStrategy::Cascade]);
        assert_eq!(cr.multi_rule.strategies(), &[MultiRuleStrategy::MostSpecific]);
        assert_eq!(cr.pseudo.strategies(), &[PseudoStrategy::Preserve]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = MergeConfig::default();
        config.naming.hash_length = 0;
        assert!(matches!(config.validate(), Err(CascadeError::Config { .. })));

        let mut config = MergeConfig::default();
        config.conflict_resolution.media = StrategyChain::new(vec![]);
        assert!(config.validate().is_err());

        let mut config = MergeConfig::default();
        config.apply_to.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_toml_and_json_files() {
        let temp_dir = TempDir::new().unwrap();
        let toml_path = temp_dir.path().join("csscade.toml");
        fs::write(
            &toml_path,
            r#"
mode = "permanent"

[naming]
strategy = "sequential"
prefix = "ov-"

[conflict_resolution]
pseudo = ["extract", "inline"]

[validation]
enabled = true
strict = true
"#,
        )
        .unwrap();
        let config = load_merge_config(&toml_path).unwrap();
        assert_eq!(config.mode, MergeMode::Permanent);
        assert_eq!(config.naming.prefix, "ov-");
        assert_eq!(
            config.conflict_resolution.pseudo.strategies(),
            &[PseudoStrategy::Extract, PseudoStrategy::Inline]
        );
        assert!(config.validation.strict);

        let json_path = temp_dir.path().join("csscade.json");
        fs::write(&json_path, r#"{"mode": "component"}"#).unwrap();
        assert_eq!(load_merge_config(&json_path).unwrap().mode, MergeMode::Component);

        let yaml_path = temp_dir.path().join("csscade.yaml");
        fs::write(&yaml_path, "mode: component").unwrap();
        assert!(matches!(load_merge_config(&yaml_path), Err(CascadeError::InvalidFormat { .. })));

        assert!(matches!(
            load_merge_config(temp_dir.path().join("missing.toml")),
            Err(CascadeError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("replace".parse::<MergeMode>().unwrap(), MergeMode::Replace);
        assert!("merge".parse::<MergeMode>().is_err());
    }
}
