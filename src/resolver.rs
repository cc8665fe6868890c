//! Conflict resolution strategies and fallback-chain evaluation

use crate::config::ConflictResolutionConfig;
use crate::selector::{self, Specificity};
use crate::types::{ConflictRecord, Rule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Shared behaviour of the per-axis strategy enums
pub trait Strategy: Copy + PartialEq + fmt::Debug {
    const AXIS: &'static str;

    fn name(&self) -> &'static str;

    /// `axis:strategy`, as stored in conflict records
    fn label(&self) -> String {
        format!("{}:{}", Self::AXIS, self.name())
    }
}

macro_rules! strategy_enum {
    ($(#[$meta:meta])* $name:ident, $axis:expr, { $($variant:ident => $text:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl Strategy for $name {
            const AXIS: &'static str = $axis;

            fn name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.name())
            }
        }
    };
}

strategy_enum!(
    /// How `!important` flags are reconciled
    ImportanceStrategy, "importance", {
        Match => "match",
        Respect => "respect",
        Override => "override",
        Force => "force",
        Strip => "strip",
    }
);

strategy_enum!(
    /// How a shorthand/longhand overlap is resolved
    ShorthandStrategy, "shorthand", {
        Cascade => "cascade",
        Smart => "smart",
        Expand => "expand",
        Preserve => "preserve",
    }
);

strategy_enum!(
    /// What happens to pseudo-state scoped overrides
    PseudoStrategy, "pseudo", {
        Preserve => "preserve",
        Inline => "inline",
        Ignore => "ignore",
        ForceMerge => "force_merge",
        Extract => "extract",
    }
);

strategy_enum!(
    /// What happens to `@media` scoped overrides
    MediaStrategy, "media", {
        Preserve => "preserve",
        Inline => "inline",
        Duplicate => "duplicate",
        Extract => "extract",
    }
);

strategy_enum!(
    /// Which of several matching source rules receive base overrides
    MultiRuleStrategy, "multi_rule", {
        First => "first",
        All => "all",
        MostSpecific => "most_specific",
    }
);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for StrategyChain<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(strategy) => StrategyChain(vec![strategy]),
            OneOrMany::Many(strategies) => StrategyChain(strategies),
        }
    }
}

/// Ordered fallback chain. Configured as a single name or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany<T>")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct StrategyChain<T>(Vec<T>);

impl<T: Strategy> StrategyChain<T> {
    pub fn single(strategy: T) -> Self {
        Self(vec![strategy])
    }

    pub fn new(strategies: Vec<T>) -> Self {
        Self(strategies)
    }

    pub fn strategies(&self) -> &[T] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First strategy whose applicability predicate holds
    pub fn select(&self, mut applicable: impl FnMut(T) -> bool) -> Option<T> {
        self.0.iter().copied().find(|s| applicable(*s))
    }

    pub fn describe(&self) -> String {
        let names: Vec<&str> = self.0.iter().map(|s| s.name()).collect();
        format!("[{}]", names.join(", "))
    }
}

/// Warnings, info lines and conflict records gathered during one call
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub info: Vec<String>,
    pub conflicts: Vec<ConflictRecord>,
    pub inline_excluded: Vec<String>,
    pub strip_requested: bool,
}

impl Diagnostics {
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("warning: {}", message);
        self.warnings.push(message);
    }

    pub fn note(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    pub fn record(&mut self, record: ConflictRecord) {
        self.conflicts.push(record);
    }

    pub fn exclude_inline(&mut self, key: impl Into<String>) {
        let key = key.into();
        if !self.inline_excluded.contains(&key) {
            self.inline_excluded.push(key);
        }
    }
}

/// Outcome of the importance axis for one override
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportanceDecision {
    /// The source declaration stays; the override is dropped
    KeepSource,
    /// The override applies with this flag
    Apply { important: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportanceOutcome {
    pub strategy: Option<ImportanceStrategy>,
    pub decision: ImportanceDecision,
}

impl ImportanceOutcome {
    pub fn label(&self) -> String {
        match self.strategy {
            Some(strategy) => strategy.label(),
            None => "importance:fallback".to_string(),
        }
    }
}

fn pseudo_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(::?[A-Za-z][\w-]*(\([^()]*\))?)+$").expect("pseudo selector pattern is valid")
    })
}

/// Dispatches each conflict axis to its configured fallback chain
#[derive(Debug, Clone)]
pub struct ConflictResolver {
    config: ConflictResolutionConfig,
}

impl ConflictResolver {
    pub fn new(config: ConflictResolutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConflictResolutionConfig {
        &self.config
    }

    /// Applies the importance chain. `respect` only applies when the
    /// source declaration is `!important`; an exhausted chain applies the
    /// override as written.
    pub fn resolve_importance(&self, source_important: bool, override_important: bool) -> ImportanceOutcome {
        let strategy = self.config.importance.select(|s| match s {
            ImportanceStrategy::Respect => source_important,
            _ => true,
        });

        let decision = match strategy {
            Some(ImportanceStrategy::Match) => ImportanceDecision::Apply {
                important: override_important || source_important,
            },
            Some(ImportanceStrategy::Respect) => ImportanceDecision::KeepSource,
            Some(ImportanceStrategy::Override) | None => ImportanceDecision::Apply {
                important: override_important,
            },
            Some(ImportanceStrategy::Force) => ImportanceDecision::Apply { important: true },
            Some(ImportanceStrategy::Strip) => ImportanceDecision::Apply { important: false },
        };

        ImportanceOutcome { strategy, decision }
    }

    /// `smart` and `expand` need every involved shorthand to decompose
    pub fn select_shorthand(&self, expandable: bool) -> Option<ShorthandStrategy> {
        self.config.shorthand.select(|s| match s {
            ShorthandStrategy::Smart | ShorthandStrategy::Expand => expandable,
            ShorthandStrategy::Cascade | ShorthandStrategy::Preserve => true,
        })
    }

    /// Strategies that emit a selector need a syntactically usable pseudo
    pub fn select_pseudo(&self, pseudo: &str) -> Option<PseudoStrategy> {
        let valid = pseudo_pattern().is_match(pseudo);
        self.config.pseudo.select(|s| match s {
            PseudoStrategy::Preserve | PseudoStrategy::Extract | PseudoStrategy::ForceMerge => valid,
            PseudoStrategy::Inline | PseudoStrategy::Ignore => true,
        })
    }

    /// `duplicate` copies the base rule, so it needs one
    pub fn select_media(&self, condition: &str, has_base_rule: bool) -> Option<MediaStrategy> {
        let valid = !condition.trim().is_empty() && balanced(condition);
        self.config.media.select(|s| match s {
            MediaStrategy::Duplicate => valid && has_base_rule,
            MediaStrategy::Preserve | MediaStrategy::Extract => valid,
            MediaStrategy::Inline => true,
        })
    }

    /// Picks which candidate rules receive base overrides. Candidates are
    /// (index, rule) pairs already filtered by `apply_to`.
    pub fn select_rules(&self, candidates: &[(usize, &Rule)]) -> (Option<MultiRuleStrategy>, Vec<usize>) {
        let strategy = self.config.multi_rule.select(|_| !candidates.is_empty());
        let chosen = match strategy {
            Some(MultiRuleStrategy::First) => candidates.iter().take(1).map(|(i, _)| *i).collect(),
            Some(MultiRuleStrategy::All) => candidates.iter().map(|(i, _)| *i).collect(),
            Some(MultiRuleStrategy::MostSpecific) => {
                let mut best: Option<(usize, Specificity)> = None;
                for (idx, rule) in candidates {
                    let spec = selector::specificity(&rule.full_selector());
                    if best.map_or(true, |(_, b)| spec > b) {
                        best = Some((*idx, spec));
                    }
                }
                best.map(|(i, _)| vec![i]).unwrap_or_default()
            }
            None => Vec::new(),
        };
        (strategy, chosen)
    }
}

fn balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
