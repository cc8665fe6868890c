//! Merge engine: applies an override set to a source rule family and
//! produces the CSS plus class bookkeeping for the chosen mode.

use crate::cascade::{self, MergeOrigin};
use crate::config::{MergeConfig, MergeMode, RuleSelection};
use crate::error::{CascadeError, Result};
use crate::naming::{self, NameGenerator};
use crate::output;
use crate::parser;
use crate::resolver::{ConflictResolver, Diagnostics, MediaStrategy, PseudoStrategy, Strategy};
use crate::selector;
use crate::types::{ConflictRecord, Declaration, MergeResult, OverrideSpec, Rule, Scope};
use crate::validation::CssValidator;

/// Accepted source forms, resolved once into rules before merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeSource {
    /// CSS text: a stylesheet when it contains a block, otherwise a bare
    /// declaration list
    Text(String),
    /// A bare properties mapping with no selector
    Declarations(Vec<Declaration>),
    /// Already-parsed rules; the first rule's selector is the primary one
    Rules(Vec<Rule>),
}

impl From<&str> for MergeSource {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for MergeSource {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<Declaration>> for MergeSource {
    fn from(declarations: Vec<Declaration>) -> Self {
        Self::Declarations(declarations)
    }
}

impl From<Rule> for MergeSource {
    fn from(rule: Rule) -> Self {
        Self::Rules(vec![rule])
    }
}

impl From<Vec<Rule>> for MergeSource {
    fn from(rules: Vec<Rule>) -> Self {
        Self::Rules(rules)
    }
}

impl MergeSource {
    pub fn into_rules(self) -> Result<Vec<Rule>> {
        let rules = match self {
            Self::Text(text) => {
                if text.contains('{') {
                    parser::parse_stylesheet(&text)?
                } else {
                    vec![Rule::new("").with_declarations(parser::parse_declarations(&text)?)]
                }
            }
            Self::Declarations(declarations) => vec![Rule::new("").with_declarations(declarations)],
            Self::Rules(rules) => rules,
        };
        if rules.is_empty() {
            return Err(CascadeError::malformed("merge source contains no rules"));
        }
        Ok(rules)
    }
}

/// Working state of one merge call
struct MergeState {
    rules: Vec<Rule>,
    modified: Vec<bool>,
    extracted: Vec<Rule>,
    primary: String,
    owner: Vec<String>,
}

impl MergeState {
    fn new(rules: Vec<Rule>) -> Self {
        let primary = rules[0].selector.clone();
        let owner = match selector::class_name(&primary) {
            Some(class) => vec![class],
            None if primary.is_empty() => Vec::new(),
            None => vec![primary.clone()],
        };
        Self {
            modified: vec![false; rules.len()],
            rules,
            extracted: Vec::new(),
            primary,
            owner,
        }
    }

    fn origin(&self, scope: Scope) -> MergeOrigin {
        MergeOrigin::new(self.owner.clone(), scope)
    }

    fn in_family(&self, rule: &Rule) -> bool {
        rule.selector == self.primary
    }

    fn find(&self, scope: &Scope) -> Option<usize> {
        self.rules
            .iter()
            .position(|r| self.in_family(r) && r.pseudo == scope.pseudo && r.media == scope.media)
    }

    /// First unscoped rule of the family, else the very first rule
    fn base_index(&self) -> usize {
        self.find(&Scope::base()).unwrap_or(0)
    }

    /// Inserts a new family rule. Pseudo rules go after the last unscoped
    /// family rule, media rules after the last family rule.
    fn insert(&mut self, rule: Rule) -> usize {
        let anchor = self
            .rules
            .iter()
            .rposition(|r| self.in_family(r) && (rule.media.is_some() || r.media.is_none()));
        let at = anchor.map(|i| i + 1).unwrap_or(self.rules.len());
        self.rules.insert(at, rule);
        self.modified.insert(at, true);
        at
    }

    fn set(&mut self, index: usize, declarations: Vec<Declaration>) {
        if self.rules[index].declarations != declarations {
            self.rules[index].declarations = declarations;
            self.modified[index] = true;
        }
    }

    fn scoped_rule(&self, scope: &Scope, declarations: Vec<Declaration>) -> Rule {
        Rule {
            selector: self.primary.clone(),
            pseudo: scope.pseudo.clone(),
            media: scope.media.clone(),
            declarations,
        }
    }
}

/// Applies override sets to source rules. Holds the naming state, so
/// sequential names keep counting across calls until `reset_naming`.
pub struct MergeEngine {
    config: MergeConfig,
    resolver: ConflictResolver,
    naming: NameGenerator,
    validator: CssValidator,
}

impl MergeEngine {
    pub fn new(config: MergeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            resolver: ConflictResolver::new(config.conflict_resolution.clone()),
            naming: NameGenerator::new(config.naming.clone()),
            validator: CssValidator::new(config.validation.clone()),
            config,
        })
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merges using the configured mode
    pub fn merge(&mut self, source: impl Into<MergeSource>, overrides: &OverrideSpec) -> Result<MergeResult> {
        let mode = self.config.mode;
        self.merge_with_mode(source, overrides, mode)
    }

    pub fn merge_with_mode(
        &mut self,
        source: impl Into<MergeSource>,
        overrides: &OverrideSpec,
        mode: MergeMode,
    ) -> Result<MergeResult> {
        let rules = source.into().into_rules()?;
        let mut diag = Diagnostics::default();

        self.validator.validate_overrides(overrides, &mut diag)?;
        if self.validator.config().enabled {
            for rule in &rules {
                let context = format!("'{}'", rule.full_selector());
                self.validator.report_duplicates(&rule.declarations, &context, &mut diag);
            }
        }

        let mut state = MergeState::new(rules);
        log::debug!(
            "Merging {} override declaration(s) into '{}' ({} rule(s), mode {:?})",
            overrides.flatten().len(),
            state.primary,
            state.rules.len(),
            mode
        );

        self.apply_base(&mut state, overrides, &mut diag);
        for scoped in &overrides.scoped {
            if scoped.declarations.is_empty() {
                continue;
            }
            if let Some(pseudo) = &scoped.scope.pseudo {
                self.apply_pseudo(&mut state, &scoped.scope, pseudo, &scoped.declarations, &mut diag);
            } else if let Some(media) = &scoped.scope.media {
                self.apply_media(&mut state, &scoped.scope, media, &scoped.declarations, &mut diag);
            }
        }

        if diag.strip_requested {
            let stripped: usize = state
                .rules
                .iter_mut()
                .chain(state.extracted.iter_mut())
                .map(|r| cascade::strip_important(&mut r.declarations))
                .sum();
            if stripped > 0 {
                diag.warn(format!("importance:strip removed {} !important flag(s)", stripped));
            }
        }

        Ok(self.finish(state, mode, diag))
    }

    fn apply_base(&self, state: &mut MergeState, overrides: &OverrideSpec, diag: &mut Diagnostics) {
        if overrides.base.is_empty() {
            return;
        }

        let targets = match self.config.rule_selection {
            RuleSelection::First => vec![state.base_index()],
            RuleSelection::All => {
                let candidates: Vec<(usize, &Rule)> = state
                    .rules
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| selector::matches_apply_to(r, &self.config.apply_to))
                    .collect();
                let (strategy, chosen) = self.resolver.select_rules(&candidates);
                match strategy {
                    Some(strategy) => {
                        let names: Vec<String> = chosen.iter().map(|&i| state.rules[i].full_selector()).collect();
                        diag.note(format!(
                            "base overrides applied to {} ({})",
                            names.join(", "),
                            strategy.label()
                        ));
                    }
                    None => diag.warn(format!(
                        "no source rule matches apply_to [{}]; base overrides not applied",
                        self.config.apply_to.join(", ")
                    )),
                }
                chosen
            }
        };

        for index in targets {
            let rule = &state.rules[index];
            let merged = cascade::merge_declarations(
                &self.resolver,
                &rule.declarations,
                &overrides.base,
                &state.origin(rule.scope()),
                diag,
            );
            state.set(index, merged);
        }
    }

    fn apply_pseudo(
        &self,
        state: &mut MergeState,
        scope: &Scope,
        pseudo: &str,
        declarations: &[Declaration],
        diag: &mut Diagnostics,
    ) {
        let key = scope.key();
        match self.resolver.select_pseudo(pseudo) {
            Some(PseudoStrategy::Preserve) => self.merge_into_scope(state, scope, declarations, diag),
            Some(PseudoStrategy::Extract) => {
                let merged = cascade::merge_declarations(&self.resolver, &[], declarations, &state.origin(scope.clone()), diag);
                let rule = state.scoped_rule(scope, merged);
                state.extracted.push(rule);
                diag.note(format!("'{}' overrides extracted into a separate rule", key));
            }
            Some(PseudoStrategy::Inline) => {
                diag.exclude_inline(key.clone());
                diag.note(format!("'{}' overrides left to inline handling; pseudo states cannot be inlined", key));
            }
            Some(PseudoStrategy::Ignore) => {
                diag.warn(format!("'{}' overrides ignored ({})", key, PseudoStrategy::Ignore.label()));
                self.record_dropped(state, scope, declarations, PseudoStrategy::Ignore.label(), diag);
            }
            Some(PseudoStrategy::ForceMerge) => {
                let index = state.base_index();
                let base_scope = state.rules[index].scope();
                let merged = cascade::merge_declarations(
                    &self.resolver,
                    &state.rules[index].declarations,
                    declarations,
                    &state.origin(base_scope),
                    diag,
                );
                state.set(index, merged);
                diag.warn(format!(
                    "'{}' overrides merged into the base rule; state specificity is lost",
                    key
                ));
            }
            None => {
                diag.warn(format!(
                    "no pseudo strategy in {} applies to '{}'; overrides dropped",
                    self.resolver.config().pseudo.describe(),
                    key
                ));
                self.record_dropped(state, scope, declarations, "pseudo:fallback".to_string(), diag);
            }
        }
    }

    fn apply_media(
        &self,
        state: &mut MergeState,
        scope: &Scope,
        condition: &str,
        declarations: &[Declaration],
        diag: &mut Diagnostics,
    ) {
        let key = scope.key();
        let has_base = state.find(&Scope::base()).is_some();
        match self.resolver.select_media(condition, has_base) {
            Some(MediaStrategy::Preserve) => self.merge_into_scope(state, scope, declarations, diag),
            Some(MediaStrategy::Duplicate) => {
                let base = state.rules[state.base_index()].declarations.clone();
                let mut seed = base;
                if let Some(index) = state.find(scope) {
                    seed.extend(state.rules[index].declarations.iter().cloned());
                }
                let merged = cascade::merge_declarations(&self.resolver, &seed, declarations, &state.origin(scope.clone()), diag);
                match state.find(scope) {
                    Some(index) => state.set(index, merged),
                    None => {
                        let rule = state.scoped_rule(scope, merged);
                        state.insert(rule);
                    }
                }
                diag.note(format!("base rule duplicated into '{}'", key));
            }
            Some(MediaStrategy::Extract) => {
                let merged = cascade::merge_declarations(&self.resolver, &[], declarations, &state.origin(scope.clone()), diag);
                let rule = state.scoped_rule(scope, merged);
                state.extracted.push(rule);
                diag.note(format!("'{}' overrides extracted into a separate rule", key));
            }
            Some(MediaStrategy::Inline) => {
                diag.exclude_inline(key.clone());
                diag.note(format!("'{}' overrides left to runtime handling", key));
            }
            None => {
                diag.warn(format!(
                    "no media strategy in {} applies to '{}'; overrides dropped",
                    self.resolver.config().media.describe(),
                    key
                ));
                self.record_dropped(state, scope, declarations, "media:fallback".to_string(), diag);
            }
        }
    }

    /// Merges into the family rule for `scope`, creating it when missing
    fn merge_into_scope(&self, state: &mut MergeState, scope: &Scope, declarations: &[Declaration], diag: &mut Diagnostics) {
        match state.find(scope) {
            Some(index) => {
                let merged = cascade::merge_declarations(
                    &self.resolver,
                    &state.rules[index].declarations,
                    declarations,
                    &state.origin(scope.clone()),
                    diag,
                );
                state.set(index, merged);
            }
            None => {
                let merged = cascade::merge_declarations(&self.resolver, &[], declarations, &state.origin(scope.clone()), diag);
                let rule = state.scoped_rule(scope, merged);
                state.insert(rule);
            }
        }
    }

    fn record_dropped(
        &self,
        state: &MergeState,
        scope: &Scope,
        declarations: &[Declaration],
        strategy: String,
        diag: &mut Diagnostics,
    ) {
        for decl in declarations {
            diag.record(ConflictRecord {
                property: decl.property.clone(),
                source_classes: state.owner.clone(),
                resolution: "override dropped".to_string(),
                strategy_used: strategy.clone(),
                scope: Some(scope.key()),
            });
        }
    }

    fn finish(&mut self, state: MergeState, mode: MergeMode, diag: Diagnostics) -> MergeResult {
        let original_class = selector::class_name(&state.primary);
        let mut result = MergeResult {
            warnings: diag.warnings,
            info: diag.info,
            conflicts: diag.conflicts,
            inline_excluded: diag.inline_excluded,
            ..Default::default()
        };

        let output: Vec<Rule> = match mode {
            MergeMode::Permanent => {
                result.preserve.extend(original_class);
                state.rules.into_iter().chain(state.extracted).collect()
            }
            MergeMode::Component | MergeMode::Replace => {
                let mut family: Vec<Rule> = Vec::new();
                let mut outside: Vec<Rule> = Vec::new();
                for (rule, modified) in state.rules.into_iter().zip(state.modified) {
                    if rule.selector == state.primary {
                        family.push(rule);
                    } else if modified {
                        result.warnings.push(format!(
                            "rule '{}' received overrides outside '{}'; emitted under its own selector",
                            rule.full_selector(),
                            state.primary
                        ));
                        outside.push(rule);
                    }
                }

                let family_len = family.len();
                let mut named: Vec<Rule> = family.into_iter().chain(state.extracted).collect();
                let name = self.naming.generate(&state.primary, &naming::fingerprint(&named));
                for rule in named.iter_mut() {
                    rule.selector = format!(".{}", name);
                }
                log::debug!("Generated class '{}' for '{}'", name, state.primary);

                // extracted rules stay last
                for (offset, rule) in outside.into_iter().enumerate() {
                    named.insert(family_len + offset, rule);
                }

                result.add.push(name);
                if mode == MergeMode::Component {
                    result.preserve.extend(original_class);
                } else {
                    result.remove.extend(original_class);
                }
                named
            }
        };

        result.css = output.iter().map(output::format_rule_compact).collect();
        result
    }

    /// Clears the sequential counter and issued-name registry
    pub fn reset_naming(&mut self) {
        self.naming.reset();
    }

    pub fn batch(&mut self) -> BatchMerger<'_> {
        BatchMerger {
            engine: self,
            queue: Vec::new(),
        }
    }
}

/// Queue of merges executed in insertion order against one engine
pub struct BatchMerger<'a> {
    engine: &'a mut MergeEngine,
    queue: Vec<(MergeSource, OverrideSpec, Option<MergeMode>)>,
}

impl<'a> BatchMerger<'a> {
    pub fn add(&mut self, source: impl Into<MergeSource>, overrides: OverrideSpec) -> &mut Self {
        self.queue.push((source.into(), overrides, None));
        self
    }

    pub fn add_with_mode(&mut self, source: impl Into<MergeSource>, overrides: OverrideSpec, mode: MergeMode) -> &mut Self {
        self.queue.push((source.into(), overrides, Some(mode)));
        self
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Runs every queued merge; one failure does not stop the rest
    pub fn execute(&mut self) -> Vec<Result<MergeResult>> {
        let queue = std::mem::take(&mut self.queue);
        log::info!("Executing batch of {} merge(s)", queue.len());
        queue
            .into_iter()
            .map(|(source, overrides, mode)| {
                let mode = mode.unwrap_or(self.engine.config.mode);
                self.engine.merge_with_mode(source, &overrides, mode)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NamingStrategy;
    use crate::resolver::{ImportanceStrategy, MultiRuleStrategy, ShorthandStrategy, StrategyChain};

    fn engine(mode: MergeMode) -> MergeEngine {
        MergeEngine::new(MergeConfig::with_mode(mode)).unwrap()
    }

    #[test]
    fn test_permanent_mode() {
        let mut engine = engine(MergeMode::Permanent);
        let result = engine
            .merge(".btn { color: blue; padding: 4px; }", &OverrideSpec::new().set("color", "red"))
            .unwrap();
        assert_eq!(result.css, vec![".btn { color: red; padding: 4px; }"]);
        assert!(result.add.is_empty());
        assert!(result.remove.is_empty());
        assert_eq!(result.preserve, vec!["btn"]);
        assert_eq!(result.conflicts.len(), 1);
    }

    #[test]
    fn test_component_and_replace_modes() {
        let source = ".card { margin: 0; }";
        let overrides = OverrideSpec::new().set("padding", "8px");

        let component = engine(MergeMode::Component).merge(source, &overrides).unwrap();
        let name = &component.add[0];
        assert!(name.starts_with("csscade-card-"));
        assert_eq!(component.css, vec![format!(".{} {{ margin: 0; padding: 8px; }}", name)]);
        assert_eq!(component.preserve, vec!["card"]);
        assert!(component.remove.is_empty());

        let replace = engine(MergeMode::Replace).merge(source, &overrides).unwrap();
        assert_eq!(&replace.add[0], name);
        assert_eq!(replace.remove, vec!["card"]);
        assert!(replace.preserve.is_empty());
    }

    #[test]
    fn test_bare_declarations() {
        let mut engine = engine(MergeMode::Permanent);
        let result = engine.merge("color: blue; margin: 0", &OverrideSpec::new().set("margin", "4px")).unwrap();
        assert_eq!(result.css, vec!["color: blue; margin: 4px;"]);
        assert!(result.preserve.is_empty());

        let mut component = MergeEngine::new(MergeConfig::default()).unwrap();
        let named = component
            .merge(vec![Declaration::new("color", "blue")], &OverrideSpec::new())
            .unwrap();
        assert!(named.add[0].starts_with("csscade-style-"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut engine = engine(MergeMode::Permanent);
        let overrides = OverrideSpec::new().set("margin-top", "30px").set("color", "red !important");
        let first = engine.merge(".x { margin: 10px; color: blue; }", &overrides).unwrap();
        let second = engine.merge(first.css_text(), &OverrideSpec::new()).unwrap();
        assert_eq!(first.css, second.css);
        assert!(second.conflicts.is_empty());
    }

    #[test]
    fn test_pseudo_and_media_scopes_preserved() {
        let mut engine = engine(MergeMode::Permanent);
        let source = ".btn { color: blue; } .btn:hover { color: navy; }";
        let overrides = OverrideSpec::new()
            .pseudo(":hover", &[("color", "red")])
            .pseudo(":focus", &[("outline", "none")])
            .media("(max-width: 600px)", &[("padding", "4px")]);
        let result = engine.merge(source, &overrides).unwrap();
        assert_eq!(
            result.css,
            vec![
                ".btn { color: blue; }",
                ".btn:hover { color: red; }",
                ".btn:focus { outline: none; }",
                "@media (max-width: 600px) { .btn { padding: 4px; } }",
            ]
        );
    }

    #[test]
    fn test_pseudo_strategies() {
        let with_pseudo = |strategy: PseudoStrategy| {
            let mut config = MergeConfig::with_mode(MergeMode::Permanent);
            config.conflict_resolution.pseudo = StrategyChain::single(strategy);
            MergeEngine::new(config).unwrap()
        };
        let overrides = OverrideSpec::new().pseudo(":hover", &[("color", "red")]);
        let source = ".btn { color: blue; }";

        let inline = with_pseudo(PseudoStrategy::Inline).merge(source, &overrides).unwrap();
        assert_eq!(inline.css, vec![".btn { color: blue; }"]);
        assert_eq!(inline.inline_excluded, vec![":hover"]);

        let ignore = with_pseudo(PseudoStrategy::Ignore).merge(source, &overrides).unwrap();
        assert_eq!(ignore.css, vec![".btn { color: blue; }"]);
        assert_eq!(ignore.warnings.len(), 1);
        assert_eq!(ignore.conflicts[0].strategy_used, "pseudo:ignore");

        let forced = with_pseudo(PseudoStrategy::ForceMerge).merge(source, &overrides).unwrap();
        assert_eq!(forced.css, vec![".btn { color: red; }"]);
        assert_eq!(forced.warnings.len(), 1);

        let extract = with_pseudo(PseudoStrategy::Extract)
            .merge(".btn { color: blue; } .btn:hover { color: navy; }", &overrides)
            .unwrap();
        assert_eq!(
            extract.css,
            vec![".btn { color: blue; }", ".btn:hover { color: navy; }", ".btn:hover { color: red; }"]
        );
    }

    #[test]
    fn test_media_duplicate() {
        let mut config = MergeConfig::with_mode(MergeMode::Permanent);
        config.conflict_resolution.media = StrategyChain::single(MediaStrategy::Duplicate);
        let mut engine = MergeEngine::new(config).unwrap();
        let overrides = OverrideSpec::new().media("@media (max-width: 600px)", &[("padding", "4px")]);
        let result = engine.merge(".box { padding: 20px; color: red; }", &overrides).unwrap();
        assert_eq!(
            result.css[1],
            "@media (max-width: 600px) { .box { padding: 4px; color: red; } }"
        );
    }

    #[test]
    fn test_media_extract_and_inline() {
        let with_media = |strategy: MediaStrategy| {
            let mut config = MergeConfig::with_mode(MergeMode::Permanent);
            config.conflict_resolution.media = StrategyChain::single(strategy);
            MergeEngine::new(config).unwrap()
        };
        let source = ".box { padding: 20px; } @media (max-width: 600px) { .box { padding: 10px; } }";
        let overrides = OverrideSpec::new().media("(max-width: 600px)", &[("padding", "4px")]);

        let extract = with_media(MediaStrategy::Extract).merge(source, &overrides).unwrap();
        assert_eq!(
            extract.css,
            vec![
                ".box { padding: 20px; }",
                "@media (max-width: 600px) { .box { padding: 10px; } }",
                "@media (max-width: 600px) { .box { padding: 4px; } }",
            ]
        );
        assert!(extract.inline_excluded.is_empty());
        assert!(extract.info.iter().any(|i| i.contains("extracted")));

        let inline = with_media(MediaStrategy::Inline).merge(source, &overrides).unwrap();
        assert_eq!(
            inline.css,
            vec![".box { padding: 20px; }", "@media (max-width: 600px) { .box { padding: 10px; } }"]
        );
        assert_eq!(inline.inline_excluded, vec!["@media (max-width: 600px)"]);
        assert!(inline.warnings.is_empty());
    }

    #[test]
    fn test_multi_rule_scoping() {
        let mut config = MergeConfig::with_mode(MergeMode::Permanent);
        config.rule_selection = RuleSelection::All;
        config.apply_to = vec!["base".to_string()];
        let mut engine = MergeEngine::new(config.clone()).unwrap();
        let source = ".btn { color: blue; } .btn:hover { color: navy; }";
        let overrides = OverrideSpec::new().set("color", "red");

        let result = engine.merge(source, &overrides).unwrap();
        assert_eq!(result.css, vec![".btn { color: red; }", ".btn:hover { color: navy; }"]);

        config.apply_to = vec![".*".to_string()];
        config.conflict_resolution.multi_rule = StrategyChain::single(MultiRuleStrategy::All);
        let result = MergeEngine::new(config.clone()).unwrap().merge(source, &overrides).unwrap();
        assert_eq!(result.css, vec![".btn { color: red; }", ".btn:hover { color: navy; }"]);

        config.apply_to = vec!["all".to_string()];
        let result = MergeEngine::new(config.clone()).unwrap().merge(source, &overrides).unwrap();
        assert_eq!(result.css, vec![".btn { color: red; }", ".btn:hover { color: red; }"]);

        config.conflict_resolution.multi_rule = StrategyChain::single(MultiRuleStrategy::MostSpecific);
        let result = MergeEngine::new(config).unwrap().merge(source, &overrides).unwrap();
        assert_eq!(result.css, vec![".btn { color: blue; }", ".btn:hover { color: red; }"]);
    }

    #[test]
    fn test_component_renames_family() {
        let mut engine = engine(MergeMode::Component);
        let source = ".btn { color: blue; } .btn:hover { color: navy; } .other { margin: 0; }";
        let result = engine.merge(source, &OverrideSpec::new().set("color", "red")).unwrap();
        let name = &result.add[0];
        assert_eq!(
            result.css,
            vec![format!(".{} {{ color: red; }}", name), format!(".{}:hover {{ color: navy; }}", name)]
        );
    }

    #[test]
    fn test_strip_and_smart_through_engine() {
        let mut config = MergeConfig::with_mode(MergeMode::Permanent);
        config.conflict_resolution.importance = StrategyChain::single(ImportanceStrategy::Strip);
        config.conflict_resolution.shorthand = StrategyChain::single(ShorthandStrategy::Smart);
        let mut engine = MergeEngine::new(config).unwrap();
        let result = engine
            .merge(
                ".text { margin: 10px; padding: 20px; color: blue !important; }",
                &OverrideSpec::new().set("margin-top", "30px").set("padding", "15px"),
            )
            .unwrap();
        assert_eq!(result.css, vec![".text { margin: 30px 10px 10px; padding: 15px; color: blue; }"]);
        assert!(result.warnings.iter().any(|w| w.contains("importance:strip")));
    }

    #[test]
    fn test_hash_names_are_deterministic() {
        let mut config = MergeConfig::default();
        config.naming.strategy = NamingStrategy::Hash;
        let mut engine = MergeEngine::new(config).unwrap();
        let a = engine.merge(".a { color: blue; }", &OverrideSpec::new().set("color", "red")).unwrap();
        let b = engine.merge(".b { color: green; }", &OverrideSpec::new().set("color", "red")).unwrap();
        assert_eq!(a.add, b.add);
    }

    #[test]
    fn test_sequential_names_increase() {
        let mut config = MergeConfig::default();
        config.naming.strategy = NamingStrategy::Sequential;
        let mut engine = MergeEngine::new(config).unwrap();
        let first = engine.merge(".a { color: blue; }", &OverrideSpec::new()).unwrap();
        let second = engine.merge(".a { color: blue; }", &OverrideSpec::new()).unwrap();
        assert_eq!(first.add, vec!["csscade-1"]);
        assert_eq!(second.add, vec!["csscade-2"]);
        engine.reset_naming();
        let third = engine.merge(".z { top: 0; }", &OverrideSpec::new()).unwrap();
        assert_eq!(third.add, vec!["csscade-1"]);
    }

    #[test]
    fn test_batch_runs_in_order() {
        let mut config = MergeConfig::default();
        config.naming.strategy = NamingStrategy::Sequential;
        let mut engine = MergeEngine::new(config).unwrap();
        let mut batch = engine.batch();
        batch
            .add(".a { color: blue; }", OverrideSpec::new())
            .add(".b { color: red;", OverrideSpec::new())
            .add_with_mode(".c { color: blue; }", OverrideSpec::new(), MergeMode::Permanent)
            .add(".d { color: blue; }", OverrideSpec::new());
        assert_eq!(batch.len(), 4);
        let results = batch.execute();
        assert!(batch.is_empty());
        assert_eq!(results[0].as_ref().unwrap().add, vec!["csscade-1"]);
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().add.is_empty());
        assert_eq!(results[3].as_ref().unwrap().add, vec!["csscade-2"]);
    }

    #[test]
    fn test_malformed_source_fails() {
        let mut engine = engine(MergeMode::Component);
        assert!(engine.merge(".a { color: red;", &OverrideSpec::new()).is_err());
        assert!(engine.merge(MergeSource::Rules(Vec::new()), &OverrideSpec::new()).is_err());
    }

    #[test]
    fn test_strict_validation_aborts() {
        let mut config = MergeConfig::default();
        config.validation.enabled = true;
        config.validation.strict = true;
        let mut engine = MergeEngine::new(config).unwrap();
        let err = engine.merge(".a { color: red; }", &OverrideSpec::new().set("colr", "blue")).unwrap_err();
        assert!(matches!(err, CascadeError::Validation { .. }));
    }
}
