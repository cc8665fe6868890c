//! Combinator: decides which already-applied classes an override set makes
//! obsolete and generates one replacement class for the element.

use crate::cascade::{self, MergeOrigin};
use crate::catalog::{ClassEntry, CssCatalog};
use crate::config::CombinatorConfig;
use crate::core::properties;
use crate::error::{CascadeError, Result};
use crate::naming::{self, NameGenerator};
use crate::output;
use crate::parser;
use crate::resolver::{ConflictResolver, Diagnostics, MediaStrategy, PseudoStrategy, Strategy};
use crate::selector;
use crate::types::{CombinatorResult, ConflictRecord, Declaration, OverrideSpec, Rule, Scope, StyleMap};
use std::path::Path;

/// Where the declarations of one override scope end up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Merged into the generated rule for the same scope
    InPlace,
    /// Like `InPlace`, seeded with the generated base declarations
    Duplicate,
    /// Emitted as a rule of its own after every other generated rule
    Extract,
}

/// Override declarations after the pseudo and media strategies ran.
/// Force-merged pseudo declarations are already folded into `base`.
#[derive(Debug, Default)]
struct RoutedOverrides {
    base: Vec<Declaration>,
    scoped: Vec<(Scope, Vec<Declaration>, Placement)>,
}

impl RoutedOverrides {
    fn flatten(&self) -> Vec<(Scope, &Declaration)> {
        let mut out: Vec<(Scope, &Declaration)> = self.base.iter().map(|d| (Scope::base(), d)).collect();
        for (scope, declarations, _) in &self.scoped {
            out.extend(declarations.iter().map(|d| (scope.clone(), d)));
        }
        out
    }

    /// Declarations merged into the generated rule for `scope`
    fn declarations_for(&self, scope: &Scope) -> &[Declaration] {
        if scope.is_base() {
            return &self.base;
        }
        self.scoped
            .iter()
            .find(|(s, _, placement)| s == scope && *placement != Placement::Extract)
            .map(|(_, declarations, _)| declarations.as_slice())
            .unwrap_or(&[])
    }

    fn placement(&self, scope: &Scope) -> Option<Placement> {
        self.scoped.iter().find(|(s, _, _)| s == scope).map(|(_, _, p)| *p)
    }
}

/// One element of a batch
#[derive(Debug, Clone, Default)]
pub struct ElementRequest {
    pub element_classes: Vec<String>,
    pub overrides: OverrideSpec,
    pub element_id: Option<String>,
}

pub struct Combinator {
    catalog: CssCatalog,
    config: CombinatorConfig,
    resolver: ConflictResolver,
    naming: NameGenerator,
}

impl Combinator {
    pub fn new(config: CombinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog: CssCatalog::new(),
            resolver: ConflictResolver::new(config.conflict_resolution.clone()),
            naming: NameGenerator::new(config.naming.clone()),
            config,
        })
    }

    pub fn config(&self) -> &CombinatorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &CssCatalog {
        &self.catalog
    }

    pub fn load_css(&mut self, name: &str, css: &str) -> Result<usize> {
        self.catalog.load_text(name, css)
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.catalog.load_file(path)
    }

    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        self.catalog.load_dir(dir)
    }

    /// Drops every loaded stylesheet
    pub fn clear_cache(&mut self) {
        self.catalog.clear();
    }

    pub fn loaded_sources(&self) -> &[String] {
        self.catalog.loaded_sources()
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.catalog.has_class(name)
    }

    pub fn class_declarations(&self, name: &str) -> Option<&ClassEntry> {
        self.catalog.class(name)
    }

    pub fn reset_naming(&mut self) {
        self.naming.reset();
    }

    /// Splits `element_classes` into classes to remove and keep, and builds
    /// the override class that replaces the removed ones.
    pub fn detect(
        &mut self,
        element_classes: &[String],
        overrides: &OverrideSpec,
        element_id: Option<&str>,
    ) -> Result<CombinatorResult> {
        if self.catalog.is_empty() {
            return Err(CascadeError::NoCssLoaded);
        }

        let mut diag = Diagnostics::default();
        let mut result = CombinatorResult::default();

        let mut classes: Vec<&str> = Vec::new();
        for class in element_classes {
            let class = class.trim().trim_start_matches('.');
            if !class.is_empty() && !classes.contains(&class) {
                classes.push(class);
            }
        }

        let routed = self.route_scopes(overrides, &classes, &mut diag);
        let requested = routed.flatten();

        let mut removed: Vec<&ClassEntry> = Vec::new();
        let mut kept: Vec<&ClassEntry> = Vec::new();
        for class in &classes {
            match self.catalog.class(class) {
                Some(entry) => {
                    let conflicting = requested
                        .iter()
                        .any(|(scope, o)| declares_overlap(entry, scope, &o.property));
                    if conflicting {
                        result.remove_classes.push(entry.name.clone());
                        removed.push(entry);
                    } else {
                        result.keep_classes.push(entry.name.clone());
                        kept.push(entry);
                    }
                }
                None => {
                    result.keep_classes.push(class.to_string());
                    diag.note(format!("class '{}' not found in loaded CSS; kept", class));
                }
            }
        }

        for (scope, o) in &requested {
            let owners: Vec<String> = removed
                .iter()
                .filter(|entry| declares_overlap(entry, scope, &o.property))
                .map(|entry| entry.name.clone())
                .collect();
            if !owners.is_empty() {
                diag.record(ConflictRecord {
                    property: o.property.clone(),
                    source_classes: owners,
                    resolution: "class removed, override wins".to_string(),
                    strategy_used: "combinator:remove".to_string(),
                    scope: scope_label(scope),
                });
            }
        }

        let mut rules = self.generate_rules(&routed, &removed, &mut diag);
        if diag.strip_requested {
            let stripped: usize = rules.iter_mut().map(|r| cascade::strip_important(&mut r.declarations)).sum();
            if stripped > 0 {
                diag.warn(format!("importance:strip removed {} !important flag(s)", stripped));
            }
        } else {
            mark_contested(&mut rules, &kept, &mut diag);
        }

        if !rules.is_empty() {
            let seed = element_id
                .map(str::to_string)
                .or_else(|| result.remove_classes.first().cloned())
                .unwrap_or_else(|| "element".to_string());
            let name = self.naming.generate(&seed, &naming::fingerprint(&rules));
            for rule in rules.iter_mut() {
                rule.selector = format!(".{}", name);
            }
            result.generated_css = rules.iter().map(output::format_rule_expanded).collect::<Vec<_>>().join("\n");
            result.add_classes.push(name);
        }

        let mut inline = StyleMap::new();
        for decl in &overrides.base {
            inline.insert(output::to_camel_case(&decl.property), decl.value.clone());
        }
        result.fallback_inline = inline;

        log::debug!(
            "Element {}: remove {:?}, keep {:?}",
            element_id.unwrap_or("<anonymous>"),
            result.remove_classes,
            result.keep_classes
        );

        result.conflicts_found = diag.conflicts;
        result.inline_excluded = diag.inline_excluded;
        result.warnings = diag.warnings;
        result.info = diag.info;
        Ok(result)
    }

    /// Runs `detect` on the classes of the first element in `html`
    pub fn process_element(
        &mut self,
        html: &str,
        overrides: &OverrideSpec,
        element_id: Option<&str>,
    ) -> Result<CombinatorResult> {
        let classes = parser::extract_classes(html);
        self.detect(&classes, overrides, element_id)
    }

    /// Independent `detect` per element, in the given order
    pub fn process_batch(&mut self, requests: &[ElementRequest]) -> Result<Vec<CombinatorResult>> {
        requests
            .iter()
            .map(|r| self.detect(&r.element_classes, &r.overrides, r.element_id.as_deref()))
            .collect()
    }

    /// Applies the pseudo and media strategies to every scoped override
    fn route_scopes(&self, overrides: &OverrideSpec, classes: &[&str], diag: &mut Diagnostics) -> RoutedOverrides {
        let mut routed = RoutedOverrides {
            base: overrides.base.clone(),
            scoped: Vec::new(),
        };

        for scoped in &overrides.scoped {
            let scope = &scoped.scope;
            let declarations = &scoped.declarations;
            let key = scope.key();
            let placement = match (&scope.media, &scope.pseudo) {
                (Some(condition), _) => match self.resolver.select_media(condition, true) {
                    Some(MediaStrategy::Preserve) => Some(Placement::InPlace),
                    Some(MediaStrategy::Duplicate) => Some(Placement::Duplicate),
                    Some(MediaStrategy::Extract) => Some(Placement::Extract),
                    Some(MediaStrategy::Inline) => {
                        diag.exclude_inline(key.clone());
                        diag.note(format!("'{}' overrides left to runtime handling", key));
                        None
                    }
                    None => {
                        diag.warn(format!(
                            "no media strategy in {} applies to '{}'; overrides dropped",
                            self.resolver.config().media.describe(),
                            key
                        ));
                        self.record_dropped(scope, declarations, classes, "media:fallback".to_string(), diag);
                        None
                    }
                },
                (None, Some(pseudo)) => match self.resolver.select_pseudo(pseudo) {
                    Some(PseudoStrategy::Preserve) => Some(Placement::InPlace),
                    Some(PseudoStrategy::Extract) => Some(Placement::Extract),
                    Some(PseudoStrategy::Inline) => {
                        diag.exclude_inline(key.clone());
                        diag.note(format!("'{}' overrides left to inline handling; pseudo states cannot be inlined", key));
                        None
                    }
                    Some(PseudoStrategy::Ignore) => {
                        diag.warn(format!("'{}' overrides ignored ({})", key, PseudoStrategy::Ignore.label()));
                        self.record_dropped(scope, declarations, classes, PseudoStrategy::Ignore.label(), diag);
                        None
                    }
                    Some(PseudoStrategy::ForceMerge) => {
                        routed.base.extend(declarations.iter().cloned());
                        diag.warn(format!(
                            "'{}' overrides merged into the base rule; state specificity is lost",
                            key
                        ));
                        None
                    }
                    None => {
                        diag.warn(format!(
                            "no pseudo strategy in {} applies to '{}'; overrides dropped",
                            self.resolver.config().pseudo.describe(),
                            key
                        ));
                        self.record_dropped(scope, declarations, classes, "pseudo:fallback".to_string(), diag);
                        None
                    }
                },
                (None, None) => {
                    routed.base.extend(declarations.iter().cloned());
                    None
                }
            };
            if let Some(placement) = placement {
                routed.scoped.push((scope.clone(), declarations.clone(), placement));
            }
        }
        routed
    }

    fn record_dropped(
        &self,
        scope: &Scope,
        declarations: &[Declaration],
        classes: &[&str],
        strategy: String,
        diag: &mut Diagnostics,
    ) {
        for decl in declarations {
            let owners: Vec<String> = classes
                .iter()
                .filter_map(|class| self.catalog.class(class))
                .filter(|entry| declares_overlap(entry, scope, &decl.property))
                .map(|entry| entry.name.clone())
                .collect();
            diag.record(ConflictRecord {
                property: decl.property.clone(),
                source_classes: owners,
                resolution: "override dropped".to_string(),
                strategy_used: strategy.clone(),
                scope: Some(scope.key()),
            });
        }
    }

    /// Base scope first, then override scopes, then scopes only the removed
    /// classes define (when carrying over). Extracted overrides come last.
    fn generate_rules(&self, routed: &RoutedOverrides, removed: &[&ClassEntry], diag: &mut Diagnostics) -> Vec<Rule> {
        let mut scopes: Vec<Scope> = vec![Scope::base()];
        for (scope, _, placement) in &routed.scoped {
            if *placement != Placement::Extract && !scopes.contains(scope) {
                scopes.push(scope.clone());
            }
        }
        if self.config.carry_over {
            for entry in removed {
                for scoped in &entry.scopes {
                    if !scopes.contains(&scoped.scope) {
                        scopes.push(scoped.scope.clone());
                    }
                }
            }
        }

        // Carried declarations follow stylesheet order, not element order.
        let ordered: Vec<&ClassEntry> = self
            .catalog
            .classes()
            .iter()
            .filter(|c| removed.iter().any(|r| r.name == c.name))
            .collect();
        let sources: Vec<String> = ordered.iter().map(|c| c.name.clone()).collect();

        let mut rules = Vec::new();
        let mut base_merged: Vec<Declaration> = Vec::new();
        for scope in scopes {
            let carried: Vec<Declaration> = if self.config.carry_over {
                ordered
                    .iter()
                    .flat_map(|c| c.declarations_for(&scope).iter().cloned())
                    .collect()
            } else {
                Vec::new()
            };
            let seed: Vec<Declaration> = if routed.placement(&scope) == Some(Placement::Duplicate) {
                diag.note(format!("base declarations duplicated into '{}'", scope.key()));
                base_merged.iter().cloned().chain(carried).collect()
            } else {
                carried
            };
            let origin = MergeOrigin::new(sources.clone(), scope.clone());
            let merged = cascade::merge_declarations(
                &self.resolver,
                &seed,
                routed.declarations_for(&scope),
                &origin,
                diag,
            );
            if scope.is_base() {
                base_merged = merged.clone();
            }
            if merged.is_empty() {
                continue;
            }
            rules.push(Rule {
                selector: String::new(),
                pseudo: scope.pseudo,
                media: scope.media,
                declarations: merged,
            });
        }

        for (scope, declarations, placement) in &routed.scoped {
            if *placement != Placement::Extract {
                continue;
            }
            let origin = MergeOrigin::new(sources.clone(), scope.clone());
            let merged = cascade::merge_declarations(&self.resolver, &[], declarations, &origin, diag);
            if merged.is_empty() {
                continue;
            }
            diag.note(format!("'{}' overrides extracted into a separate rule", scope.key()));
            rules.push(Rule {
                selector: String::new(),
                pseudo: scope.pseudo.clone(),
                media: scope.media.clone(),
                declarations: merged,
            });
        }
        rules
    }
}

fn declares_overlap(entry: &ClassEntry, scope: &Scope, property: &str) -> bool {
    entry
        .declarations_for(scope)
        .iter()
        .any(|d| properties::overlaps(&d.property, property))
}

fn scope_label(scope: &Scope) -> Option<String> {
    if scope.is_base() {
        None
    } else {
        Some(scope.key())
    }
}

/// Marks generated declarations `!important` where a kept class has an
/// overlapping declaration under a more specific (pseudo-state) selector.
fn mark_contested(rules: &mut [Rule], kept: &[&ClassEntry], diag: &mut Diagnostics) {
    for rule in rules.iter_mut() {
        let generated = selector::specificity(&format!(".x{}", rule.pseudo.as_deref().unwrap_or("")));
        let label = scope_label(&rule.scope());
        for decl in rule.declarations.iter_mut().filter(|d| !d.important) {
            let rivals: Vec<String> = kept
                .iter()
                .filter(|entry| {
                    entry.scopes.iter().any(|s| {
                        let Some(pseudo) = &s.scope.pseudo else {
                            return false;
                        };
                        selector::specificity(&format!(".x{}", pseudo)) > generated
                            && s.declarations.iter().any(|d| properties::overlaps(&d.property, &decl.property))
                    })
                })
                .map(|entry| entry.name.clone())
                .collect();
            if rivals.is_empty() {
                continue;
            }
            decl.important = true;
            diag.record(ConflictRecord {
                property: decl.property.clone(),
                source_classes: rivals,
                resolution: "marked !important over a kept state rule".to_string(),
                strategy_used: "combinator:important".to_string(),
                scope: label.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConflictResolutionConfig, NamingStrategy};
    use crate::resolver::{ImportanceStrategy, StrategyChain};

    const BOOTSTRAPISH: &str = r#"
        .p-3 { padding: 1rem; }
        .pt-2 { padding-top: .5rem; }
        .border { border: 1px solid #dee2e6; }
        .rounded { border-radius: .25rem; }
        .link { text-decoration: none; }
        .link:hover { color: blue; }
        .btn:focus { outline: 2px solid blue; }
    "#;

    fn combinator() -> Combinator {
        let mut combinator = Combinator::new(CombinatorConfig::default()).unwrap();
        combinator.load_css("bootstrapish.css", BOOTSTRAPISH).unwrap();
        combinator
    }

    fn combinator_with(conflict_resolution: ConflictResolutionConfig) -> Combinator {
        let mut combinator = Combinator::new(CombinatorConfig {
            conflict_resolution,
            ..Default::default()
        })
        .unwrap();
        combinator.load_css("bootstrapish.css", BOOTSTRAPISH).unwrap();
        combinator
    }

    fn with_pseudo(strategy: PseudoStrategy) -> Combinator {
        combinator_with(ConflictResolutionConfig {
            pseudo: StrategyChain::single(strategy),
            ..Default::default()
        })
    }

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_minimal_conflict_set() {
        let mut combinator = combinator();
        let overrides = OverrideSpec::new().set("padding-top", "3rem").set("border-color", "#ff0000");
        let result = combinator
            .detect(&classes(&["p-3", "pt-2", "border", "rounded"]), &overrides, None)
            .unwrap();

        assert_eq!(result.remove_classes, vec!["p-3", "pt-2", "border"]);
        assert_eq!(result.keep_classes, vec!["rounded"]);
        assert_eq!(result.add_classes.len(), 1);

        let padding = &result.conflicts_found[0];
        assert_eq!(padding.property, "padding-top");
        assert_eq!(padding.source_classes, vec!["p-3", "pt-2"]);
        assert_eq!(result.conflicts_found[1].source_classes, vec!["border"]);

        assert_eq!(result.fallback_inline.get("paddingTop"), Some("3rem"));
        assert_eq!(result.fallback_inline.get("borderColor"), Some("#ff0000"));
        assert!(!result.generated_css.contains("!important"));
        assert!(result.generated_css.contains("padding: 1rem;"));
        assert!(result.generated_css.contains("padding-top: 3rem;"));
        assert!(!result.generated_css.contains(".5rem"));
    }

    #[test]
    fn test_important_only_against_kept_state_rules() {
        let mut combinator = combinator();
        let overrides = OverrideSpec::new().set("color", "red").set("padding", "0");
        let result = combinator.detect(&classes(&["link", "p-3"]), &overrides, Some("nav")).unwrap();

        assert_eq!(result.keep_classes, vec!["link"]);
        assert_eq!(result.remove_classes, vec!["p-3"]);
        assert!(result.generated_css.contains("color: red !important;"));
        assert!(result.generated_css.contains("padding: 0;"));
        assert!(result.add_classes[0].starts_with("csscade-nav-"));
        assert!(result
            .conflicts_found
            .iter()
            .any(|c| c.strategy_used == "combinator:important" && c.source_classes == vec!["link"]));
    }

    #[test]
    fn test_scoped_overrides_only_conflict_in_scope() {
        let mut combinator = combinator();
        let overrides = OverrideSpec::new().pseudo(":focus", &[("outline", "none")]);
        let result = combinator.detect(&classes(&["btn", "border"]), &overrides, None).unwrap();
        assert_eq!(result.remove_classes, vec!["btn"]);
        assert_eq!(result.keep_classes, vec!["border"]);
        assert!(result.fallback_inline.is_empty());
        assert!(result.generated_css.contains(":focus {"));
        assert_eq!(result.conflicts_found[0].scope.as_deref(), Some(":focus"));
    }

    #[test]
    fn test_carry_over_can_be_disabled() {
        let mut combinator = Combinator::new(CombinatorConfig {
            carry_over: false,
            ..Default::default()
        })
        .unwrap();
        combinator.load_css("u.css", BOOTSTRAPISH).unwrap();
        let overrides = OverrideSpec::new().set("padding-top", "3rem");
        let result = combinator.detect(&classes(&["p-3"]), &overrides, None).unwrap();
        assert!(!result.generated_css.contains("padding: 1rem"));
        assert!(result.generated_css.contains("padding-top: 3rem;"));
    }

    #[test]
    fn test_unknown_classes_are_kept() {
        let mut combinator = combinator();
        let result = combinator
            .detect(&classes(&["mystery", "rounded"]), &OverrideSpec::new().set("color", "red"), None)
            .unwrap();
        assert_eq!(result.keep_classes, vec!["mystery", "rounded"]);
        assert!(result.remove_classes.is_empty());
        assert!(result.info[0].contains("mystery"));
    }

    #[test]
    fn test_requires_loaded_css() {
        let mut combinator = Combinator::new(CombinatorConfig::default()).unwrap();
        let err = combinator.detect(&classes(&["p-3"]), &OverrideSpec::new(), None).unwrap_err();
        assert!(matches!(err, CascadeError::NoCssLoaded));

        let mut loaded = self::combinator();
        assert_eq!(loaded.loaded_sources(), &["bootstrapish.css".to_string()]);
        loaded.clear_cache();
        assert!(!loaded.has_class("p-3"));
        assert!(loaded.detect(&classes(&["p-3"]), &OverrideSpec::new(), None).is_err());
    }

    #[test]
    fn test_process_element_and_batch() {
        let mut combinator = Combinator::new(CombinatorConfig {
            naming: crate::config::NamingConfig {
                strategy: NamingStrategy::Sequential,
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();
        combinator.load_css("u.css", BOOTSTRAPISH).unwrap();

        let overrides = OverrideSpec::new().set("padding-top", "3rem");
        let single = combinator
            .process_element(r#"<div class="p-3 rounded" id="hero">Hi</div>"#, &overrides, Some("hero"))
            .unwrap();
        assert_eq!(single.remove_classes, vec!["p-3"]);
        assert_eq!(single.add_classes, vec!["csscade-1"]);

        let requests = vec![
            ElementRequest {
                element_classes: classes(&["pt-2"]),
                overrides: overrides.clone(),
                element_id: None,
            },
            ElementRequest {
                element_classes: classes(&["rounded"]),
                overrides: OverrideSpec::new().set("border-radius", "0"),
                element_id: None,
            },
        ];
        let results = combinator.process_batch(&requests).unwrap();
        assert_eq!(results[0].add_classes, vec!["csscade-2"]);
        assert_eq!(results[1].add_classes, vec!["csscade-3"]);
        assert_eq!(results[1].remove_classes, vec!["rounded"]);
    }

    #[test]
    fn test_strip_wins_over_contested_marking() {
        let mut combinator = combinator_with(ConflictResolutionConfig {
            importance: StrategyChain::single(ImportanceStrategy::Strip),
            ..Default::default()
        });
        let overrides = OverrideSpec::new().set("color", "red !important").set("padding", "0");
        let result = combinator.detect(&classes(&["link", "p-3"]), &overrides, None).unwrap();

        assert_eq!(result.keep_classes, vec!["link"]);
        assert!(result.generated_css.contains("color: red;"));
        assert!(!result.generated_css.contains("!important"));
        assert!(!result.conflicts_found.iter().any(|c| c.strategy_used == "combinator:important"));
    }

    #[test]
    fn test_pseudo_ignore_and_inline() {
        let overrides = OverrideSpec::new().pseudo(":hover", &[("color", "red")]);

        let ignore = with_pseudo(PseudoStrategy::Ignore)
            .detect(&classes(&["link"]), &overrides, None)
            .unwrap();
        assert_eq!(ignore.keep_classes, vec!["link"]);
        assert!(ignore.remove_classes.is_empty());
        assert!(ignore.add_classes.is_empty());
        assert!(ignore.generated_css.is_empty());
        assert_eq!(ignore.warnings.len(), 1);
        assert_eq!(ignore.conflicts_found[0].strategy_used, "pseudo:ignore");
        assert_eq!(ignore.conflicts_found[0].source_classes, vec!["link"]);

        let inline = with_pseudo(PseudoStrategy::Inline)
            .detect(&classes(&["link"]), &overrides, None)
            .unwrap();
        assert_eq!(inline.keep_classes, vec!["link"]);
        assert_eq!(inline.inline_excluded, vec![":hover"]);
        assert!(inline.warnings.is_empty());
    }

    #[test]
    fn test_pseudo_force_merge_and_extract() {
        let overrides = OverrideSpec::new().pseudo(":hover", &[("color", "red")]);

        let forced = with_pseudo(PseudoStrategy::ForceMerge)
            .detect(&classes(&["link"]), &overrides, None)
            .unwrap();
        assert_eq!(forced.keep_classes, vec!["link"]);
        assert!(!forced.generated_css.contains(":hover"));
        assert!(forced.generated_css.contains("color: red"));
        assert!(forced.warnings[0].contains("state specificity is lost"));

        let extract = with_pseudo(PseudoStrategy::Extract)
            .detect(&classes(&["link"]), &overrides, None)
            .unwrap();
        assert_eq!(extract.remove_classes, vec!["link"]);
        assert!(extract.generated_css.contains(":hover {\n    color: blue;\n}"));
        assert!(extract.generated_css.ends_with(":hover {\n    color: red;\n}"));
    }

    #[test]
    fn test_media_scoped_conflicts() {
        let mut combinator = combinator();
        combinator
            .load_css("responsive.css", "@media (min-width: 768px) { .p-md-5 { padding: 3rem; } }")
            .unwrap();
        let overrides = OverrideSpec::new().media("(min-width: 768px)", &[("padding-top", "2rem")]);
        let result = combinator
            .detect(&classes(&["p-3", "p-md-5"]), &overrides, None)
            .unwrap();

        assert_eq!(result.remove_classes, vec!["p-md-5"]);
        assert_eq!(result.keep_classes, vec!["p-3"]);
        assert_eq!(result.conflicts_found[0].scope.as_deref(), Some("@media (min-width: 768px)"));
        assert!(result.fallback_inline.is_empty());

        let name = &result.add_classes[0];
        assert_eq!(
            result.generated_css,
            format!(
                "@media (min-width: 768px) {{\n    .{} {{\n        padding: 3rem;\n        padding-top: 2rem;\n    }}\n}}",
                name
            )
        );
    }
}
