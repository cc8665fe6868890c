//! Per-target declaration merge
//!
//! Applies one scope's overrides to one declaration list, routing every
//! overlap through the importance and shorthand axes of the resolver.

use crate::core::properties;
use crate::resolver::{ConflictResolver, Diagnostics, ImportanceDecision, ImportanceStrategy, ShorthandStrategy, Strategy};
use crate::shorthand;
use crate::types::{ConflictRecord, Declaration, Scope};

/// Who owns the declarations being merged into, for conflict records
#[derive(Debug, Clone)]
pub struct MergeOrigin {
    pub sources: Vec<String>,
    pub scope: Scope,
}

impl MergeOrigin {
    pub fn new(sources: Vec<String>, scope: Scope) -> Self {
        Self { sources, scope }
    }

    fn record(&self, property: &str, resolution: impl Into<String>, strategy: String) -> ConflictRecord {
        ConflictRecord {
            property: property.to_string(),
            source_classes: self.sources.clone(),
            resolution: resolution.into(),
            strategy_used: strategy,
            scope: if self.scope.is_base() {
                None
            } else {
                Some(self.scope.key())
            },
        }
    }

    fn describe(&self) -> String {
        let owner = if self.sources.is_empty() {
            "source".to_string()
        } else {
            self.sources.join(", ")
        };
        if self.scope.is_base() {
            owner
        } else {
            format!("{} [{}]", owner, self.scope.key())
        }
    }
}

/// Merges `overrides` into `source` in order and returns the resulting
/// declaration list. A `strip` importance outcome only flags the
/// diagnostics; the caller strips once every scope is merged.
pub fn merge_declarations(
    resolver: &ConflictResolver,
    source: &[Declaration],
    overrides: &[Declaration],
    origin: &MergeOrigin,
    diag: &mut Diagnostics,
) -> Vec<Declaration> {
    let mut working = source.to_vec();
    for decl in overrides {
        apply_override(resolver, source, &mut working, decl, origin, diag);
    }
    working
}

fn apply_override(
    resolver: &ConflictResolver,
    source: &[Declaration],
    working: &mut Vec<Declaration>,
    requested: &Declaration,
    origin: &MergeOrigin,
    diag: &mut Diagnostics,
) {
    let property = requested.property.as_str();
    let source_important = source
        .iter()
        .any(|d| d.important && properties::overlaps(&d.property, property));
    let has_overlap = working.iter().any(|d| properties::overlaps(&d.property, property));

    let outcome = resolver.resolve_importance(source_important, requested.important);
    let important = match outcome.decision {
        ImportanceDecision::KeepSource => {
            diag.warn(format!(
                "override '{}' dropped: {} declares it !important ({})",
                requested,
                origin.describe(),
                outcome.label()
            ));
            diag.record(origin.record(property, "kept important source", outcome.label()));
            return;
        }
        ImportanceDecision::Apply { important } => important,
    };

    if outcome.strategy == Some(ImportanceStrategy::Strip) {
        diag.strip_requested = true;
    }
    if outcome.strategy.is_none() && has_overlap {
        diag.note(format!(
            "no importance strategy in {} applied to '{}'; override used as written",
            resolver.config().importance.describe(),
            property
        ));
    }
    if important != requested.important {
        diag.warn(format!(
            "'{}' {} by {}",
            property,
            if important { "marked !important" } else { "lost !important" },
            outcome.label()
        ));
    }

    let decl = requested.clone().with_important(important);

    let exact: Vec<usize> = positions(working, |d| d.property == property);
    let related: Vec<usize> = positions(working, |d| {
        d.property != property && properties::overlaps(&d.property, property)
    });

    if exact.is_empty() && related.is_empty() {
        working.push(decl);
        return;
    }

    // Same-name shorthands still expand under `expand`; every other
    // strategy treats them as a plain value replacement.
    let expand_exact = properties::is_shorthand(property)
        && shorthand::can_expand(&decl)
        && exact.iter().all(|&i| shorthand::can_expand(&working[i]))
        && resolver.select_shorthand(true) == Some(ShorthandStrategy::Expand);

    if related.is_empty() && !expand_exact {
        let previous = working[exact[exact.len() - 1]].css_value();
        replace_exact(working, &exact, decl.clone());
        diag.note(format!(
            "{}: '{}' changed from '{}' to '{}'",
            origin.describe(),
            property,
            previous,
            decl.css_value()
        ));
        diag.record(origin.record(property, "override replaced source value", outcome.label()));
        return;
    }

    let mut involved: Vec<usize> = exact.iter().chain(related.iter()).copied().collect();
    involved.sort_unstable();
    let expandable = shorthand::can_expand(&decl) && involved.iter().all(|&i| shorthand::can_expand(&working[i]));

    match resolver.select_shorthand(expandable) {
        Some(ShorthandStrategy::Cascade) => {
            cascade(working, decl);
            diag.record(origin.record(property, "override appended after related declarations", ShorthandStrategy::Cascade.label()));
        }
        Some(strategy @ (ShorthandStrategy::Smart | ShorthandStrategy::Expand)) => {
            let touched: Vec<String> = involved.iter().map(|&i| working[i].property.clone()).collect();
            expand_into(working, &involved, &decl);
            let mut resolution = "shorthand expanded and override applied to longhands";
            if strategy == ShorthandStrategy::Smart {
                let mut related_names: Vec<&str> = vec![property];
                related_names.extend(touched.iter().map(|s| s.as_str()));
                for (group, failure) in shorthand::collapse_related(working, &related_names) {
                    diag.warn(format!(
                        "{}: could not collapse '{}' ({}); kept longhands",
                        origin.describe(),
                        group,
                        failure
                    ));
                }
                resolution = "shorthand expanded, overridden and collapsed where possible";
            }
            diag.record(origin.record(property, resolution, strategy.label()));
        }
        Some(ShorthandStrategy::Preserve) => {
            let conflicting: Vec<String> = related.iter().map(|&i| working[i].property.clone()).collect();
            diag.warn(format!(
                "override '{}' dropped: overlaps {} in {} (shorthand:preserve)",
                decl,
                conflicting.join(", "),
                origin.describe()
            ));
            diag.record(origin.record(property, "kept source, override dropped", ShorthandStrategy::Preserve.label()));
        }
        None => {
            diag.warn(format!(
                "no shorthand strategy in {} applies to '{}'; falling back to cascade",
                resolver.config().shorthand.describe(),
                property
            ));
            cascade(working, decl);
            diag.record(origin.record(property, "override appended after related declarations", "shorthand:fallback".to_string()));
        }
    }
}

fn positions(decls: &[Declaration], predicate: impl Fn(&Declaration) -> bool) -> Vec<usize> {
    decls
        .iter()
        .enumerate()
        .filter(|(_, d)| predicate(d))
        .map(|(i, _)| i)
        .collect()
}

/// Same-name replacement: the last occurrence takes the new value in place
/// and earlier duplicates go. Nothing after it overlaps, since any overlap
/// routes through the shorthand strategies instead.
fn replace_exact(working: &mut Vec<Declaration>, exact: &[usize], decl: Declaration) {
    let last = exact[exact.len() - 1];
    working[last] = decl;
    for &i in exact[..exact.len() - 1].iter().rev() {
        working.remove(i);
    }
}

/// Plain later-wins: drop same-name declarations and any declaration the
/// override fully covers (unless it outranks the override), then append.
fn cascade(working: &mut Vec<Declaration>, decl: Declaration) {
    working.retain(|d| {
        if d.property == decl.property {
            return false;
        }
        let dead = properties::covers(&decl.property, &d.property) && (decl.important || !d.important);
        !dead
    });
    working.push(decl);
}

/// Expands every involved shorthand to leaf longhands in place, then writes
/// the override's leaves over them.
fn expand_into(working: &mut Vec<Declaration>, involved: &[usize], decl: &Declaration) {
    let mut expanded_names: Vec<String> = Vec::new();
    let mut rebuilt: Vec<Declaration> = Vec::with_capacity(working.len() + 8);

    for (i, existing) in working.drain(..).enumerate() {
        if involved.contains(&i) && properties::is_shorthand(&existing.property) {
            match shorthand::expand_fully(&existing) {
                Some(leaves) => {
                    for leaf in leaves {
                        if !expanded_names.contains(&leaf.property) {
                            expanded_names.push(leaf.property.clone());
                        }
                        rebuilt.push(leaf);
                    }
                }
                None => rebuilt.push(existing),
            }
        } else {
            rebuilt.push(existing);
        }
    }
    *working = rebuilt;

    for name in &expanded_names {
        dedupe_effective(working, name);
    }

    let leaves = shorthand::expand_fully(decl).unwrap_or_else(|| vec![decl.clone()]);
    for leaf in leaves {
        let same = positions(working, |d| d.property == leaf.property);
        match same.last() {
            Some(&last) => {
                working[last] = leaf;
                for &i in same[..same.len() - 1].iter().rev() {
                    working.remove(i);
                }
            }
            None => working.push(leaf),
        }
    }
}

/// Keeps only the declaration of `name` that wins the cascade (the last
/// important one, else the last one) at the position of the first.
fn dedupe_effective(working: &mut Vec<Declaration>, name: &str) {
    let same = positions(working, |d| d.property == name);
    if same.len() < 2 {
        return;
    }
    let winner = same
        .iter()
        .rev()
        .find(|&&i| working[i].important)
        .or_else(|| same.last())
        .map(|&i| working[i].clone());

    if let Some(winner) = winner {
        working[same[0]] = winner;
        for &i in same[1..].iter().rev() {
            working.remove(i);
        }
    }
}

/// Clears every `!important` flag; returns how many were removed
pub fn strip_important(decls: &mut [Declaration]) -> usize {
    let mut stripped = 0;
    for decl in decls.iter_mut().filter(|d| d.important) {
        decl.important = false;
        stripped += 1;
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConflictResolutionConfig;
    use crate::parser::parse_declarations;
    use crate::resolver::StrategyChain;

    fn resolver(importance: ImportanceStrategy, shorthand: ShorthandStrategy) -> ConflictResolver {
        ConflictResolver::new(ConflictResolutionConfig {
            importance: StrategyChain::single(importance),
            shorthand: StrategyChain::single(shorthand),
            ..Default::default()
        })
    }

    fn origin() -> MergeOrigin {
        MergeOrigin::new(vec!["btn".to_string()], Scope::base())
    }

    fn run(resolver: &ConflictResolver, source: &str, overrides: &str) -> (String, Diagnostics) {
        let source = parse_declarations(source).unwrap();
        let overrides = parse_declarations(overrides).unwrap();
        let mut diag = Diagnostics::default();
        let mut merged = merge_declarations(resolver, &source, &overrides, &origin(), &mut diag);
        if diag.strip_requested {
            strip_important(&mut merged);
        }
        let text = merged.iter().map(|d| format!("{};", d)).collect::<Vec<_>>().join(" ");
        (text, diag)
    }

    #[test]
    fn test_importance_axis() {
        let source = "color: blue !important; margin: 0 !important";
        let cases = [
            (ImportanceStrategy::Match, "color: red !important; margin: 0 !important;"),
            (ImportanceStrategy::Respect, "color: blue !important; margin: 0 !important;"),
            (ImportanceStrategy::Override, "color: red; margin: 0 !important;"),
            (ImportanceStrategy::Force, "color: red !important; margin: 0 !important;"),
            (ImportanceStrategy::Strip, "color: red; margin: 0;"),
        ];
        for (strategy, expected) in cases {
            let (text, _) = run(&resolver(strategy, ShorthandStrategy::Cascade), source, "color: red");
            assert_eq!(text, expected, "strategy {}", strategy);
        }

        let (_, diag) = run(
            &resolver(ImportanceStrategy::Respect, ShorthandStrategy::Cascade),
            source,
            "color: red",
        );
        assert_eq!(diag.warnings.len(), 1);
        assert_eq!(diag.conflicts[0].strategy_used, "importance:respect");
    }

    #[test]
    fn test_smart_shorthand_collapses() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Smart);
        let (text, diag) = run(&r, "margin: 10px; padding: 20px", "margin-top: 30px; padding: 15px");
        assert_eq!(text, "margin: 30px 10px 10px; padding: 15px;");
        assert!(diag.warnings.is_empty());
        assert_eq!(diag.conflicts.len(), 2);
        assert_eq!(diag.conflicts[0].strategy_used, "shorthand:smart");
    }

    #[test]
    fn test_expand_never_collapses() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Expand);
        let (text, _) = run(&r, "margin: 10px", "margin-top: 30px");
        assert_eq!(
            text,
            "margin-top: 30px; margin-right: 10px; margin-bottom: 10px; margin-left: 10px;"
        );
    }

    #[test]
    fn test_expand_same_name_shorthand() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Expand);
        let (text, diag) = run(&r, "margin: 10px; color: red", "margin: 0 4px");
        assert_eq!(
            text,
            "margin-top: 0; margin-right: 4px; margin-bottom: 0; margin-left: 4px; color: red;"
        );
        assert_eq!(diag.conflicts[0].strategy_used, "shorthand:expand");

        let smart = resolver(ImportanceStrategy::Match, ShorthandStrategy::Smart);
        let (text, _) = run(&smart, "margin: 10px; color: red", "margin: 0 4px");
        assert_eq!(text, "margin: 0 4px; color: red;");
    }

    #[test]
    fn test_exact_replacement_drops_duplicates() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Cascade);
        let (text, _) = run(&r, "color: blue; width: 1px; color: navy", "color: red");
        assert_eq!(text, "width: 1px; color: red;");
    }

    #[test]
    fn test_cascade_appends_longhand() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Cascade);
        let (text, _) = run(&r, "margin: 10px; color: red", "margin-top: 30px");
        assert_eq!(text, "margin: 10px; color: red; margin-top: 30px;");

        let (pruned, _) = run(&r, "padding-top: 5px; padding-left: 2px", "padding: 0");
        assert_eq!(pruned, "padding: 0;");
    }

    #[test]
    fn test_preserve_drops_with_warning() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Preserve);
        let (text, diag) = run(&r, "border: 1px solid black", "border-color: red");
        assert_eq!(text, "border: 1px solid black;");
        assert_eq!(diag.warnings.len(), 1);
        assert!(diag.warnings[0].contains("shorthand:preserve"));
    }

    #[test]
    fn test_smart_falls_back_when_not_expandable() {
        let r = ConflictResolver::new(ConflictResolutionConfig {
            shorthand: StrategyChain::new(vec![ShorthandStrategy::Smart, ShorthandStrategy::Cascade]),
            ..Default::default()
        });
        let (text, diag) = run(&r, "margin: var(--gap)", "margin-top: 1px");
        assert_eq!(text, "margin: var(--gap); margin-top: 1px;");
        assert_eq!(diag.conflicts[0].strategy_used, "shorthand:cascade");
    }

    #[test]
    fn test_mixed_importance_keeps_longhands() {
        let r = resolver(ImportanceStrategy::Override, ShorthandStrategy::Smart);
        let (text, diag) = run(&r, "margin: 10px", "margin-top: 30px !important");
        assert_eq!(
            text,
            "margin-top: 30px !important; margin-right: 10px; margin-bottom: 10px; margin-left: 10px;"
        );
        assert_eq!(diag.warnings.len(), 1);
        assert!(diag.warnings[0].contains("mixed !important"));
    }

    #[test]
    fn test_smart_border_color() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Smart);
        let (text, _) = run(&r, "border: 1px solid black", "border-color: red");
        assert_eq!(text, "border: 1px solid red;");
    }

    #[test]
    fn test_exact_replacement_in_place() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Cascade);
        let (text, diag) = run(&r, "color: blue; padding: 4px", "color: red; width: 10px");
        assert_eq!(text, "color: red; padding: 4px; width: 10px;");
        assert!(diag.warnings.is_empty());
        assert_eq!(diag.info.len(), 1);
        assert_eq!(diag.conflicts.len(), 1);
    }

    #[test]
    fn test_empty_overrides_are_noop() {
        let r = resolver(ImportanceStrategy::Match, ShorthandStrategy::Smart);
        let (text, diag) = run(&r, "margin: 1px 2px; color: red !important", "");
        assert_eq!(text, "margin: 1px 2px; color: red !important;");
        assert!(diag.conflicts.is_empty());
    }
}
