// FILE: src/cli/handlers.rs
use crate::{
    cli::{read_overrides, OutputFormat},
    core::properties,
    parser, CascadeError, Combinator, CssValidator, MergeEngine, MergeMode,
    MergeResult, OverrideSpec, Result,
};
use crate::resolver::Diagnostics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::time::Instant;

fn read_input(input_path: &str) -> Result<String> {
    if input_path == "-" {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    fs::read_to_string(input_path).map_err(|e| CascadeError::FileNotFound {
        path: format!("{}: {}", input_path, e),
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| CascadeError::InvalidFormat {
        message: format!("JSON serialization error: {}", e),
    })
}

fn print_merge_result(result: &MergeResult, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", result.to_json()?),
        OutputFormat::Css => {
            println!("{}", result.css_text());
            for warning in &result.warnings {
                eprintln!("warning: {}", warning);
            }
        }
        OutputFormat::Summary => result.print_summary(),
    }
    Ok(())
}

// --- MERGE ---
pub fn handle_merge_command(cli: &super::CssCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches
        .get_one::<String>("input")
        .ok_or_else(|| CascadeError::malformed("missing input"))?;
    let source = read_input(input_path)?;
    let overrides = read_overrides(matches)?;
    let config = cli.build_merge_config(matches);
    let format = matches.get_one::<OutputFormat>("format").unwrap_or(&OutputFormat::Json);

    let start = Instant::now();
    let mut engine = MergeEngine::new(config)?;
    let result = engine.merge(source, &overrides)?;
    log::info!("Merged {} in {}ms", input_path, start.elapsed().as_millis());

    print_merge_result(&result, format)
}

// --- COMBINE ---
pub fn handle_combine_command(cli: &super::CssCli, matches: &clap::ArgMatches) -> Result<()> {
    let mut combinator = Combinator::new(cli.combinator_config())?;

    for dir in cli.configured_css_dirs() {
        combinator.load_dir(dir)?;
    }
    if let Some(dirs) = matches.get_many::<String>("css-dir") {
        for dir in dirs {
            let count = combinator.load_dir(dir)?;
            log::info!("Loaded {} class rule(s) from {}", count, dir);
        }
    }
    if let Some(files) = matches.get_many::<String>("css") {
        for file in files {
            combinator.load_file(file)?;
        }
    }

    let overrides = read_overrides(matches)?;
    let element_id = matches.get_one::<String>("id").map(|s| s.as_str());
    let result = if let Some(html) = matches.get_one::<String>("html") {
        combinator.process_element(html, &overrides, element_id)?
    } else {
        let classes: Vec<String> = matches
            .get_one::<String>("classes")
            .map(|s| s.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        combinator.detect(&classes, &overrides, element_id)?
    };

    match matches.get_one::<OutputFormat>("format").unwrap_or(&OutputFormat::Json) {
        OutputFormat::Json => println!("{}", to_json(&result)?),
        OutputFormat::Css => println!("{}", result.generated_css),
        OutputFormat::Summary => {
            println!("Combinator Result:");
            println!("  Remove: {}", result.remove_classes.join(" "));
            println!("  Keep: {}", result.keep_classes.join(" "));
            println!("  Add: {}", result.add_classes.join(" "));
            println!("  Conflicts: {}", result.conflicts_found.len());
            for warning in &result.warnings {
                println!("  warning: {}", warning);
            }
        }
    }
    Ok(())
}

// --- BATCH ---
#[derive(Debug, Deserialize)]
struct BatchEntry {
    source: String,
    #[serde(default)]
    overrides: serde_json::Value,
    mode: Option<MergeMode>,
}

#[derive(Debug, Serialize)]
struct BatchOutcome {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<MergeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn handle_batch_command(cli: &super::CssCli, matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches
        .get_one::<String>("input")
        .ok_or_else(|| CascadeError::malformed("missing input"))?;
    let text = read_input(input_path)?;
    let entries: Vec<BatchEntry> = serde_json::from_str(&text).map_err(|e| CascadeError::InvalidFormat {
        message: format!("Invalid batch file {}: {}", input_path, e),
    })?;

    let mut engine = MergeEngine::new(cli.build_merge_config(matches))?;
    let mut batch = engine.batch();
    let mut outcomes: Vec<BatchOutcome> = Vec::new();
    let mut queued: Vec<usize> = Vec::new();

    for (index, entry) in entries.into_iter().enumerate() {
        let overrides = if entry.overrides.is_null() {
            Ok(OverrideSpec::new())
        } else {
            OverrideSpec::from_json(&entry.overrides)
        };
        match overrides {
            Ok(overrides) => {
                match entry.mode {
                    Some(mode) => batch.add_with_mode(entry.source, overrides, mode),
                    None => batch.add(entry.source, overrides),
                };
                queued.push(index);
            }
            Err(e) => outcomes.push(BatchOutcome {
                index,
                result: None,
                error: Some(e.to_string()),
            }),
        }
    }

    for (index, result) in queued.into_iter().zip(batch.execute()) {
        outcomes.push(match result {
            Ok(result) => BatchOutcome {
                index,
                result: Some(result),
                error: None,
            },
            Err(e) => BatchOutcome {
                index,
                result: None,
                error: Some(e.to_string()),
            },
        });
    }
    outcomes.sort_by_key(|o| o.index);

    let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
    match matches.get_one::<OutputFormat>("format").unwrap_or(&OutputFormat::Json) {
        OutputFormat::Json => println!("{}", to_json(&outcomes)?),
        OutputFormat::Css => {
            for outcome in &outcomes {
                match (&outcome.result, &outcome.error) {
                    (Some(result), _) => println!("{}", result.css_text()),
                    (None, Some(error)) => eprintln!("entry {}: {}", outcome.index, error),
                    (None, None) => {}
                }
            }
        }
        OutputFormat::Summary => {
            println!("Batch Summary:");
            println!("   Entries: {}", outcomes.len());
            println!("   Failed: {}", failed);
        }
    }

    if failed > 0 {
        Err(CascadeError::InvalidFormat {
            message: format!("{} batch entr{} failed", failed, if failed == 1 { "y" } else { "ies" }),
        })
    } else {
        Ok(())
    }
}

// --- CHECK ---
pub fn handle_check_command(cli: &super::CssCli, matches: &clap::ArgMatches) -> Result<()> {
    let mut config = cli.build_merge_config(matches);
    config.validation.enabled = true;
    config.validation.check_values = true;
    let strict = matches.get_flag("strict");
    let validator = CssValidator::new(config.validation.clone());

    let mut failures = 0;
    if matches.get_one::<String>("override").is_some() || matches.get_one::<String>("override-file").is_some() {
        let overrides = read_overrides(matches)?;
        failures += report_issues("overrides", &check_overrides(&validator, &overrides), strict);
    }

    if let Some(input_path) = matches.get_one::<String>("input") {
        let recursive = matches.get_flag("recursive");
        if recursive && Path::new(input_path).is_dir() {
            failures += check_directory_recursive(&validator, input_path, strict)?;
        } else {
            failures += check_single_file(&validator, input_path, strict);
        }
    }

    if failures > 0 {
        Err(CascadeError::validation(format!("{} check(s) failed", failures)))
    } else {
        Ok(())
    }
}

fn check_overrides(validator: &CssValidator, overrides: &OverrideSpec) -> Vec<String> {
    let mut issues = Vec::new();
    for (scope, decl) in overrides.flatten() {
        for issue in validator.declaration_issues(decl) {
            if scope.is_base() {
                issues.push(issue);
            } else {
                issues.push(format!("{} ({})", issue, scope));
            }
        }
    }
    issues
}

fn check_stylesheet(validator: &CssValidator, css: &str) -> Result<Vec<String>> {
    let rules = parser::parse_stylesheet(css)?;
    let mut issues = Vec::new();
    let mut diag = Diagnostics::default();
    for rule in &rules {
        for decl in &rule.declarations {
            for issue in validator.declaration_issues(decl) {
                issues.push(format!("{}: {}", rule.full_selector(), issue));
            }
        }
        validator.report_duplicates(&rule.declarations, &format!("'{}'", rule.full_selector()), &mut diag);
    }
    issues.extend(diag.info);
    Ok(issues)
}

/// Prints the issues; returns 1 when the target counts as failed
fn report_issues(target: &str, issues: &[String], strict: bool) -> usize {
    if issues.is_empty() {
        println!("✅ {} - No issues found", target);
        return 0;
    }
    println!("{} {} - {} issue(s)", if strict { "❌" } else { "⚠️ " }, target, issues.len());
    for issue in issues {
        println!("   {}", issue);
    }
    usize::from(strict)
}

fn check_single_file(validator: &CssValidator, input_path: &str, strict: bool) -> usize {
    println!("🔍 Checking {}", input_path);
    let css = match read_input(input_path) {
        Ok(css) => css,
        Err(e) => {
            println!("❌ {} - {}", input_path, e);
            return 1;
        }
    };
    match check_stylesheet(validator, &css) {
        Ok(issues) => report_issues(input_path, &issues, strict),
        Err(e) => {
            println!("❌ {} - {}", input_path, e);
            1
        }
    }
}

fn check_directory_recursive(validator: &CssValidator, dir_path: &str, strict: bool) -> Result<usize> {
    let mut total_files = 0;
    let mut error_files = 0;

    for entry in walkdir::WalkDir::new(dir_path).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            CascadeError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Directory traversal error: {}", e),
            ))
        })?;
        if entry.file_type().is_file() && entry.path().extension().map_or(false, |ext| ext == "css") {
            total_files += 1;
            error_files += check_single_file(validator, &entry.path().display().to_string(), strict);
        }
    }

    println!("\n📊 Check Summary:");
    println!("   Total files: {}", total_files);
    println!("   Files with errors: {}", error_files);
    Ok(error_files)
}

// --- ANALYZE ---
#[derive(Debug, Default, Serialize)]
pub struct StylesheetAnalysis {
    pub rules: usize,
    pub declarations: usize,
    pub important_declarations: usize,
    pub pseudo_rules: usize,
    pub media_rules: usize,
    pub classes: Vec<String>,
    /// Shorthand name -> number of uses
    pub shorthands: BTreeMap<String, usize>,
    pub unknown_properties: Vec<String>,
}

pub fn analyze_stylesheet(css: &str) -> Result<StylesheetAnalysis> {
    let rules = parser::parse_stylesheet(css)?;
    let mut analysis = StylesheetAnalysis {
        rules: rules.len(),
        ..Default::default()
    };

    for rule in &rules {
        if rule.pseudo.is_some() {
            analysis.pseudo_rules += 1;
        }
        if rule.media.is_some() {
            analysis.media_rules += 1;
        }
        if let Some((class, _)) = crate::selector::simple_class(&rule.selector) {
            if !analysis.classes.contains(&class) {
                analysis.classes.push(class);
            }
        }
        for decl in &rule.declarations {
            analysis.declarations += 1;
            if decl.important {
                analysis.important_declarations += 1;
            }
            if properties::is_shorthand(&decl.property) {
                *analysis.shorthands.entry(decl.property.clone()).or_insert(0) += 1;
            }
            let unknown = !decl.is_custom()
                && !properties::is_vendor_prefixed(&decl.property)
                && !properties::is_known(&decl.property);
            if unknown && !analysis.unknown_properties.contains(&decl.property) {
                analysis.unknown_properties.push(decl.property.clone());
            }
        }
    }
    Ok(analysis)
}

pub fn handle_analyze_command(matches: &clap::ArgMatches) -> Result<()> {
    let input_path = matches
        .get_one::<String>("input")
        .ok_or_else(|| CascadeError::malformed("missing input"))?;
    let output_path = matches.get_one::<String>("output");
    let format = matches.get_one::<OutputFormat>("format").unwrap_or(&OutputFormat::Summary);

    println!("🔬 Analyzing {}", input_path);
    let analysis = analyze_stylesheet(&read_input(input_path)?)?;

    let text = match format {
        OutputFormat::Json => to_json(&analysis)?,
        _ => {
            let mut lines = vec![
                format!("Stylesheet Analysis: {}", input_path),
                format!("   Rules: {} ({} pseudo, {} media)", analysis.rules, analysis.pseudo_rules, analysis.media_rules),
                format!("   Declarations: {} ({} !important)", analysis.declarations, analysis.important_declarations),
                format!("   Classes: {}", analysis.classes.len()),
            ];
            for (name, count) in &analysis.shorthands {
                lines.push(format!("   Shorthand {}: {}", name, count));
            }
            if !analysis.unknown_properties.is_empty() {
                lines.push(format!("   Unknown properties: {}", analysis.unknown_properties.join(", ")));
            }
            lines.join("\n")
        }
    };

    if let Some(output_file) = output_path {
        fs::write(output_file, text)?;
        println!("✅ Analysis saved to {}", output_file);
    } else {
        println!("{}", text);
    }
    Ok(())
}
