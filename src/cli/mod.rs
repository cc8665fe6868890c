// FILE: src/cli/mod.rs

mod config;
mod handlers;

use crate::config::{CombinatorConfig, MergeConfig, MergeMode};
use crate::error::Result;
use crate::types::OverrideSpec;
use clap::{Arg, ArgAction, Command, ValueEnum};
use std::fs;
use std::time::Instant;

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Css,
    Summary,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ModeArg {
    Permanent,
    Component,
    Replace,
}

impl From<&ModeArg> for MergeMode {
    fn from(mode: &ModeArg) -> Self {
        match mode {
            ModeArg::Permanent => MergeMode::Permanent,
            ModeArg::Component => MergeMode::Component,
            ModeArg::Replace => MergeMode::Replace,
        }
    }
}

pub struct CssCli {
    config: config::ConfigFile,
    start_time: Instant,
}

impl Default for CssCli {
    fn default() -> Self {
        Self::new()
    }
}

impl CssCli {
    pub fn new() -> Self {
        Self {
            config: config::ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();
        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.config = config::load(config_path)?;
        }

        self.setup_logging(matches.get_count("verbose"))?;

        let outcome = match matches.subcommand() {
            Some(("merge", sub_matches)) => handlers::handle_merge_command(self, sub_matches),
            Some(("combine", sub_matches)) => handlers::handle_combine_command(self, sub_matches),
            Some(("batch", sub_matches)) => handlers::handle_batch_command(self, sub_matches),
            Some(("check", sub_matches)) => handlers::handle_check_command(self, sub_matches),
            Some(("analyze", sub_matches)) => handlers::handle_analyze_command(sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        };
        log::debug!("Finished in {}ms", self.start_time.elapsed().as_millis());
        outcome
    }

    fn build_cli(&self) -> Command {
        let format_arg = || {
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(clap::value_parser!(OutputFormat))
                .default_value("json")
                .help("Output format")
        };
        let override_args = || {
            [
                Arg::new("override")
                    .short('o')
                    .long("override")
                    .value_name("JSON")
                    .help("Override mapping, e.g. '{\"color\": \"red\", \":hover\": {...}}'"),
                Arg::new("override-file")
                    .long("override-file")
                    .value_name("FILE")
                    .help("Read the override mapping from a JSON file")
                    .conflicts_with("override"),
            ]
        };

        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .author("Csscade Development Team")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("merge")
                    .about("Merge overrides into a CSS rule or declaration list")
                    .arg(Arg::new("input").help("CSS file, or '-' for stdin").required(true).index(1))
                    .args(override_args())
                    .arg(Arg::new("mode").short('m').long("mode").value_parser(clap::value_parser!(ModeArg)).help("Merge mode (defaults to the configured mode)"))
                    .arg(format_arg())
                    .arg(Arg::new("strict").long("strict").help("Fail on unknown properties and invalid values").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("combine")
                    .about("Detect which classes an override set makes obsolete")
                    .arg(Arg::new("classes").long("classes").value_name("CLASSES").help("Space-separated class list").conflicts_with("html"))
                    .arg(Arg::new("html").long("html").value_name("HTML").help("Markup fragment to read classes from"))
                    .args(override_args())
                    .arg(Arg::new("css").long("css").value_name("FILE").help("Stylesheet to load").action(ArgAction::Append))
                    .arg(Arg::new("css-dir").long("css-dir").value_name("DIR").help("Load every .css file below DIR").action(ArgAction::Append))
                    .arg(Arg::new("id").long("id").value_name("ID").help("Element id used as naming seed"))
                    .arg(format_arg()),
            )
            .subcommand(
                Command::new("batch")
                    .about("Run a JSON list of merges in order")
                    .arg(Arg::new("input").help("JSON file: [{\"source\": ..., \"overrides\": {...}, \"mode\": ...}]").required(true).index(1))
                    .arg(format_arg()),
            )
            .subcommand(
                Command::new("check")
                    .about("Validate stylesheets and override mappings")
                    .arg(Arg::new("input").help("CSS file or directory").index(1))
                    .args(override_args())
                    .arg(Arg::new("recursive").short('r').long("recursive").help("Check all CSS files in directory recursively").action(ArgAction::SetTrue))
                    .arg(Arg::new("strict").long("strict").help("Treat every issue as an error").action(ArgAction::SetTrue)),
            )
            .subcommand(
                Command::new("analyze")
                    .about("Show rule, class and shorthand statistics for a stylesheet")
                    .arg(Arg::new("input").help("CSS file").required(true).index(1))
                    .arg(Arg::new("output").long("output").value_name("FILE").help("Write the analysis to a file"))
                    .arg(format_arg().default_value("summary")),
            )
    }

    fn setup_logging(&self, verbose_count: u8) -> Result<()> {
        let log_level = match verbose_count {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        env_logger::Builder::from_default_env()
            .filter_level(log_level)
            .format_timestamp_secs()
            .init();
        Ok(())
    }

    pub fn build_merge_config(&self, matches: &clap::ArgMatches) -> MergeConfig {
        let mut config = self.config.merge.clone().unwrap_or_default();
        if let Some(mode) = matches.try_get_one::<ModeArg>("mode").ok().flatten() {
            config.mode = mode.into();
        }
        let strict = matches.try_get_one::<bool>("strict").ok().flatten().copied().unwrap_or(false)
            || self.config.strict.unwrap_or(false);
        if strict {
            config.validation.enabled = true;
            config.validation.strict = true;
            config.validation.check_values = true;
        }
        config
    }

    pub fn combinator_config(&self) -> CombinatorConfig {
        self.config.combinator.clone().unwrap_or_default()
    }

    pub fn configured_css_dirs(&self) -> &[String] {
        self.config.css_dirs.as_deref().unwrap_or(&[])
    }
}

/// Reads `--override` or `--override-file`; an empty mapping when neither
/// is given.
pub fn read_overrides(matches: &clap::ArgMatches) -> Result<OverrideSpec> {
    if let Some(inline) = matches.get_one::<String>("override") {
        return OverrideSpec::from_json_str(inline);
    }
    if let Some(path) = matches.get_one::<String>("override-file") {
        let text = fs::read_to_string(path).map_err(|e| crate::CascadeError::FileNotFound {
            path: format!("{}: {}", path, e),
        })?;
        return OverrideSpec::from_json_str(&text);
    }
    Ok(OverrideSpec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        CssCli::new().build_cli().debug_assert();
    }

    #[test]
    fn test_merge_config_from_args() {
        let cli = CssCli::new();
        let matches = cli
            .build_cli()
            .try_get_matches_from(["csscade", "merge", "in.css", "--mode", "replace", "--strict", "-o", r#"{"color": "red"}"#])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        let config = cli.build_merge_config(sub);
        assert_eq!(config.mode, MergeMode::Replace);
        assert!(config.validation.enabled && config.validation.strict);

        let overrides = read_overrides(sub).unwrap();
        assert_eq!(overrides.base.len(), 1);
        assert_eq!(overrides.base[0].value, "red");
    }
}
