//! asmdoc — render API reference documentation from assembly facts.
//!
//! `asmdoc -o docs/api -f mintlify facts/*.json`
//!
//! Each input is one assembly's facts file (symbols, members and their XML
//! documentation). All inputs merge into one documentation set.

use anyhow::{bail, Context, Result};
use asmdoc::config::{self, Config};
use asmdoc::facts::AssemblyFacts;
use asmdoc::layout::{FlatScope, LayoutMode};
use asmdoc::render::Format;
use clap::{ArgAction, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "asmdoc",
    version,
    about = "Generate API reference documentation from assembly metadata and XML doc comments"
)]
struct Cli {
    /// Facts files (glob patterns and directories supported)
    #[arg(required = true)]
    facts: Vec<String>,

    /// Output directory [default: docs]
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format [default: markdown]
    #[arg(short = 'f', long, value_enum)]
    format: Option<Format>,

    /// Path layout [default: hierarchical]
    #[arg(long, value_enum)]
    mode: Option<LayoutMode>,

    /// Unit granularity in flat mode [default: assembly]
    #[arg(long, value_enum)]
    flat_scope: Option<FlatScope>,

    /// Link a namespace prefix to external docs, e.g. 'Newtonsoft=https://…/{name}'.
    /// Can be specified multiple times.
    #[arg(long, value_name = "PREFIX=TEMPLATE")]
    external: Vec<String>,

    /// TOML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Concurrent writers [default: number of CPUs]
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Skip namespace overview pages
    #[arg(long)]
    no_namespace_pages: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let file_config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let settings = file_config.merge(overrides(&cli)?).settings();

    let inputs = expand_globs(&cli.facts)?;
    if inputs.is_empty() {
        bail!("no facts files matched");
    }
    let mut facts = Vec::with_capacity(inputs.len());
    for path in &inputs {
        let text = fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        let assembly =
            AssemblyFacts::from_json(&text).with_context(|| format!("invalid facts file {}", path.display()))?;
        facts.push(assembly);
    }

    let generated = asmdoc::generate(&facts, &settings, None)?;
    for warning in &generated.warnings {
        eprintln!("warning: {}", warning);
    }
    for failure in &generated.report.failures {
        eprintln!("error: {}", failure);
    }
    if !generated.report.failures.is_empty() {
        bail!(
            "{} of {} units failed to write",
            generated.report.failures.len(),
            generated.units
        );
    }
    println!(
        "wrote {} files to {}",
        generated.report.written.len(),
        settings.output.display()
    );
    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Command-line flags as a config layer.
fn overrides(cli: &Cli) -> Result<Config> {
    let mut config = Config {
        format: cli.format,
        mode: cli.mode,
        flat_scope: cli.flat_scope,
        output: cli.output.clone(),
        concurrency: cli.jobs,
        namespace_pages: cli.no_namespace_pages.then_some(false),
        ..Default::default()
    };
    for arg in &cli.external {
        let (prefix, template) = config::parse_external(arg)?;
        config.external.insert(prefix, template);
    }
    Ok(config)
}

/// Expand glob patterns into a list of real file paths.
/// Bare directories contribute their `*.json` files (non-recursive).
fn expand_globs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }
        if path.is_dir() {
            let entries = fs::read_dir(path).with_context(|| format!("failed to read directory: {}", path.display()))?;
            let mut found: Vec<PathBuf> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
                .collect();
            found.sort();
            files.extend(found);
            continue;
        }
        let matches: Vec<_> = glob::glob(pattern)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
            .filter_map(|r| r.ok())
            .filter(|p| p.is_file())
            .collect();
        if matches.is_empty() {
            tracing::warn!(pattern = %pattern, "no files matched");
        }
        files.extend(matches);
    }
    // Input order is part of the merge semantics (last wins); keep the
    // command-line order and only drop exact repeats.
    let mut seen = std::collections::HashSet::new();
    files.retain(|p| seen.insert(p.clone()));
    Ok(files)
}
