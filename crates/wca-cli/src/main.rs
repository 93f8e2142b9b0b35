//! Binary entry point for the `wca` CLI.
//!
//! ```bash
//! # Print the analysis.json for a package
//! wca analyze index.html
//!
//! # Debug a scanner without going through the exporter
//! wca query features --kind element --entry index.html
//!
//! # List every warning collected during analysis
//! wca query warnings --entry index.html
//! ```

mod config;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use wca_core::context::Analyzer;
use wca_core::loader::FsLoader;
use wca_core::text::SourceRange;
use wca_core::url::{PackageRelative, Resolved};
use wca_core::warning::{Severity, Warning};
use wca_core::workspace::AnalyzerOptions;

use config::WcaConfig;
use error::CliError;

#[derive(Parser)]
#[command(name = "wca", version, about = "Static analyzer for web-components codebases")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Arguments shared by every subcommand.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Package root directory (default: current directory).
    #[arg(long, global = true)]
    package_root: Option<PathBuf>,

    /// Sibling directory out-of-package imports redirect into. Overrides
    /// `wca.toml`.
    #[arg(long, global = true)]
    component_dir: Option<String>,

    /// Scan only the given entry documents; don't follow imports.
    #[arg(long, global = true)]
    no_follow_imports: bool,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Emit structured JSON logs instead of human-readable text.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Command {
    /// Analyze entry documents and print the exported analysis.json.
    Analyze {
        /// Package-relative entry documents (e.g. `index.html`).
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Query a completed analysis without going through the exporter.
    Query {
        #[command(subcommand)]
        action: QueryAction,
    },
}

#[derive(Subcommand)]
enum QueryAction {
    /// List features of one kind across every document (debugging scanners).
    Features {
        /// Feature kind to filter by (e.g. `element`, `namespace`, `function`).
        #[arg(long)]
        kind: String,
        /// Narrow further to one identifier.
        #[arg(long)]
        id: Option<String>,
        /// Package-relative entry documents to analyze first.
        #[arg(required = true)]
        entries: Vec<String>,
    },
    /// Print every warning collected during analysis, sorted by location.
    Warnings {
        /// Package-relative entry documents to analyze first.
        #[arg(required = true)]
        entries: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.log_level, cli.global.json_logs);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn init_tracing(level: LogLevel, json_logs: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Analyze { entries } => execute_analyze(&cli.global, entries),
        Command::Query { action } => execute_query(&cli.global, action),
    }
}

/// Builds an `Analyzer` rooted at `global.package_root`, with `wca.toml`
/// providing defaults that CLI flags override.
fn build_analyzer(global: &GlobalArgs) -> Result<Analyzer, CliError> {
    let package_root = global
        .package_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let package_root = package_root.canonicalize().map_err(|e| {
        CliError::InvalidArguments(format!(
            "package root {} does not exist: {e}",
            package_root.display()
        ))
    })?;

    let config = WcaConfig::load(&package_root)?;

    let root_url = url::Url::from_directory_path(&package_root).map_err(|_| {
        CliError::InvalidArguments(format!(
            "package root {} is not a valid directory path",
            package_root.display()
        ))
    })?;

    let mut options = AnalyzerOptions::new(Resolved::new_unchecked(root_url.as_str()));
    if let Some(component_dir) = global.component_dir.clone().or(config.component_dir) {
        options = options.with_component_dir(component_dir);
    }
    if let Some(package_hostname) = config.package_hostname {
        options = options.with_package_hostname(package_hostname);
    }
    let follow_imports = if global.no_follow_imports {
        false
    } else {
        config.follow_imports.unwrap_or(true)
    };
    options = options.with_follow_imports(follow_imports);

    let loader = FsLoader::new(package_root);
    Ok(Analyzer::new(options, vec![Box::new(loader)])?)
}

fn run_analysis(
    global: &GlobalArgs,
    entries: Vec<String>,
) -> Result<wca_core::context::Analysis, CliError> {
    let analyzer = build_analyzer(global)?;
    let urls = entries.into_iter().map(PackageRelative::new).collect();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Internal(format!("could not start async runtime: {e}")))?;
    let analysis = runtime.block_on(analyzer.analyze_all(urls));

    if analysis.documents().next().is_none() {
        return Err(CliError::ResolutionFailure(
            "no document could be resolved from the given entries".to_string(),
        ));
    }
    Ok(analysis)
}

fn execute_analyze(global: &GlobalArgs, entries: Vec<String>) -> Result<(), CliError> {
    let analysis = run_analysis(global, entries)?;
    let json = wca_export::export_to_string(&analysis)?;
    println!("{json}");
    Ok(())
}

/// JSON shape printed by `wca query features` — a thin, serializable view
/// over `ResolvedFeature`, which itself carries non-serializable `Arc<Document>`
/// pointers in some variants.
#[derive(Debug, Serialize)]
struct FeatureSummary {
    kinds: Vec<&'static str>,
    identifiers: Vec<String>,
    source_range: SourceRange,
}

fn execute_query(global: &GlobalArgs, action: QueryAction) -> Result<(), CliError> {
    match action {
        QueryAction::Features { kind, id, entries } => {
            let analysis = run_analysis(global, entries)?;
            let mut summaries = Vec::new();
            for doc in analysis.documents() {
                let matches = match &id {
                    Some(id) => doc.get_by_id(leak_kind(&kind), id),
                    None => doc.get_by_kind(&kind),
                };
                let matches = matches.map_err(|e| CliError::Internal(e.to_string()))?;
                summaries.extend(matches.iter().map(|f| {
                    let mut kinds: Vec<&'static str> = f.kinds().into_iter().collect();
                    kinds.sort_unstable();
                    let mut identifiers: Vec<String> = f.identifiers().into_iter().collect();
                    identifiers.sort();
                    FeatureSummary {
                        kinds,
                        identifiers,
                        source_range: f.source_range(),
                    }
                }));
            }
            let json = serde_json::to_string_pretty(&summaries)
                .map_err(|e| CliError::Internal(e.to_string()))?;
            println!("{json}");
        }
        QueryAction::Warnings { entries } => {
            let analysis = run_analysis(global, entries)?;
            let mut warnings: Vec<Warning> = Vec::new();
            for doc in analysis.documents() {
                warnings.extend(doc.get_warnings(true));
            }
            warnings.sort_by(|a, b| {
                (&a.document_url, a.source_range.start)
                    .cmp(&(&b.document_url, b.source_range.start))
            });
            warnings.dedup_by(|a, b| a == b);
            for warning in &warnings {
                println!(
                    "{}:{}:{}: {} [{}] {}",
                    warning.document_url,
                    warning.source_range.start.line + 1,
                    warning.source_range.start.column + 1,
                    severity_label(warning.severity),
                    warning.code,
                    warning.message,
                );
            }
        }
    }
    Ok(())
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
        Severity::Info => "info",
    }
}

/// `Document::get_by_id` expects a `&'static str` kind (it's keyed alongside
/// `ResolvedFeature::kinds()`, which only ever produces `&'static str`s).
/// CLI input is a runtime `String`, so known kinds are interned once via
/// `Box::leak` rather than threading a non-'static kind through the query
/// layer — cheap and harmless for a short-lived CLI process.
fn leak_kind(kind: &str) -> &'static str {
    Box::leak(kind.to_string().into_boxed_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leak_kind_returns_matching_str() {
        assert_eq!(leak_kind("element"), "element");
    }

    #[test]
    fn severity_label_matches_serde_rename() {
        assert_eq!(severity_label(Severity::Error), "error");
        assert_eq!(severity_label(Severity::Warning), "warning");
        assert_eq!(severity_label(Severity::Info), "info");
    }
}
