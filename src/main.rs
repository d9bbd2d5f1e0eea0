use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::aggregate::{OrganizationFilter, ViewMode, ALL_ORGANIZATIONS};
use crate::cache::SourceCache;
use crate::dashboard::DashboardView;
use crate::models::LoadOutcome;

mod aggregate;
mod cache;
mod dashboard;
mod error;
mod loader;
mod models;
mod report;

const DEFAULT_SOURCE: &str = "signers.csv";

#[derive(Parser)]
#[command(name = "signup-dashboard")]
#[command(about = "Signup analysis over a flat signup log", long_about = None)]
struct Cli {
    /// Signup log (falls back to SIGNUPS_CSV, then signers.csv)
    #[arg(long, global = true)]
    source: Option<PathBuf>,
    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the organization selector options
    Organizations,
    /// Print metrics and both aggregate views
    Summary {
        #[arg(long, default_value = ALL_ORGANIZATIONS)]
        organization: String,
        #[arg(long, value_enum, default_value_t = ViewMode::Regular)]
        view: ViewMode,
    },
    /// Export a dashboard view as JSON for a charting frontend
    Export {
        #[arg(long, default_value = ALL_ORGANIZATIONS)]
        organization: String,
        #[arg(long, value_enum, default_value_t = ViewMode::Regular)]
        view: ViewMode,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = ALL_ORGANIZATIONS)]
        organization: String,
        #[arg(long, value_enum, default_value_t = ViewMode::Regular)]
        view: ViewMode,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 20)]
        raw_rows: usize,
    },
    /// Change organization and view interactively from stdin
    Explore,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let source = resolve_source(cli.source);
    let mut cache = SourceCache::new();

    match cli.command {
        Commands::Organizations => {
            let outcome = load(&mut cache, &source)?;
            for option in aggregate::selector_options(&outcome.records) {
                println!("{option}");
            }
        }
        Commands::Summary { organization, view } => {
            let outcome = load(&mut cache, &source)?;
            let filter = OrganizationFilter::from_selection(&organization);
            print_summary(&dashboard::build_view(&outcome.records, &filter, view));
        }
        Commands::Export {
            organization,
            view,
            out,
        } => {
            let outcome = load(&mut cache, &source)?;
            let filter = OrganizationFilter::from_selection(&organization);
            let dashboard = dashboard::build_view(&outcome.records, &filter, view);
            let json = serde_json::to_string_pretty(&dashboard)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("Dashboard view written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report {
            organization,
            view,
            out,
            raw_rows,
        } => {
            let outcome = load(&mut cache, &source)?;
            let filter = OrganizationFilter::from_selection(&organization);
            let dashboard = dashboard::build_view(&outcome.records, &filter, view);
            let report = report::build_report(&dashboard, outcome.excluded.len(), raw_rows);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Explore => explore(&mut cache, &source)?,
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init();
    }
}

fn resolve_source(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os("SIGNUPS_CSV").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE))
}

fn load(cache: &mut SourceCache, source: &Path) -> anyhow::Result<Arc<LoadOutcome>> {
    let outcome = cache
        .load(source)
        .with_context(|| format!("failed to load signups from {}", source.display()))?;
    if !outcome.excluded.is_empty() {
        warn!(
            excluded = outcome.excluded.len(),
            rows = outcome.rows_seen(),
            "some signup rows were excluded"
        );
    }
    Ok(outcome)
}

fn cache_state(cache: &SourceCache, source: &Path) -> &'static str {
    if cache.is_cached(source) {
        "warm"
    } else {
        "cold"
    }
}

fn print_summary(view: &DashboardView<'_>) {
    println!("Signups for {} ({} view)", view.organization, view.view);
    println!(
        "Total signups: {} | Unique organizations: {} | Languages: {}",
        view.metrics.total_signups, view.metrics.unique_organizations, view.metrics.languages
    );

    println!("{}:", view.timeline_title);
    if view.monthly.is_empty() {
        println!("- none");
    }
    for row in &view.monthly {
        println!("- {}: {}", row.month, row.count);
    }

    println!("{}:", view.status_title);
    if view.statuses.is_empty() {
        println!("- none");
    }
    for row in &view.statuses {
        println!("- {}: {}", row.status, row.count);
    }
}

fn explore(cache: &mut SourceCache, source: &Path) -> anyhow::Result<()> {
    let mut outcome = load(cache, source)?;
    let mut filter = OrganizationFilter::All;
    let mut view = ViewMode::Regular;

    println!(
        "Commands: org <name>, orgs, view <regular|cumulative>, show, reload, clear-cache, quit"
    );
    print_summary(&dashboard::build_view(&outcome.records, &filter, view));

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        let (command, argument) = line.split_once(' ').unwrap_or((line, ""));
        let argument = argument.trim();

        match command {
            "" => continue,
            "quit" | "exit" => break,
            "orgs" => {
                for option in aggregate::selector_options(&outcome.records) {
                    println!("{option}");
                }
                continue;
            }
            "org" => filter = OrganizationFilter::from_selection(argument),
            "view" => match ViewMode::from_str(argument, true) {
                Ok(mode) => view = mode,
                Err(_) => {
                    println!("Unknown view {argument:?}; expected regular or cumulative.");
                    continue;
                }
            },
            "show" => println!("Signup cache: {}", cache_state(cache, source)),
            "reload" | "clear-cache" => {
                if command == "clear-cache" {
                    cache.clear();
                }
                println!("Signup cache: {}", cache_state(cache, source));
                match load(cache, source) {
                    Ok(fresh) => outcome = fresh,
                    Err(err) => {
                        warn!(
                            error = %format!("{err:#}"),
                            "reload failed, keeping previous signups"
                        );
                        continue;
                    }
                }
            }
            other => {
                println!("Unknown command {other:?}.");
                continue;
            }
        }

        info!(organization = filter.label(), view = %view, "recomputing dashboard");
        print_summary(&dashboard::build_view(&outcome.records, &filter, view));
    }

    Ok(())
}
