//! specweave - cross-link a corpus of specification sources

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use specweave::source::write_documents;
use specweave::watch::{self, WatchTargets};
use specweave::{BuildConfig, BuildGate, BuildSettings, build_from_config};

#[derive(Parser)]
#[command(name = "specweave")]
#[command(version, about = "Cross-link a corpus of specification sources", long_about = None)]
#[command(after_help = "EXAMPLES:
    specweave                          Build using ./specweave.json or defaults
    specweave --src specs --out site   Build specs/*.html into site/
    specweave --check                  Report problems without writing
    specweave --watch                  Rebuild whenever a source or data file changes")]
struct Cli {
    /// Config file (default: ./specweave.json if present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory of *.html specification sources
    #[arg(long, value_name = "DIR")]
    src: Option<PathBuf>,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,

    /// Person registry JSON
    #[arg(long, value_name = "FILE")]
    people: Option<PathBuf>,

    /// Hand-authored bibliography JSON
    #[arg(long, value_name = "FILE")]
    biblio: Option<PathBuf>,

    /// Canonical base URL of the published corpus
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Report problems without writing any output
    #[arg(long, conflicts_with = "watch")]
    check: bool,

    /// Rebuild whenever a source, the registry or the bibliography changes
    #[arg(short, long)]
    watch: bool,

    /// Log each document and resolution step
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> specweave::Result<BuildConfig> {
        let mut config = BuildConfig::discover(self.config.as_deref())?;
        if let Some(src) = &self.src {
            config.source_dir = src.clone();
        }
        if let Some(out) = &self.out {
            config.output_dir = out.clone();
        }
        if let Some(people) = &self.people {
            config.people = people.clone();
        }
        if let Some(biblio) = &self.biblio {
            config.bibliography = biblio.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        Ok(config)
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "specweave=debug"
    } else if quiet {
        "specweave=warn"
    } else {
        "specweave=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.watch {
        return run_watch(config);
    }

    match build(&config, !cli.check) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run one build. Returns whether it was free of diagnostics.
fn build(config: &BuildConfig, write: bool) -> specweave::Result<bool> {
    let settings = BuildSettings::today(config);
    let output = build_from_config(config, &settings)?;

    // Diagnostics and bibliography overrides were already logged as warnings.
    if write {
        let written = write_documents(&output.documents, &config.output_dir)?;
        tracing::info!(
            "wrote {} documents to {}",
            written.len(),
            config.output_dir.display()
        );
    }

    let failed = output.report.failed_documents();
    if failed.is_empty() {
        Ok(true)
    } else {
        eprintln!(
            "{} problem(s) in {} document(s): {}",
            output.report.diagnostics().len(),
            failed.len(),
            failed.join(", ")
        );
        Ok(false)
    }
}

fn run_watch(config: BuildConfig) -> ExitCode {
    if let Err(e) = build(&config, true) {
        eprintln!("error: {e}");
    }

    let targets = match WatchTargets::from_config(&config) {
        Ok(targets) => targets,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let gate = Arc::new(BuildGate::new());
    let result = watch::watch(&targets, gate, move || {
        if let Err(e) = build(&config, true) {
            eprintln!("error: {e}");
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
