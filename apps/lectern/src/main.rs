mod session;

use clap::Parser;
use lc_core::ReaderError;
use lc_core::ReaderResult;
use lc_reader::ReadingModeSettings;
use session::SessionOptions;
use std::path::PathBuf;
use std::process::ExitCode;

/// Runs reading mode over a saved page and prints the resulting markup.
#[derive(Parser, Debug)]
#[command(name = "lectern", version)]
#[command(about = "Reading mode for content regions of a saved page")]
struct Args {
    /// HTML page to load
    #[arg(value_name = "PAGE.html")]
    page: PathBuf,

    /// Reading mode settings (TOML)
    #[arg(long, value_name = "FILE.toml")]
    settings: Option<PathBuf>,

    /// Enter reading mode through the first region's toolbar button
    #[arg(long)]
    enter: bool,

    /// Leave reading mode again after entering
    #[arg(long, requires = "enter")]
    exit: bool,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_tracing(&args.log_level);

    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("lectern: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> ReaderResult<String> {
    let html = std::fs::read_to_string(&args.page).map_err(|error| {
        ReaderError::new(
            "reader.io.read_failed",
            format!("failed to read page `{}`: {error}", args.page.display()),
        )
    })?;
    let settings = match &args.settings {
        Some(path) => ReadingModeSettings::from_path(path)?,
        None => ReadingModeSettings::default(),
    };
    let options = SessionOptions {
        enter: args.enter,
        exit: args.exit,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|error| {
            ReaderError::new(
                "reader.runtime.start_failed",
                format!("failed to start runtime: {error}"),
            )
        })?;
    let report = runtime.block_on(session::run(&html, settings, options))?;
    Ok(format!("{}\n{}", report.markup, report.summary()))
}

/// Installs the stderr subscriber. Returns false when one was already set.
fn setup_tracing(level: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // stdout carries only the page markup.
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(error) = installed {
        tracing::warn!(%error, "tracing subscriber already installed; keeping it");
        return false;
    }
    true
}
