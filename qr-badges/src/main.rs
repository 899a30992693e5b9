// qr-badges: Generate QR-code name badges for Avery 5395 label sheets

use clap::Parser;
use std::path::PathBuf;

use qr_badges::update::{
    spawn_check, HttpUpdateChecker, NoopUpdateChecker, UpdateChecker, COLLECT_TIMEOUT,
    UPDATE_URL_ENV,
};
use qr_badges::{viewer, BadgeError, BadgeJob};

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate QR-code name badges (Avery 5395) as a Word document from a CSV roster"
)]
struct Args {
    /// CSV roster with `Preferred`, `Last` and `Code` columns
    #[arg(short, long)]
    input: PathBuf,

    /// Layout config file (JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output document (default: <input>_nametags.docx beside the CSV)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory holding full_logo.png, small_logo.png and ribbon.png
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Landscape page orientation
    #[arg(long)]
    landscape: bool,

    /// Don't open the document when done
    #[arg(long)]
    no_open: bool,

    /// Skip the check for a newer release
    #[arg(long)]
    no_update_check: bool,

    /// Release document to check for updates
    #[arg(long, env = UPDATE_URL_ENV)]
    update_url: Option<String>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), BadgeError> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let checker: Box<dyn UpdateChecker + Send> = match &args.update_url {
        Some(url) if !args.no_update_check => Box::new(HttpUpdateChecker::new(url.as_str())),
        _ => Box::new(NoopUpdateChecker),
    };
    let update = spawn_check(checker);

    let job = BadgeJob {
        input: args.input,
        config: args.config,
        output: args.output,
        asset_dir: args.assets,
        landscape: args.landscape,
    };
    let summary = job.run()?;

    println!("Generated: {}", summary.output.display());
    println!(
        "  {} badges on {} page{}",
        summary.badges,
        summary.pages,
        if summary.pages == 1 { "" } else { "s" }
    );

    if let Some(release) = update.collect(COLLECT_TIMEOUT) {
        println!(
            "A newer version ({}) is available: {}",
            release.version, release.url
        );
    }

    if !args.no_open {
        viewer::open_in_viewer(&summary.output);
    }

    Ok(())
}
