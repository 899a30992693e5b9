//! Turn a CSV roster into a Word document of QR-code name badges laid out
//! on Avery 5395 label sheets.
//!
//! The pipeline runs in fixed stages:
//! config, roster, QR codes and layout, then the document itself.
//! [`BadgeJob::run`] drives the full pipeline from file paths, and
//! [`generate`] runs it for an already loaded configuration.

pub mod assets;
pub mod config;
pub mod docx;
pub mod error;
pub mod layout;
pub mod qr;
pub mod roster;
pub mod update;
pub mod viewer;

use std::fmt;
use std::path::{Path, PathBuf};

pub use assets::{Assets, Logo, LogoKind};
pub use config::{LayoutConfig, Length};
pub use error::{BadgeError, ErrorKind, Result};
pub use layout::{Cell, EncodedBadge, Page};
pub use roster::BadgeRecord;

/// Where a run is. Errors stop the pipeline at the stage that raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ConfigLoaded,
    RowsParsed,
    PagesLaid,
    DocumentWritten,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ConfigLoaded => "config loaded",
            Stage::RowsParsed => "rows parsed",
            Stage::PagesLaid => "pages laid out",
            Stage::DocumentWritten => "document written",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Progress {
    stage: Stage,
}

impl Progress {
    fn new() -> Self {
        Progress { stage: Stage::Idle }
    }

    fn advance(&mut self, next: Stage) {
        log::debug!("Stage: {} -> {}", self.stage, next);
        self.stage = next;
    }

    /// Record the outcome of a stage, moving to `next` or to `Failed`.
    fn step<T>(&mut self, next: Stage, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.advance(next);
                Ok(value)
            }
            Err(e) => {
                log::debug!("Stage {} failed: {}", self.stage, e);
                self.advance(Stage::Failed);
                Err(e)
            }
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub output: PathBuf,
    pub badges: usize,
    pub pages: usize,
}

/// Everything a run needs, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct BadgeJob {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Directory holding the built-in logos; defaults to `assets/` beside
    /// the executable
    pub asset_dir: Option<PathBuf>,
    pub landscape: bool,
}

impl BadgeJob {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        BadgeJob {
            input: input.into(),
            ..Default::default()
        }
    }

    pub fn run(&self) -> Result<Summary> {
        let mut progress = Progress::new();

        let loaded = self.load_config().and_then(|config| {
            let asset_dir = self
                .asset_dir
                .clone()
                .unwrap_or_else(assets::default_asset_dir);
            let assets = Assets::load(&config.logo_paths, &asset_dir)?;
            Ok((config, assets))
        });
        let (config, assets) = progress.step(Stage::ConfigLoaded, loaded)?;

        run_stages(
            &mut progress,
            &self.input,
            &config,
            &assets,
            self.output.as_deref(),
        )
    }

    fn load_config(&self) -> Result<LayoutConfig> {
        let config = LayoutConfig::load(self.config.as_deref())?;
        if self.landscape {
            config.into_landscape()
        } else {
            Ok(config)
        }
    }
}

/// Build the badge document for `input` with `config` and `assets`.
/// Without `output`, the document is written beside the CSV.
pub fn generate(
    input: &Path,
    config: &LayoutConfig,
    assets: &Assets,
    output: Option<&Path>,
) -> Result<Summary> {
    let mut progress = Progress::new();
    progress.advance(Stage::ConfigLoaded);
    run_stages(&mut progress, input, config, assets, output)
}

fn run_stages(
    progress: &mut Progress,
    input: &Path,
    config: &LayoutConfig,
    assets: &Assets,
    output: Option<&Path>,
) -> Result<Summary> {
    let records = progress.step(Stage::RowsParsed, roster::load_roster(input))?;

    let encoded = records
        .into_iter()
        .map(|record| {
            let qr = qr::render_record(&record, config.qr_pixels)?;
            Ok(EncodedBadge { record, qr })
        })
        .collect::<Result<Vec<_>>>()
        .map(|encoded| layout::lay_out(encoded, config, assets));
    let pages = progress.step(Stage::PagesLaid, encoded)?;
    let badges: usize = pages.iter().map(Page::badge_count).sum();

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| docx::default_output_path(input));
    let written = docx::write_document(&pages, config, &output);
    progress.step(Stage::DocumentWritten, written)?;
    progress.advance(Stage::Done);

    Ok(Summary {
        output,
        badges,
        pages: pages.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_step_moves_to_failed() {
        let mut progress = Progress::new();
        let ok: Result<()> = Ok(());
        progress.step(Stage::ConfigLoaded, ok).unwrap();
        assert_eq!(progress.stage, Stage::ConfigLoaded);

        let err: Result<()> = Err(BadgeError::config("bad"));
        assert!(progress.step(Stage::RowsParsed, err).is_err());
        assert_eq!(progress.stage, Stage::Failed);
    }

    #[test]
    fn generate_writes_beside_the_csv() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("club.csv");
        std::fs::write(
            &input,
            "Preferred,Last,Code\nAda,Lovelace,https://x.test/1\nAlan,Turing,https://x.test/2\n",
        )
        .unwrap();

        let summary = generate(&input, &LayoutConfig::default(), &Assets::none(), None).unwrap();
        assert_eq!(summary.output, dir.path().join("club_nametags.docx"));
        assert_eq!(summary.badges, 2);
        assert_eq!(summary.pages, 1);
        assert!(summary.output.is_file());
    }

    #[test]
    fn bad_row_leaves_no_document() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("club.csv");
        std::fs::write(&input, "Preferred,Last,Code\nAda,Lovelace,\n").unwrap();

        let err = generate(&input, &LayoutConfig::default(), &Assets::none(), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Data);
        assert!(!dir.path().join("club_nametags.docx").exists());
    }

    #[test]
    fn job_applies_landscape_switch() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("club.csv");
        std::fs::write(&input, "Preferred,Last,Code\nAda,Lovelace,x\n").unwrap();

        // The default 2x4 grid is taller than a landscape letter page.
        let job = BadgeJob {
            landscape: true,
            asset_dir: Some(dir.path().to_path_buf()),
            ..BadgeJob::new(&input)
        };
        assert_eq!(job.run().unwrap_err().kind(), ErrorKind::Config);
    }
}
