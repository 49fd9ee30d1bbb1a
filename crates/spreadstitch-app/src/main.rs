// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SpreadStitch: merge two-page comic spreads, rotate and delete pages
//
// Entry point. Parses the command line, initialises logging, loads the stitch
// settings, and runs the batch described by the page file.

mod batch;
mod book;
mod locate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use spreadstitch_core::StitchConfig;
use spreadstitch_core::error::{Result, SpreadStitchError};

use batch::BatchTally;

/// Stitch two-page spreads, rotate pages, and delete pages in CBZ, ePub, and
/// PDF comic books, as listed in a page file.
#[derive(Debug, Parser)]
#[command(name = "spreadstitch", version, about)]
struct Cli {
    /// Page file with one `bookDir|pages|flag|flag...` line per book.
    #[arg(default_value = "pagesToProcess.txt")]
    page_file: PathBuf,

    /// Columns of the left page searched for a duplicated seam (0 disables).
    #[arg(short = 'o', long)]
    overlap: Option<u32>,

    /// Per-channel tolerance for compression artefacts at the seam.
    #[arg(short = 'c', long)]
    compression: Option<u16>,

    /// JSON file with stitch settings. Command-line values take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level when RUST_LOG is not set.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn stitch_config(&self) -> Result<StitchConfig> {
        let mut config = match &self.config {
            Some(path) => StitchConfig::load(path)?,
            None => StitchConfig::default(),
        };
        if let Some(columns) = self.overlap {
            config.overlap_columns = columns;
        }
        if let Some(fuzz) = self.compression {
            config.compression_fuzz = fuzz;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(page_file = %cli.page_file.display(), "SpreadStitch starting");

    match run(&cli) {
        Ok(tally) => {
            println!("{tally}");
            if tally.errors > 0 {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            tracing::error!(error = %err, "Run aborted");
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<BatchTally> {
    let config = cli.stitch_config()?;
    let input = std::fs::read_to_string(&cli.page_file).map_err(|err| {
        SpreadStitchError::Config(format!(
            "cannot read page file {}: {}",
            cli.page_file.display(),
            err
        ))
    })?;

    let stdout = std::io::stdout();
    batch::run_batch(&input, &config, &mut stdout.lock())
}
