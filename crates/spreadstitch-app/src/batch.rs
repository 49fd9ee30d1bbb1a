// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver: one book per input line, tallied as processed, skipped, or
// failed.

use std::io::Write;

use spreadstitch_core::StitchConfig;
use spreadstitch_core::error::Result;
use tracing::{error, info};

use crate::book::process_line;

/// Outcome counts for a whole input file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl std::fmt::Display for BatchTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} books processed, {} skipped, and {} errors. See output above for results.",
            self.processed, self.skipped, self.errors
        )
    }
}

/// Process every non-blank line of `input`, writing one message per book to
/// `out`. A failing book never stops the batch.
pub fn run_batch(input: &str, config: &StitchConfig, out: &mut impl Write) -> Result<BatchTally> {
    let mut tally = BatchTally::default();

    for line in input.lines().filter(|line| !line.trim().is_empty()) {
        match process_line(line, config) {
            Ok(message) => {
                tally.processed += 1;
                writeln!(out, "{message}")?;
            }
            Err(err) if err.is_skip() => {
                tally.skipped += 1;
                writeln!(out, "{err}")?;
            }
            Err(err) => {
                tally.errors += 1;
                let dir = line.split('|').next().unwrap_or_default().trim();
                error!(dir, error = %err, "Book failed");
                writeln!(out, "Error occurred while processing {dir}: {err}")?;
            }
        }
    }

    info!(
        processed = tally.processed,
        skipped = tally.skipped,
        errors = tally.errors,
        "Batch finished"
    );
    Ok(tally)
}
