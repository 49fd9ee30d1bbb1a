// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for SpreadStitch.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::BookFormat;

/// Top-level error type for all SpreadStitch operations.
///
/// The input-validation variants carry the exact sentence shown to the user
/// when a book is skipped; see [`SpreadStitchError::is_skip`].
#[derive(Debug, Error)]
pub enum SpreadStitchError {
    // -- Page list --
    #[error("{label} has no pages to combine. Check your input.")]
    EmptyPageList { label: String },

    #[error(
        "Page list for {label} contains at least one thing that's not a number and doesn't match any of the available page modifiers. Check your input."
    )]
    MalformedToken { label: String, token: String },

    #[error(
        "Page list for {label} contains at least one thing that's not a number and doesn't match any of the available page modifiers. Check your input."
    )]
    MalformedRange { label: String, token: String },

    #[error("{label} skipped because the last page to process is past the end of the book.")]
    OutOfRange {
        label: String,
        required: usize,
        available: usize,
    },

    #[error("page {page} is no longer available; an earlier directive already consumed it")]
    PageUnavailable { page: u32 },

    // -- Book location --
    #[error("No book directory on this line. Check your input.")]
    MissingBookDir,

    #[error("{} does not exist. Check your filepath.", .0.display())]
    BookDirNotFound(PathBuf),

    #[error("{} has no {} files in it. Check your input.", .dir.display(), .format.label())]
    BookFileNotFound { dir: PathBuf, format: BookFormat },

    #[error(
        "{} contains a backup from a previous run. As such, this book will be skipped. Try again after either deleting the {}_OLD file or adding \"backedup\" as an option on the input.",
        .dir.display(),
        .format.extension().to_ascii_uppercase()
    )]
    BackupPresent { dir: PathBuf, format: BookFormat },

    #[error(
        "{} had the backedup flag set, but no backup was found. Remove the backedup flag for this directory to process the book normally.",
        .0.display()
    )]
    BackupMissing(PathBuf),

    #[error("The line for {} is missing page numbers. Skipping.", .0.display())]
    MissingPageList(PathBuf),

    #[error("Unknown flag detected for {}. Skipping.", .dir.display())]
    UnknownFlag { dir: PathBuf, flag: String },

    #[error("{0}")]
    UnsupportedSource(String),

    // -- Document errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("ePub operation failed: {0}")]
    EpubError(String),

    #[error("archive operation failed: {0}")]
    Archive(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SpreadStitchError {
    /// Whether this error means "skip the book" (bad input line) rather than
    /// "processing failed".
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::EmptyPageList { .. }
                | Self::MalformedToken { .. }
                | Self::MalformedRange { .. }
                | Self::OutOfRange { .. }
                | Self::MissingBookDir
                | Self::BookDirNotFound(_)
                | Self::BookFileNotFound { .. }
                | Self::BackupPresent { .. }
                | Self::BackupMissing(_)
                | Self::MissingPageList(_)
                | Self::UnknownFlag { .. }
                | Self::UnsupportedSource(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SpreadStitchError>;
