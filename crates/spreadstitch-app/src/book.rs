// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-book pipeline: read one input line, locate the book, apply its page
// list, and write the result. CBZ and PDF books are rewritten in place next to
// a backup of the original; ePub books become a CBZ beside the ePub.

use std::path::Path;

use spreadstitch_core::error::{Result, SpreadStitchError};
use spreadstitch_core::{
    BookFlags, BookFormat, OverlapPolicy, PageDirective, StitchConfig, apply_directives,
    ensure_pages_present, parse_page_list, summarize,
};
use spreadstitch_document::{ComicArchive, EpubBook, PdfBook, RasterBackend, cbz_path};
use tracing::{info, instrument, warn};

use crate::locate;

/// Process one `bookDir|pages|flag|flag...` line and return the message to
/// show the user.
///
/// Input problems come back as errors for which
/// [`SpreadStitchError::is_skip`] is true.
#[instrument(skip(config))]
pub fn process_line(line: &str, config: &StitchConfig) -> Result<String> {
    let mut fields = line.split('|');
    let dir = locate::book_dir(fields.next().unwrap_or_default())?;
    let page_list = fields.next().map(str::trim).unwrap_or_default();
    let flags = BookFlags::parse(fields);
    let format = flags.format();

    let book = locate::find_book(&dir, format, flags.backed_up)?;
    let label = book
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| book.display().to_string());

    if page_list.is_empty() {
        return match format {
            BookFormat::Epub => {
                convert_epub(&book, flags.right_lines)?;
                Ok(format!("{label} converted to CBZ."))
            }
            BookFormat::Cbz if flags.right_lines => {
                trim_only(&book, flags.backed_up)?;
                Ok(format!("{label} has had the right lines removed."))
            }
            BookFormat::Pdf => Err(SpreadStitchError::UnsupportedSource(format!(
                "The line for {} has no page numbers. Converting a PDF to CBZ is not supported; \
                 add page numbers to edit the PDF directly.",
                dir.display()
            ))),
            _ => Err(SpreadStitchError::MissingPageList(dir)),
        };
    }

    if let Some(flag) = flags.unknown.first() {
        return Err(SpreadStitchError::UnknownFlag {
            dir,
            flag: flag.clone(),
        });
    }

    let dir_label = dir.display().to_string();
    let directives = parse_page_list(page_list, &dir_label)?;
    match format {
        BookFormat::Cbz => edit_cbz(&book, &dir_label, &directives, &flags, config)?,
        BookFormat::Epub => edit_epub(&book, &dir_label, &directives, &flags, config)?,
        BookFormat::Pdf => edit_pdf(&book, &dir_label, &directives, &flags)?,
    }

    Ok(summarize(&label, &directives))
}

fn edit_cbz(
    book: &Path,
    label: &str,
    directives: &[PageDirective],
    flags: &BookFlags,
    config: &StitchConfig,
) -> Result<()> {
    let workspace = tempfile::Builder::new().prefix("spreadstitch-").tempdir()?;
    let mut archive = ComicArchive::extract(book, workspace.path())?;
    ensure_pages_present(label, directives, archive.pages().len())?;

    let mut backend = RasterBackend::new(config.overlap_policy());
    if flags.right_lines {
        backend.trim_right_columns(archive.pages())?;
    }
    let pages = apply_directives(
        &mut backend,
        archive.pages().to_vec(),
        directives,
        flags.manga,
    )?;
    archive.set_pages(pages);

    replace_book(book, flags.backed_up, |path| archive.write(path))
}

/// The ePub itself is left alone; the edited pages become a CBZ beside it.
fn edit_epub(
    book: &Path,
    label: &str,
    directives: &[PageDirective],
    flags: &BookFlags,
    config: &StitchConfig,
) -> Result<()> {
    let workspace = tempfile::Builder::new().prefix("spreadstitch-").tempdir()?;
    let mut archive = EpubBook::open(book)?.extract_pages(workspace.path())?;
    ensure_pages_present(label, directives, archive.pages().len())?;

    let mut backend = RasterBackend::new(config.overlap_policy());
    if flags.right_lines {
        backend.trim_right_columns(archive.pages())?;
    }
    let pages = apply_directives(
        &mut backend,
        archive.pages().to_vec(),
        directives,
        flags.manga,
    )?;
    archive.set_pages(pages);

    write_epub_cbz(book, &archive)
}

/// Repack an ePub's pages as a CBZ without any page edits.
fn convert_epub(book: &Path, right_lines: bool) -> Result<()> {
    let workspace = tempfile::Builder::new().prefix("spreadstitch-").tempdir()?;
    let archive = EpubBook::open(book)?.extract_pages(workspace.path())?;
    if right_lines {
        RasterBackend::new(OverlapPolicy::disabled()).trim_right_columns(archive.pages())?;
    }
    write_epub_cbz(book, &archive)
}

fn write_epub_cbz(book: &Path, archive: &ComicArchive) -> Result<()> {
    let target = cbz_path(book);
    if target.exists() {
        warn!(cbz = %target.display(), "Replacing existing CBZ");
    }
    archive.write(&target)?;
    info!(cbz = %target.display(), "ePub written as CBZ");
    Ok(())
}

fn edit_pdf(
    book: &Path,
    label: &str,
    directives: &[PageDirective],
    flags: &BookFlags,
) -> Result<()> {
    let mut pdf = PdfBook::open(book)?;
    ensure_pages_present(label, directives, pdf.page_count())?;
    if flags.right_lines {
        warn!("rightlines only applies to CBZ books; ignoring it for this PDF");
    }

    let pages = pdf.pages();
    let pages = apply_directives(&mut pdf, pages, directives, flags.manga)?;

    replace_book(book, flags.backed_up, |path| pdf.save(&pages, flags.manga, path))
}

/// Crop the right column of every page without any other change.
fn trim_only(book: &Path, backed_up: bool) -> Result<()> {
    let workspace = tempfile::Builder::new().prefix("spreadstitch-").tempdir()?;
    let archive = ComicArchive::extract(book, workspace.path())?;
    RasterBackend::new(OverlapPolicy::disabled()).trim_right_columns(archive.pages())?;
    replace_book(book, backed_up, |path| archive.write(path))
}

/// Move the original aside (unless a backup already exists) and write the
/// new book in its place.
fn replace_book(
    book: &Path,
    backed_up: bool,
    write: impl FnOnce(&Path) -> Result<()>,
) -> Result<()> {
    if !backed_up {
        let backup = locate::backup_path(book);
        std::fs::rename(book, &backup)?;
        info!(backup = %backup.display(), "Original kept as backup");
    }
    write(book)
}
