// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Book directory validation and book file discovery.

use std::path::{Path, PathBuf};

use spreadstitch_core::BookFormat;
use spreadstitch_core::error::{Result, SpreadStitchError};
use tracing::debug;

/// Check the directory field of an input line.
pub fn book_dir(field: &str) -> Result<PathBuf> {
    let field = field.trim();
    if field.is_empty() {
        return Err(SpreadStitchError::MissingBookDir);
    }
    let dir = PathBuf::from(field);
    if !dir.exists() {
        return Err(SpreadStitchError::BookDirNotFound(dir));
    }
    Ok(dir)
}

/// Where the backup of `book` lives: `Saga.cbz` becomes `Saga.cbz_old`.
pub fn backup_path(book: &Path) -> PathBuf {
    let mut name = book.as_os_str().to_owned();
    name.push("_old");
    PathBuf::from(name)
}

/// Find the book file of `format` in `dir`.
///
/// Without `backed_up`, a leftover backup from an earlier run blocks the
/// book. With it, a backup must exist. When several books match, the first
/// by name wins.
pub fn find_book(dir: &Path, format: BookFormat, backed_up: bool) -> Result<PathBuf> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    let has_extension = |path: &Path, wanted: &str| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
    };
    let backup_ext = format.backup_extension();
    let has_backup = files.iter().any(|path| has_extension(path, &backup_ext));

    if has_backup && !backed_up {
        return Err(SpreadStitchError::BackupPresent {
            dir: dir.to_path_buf(),
            format,
        });
    }
    if backed_up && !has_backup {
        return Err(SpreadStitchError::BackupMissing(dir.to_path_buf()));
    }

    let book = files
        .into_iter()
        .find(|path| has_extension(path, format.extension()))
        .ok_or_else(|| SpreadStitchError::BookFileNotFound {
            dir: dir.to_path_buf(),
            format,
        })?;
    debug!(book = %book.display(), "Book file found");
    Ok(book)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").expect("touch");
    }

    #[test]
    fn empty_dir_field_is_missing() {
        assert!(matches!(book_dir("  "), Err(SpreadStitchError::MissingBookDir)));
    }

    #[test]
    fn nonexistent_dir_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");
        let err = book_dir(missing.to_str().expect("utf-8 path")).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("{} does not exist. Check your filepath.", missing.display())
        );
    }

    #[test]
    fn finds_book_by_extension_case_insensitively() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "Saga.CBZ");
        let found = find_book(dir.path(), BookFormat::Cbz, false).expect("find");
        assert_eq!(found, dir.path().join("Saga.CBZ"));
    }

    #[test]
    fn leftover_backup_blocks_book() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "Saga.cbz");
        touch(dir.path(), "Saga.cbz_old");
        let err = find_book(dir.path(), BookFormat::Cbz, false).unwrap_err();
        assert!(matches!(err, SpreadStitchError::BackupPresent { .. }));
        assert!(find_book(dir.path(), BookFormat::Cbz, true).is_ok());
    }

    #[test]
    fn backedup_flag_requires_backup() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "Saga.pdf");
        let err = find_book(dir.path(), BookFormat::Pdf, true).unwrap_err();
        assert!(matches!(err, SpreadStitchError::BackupMissing(_)));
    }

    #[test]
    fn missing_book_names_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(dir.path(), "Saga.cbz");
        let err = find_book(dir.path(), BookFormat::Pdf, false).unwrap_err();
        assert!(err.to_string().ends_with("has no PDF files in it. Check your input."));
    }

    #[test]
    fn backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/books/Saga.cbz")),
            PathBuf::from("/books/Saga.cbz_old")
        );
    }
}
