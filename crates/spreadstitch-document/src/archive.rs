// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Comic archive (CBZ) unpacking and packing using the `zip` crate.

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use spreadstitch_core::error::{Result, SpreadStitchError};
use tracing::{debug, info, instrument, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// File extensions treated as pages. Anything else is carried along untouched.
const PAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"];

/// One extracted archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name inside the archive, `/`-separated.
    pub name: String,
    /// Where the extracted bytes live on disk.
    pub path: PathBuf,
}

impl ArchiveEntry {
    fn is_page(&self) -> bool {
        is_page_name(Path::new(&self.name))
    }
}

/// Whether `name` has one of the page image extensions.
pub(crate) fn is_page_name(name: &Path) -> bool {
    name.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// The unpacked contents of a CBZ: ordered pages plus any other members
/// (`ComicInfo.xml` and the like).
#[derive(Debug, Clone, Default)]
pub struct ComicArchive {
    pages: Vec<ArchiveEntry>,
    extras: Vec<ArchiveEntry>,
}

impl ComicArchive {
    // -- Construction ---------------------------------------------------------

    /// Extract every member of `archive_path` below `dest`.
    ///
    /// When all members sit inside one wrapping folder (possibly nested), the
    /// folder is dropped from their names. Pages are ordered by name.
    #[instrument(skip_all, fields(archive = %archive_path.as_ref().display()))]
    pub fn extract(archive_path: impl AsRef<Path>, dest: impl AsRef<Path>) -> Result<Self> {
        let archive_path = archive_path.as_ref();
        let dest = dest.as_ref();

        let file = File::open(archive_path)?;
        let mut zip = ZipArchive::new(file).map_err(|err| {
            SpreadStitchError::Archive(format!(
                "failed to open {}: {}",
                archive_path.display(),
                err
            ))
        })?;

        let mut extracted: Vec<(Vec<String>, PathBuf)> = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut member = zip.by_index(index).map_err(|err| {
                SpreadStitchError::Archive(format!("failed to read entry #{}: {}", index, err))
            })?;
            if member.is_dir() {
                continue;
            }
            let Some(relative) = member.enclosed_name() else {
                warn!(name = member.name(), "Skipping entry with unsafe path");
                continue;
            };

            let out_path = dest.join(&relative);
            if let Some(parent) = out_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut member, &mut out)?;

            let parts = relative
                .components()
                .filter_map(|component| match component {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            extracted.push((parts, out_path));
        }

        strip_wrapping_folders(&mut extracted);

        let mut archive = Self::default();
        for (parts, path) in extracted {
            let entry = ArchiveEntry {
                name: parts.join("/"),
                path,
            };
            if entry.is_page() {
                archive.pages.push(entry);
            } else {
                archive.extras.push(entry);
            }
        }
        archive.pages.sort_by(|a, b| a.name.cmp(&b.name));

        info!(
            pages = archive.pages.len(),
            extras = archive.extras.len(),
            "Archive extracted"
        );
        Ok(archive)
    }

    /// An archive made of `pages` alone, as produced from an ePub.
    pub fn from_pages(pages: Vec<ArchiveEntry>) -> Self {
        Self {
            pages,
            extras: Vec::new(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn pages(&self) -> &[ArchiveEntry] {
        &self.pages
    }

    pub fn extras(&self) -> &[ArchiveEntry] {
        &self.extras
    }

    /// Replace the page list, typically with the output of the applier.
    pub fn set_pages(&mut self, pages: Vec<ArchiveEntry>) {
        self.pages = pages;
    }

    // -- Output ---------------------------------------------------------------

    /// Pack pages (in order) and extras into a new archive at `path`.
    ///
    /// Members are stored uncompressed; comic pages are already compressed
    /// images.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = ZipWriter::new(File::create(path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        for entry in self.pages.iter().chain(&self.extras) {
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|err| {
                    SpreadStitchError::Archive(format!("failed to add {}: {}", entry.name, err))
                })?;
            let mut source = File::open(&entry.path)?;
            io::copy(&mut source, &mut writer)?;
            debug!(name = %entry.name, "Entry written");
        }

        writer.finish().map_err(|err| {
            SpreadStitchError::Archive(format!("failed to finish {}: {}", path.display(), err))
        })?;
        info!(entries = self.pages.len() + self.extras.len(), "Archive written");
        Ok(())
    }
}

/// Drop leading folders shared by every entry, as long as each entry keeps a
/// file name.
fn strip_wrapping_folders(entries: &mut [(Vec<String>, PathBuf)]) {
    loop {
        let Some(first) = entries.first().and_then(|(parts, _)| {
            (parts.len() > 1).then(|| parts[0].clone())
        }) else {
            return;
        };
        let shared = entries
            .iter()
            .all(|(parts, _)| parts.len() > 1 && parts[0] == first);
        if !shared {
            return;
        }
        debug!(folder = %first, "Flattening wrapping folder");
        for (parts, _) in entries.iter_mut() {
            parts.remove(0);
        }
    }
}
