// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// spreadstitch-document: Page backends for SpreadStitch.
//
// Provides raster page operations (quarter-turn rotation, seam-aware
// side-by-side stitching, right-column trimming), PDF page operations (rotate,
// merge two pages onto one canvas, rebuild the page tree), CBZ archive
// extraction and packing, and ePub page extraction.

pub mod archive;
pub mod epub;
pub mod image;
pub mod pdf;

// Re-export the primary structs so callers can use `spreadstitch_document::PdfBook` etc.
pub use archive::{ArchiveEntry, ComicArchive};
pub use self::epub::book::{EpubBook, cbz_path};
pub use self::image::backend::RasterBackend;
pub use self::image::processor::ImageProcessor;
pub use pdf::book::PdfBook;
