// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster page backend: applies page directives to extracted image files.

use spreadstitch_core::error::Result;
use spreadstitch_core::{OverlapPolicy, PageBackend, Rotation};
use tracing::{debug, instrument};

use super::processor::ImageProcessor;
use crate::archive::ArchiveEntry;

/// Edits page images in place on disk. A stitched page is written over the
/// file of the first page of its pair.
#[derive(Debug, Clone)]
pub struct RasterBackend {
    policy: OverlapPolicy,
}

impl RasterBackend {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self { policy }
    }

    /// Crop the rightmost pixel column from every page.
    #[instrument(skip_all, fields(pages = pages.len()))]
    pub fn trim_right_columns(&self, pages: &[ArchiveEntry]) -> Result<()> {
        for page in pages {
            ImageProcessor::open(&page.path)?
                .trim_right_column()
                .save(&page.path)?;
        }
        debug!("Right columns trimmed");
        Ok(())
    }
}

impl PageBackend for RasterBackend {
    type Page = ArchiveEntry;

    #[instrument(skip_all, fields(page = %page.name, ?rotation))]
    fn rotate(&mut self, page: &mut ArchiveEntry, rotation: Rotation) -> Result<()> {
        ImageProcessor::open(&page.path)?
            .rotate_quarter(rotation)
            .save(&page.path)
    }

    #[instrument(skip_all, fields(left = %left.name, right = %right.name, target = %target.name))]
    fn stitch(
        &mut self,
        left: &ArchiveEntry,
        right: &ArchiveEntry,
        rotation: Option<Rotation>,
        target: &mut ArchiveEntry,
    ) -> Result<()> {
        let mut merged =
            ImageProcessor::open(&left.path)?.stitch(ImageProcessor::open(&right.path)?, &self.policy);
        if let Some(rotation) = rotation {
            merged = merged.rotate_quarter(rotation);
        }
        merged.save(&target.path)
    }

    fn remove(&mut self, page: ArchiveEntry) -> Result<()> {
        debug!(page = %page.name, "Removing page");
        std::fs::remove_file(&page.path)?;
        Ok(())
    }
}
