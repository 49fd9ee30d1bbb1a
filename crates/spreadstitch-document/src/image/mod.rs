// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: quarter-turn rotation, seam-aware stitching, and the raster
// page backend for extracted comic archives.

pub mod backend;
pub mod processor;

pub use backend::RasterBackend;
pub use processor::ImageProcessor;
