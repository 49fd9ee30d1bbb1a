// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: rotating, stitching, and re-ordering the pages of a PDF book.

pub mod book;

pub use book::PdfBook;
