// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// SpreadStitch: page directive language, page operation applier, and result
// summary shared by the document backends and the command-line front end.

pub mod apply;
pub mod config;
pub mod directive;
pub mod error;
pub mod summary;
pub mod types;

pub use apply::{PageBackend, apply_directives, ensure_pages_present};
pub use config::StitchConfig;
pub use directive::parse_page_list;
pub use error::SpreadStitchError;
pub use summary::summarize;
pub use types::*;
