// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page list parser. Turns "1,5l,7m,33-36d" into sorted page directives.

use tracing::debug;

use crate::error::{Result, SpreadStitchError};
use crate::types::{Operation, PageDirective};

/// Longest delete range accepted, in pages. No comic book comes close.
pub const MAX_RANGE_PAGES: u32 = 10_000;

/// Parse a comma-separated page list.
///
/// Each token is a page number optionally followed by one modifier:
/// `l`/`r` rotate, `m`/`s` stitch then rotate, `d` delete. A bare number
/// stitches the page with the next one. Deletes also accept an inclusive
/// range, `33-36d`, of up to [`MAX_RANGE_PAGES`] pages. `label` identifies
/// the book in error messages.
///
/// The result is stably sorted by page number. Any bad token rejects the whole
/// list.
pub fn parse_page_list(input: &str, label: &str) -> Result<Vec<PageDirective>> {
    if input.trim().is_empty() {
        return Err(SpreadStitchError::EmptyPageList {
            label: label.to_string(),
        });
    }

    let mut directives = Vec::new();
    for raw in input.split(',') {
        let token = raw.trim();
        let malformed = || SpreadStitchError::MalformedToken {
            label: label.to_string(),
            token: token.to_string(),
        };

        let last = token.chars().last().ok_or_else(malformed)?;
        if last.is_ascii_digit() {
            directives.push(PageDirective::new(
                parse_page_number(token).ok_or_else(malformed)?,
                Operation::Stitch,
            ));
            continue;
        }

        let operation = Operation::from_code(last).ok_or_else(malformed)?;
        let body = &token[..token.len() - last.len_utf8()];

        if operation == Operation::Delete && body.contains('-') {
            let (start, end) = parse_range(body).ok_or_else(|| SpreadStitchError::MalformedRange {
                label: label.to_string(),
                token: token.to_string(),
            })?;
            directives.extend((start..=end).map(|page| PageDirective::new(page, Operation::Delete)));
            continue;
        }

        directives.push(PageDirective::new(
            parse_page_number(body).ok_or_else(malformed)?,
            operation,
        ));
    }

    directives.sort_by_key(|directive| directive.page);
    debug!(label, count = directives.len(), "Page list parsed");
    Ok(directives)
}

/// A non-empty run of ASCII digits that fits in a `u32`.
fn parse_page_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// `start-end` with `start <= end`, spanning at most [`MAX_RANGE_PAGES`].
fn parse_range(text: &str) -> Option<(u32, u32)> {
    let (start, end) = text.split_once('-')?;
    let start = parse_page_number(start)?;
    let end = parse_page_number(end)?;
    (start <= end && end - start < MAX_RANGE_PAGES).then_some((start, end))
}
