// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page operation applier. Runs parsed directives against a page sequence
// through a backend that knows how to rotate, merge, and discard pages.

use tracing::{debug, info, instrument};

use crate::error::{Result, SpreadStitchError};
use crate::types::{Operation, PageDirective, Rotation};

/// Page-level capabilities a book format provides to the applier.
pub trait PageBackend {
    /// Handle to one page of the book.
    type Page: Clone;

    /// Rotate `page` by a quarter turn in place.
    fn rotate(&mut self, page: &mut Self::Page, rotation: Rotation) -> Result<()>;

    /// Merge `left` and `right` side by side, rotate the merged page if
    /// `rotation` is given, and store it in `target`, replacing whatever
    /// `target` held.
    fn stitch(
        &mut self,
        left: &Self::Page,
        right: &Self::Page,
        rotation: Option<Rotation>,
        target: &mut Self::Page,
    ) -> Result<()>;

    /// Discard a page that is leaving the book.
    fn remove(&mut self, page: Self::Page) -> Result<()>;
}

/// Fail with [`SpreadStitchError::OutOfRange`] if any directive addresses a
/// page the book does not have.
pub fn ensure_pages_present(
    label: &str,
    directives: &[PageDirective],
    available: usize,
) -> Result<()> {
    let required = directives
        .iter()
        .map(PageDirective::pages_required)
        .max()
        .unwrap_or(0);
    if required > available {
        return Err(SpreadStitchError::OutOfRange {
            label: label.to_string(),
            required,
            available,
        });
    }
    Ok(())
}

/// Apply sorted `directives` to `pages` and return the new page order.
///
/// Every directive addresses positions in the original sequence. Pages taken
/// out by a delete or a stitch leave a hole that is closed once all
/// directives have run, so later directives are unaffected by earlier
/// removals. `right_to_left` swaps which page of a pair is drawn on the left.
///
/// Callers should run [`ensure_pages_present`] first; a directive naming a
/// page that was already consumed fails with
/// [`SpreadStitchError::PageUnavailable`].
#[instrument(skip_all, fields(pages = pages.len(), directives = directives.len(), right_to_left))]
pub fn apply_directives<B: PageBackend>(
    backend: &mut B,
    pages: Vec<B::Page>,
    directives: &[PageDirective],
    right_to_left: bool,
) -> Result<Vec<B::Page>> {
    let mut slots: Vec<Option<B::Page>> = pages.into_iter().map(Some).collect();

    for directive in directives {
        let page = directive.page;
        let first = slot_index(page, slots.len())?;
        debug!(%directive, slot = first, "Applying directive");

        match directive.operation {
            Operation::Delete => {
                let removed = slots[first]
                    .take()
                    .ok_or(SpreadStitchError::PageUnavailable { page })?;
                backend.remove(removed)?;
            }
            Operation::RotateLeft | Operation::RotateRight => {
                let target = slots[first]
                    .as_mut()
                    .ok_or(SpreadStitchError::PageUnavailable { page })?;
                if let Some(rotation) = directive.operation.rotation() {
                    backend.rotate(target, rotation)?;
                }
            }
            Operation::Stitch | Operation::StitchRotateLeft | Operation::StitchRotateRight => {
                // Page 0 pairs the back cover with the front cover.
                let second = if page == 0 { 0 } else { page as usize };
                let next_page = page.saturating_add(1);
                let first_page = slots
                    .get(first)
                    .cloned()
                    .flatten()
                    .ok_or(SpreadStitchError::PageUnavailable { page })?;
                let second_page = slots
                    .get(second)
                    .cloned()
                    .flatten()
                    .ok_or(SpreadStitchError::PageUnavailable { page: next_page })?;

                let (left, right) = if right_to_left {
                    (&second_page, &first_page)
                } else {
                    (&first_page, &second_page)
                };

                let mut merged = first_page.clone();
                backend.stitch(left, right, directive.operation.rotation(), &mut merged)?;
                slots[first] = Some(merged);

                if page != 0 {
                    if let Some(consumed) = slots[second].take() {
                        backend.remove(consumed)?;
                    }
                }
            }
        }
    }

    let result: Vec<B::Page> = slots.into_iter().flatten().collect();
    info!(remaining = result.len(), "Directives applied");
    Ok(result)
}

/// Position of the page a directive acts on. Page 0 is the last page.
fn slot_index(page: u32, len: usize) -> Result<usize> {
    let index = if page == 0 {
        len.checked_sub(1)
    } else {
        Some(page as usize - 1)
    };
    index
        .filter(|&index| index < len)
        .ok_or(SpreadStitchError::PageUnavailable { page })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pages are labels; a stitch writes "left+right", rotations append
    /// "<" or ">".
    #[derive(Default)]
    struct LabelBackend {
        removed: Vec<String>,
    }

    impl PageBackend for LabelBackend {
        type Page = String;

        fn rotate(&mut self, page: &mut String, rotation: Rotation) -> Result<()> {
            page.push(match rotation {
                Rotation::Left => '<',
                Rotation::Right => '>',
            });
            Ok(())
        }

        fn stitch(
            &mut self,
            left: &String,
            right: &String,
            rotation: Option<Rotation>,
            target: &mut String,
        ) -> Result<()> {
            *target = format!("{left}+{right}");
            if let Some(rotation) = rotation {
                self.rotate(target, rotation)?;
            }
            Ok(())
        }

        fn remove(&mut self, page: String) -> Result<()> {
            self.removed.push(page);
            Ok(())
        }
    }

    fn book(count: usize) -> Vec<String> {
        (1..=count).map(|n| format!("p{n}")).collect()
    }

    fn run(count: usize, directives: &[(u32, Operation)], rtl: bool) -> (Vec<String>, Vec<String>) {
        let directives: Vec<PageDirective> = directives
            .iter()
            .map(|&(page, op)| PageDirective::new(page, op))
            .collect();
        let mut backend = LabelBackend::default();
        let pages = apply_directives(&mut backend, book(count), &directives, rtl).expect("apply");
        (pages, backend.removed)
    }

    #[test]
    fn stitch_merges_page_with_successor() {
        let (pages, removed) = run(10, &[(5, Operation::Stitch)], false);
        assert_eq!(pages.len(), 9);
        assert_eq!(pages[4], "p5+p6");
        assert_eq!(pages[5], "p7");
        assert_eq!(removed, vec!["p6"]);
    }

    #[test]
    fn manga_mode_swaps_placement() {
        let (pages, _) = run(10, &[(5, Operation::Stitch)], true);
        assert_eq!(pages[4], "p6+p5");
    }

    #[test]
    fn directives_address_original_positions() {
        let (pages, _) = run(
            10,
            &[
                (2, Operation::Stitch),
                (4, Operation::RotateLeft),
                (6, Operation::Stitch),
            ],
            false,
        );
        assert_eq!(
            pages,
            vec!["p1", "p2+p3", "p4<", "p5", "p6+p7", "p8", "p9", "p10"]
        );
    }

    #[test]
    fn stitch_then_rotate() {
        let (pages, _) = run(
            6,
            &[(1, Operation::StitchRotateLeft), (3, Operation::StitchRotateRight)],
            false,
        );
        assert_eq!(pages, vec!["p1+p2<", "p3+p4>", "p5", "p6"]);
    }

    #[test]
    fn delete_range_removes_pages() {
        let (pages, removed) = run(
            8,
            &[
                (3, Operation::Delete),
                (4, Operation::Delete),
                (5, Operation::Delete),
            ],
            false,
        );
        assert_eq!(pages, vec!["p1", "p2", "p6", "p7", "p8"]);
        assert_eq!(removed, vec!["p3", "p4", "p5"]);
    }

    #[test]
    fn back_cover_stitch_keeps_page_count() {
        let (pages, removed) = run(5, &[(0, Operation::Stitch)], false);
        assert_eq!(pages, vec!["p1", "p2", "p3", "p4", "p5+p1"]);
        assert!(removed.is_empty());
    }

    #[test]
    fn back_cover_stitch_right_to_left() {
        let (pages, _) = run(4, &[(0, Operation::Stitch)], true);
        assert_eq!(pages, vec!["p1", "p2", "p3", "p1+p4"]);
    }

    #[test]
    fn back_cover_rotation_turns_last_page() {
        let (pages, _) = run(3, &[(0, Operation::RotateRight)], false);
        assert_eq!(pages, vec!["p1", "p2", "p3>"]);
    }

    #[test]
    fn mixed_operations_on_one_book() {
        let (pages, _) = run(
            15,
            &[
                (2, Operation::Stitch),
                (4, Operation::StitchRotateLeft),
                (6, Operation::RotateLeft),
                (8, Operation::RotateRight),
                (10, Operation::StitchRotateRight),
                (12, Operation::Delete),
                (14, Operation::Stitch),
            ],
            false,
        );
        assert_eq!(
            pages,
            vec![
                "p1", "p2+p3", "p4+p5<", "p6<", "p7", "p8>", "p9", "p10+p11>", "p13",
                "p14+p15"
            ]
        );
    }

    #[test]
    fn consumed_page_is_unavailable() {
        let directives = [
            PageDirective::new(2, Operation::Stitch),
            PageDirective::new(3, Operation::RotateLeft),
        ];
        let mut backend = LabelBackend::default();
        let err = apply_directives(&mut backend, book(5), &directives, false).unwrap_err();
        assert!(matches!(err, SpreadStitchError::PageUnavailable { page: 3 }));
    }

    #[test]
    fn range_check_uses_pair_for_last_stitch() {
        let stitch = [PageDirective::new(10, Operation::Stitch)];
        assert!(ensure_pages_present("Book", &stitch, 11).is_ok());
        let err = ensure_pages_present("Book", &stitch, 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Book skipped because the last page to process is past the end of the book."
        );

        let delete = [PageDirective::new(10, Operation::Delete)];
        assert!(ensure_pages_present("Book", &delete, 10).is_ok());
        assert!(ensure_pages_present("Book", &delete, 9).is_err());
    }

    #[test]
    fn range_check_rejects_back_cover_on_empty_book() {
        let back = [PageDirective::new(0, Operation::Stitch)];
        assert!(ensure_pages_present("Book", &back, 0).is_err());
        assert!(ensure_pages_present("Book", &back, 1).is_ok());
    }
}
