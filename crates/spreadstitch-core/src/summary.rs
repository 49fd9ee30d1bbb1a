// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result summary: which final page numbers of a book were altered.

use crate::types::{Operation, PageDirective};

/// Describe the outcome of applying `directives` to the book `label`.
///
/// Page numbers are reported as they read in the finished book, shifted down
/// by every delete and stitch that happened before them.
pub fn summarize(label: &str, directives: &[PageDirective]) -> String {
    let mut deleted: u32 = 0;
    let mut back_cover = false;
    let mut altered: Vec<u32> = Vec::new();

    for directive in directives {
        let page = directive.page;
        match directive.operation {
            Operation::Delete => deleted += 1,
            _ if directive.is_back_cover() => back_cover = true,
            Operation::RotateLeft | Operation::RotateRight => {
                altered.push(page.saturating_sub(deleted));
            }
            Operation::Stitch | Operation::StitchRotateLeft | Operation::StitchRotateRight => {
                altered.push(page.saturating_sub(deleted));
                deleted += 1;
            }
        }
    }

    if altered.is_empty() && !back_cover {
        return format!("{label} has had {deleted} pages deleted.");
    }

    let mut phrase = String::new();
    if back_cover {
        phrase.push_str("the back cover");
        if !altered.is_empty() {
            phrase.push_str(" and ");
        }
    }
    phrase.push_str(&page_phrase(&altered));

    format!("{label} successfully altered on {phrase}.")
}

/// "page 4", "pages 4 and 6", "pages 2, 3, and 5". Empty for no pages.
fn page_phrase(pages: &[u32]) -> String {
    match pages {
        [] => String::new(),
        [only] => format!("page {only}"),
        [first, second] => format!("pages {first} and {second}"),
        [init @ .., last] => {
            let head: Vec<String> = init.iter().map(u32::to_string).collect();
            format!("pages {}, and {last}", head.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse_page_list;

    fn summary_for(list: &str) -> String {
        let directives = parse_page_list(list, "Test.cbz").expect("parse");
        summarize("Test.cbz", &directives)
    }

    #[test]
    fn single_page() {
        assert_eq!(summary_for("7"), "Test.cbz successfully altered on page 7.");
    }

    #[test]
    fn two_rotation_and_stitch() {
        assert_eq!(
            summary_for("4l,6"),
            "Test.cbz successfully altered on pages 4 and 6."
        );
    }

    #[test]
    fn stitches_shift_later_pages() {
        assert_eq!(
            summary_for("2,4l,6"),
            "Test.cbz successfully altered on pages 2, 3, and 5."
        );
    }

    #[test]
    fn stitch_then_rotate_counts_as_one_stitch() {
        let directives = [
            PageDirective::new(2, Operation::Stitch),
            PageDirective::new(4, Operation::StitchRotateLeft),
            PageDirective::new(6, Operation::Stitch),
        ];
        assert_eq!(
            summarize("Book", &directives),
            "Book successfully altered on pages 2, 3, and 4."
        );
    }

    #[test]
    fn all_modifiers() {
        assert_eq!(
            summary_for("2,4m,6l,8r,10s,12d,14"),
            "Test.cbz successfully altered on pages 2, 3, 4, 6, 8, and 10."
        );
    }

    #[test]
    fn back_cover_with_pages() {
        assert_eq!(
            summary_for("0,2,4"),
            "Test.cbz successfully altered on the back cover and pages 2 and 3."
        );
    }

    #[test]
    fn back_cover_alone() {
        assert_eq!(
            summary_for("0"),
            "Test.cbz successfully altered on the back cover."
        );
    }

    #[test]
    fn deletes_only() {
        assert_eq!(summary_for("3-5d"), "Test.cbz has had 3 pages deleted.");
    }

    #[test]
    fn deletes_shift_rotations() {
        assert_eq!(
            summary_for("1d,2d,5r"),
            "Test.cbz successfully altered on page 3."
        );
    }
}
