// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for SpreadStitch.

use serde::{Deserialize, Serialize};

/// A quarter turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    /// 90 degrees counterclockwise.
    Left,
    /// 90 degrees clockwise.
    Right,
}

impl Rotation {
    /// The turn expressed as clockwise degrees, the convention of the PDF
    /// `/Rotate` key.
    pub fn clockwise_degrees(self) -> i64 {
        match self {
            Self::Left => 270,
            Self::Right => 90,
        }
    }
}

/// What to do with the page (or page pair) a directive addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Merge the page with its successor. Written as a bare number.
    Stitch,
    /// `l`
    RotateLeft,
    /// `r`
    RotateRight,
    /// `m`: stitch, then rotate the merged page counterclockwise.
    StitchRotateLeft,
    /// `s`: stitch, then rotate the merged page clockwise.
    StitchRotateRight,
    /// `d`
    Delete,
}

impl Operation {
    /// Map a trailing modifier character to its operation.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'l' => Some(Self::RotateLeft),
            'r' => Some(Self::RotateRight),
            'm' => Some(Self::StitchRotateLeft),
            's' => Some(Self::StitchRotateRight),
            'd' => Some(Self::Delete),
            _ => None,
        }
    }

    /// The modifier character, or `None` for a plain stitch.
    pub fn code(self) -> Option<char> {
        match self {
            Self::Stitch => None,
            Self::RotateLeft => Some('l'),
            Self::RotateRight => Some('r'),
            Self::StitchRotateLeft => Some('m'),
            Self::StitchRotateRight => Some('s'),
            Self::Delete => Some('d'),
        }
    }

    /// Whether the operation merges the page with the one after it.
    pub fn is_stitch(self) -> bool {
        matches!(
            self,
            Self::Stitch | Self::StitchRotateLeft | Self::StitchRotateRight
        )
    }

    /// Rotation applied by this operation, either to a single page or to the
    /// merged result of a stitch.
    pub fn rotation(self) -> Option<Rotation> {
        match self {
            Self::RotateLeft | Self::StitchRotateLeft => Some(Rotation::Left),
            Self::RotateRight | Self::StitchRotateRight => Some(Rotation::Right),
            Self::Stitch | Self::Delete => None,
        }
    }
}

/// One parsed entry of a page list.
///
/// `page` is 1-based. `0` is the back-cover sentinel: it addresses the last
/// page, and a stitch at `0` pairs the back cover with the front cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageDirective {
    pub page: u32,
    pub operation: Operation,
}

impl PageDirective {
    /// Directive for `page` (0 for the back cover).
    pub fn new(page: u32, operation: Operation) -> Self {
        Self { page, operation }
    }

    /// True for the page-0 sentinel.
    pub fn is_back_cover(&self) -> bool {
        self.page == 0
    }

    /// Minimum number of pages the book needs for this directive to apply.
    pub fn pages_required(&self) -> usize {
        let page = self.page as usize;
        if page == 0 {
            1
        } else if self.operation.is_stitch() {
            page + 1
        } else {
            page
        }
    }
}

impl std::fmt::Display for PageDirective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.operation.code() {
            Some(code) => write!(f, "{}{}", self.page, code),
            None => write!(f, "{}", self.page),
        }
    }
}

/// Overlap compensation used when two raster pages are stitched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapPolicy {
    /// How many of the left page's rightmost columns to search. `0` disables
    /// the search.
    pub columns: u32,
    /// Largest per-channel difference that still counts as a matching column.
    pub fuzz: u16,
}

impl OverlapPolicy {
    /// A policy that never searches for a seam.
    pub fn disabled() -> Self {
        Self {
            columns: 0,
            fuzz: 0,
        }
    }
}

/// Container format of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookFormat {
    Cbz,
    Epub,
    Pdf,
}

impl BookFormat {
    /// Lowercase file extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Cbz => "cbz",
            Self::Epub => "epub",
            Self::Pdf => "pdf",
        }
    }

    /// Extension of the backup written before a book is altered.
    pub fn backup_extension(self) -> String {
        format!("{}_old", self.extension())
    }

    /// Name used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Cbz => "CBZ",
            Self::Epub => "ePub",
            Self::Pdf => "PDF",
        }
    }
}

impl std::fmt::Display for BookFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Options given after the page list on an input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFlags {
    /// Right-to-left reading order; swaps stitch placement.
    pub manga: bool,
    /// A `_old` backup already exists and should be kept as is.
    pub backed_up: bool,
    pub epub: bool,
    pub pdf: bool,
    /// Crop the rightmost pixel column from every page.
    pub right_lines: bool,
    /// Flags that matched nothing above.
    pub unknown: Vec<String>,
}

impl BookFlags {
    /// Collect flags from the trailing `|`-separated fields of a line.
    /// Empty fields are ignored.
    pub fn parse<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut flags = Self::default();
        for field in fields {
            match field.trim() {
                "" => {}
                "manga" => flags.manga = true,
                "backedup" => flags.backed_up = true,
                "epub" => flags.epub = true,
                "pdf" => flags.pdf = true,
                "rightlines" => flags.right_lines = true,
                other => flags.unknown.push(other.to_string()),
            }
        }
        flags
    }

    /// Book format selected by the flags; `epub` wins over `pdf`.
    pub fn format(&self) -> BookFormat {
        if self.epub {
            BookFormat::Epub
        } else if self.pdf {
            BookFormat::Pdf
        } else {
            BookFormat::Cbz
        }
    }
}
