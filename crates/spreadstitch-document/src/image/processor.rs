// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: quarter-turn rotation, seam-aware side-by-side stitching,
// and right-column trimming of comic pages using the `image` crate.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, imageops};
use spreadstitch_core::error::SpreadStitchError;
use spreadstitch_core::{OverlapPolicy, Rotation};
use tracing::{debug, info, instrument};

/// Quality used when a page is re-encoded as JPEG.
const JPEG_QUALITY: u8 = 95;

/// Background for the strip below a shorter page in a stitched spread.
const PAD_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);

/// Image processing pipeline operating on a single in-memory page.
///
/// Each transformation consumes `self` and returns a new `ImageProcessor`, so
/// operations chain:
///
/// ```ignore
/// ImageProcessor::open("007.jpg")?
///     .stitch(ImageProcessor::open("008.jpg")?, &policy)
///     .rotate_quarter(Rotation::Left)
///     .save("007.jpg")?;
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SpreadStitchError> {
        let img = image::open(path.as_ref()).map_err(|err| {
            SpreadStitchError::ImageError(format!(
                "failed to open {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        debug!(width = img.width(), height = img.height(), "Image loaded");
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Lossless 90 degree turn.
    #[instrument(skip(self))]
    pub fn rotate_quarter(self, rotation: Rotation) -> Self {
        let image = match rotation {
            Rotation::Left => self.image.rotate270(),
            Rotation::Right => self.image.rotate90(),
        };
        Self { image }
    }

    /// Drop the rightmost pixel column. Images one pixel wide are returned
    /// unchanged.
    pub fn trim_right_column(self) -> Self {
        let (width, height) = (self.width(), self.height());
        if width <= 1 {
            debug!(width, "Image too narrow to trim");
            return self;
        }
        Self {
            image: self.image.crop_imm(0, 0, width - 1, height),
        }
    }

    /// Place `right` beside this page, cutting the duplicated strip a scanner
    /// or splitter often leaves at the seam.
    ///
    /// The seam is the first column from the right edge of this page that
    /// matches `right`'s first column within `policy.fuzz` (see
    /// [`find_seam`]); everything from that column rightward is dropped. When
    /// no column matches, the pages are joined whole. The result is RGB8.
    /// Pages of different heights are top-aligned on a white canvas.
    #[instrument(skip_all, fields(columns = policy.columns, fuzz = policy.fuzz))]
    pub fn stitch(self, right: ImageProcessor, policy: &OverlapPolicy) -> Self {
        let left = self.image.to_rgb8();
        let right = right.image.to_rgb8();

        let keep = match find_seam(&left, &right, policy) {
            Some(column) => {
                info!(column, trimmed = left.width() - column, "Overlapping seam found");
                column
            }
            None => {
                debug!("No seam found, joining full pages");
                left.width()
            }
        };

        let height = left.height().max(right.height());
        let mut canvas = RgbImage::from_pixel(keep + right.width(), height, PAD_COLOUR);
        let left_part = imageops::crop_imm(&left, 0, 0, keep, left.height()).to_image();
        imageops::replace(&mut canvas, &left_part, 0, 0);
        imageops::replace(&mut canvas, &right, i64::from(keep), 0);

        Self {
            image: DynamicImage::ImageRgb8(canvas),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Write the image to a file. The format is inferred from the file
    /// extension; JPEG output is always 8-bit without alpha.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SpreadStitchError> {
        let path = path.as_ref();
        let fail = |err: image::ImageError| {
            SpreadStitchError::ImageError(format!(
                "failed to save image to {}: {}",
                path.display(),
                err
            ))
        };

        match ImageFormat::from_path(path) {
            Ok(ImageFormat::Jpeg) => {
                let file = std::fs::File::create(path)?;
                let encoder =
                    JpegEncoder::new_with_quality(std::io::BufWriter::new(file), JPEG_QUALITY);
                match &self.image {
                    DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => {
                        self.image.write_with_encoder(encoder)
                    }
                    other => other.to_rgb8().write_with_encoder(encoder),
                }
                .map_err(fail)
            }
            _ => self.image.save(path).map_err(fail),
        }
    }
}

/// Find where `right` starts repeating the tail of `left`.
///
/// Scans at most `policy.columns` columns leftward from the right edge of
/// `left`, never reaching column 0, and returns the first column whose every
/// channel is within `policy.fuzz` of `right`'s first column. Returns `None`
/// when the search is disabled, the heights differ, or nothing matches.
pub fn find_seam(left: &RgbImage, right: &RgbImage, policy: &OverlapPolicy) -> Option<u32> {
    if policy.columns == 0 || right.width() == 0 || left.height() != right.height() {
        return None;
    }

    let width = left.width();
    let span = policy.columns.min(width.saturating_sub(1));
    let fuzz = i32::from(policy.fuzz);

    (1..=span).map(|offset| width - offset).find(|&column| {
        (0..left.height()).all(|y| {
            let l = left.get_pixel(column, y).0;
            let r = right.get_pixel(0, y).0;
            l.iter()
                .zip(r.iter())
                .all(|(&a, &b)| (i32::from(a) - i32::from(b)).abs() <= fuzz)
        })
    })
}
