// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ePub book: walk the spine with the `epub` crate, collect the page images
// each spine document shows, and lay them out as CBZ pages.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use epub::doc::EpubDoc;
use regex::Regex;
use spreadstitch_core::error::{Result, SpreadStitchError};
use tracing::{debug, info, instrument, warn};

use crate::archive::{ArchiveEntry, ComicArchive, is_page_name};

/// `<img src>` in XHTML pages and `<image xlink:href>` in SVG-wrapped pages.
const IMAGE_REF_PATTERN: &str =
    r#"(?is)<(?:img|image)\b[^>]*?\b(?:src|xlink:href|href)\s*=\s*["']([^"']+)["']"#;

/// An open ePub whose page images are read in spine order.
pub struct EpubBook {
    doc: EpubDoc<BufReader<File>>,
}

impl EpubBook {
    /// Open an ePub from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let doc = EpubDoc::new(path).map_err(|err| {
            SpreadStitchError::EpubError(format!("failed to open {}: {}", path.display(), err))
        })?;
        info!("ePub opened");
        Ok(Self { doc })
    }

    /// Archive paths of the page images, in reading order.
    ///
    /// Spine items that are images themselves count as pages. Other spine
    /// items contribute every image they reference, in document order.
    pub fn image_paths(&mut self) -> Result<Vec<PathBuf>> {
        let pattern = Regex::new(IMAGE_REF_PATTERN)
            .map_err(|err| SpreadStitchError::EpubError(format!("bad image pattern: {}", err)))?;

        let mut images = Vec::new();
        loop {
            if let Some(item) = self.doc.get_current_path() {
                let mime = self.doc.get_current_mime().unwrap_or_default();
                if mime.starts_with("image/") {
                    images.push(item);
                } else if let Some((markup, _)) = self.doc.get_current_str() {
                    let base = item.parent().unwrap_or_else(|| Path::new(""));
                    let before = images.len();
                    images.extend(
                        pattern
                            .captures_iter(&markup)
                            .filter_map(|caps| caps.get(1))
                            .filter_map(|href| resolve_href(base, href.as_str())),
                    );
                    debug!(item = %item.display(), found = images.len() - before, "Spine item scanned");
                } else {
                    warn!(item = %item.display(), "Spine item could not be read as text");
                }
            }
            if !self.doc.go_next() {
                break;
            }
        }
        Ok(images)
    }

    /// Write the page images below `dest` as `0.jpg`, `1.png`, ... (zero
    /// padded to a common width) and return them as an archive.
    ///
    /// References to non-raster files such as SVG artwork are left out.
    #[instrument(skip_all, fields(dest = %dest.as_ref().display()))]
    pub fn extract_pages(&mut self, dest: impl AsRef<Path>) -> Result<ComicArchive> {
        let dest = dest.as_ref();
        let images: Vec<PathBuf> = self
            .image_paths()?
            .into_iter()
            .filter(|path| {
                let keep = is_page_name(path);
                if !keep {
                    warn!(image = %path.display(), "Skipping non-raster image");
                }
                keep
            })
            .collect();
        if images.is_empty() {
            return Err(SpreadStitchError::EpubError(
                "no page images found in the reading order".into(),
            ));
        }

        std::fs::create_dir_all(dest)?;
        let width = (images.len() - 1).to_string().len();
        let mut pages = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            let bytes = self.doc.get_resource_by_path(image).ok_or_else(|| {
                SpreadStitchError::EpubError(format!("missing resource {}", image.display()))
            })?;
            let ext = image
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            let name = format!("{index:0width$}.{ext}");
            let path = dest.join(&name);
            std::fs::write(&path, bytes)?;
            pages.push(ArchiveEntry { name, path });
        }

        info!(pages = pages.len(), "ePub pages extracted");
        Ok(ComicArchive::from_pages(pages))
    }
}

/// Where the CBZ made from `epub` goes: `Saga.epub` becomes `Saga.cbz`.
pub fn cbz_path(epub: &Path) -> PathBuf {
    epub.with_extension("cbz")
}

/// Resolve `href` against the folder of the document that references it.
/// Remote and inline images resolve to nothing.
fn resolve_href(base: &Path, href: &str) -> Option<PathBuf> {
    if href.starts_with("data:") || href.contains("://") {
        return None;
    }
    let href = href.split(['#', '?']).next()?;

    let mut resolved = PathBuf::new();
    for component in base.join(href).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::ParentDir => {
                resolved.pop();
            }
            _ => {}
        }
    }
    (!resolved.as_os_str().is_empty()).then_some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const CONTAINER: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

    fn png(width: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, 8, Rgb([0, 0, 0])))
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    fn xhtml(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:xlink="http://www.w3.org/1999/xlink">
<head><title>page</title></head>
<body>{body}</body>
</html>"#
        )
    }

    /// Write an ePub whose spine lists `spine` (manifest id, href, media
    /// type) and whose archive also holds `files`.
    fn write_epub(path: &Path, spine: &[(&str, &str, &str)], files: &[(&str, Vec<u8>)]) {
        let manifest: String = spine
            .iter()
            .map(|(id, href, mime)| format!(r#"<item id="{id}" href="{href}" media-type="{mime}"/>"#))
            .collect();
        let itemrefs: String = spine
            .iter()
            .map(|(id, _, _)| format!(r#"<itemref idref="{id}"/>"#))
            .collect();
        let opf = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="bookid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="bookid">urn:uuid:0d2c6a86-1f4e-4b8e-9a51-3c1e2f9b7a10</dc:identifier>
    <dc:title>Saga</dc:title>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>{manifest}</manifest>
  <spine>{itemrefs}</spine>
</package>"#
        );

        let mut writer = ZipWriter::new(File::create(path).expect("create epub"));
        let options = SimpleFileOptions::default();
        writer.start_file("mimetype", options).expect("mimetype");
        writer.write_all(b"application/epub+zip").expect("write mimetype");
        writer.start_file("META-INF/container.xml", options).expect("container");
        writer.write_all(CONTAINER.as_bytes()).expect("write container");
        writer.start_file("OEBPS/content.opf", options).expect("opf");
        writer.write_all(opf.as_bytes()).expect("write opf");
        for (name, bytes) in files {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(bytes).expect("write file");
        }
        writer.finish().expect("finish epub");
    }

    #[test]
    fn pages_follow_spine_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = dir.path().join("Saga.epub");
        let svg_page = xhtml(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><image width="10" height="8" xlink:href="../images/c.png"/></svg>"#,
        );
        write_epub(
            &book,
            &[
                ("p2", "text/p2.xhtml", "application/xhtml+xml"),
                ("p1", "text/p1.xhtml", "application/xhtml+xml"),
                ("p3", "text/p3.xhtml", "application/xhtml+xml"),
            ],
            &[
                ("OEBPS/text/p1.xhtml", xhtml(r#"<img src="../images/a.png" alt=""/>"#).into_bytes()),
                ("OEBPS/text/p2.xhtml", xhtml(r#"<p><img alt="" src='../images/b.png'/></p>"#).into_bytes()),
                ("OEBPS/text/p3.xhtml", svg_page.into_bytes()),
                ("OEBPS/images/a.png", png(10)),
                ("OEBPS/images/b.png", png(20)),
                ("OEBPS/images/c.png", png(30)),
            ],
        );

        let mut epub = EpubBook::open(&book).expect("open");
        let archive = epub.extract_pages(dir.path().join("work")).expect("extract");

        let names: Vec<&str> = archive.pages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["0.png", "1.png", "2.png"]);
        let widths: Vec<u32> = archive
            .pages()
            .iter()
            .map(|p| image::open(&p.path).expect("decode").width())
            .collect();
        assert_eq!(widths, vec![20, 10, 30]);
        assert!(archive.extras().is_empty());
    }

    #[test]
    fn image_spine_items_are_pages() {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = dir.path().join("Saga.epub");
        write_epub(
            &book,
            &[("cover", "cover.png", "image/png")],
            &[("OEBPS/cover.png", png(12))],
        );

        let mut epub = EpubBook::open(&book).expect("open");
        assert_eq!(
            epub.image_paths().expect("paths"),
            vec![PathBuf::from("OEBPS/cover.png")]
        );
    }

    #[test]
    fn book_without_images_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let book = dir.path().join("Saga.epub");
        write_epub(
            &book,
            &[("p1", "p1.xhtml", "application/xhtml+xml")],
            &[("OEBPS/p1.xhtml", xhtml("<p>No pictures here.</p>").into_bytes())],
        );

        let mut epub = EpubBook::open(&book).expect("open");
        let err = epub.extract_pages(dir.path().join("work")).unwrap_err();
        assert!(matches!(err, SpreadStitchError::EpubError(_)));
    }

    #[test]
    fn non_epub_fails_to_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let bogus = dir.path().join("Saga.epub");
        std::fs::write(&bogus, b"not an epub").expect("write");
        assert!(matches!(
            EpubBook::open(&bogus),
            Err(SpreadStitchError::EpubError(_))
        ));
    }

    #[test]
    fn hrefs_resolve_against_the_referencing_document() {
        let base = Path::new("OEBPS/text");
        assert_eq!(
            resolve_href(base, "../images/p1.jpg#frag"),
            Some(PathBuf::from("OEBPS/images/p1.jpg"))
        );
        assert_eq!(
            resolve_href(base, "p2.png"),
            Some(PathBuf::from("OEBPS/text/p2.png"))
        );
        assert_eq!(resolve_href(base, "https://example.com/a.png"), None);
        assert_eq!(resolve_href(base, "data:image/png;base64,AAAA"), None);
    }

    #[test]
    fn cbz_path_swaps_extension() {
        assert_eq!(
            cbz_path(Path::new("/books/Saga.epub")),
            PathBuf::from("/books/Saga.cbz")
        );
    }
}
