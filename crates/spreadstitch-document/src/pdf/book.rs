// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF book: rotate pages, stitch page pairs onto one wide page, and rebuild
// the page tree using the `lopdf` crate.

use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use spreadstitch_core::error::SpreadStitchError;
use spreadstitch_core::{PageBackend, Rotation};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains.
const MAX_TREE_DEPTH: usize = 64;

/// An open PDF whose pages are edited through [`PageBackend`].
///
/// Pages are addressed by their object id. Stitched pages are new page
/// objects that draw both halves as Form XObjects, so the page sequence
/// handed back by the applier must be passed to [`PdfBook::save`] to become
/// the document's page order.
pub struct PdfBook {
    document: Document,
}

impl PdfBook {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SpreadStitchError> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let document = Document::load(path_ref).map_err(|err| {
            SpreadStitchError::PdfError(format!("failed to open {}: {}", path_ref.display(), err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded");

        Ok(Self { document })
    }

    /// Wrap a document already in memory.
    pub fn from_document(document: Document) -> Self {
        Self { document }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document's page tree.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Page object ids in reading order.
    pub fn pages(&self) -> Vec<ObjectId> {
        self.document.get_pages().into_values().collect()
    }

    /// The underlying lopdf document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Effective `/Rotate` of a page in degrees, 0 when unset.
    pub fn rotation(&self, page: ObjectId) -> i64 {
        self.inherited(page, b"Rotate")
            .and_then(|value| value.as_i64().ok())
            .unwrap_or(0)
    }

    /// Width and height of a page's MediaBox in points.
    pub fn page_size(&self, page: ObjectId) -> Result<(f32, f32), SpreadStitchError> {
        let [x0, y0, x1, y1] = self.media_box(page)?;
        Ok((x1 - x0, y1 - y0))
    }

    // -- Output ---------------------------------------------------------------

    /// Make `pages` the document's page order. In right-to-left mode the
    /// catalog asks viewers to page from right to left.
    ///
    /// The page tree is flattened to a single `/Pages` node, so inherited
    /// attributes are first copied onto each page.
    #[instrument(skip(self, pages), fields(pages = pages.len()))]
    pub fn rebuild_page_tree(
        &mut self,
        pages: &[ObjectId],
        right_to_left: bool,
    ) -> Result<(), SpreadStitchError> {
        for &page in pages {
            for key in INHERITABLE {
                let present = self.page_dict(page)?.has(key);
                if present {
                    continue;
                }
                if let Some(value) = self.inherited(page, key) {
                    self.page_dict_mut(page)?.set(key.to_vec(), value);
                }
            }
        }

        let root_id = self.pages_root()?;
        for &page in pages {
            self.page_dict_mut(page)?.set("Parent", root_id);
        }

        let kids: Vec<Object> = pages.iter().map(|&id| Object::Reference(id)).collect();
        let root = self.page_dict_mut(root_id)?;
        root.set("Kids", kids);
        root.set("Count", pages.len() as i64);

        if right_to_left {
            let catalog = self.document.catalog_mut().map_err(|err| {
                SpreadStitchError::PdfError(format!("no catalog: {}", err))
            })?;
            let mut preferences = match catalog.get(b"ViewerPreferences") {
                Ok(Object::Dictionary(existing)) => existing.clone(),
                _ => Dictionary::new(),
            };
            preferences.set("Direction", Object::Name(b"R2L".to_vec()));
            catalog.set("ViewerPreferences", preferences);
            debug!("Reading direction set to right-to-left");
        }

        Ok(())
    }

    /// Rebuild the page tree from `pages`, drop unreachable objects, and write
    /// the document to `path`.
    #[instrument(skip(self, pages), fields(path = %path.as_ref().display()))]
    pub fn save(
        &mut self,
        pages: &[ObjectId],
        right_to_left: bool,
        path: impl AsRef<Path>,
    ) -> Result<(), SpreadStitchError> {
        let path = path.as_ref();
        self.rebuild_page_tree(pages, right_to_left)?;

        let pruned = self.document.prune_objects();
        self.document.compress();
        self.document.save(path).map_err(|err| {
            SpreadStitchError::PdfError(format!("failed to write {}: {}", path.display(), err))
        })?;

        info!(pages = pages.len(), pruned = pruned.len(), "PDF saved");
        Ok(())
    }

    // -- Helpers --------------------------------------------------------------

    fn page_dict(&self, page: ObjectId) -> Result<&Dictionary, SpreadStitchError> {
        self.document.get_dictionary(page).map_err(|err| {
            SpreadStitchError::PdfError(format!("cannot read page object {:?}: {}", page, err))
        })
    }

    fn page_dict_mut(&mut self, page: ObjectId) -> Result<&mut Dictionary, SpreadStitchError> {
        self.document.get_dictionary_mut(page).map_err(|err| {
            SpreadStitchError::PdfError(format!("cannot modify page object {:?}: {}", page, err))
        })
    }

    fn pages_root(&self) -> Result<ObjectId, SpreadStitchError> {
        self.document
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|err| SpreadStitchError::PdfError(format!("no /Pages root: {}", err)))
    }

    /// Look `key` up on the page, then on its ancestors.
    fn inherited(&self, page: ObjectId, key: &[u8]) -> Option<Object> {
        let mut node = page;
        for _ in 0..MAX_TREE_DEPTH {
            let dict = self.document.get_dictionary(node).ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value.clone());
            }
            node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        }
        None
    }

    /// Follow a single indirect reference.
    fn resolve(&self, object: Object) -> Result<Object, SpreadStitchError> {
        match object {
            Object::Reference(id) => self.document.get_object(id).cloned().map_err(|err| {
                SpreadStitchError::PdfError(format!("cannot resolve {:?}: {}", id, err))
            }),
            other => Ok(other),
        }
    }

    /// MediaBox as `[llx, lly, urx, ury]`, normalised so the first corner is
    /// the lower left.
    fn media_box(&self, page: ObjectId) -> Result<[f32; 4], SpreadStitchError> {
        let raw = self.inherited(page, b"MediaBox").ok_or_else(|| {
            SpreadStitchError::PdfError(format!("page {:?} has no MediaBox", page))
        })?;
        let array = match self.resolve(raw)? {
            Object::Array(items) if items.len() == 4 => items,
            other => {
                return Err(SpreadStitchError::PdfError(format!(
                    "malformed MediaBox on page {:?}: {:?}",
                    page, other
                )));
            }
        };

        let mut values = [0.0f32; 4];
        for (slot, item) in values.iter_mut().zip(array) {
            *slot = self.resolve(item)?.as_float().map_err(|err| {
                SpreadStitchError::PdfError(format!("non-numeric MediaBox on {:?}: {}", page, err))
            })?;
        }
        let [ax, ay, bx, by] = values;
        Ok([ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)])
    }

    /// Wrap a page's content and resources as a Form XObject whose origin is
    /// the page's lower-left corner.
    fn page_as_form(&mut self, page: ObjectId, media: [f32; 4]) -> Result<ObjectId, SpreadStitchError> {
        if self.rotation(page) != 0 {
            warn!(?page, rotation = self.rotation(page), "Page rotation is not carried into stitched page");
        }

        let content = self.document.get_page_content(page).map_err(|err| {
            SpreadStitchError::PdfError(format!("cannot read content of {:?}: {}", page, err))
        })?;
        let resources = self
            .inherited(page, b"Resources")
            .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));

        let form = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => Object::Integer(1),
            "BBox" => Object::Array(media.iter().map(|&v| Object::Real(v)).collect()),
            "Matrix" => Object::Array(vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Real(-media[0]),
                Object::Real(-media[1]),
            ]),
            "Resources" => resources,
        };
        Ok(self.document.add_object(Stream::new(form, content)))
    }
}

impl PageBackend for PdfBook {
    type Page = ObjectId;

    #[instrument(skip(self))]
    fn rotate(&mut self, page: &mut ObjectId, rotation: Rotation) -> Result<(), SpreadStitchError> {
        let existing = self.rotation(*page);
        let updated = (existing + rotation.clockwise_degrees()).rem_euclid(360);
        self.page_dict_mut(*page)?.set("Rotate", Object::Integer(updated));
        debug!(existing, updated, "Page rotated");
        Ok(())
    }

    /// The merged page is as wide as both halves together and as tall as the
    /// taller one; both halves hang from the top edge.
    #[instrument(skip(self, target))]
    fn stitch(
        &mut self,
        left: &ObjectId,
        right: &ObjectId,
        rotation: Option<Rotation>,
        target: &mut ObjectId,
    ) -> Result<(), SpreadStitchError> {
        let left_box = self.media_box(*left)?;
        let right_box = self.media_box(*right)?;
        let (left_w, left_h) = (left_box[2] - left_box[0], left_box[3] - left_box[1]);
        let (right_w, right_h) = (right_box[2] - right_box[0], right_box[3] - right_box[1]);
        let width = left_w + right_w;
        let height = left_h.max(right_h);

        let left_form = self.page_as_form(*left, left_box)?;
        let right_form = self.page_as_form(*right, right_box)?;

        let content = format!(
            "q 1 0 0 1 0 {} cm /SpreadLeft Do Q\nq 1 0 0 1 {} {} cm /SpreadRight Do Q\n",
            height - left_h,
            left_w,
            height - right_h
        );
        let contents_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let mut merged = dictionary! {
            "Type" => "Page",
            "MediaBox" => Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ]),
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "SpreadLeft" => left_form,
                    "SpreadRight" => right_form,
                },
            },
            "Contents" => contents_id,
        };
        if let Some(rotation) = rotation {
            merged.set("Rotate", Object::Integer(rotation.clockwise_degrees()));
        }

        *target = self.document.add_object(merged);
        info!(width, height, merged = ?*target, "Pages stitched");
        Ok(())
    }

    fn remove(&mut self, page: ObjectId) -> Result<(), SpreadStitchError> {
        self.document.objects.remove(&page);
        debug!(?page, "Page removed");
        Ok(())
    }
}
