//! PDF merge/measure backend
//!
//! The aggregator talks to the merge backend through the [`MergeBackend`]
//! trait so the rollover logic can be exercised without real PDFs. The
//! production implementation, [`PdfMerger`], combines documents with `lopdf`:
//! appended documents' pages land after all previously appended content in
//! append order, each under a labeled outline bookmark, and the whole
//! artifact is rewritten and measured on every materialization — input byte
//! sums would misestimate the real size once shared resources are merged.

use crate::error::{MergeError, Result};
use lopdf::{Bookmark, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::path::Path;

/// Merge/measure operations the aggregator needs from a PDF backend
pub trait MergeBackend: Send {
    /// Append a document to the open artifact under a bookmark label.
    /// Returns the document's page count.
    fn append(&mut self, pdf: &Path, bookmark: &str) -> Result<u32>;

    /// Rewrite the combined artifact to `dest` and return its materialized
    /// size in bytes.
    fn write(&mut self, dest: &Path) -> Result<u64>;

    /// Discard all appended content, ready for the next chunk.
    fn reset(&mut self);
}

/// One appended document, kept as raw bytes until materialization
#[derive(Clone, Debug)]
struct Part {
    label: String,
    bytes: Vec<u8>,
}

/// Production merge backend built on `lopdf`
#[derive(Clone, Debug, Default)]
pub struct PdfMerger {
    parts: Vec<Part>,
}

impl PdfMerger {
    /// Create an empty merger
    pub fn new() -> Self {
        Self::default()
    }
}

impl MergeBackend for PdfMerger {
    fn append(&mut self, pdf: &Path, bookmark: &str) -> Result<u32> {
        let bytes = std::fs::read(pdf).map_err(|e| MergeError::Load {
            label: bookmark.to_string(),
            reason: e.to_string(),
        })?;
        // Validate up front so a malformed document fails at append time,
        // not when the whole chunk is materialized.
        let pages = page_count_with_label(&bytes, bookmark)?;
        self.parts.push(Part {
            label: bookmark.to_string(),
            bytes,
        });
        Ok(pages)
    }

    fn write(&mut self, dest: &Path) -> Result<u64> {
        let mut document = combine(&self.parts)?;
        document.save(dest).map_err(|e| MergeError::Write {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })?;
        let size = std::fs::metadata(dest)
            .map_err(|e| MergeError::Write {
                path: dest.to_path_buf(),
                reason: e.to_string(),
            })?
            .len();
        Ok(size)
    }

    fn reset(&mut self) {
        self.parts.clear();
    }
}

/// Count the pages of a PDF given its raw bytes
pub fn page_count(bytes: &[u8]) -> Result<u32> {
    page_count_with_label(bytes, "document")
}

fn page_count_with_label(bytes: &[u8], label: &str) -> Result<u32> {
    let document = Document::load_mem(bytes).map_err(|e| MergeError::Load {
        label: label.to_string(),
        reason: e.to_string(),
    })?;
    let pages = document.get_pages().len() as u32;
    if pages == 0 {
        return Err(MergeError::NoPages {
            label: label.to_string(),
        }
        .into());
    }
    Ok(pages)
}

/// Combine the appended parts into a single document with fresh Pages and
/// Catalog objects and one outline bookmark per part
fn combine(parts: &[Part]) -> Result<Document> {
    let mut max_id: u32 = 1;
    let mut combined_pages: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut combined_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut document = Document::with_version("1.5");

    for part in parts {
        let mut doc = Document::load_mem(&part.bytes).map_err(|e| MergeError::Load {
            label: part.label.clone(),
            reason: e.to_string(),
        })?;

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let mut first_page = true;
        for &page_id in doc.get_pages().values() {
            if first_page {
                // Bookmark the first page of each appended document
                let bookmark = Bookmark::new(part.label.clone(), [0.0, 0.0, 0.0], 0, page_id);
                document.add_bookmark(bookmark, None);
                first_page = false;
            }
            if let Ok(page_obj) = doc.get_object(page_id) {
                combined_pages.insert(page_id, page_obj.clone());
            }
        }

        for (object_id, object) in doc.objects {
            match object.type_name().unwrap_or(b"") {
                b"Catalog" | b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
                _ => {
                    combined_objects.insert(object_id, object);
                }
            }
        }
    }

    if combined_pages.is_empty() {
        return Err(MergeError::NoPages {
            label: "combined artifact".to_string(),
        }
        .into());
    }

    for (object_id, object) in combined_objects {
        document.objects.insert(object_id, object);
    }

    let pages_id = document.new_object_id();
    for (object_id, object) in &combined_pages {
        if let Object::Dictionary(dict) = object {
            let mut page_dict = dict.clone();
            page_dict.set("Parent", Object::Reference(pages_id));
            document
                .objects
                .insert(*object_id, Object::Dictionary(page_dict));
        }
    }

    let kids: Vec<Object> = combined_pages
        .keys()
        .map(|&id| Object::Reference(id))
        .collect();
    let pages_dict = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(combined_pages.len() as i64)),
    ]);
    document
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = document.new_object_id();
    let catalog_dict = lopdf::Dictionary::from_iter([
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    document
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    document.trailer.set("Root", Object::Reference(catalog_id));
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.adjust_zero_pages();

    if let Some(outline_id) = document.build_outline()
        && let Ok(root_id) = document
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
        && let Ok(Object::Dictionary(dict)) = document.get_object_mut(root_id)
    {
        dict.set("Outlines", Object::Reference(outline_id));
    }

    document.compress();
    Ok(document)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use lopdf::content::{Content, Operation};
    use lopdf::{Stream, dictionary};
    use std::path::PathBuf;

    /// Build a minimal real PDF with the given number of pages
    pub(crate) fn make_pdf(pages: usize, text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for i in 0..pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("{text} page {}", i + 1))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn write_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, make_pdf(pages, name)).unwrap();
        path
    }

    #[test]
    fn page_count_counts_pages() {
        assert_eq!(page_count(&make_pdf(1, "a")).unwrap(), 1);
        assert_eq!(page_count(&make_pdf(4, "b")).unwrap(), 4);
    }

    #[test]
    fn page_count_rejects_garbage() {
        let err = page_count(b"this is not a pdf").unwrap_err();
        assert!(matches!(err, Error::Merge(MergeError::Load { .. })));
    }

    #[test]
    fn append_returns_page_count() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = write_pdf(dir.path(), "three.pdf", 3);

        let mut merger = PdfMerger::new();
        assert_eq!(merger.append(&pdf, "Three Pages").unwrap(), 3);
    }

    #[test]
    fn append_rejects_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"garbage").unwrap();

        let mut merger = PdfMerger::new();
        let err = merger.append(&path, "Bad Paper").unwrap_err();
        assert!(err.to_string().contains("Bad Paper"));
    }

    #[test]
    fn write_merges_pages_in_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_pdf(dir.path(), "first.pdf", 2);
        let second = write_pdf(dir.path(), "second.pdf", 3);

        let mut merger = PdfMerger::new();
        merger.append(&first, "First").unwrap();
        merger.append(&second, "Second").unwrap();

        let out = dir.path().join("combined.pdf");
        let size = merger.write(&out).unwrap();
        assert!(size > 0);
        assert_eq!(size, std::fs::metadata(&out).unwrap().len());

        let combined = Document::load(&out).unwrap();
        assert_eq!(combined.get_pages().len(), 5);
    }

    #[test]
    fn rewriting_after_another_append_grows_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_pdf(dir.path(), "first.pdf", 1);
        let second = write_pdf(dir.path(), "second.pdf", 8);

        let mut merger = PdfMerger::new();
        merger.append(&first, "First").unwrap();
        let out = dir.path().join("combined.pdf");
        let size_one = merger.write(&out).unwrap();

        merger.append(&second, "Second").unwrap();
        let size_two = merger.write(&out).unwrap();
        assert!(size_two > size_one);
    }

    #[test]
    fn reset_discards_appended_content() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_pdf(dir.path(), "first.pdf", 2);
        let second = write_pdf(dir.path(), "second.pdf", 1);

        let mut merger = PdfMerger::new();
        merger.append(&first, "First").unwrap();
        merger.reset();
        merger.append(&second, "Second").unwrap();

        let out = dir.path().join("combined.pdf");
        merger.write(&out).unwrap();
        let combined = Document::load(&out).unwrap();
        assert_eq!(combined.get_pages().len(), 1);
    }

    #[test]
    fn write_with_no_parts_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut merger = PdfMerger::new();
        let err = merger.write(&dir.path().join("empty.pdf")).unwrap_err();
        assert!(matches!(err, Error::Merge(MergeError::NoPages { .. })));
    }
}
