//! Incremental update tests: append a revision to a file this engine
//! wrote, and check numbering continuation, verbatim copying, trailer
//! chaining, and catalog merging.

use pdf_scribe::{DocumentId, DocumentWriter, ExistingPdf, ObjectRef, ViewerPreferences, WriterConfig};
use std::io::Write as _;

fn write_page(doc: &mut DocumentWriter<Vec<u8>>) -> ObjectRef {
    let page = doc.begin_page().unwrap();
    let parent = doc.page_tree_ref();
    let w = doc.writer_mut();
    w.begin_dictionary().unwrap();
    w.write_dictionary_name_entry("Type", "Page").unwrap();
    w.write_dictionary_object_ref_entry("Parent", parent).unwrap();
    w.end_dictionary().unwrap();
    doc.end_page().unwrap();
    page
}

fn base_document() -> Vec<u8> {
    let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
    write_page(&mut doc);
    doc.set_viewer_preferences(ViewerPreferences {
        page_mode: Some("UseOutlines".to_string()),
        ..Default::default()
    });
    doc.finish(Some(DocumentId::new(vec![0xAA; 4], vec![0xBB; 4])))
        .unwrap()
}

#[test]
fn test_update_copies_original_verbatim_and_continues_numbering() {
    let base = base_document();
    let original = ExistingPdf::load(base.clone()).unwrap();
    let max_object = original.max_object();
    let original_table_at = original.table_offset();

    let mut update = DocumentWriter::update(Vec::new(), original, WriterConfig::default()).unwrap();
    write_page(&mut update);
    let updated = update.finish(None).unwrap();

    // the original bytes lead the file unchanged
    assert!(updated.starts_with(&base));
    let appended = String::from_utf8_lossy(&updated[base.len()..]).into_owned();

    // the first appended object number is past the original maximum
    assert!(appended.contains(&format!("\r\n{} 0 obj", max_object + 1)));
    let premature: Vec<u32> = (1..=max_object).collect();
    for number in premature {
        assert!(!appended.contains(&format!("\r\n{} 0 obj\r\n", number)));
    }

    // the new trailer chains back to the original table
    assert!(appended.contains(&format!("/Prev {}", original_table_at)));
    assert!(appended.ends_with("%%EOF"));
}

#[test]
fn test_update_merges_catalog_and_page_tree() {
    let base = base_document();
    let original = ExistingPdf::load(base).unwrap();
    let original_kid = original.page_kids()[0];

    let mut update = DocumentWriter::update(Vec::new(), original, WriterConfig::default()).unwrap();
    let new_page = write_page(&mut update);
    let updated = update.finish(None).unwrap();

    let reloaded = ExistingPdf::load(updated).unwrap();
    // the merged tree keeps the original page ahead of the new one
    assert_eq!(reloaded.page_kids().to_vec(), vec![original_kid, new_page]);
    // non-/Pages catalog keys were carried over verbatim
    assert!(reloaded.catalog().contains_key("PageMode"));
    // /Pages points at the rebuilt tree, not the original one
    assert!(reloaded.page_tree_ref().number > original_kid.number);
}

#[test]
fn test_update_renews_only_the_changing_id_part() {
    let base = base_document();
    let original = ExistingPdf::load(base).unwrap();
    let update = DocumentWriter::update(Vec::new(), original, WriterConfig::default()).unwrap();
    let updated = update.finish(None).unwrap();
    let text = String::from_utf8_lossy(&updated);

    // the permanent part appears in both trailers, the original second
    // part only in the first
    assert_eq!(text.matches("<AAAAAAAA>").count(), 2);
    assert_eq!(text.matches("<BBBBBBBB>").count(), 1);
}

#[test]
fn test_update_size_covers_whole_chain() {
    let base = base_document();
    let original = ExistingPdf::load(base).unwrap();
    let original_size = original.size();

    let mut update = DocumentWriter::update(Vec::new(), original, WriterConfig::default()).unwrap();
    write_page(&mut update);
    let updated = update.finish(None).unwrap();
    let appended = String::from_utf8_lossy(&updated);

    // page tree + page + catalog appended in this revision
    let expected_size = original_size + 3;
    assert!(appended.contains(&format!("/Size {}", expected_size)));

    let reloaded = ExistingPdf::load(updated.clone()).unwrap();
    assert_eq!(reloaded.size(), expected_size);
    assert_eq!(reloaded.max_object(), expected_size - 1);
}

#[test]
fn test_update_from_file_on_disk() {
    let base = base_document();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("original.pdf");
    std::fs::write(&path, &base).unwrap();

    let original = ExistingPdf::from_file(&path).unwrap();
    let mut update = DocumentWriter::update(Vec::new(), original, WriterConfig::default()).unwrap();
    write_page(&mut update);
    let updated = update.finish(None).unwrap();

    let out_path = dir.path().join("updated.pdf");
    let mut file = std::fs::File::create(&out_path).unwrap();
    file.write_all(&updated).unwrap();
    drop(file);

    let reloaded = ExistingPdf::from_file(&out_path).unwrap();
    assert_eq!(reloaded.page_kids().len(), 2);
}

#[test]
fn test_update_preconditions_fail_before_any_output() {
    // a structurally valid file whose catalog has no page tree
    let mut bad: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let catalog_at = bad.len();
    bad.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
    let xref_at = bad.len();
    bad.extend_from_slice(b"xref\n0 2\n0000000000 65535 f \n");
    bad.extend_from_slice(format!("{:010} 00000 n \n", catalog_at).as_bytes());
    bad.extend_from_slice(b"trailer\n<< /Size 2 /Root 1 0 R >>\n");
    bad.extend_from_slice(format!("startxref\n{}\n%%EOF", xref_at).as_bytes());

    // loading fails, so no DocumentWriter ever touches a sink
    assert!(ExistingPdf::load(bad).is_err());
}
