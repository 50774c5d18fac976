//! End-to-end document assembly tests: a complete write pass through
//! the driver, checked against the serialized bytes.

use pdf_scribe::artefacts::{
    Annotation, AnnotationList, AppearanceState, AppearanceStream, EmbeddedFile, FieldType,
    FieldWidget, LinkTarget, NamedDestination, OutlineItem,
};
use pdf_scribe::encoding::decode_text;
use pdf_scribe::{DocumentId, DocumentInfo, DocumentWriter, ObjectRef, WriterConfig};

fn write_page(doc: &mut DocumentWriter<Vec<u8>>) -> ObjectRef {
    let page = doc.begin_page().unwrap();
    let parent = doc.page_tree_ref();
    let w = doc.writer_mut();
    w.begin_dictionary().unwrap();
    w.write_dictionary_name_entry("Type", "Page").unwrap();
    w.write_dictionary_object_ref_entry("Parent", parent).unwrap();
    w.begin_dictionary_entry("MediaBox").unwrap();
    w.write_array_real_entries(&[0.0, 0.0, 595.0, 842.0]).unwrap();
    w.end_dictionary_entry().unwrap();
    w.end_dictionary().unwrap();
    doc.end_page().unwrap();
    page
}

#[test]
fn test_object_count_matches_xref_size() {
    let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
    write_page(&mut doc);
    doc.set_info(DocumentInfo::new().with_title("Counted"));
    let bytes = doc.finish(None).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    // four objects (page tree, page, catalog, info) plus the free head
    assert!(text.contains("xref\r\n0 5\r\n"));
    assert!(text.contains("/Size 5"));
    assert_eq!(text.matches(" obj").count(), 4);
    // exactly four in-use entries
    assert_eq!(text.matches(" n\r\n").count(), 4);
    assert_eq!(text.matches(" f\r\n").count(), 1);
}

#[test]
fn test_full_document_with_all_artefacts() {
    let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
    let page = write_page(&mut doc);

    let chapter = doc.push_outline(OutlineItem::new("Chapter 1", "ch1")).unwrap();
    let section = doc.push_outline(OutlineItem::new("Section 1.1", "s11")).unwrap();
    doc.pop_outline(section).unwrap();
    doc.pop_outline(chapter).unwrap();

    doc.add_destination(NamedDestination::new("ch1", page)).unwrap();
    doc.add_destination(NamedDestination::new("s11", page)).unwrap();

    doc.attach_file(EmbeddedFile::new("notes.txt", "notes", b"hello".to_vec()))
        .unwrap();

    let mut field = FieldWidget::new("agree", FieldType::Button, [72.0, 72.0, 90.0, 90.0]);
    field.set_appearance(
        AppearanceState::Normal,
        AppearanceStream::new([0.0, 0.0, 18.0, 18.0], b"0 0 18 18 re f".to_vec()),
    );
    doc.add_field(field).unwrap();

    let bytes = doc.finish(None).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.contains("/Type /Outlines"));
    assert!(text.contains("/Outlines"));
    assert!(text.contains("/Names"));
    assert!(text.contains("/Dests"));
    assert!(text.contains("/EmbeddedFiles"));
    assert!(text.contains("/AcroForm"));
    assert!(text.contains("/Subtype /Widget"));
    assert!(text.contains("/Type /Filespec"));
    // name tree keys in ascending order with limits
    assert!(text.contains("/Limits [(ch1) (s11)]"));
    assert!(text.ends_with("%%EOF"));
}

#[test]
fn test_page_annotation_collection_scenario() {
    // an empty collection yields no reference at all
    let mut empty = AnnotationList::new("Annots");
    let mut doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
    doc.begin_page().unwrap();
    let parent = doc.page_tree_ref();
    {
        let w = doc.writer_mut();
        w.begin_dictionary().unwrap();
        w.write_dictionary_name_entry("Type", "Page").unwrap();
        w.write_dictionary_object_ref_entry("Parent", parent).unwrap();
        assert!(empty.write_to(w).unwrap().is_none());

        // one registered annotation yields a one-element array object
        let mut one = AnnotationList::new("Annots");
        one.register(Annotation::link(
            [100.0, 100.0, 200.0, 120.0],
            LinkTarget::Uri("https://example.org".to_string()),
        ));
        let annots = one.write_to(w).unwrap().unwrap();
        w.write_dictionary_object_ref_entry("Annots", annots).unwrap();
        w.end_dictionary().unwrap();
    }
    doc.end_page().unwrap();

    let bytes = doc.finish(None).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    let annots_array = text
        .split("/Annots ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap();
    let array_body = text
        .split(&format!("{} 0 obj\r\n", annots_array))
        .nth(1)
        .unwrap();
    assert!(array_body.starts_with('['));
    assert_eq!(array_body[..array_body.find(']').unwrap()].matches(" R").count(), 1);
}

#[test]
fn test_hex_string_round_trip_through_legacy_encoding() {
    let config = WriterConfig::default().with_hex_strings(true);
    let mut doc = DocumentWriter::create(Vec::new(), config).unwrap();
    let original = "Caf\u{E9} \u{2014} r\u{E9}sum\u{E9}";
    doc.set_info(DocumentInfo::new().with_title(original));
    let bytes = doc.finish(None).unwrap();
    let text = String::from_utf8_lossy(&bytes);

    // pull the hex string back out of the /Title entry and decode it
    let hex = text
        .split("/Title <")
        .nth(1)
        .and_then(|rest| rest.split('>').next())
        .unwrap();
    let decoded_bytes: Vec<u8> = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect();
    assert_eq!(decode_text(&decoded_bytes), original);
}

#[test]
fn test_compressed_content_stream() {
    let config = WriterConfig::default().with_compress(true);
    let mut doc = DocumentWriter::create(Vec::new(), config).unwrap();
    doc.begin_page().unwrap();
    let parent = doc.page_tree_ref();
    {
        let w = doc.writer_mut();
        let contents = w.begin_object().unwrap();
        w.begin_stream(contents).unwrap();
        let ops = "BT /F1 12 Tf 72 720 Td (Hello) Tj ET ".repeat(64);
        w.write_raw(&ops).unwrap();
        let info = w.end_stream().unwrap();
        assert_eq!(info.filters, vec!["FlateDecode"]);
        w.begin_dictionary().unwrap();
        w.write_stream_meta(&info).unwrap();
        w.end_dictionary().unwrap();
        w.end_object().unwrap();

        w.begin_dictionary().unwrap();
        w.write_dictionary_name_entry("Type", "Page").unwrap();
        w.write_dictionary_object_ref_entry("Parent", parent).unwrap();
        w.write_dictionary_object_ref_entry("Contents", contents).unwrap();
        w.end_dictionary().unwrap();
    }
    doc.end_page().unwrap();

    let bytes = doc.finish(None).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/Filter /FlateDecode"));
    assert!(text.contains("/Contents"));
}

#[test]
fn test_explicit_document_id_round_trips_to_trailer() {
    let doc = DocumentWriter::create(Vec::new(), WriterConfig::default()).unwrap();
    let id = DocumentId::new(vec![0xDE, 0xAD], vec![0xBE, 0xEF]);
    let bytes = doc.finish(Some(id)).unwrap();
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains("/ID [<DEAD> <BEEF>]"));
}
