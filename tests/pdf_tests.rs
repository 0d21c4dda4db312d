mod common;

use common::{labelled_pages, page_texts, sample_pdf, syllabus_page};
use faculty_tools::pdf::{
    analyze_hierarchy, merge, tag_pdf, MergeOptions, MergeSource, PageNumberPosition, Tag, TagSummary,
};
use lopdf::{Dictionary, Document, Object};

fn catalog(doc: &Document) -> &Dictionary {
    let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    doc.get_dictionary(root).unwrap()
}

fn page_content(pdf: &[u8], page: u32) -> String {
    let doc = Document::load_mem(pdf).unwrap();
    let id = doc.get_pages()[&page];
    String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned()
}

fn handouts() -> Vec<MergeSource> {
    vec![
        MergeSource::new("Syllabus", labelled_pages(&["syllabus 1", "syllabus 2"])),
        MergeSource::new("Essay Prompt", labelled_pages(&["prompt 1"])),
        MergeSource::new("Rubric", labelled_pages(&["rubric 1", "rubric 2", "rubric 3"])),
    ]
}

#[test]
fn plain_merge_keeps_input_order() {
    let merged = merge(&handouts(), &MergeOptions::default()).unwrap();
    assert_eq!(
        page_texts(&merged),
        vec!["syllabus 1", "syllabus 2", "prompt 1", "rubric 1", "rubric 2", "rubric 3"]
    );
}

#[test]
fn page_selection_reorders_and_repeats() {
    let mut sources = handouts();
    sources[0] = sources[0].clone().with_pages(vec![2, 1, 2]);
    sources[2] = sources[2].clone().with_pages(vec![3]);
    let merged = merge(&sources, &MergeOptions::default()).unwrap();
    assert_eq!(
        page_texts(&merged),
        vec!["syllabus 2", "syllabus 1", "syllabus 2", "prompt 1", "rubric 3"]
    );
}

#[test]
fn toc_is_prepended_and_links_to_each_document() {
    let options = MergeOptions {
        toc: true,
        ..MergeOptions::default()
    };
    let merged = merge(&handouts(), &options).unwrap();
    let texts = page_texts(&merged);
    assert_eq!(texts.len(), 7);
    assert_eq!(texts[0], "Table of Contents");

    let doc = Document::load_mem(&merged).unwrap();
    let pages = doc.get_pages();
    let toc_page = doc.get_dictionary(pages[&1]).unwrap();
    let annots = toc_page.get(b"Annots").unwrap().as_array().unwrap();
    assert_eq!(annots.len(), 3);

    let targets: Vec<_> = annots
        .iter()
        .map(|annot| {
            let id = annot.as_reference().unwrap();
            let dest = doc.get_dictionary(id).unwrap().get(b"Dest").unwrap().as_array().unwrap();
            dest[0].as_reference().unwrap()
        })
        .collect();
    assert_eq!(targets, vec![pages[&2], pages[&4], pages[&5]]);
}

#[test]
fn toc_labels_count_the_toc_page() {
    let options = MergeOptions {
        toc: true,
        ..MergeOptions::default()
    };
    let merged = merge(&handouts(), &options).unwrap();
    let toc = page_content(&merged, 1);
    assert!(toc.contains("(Table of Contents)"));
    assert!(toc.contains("(Syllabus)"));
    assert!(toc.contains("(Page 2)"));
    assert!(toc.contains("(Page 4)"));
    assert!(toc.contains("(Page 5)"));
}

#[test]
fn long_toc_spills_onto_a_second_page() {
    let sources: Vec<MergeSource> = (1..=28)
        .map(|n| MergeSource::new(format!("Week {n} Reading"), labelled_pages(&["reading"])))
        .collect();
    let options = MergeOptions {
        toc: true,
        ..MergeOptions::default()
    };
    let merged = merge(&sources, &options).unwrap();
    let doc = Document::load_mem(&merged).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 30);

    // Two TOC pages come first, so the first reading is page 3.
    let first = page_content(&merged, 1);
    assert!(first.contains("(Table of Contents)"));
    assert!(first.contains("(Page 3)"));
    assert!(first.contains("(Page 29)"));
    assert!(!first.contains("(Page 30)"));

    let second = page_content(&merged, 2);
    assert!(!second.contains("Table of Contents"));
    assert!(second.contains("(Week 28 Reading)"));
    assert!(second.contains("(Page 30)"));

    let continued = doc.get_dictionary(pages[&2]).unwrap();
    let annots = continued.get(b"Annots").unwrap().as_array().unwrap();
    assert_eq!(annots.len(), 1);
    let link = doc.get_dictionary(annots[0].as_reference().unwrap()).unwrap();
    let dest = link.get(b"Dest").unwrap().as_array().unwrap();
    assert_eq!(dest[0].as_reference().unwrap(), pages[&30]);
}

#[test]
fn stamped_numbers_start_where_requested() {
    let options = MergeOptions {
        toc: false,
        page_numbers: Some(PageNumberPosition::TopRight),
        start_number: 10,
    };
    let merged = merge(&handouts()[..2], &options).unwrap();
    let doc = Document::load_mem(&merged).unwrap();
    let last = *doc.get_pages().get(&3).unwrap();
    let content = String::from_utf8_lossy(&doc.get_page_content(last).unwrap()).into_owned();
    assert!(content.contains("(12)"));
    assert!(content.contains("/FTNum"));
}

#[test]
fn bad_selection_and_empty_input_are_errors() {
    let sources = vec![MergeSource::new("One", labelled_pages(&["only"])).with_pages(vec![2])];
    let err = merge(&sources, &MergeOptions::default()).unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert!(merge(&[], &MergeOptions::default()).is_err());
    assert!(merge(&[MergeSource::new("Junk", b"not a pdf".to_vec())], &MergeOptions::default()).is_err());
}

#[test]
fn hierarchy_suggests_title_and_section_headings() {
    let lines = analyze_hierarchy(&syllabus_page()).unwrap();
    let tags: Vec<(&str, Tag)> = lines.iter().map(|l| (l.text.as_str(), l.suggested)).collect();
    assert_eq!(tags.len(), 4);
    assert_eq!(tags[0], ("Course Policies", Tag::H1));
    assert_eq!(tags[1].1, Tag::Body);
    assert_eq!(tags[2], ("Late Work", Tag::H2));
    assert!(lines[0].bold);
    assert_eq!(lines[0].font_size, 20.0);
    assert_eq!(
        TagSummary::from_lines(&lines),
        TagSummary { h1: 1, h2: 1, h3: 0, body: 2 }
    );
}

#[test]
fn tagging_writes_outline_language_and_markers() {
    let pdf = syllabus_page();
    let mut lines = analyze_hierarchy(&pdf).unwrap();
    lines[2].tag = Tag::H3;
    let tagged = tag_pdf(&pdf, &lines, "ENGL 1190 Syllabus", "en-US").unwrap();

    let doc = Document::load_mem(&tagged).unwrap();
    let catalog = catalog(&doc);
    assert_eq!(catalog.get(b"Lang").unwrap().as_str().unwrap(), b"en-US");
    let mark_info = catalog.get(b"MarkInfo").unwrap().as_dict().unwrap();
    assert_eq!(mark_info.get(b"Marked").unwrap(), &Object::Boolean(true));

    let outlines_id = catalog.get(b"Outlines").unwrap().as_reference().unwrap();
    let outlines = doc.get_dictionary(outlines_id).unwrap();
    assert_eq!(outlines.get(b"Count").unwrap().as_i64().unwrap(), 2);
    let first_id = outlines.get(b"First").unwrap().as_reference().unwrap();
    let first = doc.get_dictionary(first_id).unwrap();
    assert_eq!(first.get(b"Title").unwrap().as_str().unwrap(), b"Course Policies");
    // The H3 nests under the H1
    assert!(first.get(b"First").is_ok());

    let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
    let info = doc.get_dictionary(info_id).unwrap();
    assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"ENGL 1190 Syllabus");
}

#[test]
fn body_only_documents_get_no_outline() {
    let pdf = syllabus_page();
    let mut lines = analyze_hierarchy(&pdf).unwrap();
    for line in &mut lines {
        line.tag = Tag::Body;
    }
    let tagged = tag_pdf(&pdf, &lines, "Handout", "en").unwrap();
    let doc = Document::load_mem(&tagged).unwrap();
    assert!(catalog(&doc).get(b"Outlines").is_err());
}

#[test]
fn analysis_reads_fonts_and_distance_from_top() {
    let pdf = sample_pdf(&[vec![
        ("F2", 18, 740, "Composition I"),
        ("F1", 12, 700, "Paragraph text"),
        ("F1", 12, 680, "x"),
    ]]);
    let lines = analyze_hierarchy(&pdf).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].text, "Composition I");
    assert!(lines[0].bold);
    assert_eq!(lines[0].font_size, 18.0);
    assert!((lines[0].y - 34.0).abs() < 0.01);
    assert!(!lines[1].bold);
}

#[test]
fn outline_nests_headings_across_pages() {
    let pdf = sample_pdf(&[vec![("F2", 18, 740, "Unit One")], vec![("F1", 12, 700, "Reading")]]);
    let mut lines = analyze_hierarchy(&pdf).unwrap();
    lines[0].tag = Tag::H1;
    lines[1].tag = Tag::H2;
    let tagged = tag_pdf(&pdf, &lines, "Unit Packet", "en-US").unwrap();

    let doc = Document::load_mem(&tagged).unwrap();
    let outlines_id = catalog(&doc).get(b"Outlines").unwrap().as_reference().unwrap();
    let outlines = doc.get_dictionary(outlines_id).unwrap();
    assert_eq!(outlines.get(b"Count").unwrap().as_i64().unwrap(), 2);
    let unit_id = outlines.get(b"First").unwrap().as_reference().unwrap();
    let unit = doc.get_dictionary(unit_id).unwrap();
    assert!(unit.has(b"First"));
    assert!(!unit.has(b"Next"));
}
