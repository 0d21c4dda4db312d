#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;

/// One text line: font resource (`F1` regular, `F2` bold), size, baseline y, text.
pub type Line<'a> = (&'a str, i64, i64, &'a str);

/// A Letter-size document. Resources and MediaBox live on the page tree root
/// and are inherited by every page.
pub fn sample_pdf(pages: &[Vec<Line<'_>>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let operations: Vec<Operation> = lines
            .iter()
            .flat_map(|(font, size, y, text)| {
                [
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![(*font).into(), (*size).into()]),
                    Operation::new("Td", vec![72.into(), (*y).into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ]
            })
            .collect();
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// One 12pt line per page.
pub fn labelled_pages(labels: &[&str]) -> Vec<u8> {
    let pages: Vec<Vec<Line<'_>>> = labels.iter().map(|label| vec![("F1", 12, 700, *label)]).collect();
    sample_pdf(&pages)
}

/// First text shown on every page, in page order.
pub fn page_texts(pdf: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(pdf).unwrap();
    doc.get_pages()
        .values()
        .map(|page_id| {
            let content = Content::decode(&doc.get_page_content(*page_id).unwrap()).unwrap();
            content
                .operations
                .iter()
                .find(|op| op.operator == "Tj")
                .and_then(|op| op.operands.first())
                .and_then(|obj| obj.as_str().ok())
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
                .unwrap_or_default()
        })
        .collect()
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

pub const POLICIES: &str = "Attendance matters because the course is built around workshops, peer review and in-class writing. \
Students who miss more than four class meetings should expect their participation grade to drop, and students who miss \
more than eight meetings should talk with the instructor about whether withdrawal is the best option for the term.";

/// A syllabus-like page: bold title, a long paragraph, a section heading and a closing paragraph.
pub fn syllabus_page() -> Vec<u8> {
    sample_pdf(&[vec![
        ("F2", 20, 740, "Course Policies"),
        ("F1", 11, 700, POLICIES),
        ("F2", 14, 400, "Late Work"),
        ("F1", 11, 380, POLICIES),
    ]])
}
