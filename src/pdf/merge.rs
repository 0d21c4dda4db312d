use super::{
    encode_win_ansi, helvetica_width, page_attribute, page_box, resolve, save, MergeOptions,
    MergeSource, LETTER,
};
use crate::error::{ToolError, ToolResult};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use tracing::{debug, info};

const TOC_TITLE: &str = "Table of Contents";
const TOC_FIRST_Y: i32 = 700;
const TOC_CONTINUED_Y: i32 = 750;
const TOC_LINE_GAP: i32 = 25;
const TOC_BOTTOM: i32 = 50;
const TOC_TITLE_X: f32 = 70.0;
const TOC_RIGHT_X: f32 = 550.0;
const TOC_FONT_SIZE: f32 = 12.0;
const NUMBER_FONT_SIZE: f32 = 10.0;

const INHERITED_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// One entry line on a table-of-contents page.
#[derive(Debug, Clone, PartialEq)]
pub struct TocLine {
    pub title: String,
    pub page_label: String,
    pub y: i32,
    pub entry: usize,
}

/// Splits `(title, page number)` entries across as many TOC pages as needed.
pub fn toc_layout(entries: &[(String, u32)]) -> Vec<Vec<TocLine>> {
    let mut pages: Vec<Vec<TocLine>> = vec![Vec::new()];
    let mut y = TOC_FIRST_Y;
    for (entry, (title, page)) in entries.iter().enumerate() {
        if y < TOC_BOTTOM {
            pages.push(Vec::new());
            y = TOC_CONTINUED_Y;
        }
        if let Some(current) = pages.last_mut() {
            current.push(TocLine {
                title: title.clone(),
                page_label: format!("Page {page}"),
                y,
                entry,
            });
        }
        y -= TOC_LINE_GAP;
    }
    pages
}

/// Copies inherited attributes onto each page so pages survive a new tree.
fn flatten_page_attributes(doc: &mut Document) -> ToolResult<()> {
    for page_id in doc.get_pages().into_values() {
        let mut missing = Vec::new();
        let page = doc.get_dictionary(page_id)?;
        for key in INHERITED_KEYS {
            if !page.has(key) {
                if let Some(value) = page_attribute(doc, page_id, key) {
                    missing.push((key, value));
                }
            }
        }
        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in missing {
            page.set(key.to_vec(), value);
        }
    }
    Ok(())
}

fn is_tree_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => matches!(
            dict.get(b"Type"),
            Ok(Object::Name(name)) if name == b"Catalog" || name == b"Pages"
        ),
        _ => false,
    }
}

fn select_pages(source: &MergeSource, pages: &[ObjectId]) -> ToolResult<Vec<ObjectId>> {
    match &source.pages {
        None => Ok(pages.to_vec()),
        Some(selection) => selection
            .iter()
            .map(|n| {
                pages.get((*n as usize).wrapping_sub(1)).copied().ok_or_else(|| {
                    ToolError::invalid(format!(
                        "{}: page {} out of range (document has {} pages)",
                        source.title,
                        n,
                        pages.len()
                    ))
                })
            })
            .collect(),
    }
}

fn text_operations(font: &str, size: f32, x: f32, y: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), Object::Real(size as _)]),
        Operation::new("Td", vec![Object::Real(x as _), Object::Real(y as _)]),
        Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
        Operation::new("ET", vec![]),
    ]
}

fn helvetica(doc: &mut Document, base_font: &str) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    })
}

fn build_toc_pages(
    doc: &mut Document,
    pages_id: ObjectId,
    lines: &[Vec<TocLine>],
    targets: &[ObjectId],
) -> ToolResult<Vec<ObjectId>> {
    let regular = helvetica(doc, "Helvetica");
    let bold = helvetica(doc, "Helvetica-Bold");
    let mut toc_pages = Vec::with_capacity(lines.len());

    for (index, page_lines) in lines.iter().enumerate() {
        let mut operations = Vec::new();
        if index == 0 {
            operations.extend(text_operations("F2", 20.0, 50.0, 750.0, TOC_TITLE));
        }
        let mut annotations: Vec<Object> = Vec::new();
        for line in page_lines {
            let y = line.y as f32;
            operations.extend(text_operations("F1", TOC_FONT_SIZE, TOC_TITLE_X, y, &line.title));
            let label_x = TOC_RIGHT_X - helvetica_width(&line.page_label, TOC_FONT_SIZE);
            operations.extend(text_operations("F1", TOC_FONT_SIZE, label_x, y, &line.page_label));
            if let Some(target) = targets.get(line.entry) {
                let link = doc.add_object(dictionary! {
                    "Type" => "Annot",
                    "Subtype" => "Link",
                    "Rect" => vec![
                        Object::Real(TOC_TITLE_X as _),
                        Object::Real((y - 4.0) as _),
                        Object::Real(TOC_RIGHT_X as _),
                        Object::Real((y + TOC_FONT_SIZE) as _),
                    ],
                    "Border" => vec![0.into(), 0.into(), 0.into()],
                    "Dest" => vec![Object::Reference(*target), "Fit".into()],
                });
                annotations.push(link.into());
            }
        }

        let content = Content { operations }.encode()?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(LETTER.0 as _), Object::Real(LETTER.1 as _)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => regular, "F2" => bold },
            },
            "Contents" => content_id,
        };
        if !annotations.is_empty() {
            page.set("Annots", annotations);
        }
        toc_pages.push(doc.add_object(page));
    }
    Ok(toc_pages)
}

/// Gives the page its own resource and font dictionaries with `key` added.
fn add_font_resource(doc: &mut Document, page_id: ObjectId, key: &str, font_id: ObjectId) -> ToolResult<()> {
    let resources = match page_attribute(doc, page_id, b"Resources") {
        Some(obj) => resolve(doc, &obj)?.as_dict()?.clone(),
        None => Dictionary::new(),
    };
    let mut resources = resources;
    let mut fonts = match resources.get(b"Font") {
        Ok(obj) => resolve(doc, obj)?.as_dict()?.clone(),
        Err(_) => Dictionary::new(),
    };
    fonts.set(key, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Appends drawing operations inside a saved graphics state.
fn append_operations(doc: &mut Document, page_id: ObjectId, operations: Vec<Operation>) -> ToolResult<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(other) => vec![other.clone()],
        Err(_) => Vec::new(),
    };
    let open = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let mut body = b"Q\n".to_vec();
    body.extend(Content { operations }.encode()?);
    let close = doc.add_object(Stream::new(dictionary! {}, body));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open));
    contents.extend(existing);
    contents.push(Object::Reference(close));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

fn stamp_page_numbers(doc: &mut Document, pages: &[ObjectId], options: &MergeOptions) -> ToolResult<()> {
    let Some(position) = options.page_numbers else {
        return Ok(());
    };
    let font_id = helvetica(doc, "Helvetica");
    for (index, page_id) in pages.iter().enumerate() {
        let (llx, lly, width, height) = page_box(doc, *page_id);
        let (x, y) = position.anchor(width, height);
        let label = (index as u32 + options.start_number).to_string();
        let x = llx + x - helvetica_width(&label, NUMBER_FONT_SIZE) / 2.0;
        add_font_resource(doc, *page_id, "FTNum", font_id)?;
        append_operations(
            doc,
            *page_id,
            text_operations("FTNum", NUMBER_FONT_SIZE, x, lly + y, &label),
        )?;
    }
    debug!(pages = pages.len(), %position, "stamped page numbers");
    Ok(())
}

/// Concatenates the selected pages of every source, optionally with a
/// table of contents up front and stamped page numbers.
pub fn merge(sources: &[MergeSource], options: &MergeOptions) -> ToolResult<Vec<u8>> {
    if sources.is_empty() {
        return Err(ToolError::invalid("no PDF files to merge"));
    }

    let mut merged = Document::with_version("1.5");
    let mut next_id = 1;
    let mut body_pages: Vec<ObjectId> = Vec::new();
    let mut entries: Vec<(String, usize)> = Vec::new();

    for source in sources {
        let mut doc = Document::load_mem(&source.data)
            .map_err(|err| ToolError::invalid(format!("{}: unreadable PDF ({err})", source.title)))?;
        flatten_page_attributes(&mut doc)?;
        doc.renumber_objects_with(next_id);
        next_id = doc.max_id + 1;

        let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let selected = select_pages(source, &pages)?;
        if selected.is_empty() {
            debug!(title = %source.title, "no pages selected");
            continue;
        }
        entries.push((source.title.clone(), body_pages.len()));

        let mut seen = HashSet::new();
        for page_id in selected {
            if seen.insert(page_id) {
                body_pages.push(page_id);
            } else {
                // Repeated page: give the copy its own object.
                let copy = doc.get_object(page_id)?.clone();
                let copy_id = (next_id, 0);
                next_id += 1;
                merged.objects.insert(copy_id, copy);
                body_pages.push(copy_id);
            }
        }
        merged
            .objects
            .extend(doc.objects.into_iter().filter(|(_, obj)| !is_tree_node(obj)));
    }

    if body_pages.is_empty() {
        return Err(ToolError::invalid("no pages selected"));
    }
    merged.max_id = next_id - 1;
    let pages_id = merged.new_object_id();

    let mut all_pages = Vec::new();
    if options.toc {
        // Entry numbers depend on how many TOC pages precede the body.
        let placeholder: Vec<(String, u32)> = entries.iter().map(|(t, _)| (t.clone(), 0)).collect();
        let toc_pages = toc_layout(&placeholder).len();
        let numbered: Vec<(String, u32)> = entries
            .iter()
            .map(|(title, first)| {
                (title.clone(), (toc_pages + first) as u32 + options.start_number)
            })
            .collect();
        let targets: Vec<ObjectId> = entries.iter().map(|(_, first)| body_pages[*first]).collect();
        all_pages = build_toc_pages(&mut merged, pages_id, &toc_layout(&numbered), &targets)?;
    }
    all_pages.extend(body_pages);

    for page_id in &all_pages {
        merged.get_dictionary_mut(*page_id)?.set("Parent", pages_id);
    }
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => all_pages.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => all_pages.len() as i64,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);

    stamp_page_numbers(&mut merged, &all_pages, options)?;
    let pruned = merged.prune_objects();
    debug!(pruned = pruned.len(), "pruned unreachable objects");

    info!(
        sources = sources.len(),
        pages = all_pages.len(),
        toc = options.toc,
        "merged PDF"
    );
    save(&mut merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toc_fits_27_entries_per_first_page() {
        let entries: Vec<(String, u32)> = (0..28).map(|i| (format!("Doc {i}"), i + 2)).collect();
        let pages = toc_layout(&entries);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].len(), 27);
        assert_eq!(pages[0][0].y, 700);
        assert_eq!(pages[0][26].y, 50);
        assert_eq!(pages[1][0].y, 750);
        assert_eq!(pages[1][0].page_label, "Page 29");
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = merge(&[], &MergeOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no PDF files"));
    }
}
