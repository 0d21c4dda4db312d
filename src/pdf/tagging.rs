use super::{page_attribute, page_box, resolve, save};
use crate::error::{ToolError, ToolResult};
use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tag {
    H1,
    H2,
    H3,
    #[serde(rename = "Body Text")]
    Body,
}

impl Tag {
    pub fn level(&self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::Body => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tag::H1 => "H1",
            Tag::H2 => "H2",
            Tag::H3 => "H3",
            Tag::Body => "Body Text",
        })
    }
}

impl FromStr for Tag {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h1" => Ok(Tag::H1),
            "h2" => Ok(Tag::H2),
            "h3" => Ok(Tag::H3),
            "body" | "body text" | "p" => Ok(Tag::Body),
            _ => Err(ToolError::invalid(format!("unknown tag '{s}' (use H1, H2, H3 or Body)"))),
        }
    }
}

/// A line of text recovered from a page content stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextLine {
    pub page: u32,
    pub text: String,
    pub font_size: f32,
    pub fonts: Vec<String>,
    pub bold: bool,
    pub italic: bool,
    /// Distance of the line's top from the top of the page.
    pub y: f32,
    pub char_count: usize,
    pub word_count: usize,
    pub suggested: Tag,
    pub tag: Tag,
}

impl TextLine {
    fn new(page: u32, text: String, font_size: f32, fonts: Vec<String>, y: f32) -> Self {
        let bold = fonts.iter().any(|f| f.contains("Bold"));
        let italic = fonts.iter().any(|f| f.contains("Italic") || f.contains("Oblique"));
        Self {
            page,
            char_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            text,
            font_size,
            fonts,
            bold,
            italic,
            y,
            suggested: Tag::Body,
            tag: Tag::Body,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub body: usize,
}

impl TagSummary {
    pub fn from_lines(lines: &[TextLine]) -> Self {
        lines.iter().fold(Self::default(), |mut acc, line| {
            match line.tag {
                Tag::H1 => acc.h1 += 1,
                Tag::H2 => acc.h2 += 1,
                Tag::H3 => acc.h3 += 1,
                Tag::Body => acc.body += 1,
            }
            acc
        })
    }
}

impl fmt::Display for TagSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "H1: {}  H2: {}  H3: {}  Body Text: {}",
            self.h1, self.h2, self.h3, self.body
        )
    }
}

/// Resource name -> BaseFont for the fonts a page can select.
fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, String> {
    let mut fonts = HashMap::new();
    let Some(resources) = page_attribute(doc, page_id, b"Resources") else {
        return fonts;
    };
    let Ok(resources) = resolve(doc, &resources).and_then(|r| Ok(r.as_dict()?)) else {
        return fonts;
    };
    let Ok(font_dict) = resources
        .get(b"Font")
        .map_err(ToolError::from)
        .and_then(|f| resolve(doc, f))
        .and_then(|f| Ok(f.as_dict()?))
    else {
        return fonts;
    };
    for (name, font) in font_dict.iter() {
        let base = resolve(doc, font)
            .ok()
            .and_then(|f| f.as_dict().ok())
            .and_then(|d| d.get(b"BaseFont").ok())
            .and_then(|b| match b {
                Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                _ => None,
            })
            .unwrap_or_default();
        fonts.insert(name.clone(), base);
    }
    fonts
}

fn decode_text(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xfe, 0xff]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|b| *b as char).collect()
    }
}

/// Text state needed to split a content stream into lines.
struct LineCollector<'a> {
    page: u32,
    page_top: f32,
    fonts: &'a HashMap<Vec<u8>, String>,
    font: String,
    font_size: f32,
    scale: f32,
    leading: f32,
    line_y: f32,
    moved: bool,
    buffer: String,
    buffer_y: f32,
    buffer_size: f32,
    buffer_fonts: Vec<String>,
    lines: Vec<TextLine>,
}

impl<'a> LineCollector<'a> {
    fn new(page: u32, page_top: f32, fonts: &'a HashMap<Vec<u8>, String>) -> Self {
        Self {
            page,
            page_top,
            fonts,
            font: String::new(),
            font_size: 0.0,
            scale: 1.0,
            leading: 0.0,
            line_y: 0.0,
            moved: false,
            buffer: String::new(),
            buffer_y: 0.0,
            buffer_size: 0.0,
            buffer_fonts: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn move_to(&mut self, y: f32) {
        self.line_y = y;
        self.moved = true;
    }

    fn show(&mut self, text: &str) {
        if !self.buffer.is_empty() && (self.buffer_y - self.line_y).abs() > 0.5 {
            self.flush();
        }
        if self.buffer.is_empty() {
            self.buffer_y = self.line_y;
        } else if self.moved && !self.buffer.ends_with(' ') {
            self.buffer.push(' ');
        }
        self.moved = false;
        self.buffer.push_str(text);
        let size = self.font_size * self.scale;
        self.buffer_size = self.buffer_size.max(size);
        if !self.font.is_empty() && !self.buffer_fonts.contains(&self.font) {
            self.buffer_fonts.push(self.font.clone());
        }
    }

    fn flush(&mut self) {
        let text = self.buffer.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.chars().count() > 1 {
            let top = self.page_top - (self.buffer_y + self.buffer_size);
            self.lines.push(TextLine::new(
                self.page,
                text,
                self.buffer_size,
                std::mem::take(&mut self.buffer_fonts),
                top.max(0.0),
            ));
        }
        self.buffer.clear();
        self.buffer_fonts.clear();
        self.buffer_size = 0.0;
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        let num = |i: usize| operands.get(i).and_then(super::number).unwrap_or(0.0);
        match operator {
            "BT" => {
                self.scale = 1.0;
                self.move_to(0.0);
            }
            "Tf" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.font = self.fonts.get(name).cloned().unwrap_or_default();
                }
                self.font_size = num(1);
            }
            "TL" => self.leading = num(0),
            "Tm" => {
                let d = num(3);
                self.scale = if d == 0.0 { 1.0 } else { d.abs() };
                self.move_to(num(5));
            }
            "Td" => self.move_to(self.line_y + num(1) * self.scale),
            "TD" => {
                self.leading = -num(1);
                self.move_to(self.line_y + num(1) * self.scale);
            }
            "T*" => self.move_to(self.line_y - self.leading * self.scale),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(&decode_text(bytes));
                }
            }
            "'" | "\"" => {
                self.move_to(self.line_y - self.leading * self.scale);
                if let Some(Object::String(bytes, _)) = operands.last() {
                    self.show(&decode_text(bytes));
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => text.push_str(&decode_text(bytes)),
                            other => {
                                if super::number(other).is_some_and(|n| n < -200.0) {
                                    text.push(' ');
                                }
                            }
                        }
                    }
                    self.show(&text);
                }
            }
            _ => {}
        }
    }
}

/// Suggests a tag for every line from its length, isolation, position and style.
pub fn suggest_tags(lines: &mut [TextLine]) {
    let counts: Vec<usize> = lines.iter().map(|l| l.char_count).collect();
    let last = counts.len().saturating_sub(1);
    for (i, line) in lines.iter_mut().enumerate() {
        let chars = line.char_count;
        let suggested = if chars > 300 {
            Tag::Body
        } else if chars < 100 && line.word_count <= 10 {
            let space_before = i == 0 || counts[i - 1] > 200;
            let space_after = i == last || counts[i + 1] > 200;
            if space_before || space_after {
                if line.y < 200.0 { Tag::H1 } else { Tag::H2 }
            } else {
                Tag::H3
            }
        } else if (50..=200).contains(&chars) {
            if line.bold || line.italic { Tag::H3 } else { Tag::Body }
        } else {
            Tag::Body
        };
        line.suggested = suggested;
        line.tag = suggested;
    }
}

/// Extracts text lines from every page and suggests a tag for each.
pub fn analyze_hierarchy(pdf: &[u8]) -> ToolResult<Vec<TextLine>> {
    let doc = Document::load_mem(pdf)?;
    let mut lines = Vec::new();
    for (page_number, page_id) in doc.get_pages() {
        let (_, lly, _, height) = page_box(&doc, page_id);
        let content = match doc.get_page_content(page_id).and_then(|bytes| Content::decode(&bytes)) {
            Ok(content) => content,
            Err(err) => {
                warn!(page = page_number, %err, "skipping unreadable page content");
                continue;
            }
        };
        let fonts = page_fonts(&doc, page_id);
        let mut collector = LineCollector::new(page_number, lly + height, &fonts);
        for op in &content.operations {
            collector.apply(&op.operator, &op.operands);
        }
        collector.flush();
        debug!(page = page_number, lines = collector.lines.len(), "extracted text lines");
        lines.append(&mut collector.lines);
    }
    suggest_tags(&mut lines);
    info!(lines = lines.len(), "analyzed document hierarchy");
    Ok(lines)
}

struct OutlineNode {
    level: u8,
    title: String,
    page: ObjectId,
    top: f32,
    children: Vec<OutlineNode>,
}

fn nest(nodes: &mut Vec<OutlineNode>, node: OutlineNode) {
    match nodes.last_mut() {
        Some(last) if last.level < node.level => nest(&mut last.children, node),
        _ => nodes.push(node),
    }
}

fn descendant_count(nodes: &[OutlineNode]) -> i64 {
    nodes
        .iter()
        .map(|n| 1 + descendant_count(&n.children))
        .sum()
}

/// Writes sibling outline items under `parent`; returns first and last ids.
fn write_outline(doc: &mut Document, nodes: Vec<OutlineNode>, parent: ObjectId) -> Option<(ObjectId, ObjectId)> {
    let ids: Vec<ObjectId> = nodes.iter().map(|_| doc.new_object_id()).collect();
    for (i, node) in nodes.into_iter().enumerate() {
        let id = ids[i];
        let count = descendant_count(&node.children);
        let mut item = dictionary! {
            "Title" => Object::string_literal(super::encode_win_ansi(&node.title)),
            "Parent" => parent,
            "Dest" => vec![
                Object::Reference(node.page),
                "XYZ".into(),
                Object::Null,
                Object::Real(node.top as _),
                Object::Null,
            ],
        };
        if i > 0 {
            item.set("Prev", ids[i - 1]);
        }
        if let Some(next) = ids.get(i + 1) {
            item.set("Next", *next);
        }
        if let Some((first, last)) = write_outline(doc, node.children, id) {
            item.set("First", first);
            item.set("Last", last);
            item.set("Count", count);
        }
        doc.objects.insert(id, Object::Dictionary(item));
    }
    Some((*ids.first()?, *ids.last()?))
}

/// Copies `pdf` with document metadata, tagged/marked flags, a language and
/// an outline built from the heading tags in `lines`.
pub fn tag_pdf(pdf: &[u8], lines: &[TextLine], title: &str, lang: &str) -> ToolResult<Vec<u8>> {
    let mut doc = Document::load_mem(pdf)?;
    let pages = doc.get_pages();

    let mut roots: Vec<OutlineNode> = Vec::new();
    for line in lines {
        let (Some(level), Some(page_id)) = (line.tag.level(), pages.get(&line.page)) else {
            continue;
        };
        let (_, lly, _, height) = page_box(&doc, *page_id);
        nest(
            &mut roots,
            OutlineNode {
                level,
                title: line.text.clone(),
                page: *page_id,
                top: lly + height - line.y,
                children: Vec::new(),
            },
        );
    }
    let headings = descendant_count(&roots);

    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => *id,
        _ => {
            let id = doc.add_object(dictionary! {});
            doc.trailer.set("Info", id);
            id
        }
    };
    let info = doc.get_dictionary_mut(info_id)?;
    info.set("Title", Object::string_literal(super::encode_win_ansi(title)));
    info.set("Tagged", Object::string_literal("True"));

    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let outlines_id = if roots.is_empty() {
        None
    } else {
        let outlines_id = doc.new_object_id();
        let (first, last) = write_outline(&mut doc, roots, outlines_id)
            .ok_or_else(|| ToolError::invalid("empty outline"))?;
        doc.objects.insert(
            outlines_id,
            Object::Dictionary(dictionary! {
                "Type" => "Outlines",
                "First" => first,
                "Last" => last,
                "Count" => headings,
            }),
        );
        Some(outlines_id)
    };

    let catalog = doc.get_dictionary_mut(root_id)?;
    catalog.set("MarkInfo", dictionary! { "Marked" => true });
    catalog.set("Lang", Object::string_literal(lang));
    if let Some(outlines_id) = outlines_id {
        catalog.set("Outlines", outlines_id);
        catalog.set("PageMode", "UseOutlines");
    }

    info!(headings, title, "tagged PDF");
    save(&mut doc)
}
