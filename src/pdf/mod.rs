//! PDF merging, page stamping and accessibility tagging on top of `lopdf`.

mod merge;
mod tagging;

pub use merge::{merge, toc_layout, TocLine};
pub use tagging::{analyze_hierarchy, suggest_tags, tag_pdf, Tag, TagSummary, TextLine};

use crate::error::{ToolError, ToolResult};
use lopdf::{Document, Object, ObjectId};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub(crate) const LETTER: (f32, f32) = (612.0, 792.0);

/// One input to a merge: the bytes of a PDF, its table-of-contents title,
/// and an optional ordered page selection (1-based).
#[derive(Debug, Clone)]
pub struct MergeSource {
    pub title: String,
    pub data: Vec<u8>,
    pub pages: Option<Vec<u32>>,
}

impl MergeSource {
    pub fn new(title: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            data,
            pages: None,
        }
    }

    /// Reads the file; the title defaults to the file stem.
    pub fn from_path(path: &Path) -> ToolResult<Self> {
        let data = fs::read(path)?;
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(title, data))
    }

    pub fn with_pages(mut self, pages: Vec<u32>) -> Self {
        self.pages = Some(pages);
        self
    }
}

/// Command-line form of a merge input: `report.pdf` or `report.pdf:3,1-2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub path: PathBuf,
    pub pages: Option<Vec<u32>>,
}

impl SourceSpec {
    pub fn load(&self) -> ToolResult<MergeSource> {
        let source = MergeSource::from_path(&self.path)?;
        Ok(match &self.pages {
            Some(pages) => source.with_pages(pages.clone()),
            None => source,
        })
    }
}

impl FromStr for SourceSpec {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((path, pages)) = s.rsplit_once(':') {
            let looks_like_pages = !pages.is_empty()
                && pages
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == ',' || c == '-' || c == ' ');
            if looks_like_pages && !path.is_empty() {
                return Ok(Self {
                    path: PathBuf::from(path),
                    pages: Some(parse_page_list(pages)?),
                });
            }
        }
        Ok(Self {
            path: PathBuf::from(s),
            pages: None,
        })
    }
}

/// `"3,1-2,5-4"` -> `[3, 1, 2, 5, 4]`. Descending ranges reverse pages.
pub fn parse_page_list(text: &str) -> ToolResult<Vec<u32>> {
    let parse = |part: &str| -> ToolResult<u32> {
        match part.trim().parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(ToolError::invalid(format!("invalid page number '{part}'"))),
        }
    };
    let mut pages = Vec::new();
    for part in text.split(',').filter(|p| !p.trim().is_empty()) {
        match part.split_once('-') {
            Some((a, b)) => {
                let (a, b) = (parse(a)?, parse(b)?);
                if a <= b {
                    pages.extend(a..=b);
                } else {
                    pages.extend((b..=a).rev());
                }
            }
            None => pages.push(parse(part)?),
        }
    }
    Ok(pages)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageNumberPosition {
    #[default]
    BottomCenter,
    BottomRight,
    BottomLeft,
    TopCenter,
    TopRight,
    TopLeft,
}

impl PageNumberPosition {
    pub const ALL: [PageNumberPosition; 6] = [
        Self::BottomCenter,
        Self::BottomRight,
        Self::BottomLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::TopLeft,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
            Self::BottomLeft => "bottom-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::TopLeft => "top-left",
        }
    }

    /// Centre point of the number on a page of the given size.
    pub fn anchor(&self, width: f32, height: f32) -> (f32, f32) {
        match self {
            Self::BottomCenter => (width / 2.0, 30.0),
            Self::BottomRight => (width - 50.0, 30.0),
            Self::BottomLeft => (50.0, 30.0),
            Self::TopCenter => (width / 2.0, height - 30.0),
            Self::TopRight => (width - 50.0, height - 30.0),
            Self::TopLeft => (50.0, height - 30.0),
        }
    }

    /// Accepts the six position names, or `none` for no numbering.
    pub fn parse_optional(s: &str) -> ToolResult<Option<Self>> {
        if s.trim().eq_ignore_ascii_case("none") {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl fmt::Display for PageNumberPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageNumberPosition {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| ToolError::invalid(format!("unknown page number position '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOptions {
    pub toc: bool,
    pub page_numbers: Option<PageNumberPosition>,
    pub start_number: u32,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            toc: false,
            page_numbers: None,
            start_number: 1,
        }
    }
}

pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> ToolResult<&'a Object> {
    match object {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

pub(crate) fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Value of a page attribute, looked up through the parent chain.
pub(crate) fn page_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..64 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// `(llx, lly, width, height)` of the media box; Letter when absent.
pub(crate) fn page_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let fallback = (0.0, 0.0, LETTER.0, LETTER.1);
    let Some(media_box) = page_attribute(doc, page_id, b"MediaBox") else {
        return fallback;
    };
    let Ok(Object::Array(values)) = resolve(doc, &media_box) else {
        return fallback;
    };
    let nums: Vec<f32> = values.iter().filter_map(number).collect();
    match nums.as_slice() {
        [llx, lly, urx, ury] => (*llx, *lly, urx - llx, ury - lly),
        _ => fallback,
    }
}

/// Bytes for a Type1 font with WinAnsiEncoding; unmappable characters become `?`.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7e | 0xa0..=0xff => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Width in points of `text` set in Helvetica at `size`.
pub(crate) fn helvetica_width(text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(helvetica_glyph_width).sum();
    units as f32 * size / 1000.0
}

fn helvetica_glyph_width(c: char) -> u32 {
    match c {
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | 'I' | '[' | '\\' | ']' | 'f' | 't' => 278,
        '"' => 355,
        '\'' => 191,
        '%' => 889,
        '&' | 'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667,
        '(' | ')' | '-' | '`' | 'r' => 333,
        '*' => 389,
        '+' | '<' | '=' | '>' | '~' => 584,
        '@' => 1015,
        'C' | 'D' | 'H' | 'N' | 'R' | 'U' | 'w' => 722,
        'F' | 'T' | 'Z' => 611,
        'G' | 'O' | 'Q' => 778,
        'J' => 500,
        'L' => 556,
        'M' | 'm' => 833,
        'W' => 944,
        '^' => 469,
        'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500,
        'i' | 'j' | 'l' => 222,
        '{' | '}' => 334,
        '|' => 260,
        _ => 556,
    }
}

pub(crate) fn save(doc: &mut Document) -> ToolResult<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}
