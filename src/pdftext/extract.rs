use std::io::Read;
use std::path::PathBuf;

use lopdf::{content::Content, Document, Object};
use serde::{Deserialize, Serialize};

use crate::errors::CasError;

/// Registrar back-end which generated the statement. Detected from fixed
/// marker strings embedded in the document; each renderer produces slightly
/// different sub-line spacing, so the line-merge tolerance depends on it.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Unknown,
    Cams,
    Kfintech,
}

impl SourceType {
    /// Tolerance (points) for merging vertically-adjacent text into one
    /// block (wrapped cell text).
    pub fn block_merge_tolerance(&self) -> f64 {
        match self {
            SourceType::Kfintech => 2.0,
            SourceType::Cams | SourceType::Unknown => 3.0,
        }
    }

    /// Tolerance (points) for grouping blocks into one logical row.
    pub fn row_group_tolerance(&self) -> f64 {
        3.0
    }

    fn from_marker(text: &str) -> Option<SourceType> {
        if text.contains("CAMSCASWS") {
            Some(SourceType::Cams)
        } else if text.contains("KFINCASWS") {
            Some(SourceType::Kfintech)
        } else {
            None
        }
    }

    fn from_producer(producer: &str) -> Option<SourceType> {
        if producer.contains("Stimulsoft Reports") {
            Some(SourceType::Cams)
        } else if producer.contains("Data Dynamics ActiveReports") {
            Some(SourceType::Kfintech)
        } else {
            None
        }
    }
}

/// A positioned run of text on a page. Coordinates are PDF user space
/// (origin bottom-left, y increasing upward). Wrapped cell text merged from
/// adjacent lines keeps embedded '\n' separators.
#[derive(PartialEq, Clone, Debug)]
pub struct TextFragment {
    pub text: String,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl TextFragment {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct PageText {
    pub width: f64,
    pub height: f64,
    pub fragments: Vec<TextFragment>,
}

#[derive(Debug)]
pub struct ExtractedDoc {
    pub pages: Vec<PageText>,
    pub source: SourceType,
}

/// Input to the pipeline: a file path, or an owned readable stream.
/// These are the only supported source kinds; the stream is consumed and
/// dropped (closed) before extraction returns, on success or error.
pub enum InputSource {
    Path(PathBuf),
    Reader(Box<dyn Read>),
}

impl From<&str> for InputSource {
    fn from(path: &str) -> Self {
        InputSource::Path(PathBuf::from(path))
    }
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        InputSource::Path(path)
    }
}

impl From<std::fs::File> for InputSource {
    fn from(f: std::fs::File) -> Self {
        InputSource::Reader(Box::new(f))
    }
}

impl InputSource {
    /// Read the whole source into memory, closing any underlying handle.
    fn into_bytes(self) -> Result<Vec<u8>, CasError> {
        match self {
            InputSource::Path(p) => {
                if p.is_dir() {
                    return Err(CasError::UnsupportedSource(format!(
                        "{} is a directory, not a PDF file",
                        p.display()
                    )));
                }
                Ok(std::fs::read(&p)?)
            }
            InputSource::Reader(mut r) => {
                let mut buf = Vec::new();
                r.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

/// Layout-extraction backend. Produces positioned text fragments per page
/// and pins the statement source as soon as a marker is seen.
pub trait TextLayoutExtractor {
    fn extract(
        &self,
        input: InputSource,
        password: &str,
    ) -> Result<ExtractedDoc, CasError>;
}

fn load_document(input: InputSource, password: &str) -> Result<Document, CasError> {
    let bytes = input.into_bytes()?;
    let mut doc = Document::load_mem(&bytes)
        .map_err(|e| CasError::InvalidFile(e.to_string()))?;
    if doc.is_encrypted() {
        doc.decrypt(password)
            .map_err(|_| CasError::IncorrectPassword)?;
    }
    Ok(doc)
}

fn document_producer(doc: &Document) -> Option<String> {
    let info_ref = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = doc.get_dictionary(info_ref).ok()?;
    match info.get(b"Producer").ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

// CAS statements are plain latin text; a byte-wise latin-1 decode is
// sufficient and avoids per-font encoding tables.
fn decode_pdf_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

fn page_dimensions(doc: &Document, page_id: lopdf::ObjectId) -> (f64, f64) {
    // A4 portrait, which all known vendors use.
    const DEFAULT: (f64, f64) = (595.0, 842.0);
    let media_box = match doc
        .get_dictionary(page_id)
        .ok()
        .and_then(|d| d.get(b"MediaBox").ok().cloned())
    {
        Some(Object::Array(a)) if a.len() == 4 => a,
        _ => return DEFAULT,
    };
    let num = |o: &Object| -> Option<f64> {
        match o {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r as f64),
            _ => None,
        }
    };
    match (
        num(&media_box[0]),
        num(&media_box[1]),
        num(&media_box[2]),
        num(&media_box[3]),
    ) {
        (Some(x0), Some(y0), Some(x1), Some(y1)) => (x1 - x0, y1 - y0),
        _ => DEFAULT,
    }
}

// MARK: content-stream walking

/// One text-showing operation, positioned by the text matrix in effect.
struct RawSpan {
    text: String,
    x: f64,
    y: f64,
    font_size: f64,
    vertical: bool,
}

impl RawSpan {
    fn to_fragment(&self) -> TextFragment {
        // Approximate glyph metrics: ~0.5em advance per char, 0.8em
        // ascender, 0.2em descender.
        let width = 0.5 * self.font_size * self.text.chars().count() as f64;
        TextFragment {
            text: self.text.clone(),
            x0: self.x,
            y0: self.y - 0.2 * self.font_size,
            x1: self.x + width,
            y1: self.y + 0.8 * self.font_size,
        }
    }
}

#[derive(Clone, Copy)]
struct TextCursor {
    // Text line matrix translation and scale. A full 6-element matrix is
    // overkill here; we only need position, effective font scale, and
    // whether the glyphs are rotated out of the horizontal.
    x: f64,
    y: f64,
    line_x: f64,
    line_y: f64,
    scale: f64,
    leading: f64,
    font_size: f64,
    vertical: bool,
}

impl Default for TextCursor {
    fn default() -> Self {
        TextCursor {
            x: 0.0,
            y: 0.0,
            line_x: 0.0,
            line_y: 0.0,
            scale: 1.0,
            leading: 0.0,
            font_size: 12.0,
            vertical: false,
        }
    }
}

impl TextCursor {
    fn effective_font_size(&self) -> f64 {
        (self.font_size * self.scale).abs().max(1.0)
    }

    fn next_line(&mut self) {
        self.line_y -= self.leading * self.scale;
        self.x = self.line_x;
        self.y = self.line_y;
    }
}

fn operand_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn text_object_string(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Walk a page's content stream, collecting positioned spans for every
/// text-showing operator. Only translation, scale and rotation of the text
/// matrix are tracked; that is enough to order statement text and detect
/// the rotated watermark markers.
fn collect_page_spans(content: &Content) -> Vec<RawSpan> {
    let mut spans = Vec::new();
    let mut cur = TextCursor::default();

    let mut show_text = |cur: &mut TextCursor, text: String| {
        if text.is_empty() {
            return;
        }
        let advance =
            0.5 * cur.effective_font_size() * text.chars().count() as f64;
        spans.push(RawSpan {
            text,
            x: cur.x,
            y: cur.y,
            font_size: cur.effective_font_size(),
            vertical: cur.vertical,
        });
        cur.x += advance;
    };

    for op in &content.operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                cur = TextCursor {
                    font_size: cur.font_size,
                    ..TextCursor::default()
                };
            }
            "Tf" => {
                if let Some(sz) = operands.get(1).and_then(operand_f64) {
                    cur.font_size = sz;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(operand_f64) {
                    cur.leading = l;
                }
            }
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = operand_f64(&operands[0]).unwrap_or(0.0);
                    let ty = operand_f64(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        cur.leading = -ty;
                    }
                    cur.line_x += tx * cur.scale;
                    cur.line_y += ty * cur.scale;
                    cur.x = cur.line_x;
                    cur.y = cur.line_y;
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let a = operand_f64(&operands[0]).unwrap_or(1.0);
                    let b = operand_f64(&operands[1]).unwrap_or(0.0);
                    let c = operand_f64(&operands[2]).unwrap_or(0.0);
                    let d = operand_f64(&operands[3]).unwrap_or(1.0);
                    let e = operand_f64(&operands[4]).unwrap_or(0.0);
                    let f = operand_f64(&operands[5]).unwrap_or(0.0);
                    cur.line_x = e;
                    cur.line_y = f;
                    cur.x = e;
                    cur.y = f;
                    cur.scale = if a.abs() > 1e-6 { a.abs() } else { d.abs() };
                    if cur.scale < 1e-6 {
                        cur.scale = 1.0;
                    }
                    cur.vertical = b.abs() > 1e-6 || c.abs() > 1e-6;
                }
            }
            "T*" => cur.next_line(),
            "Tj" => {
                if let Some(t) = operands.first().and_then(text_object_string) {
                    show_text(&mut cur, t);
                }
            }
            "'" => {
                cur.next_line();
                if let Some(t) = operands.first().and_then(text_object_string) {
                    show_text(&mut cur, t);
                }
            }
            "\"" => {
                cur.next_line();
                if let Some(t) = operands.get(2).and_then(text_object_string) {
                    show_text(&mut cur, t);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let mut text = String::new();
                    for item in items {
                        match item {
                            Object::String(bytes, _) => {
                                text.push_str(&decode_pdf_string(bytes))
                            }
                            // Large negative kerning adjustments are how
                            // some renderers encode inter-word gaps.
                            Object::Integer(n) => {
                                if *n < -100 {
                                    text.push(' ');
                                }
                            }
                            Object::Real(n) => {
                                if *n < -100.0 {
                                    text.push(' ');
                                }
                            }
                            _ => {}
                        }
                    }
                    show_text(&mut cur, text);
                }
            }
            _ => {}
        }
    }

    spans
}

fn is_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

/// Merge baseline-level spans into fragments: spans sharing a baseline are
/// concatenated left-to-right into one fragment; fragments stacked within
/// `tol` points vertically and overlapping horizontally are merged into one
/// multi-line fragment (wrapped cell text), '\n'-joined.
fn merge_spans(spans: Vec<RawSpan>, tol: f64) -> Vec<TextFragment> {
    // Pass 1: group by baseline.
    let mut by_line: Vec<(f64, Vec<RawSpan>)> = Vec::new();
    for span in spans {
        match by_line
            .iter_mut()
            .find(|(y, _)| is_close(*y, span.y, 0.5))
        {
            Some((_, line)) => line.push(span),
            None => by_line.push((span.y, vec![span])),
        }
    }

    let mut line_frags: Vec<TextFragment> = Vec::new();
    for (_, mut line) in by_line {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap());
        let mut iter = line.into_iter();
        let first = match iter.next() {
            Some(s) => s,
            None => continue,
        };
        let mut frag = first.to_fragment();
        let mut prev_end = frag.x1;
        let space_cutoff = first.font_size;
        for span in iter {
            let next = span.to_fragment();
            if next.x0 - prev_end <= space_cutoff {
                // Same visual run; keep as one cell.
                if next.x0 - prev_end > 0.15 * span.font_size
                    && !frag.text.ends_with(' ')
                {
                    frag.text.push(' ');
                }
                frag.text.push_str(&next.text);
                prev_end = next.x1;
                frag.x1 = frag.x1.max(next.x1);
                frag.y0 = frag.y0.min(next.y0);
                frag.y1 = frag.y1.max(next.y1);
            } else {
                line_frags.push(frag);
                prev_end = next.x1;
                frag = next;
            }
        }
        line_frags.push(frag);
    }

    // Pass 2: stitch wrapped lines into blocks, top-down.
    line_frags.sort_by(|a, b| {
        b.y1.partial_cmp(&a.y1)
            .unwrap()
            .then(a.x0.partial_cmp(&b.x0).unwrap())
    });
    let mut merged: Vec<TextFragment> = Vec::new();
    for frag in line_frags {
        let target = merged.iter_mut().find(|m| {
            let v_adjacent = frag.y1 >= m.y0 - tol && frag.y0 <= m.y1 + tol;
            let h_overlap = frag.x0 < m.x1 && frag.x1 > m.x0;
            v_adjacent && h_overlap && !is_close(m.y0, frag.y0, 0.5)
        });
        match target {
            Some(m) => {
                m.text.push('\n');
                m.text.push_str(&frag.text);
                m.x0 = m.x0.min(frag.x0);
                m.x1 = m.x1.max(frag.x1);
                m.y0 = m.y0.min(frag.y0);
                m.y1 = m.y1.max(frag.y1);
            }
            None => merged.push(frag),
        }
    }

    merged.retain(|f| !f.is_blank());
    merged
}

/// High-fidelity backend: walks each page's content stream with lopdf.
pub struct LopdfTextExtractor;

impl TextLayoutExtractor for LopdfTextExtractor {
    fn extract(
        &self,
        input: InputSource,
        password: &str,
    ) -> Result<ExtractedDoc, CasError> {
        let doc = load_document(input, password)?;

        let mut source = document_producer(&doc)
            .and_then(|p| SourceType::from_producer(&p))
            .unwrap_or(SourceType::Unknown);

        let mut pages = Vec::new();
        // Pages are processed in order: the merge tolerance is pinned to
        // the source detected on earlier pages.
        for (_, page_id) in doc.get_pages() {
            let (width, height) = page_dimensions(&doc, page_id);
            let content_bytes = doc
                .get_page_content(page_id)
                .map_err(|e| CasError::InvalidFile(e.to_string()))?;
            let content = Content::decode(&content_bytes)
                .map_err(|e| CasError::InvalidFile(e.to_string()))?;
            let spans = collect_page_spans(&content);

            let (vertical, horizontal): (Vec<RawSpan>, Vec<RawSpan>) =
                spans.into_iter().partition(|s| s.vertical);
            if source == SourceType::Unknown {
                for span in vertical.iter().chain(horizontal.iter()) {
                    if let Some(s) = SourceType::from_marker(&span.text) {
                        source = s;
                        break;
                    }
                }
            }
            // Vertical text only matters for marker detection.
            let fragments =
                merge_spans(horizontal, source.block_merge_tolerance());
            pages.push(PageText {
                width,
                height,
                fragments,
            });
        }

        tracing::debug!("extracted {} pages, source {:?}", pages.len(), source);
        Ok(ExtractedDoc { pages, source })
    }
}

/// Fallback backend on top of pdf-extract's plain-text renderer. Produces
/// one full-width fragment per physical line with fabricated descending y
/// coordinates: reading order survives, precise column geometry does not.
pub struct PlainTextExtractor;

impl TextLayoutExtractor for PlainTextExtractor {
    fn extract(
        &self,
        input: InputSource,
        password: &str,
    ) -> Result<ExtractedDoc, CasError> {
        let doc = load_document(input, password)?;

        let mut source = document_producer(&doc)
            .and_then(|p| SourceType::from_producer(&p))
            .unwrap_or(SourceType::Unknown);

        // Re-serialize the (now decrypted) document for pdf-extract.
        let mut buf = Vec::new();
        {
            let mut doc = doc;
            doc.save_to(&mut buf)
                .map_err(|e| CasError::InvalidFile(e.to_string()))?;
        }
        let text = pdf_extract::extract_text_from_mem(&buf)
            .map_err(|e| CasError::InvalidFile(e.to_string()))?;

        if source == SourceType::Unknown {
            if let Some(s) = SourceType::from_marker(&text) {
                source = s;
            }
        }

        const LINE_STEP: f64 = 12.0;
        let mut y = 100_000.0;
        let mut fragments = Vec::new();
        for line in text.lines() {
            y -= LINE_STEP;
            if line.trim().is_empty() {
                continue;
            }
            fragments.push(TextFragment {
                text: line.to_string(),
                x0: 0.0,
                y0: y,
                x1: 595.0,
                y1: y + LINE_STEP * 0.8,
            });
        }

        Ok(ExtractedDoc {
            pages: vec![PageText {
                width: 595.0,
                height: 842.0,
                fragments,
            }],
            source,
        })
    }
}

// MARK: tests

#[cfg(test)]
mod tests {
    use super::{merge_spans, RawSpan, SourceType};

    fn span(text: &str, x: f64, y: f64) -> RawSpan {
        RawSpan {
            text: text.to_string(),
            x,
            y,
            font_size: 8.0,
            vertical: false,
        }
    }

    #[test]
    fn test_source_markers() {
        assert_eq!(
            SourceType::from_marker("xxCAMSCASWSyy"),
            Some(SourceType::Cams)
        );
        assert_eq!(
            SourceType::from_marker("KFINCASWS"),
            Some(SourceType::Kfintech)
        );
        assert_eq!(SourceType::from_marker("nothing"), None);

        assert_eq!(
            SourceType::from_producer("Stimulsoft Reports 2019.1"),
            Some(SourceType::Cams)
        );
        assert_eq!(
            SourceType::from_producer("Data Dynamics ActiveReports"),
            Some(SourceType::Kfintech)
        );
    }

    #[test]
    fn test_merge_spans_same_baseline() {
        // Two spans close together form one cell; a distant one stays
        // separate.
        let frags = merge_spans(
            vec![
                span("01-Apr-2021", 20.0, 700.0),
                span("Purchase", 70.0, 700.0),
                span("5,000.00", 300.0, 700.0),
            ],
            3.0,
        );
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].text, "01-Apr-2021 Purchase");
        assert_eq!(frags[1].text, "5,000.00");
    }

    #[test]
    fn test_merge_spans_wrapped_block() {
        // A second line directly below and horizontally overlapping is
        // stitched into a multi-line fragment.
        let frags = merge_spans(
            vec![
                span("Some Fund Growth", 20.0, 700.0),
                span("(formerly Old Fund)", 20.0, 691.0),
                span("Unrelated", 400.0, 650.0),
            ],
            3.0,
        );
        assert_eq!(frags.len(), 2);
        assert_eq!(frags[0].text, "Some Fund Growth\n(formerly Old Fund)");
        assert_eq!(frags[1].text, "Unrelated");
    }

    #[test]
    fn test_merge_spans_distinct_rows_not_merged() {
        // Rows further apart than the tolerance stay distinct.
        let frags = merge_spans(
            vec![span("Row one", 20.0, 700.0), span("Row two", 20.0, 650.0)],
            3.0,
        );
        assert_eq!(frags.len(), 2);
    }
}
