use super::extract::PageText;

/// Separator between cells of one reconstructed row.
pub const CELL_SEPARATOR: &str = "\t\t";

/// Separator between logical lines of the whole document. U+2029 is the
/// Unicode paragraph separator, which does not occur in statement text.
pub const LINE_SEPARATOR: char = '\u{2029}';

pub fn is_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

/// Group each page's fragments into ordered logical rows.
///
/// Fragments are sorted into natural reading order (top of page first, then
/// left to right). A run of fragments belongs to the same row while each
/// one's bounding box top or bottom stays within `tol` points of the run's
/// starting box; the run is then flushed as one line with cells sorted by x
/// and joined with a double tab. This is lossy by design: it preserves the
/// reading order of distinguishable table rows, not exact PDF structure.
pub fn group_similar_rows(pages: &[PageText], tol: f64) -> Vec<String> {
    let mut lines = Vec::new();

    for page in pages {
        let mut sorted = page.fragments.clone();
        sorted.sort_by(|a, b| {
            b.y1.partial_cmp(&a.y1)
                .unwrap()
                .then(a.x0.partial_cmp(&b.x0).unwrap())
        });
        if sorted.is_empty() {
            continue;
        }

        let (mut y0, mut y1) = (sorted[0].y0, sorted[0].y1);
        let mut row = Vec::new();
        for frag in sorted {
            if !row.is_empty()
                && !(is_close(frag.y1, y1, tol) || is_close(frag.y0, y0, tol))
            {
                flush_row(&mut row, &mut lines);
                y0 = frag.y0;
                y1 = frag.y1;
            }
            row.push(frag);
        }
        flush_row(&mut row, &mut lines);
    }

    lines
}

fn flush_row(
    row: &mut Vec<super::extract::TextFragment>,
    lines: &mut Vec<String>,
) {
    if row.is_empty() {
        return;
    }
    row.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap());
    let line = row
        .iter()
        .map(|f| f.text.trim().to_string())
        .collect::<Vec<String>>()
        .join(CELL_SEPARATOR);
    if !line.trim().is_empty() {
        lines.push(line);
    }
    row.clear();
}

/// Join all logical lines of a document into the single text stream the
/// statement parser consumes.
pub fn join_document(lines: &[String]) -> String {
    lines.join(&LINE_SEPARATOR.to_string())
}

// MARK: tests
