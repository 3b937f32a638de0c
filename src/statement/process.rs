pub mod classify;
pub mod detailed;
pub mod lines;
pub mod regex;
pub mod summary;

use crate::errors::CasError;
use crate::lookup::SchemeLookup;
use crate::statement::model::{CasType, Folio, StatementPeriod};

/// Parsed statement body, before investor info and source are attached.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ProcessedCas {
    pub cas_type: CasType,
    pub statement_period: StatementPeriod,
    pub folios: Vec<Folio>,
}

/// Detect whether the text is a detailed statement or a summary, from the
/// document heading.
pub fn detect_cas_type(text: &str) -> CasType {
    if let Some(m) = regex::CAS_TYPE_RE.captures(text) {
        match m.get(1).unwrap().as_str().to_lowercase().trim() {
            "statement" => return CasType::Detailed,
            "summary" => return CasType::Summary,
            _ => {}
        }
    }
    CasType::Unknown
}

fn head(text: &str, n_chars: usize) -> &str {
    match text.char_indices().nth(n_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Process the text version of a CAS document (logical lines joined with
/// U+2029) into the statement body.
pub fn process_cas_text(
    text: &str,
    lookup: &dyn SchemeLookup,
) -> Result<ProcessedCas, CasError> {
    match detect_cas_type(head(text, 1000)) {
        CasType::Detailed => detailed::process_detailed_text(text, lookup),
        CasType::Summary => summary::process_summary_text(text, lookup),
        CasType::Unknown => Err(CasError::HeaderParse(
            "unknown CAS file type".to_string(),
        )),
    }
}
