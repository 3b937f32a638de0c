use rust_decimal::Decimal;

use crate::errors::CasError;
use crate::lookup::SchemeLookup;
use crate::pdftext::{
    investor, rowgroup, InputSource, LopdfTextExtractor, PlainTextExtractor,
    TextLayoutExtractor,
};
use crate::statement::model::{CasData, Folio};

use super::process::process_cas_text;

pub struct ReadOptions {
    /// Re-sort each scheme's transactions chronologically and replay the
    /// running balances when the statement printed them out of order.
    pub sort_transactions: bool,
    /// Use the plain-text extraction backend instead of the layout-aware
    /// one.
    pub plain_text_backend: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions {
            sort_transactions: true,
            plain_text_backend: false,
        }
    }
}

/// Read a CAS PDF into typed statement data.
///
/// `input` is a file path or an owned readable stream; `password`
/// decrypts the PDF. Input, password and layout errors propagate as the
/// corresponding `CasError` kinds.
pub fn read_statement(
    input: impl Into<InputSource>,
    password: &str,
    lookup: &dyn SchemeLookup,
    opts: &ReadOptions,
) -> Result<CasData, CasError> {
    let extractor: Box<dyn TextLayoutExtractor> = if opts.plain_text_backend {
        Box::new(PlainTextExtractor)
    } else {
        Box::new(LopdfTextExtractor)
    };
    let doc = extractor.extract(input.into(), password)?;

    let first_page = doc.pages.first().ok_or_else(|| {
        CasError::HeaderParse("document has no pages".to_string())
    })?;
    let investor_info = investor::parse_investor_info(first_page)?;

    let lines =
        rowgroup::group_similar_rows(&doc.pages, doc.source.row_group_tolerance());
    let text = rowgroup::join_document(&lines);
    let processed = process_cas_text(&text, lookup)?;

    let mut folios = processed.folios;
    if opts.sort_transactions {
        sort_and_replay(&mut folios);
    }

    let data = CasData {
        statement_period: processed.statement_period,
        folios,
        investor_info,
        cas_type: processed.cas_type,
        source: doc.source,
    };

    for mismatch in data.balance_mismatches() {
        tracing::warn!(
            "closing balance mismatch in \"{}\" [{}]: reported {}, calculated {}",
            mismatch.scheme,
            mismatch.folio,
            mismatch.close,
            mismatch.close_calculated
        );
    }

    Ok(data)
}

/// Chronological reconciliation: where transactions are out of date order,
/// stable-sort them by date and recompute the running balances from the
/// opening balance.
fn sort_and_replay(folios: &mut Vec<Folio>) {
    for folio in folios.iter_mut() {
        for scheme in folio.schemes.iter_mut() {
            let in_order = scheme
                .transactions
                .windows(2)
                .all(|w| w[0].date <= w[1].date);
            if in_order {
                continue;
            }
            scheme.transactions.sort_by_key(|t| t.date);
            let mut balance = scheme.open;
            for txn in scheme.transactions.iter_mut() {
                balance += txn.units.unwrap_or(Decimal::ZERO);
                txn.balance = Some(balance);
            }
        }
    }
}

// MARK: tests
