use crate::errors::CasError;
use crate::lookup::SchemeLookup;
use crate::pdftext::rowgroup::LINE_SEPARATOR;
use crate::statement::model::{
    CasType, Folio, Scheme, SchemeValuation, StatementPeriod,
};

use super::lines::normalize_scheme_name;
use super::regex::{SUMMARY_DATE_RE, SUMMARY_ROW_RE};
use super::ProcessedCas;
use crate::util::date::parse_cas_date;
use crate::util::decimal::parse_cas_decimal;

pub fn parse_header(text: &str) -> Result<StatementPeriod, CasError> {
    let m = SUMMARY_DATE_RE.captures(text).ok_or_else(|| {
        CasError::HeaderParse("error parsing CAS header".to_string())
    })?;
    let date = m.name("date").unwrap().as_str().to_string();
    Ok(StatementPeriod {
        from_: date.clone(),
        to: date,
    })
}

/// Process the text of a summary (balances-only) statement. Each row is a
/// complete scheme snapshot; there are no transactions.
pub fn process_summary_text(
    text: &str,
    lookup: &dyn SchemeLookup,
) -> Result<ProcessedCas, CasError> {
    let statement_period = parse_header(super::head(text, 1000))?;

    let mut folios: Vec<Folio> = Vec::new();
    let mut current_folio: Option<usize> = None;
    let mut scheme: Option<Scheme> = None;

    for line in text.split(LINE_SEPARATOR) {
        if !folios.is_empty() && line.to_lowercase().contains("total") {
            break;
        }
        let m = match SUMMARY_ROW_RE.captures(line) {
            Some(m) => m,
            None => continue,
        };

        let name = normalize_scheme_name(m.get(3).unwrap().as_str());
        let is_new_scheme = scheme
            .as_ref()
            .map(|s| s.scheme != name)
            .unwrap_or(true);
        if !is_new_scheme {
            continue;
        }
        // Flush the previous scheme into its own folio before any folio
        // switch on this row.
        if let Some(prev) = scheme.take() {
            let idx = current_folio.expect("scheme without folio");
            folios[idx].schemes.push(prev);
        }

        let folio_number = m.get(1).unwrap().as_str().trim().to_string();
        let is_new_folio = current_folio
            .map(|i| folios[i].folio != folio_number)
            .unwrap_or(true);
        if is_new_folio {
            folios.push(Folio {
                folio: folio_number,
                amc: String::new(),
                pan: None,
                kyc: None,
                pan_kyc: None,
                schemes: Vec::new(),
            });
            current_folio = Some(folios.len() - 1);
        }

        let balance = parse_cas_decimal(m.get(4).unwrap().as_str())
            .map_err(CasError::Layout)?;
        let date = parse_cas_date(m.get(5).unwrap().as_str())
            .map_err(|e| CasError::Layout(e.to_string()))?;
        let nav = parse_cas_decimal(m.get(6).unwrap().as_str())
            .map_err(CasError::Layout)?;
        let value = parse_cas_decimal(m.get(7).unwrap().as_str())
            .map_err(CasError::Layout)?;

        let mut s = Scheme::new(
            name,
            None,
            m.get(2).unwrap().as_str().trim().to_string(),
            m.get(8).unwrap().as_str().trim().to_string(),
        );
        s.open = balance;
        s.close = balance;
        s.close_calculated = balance;
        s.valuation = SchemeValuation {
            date: Some(date),
            nav,
            value,
            cost: None,
        };
        if let Some(info) = lookup.resolve_scheme(&s.scheme, &s.rta, &s.rta_code)
        {
            s.isin = Some(info.isin);
            s.amfi = Some(info.amfi_code);
            s.fund_type = info.fund_type;
        }
        scheme = Some(s);
    }

    if let Some(prev) = scheme.take() {
        let idx = current_folio.expect("scheme without folio");
        folios[idx].schemes.push(prev);
    }

    Ok(ProcessedCas {
        cas_type: CasType::Summary,
        statement_period,
        folios,
    })
}

// MARK: tests

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::lookup::NullLookup;
    use crate::statement::model::CasType;

    use super::process_summary_text;

    fn summary_text() -> String {
        vec![
            "Consolidated Account Summary",
            "As on 31-Mar-2021",
            "1234567 / 89  S1-Some Equity Fund - Growth  100.000  31-Mar-2021  50.00  5,000.00  CAMS",
            "1234567 / 89  D7-Some Debt Fund  200.000  31-Mar-2021  10.00  2,000.00  KFINTECH",
            "Total\t\t7,000.00",
        ]
        .join("\u{2029}")
    }

    #[test]
    fn test_process_summary() {
        let data = process_summary_text(&summary_text(), &NullLookup).unwrap();
        assert_eq!(data.cas_type, CasType::Summary);
        assert_eq!(data.statement_period.from_, "31-Mar-2021");
        assert_eq!(data.statement_period.to, "31-Mar-2021");

        assert_eq!(data.folios.len(), 1);
        let schemes = &data.folios[0].schemes;
        assert_eq!(schemes.len(), 2);

        assert_eq!(schemes[0].scheme, "Some Equity Fund - Growth");
        assert_eq!(schemes[0].open, dec!(100));
        assert_eq!(schemes[0].close, dec!(100));
        assert_eq!(schemes[0].valuation.nav, dec!(50.00));
        assert_eq!(schemes[0].valuation.value, dec!(5000.00));
        assert!(schemes[0].transactions.is_empty());

        assert_eq!(schemes[1].rta, "KFINTECH");
        assert_eq!(schemes[1].rta_code, "D7");
    }

    #[test]
    fn test_stops_at_total_row() {
        let mut text = summary_text();
        text.push_str("\u{2029}999999  X1-Phantom Fund  1.000  31-Mar-2021  1.00  1.00  CAMS");
        let data = process_summary_text(&text, &NullLookup).unwrap();
        // The row after "Total" is never reached.
        assert_eq!(data.folios.len(), 1);
        assert_eq!(data.folios[0].schemes.len(), 2);
    }
}
