use rust_decimal::Decimal;

use crate::errors::CasError;
use crate::lookup::SchemeLookup;
use crate::pdftext::rowgroup::LINE_SEPARATOR;
use crate::statement::model::{
    CasType, Folio, Scheme, StatementPeriod, Transaction, TransactionType,
};

use super::classify::classify_transaction;
use super::lines::{classify_line, LineKind, TxnFields};
use super::regex::{DETAILED_DATE_RE, REGISTRAR_PUSHED_RE};
use super::ProcessedCas;

pub fn parse_header(text: &str) -> Result<StatementPeriod, CasError> {
    let m = DETAILED_DATE_RE.captures(text).ok_or_else(|| {
        CasError::HeaderParse("error parsing CAS header".to_string())
    })?;
    Ok(StatementPeriod {
        from_: m.name("from").unwrap().as_str().to_string(),
        to: m.name("to").unwrap().as_str().to_string(),
    })
}

/// Scan state for the line-oriented walk of a detailed statement.
struct ParseContext {
    amc: Option<String>,
    folios: Vec<Folio>,
    current_folio: Option<usize>,
    scheme: Option<Scheme>,
    /// Last seen running unit balance, used as the balance for entries
    /// which do not print one (tax deductions).
    balance: Decimal,
}

impl ParseContext {
    fn new() -> ParseContext {
        ParseContext {
            amc: None,
            folios: Vec::new(),
            current_folio: None,
            scheme: None,
            balance: Decimal::ZERO,
        }
    }

    fn current_folio_number(&self) -> Option<&str> {
        self.current_folio.map(|i| self.folios[i].folio.as_str())
    }

    fn flush_scheme(&mut self) {
        if let Some(scheme) = self.scheme.take() {
            // A scheme is only ever created under a folio.
            let idx = self.current_folio.expect("scheme without folio");
            self.folios[idx].schemes.push(scheme);
        }
    }
}

/// Process the text of a detailed (transaction-level) statement.
pub fn process_detailed_text(
    text: &str,
    lookup: &dyn SchemeLookup,
) -> Result<ProcessedCas, CasError> {
    let statement_period = parse_header(super::head(text, 1000))?;

    let lines: Vec<&str> = text.split(LINE_SEPARATOR).collect();
    let mut ctx = ParseContext::new();

    for idx in 0..lines.len() {
        let mut line = lines[idx].to_string();
        // Long scheme names push the Registrar column onto its own row
        // above the name; rejoin them before classification.
        if REGISTRAR_PUSHED_RE.is_match(&line) {
            if let Some(next) = lines.get(idx + 1) {
                line = format!("{}\t\t{}", next, line);
            }
        }

        match classify_line(&line) {
            LineKind::Amc(name) => {
                ctx.amc = Some(name);
            }
            LineKind::Folio(anchor) => {
                if ctx.current_folio_number() != Some(anchor.folio.as_str()) {
                    ctx.flush_scheme();
                    let folio_idx = match ctx
                        .folios
                        .iter()
                        .position(|f| f.folio == anchor.folio)
                    {
                        Some(i) => i,
                        None => {
                            ctx.folios.push(Folio {
                                folio: anchor.folio,
                                amc: ctx.amc.clone().unwrap_or_default(),
                                pan: anchor.pan,
                                kyc: anchor.kyc,
                                pan_kyc: anchor.pan_kyc,
                                schemes: Vec::new(),
                            });
                            ctx.folios.len() - 1
                        }
                    };
                    ctx.current_folio = Some(folio_idx);
                }
            }
            LineKind::Scheme(anchor) => {
                if ctx.current_folio.is_none() {
                    return Err(CasError::Layout(
                        "scheme found before folio entry".to_string(),
                    ));
                }
                let is_new = ctx
                    .scheme
                    .as_ref()
                    .map(|s| s.scheme != anchor.name)
                    .unwrap_or(true);
                if is_new {
                    ctx.flush_scheme();
                    let mut scheme = Scheme::new(
                        anchor.name,
                        anchor.advisor,
                        anchor.rta_code,
                        anchor.rta,
                    );
                    scheme.isin = anchor.isin;
                    match lookup.resolve_scheme(
                        &scheme.scheme,
                        &scheme.rta,
                        &scheme.rta_code,
                    ) {
                        Some(info) => {
                            if scheme.isin.is_none() {
                                scheme.isin = Some(info.isin);
                            }
                            scheme.amfi = Some(info.amfi_code);
                            scheme.fund_type = info.fund_type;
                        }
                        None => {
                            tracing::debug!(
                                "no ISIN match for scheme \"{}\"",
                                scheme.scheme
                            );
                        }
                    }
                    ctx.scheme = Some(scheme);
                }
            }
            LineKind::OpenUnits(units) => {
                if let Some(scheme) = ctx.scheme.as_mut() {
                    scheme.open = units;
                    scheme.close_calculated = units;
                    ctx.balance = units;
                }
            }
            LineKind::SchemeFooter(footer) => {
                if let Some(scheme) = ctx.scheme.as_mut() {
                    if let Some(close) = footer.close {
                        scheme.close = close;
                    }
                    if let Some((date, value)) = footer.valuation {
                        scheme.valuation.date = Some(date);
                        scheme.valuation.value = value;
                    }
                    if let Some((date, nav)) = footer.nav {
                        scheme.valuation.date = Some(date);
                        scheme.valuation.nav = nav;
                    }
                }
            }
            LineKind::Transaction(txn) => {
                if ctx.scheme.is_some() {
                    record_transaction(&mut ctx, txn);
                }
            }
            LineKind::Other => {}
        }
    }

    ctx.flush_scheme();

    Ok(ProcessedCas {
        cas_type: CasType::Detailed,
        statement_period,
        folios: ctx.folios,
    })
}

fn record_transaction(ctx: &mut ParseContext, txn: TxnFields) {
    let (txn_type, dividend_rate) =
        classify_transaction(&txn.description, txn.units);

    let mut amount = Some(txn.amount);
    let mut units = txn.units;
    let mut nav = txn.nav;
    let balance;

    if txn_type == TransactionType::Segregation {
        // Segregated-portfolio creation prints the unit count in the
        // amount column; the units carry no cost.
        units = Some(txn.amount);
        ctx.balance = txn.amount;
        balance = Some(txn.amount);
        amount = Some(Decimal::ZERO);
        nav = Some(Decimal::ZERO);
    } else if let Some(printed) = txn.balance {
        ctx.balance = printed;
        balance = Some(printed);
    } else if units.is_none() {
        // Tax entries do not move units; carry the running balance.
        balance = Some(ctx.balance);
    } else {
        balance = None;
    }

    let scheme = ctx.scheme.as_mut().expect("transaction without scheme");
    if let Some(u) = units {
        scheme.close_calculated += u;
    }
    scheme.transactions.push(Transaction {
        date: txn.date,
        description: txn.description,
        amount,
        units,
        nav,
        balance,
        txn_type,
        dividend_rate,
    });
}

// MARK: tests

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::errors::CasError;
    use crate::lookup::{MemoryLookup, NullLookup, SchemeInfo};
    use crate::statement::model::{FundType, TransactionType};

    use super::process_detailed_text;

    const HEADER: &str =
        "Consolidated Account Statement\u{2029}01-Apr-2020 To 31-Mar-2022";

    fn lines_to_text(lines: &[&str]) -> String {
        let mut all = vec![HEADER];
        all.extend_from_slice(lines);
        all.join("\u{2029}")
    }

    fn sample_statement() -> String {
        lines_to_text(&[
            "Axis Mutual Fund",
            "Folio No : 123456 / 78\t\tPAN : ABCDE1234F\t\tKYC : OK\t\tPAN : OK",
            "S1-Some Equity Fund - Growth (Advisor: ARN-0000)\t\tRegistrar : CAMS",
            "Opening Unit Balance: 0.000",
            "01-Jan-2021\t\tPurchase\t\t10,000.00\t\t1,000.000\t\t10.0000\t\t1,000.000",
            "01-Jan-2021\t\t*** Stamp Duty ***\t\t0.50",
            "01-Jun-2021\t\tRedemption\t\t(9,000.00)\t\t(600.000)\t\t15.0000\t\t400.000",
            "01-Jun-2021\t\t*** STT Paid ***\t\t0.09",
            "Closing Unit Balance: 400.000\t\tNAV on 31-Mar-2022: INR 16.00\t\tValuation on 31-Mar-2022: INR 6,400.00",
        ])
    }

    #[test]
    fn test_process_detailed_basic() {
        let data =
            process_detailed_text(&sample_statement(), &NullLookup).unwrap();

        assert_eq!(data.statement_period.from_, "01-Apr-2020");
        assert_eq!(data.statement_period.to, "31-Mar-2022");
        assert_eq!(data.folios.len(), 1);

        let folio = &data.folios[0];
        assert_eq!(folio.folio, "123456 / 78");
        assert_eq!(folio.amc, "Axis Mutual Fund");
        assert_eq!(folio.pan.as_deref(), Some("ABCDE1234F"));
        assert_eq!(folio.schemes.len(), 1);

        let scheme = &folio.schemes[0];
        assert_eq!(scheme.scheme, "Some Equity Fund - Growth");
        assert_eq!(scheme.rta_code, "S1");
        assert_eq!(scheme.open, dec!(0));
        assert_eq!(scheme.close, dec!(400));
        assert_eq!(scheme.close_calculated, dec!(400));
        assert_eq!(scheme.valuation.nav, dec!(16.00));
        assert_eq!(scheme.valuation.value, dec!(6400.00));

        assert_eq!(scheme.transactions.len(), 4);
        let types: Vec<TransactionType> =
            scheme.transactions.iter().map(|t| t.txn_type).collect();
        assert_eq!(
            types,
            vec![
                TransactionType::Purchase,
                TransactionType::StampDutyTax,
                TransactionType::Redemption,
                TransactionType::SttTax,
            ]
        );

        // Tax entries carry the running balance and no units.
        let stamp = &scheme.transactions[1];
        assert_eq!(stamp.units, None);
        assert_eq!(stamp.balance, Some(dec!(1000)));
    }

    #[test]
    fn test_scheme_before_folio_is_layout_error() {
        let text = lines_to_text(&[
            "Axis Mutual Fund",
            "S1-Some Fund\t\tRegistrar : CAMS",
        ]);
        match process_detailed_text(&text, &NullLookup) {
            Err(CasError::Layout(_)) => {}
            other => panic!("expected layout error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_header_dates() {
        match process_detailed_text("no dates here", &NullLookup) {
            Err(CasError::HeaderParse(_)) => {}
            other => panic!("expected header error, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_applied_and_misses_tolerated() {
        let mut lookup = MemoryLookup::new();
        lookup.add_scheme(
            "Some Equity Fund - Growth",
            "S1",
            SchemeInfo {
                isin: "INF000000001".to_string(),
                amfi_code: "100001".to_string(),
                fund_type: FundType::Equity,
            },
        );

        let data =
            process_detailed_text(&sample_statement(), &lookup).unwrap();
        let scheme = &data.folios[0].schemes[0];
        assert_eq!(scheme.isin.as_deref(), Some("INF000000001"));
        assert_eq!(scheme.amfi.as_deref(), Some("100001"));
        assert_eq!(scheme.fund_type, FundType::Equity);

        // Null lookup leaves identity fields empty but parsing succeeds.
        let data =
            process_detailed_text(&sample_statement(), &NullLookup).unwrap();
        let scheme = &data.folios[0].schemes[0];
        assert_eq!(scheme.isin, None);
        assert_eq!(scheme.fund_type, FundType::Unknown);
    }

    #[test]
    fn test_registrar_pushed_to_previous_line() {
        let text = lines_to_text(&[
            "Axis Mutual Fund",
            "Folio No : 111\t\tKYC : OK",
            "Registrar : KFINTECH",
            "S9-A Fund With A Particularly Long Name - Direct Growth",
            "Opening Unit Balance: 0.000",
        ]);
        let data = process_detailed_text(&text, &NullLookup).unwrap();
        let scheme = &data.folios[0].schemes[0];
        assert_eq!(
            scheme.scheme,
            "A Fund With A Particularly Long Name - Direct Growth"
        );
        assert_eq!(scheme.rta, "KFINTECH");
    }

    #[test]
    fn test_segregation_fixup() {
        let text = lines_to_text(&[
            "Some Mutual Fund",
            "Folio No : 222\t\tKYC : OK",
            "D1-Some Debt Fund\t\tRegistrar : CAMS",
            "Opening Unit Balance: 0.000",
            "01-Jan-2021\t\tPurchase\t\t1,000.00\t\t100.000\t\t10.0000\t\t100.000",
            "28-Feb-2021\t\t*** Creation of units - Segregated Portfolio ***\t\t100.000",
        ]);
        let data = process_detailed_text(&text, &NullLookup).unwrap();
        let scheme = &data.folios[0].schemes[0];
        let seg = &scheme.transactions[1];
        assert_eq!(seg.txn_type, TransactionType::Segregation);
        assert_eq!(seg.units, Some(dec!(100)));
        assert_eq!(seg.amount, Some(dec!(0)));
        assert_eq!(seg.nav, Some(dec!(0)));
        assert_eq!(scheme.close_calculated, dec!(200));
    }
}
