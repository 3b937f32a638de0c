use std::collections::HashMap;

use itertools::Itertools;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::errors::GainsError;
use crate::lookup::SchemeLookup;
use crate::statement::model::{CasData, FundType};
use crate::util::decimal::round2;

use super::cii::CiiTable;
use super::fifo::{infer_fund_type, FifoUnits};
use super::model::{Fund, GainEntry, GainType, GRANDFATHER_CUTOFF};

/// A fund whose gains could not be computed. The rest of the report is
/// unaffected.
#[derive(Debug)]
pub struct FundError {
    pub fund: String,
    pub error: GainsError,
}

/// Aggregate gains for one (financial year, fund) group.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct SummaryRow {
    pub fin_year: String,
    pub fund: Fund,
    pub ltcg: Decimal,
    pub stcg: Decimal,
    pub taxable_ltcg: Decimal,
}

/// Unsold cost basis remaining in one fund.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct FundPosition {
    pub fund: Fund,
    pub invested: Decimal,
    pub balance_units: Decimal,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrandfatherTag {
    Grandfathered,
    PostCutoff,
}

/// One row of the Schedule-112A style consolidation: grandfathered
/// entries individually, post-cutoff entries merged per fund.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Entry112a {
    pub fund: Fund,
    pub tag: GrandfatherTag,
    /// Individual purchase date for grandfathered rows; None for the
    /// consolidated post-cutoff row.
    pub purchase_date: Option<Date>,
    pub units: Decimal,
    pub purchase_value: Decimal,
    pub sale_nav: Decimal,
    pub sale_value: Decimal,
    pub stamp_duty: Decimal,
    pub stt: Decimal,
}

/// Capital gains report over a parsed statement.
///
/// Construction fails only on the incomplete-statement precondition; FIFO
/// underflows are recorded per fund in `errors` and leave every other
/// fund's gains intact.
#[derive(Debug)]
pub struct CapitalGainsReport {
    gains: Vec<GainEntry>,
    errors: Vec<FundError>,
    positions: Vec<FundPosition>,
    cii: CiiTable,
    fmv_navs: HashMap<String, Option<Decimal>>,
}

impl CapitalGainsReport {
    pub fn new(
        data: &CasData,
        lookup: &dyn SchemeLookup,
    ) -> Result<CapitalGainsReport, GainsError> {
        CapitalGainsReport::with_cii(data, lookup, CiiTable::default())
    }

    pub fn with_cii(
        data: &CasData,
        lookup: &dyn SchemeLookup,
        cii: CiiTable,
    ) -> Result<CapitalGainsReport, GainsError> {
        let mut report = CapitalGainsReport {
            gains: Vec::new(),
            errors: Vec::new(),
            positions: Vec::new(),
            cii,
            fmv_navs: HashMap::new(),
        };

        // Hard precondition: gains are only correct with full lot
        // history, i.e. zero opening balances everywhere.
        for folio in &data.folios {
            for scheme in &folio.schemes {
                if !scheme.transactions.is_empty() && scheme.open >= dec!(0.01)
                {
                    return Err(GainsError::IncompleteStatement(format!(
                        "{} [{}]",
                        scheme.scheme, folio.folio
                    )));
                }
            }
        }

        for folio in &data.folios {
            for scheme in &folio.schemes {
                if scheme.transactions.is_empty() {
                    continue;
                }
                let fund_type = if scheme.fund_type != FundType::Unknown {
                    scheme.fund_type
                } else {
                    infer_fund_type(&scheme.transactions)
                };
                let fund = Fund {
                    scheme: scheme.scheme.clone(),
                    folio: folio.folio.clone(),
                    isin: scheme.isin.clone(),
                    fund_type,
                };
                if let Some(isin) = &fund.isin {
                    report.fmv_navs.entry(isin.clone()).or_insert_with(|| {
                        lookup.nav_on(isin, GRANDFATHER_CUTOFF)
                    });
                }
                match FifoUnits::compute(fund.clone(), &scheme.transactions) {
                    Ok(engine) => {
                        report.gains.extend(engine.gains);
                        report.positions.push(FundPosition {
                            fund,
                            invested: engine.invested,
                            balance_units: engine.balance_units,
                        });
                    }
                    Err(error) => {
                        tracing::warn!(
                            "gains computation failed for {}: {}",
                            fund.label(),
                            error
                        );
                        report.errors.push(FundError {
                            fund: fund.label(),
                            error,
                        });
                    }
                }
            }
        }

        Ok(report)
    }

    pub fn gains(&self) -> &[GainEntry] {
        &self.gains
    }

    pub fn errors(&self) -> &[FundError] {
        &self.errors
    }

    pub fn positions(&self) -> &[FundPosition] {
        &self.positions
    }

    /// Fair market value of an entry's units at the grandfathering
    /// cutoff, where the NAV is known.
    fn entry_fmv(&self, entry: &GainEntry) -> Option<Decimal> {
        let nav = entry
            .fund
            .isin
            .as_ref()
            .and_then(|isin| self.fmv_navs.get(isin))
            .copied()
            .flatten()?;
        Some(round2(entry.units * nav))
    }

    pub fn taxable_ltcg(&self, entry: &GainEntry) -> Result<Decimal, GainsError> {
        entry.taxable_ltcg(&self.cii, self.entry_fmv(entry))
    }

    /// Entries sorted for reporting: financial year, fund, sale date.
    pub fn sorted_gains(&self) -> Vec<&GainEntry> {
        let mut entries: Vec<&GainEntry> = self.gains.iter().collect();
        entries.sort_by(|a, b| {
            (a.fin_year(), a.fund.label(), a.sale_date).cmp(&(
                b.fin_year(),
                b.fund.label(),
                b.sale_date,
            ))
        });
        entries
    }

    /// Totals per (financial year, fund).
    pub fn summary(&self) -> Result<Vec<SummaryRow>, GainsError> {
        let mut rows = Vec::new();
        for ((fin_year, _), group) in &self
            .sorted_gains()
            .into_iter()
            .chunk_by(|e| (e.fin_year(), e.fund.label()))
        {
            let mut ltcg = Decimal::ZERO;
            let mut stcg = Decimal::ZERO;
            let mut taxable_ltcg = Decimal::ZERO;
            let mut fund = None;
            for entry in group {
                fund.get_or_insert_with(|| entry.fund.clone());
                match entry.gain_type() {
                    GainType::Ltcg => {
                        ltcg += entry.gain();
                        taxable_ltcg += self.taxable_ltcg(entry)?;
                    }
                    GainType::Stcg => stcg += entry.gain(),
                }
            }
            rows.push(SummaryRow {
                fin_year,
                fund: fund.expect("empty group"),
                ltcg,
                stcg,
                taxable_ltcg,
            });
        }
        Ok(rows)
    }

    /// Schedule-112A style consolidation of one financial year's
    /// long-term entries: pre-cutoff purchases pass through individually,
    /// post-cutoff purchases merge into one row per fund with a
    /// units-weighted sale NAV.
    pub fn schedule_112a(&self, fin_year: &str) -> Vec<Entry112a> {
        let mut rows = Vec::new();
        for (_, group) in &self
            .sorted_gains()
            .into_iter()
            .filter(|e| {
                e.fin_year() == fin_year && e.gain_type() == GainType::Ltcg
            })
            .chunk_by(|e| e.fund.label())
        {
            let mut consolidated: Option<Entry112a> = None;
            for entry in group {
                if entry.purchase_date <= GRANDFATHER_CUTOFF {
                    rows.push(Entry112a {
                        fund: entry.fund.clone(),
                        tag: GrandfatherTag::Grandfathered,
                        purchase_date: Some(entry.purchase_date),
                        units: entry.units,
                        purchase_value: entry.purchase_value,
                        sale_nav: entry.sale_nav,
                        sale_value: entry.sale_value,
                        stamp_duty: entry.stamp_duty,
                        stt: entry.stt,
                    });
                    continue;
                }
                let row = consolidated.get_or_insert_with(|| Entry112a {
                    fund: entry.fund.clone(),
                    tag: GrandfatherTag::PostCutoff,
                    purchase_date: None,
                    units: Decimal::ZERO,
                    purchase_value: Decimal::ZERO,
                    sale_nav: Decimal::ZERO,
                    sale_value: Decimal::ZERO,
                    stamp_duty: Decimal::ZERO,
                    stt: Decimal::ZERO,
                });
                row.units += entry.units;
                row.purchase_value += entry.purchase_value;
                row.sale_value += entry.sale_value;
                row.stamp_duty += entry.stamp_duty;
                row.stt += entry.stt;
            }
            if let Some(mut row) = consolidated {
                if !row.units.is_zero() {
                    row.sale_nav = (row.sale_value / row.units).round_dp(4);
                }
                rows.push(row);
            }
        }
        rows
    }
}

// MARK: tests

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use time::{Date, Month};

    use crate::errors::GainsError;
    use crate::lookup::{MemoryLookup, NullLookup, SchemeInfo};
    use crate::statement::model::{
        CasData, CasType, Folio, FundType, InvestorInfo, Scheme, SourceType,
        StatementPeriod, Transaction, TransactionType,
    };

    use super::super::model::GRANDFATHER_CUTOFF;
    use super::{CapitalGainsReport, GrandfatherTag};

    fn date(y: i32, m: u8, d: u8) -> Date {
        Date::from_calendar_date(y, Month::try_from(m).unwrap(), d).unwrap()
    }

    fn txn(
        d: Date,
        txn_type: TransactionType,
        amount: Decimal,
        units: Option<Decimal>,
        nav: Option<Decimal>,
    ) -> Transaction {
        Transaction {
            date: d,
            description: format!("{:?}", txn_type),
            amount: Some(amount),
            units,
            nav,
            balance: None,
            txn_type,
            dividend_rate: None,
        }
    }

    fn scheme(name: &str, transactions: Vec<Transaction>) -> Scheme {
        Scheme {
            fund_type: FundType::Equity,
            transactions,
            ..Scheme::new(
                name.to_string(),
                None,
                "S1".to_string(),
                "CAMS".to_string(),
            )
        }
    }

    fn cas_data(schemes: Vec<Scheme>) -> CasData {
        CasData {
            statement_period: StatementPeriod {
                from_: "01-Apr-2019".to_string(),
                to: "31-Mar-2022".to_string(),
            },
            folios: vec![Folio {
                folio: "123".to_string(),
                amc: "Some MF".to_string(),
                pan: None,
                kyc: None,
                pan_kyc: None,
                schemes,
            }],
            investor_info: InvestorInfo {
                name: String::new(),
                email: String::new(),
                address: String::new(),
                mobile: String::new(),
            },
            cas_type: CasType::Detailed,
            source: SourceType::Cams,
        }
    }

    fn buy_sell_scheme(name: &str) -> Scheme {
        scheme(
            name,
            vec![
                txn(
                    date(2020, 1, 1),
                    TransactionType::Purchase,
                    dec!(10000),
                    Some(dec!(1000)),
                    Some(dec!(10)),
                ),
                txn(
                    date(2021, 6, 1),
                    TransactionType::Redemption,
                    dec!(-9000),
                    Some(dec!(-600)),
                    Some(dec!(15)),
                ),
            ],
        )
    }

    #[test]
    fn test_report_basic() {
        let data = cas_data(vec![buy_sell_scheme("Fund A")]);
        let report = CapitalGainsReport::new(&data, &NullLookup).unwrap();

        assert!(report.errors().is_empty());
        assert_eq!(report.gains().len(), 1);

        let summary = report.summary().unwrap();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].fin_year, "FY2021-22");
        assert_eq!(summary[0].ltcg, dec!(3000.00));
        assert_eq!(summary[0].stcg, dec!(0));
        // No grandfathering here: taxable LTCG is the full gain.
        assert_eq!(summary[0].taxable_ltcg, dec!(3000.00));

        assert_eq!(report.positions().len(), 1);
        assert_eq!(report.positions()[0].invested, dec!(4000.00));
        assert_eq!(report.positions()[0].balance_units, dec!(400));
    }

    #[test]
    fn test_nonzero_open_aborts_whole_report() {
        let mut bad = buy_sell_scheme("Fund B");
        bad.open = dec!(5);
        let data = cas_data(vec![buy_sell_scheme("Fund A"), bad]);

        match CapitalGainsReport::new(&data, &NullLookup) {
            Err(GainsError::IncompleteStatement(s)) => {
                assert_eq!(s, "Fund B [123]");
            }
            other => panic!("expected incomplete statement, got {:?}", other),
        }
    }

    #[test]
    fn test_underflow_recorded_per_fund() {
        // Fund B redeems more than it ever bought; Fund A must still get
        // its gains.
        let bad = scheme(
            "Fund B",
            vec![
                txn(
                    date(2020, 1, 1),
                    TransactionType::Purchase,
                    dec!(1000),
                    Some(dec!(100)),
                    Some(dec!(10)),
                ),
                txn(
                    date(2020, 6, 1),
                    TransactionType::Redemption,
                    dec!(-2400),
                    Some(dec!(-200)),
                    Some(dec!(12)),
                ),
            ],
        );
        let data = cas_data(vec![buy_sell_scheme("Fund A"), bad]);
        let report = CapitalGainsReport::new(&data, &NullLookup).unwrap();

        // The broken fund contributes no (partial) gains at all.
        assert_eq!(report.gains().len(), 1);
        assert_eq!(report.errors().len(), 1);
        assert_eq!(report.errors()[0].fund, "Fund B [123]");
        assert!(matches!(
            report.errors()[0].error,
            GainsError::FifoUnderflow(_)
        ));

        let summary = report.summary().unwrap();
        let fund_a: Vec<_> = summary
            .iter()
            .filter(|r| r.fund.scheme == "Fund A")
            .collect();
        assert_eq!(fund_a.len(), 1);
        assert_eq!(fund_a[0].ltcg, dec!(3000.00));
    }

    #[test]
    fn test_grandfathered_fmv_applied_via_lookup() {
        let mut s = scheme(
            "Fund G",
            vec![
                txn(
                    date(2017, 6, 1),
                    TransactionType::Purchase,
                    dec!(1000),
                    Some(dec!(100)),
                    Some(dec!(10)),
                ),
                txn(
                    date(2019, 6, 1),
                    TransactionType::Redemption,
                    dec!(-1500),
                    Some(dec!(-100)),
                    Some(dec!(15)),
                ),
            ],
        );
        s.isin = Some("INF000000001".to_string());

        let mut lookup = MemoryLookup::new();
        lookup.add_nav("INF000000001", GRANDFATHER_CUTOFF, dec!(12));

        let data = cas_data(vec![s]);
        let report = CapitalGainsReport::new(&data, &lookup).unwrap();
        let summary = report.summary().unwrap();

        // Gain is 500, but the cost basis steps up to FMV 100 x 12.
        assert_eq!(summary[0].ltcg, dec!(500.00));
        assert_eq!(summary[0].taxable_ltcg, dec!(300.00));
    }

    #[test]
    fn test_schedule_112a_consolidation() {
        let s = scheme(
            "Fund S",
            vec![
                txn(
                    date(2017, 6, 1),
                    TransactionType::Purchase,
                    dec!(1000),
                    Some(dec!(100)),
                    Some(dec!(10)),
                ),
                txn(
                    date(2018, 6, 1),
                    TransactionType::Purchase,
                    dec!(1100),
                    Some(dec!(100)),
                    Some(dec!(11)),
                ),
                txn(
                    date(2019, 1, 10),
                    TransactionType::Purchase,
                    dec!(1200),
                    Some(dec!(100)),
                    Some(dec!(12)),
                ),
                txn(
                    date(2020, 6, 1),
                    TransactionType::Redemption,
                    dec!(-6000),
                    Some(dec!(-300)),
                    Some(dec!(20)),
                ),
            ],
        );
        let data = cas_data(vec![s]);
        let report = CapitalGainsReport::new(&data, &NullLookup).unwrap();

        let rows = report.schedule_112a("FY2020-21");
        assert_eq!(rows.len(), 2);

        let grandfathered = &rows[0];
        assert_eq!(grandfathered.tag, GrandfatherTag::Grandfathered);
        assert_eq!(grandfathered.purchase_date, Some(date(2017, 6, 1)));
        assert_eq!(grandfathered.units, dec!(100));

        let merged = &rows[1];
        assert_eq!(merged.tag, GrandfatherTag::PostCutoff);
        assert_eq!(merged.purchase_date, None);
        assert_eq!(merged.units, dec!(200));
        assert_eq!(merged.purchase_value, dec!(2300.00));
        assert_eq!(merged.sale_value, dec!(4000.00));
        assert_eq!(merged.sale_nav, dec!(20));

        // Other years are empty.
        assert!(report.schedule_112a("FY2019-20").is_empty());
    }
}
