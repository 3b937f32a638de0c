use rust_decimal::Decimal;

use crate::gains::report::CapitalGainsReport;
use crate::statement::model::CasData;
use crate::util::decimal::rupee_precision_str;

#[derive(Default)]
pub struct RenderTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Vec<String>,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

fn s(v: &str) -> String {
    v.to_string()
}

fn opt_dec(d: &Option<Decimal>) -> String {
    match d {
        Some(d) => d.to_string(),
        None => s("-"),
    }
}

fn opt_str(v: &Option<String>) -> String {
    match v {
        Some(v) => v.clone(),
        None => s("-"),
    }
}

/// One row per scheme: identity, balances and latest valuation.
pub fn render_holdings_table(data: &CasData) -> RenderTable {
    let mut table = RenderTable::default();
    table.header = ["folio", "scheme", "isin", "open", "close",
                    "close_calculated", "nav", "value"]
        .into_iter()
        .map(s)
        .collect();

    for folio in &data.folios {
        for scheme in &folio.schemes {
            table.rows.push(vec![
                folio.folio.clone(),
                scheme.scheme.clone(),
                opt_str(&scheme.isin),
                scheme.open.to_string(),
                scheme.close.to_string(),
                scheme.close_calculated.to_string(),
                scheme.valuation.nav.to_string(),
                rupee_precision_str(&scheme.valuation.value),
            ]);
        }
    }

    for mismatch in data.balance_mismatches() {
        table.errors.push(format!(
            "closing balance mismatch in \"{}\" [{}]: reported {}, calculated {}",
            mismatch.scheme,
            mismatch.folio,
            mismatch.close,
            mismatch.close_calculated,
        ));
    }

    table
}

/// Every transaction in the statement, one row each.
pub fn render_transactions_table(data: &CasData) -> RenderTable {
    let mut table = RenderTable::default();
    table.header = ["folio", "scheme", "date", "description", "amount",
                    "units", "nav", "balance", "type", "dividend_rate"]
        .into_iter()
        .map(s)
        .collect();

    for folio in &data.folios {
        for scheme in &folio.schemes {
            for txn in &scheme.transactions {
                table.rows.push(vec![
                    folio.folio.clone(),
                    scheme.scheme.clone(),
                    txn.date.to_string(),
                    txn.description.clone(),
                    opt_dec(&txn.amount),
                    opt_dec(&txn.units),
                    opt_dec(&txn.nav),
                    opt_dec(&txn.balance),
                    format!("{:?}", txn.txn_type),
                    opt_dec(&txn.dividend_rate),
                ]);
            }
        }
    }

    table
}

/// Aggregate gains per (financial year, fund).
pub fn render_gains_summary_table(
    report: &CapitalGainsReport,
) -> Result<RenderTable, String> {
    let mut table = RenderTable::default();
    table.header = ["fin_year", "fund", "ltcg", "stcg", "taxable_ltcg"]
        .into_iter()
        .map(s)
        .collect();

    for row in report.summary().map_err(|e| e.to_string())? {
        table.rows.push(vec![
            row.fin_year.clone(),
            row.fund.label(),
            rupee_precision_str(&row.ltcg),
            rupee_precision_str(&row.stcg),
            rupee_precision_str(&row.taxable_ltcg),
        ]);
    }

    for err in report.errors() {
        table
            .errors
            .push(format!("{}: {}", err.fund, err.error));
    }

    Ok(table)
}

/// Per-entry realized gains view.
pub fn render_gains_entries_table(
    report: &CapitalGainsReport,
) -> RenderTable {
    let mut table = RenderTable::default();
    table.header = ["fin_year", "fund", "purchase_date", "purchase_value",
                    "stamp_duty", "sale_date", "sale_value", "stt", "units",
                    "gain_type", "gain"]
        .into_iter()
        .map(s)
        .collect();

    for entry in report.sorted_gains() {
        table.rows.push(vec![
            entry.fin_year(),
            entry.fund.label(),
            entry.purchase_date.to_string(),
            rupee_precision_str(&entry.purchase_value),
            entry.stamp_duty.to_string(),
            entry.sale_date.to_string(),
            rupee_precision_str(&entry.sale_value),
            entry.stt.to_string(),
            entry.units.to_string(),
            format!("{:?}", entry.gain_type()),
            rupee_precision_str(&entry.gain()),
        ]);
    }

    table
}

/// Schedule-112A consolidation for one financial year.
pub fn render_112a_table(
    report: &CapitalGainsReport,
    fin_year: &str,
) -> RenderTable {
    let mut table = RenderTable::default();
    table.header = ["fund", "category", "purchase_date", "units",
                    "purchase_value", "sale_nav", "sale_value", "stamp_duty",
                    "stt"]
        .into_iter()
        .map(s)
        .collect();

    for row in report.schedule_112a(fin_year) {
        table.rows.push(vec![
            row.fund.label(),
            format!("{:?}", row.tag),
            row.purchase_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| s("-")),
            row.units.to_string(),
            rupee_precision_str(&row.purchase_value),
            row.sale_nav.to_string(),
            rupee_precision_str(&row.sale_value),
            row.stamp_duty.to_string(),
            row.stt.to_string(),
        ]);
    }

    table
}
