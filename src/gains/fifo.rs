use std::collections::VecDeque;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::Date;

use crate::errors::GainsError;
use crate::statement::model::{FundType, Transaction, TransactionType};
use crate::util::decimal::{is_negative, is_positive, round2};

use super::model::{Fund, GainEntry, Lot, MergedTransaction};

/// Sales are matched down to this epsilon to absorb unit rounding in the
/// statements.
const UNIT_EPSILON: Decimal = dec!(0.01);

/// Infer a fund's type from its transactions, for schemes the lookup
/// could not classify:
/// - Unknown when nothing but reversals ever reduced units;
/// - Equity when STT was charged;
/// - Debt otherwise.
pub fn infer_fund_type(transactions: &[Transaction]) -> FundType {
    let has_redemption = transactions.iter().any(|t| {
        matches!(t.units, Some(u) if is_negative(&u))
            && t.txn_type != TransactionType::Reversal
    });
    if !has_redemption {
        return FundType::Unknown;
    }
    if transactions
        .iter()
        .any(|t| t.txn_type == TransactionType::SttTax)
    {
        FundType::Equity
    } else {
        FundType::Debt
    }
}

/// Group transactions by date, with taxes and unit movements separated.
/// The result is ordered by date ascending; within a date, transactions
/// were folded in descending-amount order so same-day buy+sell merging is
/// deterministic.
pub fn merge_transactions(transactions: &[Transaction]) -> Vec<MergedTransaction> {
    let mut clean: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.amount.is_some())
        .collect();
    clean.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(b.amount.unwrap().cmp(&a.amount.unwrap()))
    });

    let mut merged: Vec<MergedTransaction> = Vec::new();
    for txn in clean {
        let amount = txn.amount.unwrap();
        let mt = match merged.iter_mut().find(|m| m.date == txn.date) {
            Some(m) => m,
            None => {
                merged.push(MergedTransaction::new(txn.date));
                merged.last_mut().unwrap()
            }
        };
        match txn.txn_type {
            TransactionType::SttTax => mt.stt += amount,
            TransactionType::StampDutyTax => mt.stamp_duty += amount,
            TransactionType::TdsTax => mt.tds += amount,
            TransactionType::Segregation => {
                // Segregated units come in at zero cost.
                mt.nav = Decimal::ZERO;
                mt.purchase_units += txn.units.unwrap_or(Decimal::ZERO);
            }
            _ => {
                let units = match txn.units {
                    Some(u) => u,
                    None => continue,
                };
                if is_positive(&units) {
                    mt.purchase_units += units;
                    mt.purchase_amount += amount;
                } else if is_negative(&units) {
                    mt.sale_units += -units;
                    mt.sale_amount += amount.abs();
                } else {
                    continue;
                }
                if let Some(nav) = txn.nav {
                    mt.nav = nav;
                }
            }
        }
    }
    merged
}

/// First-in first-out lot matcher for a single scheme.
#[derive(Debug)]
pub struct FifoUnits {
    pub fund: Fund,
    lots: VecDeque<Lot>,
    pub gains: Vec<GainEntry>,
    /// Purchase value currently enqueued (cost basis of unsold lots).
    pub invested: Decimal,
    pub balance_units: Decimal,
}

impl FifoUnits {
    /// Run the FIFO match over a scheme's transactions. `fund.fund_type`
    /// must already be the effective type (declared, or inferred via
    /// `infer_fund_type`).
    pub fn compute(
        fund: Fund,
        transactions: &[Transaction],
    ) -> Result<FifoUnits, GainsError> {
        let mut engine = FifoUnits {
            fund,
            lots: VecDeque::new(),
            gains: Vec::new(),
            invested: Decimal::ZERO,
            balance_units: Decimal::ZERO,
        };
        for mt in merge_transactions(transactions) {
            if is_positive(&mt.purchase_units) {
                engine.buy(mt.date, mt.purchase_units, mt.nav, mt.stamp_duty);
            }
            if is_positive(&mt.sale_units) {
                engine.sell(mt.date, mt.sale_units, mt.nav, mt.stt)?;
            }
        }
        Ok(engine)
    }

    fn buy(&mut self, date: Date, units: Decimal, nav: Decimal, tax: Decimal) {
        self.lots.push_back(Lot {
            date,
            remaining: units,
            nav,
            tax,
            original_units: units,
        });
        self.invested += round2(units * nav);
        self.balance_units += units;
    }

    fn sell(
        &mut self,
        sale_date: Date,
        quantity: Decimal,
        nav: Decimal,
        stt: Decimal,
    ) -> Result<(), GainsError> {
        let original_quantity = quantity;
        let mut pending = quantity;
        while pending > UNIT_EPSILON {
            let lot = self
                .lots
                .pop_front()
                .ok_or_else(|| GainsError::FifoUnderflow(self.fund.label()))?;
            let matched = lot.remaining.min(pending);

            let purchase_value = round2(matched * lot.nav);
            let sale_value = round2(matched * nav);
            let stamp_duty = round2(lot.tax * matched / lot.original_units);
            let stt_part = round2(stt * matched / original_quantity);

            self.gains.push(GainEntry {
                fund: self.fund.clone(),
                purchase_date: lot.date,
                purchase_nav: lot.nav,
                purchase_value,
                stamp_duty,
                sale_date,
                sale_nav: nav,
                sale_value,
                stt: stt_part,
                units: matched,
            });
            self.invested -= purchase_value;
            self.balance_units -= matched;
            pending -= matched;

            if lot.remaining > matched {
                // Partially consumed: the remainder goes back to the
                // front so the next sale keeps draining this lot first.
                self.lots.push_front(Lot {
                    remaining: lot.remaining - matched,
                    ..lot
                });
            }
        }
        Ok(())
    }
}

// MARK: tests
