use std::fmt::Display;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::macros::date;
use time::Date;

use crate::errors::GainsError;
use crate::statement::model::FundType;
use crate::util::decimal::round2;

use super::cii::CiiTable;

/// Cutoff date for the equity grandfathering rule.
pub const GRANDFATHER_CUTOFF: Date = date!(2018 - 01 - 31);

/// First sale date on which grandfathered cost switches from "no gain" to
/// the FMV clamp.
pub const GRANDFATHER_SALE_CUTOFF: Date = date!(2018 - 04 - 01);

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GainType {
    Ltcg,
    Stcg,
}

/// Financial year of a date, e.g. "FY2020-21". The year boundary is
/// April 1.
pub fn get_fin_year(dt: Date) -> String {
    let (year1, year2) = if u8::from(dt.month()) > 3 {
        (dt.year(), dt.year() + 1)
    } else {
        (dt.year() - 1, dt.year())
    };
    if year1 % 100 == 99 {
        format!("FY{}-{}", year1, year2)
    } else {
        format!("FY{}-{:02}", year1, year2 % 100)
    }
}

/// `date` shifted forward by whole years; Feb 29 lands on Feb 28.
fn years_after(date: Date, years: i32) -> Date {
    Date::from_calendar_date(date.year() + years, date.month(), date.day())
        .unwrap_or_else(|_| {
            Date::from_calendar_date(
                date.year() + years,
                date.month(),
                date.day() - 1,
            )
            .unwrap()
        })
}

/// Identity of a holding for gains reporting.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Fund {
    pub scheme: String,
    pub folio: String,
    pub isin: Option<String>,
    #[serde(rename = "type")]
    pub fund_type: FundType,
}

impl Fund {
    pub fn label(&self) -> String {
        format!("{} [{}]", self.scheme, self.folio)
    }
}

impl Display for Fund {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One calendar date's net activity on a scheme, accumulated before FIFO
/// matching.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MergedTransaction {
    pub date: Date,
    pub purchase_units: Decimal,
    pub purchase_amount: Decimal,
    /// Positive magnitudes.
    pub sale_units: Decimal,
    pub sale_amount: Decimal,
    pub stamp_duty: Decimal,
    pub stt: Decimal,
    pub tds: Decimal,
    pub nav: Decimal,
}

impl MergedTransaction {
    pub fn new(date: Date) -> MergedTransaction {
        MergedTransaction {
            date,
            purchase_units: Decimal::ZERO,
            purchase_amount: Decimal::ZERO,
            sale_units: Decimal::ZERO,
            sale_amount: Decimal::ZERO,
            stamp_duty: Decimal::ZERO,
            stt: Decimal::ZERO,
            tds: Decimal::ZERO,
            nav: Decimal::ZERO,
        }
    }
}

/// A purchase lot sitting in the FIFO queue.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Lot {
    pub date: Date,
    pub remaining: Decimal,
    pub nav: Decimal,
    /// Total stamp duty paid on the original lot; prorated over matches
    /// by `original_units`.
    pub tax: Decimal,
    pub original_units: Decimal,
}

/// One realized sale-against-lot match. Immutable once created; the tax
/// derivations below are computed from the stored fields on demand.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct GainEntry {
    pub fund: Fund,
    pub purchase_date: Date,
    pub purchase_nav: Decimal,
    pub purchase_value: Decimal,
    pub stamp_duty: Decimal,
    pub sale_date: Date,
    pub sale_nav: Decimal,
    pub sale_value: Decimal,
    pub stt: Decimal,
    /// Units matched from the lot.
    pub units: Decimal,
}

impl GainEntry {
    pub fn fin_year(&self) -> String {
        get_fin_year(self.sale_date)
    }

    /// Long-term if held beyond one year (equity) or three years (debt).
    pub fn gain_type(&self) -> GainType {
        let years = match self.fund.fund_type {
            FundType::Debt => 3,
            FundType::Equity | FundType::Unknown => 1,
        };
        if self.sale_date > years_after(self.purchase_date, years) {
            GainType::Ltcg
        } else {
            GainType::Stcg
        }
    }

    pub fn gain(&self) -> Decimal {
        round2(self.sale_value - self.purchase_value)
    }

    /// Cost of acquisition for LTCG taxation.
    ///
    /// Equity follows the grandfathering rule around the 31-Jan-2018
    /// cutoff, clamping the fair market value on that date between the
    /// actual purchase and sale values. Debt cost is indexed by the
    /// cost-inflation-index ratio of the sale and purchase years.
    pub fn coa(
        &self,
        cii: &CiiTable,
        fmv: Option<Decimal>,
    ) -> Result<Decimal, GainsError> {
        match self.fund.fund_type {
            FundType::Equity | FundType::Unknown => {
                if self.purchase_date < GRANDFATHER_CUTOFF {
                    if self.sale_date < GRANDFATHER_SALE_CUTOFF {
                        Ok(self.sale_value)
                    } else {
                        let fmv = fmv.unwrap_or(self.purchase_value);
                        Ok(self
                            .purchase_value
                            .max(fmv.min(self.sale_value)))
                    }
                } else {
                    Ok(self.purchase_value)
                }
            }
            FundType::Debt => {
                let ratio = cii.ratio(
                    &get_fin_year(self.sale_date),
                    &get_fin_year(self.purchase_date),
                )?;
                Ok(round2(self.purchase_value * ratio))
            }
        }
    }

    /// Taxable long-term gain (zero for short-term entries).
    pub fn taxable_ltcg(
        &self,
        cii: &CiiTable,
        fmv: Option<Decimal>,
    ) -> Result<Decimal, GainsError> {
        if self.gain_type() != GainType::Ltcg {
            return Ok(Decimal::ZERO);
        }
        Ok(round2(self.sale_value - self.coa(cii, fmv)?))
    }
}

// MARK: tests
