use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

pub use crate::pdftext::SourceType;

/// Period covered by the statement. Dates are kept as the raw strings
/// printed in the header ("01-Apr-2021"), like the statement itself.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct StatementPeriod {
    #[serde(rename = "from")]
    pub from_: String,
    pub to: String,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct InvestorInfo {
    pub name: String,
    pub email: String,
    pub address: String,
    pub mobile: String,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CasType {
    Unknown,
    Summary,
    Detailed,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundType {
    Unknown,
    Equity,
    Debt,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Purchase,
    PurchaseSip,
    Redemption,
    DividendPayout,
    DividendReinvest,
    SwitchIn,
    SwitchInMerger,
    SwitchOut,
    SwitchOutMerger,
    SttTax,
    StampDutyTax,
    TdsTax,
    Segregation,
    Reversal,
    Misc,
    Unknown,
}

impl TransactionType {
    /// Whether this entry is a tax deduction rather than a unit movement.
    pub fn is_tax(&self) -> bool {
        matches!(
            self,
            TransactionType::SttTax
                | TransactionType::StampDutyTax
                | TransactionType::TdsTax
        )
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub date: Date,
    pub description: String,
    /// Signed monetary amount. Present for all parseable entries.
    pub amount: Option<Decimal>,
    /// Signed unit delta; None for entries which do not move units
    /// (tax deductions and the like).
    pub units: Option<Decimal>,
    pub nav: Option<Decimal>,
    /// Unit balance after this transaction, as printed.
    pub balance: Option<Decimal>,
    #[serde(rename = "type")]
    pub txn_type: TransactionType,
    pub dividend_rate: Option<Decimal>,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct SchemeValuation {
    pub date: Option<Date>,
    pub nav: Decimal,
    pub value: Decimal,
    pub cost: Option<Decimal>,
}

impl Default for SchemeValuation {
    fn default() -> Self {
        SchemeValuation {
            date: None,
            nav: Decimal::ZERO,
            value: Decimal::ZERO,
            cost: None,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Scheme {
    /// Normalized scheme name (historical "(formerly ...)" suffixes
    /// stripped).
    pub scheme: String,
    pub advisor: Option<String>,
    pub rta_code: String,
    pub rta: String,
    #[serde(rename = "type")]
    pub fund_type: FundType,
    pub isin: Option<String>,
    pub amfi: Option<String>,
    pub open: Decimal,
    /// Closing unit balance as reported by the statement.
    pub close: Decimal,
    /// Closing balance recomputed from open + sum of transacted units.
    /// Divergence from `close` is a data-quality signal, not an error.
    pub close_calculated: Decimal,
    pub valuation: SchemeValuation,
    pub transactions: Vec<Transaction>,
}

impl Scheme {
    pub fn new(
        scheme: String,
        advisor: Option<String>,
        rta_code: String,
        rta: String,
    ) -> Scheme {
        Scheme {
            scheme,
            advisor,
            rta_code,
            rta,
            fund_type: FundType::Unknown,
            isin: None,
            amfi: None,
            open: Decimal::ZERO,
            close: Decimal::ZERO,
            close_calculated: Decimal::ZERO,
            valuation: SchemeValuation::default(),
            transactions: Vec::new(),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Folio {
    pub folio: String,
    pub amc: String,
    #[serde(rename = "PAN")]
    pub pan: Option<String>,
    #[serde(rename = "KYC")]
    pub kyc: Option<String>,
    #[serde(rename = "PANKYC")]
    pub pan_kyc: Option<String>,
    pub schemes: Vec<Scheme>,
}

/// A reported-vs-recomputed closing balance divergence for one scheme.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct BalanceMismatch {
    pub folio: String,
    pub scheme: String,
    pub close: Decimal,
    pub close_calculated: Decimal,
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct CasData {
    pub statement_period: StatementPeriod,
    pub folios: Vec<Folio>,
    pub investor_info: InvestorInfo,
    pub cas_type: CasType,
    pub source: SourceType,
}

impl CasData {
    /// Schemes whose reported closing balance does not match the ledger
    /// replay. Empty for a well-formed statement.
    pub fn balance_mismatches(&self) -> Vec<BalanceMismatch> {
        let mut mismatches = Vec::new();
        for folio in &self.folios {
            for scheme in &folio.schemes {
                if scheme.close != scheme.close_calculated {
                    mismatches.push(BalanceMismatch {
                        folio: folio.folio.clone(),
                        scheme: scheme.scheme.clone(),
                        close: scheme.close,
                        close_calculated: scheme.close_calculated,
                    });
                }
            }
        }
        mismatches
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn scheme_with_balances(close: Decimal, close_calculated: Decimal) -> Scheme {
        Scheme {
            close,
            close_calculated,
            ..Scheme::new(
                "Some Fund".to_string(),
                None,
                "S1".to_string(),
                "CAMS".to_string(),
            )
        }
    }

    #[test]
    fn test_balance_mismatches() {
        let data = CasData {
            statement_period: StatementPeriod {
                from_: "01-Apr-2020".to_string(),
                to: "31-Mar-2021".to_string(),
            },
            folios: vec![Folio {
                folio: "123/45".to_string(),
                amc: "Some MF".to_string(),
                pan: None,
                kyc: None,
                pan_kyc: None,
                schemes: vec![
                    scheme_with_balances(dec!(10), dec!(10)),
                    scheme_with_balances(dec!(10), dec!(9.5)),
                ],
            }],
            investor_info: InvestorInfo {
                name: String::new(),
                email: String::new(),
                address: String::new(),
                mobile: String::new(),
            },
            cas_type: CasType::Detailed,
            source: SourceType::Cams,
        };

        let mismatches = data.balance_mismatches();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].close_calculated, dec!(9.5));
    }

    #[test]
    fn test_enum_serialization_by_name() {
        assert_eq!(
            serde_json::to_string(&TransactionType::PurchaseSip).unwrap(),
            "\"PURCHASE_SIP\""
        );
        assert_eq!(
            serde_json::to_string(&FundType::Equity).unwrap(),
            "\"EQUITY\""
        );
        assert_eq!(
            serde_json::to_string(&CasType::Detailed).unwrap(),
            "\"DETAILED\""
        );
    }
}
