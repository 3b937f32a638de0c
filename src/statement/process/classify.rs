use rust_decimal::Decimal;

use crate::statement::model::TransactionType;
use crate::util::decimal::{is_negative, is_positive};

use super::regex::DIVIDEND_RE;

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Classify a transaction from its description text and signed unit delta.
/// Pure function: the same inputs always produce the same type and
/// dividend rate.
pub fn classify_transaction(
    description: &str,
    units: Option<Decimal>,
) -> (TransactionType, Option<Decimal>) {
    let description = description.to_lowercase();

    if let Some(m) = DIVIDEND_RE.captures(&description) {
        let rate = Decimal::from_str_exact(m.get(1).unwrap().as_str()).ok();
        let txn_type = if description.contains("reinvest") {
            TransactionType::DividendReinvest
        } else {
            TransactionType::DividendPayout
        };
        return (txn_type, rate);
    }

    let txn_type = match units {
        None => {
            if description.contains("stt") {
                TransactionType::SttTax
            } else if description.contains("stamp") {
                TransactionType::StampDutyTax
            } else if description.contains("tds") {
                TransactionType::TdsTax
            } else if description.contains("segregat") {
                TransactionType::Segregation
            } else {
                TransactionType::Misc
            }
        }
        Some(units) if is_positive(&units) => {
            if description.contains("switch") {
                if description.contains("merger") {
                    TransactionType::SwitchInMerger
                } else {
                    TransactionType::SwitchIn
                }
            } else if contains_any(
                &description,
                &["sip", "systematic", "instalment"],
            ) {
                TransactionType::PurchaseSip
            } else {
                TransactionType::Purchase
            }
        }
        Some(units) if is_negative(&units) => {
            if contains_any(
                &description,
                &["reversal", "rejection", "dishonoured"],
            ) {
                TransactionType::Reversal
            } else if description.contains("switch") {
                if description.contains("merger") {
                    TransactionType::SwitchOutMerger
                } else {
                    TransactionType::SwitchOut
                }
            } else {
                TransactionType::Redemption
            }
        }
        Some(_) => {
            tracing::warn!(
                "could not identify transaction type for \"{}\" with zero units",
                description
            );
            TransactionType::Unknown
        }
    };

    (txn_type, None)
}

// MARK: tests

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::statement::model::TransactionType;

    use super::classify_transaction;

    fn t(description: &str, units: Option<Decimal>) -> TransactionType {
        classify_transaction(description, units).0
    }

    #[test]
    fn test_purchases() {
        assert_eq!(t("Purchase", Some(dec!(10))), TransactionType::Purchase);
        assert_eq!(
            t("Purchase - SIP", Some(dec!(10))),
            TransactionType::PurchaseSip
        );
        assert_eq!(
            t("Systematic Investment (1)", Some(dec!(10))),
            TransactionType::PurchaseSip
        );
        assert_eq!(
            t("Purchase Instalment No - 2", Some(dec!(10))),
            TransactionType::PurchaseSip
        );
    }

    #[test]
    fn test_redemptions_and_reversals() {
        assert_eq!(
            t("Redemption", Some(dec!(-10))),
            TransactionType::Redemption
        );
        assert_eq!(
            t("Purchase Reversal", Some(dec!(-10))),
            TransactionType::Reversal
        );
        assert_eq!(
            t("Rejection A/c closed", Some(dec!(-10))),
            TransactionType::Reversal
        );
        assert_eq!(
            t("SIP Cheque Dishonoured", Some(dec!(-10))),
            TransactionType::Reversal
        );
    }

    #[test]
    fn test_switches() {
        assert_eq!(
            t("Switch In - From Other Fund", Some(dec!(10))),
            TransactionType::SwitchIn
        );
        assert_eq!(
            t("Switch In - Merger", Some(dec!(10))),
            TransactionType::SwitchInMerger
        );
        assert_eq!(
            t("Switch Out - To Other Fund", Some(dec!(-10))),
            TransactionType::SwitchOut
        );
        assert_eq!(
            t("Switch Out - Merger", Some(dec!(-10))),
            TransactionType::SwitchOutMerger
        );
    }

    #[test]
    fn test_taxes_and_misc() {
        assert_eq!(t("*** STT Paid ***", None), TransactionType::SttTax);
        assert_eq!(t("*** Stamp Duty ***", None), TransactionType::StampDutyTax);
        assert_eq!(t("*** TDS on Above ***", None), TransactionType::TdsTax);
        assert_eq!(
            t("*** Creation of units - Segregated Portfolio ***", None),
            TransactionType::Segregation
        );
        assert_eq!(t("Address updated", None), TransactionType::Misc);
    }

    #[test]
    fn test_dividends() {
        let (txn_type, rate) = classify_transaction(
            "Dividend Paid @ Rs. 2.50 per unit",
            Some(dec!(0)),
        );
        assert_eq!(txn_type, TransactionType::DividendPayout);
        assert_eq!(rate, Some(dec!(2.50)));

        let (txn_type, rate) = classify_transaction(
            "IDCW Reinvested @ Rs. 0.75 per unit",
            Some(dec!(1.234)),
        );
        assert_eq!(txn_type, TransactionType::DividendReinvest);
        assert_eq!(rate, Some(dec!(0.75)));
    }

    #[test]
    fn test_zero_units_is_unknown() {
        assert_eq!(t("Mystery entry", Some(dec!(0))), TransactionType::Unknown);
    }

    #[test]
    fn test_classification_is_pure() {
        for _ in 0..3 {
            assert_eq!(
                classify_transaction("Redemption", Some(dec!(-1))),
                (TransactionType::Redemption, None)
            );
        }
    }
}
