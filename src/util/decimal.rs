use rust_decimal::{Decimal, RoundingStrategy};

use super::basic::SError;

pub fn is_positive(d: &Decimal) -> bool {
    d.is_sign_positive() && !d.is_zero()
}

pub fn is_negative(d: &Decimal) -> bool {
    d.is_sign_negative() && !d.is_zero()
}

// Round to 2 decimal places, half-up. This matches the rounding the
// statements themselves use for monetary values.
pub fn round2(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn rupee_precision_str(d: &Decimal) -> String {
    format!("{:.2}", d)
}

/// Parse a number as rendered in CAS statements: optional comma thousands
/// separators ("1,23,456.78" - Indian grouping), and negatives written
/// either with a leading '-' or wrapped in parentheses ("(123.45)").
pub fn parse_cas_decimal(s: &str) -> Result<Decimal, SError> {
    let cleaned = s.trim().replace(',', "");
    let negated = cleaned.starts_with('(');
    let cleaned = cleaned
        .trim_start_matches('(')
        .trim_end_matches(')');
    let d = Decimal::from_str_exact(cleaned)
        .map_err(|e| format!("Unable to parse decimal from \"{}\": {}", s, e))?;
    Ok(if negated { -d } else { d })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{is_negative, is_positive, parse_cas_decimal, round2};

    #[test]
    fn test_parse_cas_decimal() {
        assert_eq!(parse_cas_decimal("123.45").unwrap(), dec!(123.45));
        assert_eq!(parse_cas_decimal("1,23,456.78").unwrap(), dec!(123456.78));
        assert_eq!(parse_cas_decimal("(500.00)").unwrap(), dec!(-500.00));
        assert_eq!(parse_cas_decimal("-500.00").unwrap(), dec!(-500.00));
        assert_eq!(parse_cas_decimal(" 10 ").unwrap(), dec!(10));

        assert!(parse_cas_decimal("1.2.3").is_err());
        assert!(parse_cas_decimal("").is_err());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round2(dec!(1.0049)), dec!(1.00));
        assert_eq!(round2(dec!(3000)), dec!(3000));
    }

    #[test]
    fn test_signs() {
        assert!(is_positive(&dec!(0.01)));
        assert!(!is_positive(&dec!(0)));
        assert!(is_negative(&dec!(-0.01)));
        assert!(!is_negative(&dec!(0)));
    }
}
