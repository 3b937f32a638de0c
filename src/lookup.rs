use std::collections::HashMap;

use rust_decimal::Decimal;
use time::Date;

use crate::statement::model::FundType;

/// Result of a successful scheme-identity lookup.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SchemeInfo {
    pub isin: String,
    pub amfi_code: String,
    pub fund_type: FundType,
}

/// Read-only scheme/NAV lookup service, injected into the pipeline.
///
/// Implementations must never fail on a miss: a scheme or NAV that cannot
/// be resolved returns None and the caller degrades gracefully. The same
/// instance may be reused across many documents; nothing here is mutated
/// by the pipeline.
pub trait SchemeLookup {
    /// Resolve a scheme's canonical identity (ISIN, AMFI code, fund type)
    /// from its statement name and registrar data.
    fn resolve_scheme(
        &self,
        scheme_name: &str,
        rta: &str,
        rta_code: &str,
    ) -> Option<SchemeInfo>;

    /// NAV of a security on a given date (used for the fair-market-value
    /// lookup at the grandfathering cutoff).
    fn nav_on(&self, isin: &str, date: Date) -> Option<Decimal>;
}

/// Lookup that resolves nothing. Parsing still succeeds; identity fields
/// stay empty and gains fall back to purchase values for FMV.
pub struct NullLookup;

impl SchemeLookup for NullLookup {
    fn resolve_scheme(&self, _: &str, _: &str, _: &str) -> Option<SchemeInfo> {
        None
    }

    fn nav_on(&self, _: &str, _: Date) -> Option<Decimal> {
        None
    }
}

/// In-memory lookup table. Schemes are keyed by RTA code, with a
/// fallback match on the scheme name.
#[derive(Default)]
pub struct MemoryLookup {
    by_rta_code: HashMap<String, SchemeInfo>,
    by_name: HashMap<String, SchemeInfo>,
    navs: HashMap<(String, Date), Decimal>,
}

impl MemoryLookup {
    pub fn new() -> MemoryLookup {
        MemoryLookup::default()
    }

    pub fn add_scheme(&mut self, name: &str, rta_code: &str, info: SchemeInfo) {
        self.by_rta_code.insert(rta_code.to_string(), info.clone());
        self.by_name.insert(name.to_string(), info);
    }

    pub fn add_nav(&mut self, isin: &str, date: Date, nav: Decimal) {
        self.navs.insert((isin.to_string(), date), nav);
    }
}

impl SchemeLookup for MemoryLookup {
    fn resolve_scheme(
        &self,
        scheme_name: &str,
        _rta: &str,
        rta_code: &str,
    ) -> Option<SchemeInfo> {
        self.by_rta_code
            .get(rta_code)
            .or_else(|| self.by_name.get(scheme_name))
            .cloned()
    }

    fn nav_on(&self, isin: &str, date: Date) -> Option<Decimal> {
        self.navs.get(&(isin.to_string(), date)).cloned()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::{Date, Month};

    use crate::statement::model::FundType;

    use super::{MemoryLookup, NullLookup, SchemeInfo, SchemeLookup};

    #[test]
    fn test_null_lookup_misses() {
        let l = NullLookup;
        assert_eq!(l.resolve_scheme("X", "CAMS", "S1"), None);
        assert_eq!(
            l.nav_on(
                "INF000000000",
                Date::from_calendar_date(2018, Month::January, 31).unwrap()
            ),
            None
        );
    }

    #[test]
    fn test_memory_lookup() {
        let mut l = MemoryLookup::new();
        l.add_scheme(
            "Some Fund Growth",
            "S1",
            SchemeInfo {
                isin: "INF000000001".to_string(),
                amfi_code: "100001".to_string(),
                fund_type: FundType::Equity,
            },
        );
        let cutoff = Date::from_calendar_date(2018, Month::January, 31).unwrap();
        l.add_nav("INF000000001", cutoff, dec!(55.50));

        // By RTA code, then by name.
        assert!(l.resolve_scheme("whatever", "CAMS", "S1").is_some());
        let by_name = l.resolve_scheme("Some Fund Growth", "CAMS", "??").unwrap();
        assert_eq!(by_name.fund_type, FundType::Equity);
        assert_eq!(l.resolve_scheme("other", "CAMS", "??"), None);

        assert_eq!(l.nav_on("INF000000001", cutoff), Some(dec!(55.50)));
        assert_eq!(l.nav_on("INF000000002", cutoff), None);
    }
}
