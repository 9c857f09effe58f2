use std::fmt;

use serde::{Serialize, Serializer};

use super::number::to_number;
use super::types::{AssumptionSet, ResultSet};

/// Informational notes about questionable entries. They never stop
/// computation; the engine has already clamped or floored the values.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Advisory {
    VacancyOutOfRange,
    ManagementOutOfRange,
    NegativeTargetRent,
    NegativePropertyTax,
    NegativeNoi,
    DownPaymentAboveHundred,
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Advisory::VacancyOutOfRange => "Vacancy % should be 0–100 (clamped in calc).",
            Advisory::ManagementOutOfRange => "Management % should be 0–100 (clamped in calc).",
            Advisory::NegativeTargetRent => "Target Rent can’t be negative (treated as 0).",
            Advisory::NegativePropertyTax => "Property Tax can’t be negative (treated as 0).",
            Advisory::NegativeNoi => "NOI is negative — cap rate not meaningful.",
            Advisory::DownPaymentAboveHundred => {
                "Down % above 100 leaves no loan and overstates cash invested."
            }
        };
        f.write_str(msg)
    }
}

impl Serialize for Advisory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn advisories(assumptions: &AssumptionSet, results: &ResultSet) -> Vec<Advisory> {
    let out_of_range = |x: f64| !(0.0..=100.0).contains(&x);
    let mut notes = Vec::new();

    if out_of_range(to_number(&assumptions.vacancy_rate_pct)) {
        notes.push(Advisory::VacancyOutOfRange);
    }
    if out_of_range(to_number(&assumptions.mgmt_fee_pct)) {
        notes.push(Advisory::ManagementOutOfRange);
    }
    if to_number(&assumptions.target_rent) < 0.0 {
        notes.push(Advisory::NegativeTargetRent);
    }
    if to_number(&assumptions.property_tax_annual) < 0.0 {
        notes.push(Advisory::NegativePropertyTax);
    }
    if results.purchase_price > 0.0 && results.noi < 0.0 {
        notes.push(Advisory::NegativeNoi);
    }
    if to_number(&assumptions.down_pct) > 100.0 {
        notes.push(Advisory::DownPaymentAboveHundred);
    }
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compute;

    fn notes_for(a: &AssumptionSet) -> Vec<Advisory> {
        advisories(a, &compute(a))
    }

    #[test]
    fn defaults_produce_no_advisories() {
        assert!(notes_for(&AssumptionSet::form_defaults()).is_empty());
    }

    #[test]
    fn out_of_range_percentages_are_flagged() {
        let mut a = AssumptionSet::form_defaults();
        a.vacancy_rate_pct = "150".into();
        a.mgmt_fee_pct = "-1".into();
        assert_eq!(
            notes_for(&a),
            vec![Advisory::VacancyOutOfRange, Advisory::ManagementOutOfRange]
        );
    }

    #[test]
    fn negative_rent_and_tax_are_flagged() {
        let mut a = AssumptionSet::form_defaults();
        a.target_rent = "-5".into();
        a.property_tax_annual = "-1,000".into();
        let notes = notes_for(&a);
        assert!(notes.contains(&Advisory::NegativeTargetRent));
        assert!(notes.contains(&Advisory::NegativePropertyTax));
    }

    #[test]
    fn negative_noi_needs_a_purchase_price() {
        let mut a = AssumptionSet::form_defaults();
        a.target_rent = "100".into();
        assert!(!notes_for(&a).contains(&Advisory::NegativeNoi));

        a.purchase_price = "500,000".into();
        assert!(notes_for(&a).contains(&Advisory::NegativeNoi));
    }

    #[test]
    fn oversized_down_payment_is_flagged() {
        let mut a = AssumptionSet::form_defaults();
        a.down_pct = "120".into();
        assert_eq!(notes_for(&a), vec![Advisory::DownPaymentAboveHundred]);
    }

    #[test]
    fn advisories_serialize_as_messages() {
        let json = serde_json::to_string(&[Advisory::VacancyOutOfRange]).expect("serialize");
        assert_eq!(json, r#"["Vacancy % should be 0–100 (clamped in calc)."]"#);
    }
}
