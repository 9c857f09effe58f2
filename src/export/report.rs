use std::fmt::Write;

use crate::core::{Advisory, AssumptionSet, ResultSet};

use super::format::{NOT_APPLICABLE, metric_pct, metric_ratio, metric_usd, usd};

const RULE: &str = "----------------------------------------------";

fn line(out: &mut String, label: &str, value: &str) {
    let _ = writeln!(out, "{label:<32}{value:>14}");
}

fn or_zero(value: String) -> String {
    if value.is_empty() { "0".to_string() } else { value }
}

/// Printable plain-text report for one property.
pub fn text_report(a: &AssumptionSet, r: &ResultSet, advisories: &[Advisory]) -> String {
    let mut out = String::new();
    out.push_str("RentMax Report\n");
    out.push_str(RULE);
    out.push('\n');

    let address = if a.address.trim().is_empty() {
        NOT_APPLICABLE
    } else {
        a.address.trim()
    };
    line(&mut out, "Address", address);
    let facts = format!(
        "{} / {} / {}",
        or_zero(a.beds.to_string()),
        or_zero(a.baths.to_string()),
        or_zero(a.sqft.to_string())
    );
    line(&mut out, "Beds / Baths / SqFt", &facts);
    out.push_str(RULE);
    out.push('\n');

    line(&mut out, "Suggested Rent (Low)", &usd(r.rent_low));
    line(&mut out, "Suggested Rent (Mid / Target)", &usd(r.rent_mid));
    line(&mut out, "Suggested Rent (High)", &usd(r.rent_high));
    out.push_str(RULE);
    out.push('\n');

    line(&mut out, "Vacancy (monthly)", &format!("-{}", usd(r.vacancy)));
    line(&mut out, "Mgmt Fee (monthly)", &format!("-{}", usd(r.mgmt_fee)));
    line(&mut out, "Effective Rent", &usd(r.effective_rent_mid));
    out.push_str(RULE);
    out.push('\n');

    line(&mut out, "Property Tax (monthly)", &format!("-{}", usd(r.tax_monthly)));
    line(
        &mut out,
        "Other Fixed (ins/HOA/maint/PMI)",
        &format!("-{}", usd(r.other_fixed)),
    );
    line(&mut out, "P&I (monthly)", &format!("-{}", usd(r.monthly_pi)));
    if r.monthly_pmi > 0.0 {
        line(&mut out, "PMI (monthly)", &format!("-{}", usd(r.monthly_pmi)));
    }
    out.push_str(RULE);
    out.push('\n');

    line(&mut out, "Monthly Cash Flow", &usd(r.monthly_cash_flow));
    line(&mut out, "Annual Profit", &usd(r.annual_profit));
    out.push_str(RULE);
    out.push('\n');

    line(&mut out, "NOI (annual)", &usd(r.noi));
    line(&mut out, "Cap Rate", &metric_pct(r.cap_rate));
    line(&mut out, "DSCR", &metric_ratio(r.dscr));
    line(&mut out, "Cash-on-Cash", &metric_pct(r.cash_on_cash));
    line(&mut out, "Break-Even Rent", &metric_usd(r.break_even_rent));
    line(
        &mut out,
        "Break-Even Occupancy",
        &metric_pct(r.break_even_occ.map(|x| x * 100.0)),
    );

    if !advisories.is_empty() {
        out.push_str(RULE);
        out.push('\n');
        for note in advisories {
            let _ = writeln!(out, "* {note}");
        }
    }

    out.push_str(RULE);
    out.push('\n');
    out.push_str("Disclaimer: This report is for informational purposes only and is not financial advice.\n");
    out
}
