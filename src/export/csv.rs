use std::collections::BTreeMap;

use crate::core::{AssumptionSet, Metric, ResultSet};
use crate::scenario::{PortfolioRow, Scenario};

use super::format::{round_to, two_places, whole};

const REPORT_HEADERS: [&str; 36] = [
    "Address",
    "Beds",
    "Baths",
    "SqFt",
    "TargetRent",
    "VacancyRatePct",
    "MgmtFeePct",
    "Insurance",
    "HOA",
    "Maintenance",
    "MortgagePI",
    "PropertyTaxAnnual",
    "PurchasePrice",
    "DownPct",
    "RatePct",
    "TermYears",
    "PMIAnnualPct",
    "ClosingCostPct",
    "SuggestedRentLow",
    "SuggestedRentMid",
    "SuggestedRentHigh",
    "VacancyMonthly",
    "MgmtFeeMonthly",
    "EffectiveRentMid",
    "PropertyTaxMonthly",
    "OtherFixedCosts",
    "MonthlyPI",
    "MonthlyPMI",
    "MonthlyCashFlow",
    "AnnualProfit",
    "NOI",
    "CapRatePct",
    "DSCR",
    "CashOnCashPct",
    "BreakEvenRent",
    "BreakEvenOccPct",
];

const PORTFOLIO_HEADERS: [&str; 9] = [
    "Name",
    "Address",
    "Rent",
    "MonthlyCF",
    "NOI",
    "CapRate%",
    "DSCR",
    "CoC%",
    "CreatedAt",
];

/// Quotes every cell and doubles embedded quotes.
pub fn csv_escape(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn join_row<S: AsRef<str>>(cells: &[S]) -> String {
    cells
        .iter()
        .map(|c| csv_escape(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

fn metric_cell(m: Metric, f: impl FnOnce(f64) -> String) -> String {
    m.value().map(f).unwrap_or_default()
}

/// The header line is left unquoted; value cells are always quoted.
pub fn report_csv(a: &AssumptionSet, r: &ResultSet) -> String {
    let values: Vec<String> = vec![
        a.address.clone(),
        a.beds.to_string(),
        a.baths.to_string(),
        a.sqft.to_string(),
        a.target_rent.to_string(),
        a.vacancy_rate_pct.to_string(),
        a.mgmt_fee_pct.to_string(),
        a.insurance.to_string(),
        a.hoa.to_string(),
        a.maintenance.to_string(),
        a.mortgage_pi.to_string(),
        a.property_tax_annual.to_string(),
        a.purchase_price.to_string(),
        a.down_pct.to_string(),
        a.rate_pct.to_string(),
        a.term_years.to_string(),
        a.pmi_annual_pct.to_string(),
        a.closing_cost_pct.to_string(),
        whole(r.rent_low),
        whole(r.rent_mid),
        whole(r.rent_high),
        whole(r.vacancy),
        whole(r.mgmt_fee),
        whole(r.effective_rent_mid),
        whole(r.tax_monthly),
        whole(r.other_fixed),
        whole(r.monthly_pi),
        whole(r.monthly_pmi),
        whole(r.monthly_cash_flow),
        whole(r.annual_profit),
        whole(r.noi),
        metric_cell(r.cap_rate, two_places),
        metric_cell(r.dscr, two_places),
        metric_cell(r.cash_on_cash, two_places),
        metric_cell(r.break_even_rent, whole),
        metric_cell(r.break_even_occ, |v| format!("{}", round_to(v * 100.0, 2))),
    ];
    format!("{}\n{}\n", REPORT_HEADERS.join(","), join_row(&values))
}

pub fn portfolio_csv(rows: &[PortfolioRow]) -> String {
    let mut lines = vec![PORTFOLIO_HEADERS.join(",")];
    for row in rows {
        let cells = [
            row.name.clone(),
            row.address.clone(),
            whole(row.rent),
            whole(row.cash_flow),
            whole(row.noi),
            metric_cell(row.cap_rate, two_places),
            metric_cell(row.dscr, two_places),
            metric_cell(row.cash_on_cash, two_places),
            row.created_at.to_rfc3339(),
        ];
        lines.push(join_row(&cells));
    }
    lines.join("\n") + "\n"
}

/// A header row plus one header-keyed map per data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<BTreeMap<String, String>>,
}

/// Splits one line on commas outside quotes. Cells are trimmed.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    cur.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => cur.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => out.push(std::mem::take(&mut cur)),
                _ => cur.push(c),
            }
        }
    }
    out.push(cur);
    out.into_iter().map(|s| s.trim().to_string()).collect()
}

/// Line-oriented: quoted cells may not span lines. Blank lines are skipped.
pub fn parse_csv(text: &str) -> CsvTable {
    let cleaned = text.replace('\r', "");
    let mut lines = cleaned.lines().filter(|l| !l.is_empty());
    let Some(header_line) = lines.next() else {
        return CsvTable {
            headers: Vec::new(),
            rows: Vec::new(),
        };
    };
    let headers = split_csv_line(header_line);
    let rows = lines
        .map(|line| {
            let mut cells = split_csv_line(line).into_iter();
            headers
                .iter()
                .map(|h| (h.clone(), cells.next().unwrap_or_default()))
                .collect()
        })
        .collect();
    CsvTable { headers, rows }
}

fn guess_field(header: &str) -> Option<&'static str> {
    let k: String = header
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    let rules: [(bool, &'static str); 16] = [
        (k.contains("address"), "address"),
        (k == "bed" || k.contains("beds"), "beds"),
        (k.contains("bath"), "baths"),
        (k.contains("sqft") || k.contains("squarefeet"), "sqft"),
        (k.contains("rent"), "targetRent"),
        (k.contains("vac"), "vacancyRatePct"),
        (k.contains("mgmt") || k.contains("manage"), "mgmtFeePct"),
        (k.contains("ins"), "insurance"),
        (k == "hoa", "hoa"),
        (k.contains("maint"), "maintenance"),
        (k.contains("mort") && k.contains("pi"), "mortgagePI"),
        (k.contains("tax"), "propertyTaxAnnual"),
        (k.contains("price"), "purchasePrice"),
        (k.contains("down"), "downPct"),
        (k.contains("rate"), "ratePct"),
        (k.contains("term"), "termYears"),
    ];
    rules.iter().find(|(hit, _)| *hit).map(|(_, field)| *field)
}

/// Guesses which header feeds each form field. A later header claiming the
/// same field wins. Target rent always gets a column when any header exists.
pub fn guess_mapping(headers: &[String]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for header in headers {
        if let Some(field) = guess_field(header) {
            map.insert(field.to_string(), header.clone());
        }
    }
    if !map.contains_key("targetRent") {
        let fallback = headers
            .iter()
            .find(|h| h.to_lowercase().contains("rent"))
            .or_else(|| headers.first());
        if let Some(h) = fallback {
            map.insert("targetRent".to_string(), h.clone());
        }
    }
    map
}

/// Builds one scenario per row over the form defaults. `mapping` is
/// field key to header.
pub fn scenarios_from_table(table: &CsvTable, mapping: &BTreeMap<String, String>) -> Vec<Scenario> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut values = AssumptionSet::form_defaults();
            for (field, header) in mapping {
                if header.is_empty() {
                    continue;
                }
                let cell = row.get(header).map(String::as_str).unwrap_or("");
                if !values.set_text(field, cell) {
                    tracing::debug!(field = %field, "ignoring unknown CSV mapping field");
                }
            }
            let fallback = format!("Imported {}", i + 1);
            let name = if values.address.trim().is_empty() {
                fallback
            } else {
                values.address.trim().to_string()
            };
            Scenario::new(&name, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldValue, compute};
    use crate::scenario::{SortDirection, SortKey, portfolio};

    #[test]
    fn escape_quotes_every_cell() {
        assert_eq!(csv_escape("plain"), "\"plain\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_escape(""), "\"\"");
    }

    #[test]
    fn report_csv_for_default_form() {
        let a = AssumptionSet::form_defaults();
        let csv = report_csv(&a, &compute(&a));
        let mut lines = csv.lines();
        let header = lines.next().expect("header");
        let values = lines.next().expect("values");
        assert_eq!(header.split(',').count(), 36);
        assert!(header.starts_with("Address,Beds,Baths,SqFt,TargetRent"));

        let cells = split_csv_line(values);
        assert_eq!(cells.len(), 36);
        assert_eq!(cells[0], "");
        assert_eq!(cells[4], "13500");
        assert_eq!(cells[18], "13163");
        assert_eq!(cells[19], "13500");
        assert_eq!(cells[20], "13837");
        assert_eq!(cells[23], "12825");
        assert_eq!(cells[28], "9320");
        assert_eq!(cells[29], "111840");
        assert_eq!(cells[31], "", "cap rate is not applicable");
        assert_eq!(cells[32], "", "dscr is not applicable");
        assert_eq!(cells[34], "3689");
        assert_eq!(cells[35], "25.96");
    }

    #[test]
    fn portfolio_csv_lists_rows() {
        let mut values = AssumptionSet::form_defaults();
        values.address = "1 \"Main\" St".to_string();
        let scenarios = vec![Scenario::new("Home", values)];
        let rows = portfolio(&scenarios, "", SortKey::Name, SortDirection::Ascending);
        let csv = portfolio_csv(&rows);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Name,Address,Rent,MonthlyCF,NOI,CapRate%,DSCR,CoC%,CreatedAt");
        assert!(lines[1].starts_with("\"Home\",\"1 \"\"Main\"\" St\",\"13500\",\"9320\""));
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn split_handles_quotes_and_escapes() {
        assert_eq!(
            split_csv_line(r#" a ,"b, c","say ""hi""",,"#),
            vec!["a", "b, c", "say \"hi\"", "", ""]
        );
    }

    #[test]
    fn parse_skips_blank_lines_and_pads_short_rows() {
        let table = parse_csv("Address,Rent\r\n\r\n1 Main,2000\n2 Elm\n");
        assert_eq!(table.headers, vec!["Address", "Rent"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["Rent"], "2000");
        assert_eq!(table.rows[1]["Rent"], "");
    }

    #[test]
    fn parse_empty_text_has_no_headers() {
        let table = parse_csv("");
        assert!(table.headers.is_empty());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn mapping_guesses_common_headers() {
        let headers: Vec<String> = [
            "Property Address",
            "Beds",
            "Bathrooms",
            "Sq Ft",
            "Monthly Rent",
            "Vacancy %",
            "Management Fee",
            "Insurance",
            "HOA",
            "Maintenance",
            "Property Tax",
            "Purchase Price",
            "Down Payment",
            "Interest Rate",
            "Loan Term",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let map = guess_mapping(&headers);
        assert_eq!(map["address"], "Property Address");
        assert_eq!(map["beds"], "Beds");
        assert_eq!(map["baths"], "Bathrooms");
        assert_eq!(map["sqft"], "Sq Ft");
        assert_eq!(map["targetRent"], "Monthly Rent");
        assert_eq!(map["vacancyRatePct"], "Vacancy %");
        assert_eq!(map["mgmtFeePct"], "Management Fee");
        assert_eq!(map["insurance"], "Insurance");
        assert_eq!(map["hoa"], "HOA");
        assert_eq!(map["maintenance"], "Maintenance");
        assert_eq!(map["propertyTaxAnnual"], "Property Tax");
        assert_eq!(map["purchasePrice"], "Purchase Price");
        assert_eq!(map["downPct"], "Down Payment");
        assert_eq!(map["ratePct"], "Interest Rate");
        assert_eq!(map["termYears"], "Loan Term");
    }

    #[test]
    fn mapping_falls_back_to_first_header_for_rent() {
        let headers = vec!["Street".to_string(), "Amount".to_string()];
        let map = guess_mapping(&headers);
        assert_eq!(map["targetRent"], "Street");
    }

    #[test]
    fn import_builds_scenarios_over_defaults() {
        let table = parse_csv("Address,Rent,Taxes\n12 Oak St,\"4,100\",9000\n,2500,\n");
        let map = guess_mapping(&table.headers);
        let scenarios = scenarios_from_table(&table, &map);

        assert_eq!(scenarios.len(), 2);
        assert_eq!(scenarios[0].name, "12 Oak St");
        assert_eq!(scenarios[0].values.target_rent, FieldValue::text("4,100"));
        assert_eq!(scenarios[0].values.property_tax_annual, FieldValue::text("9000"));
        assert_eq!(scenarios[0].values.insurance, FieldValue::text("330"));
        assert_eq!(scenarios[1].name, "Imported 2");
        assert_eq!(compute(&scenarios[0].values).rent_mid, 4_100.0);
    }
}
