use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::store::Scenario;
use crate::core::{Metric, ResultSet, compute};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRow {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub address: String,
    pub rent: f64,
    pub cash_flow: f64,
    pub noi: f64,
    pub cap_rate: Metric,
    pub dscr: Metric,
    pub cash_on_cash: Metric,
}

impl PortfolioRow {
    fn from_scenario(scenario: &Scenario) -> Self {
        let results = compute(&scenario.values);
        Self {
            id: scenario.id.clone(),
            name: scenario.name.clone(),
            created_at: scenario.created_at,
            address: scenario.values.address.clone(),
            rent: results.rent_mid,
            cash_flow: results.monthly_cash_flow,
            noi: results.noi,
            cap_rate: results.cap_rate,
            dscr: results.dscr,
            cash_on_cash: results.cash_on_cash,
        }
    }

    fn matches(&self, query: &str) -> bool {
        query.is_empty()
            || [&self.name, &self.address]
                .iter()
                .any(|field| field.to_lowercase().contains(query))
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Name,
    Address,
    Rent,
    CashFlow,
    Noi,
    CapRate,
    Dscr,
    CashOnCash,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

enum SortValue<'a> {
    Text(&'a str),
    Time(DateTime<Utc>),
    Number(Metric),
}

fn sort_value(row: &PortfolioRow, key: SortKey) -> SortValue<'_> {
    match key {
        SortKey::CreatedAt => SortValue::Time(row.created_at),
        SortKey::Name => SortValue::Text(&row.name),
        SortKey::Address => SortValue::Text(&row.address),
        SortKey::Rent => SortValue::Number(Metric::Value(row.rent)),
        SortKey::CashFlow => SortValue::Number(Metric::Value(row.cash_flow)),
        SortKey::Noi => SortValue::Number(Metric::Value(row.noi)),
        SortKey::CapRate => SortValue::Number(row.cap_rate),
        SortKey::Dscr => SortValue::Number(row.dscr),
        SortKey::CashOnCash => SortValue::Number(row.cash_on_cash),
    }
}

/// Orders two rows; not-applicable metrics trail regardless of direction.
fn compare_rows(a: &PortfolioRow, b: &PortfolioRow, key: SortKey, dir: SortDirection) -> Ordering {
    let directed = |ord: Ordering| match dir {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
    };
    match (sort_value(a, key), sort_value(b, key)) {
        (SortValue::Text(x), SortValue::Text(y)) => directed(x.cmp(y)),
        (SortValue::Time(x), SortValue::Time(y)) => directed(x.cmp(&y)),
        (SortValue::Number(x), SortValue::Number(y)) => match (x, y) {
            (Metric::Value(x), Metric::Value(y)) => directed(x.total_cmp(&y)),
            (Metric::NotApplicable, Metric::Value(_)) => Ordering::Greater,
            (Metric::Value(_), Metric::NotApplicable) => Ordering::Less,
            (Metric::NotApplicable, Metric::NotApplicable) => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

/// Computes one row per scenario, keeps those whose name or address contains
/// `filter` (case-insensitive), and sorts them.
pub fn portfolio(
    scenarios: &[Scenario],
    filter: &str,
    key: SortKey,
    dir: SortDirection,
) -> Vec<PortfolioRow> {
    let query = filter.trim().to_lowercase();
    let mut rows: Vec<PortfolioRow> = scenarios
        .iter()
        .map(PortfolioRow::from_scenario)
        .filter(|row| row.matches(&query))
        .collect();
    rows.sort_by(|a, b| compare_rows(a, b, key, dir));
    rows
}

/// At most two scenario ids picked for side-by-side comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareSelection {
    ids: Vec<String>,
}

impl CompareSelection {
    pub const CAPACITY: usize = 2;

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Deselects a selected id; otherwise selects it, dropping the oldest
    /// pick when already full.
    pub fn toggle(&mut self, id: &str) {
        if let Some(idx) = self.ids.iter().position(|x| x == id) {
            self.ids.remove(idx);
            return;
        }
        if self.ids.len() >= Self::CAPACITY {
            self.ids.remove(0);
        }
        self.ids.push(id.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonColumn {
    pub id: String,
    pub name: String,
    pub rent: f64,
    pub monthly_cash_flow: f64,
    pub noi: f64,
    pub cap_rate: Metric,
    pub dscr: Metric,
    pub cash_on_cash: Metric,
    pub break_even_rent: Metric,
}

impl ComparisonColumn {
    fn new(id: &str, name: &str, r: &ResultSet) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rent: r.rent_mid,
            monthly_cash_flow: r.monthly_cash_flow,
            noi: r.noi,
            cap_rate: r.cap_rate,
            dscr: r.dscr,
            cash_on_cash: r.cash_on_cash,
            break_even_rent: r.break_even_rent,
        }
    }
}

/// One column per selected id. Ids with no scenario compare as blank
/// assumptions under their id.
pub fn compare(scenarios: &[Scenario], ids: &[String]) -> Vec<ComparisonColumn> {
    ids.iter()
        .map(|id| match scenarios.iter().find(|s| &s.id == id) {
            Some(s) => ComparisonColumn::new(id, &s.name, &compute(&s.values)),
            None => ComparisonColumn::new(id, id, &compute(&Default::default())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AssumptionSet;
    use chrono::TimeZone;

    fn scenario(id: &str, name: &str, address: &str, rent: &str, price: &str, day: u32) -> Scenario {
        let mut values = AssumptionSet::form_defaults();
        values.address = address.to_string();
        values.target_rent = rent.into();
        values.purchase_price = price.into();
        Scenario {
            id: id.to_string(),
            name: name.to_string(),
            values,
            created_at: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    fn sample() -> Vec<Scenario> {
        vec![
            scenario("a", "Alpha", "1 Lafayette Cir", "13,000", "", 3),
            scenario("b", "Bravo", "22 Oakland Ave", "4,200", "900,000", 1),
            scenario("c", "Charlie", "9 Walnut Creek Rd", "6,200", "1,200,000", 2),
        ]
    }

    fn ids(rows: &[PortfolioRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn default_sort_is_newest_first() {
        let rows = portfolio(&sample(), "", SortKey::default(), SortDirection::default());
        assert_eq!(ids(&rows), vec!["a", "c", "b"]);
    }

    #[test]
    fn filter_matches_name_or_address_case_insensitively() {
        let rows = portfolio(&sample(), "  OAKLAND ", SortKey::Name, SortDirection::Ascending);
        assert_eq!(ids(&rows), vec!["b"]);
        let rows = portfolio(&sample(), "char", SortKey::Name, SortDirection::Ascending);
        assert_eq!(ids(&rows), vec!["c"]);
    }

    #[test]
    fn rows_carry_computed_metrics() {
        let rows = portfolio(&sample(), "alpha", SortKey::Name, SortDirection::Ascending);
        let row = &rows[0];
        assert_eq!(row.rent, 13_000.0);
        assert_eq!(row.cap_rate, Metric::NotApplicable);
        let expected = compute(&sample()[0].values);
        assert_eq!(row.cash_flow, expected.monthly_cash_flow);
        assert_eq!(row.noi, expected.noi);
    }

    #[test]
    fn not_applicable_metrics_sort_last_both_ways() {
        for dir in [SortDirection::Ascending, SortDirection::Descending] {
            let rows = portfolio(&sample(), "", SortKey::CapRate, dir);
            assert_eq!(rows.last().map(|r| r.id.as_str()), Some("a"), "{dir:?}");
        }
    }

    #[test]
    fn numeric_sort_respects_direction() {
        let asc = portfolio(&sample(), "", SortKey::Rent, SortDirection::Ascending);
        assert_eq!(ids(&asc), vec!["b", "c", "a"]);
        let desc = portfolio(&sample(), "", SortKey::Rent, SortDirection::Descending);
        assert_eq!(ids(&desc), vec!["a", "c", "b"]);
    }

    #[test]
    fn negative_rent_shows_as_zero_like_computed_results() {
        let scenarios = vec![scenario("n", "Negative", "", "-1000", "", 1)];
        let rows = portfolio(&scenarios, "", SortKey::default(), SortDirection::default());
        assert_eq!(rows[0].rent, 0.0);
        assert_eq!(compare(&scenarios, &["n".to_string()])[0].rent, rows[0].rent);
    }

    #[test]
    fn compare_selection_keeps_two_most_recent() {
        let mut sel = CompareSelection::default();
        sel.toggle("a");
        sel.toggle("b");
        sel.toggle("c");
        assert_eq!(sel.ids(), ["b".to_string(), "c".to_string()]);

        sel.toggle("b");
        assert_eq!(sel.ids(), ["c".to_string()]);
    }

    #[test]
    fn compare_columns_follow_selection_order() {
        let scenarios = sample();
        let cols = compare(&scenarios, &["c".to_string(), "missing".to_string()]);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "Charlie");
        assert_eq!(cols[0].rent, 6_200.0);
        assert!(cols[0].cap_rate.is_applicable());
        assert_eq!(cols[1].name, "missing");
        assert_eq!(cols[1].rent, 0.0);
        assert_eq!(cols[1].cap_rate, Metric::NotApplicable);
    }
}
