use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// One raw form field as entered: blank, a number, text, or a toggle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Flag(bool),
    Text(String),
    #[default]
    Blank,
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Blank => Ok(()),
            FieldValue::Number(x) => write!(f, "{x}"),
            FieldValue::Flag(b) => f.write_str(if *b { "1" } else { "0" }),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// The assumptions a user enters for one property, kept exactly as entered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssumptionSet {
    pub address: String,
    pub beds: FieldValue,
    pub baths: FieldValue,
    pub sqft: FieldValue,

    pub target_rent: FieldValue,
    pub vacancy_rate_pct: FieldValue,
    pub mgmt_fee_pct: FieldValue,
    pub insurance: FieldValue,
    pub hoa: FieldValue,
    pub maintenance: FieldValue,
    #[serde(rename = "mortgagePI")]
    pub mortgage_pi: FieldValue,
    pub property_tax_annual: FieldValue,

    pub purchase_price: FieldValue,
    pub down_pct: FieldValue,
    pub rate_pct: FieldValue,
    pub term_years: FieldValue,
    pub pmi_annual_pct: FieldValue,
    pub closing_cost_pct: FieldValue,
    pub use_loan: FieldValue,
    pub capex_annual: FieldValue,
}

impl AssumptionSet {
    /// The assumptions a fresh form starts with.
    pub fn form_defaults() -> Self {
        Self {
            address: String::new(),
            beds: "5".into(),
            baths: "5".into(),
            sqft: "3537".into(),
            target_rent: "13500".into(),
            vacancy_rate_pct: "5".into(),
            mgmt_fee_pct: "0".into(),
            insurance: "330".into(),
            hoa: "0".into(),
            maintenance: "300".into(),
            mortgage_pi: "0".into(),
            property_tax_annual: "34500".into(),
            purchase_price: "".into(),
            down_pct: "20".into(),
            rate_pct: "6.5".into(),
            term_years: "30".into(),
            pmi_annual_pct: "0.6".into(),
            closing_cost_pct: "3".into(),
            use_loan: "1".into(),
            capex_annual: "0".into(),
        }
    }

    /// Looks up a field by its form key, e.g. `"targetRent"`.
    pub fn field_mut(&mut self, key: &str) -> Option<&mut FieldValue> {
        let field = match key {
            "beds" => &mut self.beds,
            "baths" => &mut self.baths,
            "sqft" => &mut self.sqft,
            "targetRent" => &mut self.target_rent,
            "vacancyRatePct" => &mut self.vacancy_rate_pct,
            "mgmtFeePct" => &mut self.mgmt_fee_pct,
            "insurance" => &mut self.insurance,
            "hoa" => &mut self.hoa,
            "maintenance" => &mut self.maintenance,
            "mortgagePI" => &mut self.mortgage_pi,
            "propertyTaxAnnual" => &mut self.property_tax_annual,
            "purchasePrice" => &mut self.purchase_price,
            "downPct" => &mut self.down_pct,
            "ratePct" => &mut self.rate_pct,
            "termYears" => &mut self.term_years,
            "pmiAnnualPct" => &mut self.pmi_annual_pct,
            "closingCostPct" => &mut self.closing_cost_pct,
            "useLoan" => &mut self.use_loan,
            "capexAnnual" => &mut self.capex_annual,
            _ => return None,
        };
        Some(field)
    }

    /// Sets a field from text; `address` is accepted too. Returns false for
    /// unknown keys.
    pub fn set_text(&mut self, key: &str, value: &str) -> bool {
        if key == "address" {
            self.address = value.to_string();
            return true;
        }
        match self.field_mut(key) {
            Some(field) => {
                *field = FieldValue::text(value);
                true
            }
            None => false,
        }
    }

    pub fn apply_preset(&mut self, preset: Preset) {
        let (vacancy, mgmt, maintenance) = preset.values();
        self.vacancy_rate_pct = vacancy.into();
        self.mgmt_fee_pct = mgmt.into();
        self.maintenance = maintenance.into();
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Preset {
    Optimistic,
    Base,
    Conservative,
}

impl Preset {
    /// Vacancy %, management %, monthly maintenance.
    fn values(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Preset::Optimistic => ("3", "0", "200"),
            Preset::Base => ("5", "5", "300"),
            Preset::Conservative => ("8", "8", "400"),
        }
    }
}

/// A derived ratio that is either computable or not applicable.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum Metric {
    #[default]
    NotApplicable,
    Value(f64),
}

impl Metric {
    /// `numerator / denominator`, not applicable unless the denominator is
    /// positive and the quotient finite.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Metric::finite(numerator / denominator)
        } else {
            Metric::NotApplicable
        }
    }

    pub fn finite(value: f64) -> Self {
        if value.is_finite() {
            Metric::Value(value)
        } else {
            Metric::NotApplicable
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            Metric::NotApplicable => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        matches!(self, Metric::Value(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Metric::Value(v) => Metric::finite(f(v)),
            Metric::NotApplicable => Metric::NotApplicable,
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Metric::Value(v) => serializer.serialize_f64(*v),
            Metric::NotApplicable => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    pub rent_low: f64,
    pub rent_mid: f64,
    pub rent_high: f64,

    pub vacancy: f64,
    pub mgmt_fee: f64,
    pub effective_rent_mid: f64,

    pub tax_monthly: f64,
    pub other_fixed: f64,
    pub monthly_fixed: f64,
    #[serde(rename = "monthlyPI")]
    pub monthly_pi: f64,
    #[serde(rename = "monthlyPMI")]
    pub monthly_pmi: f64,

    pub monthly_cash_flow: f64,
    pub annual_profit: f64,

    pub vac_pct: f64,
    pub mgmt_pct: f64,

    pub noi: f64,
    pub cap_rate: Metric,
    pub annual_debt_service: f64,
    pub dscr: Metric,
    pub cash_invested: f64,
    pub cash_on_cash: Metric,
    pub break_even_rent: Metric,
    pub break_even_occ: Metric,

    pub purchase_price: f64,
    pub loan_amount: f64,
    pub down_pct: f64,
    pub rate_pct: f64,
    pub term_years: f64,
    pub closing_pct: f64,
    pub pmi_pct: f64,
    pub capex_annual: f64,
}
