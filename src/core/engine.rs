use super::number::{clamp_pct, clamp01, finite_or_zero, non_negative, to_flag, to_number};
use super::types::{AssumptionSet, Metric, ResultSet};

const RENT_BAND_LOW: f64 = 0.975;
const RENT_BAND_HIGH: f64 = 1.025;
const PMI_DOWN_PAYMENT_THRESHOLD_PCT: f64 = 20.0;

/// Assumptions after coercion, flooring and clamping.
#[derive(Debug, Clone, Copy)]
struct Normalized {
    rent_mid: f64,
    vac_pct: f64,
    mgmt_pct: f64,
    insurance: f64,
    hoa: f64,
    maintenance: f64,
    property_tax_annual: f64,
    mortgage_override: f64,
    purchase_price: f64,
    down_pct: f64,
    rate_pct: f64,
    term_years: f64,
    closing_pct: f64,
    pmi_pct: f64,
    use_loan: bool,
    capex_annual: f64,
}

impl Normalized {
    fn from_assumptions(a: &AssumptionSet) -> Self {
        Self {
            rent_mid: non_negative(to_number(&a.target_rent)),
            vac_pct: clamp_pct(to_number(&a.vacancy_rate_pct)),
            mgmt_pct: clamp_pct(to_number(&a.mgmt_fee_pct)),
            insurance: non_negative(to_number(&a.insurance)),
            hoa: non_negative(to_number(&a.hoa)),
            maintenance: non_negative(to_number(&a.maintenance)),
            property_tax_annual: non_negative(to_number(&a.property_tax_annual)),
            mortgage_override: non_negative(to_number(&a.mortgage_pi)),
            purchase_price: non_negative(to_number(&a.purchase_price)),
            down_pct: non_negative(to_number(&a.down_pct)),
            rate_pct: non_negative(to_number(&a.rate_pct)),
            term_years: to_number(&a.term_years).max(1.0),
            closing_pct: non_negative(to_number(&a.closing_cost_pct)),
            pmi_pct: non_negative(to_number(&a.pmi_annual_pct)),
            use_loan: to_flag(&a.use_loan),
            capex_annual: non_negative(to_number(&a.capex_annual)),
        }
    }

    fn operating_costs_monthly(&self) -> f64 {
        self.insurance + self.hoa + self.maintenance
    }
}

/// Standard amortized monthly principal and interest.
///
/// The payment count is `round(term_years * 12)` with a floor of one. A zero
/// rate spreads the principal evenly.
pub fn monthly_payment(loan_amount: f64, rate_pct: f64, term_years: f64) -> f64 {
    let principal = non_negative(loan_amount);
    let r = non_negative(rate_pct) / 100.0 / 12.0;
    let n = (finite_or_zero(term_years) * 12.0).round().max(1.0);
    if r == 0.0 {
        return principal / n;
    }
    // (1 + r)^n - 1, kept accurate when 1 + r rounds to 1.
    let growth_less_one = (n * r.ln_1p()).exp_m1();
    if !growth_less_one.is_finite() {
        // r * g / (g - 1) tends to r as g grows.
        return finite_or_zero(principal * r);
    }
    if growth_less_one <= 0.0 {
        return principal / n;
    }
    finite_or_zero(principal * r * (growth_less_one + 1.0) / growth_less_one)
}

/// Derives rent band, costs, cash flow and return metrics from one set of
/// assumptions. Total: malformed input falls back to zero, and ratios with
/// no meaningful base are [`Metric::NotApplicable`].
pub fn compute(assumptions: &AssumptionSet) -> ResultSet {
    let v = Normalized::from_assumptions(assumptions);

    let rent_mid = v.rent_mid;
    let rent_low = rent_mid * RENT_BAND_LOW;
    let rent_high = rent_mid * RENT_BAND_HIGH;

    let vacancy = rent_mid * (v.vac_pct / 100.0);
    let mgmt_fee = rent_mid * (v.mgmt_pct / 100.0);
    let effective_rent_mid = (rent_mid - vacancy - mgmt_fee).max(0.0);

    let loan_path = v.use_loan && v.purchase_price > 0.0;
    let loan_amount = non_negative(v.purchase_price * (1.0 - v.down_pct / 100.0));
    let monthly_pi = if loan_path {
        monthly_payment(loan_amount, v.rate_pct, v.term_years)
    } else {
        v.mortgage_override
    };
    let monthly_pmi =
        if loan_path && v.down_pct < PMI_DOWN_PAYMENT_THRESHOLD_PCT && v.pmi_pct > 0.0 {
            finite_or_zero(loan_amount * v.pmi_pct / 100.0 / 12.0)
        } else {
            0.0
        };

    let tax_monthly = v.property_tax_annual / 12.0;
    let other_fixed = finite_or_zero(v.operating_costs_monthly() + monthly_pmi);
    let monthly_fixed = finite_or_zero(tax_monthly + other_fixed + monthly_pi);

    let monthly_cash_flow = finite_or_zero(effective_rent_mid - monthly_fixed);
    let annual_profit = finite_or_zero(monthly_cash_flow * 12.0);

    let noi = finite_or_zero(
        effective_rent_mid * 12.0 - v.property_tax_annual - v.operating_costs_monthly() * 12.0,
    );
    let cap_rate = Metric::ratio(noi, v.purchase_price).map(|x| x * 100.0);

    let annual_debt_service = finite_or_zero(monthly_pi * 12.0);
    let dscr = Metric::ratio(noi, annual_debt_service);

    let cash_invested = if v.purchase_price > 0.0 {
        finite_or_zero(
            v.purchase_price * v.down_pct / 100.0 + v.purchase_price * v.closing_pct / 100.0,
        )
    } else {
        0.0
    };
    let cash_on_cash = Metric::ratio(annual_profit, cash_invested).map(|x| x * 100.0);

    // Share of rent kept after vacancy and management; rounding residue at
    // a full 100% drag counts as zero.
    let drag = (100.0 - v.vac_pct - v.mgmt_pct) / 100.0;
    let break_even_rent = if drag > f64::EPSILON {
        Metric::ratio(monthly_fixed, drag)
    } else {
        Metric::NotApplicable
    };
    let break_even_occ = if rent_mid > 0.0 {
        Metric::finite(clamp01(monthly_fixed / rent_mid + v.mgmt_pct / 100.0))
    } else {
        Metric::NotApplicable
    };

    ResultSet {
        rent_low: finite_or_zero(rent_low),
        rent_mid,
        rent_high: finite_or_zero(rent_high),
        vacancy,
        mgmt_fee,
        effective_rent_mid,
        tax_monthly,
        other_fixed,
        monthly_fixed,
        monthly_pi,
        monthly_pmi,
        monthly_cash_flow,
        annual_profit,
        vac_pct: v.vac_pct,
        mgmt_pct: v.mgmt_pct,
        noi,
        cap_rate,
        annual_debt_service,
        dscr,
        cash_invested,
        cash_on_cash,
        break_even_rent,
        break_even_occ,
        purchase_price: v.purchase_price,
        loan_amount,
        down_pct: v.down_pct,
        rate_pct: v.rate_pct,
        term_years: v.term_years,
        closing_pct: v.closing_pct,
        pmi_pct: v.pmi_pct,
        capex_annual: v.capex_annual,
    }
}
