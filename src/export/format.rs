use crate::core::Metric;

pub const NOT_APPLICABLE: &str = "—";

/// Rounds half away from zero to `places` decimals.
pub fn round_to(x: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    let rounded = (x * scale).round() / scale;
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Whole units, as an integer string.
pub fn whole(x: f64) -> String {
    format!("{}", round_to(x, 0) as i64)
}

/// Two-decimal rounding printed without trailing zeros.
pub fn two_places(x: f64) -> String {
    format!("{}", round_to(x, 2))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// `$1,234`, `-$1,234`; no cents.
pub fn usd(x: f64) -> String {
    let rounded = round_to(if x.is_finite() { x } else { 0.0 }, 0);
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(rounded.abs() as u64))
}

pub fn pct(x: f64) -> String {
    format!("{:.2}%", round_to(x, 2))
}

pub fn metric_pct(m: Metric) -> String {
    m.value().map_or_else(|| NOT_APPLICABLE.to_string(), pct)
}

pub fn metric_usd(m: Metric) -> String {
    m.value().map_or_else(|| NOT_APPLICABLE.to_string(), usd)
}

pub fn metric_ratio(m: Metric) -> String {
    m.value()
        .map_or_else(|| NOT_APPLICABLE.to_string(), |v| format!("{:.2}", round_to(v, 2)))
}
