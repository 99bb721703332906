//! Money rendering through the tenant's configured format template.
//!
//! The platform stores a display template per shop (e.g. `€{{amount}}` or
//! `{{amount_with_comma_separator}} kr`). Each placeholder spells out its
//! own grouping and decimal convention; we substitute every one we know.

/// `(token, thousands separator, decimal point)`. A `None` decimal point
/// means the amount is rounded to a whole number.
const TOKENS: [(&str, &str, Option<&str>); 8] = [
    ("{{amount}}", ",", Some(".")),
    ("{{amount_no_decimals}}", ",", None),
    ("{{amount_with_comma_separator}}", ".", Some(",")),
    ("{{amount_no_decimals_with_comma_separator}}", ".", None),
    ("{{amount_with_apostrophe_separator}}", "'", Some(".")),
    ("{{amount_no_decimals_with_space_separator}}", " ", None),
    ("{{amount_with_space_separator}}", " ", Some(",")),
    ("{{amount_with_period_and_space_separator}}", " ", Some(".")),
];

/// Render `amount` through the shop's money template.
///
/// A missing or blank template falls back to a plain two-decimal figure. A
/// template without any known placeholder passes through unchanged.
#[must_use]
pub fn render_money(template: &str, amount: f64) -> String {
    if template.trim().is_empty() {
        return format!("{amount:.2}");
    }
    let mut out = template.to_string();
    for (token, thousands, decimal) in TOKENS {
        if out.contains(token) {
            out = out.replace(token, &format_amount(amount, thousands, decimal));
        }
    }
    out
}

fn format_amount(amount: f64, thousands: &str, decimal: Option<&str>) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    match decimal {
        Some(point) => {
            let fixed = format!("{:.2}", amount.abs());
            let (int_part, frac) = fixed.split_once('.').unwrap_or((&fixed, "00"));
            format!("{sign}{}{point}{frac}", group_thousands(int_part, thousands))
        },
        None => {
            let rounded = amount.abs().round() as i64;
            format!("{sign}{}", group_thousands(&rounded.to_string(), thousands))
        },
    }
}

/// Insert `sep` between three-digit groups, counted from the right.
fn group_thousands(digits: &str, sep: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push_str(sep);
        }
        out.push(char::from(*b));
    }
    out
}
