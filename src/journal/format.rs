// Display helpers shared by the report views (en-US grouping).

/// `$1,234.56`, `-$12.00`
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return "$0.00".to_string();
    }
    let sign = if amount < 0.0 && amount.abs() >= 0.005 { "-" } else { "" };
    format!("{sign}${}", group_fixed(amount.abs(), 2, 2))
}

/// One decimal place: `12.3%`
pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// Between 2 and 6 fraction digits, trailing zeros beyond the second trimmed.
pub fn format_price(price: f64) -> String {
    if !price.is_finite() {
        return "0.00".to_string();
    }
    let sign = if price < 0.0 { "-" } else { "" };
    format!("{sign}{}", group_fixed(price.abs(), 2, 6))
}

/// Round to `max_frac` digits, trim zeros down to `min_frac`, group thousands.
fn group_fixed(value: f64, min_frac: usize, max_frac: usize) -> String {
    let fixed = format!("{value:.max_frac$}");
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < min_frac {
        frac.push('0');
    }

    let digits = int_part.as_bytes();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, d) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*d as char);
    }

    if frac.is_empty() {
        grouped
    } else {
        format!("{grouped}.{frac}")
    }
}
