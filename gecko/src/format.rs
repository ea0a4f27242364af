//! Display strings for snapshot fields.

/// Rendered in place of a total supply the API reports as null.
pub const INFINITE_SUPPLY: &str = "∞";

/// Insert `,` every three digits of the integer part of a plain decimal string.
fn group_thousands(plain: &str) -> String {
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut out = String::with_capacity(plain.len() + int_part.len() / 3);
    out.push_str(sign);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    out
}

/// `$` plus the grouped shortest representation of `value`.
///
/// `65000.0` → `$65,000`, `1234.5` → `$1,234.5`, `0.0812` → `$0.0812`.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return format!("${value}");
    }
    let grouped = group_thousands(&value.abs().to_string());
    if value < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Short form for large amounts: `$1.20T`, `$30.00B`, `$4.50M`, `$12.30K`.
pub fn format_compact_usd(value: f64) -> String {
    const UNITS: [(f64, &str); 4] = [(1e12, "T"), (1e9, "B"), (1e6, "M"), (1e3, "K")];

    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };
    for (i, (scale, suffix)) in UNITS.iter().enumerate() {
        if abs >= *scale {
            let mut shown = format!("{:.2}", abs / scale);
            let mut suffix = *suffix;
            // 999_999 rounds to 1000.00K; show it as 1.00M.
            if shown == "1000.00" && i > 0 {
                let (up_scale, up_suffix) = UNITS[i - 1];
                shown = format!("{:.2}", abs / up_scale);
                suffix = up_suffix;
            }
            return format!("{sign}${shown}{suffix}");
        }
    }
    format_usd(value)
}

/// Two decimals and a percent sign: `2.50%`, `-1.10%`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// Whole units with thousands separators, or [`INFINITE_SUPPLY`].
pub fn format_supply(supply: Option<f64>) -> String {
    match supply {
        Some(v) if v.is_finite() => group_thousands(&format!("{v:.0}")),
        Some(v) => v.to_string(),
        None => INFINITE_SUPPLY.to_string(),
    }
}

/// Ticker as displayed (`btc` → `BTC`).
pub fn format_symbol(symbol: &str) -> String {
    symbol.to_uppercase()
}
