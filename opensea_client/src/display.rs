//! Display formatting for marketplace amounts.
//!
//! Prices arrive as integer base units (wei for ETH/WETH). They are scaled by
//! the payment token's decimals and then trimmed to a short, grouped decimal
//! string for the activity list.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::debug;

/// Extra digits kept after the first significant fractional digit
const SIGNIFICANT_BUFFER: u32 = 3;

/// Upper bound on fractional digits for amounts below one
const MAX_SMALL_VALUE_DECIMALS: u32 = 8;

/// Decimals assumed for a payment token symbol
pub fn decimals_for_symbol(symbol: Option<&str>) -> u32 {
    match symbol.map(|s| s.to_ascii_uppercase()) {
        Some(s) if s == "USDC" || s == "USDT" => 6,
        _ => 18,
    }
}

/// Parse a decimal string as sent by the API, including exponent forms like `1.5e+18`
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Unparseable or out of range amount '{}': {}", trimmed, e);
            None
        }
    }
}

/// Convert a raw base-unit amount into a token amount.
/// Returns `None` when the amount does not parse or overflows.
pub fn format_asset_for_display(amount: &str, token: Option<&str>) -> Option<Decimal> {
    let raw = parse_amount(amount)?;
    let decimals = decimals_for_symbol(token);
    let unit = Decimal::from_i128_with_scale(1, decimals);
    match raw.checked_mul(unit) {
        Some(scaled) => Some(scaled.normalize()),
        None => {
            debug!("Amount {} overflows when scaled by {} decimals", raw, decimals);
            None
        }
    }
}

/// Round `value` for display.
///
/// Values with magnitude below one keep three digits past the first
/// significant fractional digit (at most eight decimals); larger values keep
/// `min(decimals, 3)`. Results with two or fewer decimals are padded to two.
pub fn handle_significant_decimals(value: Decimal, decimals: u32) -> String {
    let abs = value.abs();
    let dp = if abs < Decimal::ONE {
        let leading_zeros = leading_fraction_zeros(abs);
        // An exact zero has no significant digit; this yields 2 decimals.
        let dp = leading_zeros.map_or(SIGNIFICANT_BUFFER - 1, |z| z + SIGNIFICANT_BUFFER);
        dp.min(MAX_SMALL_VALUE_DECIMALS)
    } else {
        decimals.min(SIGNIFICANT_BUFFER)
    };

    let rounded = value
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    let shown = rounded.scale().max(2);
    group_thousands(rounded, shown)
}

/// Number of zeros between the decimal point and the first non-zero digit
fn leading_fraction_zeros(abs: Decimal) -> Option<u32> {
    let text = abs.normalize().to_string();
    let fraction = text.split('.').nth(1)?;
    fraction.find(|c| c != '0').map(|i| i as u32)
}

fn group_thousands(value: Decimal, dp: u32) -> String {
    let fixed = format!("{:.*}", dp as usize, value);
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format a raw base-unit amount end to end, `"None"` when it cannot be read
pub fn display_amount(amount: Option<&str>, token: Option<&str>, decimals: u32) -> String {
    amount
        .and_then(|a| format_asset_for_display(a, token))
        .map(|v| handle_significant_decimals(v, decimals))
        .unwrap_or_else(|| "None".to_string())
}
