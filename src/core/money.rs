//! Money helpers shared by the engines.
//!
//! Amounts are stored and exchanged as `f64`, but every sum, product and
//! rounding step goes through `Decimal` so that a split like 30/70 of R$ 0,10
//! does not drift. Rounding is always to centavos, half away from zero.
//! Arithmetic past the `Decimal` range saturates at [`Decimal::MAX`].

use rust_decimal::prelude::*;

/// Centavo precision used everywhere
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Coerces form input into a usable amount: NaN, infinities and negatives become 0.
#[must_use]
pub fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Convert f64 to Decimal for calculation
///
/// Finite values outside the `Decimal` range clamp to its bounds; NaN and
/// infinities become zero.
#[inline]
#[must_use]
pub fn to_decimal(value: f64) -> Decimal {
    match Decimal::from_f64(value) {
        Some(decimal) => decimal,
        None if !value.is_finite() => Decimal::ZERO,
        None if value > 0.0 => Decimal::MAX,
        None => Decimal::MIN,
    }
}

/// Rounds a Decimal to centavos.
#[inline]
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Convert Decimal back to f64, rounded to 2 decimal places
#[inline]
#[must_use]
pub fn to_f64(value: Decimal) -> f64 {
    round_cents(value).to_f64().unwrap_or_default()
}

/// Rounds an amount to centavos.
#[inline]
#[must_use]
pub fn round2(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// True when two amounts differ by less than one centavo.
#[must_use]
pub fn approx_eq(a: f64, b: f64) -> bool {
    to_decimal(a).saturating_sub(to_decimal(b)).abs() < MONEY_TOLERANCE
}

/// Formats an amount as Brazilian currency, e.g. `R$ 1.234,56`.
#[must_use]
pub fn format_brl(amount: f64) -> String {
    let rounded = round2(amount);
    let body = format_decimal(rounded.abs(), 2);
    if rounded < 0.0 {
        format!("-R$ {body}")
    } else {
        format!("R$ {body}")
    }
}

/// Formats a number with Brazilian separators (`.` for thousands, `,` for decimals).
///
/// Used for quantities in the memória de cálculo, e.g. liters or kWh.
#[must_use]
pub fn format_decimal(value: f64, places: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let raw = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && raw.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped},{frac_part}")
    }
}
