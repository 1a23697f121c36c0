//! Numeric payload of a quantity
//!
//! A magnitude is either a plain decimal or an un-simplified fraction. The
//! fraction form exists so that amounts like "1/3 cup" display exactly as
//! they were entered.

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Fractional digits used by `Display`
pub const DEFAULT_FRACTION_DIGITS: usize = 2;

/// A decimal or rational amount
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Magnitude {
    Raw { value: f64 },
    Rational { numerator: f64, denominator: f64 },
}

impl Magnitude {
    pub fn raw(value: f64) -> Self {
        Magnitude::Raw { value }
    }

    pub fn rational(numerator: f64, denominator: f64) -> Self {
        Magnitude::Rational {
            numerator,
            denominator,
        }
    }

    pub fn zero() -> Self {
        Magnitude::raw(0.0)
    }

    pub fn is_rational(&self) -> bool {
        matches!(self, Magnitude::Rational { .. })
    }

    /// Decimal equivalent
    pub fn value(&self) -> f64 {
        match *self {
            Magnitude::Raw { value } => value,
            Magnitude::Rational {
                numerator,
                denominator,
            } => numerator / denominator,
        }
    }

    /// Numerator and denominator, with a raw value read as `value/1`
    fn as_fraction(&self) -> (f64, f64) {
        match *self {
            Magnitude::Raw { value } => (value, 1.0),
            Magnitude::Rational {
                numerator,
                denominator,
            } => (numerator, denominator),
        }
    }

    /// Sum; raw only when both sides are raw
    pub fn add(self, other: Magnitude) -> Magnitude {
        match (self, other) {
            (Magnitude::Raw { value: a }, Magnitude::Raw { value: b }) => Magnitude::raw(a + b),
            _ => {
                let (a, b) = self.as_fraction();
                let (c, d) = other.as_fraction();
                Magnitude::rational(a * d + c * b, b * d)
            }
        }
    }

    /// Difference; raw only when both sides are raw
    pub fn subtract(self, other: Magnitude) -> Magnitude {
        match (self, other) {
            (Magnitude::Raw { value: a }, Magnitude::Raw { value: b }) => Magnitude::raw(a - b),
            _ => {
                let (a, b) = self.as_fraction();
                let (c, d) = other.as_fraction();
                Magnitude::rational(a * d - c * b, b * d)
            }
        }
    }

    /// Scale by a scalar
    ///
    /// A fraction grows through its numerator when `scalar > 1` and shrinks
    /// through its denominator otherwise. Multiplying by zero zeroes the
    /// numerator so the denominator never becomes infinite.
    pub fn multiply(self, scalar: f64) -> Magnitude {
        match self {
            Magnitude::Raw { value } => Magnitude::raw(value * scalar),
            Magnitude::Rational {
                numerator,
                denominator,
            } => {
                if scalar > 1.0 {
                    Magnitude::rational(numerator * scalar, denominator)
                } else if scalar == 0.0 {
                    Magnitude::rational(0.0, denominator)
                } else {
                    Magnitude::rational(numerator, denominator / scalar)
                }
            }
        }
    }

    /// Divide by a scalar
    ///
    /// Mirror of [`Magnitude::multiply`]: `scalar > 1` grows the denominator,
    /// anything else divides the numerator. Dividing by zero follows `f64`.
    pub fn divide(self, scalar: f64) -> Magnitude {
        match self {
            Magnitude::Raw { value } => Magnitude::raw(value / scalar),
            Magnitude::Rational {
                numerator,
                denominator,
            } => {
                if scalar > 1.0 {
                    Magnitude::rational(numerator, denominator * scalar)
                } else {
                    Magnitude::rational(numerator / scalar, denominator)
                }
            }
        }
    }

    pub fn abs(self) -> Magnitude {
        match self {
            Magnitude::Raw { value } => Magnitude::raw(value.abs()),
            Magnitude::Rational {
                numerator,
                denominator,
            } => Magnitude::rational(numerator.abs(), denominator.abs()),
        }
    }

    /// Parse `"<num>/<den>"` or a bare decimal
    ///
    /// Returns `None` for anything else, including non-finite numbers and a
    /// zero denominator. Callers treat `None` as "no amount".
    pub fn parse(text: &str) -> Option<Magnitude> {
        let trimmed = text.trim();

        if let Some((num, den)) = trimmed.split_once('/') {
            let numerator = parse_decimal(num)?;
            let denominator = parse_decimal(den)?;
            if denominator == 0.0 {
                return None;
            }
            return Some(Magnitude::rational(numerator, denominator));
        }

        parse_decimal(trimmed).map(Magnitude::raw)
    }

    /// Locale-free text with at most `max_digits` fractional digits
    pub fn format(&self, max_digits: usize) -> String {
        match *self {
            Magnitude::Raw { value } => format_decimal(value, max_digits),
            Magnitude::Rational {
                numerator,
                denominator,
            } => format!(
                "{}/{}",
                format_decimal(numerator, max_digits),
                format_decimal(denominator, max_digits)
            ),
        }
    }
}

impl Default for Magnitude {
    fn default() -> Self {
        Magnitude::zero()
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    let value = s.trim().parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Round to `max_digits` places, then drop trailing zeros and a bare point
fn format_decimal(value: f64, max_digits: usize) -> String {
    let mut text = format!("{:.*}", max_digits, value);
    if text.contains('.') {
        let trimmed_len = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed_len);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(DEFAULT_FRACTION_DIGITS))
    }
}

impl Add for Magnitude {
    type Output = Magnitude;

    fn add(self, other: Magnitude) -> Magnitude {
        Magnitude::add(self, other)
    }
}

impl Sub for Magnitude {
    type Output = Magnitude;

    fn sub(self, other: Magnitude) -> Magnitude {
        self.subtract(other)
    }
}

impl Mul<f64> for Magnitude {
    type Output = Magnitude;

    fn mul(self, scalar: f64) -> Magnitude {
        self.multiply(scalar)
    }
}

impl Div<f64> for Magnitude {
    type Output = Magnitude;

    fn div(self, scalar: f64) -> Magnitude {
        self.divide(scalar)
    }
}

impl std::iter::Sum for Magnitude {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Magnitude::zero(), Magnitude::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_value() {
        assert_eq!(Magnitude::raw(2.5).value(), 2.5);
        assert!(approx(Magnitude::rational(1.0, 3.0).value(), 1.0 / 3.0));
    }

    #[test]
    fn test_add_raw_stays_raw() {
        let sum = Magnitude::raw(1.5) + Magnitude::raw(2.0);
        assert_eq!(sum, Magnitude::raw(3.5));
    }

    #[test]
    fn test_add_with_rational_cross_multiplies() {
        let sum = Magnitude::rational(1.0, 3.0) + Magnitude::rational(1.0, 6.0);
        assert_eq!(sum, Magnitude::rational(9.0, 18.0));
        assert!(approx(sum.value(), 0.5));

        let mixed = Magnitude::raw(2.0) + Magnitude::rational(1.0, 4.0);
        assert_eq!(mixed, Magnitude::rational(9.0, 4.0));
    }

    #[test]
    fn test_add_commutes_by_value() {
        let samples = [
            Magnitude::raw(1.25),
            Magnitude::raw(-3.0),
            Magnitude::rational(2.0, 3.0),
            Magnitude::rational(-5.0, 8.0),
        ];
        for a in samples {
            for b in samples {
                assert!(approx(a.add(b).value(), b.add(a).value()));
            }
        }
    }

    #[test]
    fn test_subtract() {
        assert_eq!(Magnitude::raw(5.0) - Magnitude::raw(2.0), Magnitude::raw(3.0));

        let diff = Magnitude::rational(3.0, 4.0) - Magnitude::raw(1.0);
        assert_eq!(diff, Magnitude::rational(-1.0, 4.0));
    }

    #[test]
    fn test_multiply_rational_scales_up_through_numerator() {
        let m = Magnitude::rational(1.0, 3.0) * 2.0;
        assert_eq!(m, Magnitude::rational(2.0, 3.0));
    }

    #[test]
    fn test_multiply_rational_scales_down_through_denominator() {
        let m = Magnitude::rational(1.0, 3.0) * 0.5;
        assert_eq!(m, Magnitude::rational(1.0, 6.0));

        let unchanged = Magnitude::rational(1.0, 3.0) * 1.0;
        assert_eq!(unchanged, Magnitude::rational(1.0, 3.0));
    }

    #[test]
    fn test_multiply_rational_by_zero() {
        let m = Magnitude::rational(2.0, 3.0) * 0.0;
        assert_eq!(m, Magnitude::rational(0.0, 3.0));
        assert_eq!(m.value(), 0.0);
    }

    #[test]
    fn test_divide_rational() {
        assert_eq!(
            Magnitude::rational(1.0, 2.0) / 4.0,
            Magnitude::rational(1.0, 8.0)
        );
        assert_eq!(
            Magnitude::rational(1.0, 2.0) / 0.5,
            Magnitude::rational(2.0, 2.0)
        );
        assert_eq!(Magnitude::raw(9.0) / 3.0, Magnitude::raw(3.0));
    }

    #[test]
    fn test_abs() {
        assert_eq!(Magnitude::rational(-3.0, 4.0).abs().value(), 0.75);
        assert_eq!(
            Magnitude::rational(3.0, -4.0).abs(),
            Magnitude::rational(3.0, 4.0)
        );
        assert_eq!(Magnitude::raw(-2.0).abs(), Magnitude::raw(2.0));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Magnitude::parse("3/4"), Some(Magnitude::rational(3.0, 4.0)));
        assert_eq!(Magnitude::parse(" 1.5 "), Some(Magnitude::raw(1.5)));
        assert_eq!(Magnitude::parse("1 / 3"), Some(Magnitude::rational(1.0, 3.0)));
        assert_eq!(Magnitude::parse("abc"), None);
        assert_eq!(Magnitude::parse("1/x"), None);
        assert_eq!(Magnitude::parse("1/0"), None);
        assert_eq!(Magnitude::parse(""), None);
        assert_eq!(Magnitude::parse("NaN"), None);
        assert_eq!(Magnitude::parse("inf"), None);
    }

    #[test]
    fn test_format_rational_round_trips() {
        let parsed = Magnitude::parse("3/4").unwrap();
        for digits in 0..6 {
            assert_eq!(parsed.format(digits), "3/4");
        }
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(Magnitude::raw(1.0 / 3.0).format(2), "0.33");
        assert_eq!(Magnitude::raw(2.5).format(3), "2.5");
        assert_eq!(Magnitude::raw(120.0).format(2), "120");
        assert_eq!(Magnitude::raw(1234567.26).format(1), "1234567.3");
        assert_eq!(Magnitude::raw(-0.001).format(2), "0");
        assert_eq!(Magnitude::rational(1.24, 3.0).format(1), "1.2/3");
        assert_eq!(Magnitude::raw(0.126).to_string(), "0.13");
    }

    #[test]
    fn test_serde_preserves_variant() {
        let rational = Magnitude::rational(1.0, 3.0);
        let json = serde_json::to_string(&rational).unwrap();
        assert_eq!(json, r#"{"kind":"rational","numerator":1.0,"denominator":3.0}"#);
        let back: Magnitude = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rational);

        let raw: Magnitude = serde_json::from_str(r#"{"kind":"raw","value":0.5}"#).unwrap();
        assert_eq!(raw, Magnitude::raw(0.5));
    }
}
