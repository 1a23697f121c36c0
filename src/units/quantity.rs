//! Quantity: a magnitude tagged with a unit

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::error::{QuantityError, QuantityResult};
use super::magnitude::{Magnitude, DEFAULT_FRACTION_DIGITS};
use super::unit::{Unit, UnitFamily};

/// An amount in a unit, e.g. "1/3 cup" or "120 cal"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub magnitude: Magnitude,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(magnitude: Magnitude, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Decimal amount in `unit`
    pub fn raw(value: f64, unit: Unit) -> Self {
        Self::new(Magnitude::raw(value), unit)
    }

    pub fn calories(value: f64) -> Self {
        Self::raw(value, Unit::Calorie)
    }

    pub fn grams(value: f64) -> Self {
        Self::raw(value, Unit::Gram)
    }

    pub fn milligrams(value: f64) -> Self {
        Self::raw(value, Unit::Milligram)
    }

    pub fn milliliters(value: f64) -> Self {
        Self::raw(value, Unit::Milliliter)
    }

    pub fn servings(value: f64) -> Self {
        Self::raw(value, Unit::Serving)
    }

    /// Decimal equivalent of the magnitude
    pub fn value(&self) -> f64 {
        self.magnitude.value()
    }

    /// Convert into `target`
    ///
    /// Identical units always succeed. Otherwise both units must be weights
    /// or both volumes; the magnitude is scaled by
    /// `factor(source) / factor(target)`.
    pub fn convert(&self, target: &Unit) -> QuantityResult<Quantity> {
        if self.unit == *target {
            return Ok(self.clone());
        }

        let same_family = (self.unit.is_weight() && target.is_weight())
            || (self.unit.is_volume() && target.is_volume());
        let factors = self.unit.base_factor().zip(target.base_factor());

        match factors {
            Some((from, to)) if same_family => Ok(Quantity::new(
                self.magnitude.multiply(from / to),
                target.clone(),
            )),
            _ => Err(QuantityError::IncompatibleUnit {
                from: self.unit.clone(),
                to: target.clone(),
            }),
        }
    }

    pub fn to_grams(&self) -> QuantityResult<Quantity> {
        self.convert_within(UnitFamily::Weight, &Unit::Gram)
    }

    pub fn to_milligrams(&self) -> QuantityResult<Quantity> {
        self.convert_within(UnitFamily::Weight, &Unit::Milligram)
    }

    pub fn to_milliliters(&self) -> QuantityResult<Quantity> {
        self.convert_within(UnitFamily::Volume, &Unit::Milliliter)
    }

    fn convert_within(&self, family: UnitFamily, target: &Unit) -> QuantityResult<Quantity> {
        if self.unit.family() != family {
            return Err(QuantityError::InvalidUnit {
                unit: self.unit.clone(),
                expected: family,
            });
        }
        self.convert(target)
    }

    pub fn abs(&self) -> Quantity {
        Quantity::new(self.magnitude.abs(), self.unit.clone())
    }

    /// Parse text such as `"1/3 cup"`, `"30g"` or `"2"`
    ///
    /// The leading token is the magnitude and the remainder the unit. A bare
    /// number is read as a count of servings. An `e`/`E` between a digit and
    /// an exponent (`1e3 g`) belongs to the number. Returns `None` when the
    /// magnitude does not parse.
    pub fn parse(text: &str) -> Option<Quantity> {
        let trimmed = text.trim();
        let bytes = trimmed.as_bytes();
        let is_exponent = |i: usize| {
            i > 0
                && bytes[i - 1].is_ascii_digit()
                && match bytes.get(i + 1) {
                    Some(b'+' | b'-') => bytes.get(i + 2).is_some_and(u8::is_ascii_digit),
                    Some(b) => b.is_ascii_digit(),
                    None => false,
                }
        };
        let split_at = trimmed
            .char_indices()
            .find(|&(i, c)| {
                !(c.is_ascii_digit()
                    || matches!(c, '.' | '/' | '-' | '+' | ' ')
                    || (matches!(c, 'e' | 'E') && is_exponent(i)))
            })
            .map(|(i, _)| i)
            .unwrap_or(trimmed.len());

        let (number, unit_text) = trimmed.split_at(split_at);
        let magnitude = parse_mixed(number)?;
        let unit = Unit::parse(unit_text).unwrap_or(Unit::Serving);

        Some(Quantity::new(magnitude, unit))
    }

    /// Locale-free text with at most `max_digits` fractional digits
    pub fn format(&self, max_digits: usize) -> String {
        format!("{} {}", self.magnitude.format(max_digits), self.unit)
    }
}

/// A magnitude, or a whole number followed by a fraction ("1 1/2")
fn parse_mixed(text: &str) -> Option<Magnitude> {
    let text = text.trim();
    if let Some((whole, fraction)) = text.split_once(' ') {
        let fraction = fraction.trim();
        if fraction.contains('/') && !fraction.starts_with('/') && !whole.contains('/') {
            let whole = Magnitude::parse(whole)?;
            let fraction = Magnitude::parse(fraction)?;
            return Some(whole.add(fraction));
        }
    }
    Magnitude::parse(text)
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(DEFAULT_FRACTION_DIGITS))
    }
}

// Binary operators keep the left operand's unit; operands are never
// converted before combining.

impl Add for Quantity {
    type Output = Quantity;

    fn add(self, other: Quantity) -> Quantity {
        &self + &other
    }
}

impl<'a> Add<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    fn add(self, other: &'a Quantity) -> Quantity {
        Quantity::new(self.magnitude.add(other.magnitude), self.unit.clone())
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, other: Quantity) -> Quantity {
        &self - &other
    }
}

impl<'a> Sub<&'a Quantity> for &'a Quantity {
    type Output = Quantity;

    fn sub(self, other: &'a Quantity) -> Quantity {
        Quantity::new(self.magnitude.subtract(other.magnitude), self.unit.clone())
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;

    fn mul(self, scalar: f64) -> Quantity {
        &self * scalar
    }
}

impl Mul<f64> for &Quantity {
    type Output = Quantity;

    fn mul(self, scalar: f64) -> Quantity {
        Quantity::new(self.magnitude.multiply(scalar), self.unit.clone())
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;

    fn div(self, scalar: f64) -> Quantity {
        &self / scalar
    }
}

impl Div<f64> for &Quantity {
    type Output = Quantity;

    fn div(self, scalar: f64) -> Quantity {
        Quantity::new(self.magnitude.divide(scalar), self.unit.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEIGHTS: [Unit; 6] = [
        Unit::Ounce,
        Unit::Pound,
        Unit::Microgram,
        Unit::Milligram,
        Unit::Gram,
        Unit::Kilogram,
    ];

    fn relative_error(a: f64, b: f64) -> f64 {
        ((a - b) / b).abs()
    }

    #[test]
    fn test_pound_to_milligrams_is_exact() {
        let mg = Quantity::raw(1.0, Unit::Pound)
            .convert(&Unit::Milligram)
            .unwrap();
        assert_eq!(mg.value(), 453592.0);
        assert_eq!(mg.unit, Unit::Milligram);
    }

    #[test]
    fn test_weight_round_trip_through_milligrams() {
        for unit in WEIGHTS {
            for value in [0.001, 1.0, 3.75, 1250.0] {
                let original = Quantity::raw(value, unit.clone());
                let back = original
                    .convert(&Unit::Milligram)
                    .and_then(|mg| mg.convert(&unit))
                    .unwrap();
                assert!(
                    relative_error(back.value(), value) <= 1e-6,
                    "{} {} came back as {}",
                    value,
                    unit,
                    back.value()
                );
            }
        }
    }

    #[test]
    fn test_volume_conversion() {
        let ml = Quantity::raw(2.0, Unit::Tablespoon)
            .to_milliliters()
            .unwrap();
        assert!((ml.value() - 29.5736).abs() < 1e-9);

        let cups = Quantity::milliliters(480.0).convert(&Unit::Cup).unwrap();
        assert!((cups.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_rational_stays_rational_through_conversion() {
        let third_cup = Quantity::new(Magnitude::rational(1.0, 3.0), Unit::Cup);
        let ml = third_cup.to_milliliters().unwrap();
        assert!(ml.magnitude.is_rational());
        assert!((ml.value() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_cross_family_conversion_fails() {
        let err = Quantity::grams(1.0).convert(&Unit::Milliliter).unwrap_err();
        assert_eq!(
            err,
            QuantityError::IncompatibleUnit {
                from: Unit::Gram,
                to: Unit::Milliliter,
            }
        );
    }

    #[test]
    fn test_serving_and_custom_do_not_convert() {
        assert!(Quantity::servings(1.0).convert(&Unit::Gram).is_err());
        assert!(Quantity::grams(1.0).convert(&Unit::Serving).is_err());
        let packet = Quantity::raw(1.0, Unit::Custom("packet".into()));
        assert!(packet.convert(&Unit::Custom("box".into())).is_err());
        assert!(packet.convert(&Unit::Milliliter).is_err());
    }

    #[test]
    fn test_identical_unit_conversion_is_identity() {
        let q = Quantity::raw(2.0, Unit::Custom("packet".into()));
        assert_eq!(q.convert(&Unit::Custom("packet".into())).unwrap(), q);
        assert_eq!(Quantity::calories(5.0).convert(&Unit::Calorie).unwrap().value(), 5.0);
    }

    #[test]
    fn test_family_helpers_reject_other_families() {
        assert_eq!(
            Quantity::grams(5.0).to_milliliters().unwrap_err(),
            QuantityError::InvalidUnit {
                unit: Unit::Gram,
                expected: UnitFamily::Volume,
            }
        );
        assert!(Quantity::calories(100.0).to_grams().is_err());
        assert!(Quantity::servings(1.0).to_milligrams().is_err());
        assert!(Quantity::raw(1.0, Unit::Custom("slice".into())).to_grams().is_err());

        let mg = Quantity::raw(2.0, Unit::Gram).to_milligrams().unwrap();
        assert_eq!(mg.value(), 2000.0);
    }

    #[test]
    fn test_operators_keep_left_unit() {
        let sum = Quantity::grams(10.0) + Quantity::milligrams(5.0);
        assert_eq!(sum.unit, Unit::Gram);
        assert_eq!(sum.value(), 15.0);

        let diff = &Quantity::grams(10.0) - &Quantity::grams(4.0);
        assert_eq!(diff, Quantity::grams(6.0));

        let doubled = Quantity::new(Magnitude::rational(1.0, 3.0), Unit::Cup) * 2.0;
        assert_eq!(doubled.magnitude, Magnitude::rational(2.0, 3.0));

        let halved = Quantity::calories(120.0) / 2.0;
        assert_eq!(halved, Quantity::calories(60.0));
    }

    #[test]
    fn test_parse_quantity() {
        let q = Quantity::parse("1/3 cup").unwrap();
        assert_eq!(q.magnitude, Magnitude::rational(1.0, 3.0));
        assert_eq!(q.unit, Unit::Cup);

        let q = Quantity::parse("30g").unwrap();
        assert_eq!(q, Quantity::grams(30.0));

        let q = Quantity::parse("1.5").unwrap();
        assert_eq!(q, Quantity::servings(1.5));

        let q = Quantity::parse("2 packets").unwrap();
        assert_eq!(q.unit, Unit::Custom("packets".into()));

        let q = Quantity::parse("1 / 4 cup").unwrap();
        assert_eq!(q.magnitude, Magnitude::rational(1.0, 4.0));

        let q = Quantity::parse("1 1/2 cups").unwrap();
        assert_eq!(q.magnitude, Magnitude::rational(3.0, 2.0));
        assert_eq!(q.unit, Unit::Cup);

        assert!(Quantity::parse("some cheese").is_none());
        assert!(Quantity::parse("").is_none());
    }

    #[test]
    fn test_parse_exponent_amounts() {
        assert_eq!(Quantity::parse("1e3 g").unwrap(), Quantity::grams(1000.0));
        assert_eq!(Quantity::parse("2.5E-1 g").unwrap(), Quantity::grams(0.25));

        let q = Quantity::parse("2eggs").unwrap();
        assert_eq!(q.magnitude, Magnitude::raw(2.0));
        assert_eq!(q.unit, Unit::Custom("eggs".into()));

        let q = Quantity::parse("3 each").unwrap();
        assert_eq!(q.magnitude, Magnitude::raw(3.0));
        assert_eq!(q.unit, Unit::Custom("each".into()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Quantity::grams(28.3495).to_string(), "28.35 g");
        assert_eq!(
            Quantity::new(Magnitude::rational(1.0, 3.0), Unit::Cup).to_string(),
            "1/3 cup"
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let q = Quantity::new(
            Magnitude::rational(1.0, 2.0),
            Unit::Custom("packet".to_string()),
        );
        let json = serde_json::to_string(&q).unwrap();
        let back: Quantity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, q);
        assert!(back.magnitude.is_rational());
    }
}
