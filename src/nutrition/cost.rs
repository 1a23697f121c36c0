//! Cost calculations from store prices

use super::aggregate::consumption_scale;
use crate::units::{QuantityError, QuantityResult, Quantity};

/// Price of one serving given the price of a whole container
pub fn cost_per_serving(container_price: f64, servings_per_container: Option<f64>) -> QuantityResult<f64> {
    match servings_per_container {
        Some(servings) if servings > 0.0 => Ok(container_price / servings),
        _ => Err(QuantityError::MissingServingsPerContainer),
    }
}

/// Price of the amount consumed
pub fn cost_of(
    container_price: f64,
    servings_per_container: Option<f64>,
    consumed: &Quantity,
    serving_size: &Quantity,
) -> QuantityResult<f64> {
    let per_serving = cost_per_serving(container_price, servings_per_container)?;
    Ok(per_serving * consumption_scale(consumed, serving_size)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_per_serving() {
        assert_eq!(cost_per_serving(4.0, Some(8.0)).unwrap(), 0.5);
        assert_eq!(
            cost_per_serving(4.0, None),
            Err(QuantityError::MissingServingsPerContainer)
        );
        assert!(cost_per_serving(4.0, Some(0.0)).is_err());
    }

    #[test]
    fn test_cost_of_weight_consumed() {
        // 10 servings of 30 g for 5.00; 90 g is 3 servings
        let cost = cost_of(5.0, Some(10.0), &Quantity::grams(90.0), &Quantity::grams(30.0)).unwrap();
        assert!((cost - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_cost_of_incompatible_amount() {
        let err = cost_of(
            5.0,
            Some(10.0),
            &Quantity::milliliters(90.0),
            &Quantity::grams(30.0),
        );
        assert!(err.is_err());
    }
}
