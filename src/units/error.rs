//! Errors raised by unit conversion and quantity math

use thiserror::Error;

use super::unit::{Unit, UnitFamily};

/// Failure of a fallible quantity operation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    /// Source and target units are not in the same physical family
    #[error("cannot convert {from} to {to}: incompatible units")]
    IncompatibleUnit { from: Unit, to: Unit },

    /// The unit is outside the family the operation requires
    #[error("{unit} is not a {expected} unit")]
    InvalidUnit { unit: Unit, expected: UnitFamily },

    #[error("division by zero")]
    DivisionByZero,

    #[error("servings per container must be set and greater than zero")]
    MissingServingsPerContainer,
}

/// Result type for quantity operations
pub type QuantityResult<T> = Result<T, QuantityError>;
