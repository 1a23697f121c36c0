//! Quantity and unit arithmetic
//!
//! Units of measure, exact-or-decimal magnitudes, and quantities that pair
//! the two. Everything here is a plain value type; conversions and parsing
//! report failure explicitly and leave any fallback to the caller.

pub mod error;
pub mod magnitude;
pub mod quantity;
pub mod unit;

pub use error::{QuantityError, QuantityResult};
pub use magnitude::Magnitude;
pub use quantity::Quantity;
pub use unit::{Unit, UnitFamily, VolumeUnit, WeightUnit};
