//! # Storage primitives for the solver
//!
//! The tableau and its supporting structures: a slot arena with an embedded
//! free list, an open-addressed index table, and the sparse matrix built on
//! both. The solver in `algorithm` owns one of each; nothing in this module
//! knows about constraints or symbols beyond their ids.
use std::collections::TryReserveError;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

pub mod arena;
pub mod index_map;
pub mod tableau;

/// Tolerance for all floating point comparisons in the solver.
pub(crate) const EPSILON: f64 = 1e-6;

/// Whether two values are equal up to [`EPSILON`].
pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    if a > b {
        a - b < EPSILON
    } else {
        b - a < EPSILON
    }
}

/// Whether a value is within [`EPSILON`] of zero.
pub(crate) fn near_zero(a: f64) -> bool {
    approx_eq(a, 0.0)
}

/// A growth path ran out of memory.
///
/// Initial pools are reserved up front; only growth is fallible. The
/// operation that triggered the growth fails and the structure that could
/// not grow is left as it was.
#[derive(Debug)]
pub struct AllocationError(TryReserveError);

impl Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "solver storage could not grow: {}", self.0)
    }
}

impl Error for AllocationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl From<TryReserveError> for AllocationError {
    fn from(error: TryReserveError) -> Self {
        AllocationError(error)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn approximate_comparison() {
        assert!(approx_eq(1.0, 1.0 + 0.5e-6));
        assert!(approx_eq(1.0 + 0.5e-6, 1.0));
        assert!(!approx_eq(1.0, 1.0 + 2e-6));

        assert!(near_zero(0.0));
        assert!(near_zero(-0.9e-6));
        assert!(!near_zero(1e-5));
    }
}
