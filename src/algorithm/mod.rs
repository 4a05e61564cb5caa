//! # The Cassowary algorithm
//!
//! Constraint intake, the primal and dual Simplex pivot loops, and the edit
//! variable machinery, as described in "The Cassowary linear arithmetic
//! constraint solving algorithm" by Badros, Borning and Stuckey.
use std::error::Error;
use std::fmt;

use crate::data::AllocationError;

pub mod solver;

mod simplex;

/// The kind of (in)equality a constraint demands between its linear
/// expression and its constant.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Relation {
    LessEqual,
    Equal,
    GreaterEqual,
}

/// Conventional strength levels for constraints.
///
/// A strength is any positive real; a constraint at
/// [`REQUIRED`](strength::REQUIRED) or above must hold exactly, while
/// weaker constraints are violated at a cost proportional to their
/// strength.
pub mod strength {
    pub const WEAK: f64 = 1.0;
    pub const MEDIUM: f64 = 1_000.0;
    pub const STRONG: f64 = 1_000_000.0;
    pub const REQUIRED: f64 = 1_000_000_000.0;
}

/// Why a constraint could not be admitted.
///
/// On any of these the solver is left as it was before the call.
#[derive(Debug)]
pub enum AddConstraintError {
    /// The constraint contradicts the required constraints already in the
    /// solver.
    Unsatisfiable,
    /// The artificial-variable bootstrap could not drive the new row to
    /// feasibility.
    Unbounded,
    /// The primal optimization found no leaving row; the required
    /// constraint set is inconsistent in a way that indicates a defect, and
    /// callers should report it as one.
    Internal,
    /// Storage growth failed while building or admitting the row.
    Allocation(AllocationError),
}

impl fmt::Display for AddConstraintError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddConstraintError::Unsatisfiable => {
                write!(f, "constraint contradicts the required constraints")
            }
            AddConstraintError::Unbounded => {
                write!(f, "constraint could not be driven to feasibility")
            }
            AddConstraintError::Internal => {
                write!(f, "internal error: primal optimization found no leaving row")
            }
            AddConstraintError::Allocation(error) => error.fmt(f),
        }
    }
}

impl Error for AddConstraintError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AddConstraintError::Allocation(error) => Some(error),
            _ => None,
        }
    }
}

impl From<AllocationError> for AddConstraintError {
    fn from(error: AllocationError) -> Self {
        AddConstraintError::Allocation(error)
    }
}
