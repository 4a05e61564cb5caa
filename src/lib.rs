//! # An incremental linear constraint solver.
//!
//! Weighted linear equality and inequality constraints over real-valued
//! variables are solved with the Cassowary algorithm, an incremental variant
//! of the Simplex method developed for two-way user interface layout by
//! Badros, Borning and Stuckey. Once a solution is found, the desired values
//! of *edit* variables can be resuggested cheaply: the solver patches the
//! affected constants and repairs feasibility with a dual Simplex pass
//! instead of re-solving from scratch.
//!
//! The tableau is a sparse dictionary-of-keys matrix whose terms are doubly
//! linked along both their row and their column, backed by a slot arena and
//! an open-addressed index table. All client handles are small `Copy` ids
//! into those pools.
//!
//! ```
//! use okarito::{ConstraintSpec, Relation, Solver, strength};
//!
//! let mut solver = Solver::new();
//! let width = solver.add_variable().unwrap();
//! solver.add_constraint(&ConstraintSpec {
//!     terms: &[(width, 1.0)],
//!     relation: Relation::GreaterEqual,
//!     constant: 100.0,
//!     strength: strength::REQUIRED,
//! }).unwrap();
//! assert!(solver.value(width) >= 100.0 - 1e-6);
//! ```

pub mod algorithm;

mod data;

pub use crate::algorithm::solver::{Constraint, ConstraintSpec, Solver, Variable};
pub use crate::algorithm::{strength, AddConstraintError, Relation};
pub use crate::data::AllocationError;
