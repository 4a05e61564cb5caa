//! # Solver state and public interface
//!
//! The [`Solver`] owns the variable and constraint pools and the sparse
//! tableau, and drives the Cassowary machinery in
//! [`simplex`](super::simplex) through its public operations: adding and
//! removing constraints, editing variables and suggesting values for them,
//! and reading solved values back.
//!
//! ## Symbols
//!
//! Client variables are *external* symbols; admitting a constraint mints
//! further engine symbols. A *slack* turns an inequality into an equality,
//! an *error* lets a non-required constraint be violated at a cost equal to
//! its strength, and a *dummy* tags a required equality without ever
//! becoming basic. Each constraint records its `marker` (and for the error
//! pair cases an `other`) symbol so removal can find every trace of it.
use std::fmt;

use crate::algorithm::{strength, AddConstraintError, Relation};
use crate::data::arena::Arena;
use crate::data::tableau::{Coord, Symbol, Tableau, Unlink};
use crate::data::{near_zero, AllocationError};

const DEFAULT_PAGE_SIZE: usize = 4096;

/// Handle of a client-visible variable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Variable(pub(crate) Symbol);

/// Handle of an admitted constraint.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Constraint(pub(crate) u32);

/// A constraint to admit: `Σ multiplier · variable  R  constant`, weighted
/// by a positive strength.
///
/// Built with a struct literal:
///
/// ```
/// # use okarito::{ConstraintSpec, Relation, Solver, strength};
/// # let mut solver = Solver::new();
/// # let x = solver.add_variable().unwrap();
/// # let y = solver.add_variable().unwrap();
/// let spec = ConstraintSpec {
///     terms: &[(x, 1.0), (y, -1.0)],
///     relation: Relation::LessEqual,
///     constant: 0.0,
///     strength: strength::REQUIRED,
/// };
/// solver.add_constraint(&spec).unwrap();
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ConstraintSpec<'a> {
    pub terms: &'a [(Variable, f64)],
    pub relation: Relation,
    pub constant: f64,
    pub strength: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SymbolKind {
    External,
    Slack,
    Error,
    Dummy,
}

/// Active edit on an external symbol: the synthetic constraint holding it
/// and the last suggested value.
#[derive(Clone, Copy, Debug)]
struct EditData {
    constraint: Constraint,
    value: f64,
}

#[derive(Debug)]
pub(crate) struct VariableData {
    kind: SymbolKind,
    edit: Option<EditData>,
}

/// Everything removal needs to know about an admitted constraint.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ConstraintData {
    pub marker: Symbol,
    pub other: Option<Symbol>,
    pub strength: f64,
}

/// An incremental solver for weighted linear constraints.
pub struct Solver {
    pub(crate) variables: Arena<VariableData>,
    pub(crate) constraints: Arena<ConstraintData>,
    pub(crate) tableau: Tableau,
    /// External symbol labelling the objective row; lives as long as the
    /// solver.
    pub(crate) objective: Symbol,
    /// Head of the intrusive queue of rows with negative constants,
    /// chained through the row heads' otherwise unused `next_row` links.
    pub(crate) infeasible_rows: Symbol,
}

impl Solver {
    /// A solver with the default page size of 4096 bytes per pool.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// A solver whose pools each reserve `page_size` bytes up front.
    ///
    /// # Panics
    ///
    /// When `page_size` is not a power of two.
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size.is_power_of_two(), "page_size must be a power of two");

        let mut solver = Self {
            variables: Arena::with_page_size(page_size),
            constraints: Arena::with_page_size(page_size),
            tableau: Tableau::with_page_size(page_size),
            objective: 0,
            infeasible_rows: 0,
        };
        let objective = match solver.new_symbol(SymbolKind::External) {
            Ok(symbol) => symbol,
            Err(_) => unreachable!("fresh pools cannot be exhausted"),
        };
        if solver.tableau.init_row(objective, 0.0).is_err() {
            unreachable!("fresh pools cannot be exhausted");
        }
        solver.objective = objective;
        solver
    }

    /// Register a new variable.
    pub fn add_variable(&mut self) -> Result<Variable, AllocationError> {
        self.new_symbol(SymbolKind::External).map(Variable)
    }

    /// Unregister `variable`, dropping its active edit first.
    ///
    /// # Panics
    ///
    /// When the variable is still referenced by a constraint. Remove those
    /// constraints first.
    pub fn remove_variable(&mut self, variable: Variable) -> Result<(), AllocationError> {
        self.disable_edit(variable)?;

        let symbol = variable.0;
        // removing the last referencing constraint can leave the variable
        // basic in a row of only its constant; that row pins nothing
        if self.tableau.has_row(symbol) && self.tableau.is_constant_row(symbol) {
            self.drop_row(symbol);
        }
        assert!(
            !self.tableau.has_row(symbol),
            "variable is still basic in a constraint row"
        );
        assert_eq!(
            self.tableau.term(Coord { row: 0, column: symbol }).next_row,
            0,
            "variable still appears in constraint rows"
        );
        self.delete_symbol(symbol);
        Ok(())
    }

    /// The solved value of `variable`: its row constant while basic, `0.0`
    /// otherwise.
    pub fn value(&self, variable: Variable) -> f64 {
        self.tableau.constant(variable.0)
    }

    /// Admit a constraint.
    ///
    /// On any error the solver is restored to its state before the call;
    /// see [`AddConstraintError`] for the cases.
    pub fn add_constraint(
        &mut self,
        spec: &ConstraintSpec,
    ) -> Result<Constraint, AddConstraintError> {
        debug_assert!(spec.strength > 0.0);

        let mut data = ConstraintData {
            marker: 0,
            other: None,
            strength: spec.strength,
        };
        let row = self.make_row(spec, &mut data)?;
        if let Err(error) = self.try_add_row(row, &data) {
            self.drop_constraint(&data)?;
            self.dual_optimize()?;
            self.optimize(self.objective)?;
            return Err(error);
        }
        self.optimize(self.objective)?;
        self.dual_optimize()?;
        let handle = self.constraints.insert(data)?;
        Ok(Constraint(handle))
    }

    /// Remove an admitted constraint, restoring the solution that held
    /// before it was added.
    ///
    /// Only allocator exhaustion can fail here; a live handle is always
    /// removable.
    pub fn remove_constraint(&mut self, constraint: Constraint) -> Result<(), AllocationError> {
        let data = *self.constraints.get(constraint.0);
        self.constraints.remove(constraint.0);

        self.drop_constraint(&data)?;
        // the excising pivot may leave rows transiently infeasible; repair
        // them before restoring optimality
        self.dual_optimize()?;
        match self.optimize(self.objective) {
            Ok(()) => Ok(()),
            Err(AddConstraintError::Allocation(error)) => Err(error),
            Err(_) => panic!("objective optimization failed after constraint removal"),
        }
    }

    /// Make `variable` editable at the given strength (clamped to
    /// [`strength::STRONG`]), replacing any existing edit.
    pub fn enable_edit(
        &mut self,
        variable: Variable,
        edit_strength: f64,
    ) -> Result<(), AllocationError> {
        let edit_strength = edit_strength.min(strength::STRONG);

        if let Some(edit) = self.variables.get(u32::from(variable.0)).edit {
            self.variables.get_mut(u32::from(variable.0)).edit = None;
            self.remove_constraint(edit.constraint)?;
        }

        let spec = ConstraintSpec {
            terms: &[(variable, 1.0)],
            relation: Relation::Equal,
            constant: 0.0,
            strength: edit_strength,
        };
        let constraint = match self.add_constraint(&spec) {
            Ok(constraint) => constraint,
            Err(AddConstraintError::Allocation(error)) => return Err(error),
            // the row always yields a subject: the variable itself, or the
            // constraint's own error pair
            Err(_) => unreachable!("an edit constraint is always satisfiable"),
        };
        self.variables.get_mut(u32::from(variable.0)).edit = Some(EditData {
            constraint,
            value: 0.0,
        });
        Ok(())
    }

    /// Drop the edit on `variable`, restoring the solution the remaining
    /// constraints prefer. Does nothing when no edit is active.
    pub fn disable_edit(&mut self, variable: Variable) -> Result<(), AllocationError> {
        let data = self.variables.get_mut(u32::from(variable.0));
        match data.edit.take() {
            Some(edit) => self.remove_constraint(edit.constraint),
            None => Ok(()),
        }
    }

    /// Whether `variable` currently has an edit constraint.
    pub fn has_edit(&self, variable: Variable) -> bool {
        self.variables.get(u32::from(variable.0)).edit.is_some()
    }

    /// Suggest a desired value for one variable. See [`suggest_all`].
    ///
    /// [`suggest_all`]: Self::suggest_all
    pub fn suggest(&mut self, variable: Variable, value: f64) -> Result<(), AllocationError> {
        self.suggest_all(&[(variable, value)])
    }

    /// Suggest desired values for a batch of variables.
    ///
    /// A variable without an active edit gets one at
    /// [`strength::MEDIUM`] first. All deltas are applied before a single
    /// dual optimization pass repairs feasibility, so the batch lands
    /// atomically: reads observe either the old solution or the fully
    /// resuggested one.
    pub fn suggest_all(
        &mut self,
        suggestions: &[(Variable, f64)],
    ) -> Result<(), AllocationError> {
        for &(variable, value) in suggestions {
            if !self.has_edit(variable) {
                self.enable_edit(variable, strength::MEDIUM)?;
            }
            let data = self.variables.get_mut(u32::from(variable.0));
            let edit = match data.edit.as_mut() {
                Some(edit) => edit,
                None => unreachable!("enable_edit installed an edit constraint"),
            };
            let delta = value - edit.value;
            edit.value = value;
            let constraint = edit.constraint;
            self.delta_edit_constant(delta, constraint);
        }
        self.dual_optimize()
    }

    /// Mint a symbol and its tableau column head.
    pub(crate) fn new_symbol(&mut self, kind: SymbolKind) -> Result<Symbol, AllocationError> {
        let id = self.variables.insert(VariableData { kind, edit: None })?;
        debug_assert!(id <= u32::from(Symbol::MAX));
        let symbol = id as Symbol;
        self.tableau.init_column(symbol)?;
        Ok(symbol)
    }

    /// Return a symbol to the pool. It must label no row and appear in no
    /// column.
    pub(crate) fn delete_symbol(&mut self, symbol: Symbol) {
        debug_assert!(!self.tableau.has_row(symbol));
        debug_assert_eq!(self.tableau.term(Coord { row: 0, column: symbol }).next_row, 0);

        self.tableau.remove(Coord { row: 0, column: symbol }, Unlink::Neither);
        self.variables.remove(u32::from(symbol));
    }

    pub(crate) fn kind(&self, symbol: Symbol) -> SymbolKind {
        self.variables.get(u32::from(symbol)).kind
    }

    pub(crate) fn is_external(&self, symbol: Symbol) -> bool {
        self.kind(symbol) == SymbolKind::External
    }

    pub(crate) fn is_error(&self, symbol: Symbol) -> bool {
        self.kind(symbol) == SymbolKind::Error
    }

    pub(crate) fn is_dummy(&self, symbol: Symbol) -> bool {
        self.kind(symbol) == SymbolKind::Dummy
    }

    /// Slack and error symbols may become basic; externals and dummies may
    /// not.
    pub(crate) fn is_pivotable(&self, symbol: Symbol) -> bool {
        matches!(self.kind(symbol), SymbolKind::Slack | SymbolKind::Error)
    }

    /// Build the tableau row for `spec` under a fresh temporary label,
    /// minting the marker (and error) symbols into `data`.
    ///
    /// The row is `-constant + Σ terms` with every basic variable already
    /// substituted, extended by the marker scheme of the relation, and
    /// flipped so its constant is non-negative.
    fn make_row(
        &mut self,
        spec: &ConstraintSpec,
        data: &mut ConstraintData,
    ) -> Result<Symbol, AddConstraintError> {
        let row = self.new_symbol(SymbolKind::Slack)?;
        if let Err(error) = self.fill_row(row, spec, data) {
            self.unwind_partial_row(row, data);
            return Err(error.into());
        }
        Ok(row)
    }

    fn fill_row(
        &mut self,
        row: Symbol,
        spec: &ConstraintSpec,
        data: &mut ConstraintData,
    ) -> Result<(), AllocationError> {
        self.tableau.init_row(row, -spec.constant)?;
        for &(variable, multiplier) in spec.terms {
            debug_assert!(self.is_external(variable.0));
            self.tableau.merge_row(row, variable.0, multiplier)?;
        }

        match spec.relation {
            Relation::LessEqual | Relation::GreaterEqual => {
                let coefficient = if spec.relation == Relation::LessEqual { 1.0 } else { -1.0 };
                data.marker = self.new_symbol(SymbolKind::Slack)?;
                self.tableau.add(Coord { row, column: data.marker }, coefficient)?;
                if spec.strength < strength::REQUIRED {
                    let other = self.new_symbol(SymbolKind::Error)?;
                    data.other = Some(other);
                    self.tableau.add(Coord { row, column: other }, -coefficient)?;
                    self.tableau
                        .add(Coord { row: self.objective, column: other }, spec.strength)?;
                }
            }
            Relation::Equal if spec.strength >= strength::REQUIRED => {
                data.marker = self.new_symbol(SymbolKind::Dummy)?;
                self.tableau.add(Coord { row, column: data.marker }, 1.0)?;
            }
            Relation::Equal => {
                data.marker = self.new_symbol(SymbolKind::Error)?;
                let other = self.new_symbol(SymbolKind::Error)?;
                data.other = Some(other);
                self.tableau.add(Coord { row, column: data.marker }, -1.0)?;
                self.tableau.add(Coord { row, column: other }, 1.0)?;
                self.tableau
                    .add(Coord { row: self.objective, column: data.marker }, spec.strength)?;
                self.tableau
                    .add(Coord { row: self.objective, column: other }, spec.strength)?;
            }
        }

        if self.tableau.constant(row) < 0.0 {
            self.tableau.multiply_row(row, -1.0);
        }
        Ok(())
    }

    /// Undo a row abandoned partway through [`fill_row`]: free the row,
    /// strip any objective coefficients the minted symbols received, and
    /// return the symbols to the pool.
    fn unwind_partial_row(&mut self, row: Symbol, data: &ConstraintData) {
        if self.tableau.has_row(row) {
            self.drop_row(row);
        }
        for symbol in data.other.into_iter().chain(Some(data.marker)) {
            if symbol == 0 {
                continue;
            }
            let objective_coord = Coord { row: self.objective, column: symbol };
            if self.tableau.find(objective_coord).is_some() {
                self.tableau.remove(objective_coord, Unlink::Both);
            }
            self.delete_symbol(symbol);
        }
        self.delete_symbol(row);
    }

    /// Pick the symbol to solve the fresh row for, in preference order: an
    /// external symbol from the body, then the marker or the error pair
    /// member when pivotable with a negative coefficient. Also reports
    /// whether every body symbol is a dummy.
    fn choose_subject(&self, row: Symbol, data: &ConstraintData) -> (Symbol, bool) {
        let mut all_dummy = true;
        for term in self.tableau.row_terms(row) {
            let column = term.coord.column;
            if self.is_external(column) {
                return (column, false);
            }
            all_dummy = all_dummy && self.is_dummy(column);
        }

        if self.is_pivotable(data.marker)
            && self.tableau.term(Coord { row, column: data.marker }).multiplier < 0.0
        {
            return (data.marker, false);
        }
        if let Some(other) = data.other {
            if self.is_pivotable(other)
                && self.tableau.term(Coord { row, column: other }).multiplier < 0.0
            {
                return (other, false);
            }
        }
        (0, all_dummy)
    }

    /// Admit the freshly built row: pivot it onto a subject symbol, fall
    /// back to the artificial-variable bootstrap, or reject it.
    fn try_add_row(&mut self, row: Symbol, data: &ConstraintData) -> Result<(), AddConstraintError> {
        let (mut subject, all_dummy) = self.choose_subject(row, data);
        if subject == 0 && all_dummy {
            if near_zero(self.tableau.constant(row)) {
                // degenerate but satisfied; park it on its own dummy
                subject = data.marker;
            } else {
                self.drop_row(row);
                self.delete_symbol(row);
                return Err(AddConstraintError::Unsatisfiable);
            }
        }
        if subject == 0 {
            return self.add_with_artificial(row);
        }
        self.pivot(row, subject, 0)?;
        Ok(())
    }

    /// Excise a constraint's traces: its error weights leave the
    /// objective, its marker is pivoted out of the basis if needed and its
    /// row freed, and both engine symbols are scrubbed and returned to the
    /// pool.
    fn drop_constraint(&mut self, data: &ConstraintData) -> Result<(), AllocationError> {
        self.remove_errors(data)?;

        let marker = data.marker;
        if self.tableau.has_row(marker) {
            self.drop_row(marker);
        } else if let Some(exit) = self.leaving_row(marker) {
            self.pivot(exit, marker, exit)?;
            self.drop_row(marker);
        }
        self.scrub_column(marker);
        self.delete_symbol(marker);

        if let Some(other) = data.other {
            self.scrub_column(other);
            self.delete_symbol(other);
        }
        Ok(())
    }

    /// Subtract a constraint's error contributions from the objective. The
    /// current expression of each error symbol is what contributes, so a
    /// basic error folds its whole row in.
    fn remove_errors(&mut self, data: &ConstraintData) -> Result<(), AllocationError> {
        if self.is_error(data.marker) {
            self.tableau
                .merge_row(self.objective, data.marker, -data.strength)?;
        }
        if let Some(other) = data.other {
            if self.is_error(other) {
                self.tableau.merge_row(self.objective, other, -data.strength)?;
            }
        }
        if self.tableau.is_constant_row(self.objective) {
            self.tableau
                .term_mut(Coord { row: self.objective, column: 0 })
                .multiplier = 0.0;
        }
        Ok(())
    }

    /// The row to pivot a non-basic marker into before its removal.
    ///
    /// Prefers the restricted row minimizing `-constant / coefficient`
    /// over negative coefficients, then the positive-coefficient ratio,
    /// then any external row. The objective row is never chosen; it must
    /// outlive every constraint.
    fn leaving_row(&self, marker: Symbol) -> Option<Symbol> {
        let mut negative = 0;
        let mut positive = 0;
        let mut external = 0;
        let mut negative_ratio = f64::MAX;
        let mut positive_ratio = f64::MAX;

        for term in self.tableau.column_terms(marker) {
            let row = term.coord.row;
            if row == self.objective {
                continue;
            }
            if self.is_external(row) {
                external = row;
            } else if term.multiplier < 0.0 {
                let ratio = -self.tableau.constant(row) / term.multiplier;
                if ratio < negative_ratio {
                    negative_ratio = ratio;
                    negative = row;
                }
            } else {
                let ratio = self.tableau.constant(row) / term.multiplier;
                if ratio < positive_ratio {
                    positive_ratio = ratio;
                    positive = row;
                }
            }
        }

        [negative, positive, external]
            .into_iter()
            .find(|&row| row != 0)
    }

    /// Shift the edit constraint's constant by `delta`, queueing any row
    /// the shift made infeasible.
    fn delta_edit_constant(&mut self, delta: f64, constraint: Constraint) {
        let data = *self.constraints.get(constraint.0);

        // while one of the error pair is basic, only its row moves
        if self.tableau.has_row(data.marker) {
            self.tableau
                .term_mut(Coord { row: data.marker, column: 0 })
                .multiplier -= delta;
            self.mark_infeasible(data.marker);
            return;
        }
        if let Some(other) = data.other {
            if self.tableau.has_row(other) {
                self.tableau
                    .term_mut(Coord { row: other, column: 0 })
                    .multiplier += delta;
                self.mark_infeasible(other);
                return;
            }
        }

        // both non-basic: every row mentioning the marker absorbs the shift
        let mut row = self.tableau.term(Coord { row: 0, column: data.marker }).next_row;
        while row != 0 {
            let term = self.tableau.term(Coord { row, column: data.marker });
            let next = term.next_row;
            let coefficient = term.multiplier;
            self.tableau.term_mut(Coord { row, column: 0 }).multiplier += coefficient * delta;
            if !self.is_external(row) {
                self.mark_infeasible(row);
            }
            row = next;
        }
    }
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Solver {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Solver (objective s{})", self.objective)?;
        write!(f, "{}", self.tableau)
    }
}

#[cfg(test)]
impl Solver {
    /// Structural and optimality invariants that must hold between public
    /// operations.
    pub(crate) fn assert_consistent(&self) {
        use crate::data::EPSILON;

        assert_eq!(self.infeasible_rows, 0, "infeasibility queue not drained");
        self.tableau.assert_consistent();

        assert!(self.tableau.has_row(self.objective), "objective row lost");
        for term in self.tableau.row_terms(self.objective) {
            if !self.is_dummy(term.coord.column) {
                assert!(
                    term.multiplier >= -EPSILON,
                    "objective not optimal: s{} has coefficient {}",
                    term.coord.column,
                    term.multiplier
                );
            }
        }

        for row in self.tableau.row_labels() {
            if row != self.objective && !self.is_external(row) {
                assert!(
                    self.tableau.constant(row) >= -EPSILON,
                    "row s{} has negative constant {}",
                    row,
                    self.tableau.constant(row)
                );
            }
            // a basic symbol appears in no other row's body
            assert_eq!(
                self.tableau.term(Coord { row: 0, column: row }).next_row,
                0,
                "basic symbol s{} also appears as a column",
                row
            );
        }
    }
}

#[cfg(test)]
mod test {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    fn required_equality(solver: &mut Solver, variable: Variable, constant: f64) -> Constraint {
        solver
            .add_constraint(&ConstraintSpec {
                terms: &[(variable, 1.0)],
                relation: Relation::Equal,
                constant,
                strength: strength::REQUIRED,
            })
            .unwrap()
    }

    #[test]
    fn fresh_solver_is_consistent() {
        let solver = Solver::new();
        solver.assert_consistent();
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn page_size_must_be_a_power_of_two() {
        Solver::with_page_size(1000);
    }

    #[test]
    fn variables_get_distinct_symbols() {
        let mut solver = Solver::new();
        let x = solver.add_variable().unwrap();
        let y = solver.add_variable().unwrap();
        assert_ne!(x, y);
        assert_eq!(solver.value(x), 0.0);
        assert_eq!(solver.value(y), 0.0);
    }

    #[test]
    fn add_then_remove_keeps_the_tableau_consistent() {
        let mut solver = Solver::new();
        let x = solver.add_variable().unwrap();
        let y = solver.add_variable().unwrap();

        let first = required_equality(&mut solver, x, 20.0);
        solver.assert_consistent();

        let second = solver
            .add_constraint(&ConstraintSpec {
                terms: &[(x, 1.0), (y, -1.0)],
                relation: Relation::LessEqual,
                constant: 0.0,
                strength: strength::REQUIRED,
            })
            .unwrap();
        solver.assert_consistent();

        solver.remove_constraint(second).unwrap();
        solver.assert_consistent();
        solver.remove_constraint(first).unwrap();
        solver.assert_consistent();

        solver.remove_variable(x).unwrap();
        solver.remove_variable(y).unwrap();
    }

    #[test]
    fn edit_bookkeeping() {
        let mut solver = Solver::new();
        let x = solver.add_variable().unwrap();
        assert!(!solver.has_edit(x));

        solver.enable_edit(x, strength::STRONG).unwrap();
        assert!(solver.has_edit(x));
        solver.assert_consistent();

        // re-enabling replaces the edit constraint
        solver.enable_edit(x, strength::WEAK).unwrap();
        assert!(solver.has_edit(x));

        solver.disable_edit(x).unwrap();
        assert!(!solver.has_edit(x));
        solver.assert_consistent();
    }

    #[test]
    fn edit_strength_is_clamped_to_strong() {
        let mut solver = Solver::new();
        let x = solver.add_variable().unwrap();
        solver.enable_edit(x, strength::REQUIRED).unwrap();

        // a required clamp would make this unsatisfiable; strong loses
        required_equality(&mut solver, x, 7.0);
        solver.suggest(x, 3.0).unwrap();
        assert_approx_eq!(solver.value(x), 7.0);
    }

    #[test]
    fn suggestions_queue_is_drained() {
        let mut solver = Solver::new();
        let x = solver.add_variable().unwrap();
        let y = solver.add_variable().unwrap();
        solver
            .add_constraint(&ConstraintSpec {
                terms: &[(x, 1.0), (y, -1.0)],
                relation: Relation::Equal,
                constant: 4.0,
                strength: strength::REQUIRED,
            })
            .unwrap();

        solver.suggest_all(&[(x, 10.0), (y, 2.0)]).unwrap();
        solver.assert_consistent();
        assert_approx_eq!(solver.value(x) - solver.value(y), 4.0);
    }
}
