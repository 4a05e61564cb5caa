//! # Pivot machinery
//!
//! The row operations the solver composes its public operations from: the
//! basis-changing [`pivot`](Solver::pivot), the primal optimization loop
//! run after every admission, the dual loop that repairs feasibility after
//! suggestions, and the artificial-variable bootstrap for rows that offer
//! no subject of their own.
//!
//! Tie-breaking in the primal leaving-row choice is part of the contract:
//! among equal ratios the smaller symbol id wins, so identical constraint
//! sequences pivot identically on every run.
use crate::algorithm::solver::{Solver, SymbolKind};
use crate::algorithm::AddConstraintError;
use crate::data::tableau::{Coord, Symbol, Unlink};
use crate::data::{approx_eq, near_zero, AllocationError};

impl Solver {
    /// Queue `row` for the dual pass if its constant went negative.
    ///
    /// The queue is threaded through the row heads' `next_row` links, which
    /// no column chain uses; a head already carrying a link is queued
    /// already. The chain is terminated by a row pointing at itself so that
    /// a zero link keeps meaning "not queued".
    pub(super) fn mark_infeasible(&mut self, row: Symbol) {
        let chain = self.infeasible_rows;
        let head = self.tableau.term_mut(Coord { row, column: 0 });
        if head.multiplier < 0.0 && head.next_row == 0 {
            head.next_row = if chain != 0 { chain } else { row };
            self.infeasible_rows = row;
        }
    }

    /// Take `row` out of the infeasibility queue if it sits there.
    ///
    /// Freeing a queued row would tear the intrusive chain apart, so every
    /// row disposal goes through [`drop_row`](Self::drop_row) first. The
    /// walk is a no-op whenever the queue is empty or the row unmarked.
    fn unqueue_row(&mut self, row: Symbol) {
        if self.tableau.term(Coord { row, column: 0 }).next_row == 0 {
            return;
        }
        if self.infeasible_rows == row {
            let head = self.tableau.term_mut(Coord { row, column: 0 });
            let next = head.next_row;
            head.next_row = 0;
            self.infeasible_rows = if next != row { next } else { 0 };
            return;
        }

        let mut previous = self.infeasible_rows;
        while previous != 0 {
            let link = self.tableau.term(Coord { row: previous, column: 0 }).next_row;
            if link == previous {
                // reached the tail without finding the row
                return;
            }
            if link == row {
                let next = self.tableau.term(Coord { row, column: 0 }).next_row;
                // splice past the row; its predecessor becomes the tail
                // when the row was the tail itself
                let spliced = if next == row { previous } else { next };
                self.tableau.term_mut(Coord { row: previous, column: 0 }).next_row = spliced;
                self.tableau.term_mut(Coord { row, column: 0 }).next_row = 0;
                return;
            }
            previous = link;
        }
    }

    /// Free a row, keeping the infeasibility queue intact.
    pub(super) fn drop_row(&mut self, row: Symbol) {
        self.unqueue_row(row);
        self.tableau.free_row(row);
    }

    /// Solve `row`'s equation for `entry` and substitute it through the
    /// tableau, making `entry` basic. `exit` is the symbol the row was
    /// solved for until now, or zero when the row is a temporary being
    /// consumed; a temporary label distinct from `exit` is deleted outright.
    pub(super) fn pivot(
        &mut self,
        row: Symbol,
        entry: Symbol,
        exit: Symbol,
    ) -> Result<(), AllocationError> {
        debug_assert!(!self.tableau.has_row(entry));

        let coord = Coord { row, column: entry };
        let multiplier = self.tableau.term(coord).multiplier;
        debug_assert!(entry != exit && !near_zero(multiplier));
        let reciprocal = 1.0 / multiplier;
        self.tableau.remove(coord, Unlink::Both);

        self.tableau.add_row(entry, row, -reciprocal)?;
        self.drop_row(row);
        if row != exit {
            self.delete_symbol(row);
        }
        if exit != 0 {
            self.tableau.add(Coord { row: entry, column: exit }, reciprocal)?;
        }

        // replace entry with its solved row everywhere it appears
        let mut current = self.tableau.term(Coord { row: 0, column: entry }).next_row;
        while current != 0 {
            let term = self.tableau.term(Coord { row: current, column: entry });
            let next = term.next_row;
            let multiplier = term.multiplier;
            self.tableau.remove(Coord { row: current, column: entry }, Unlink::RowOnly);
            self.tableau.add_row(current, entry, multiplier)?;
            if !self.is_external(current) {
                self.mark_infeasible(current);
            }
            current = next;
        }

        // the removals above left the column chain dangling
        self.tableau.reset_column_head(entry);
        Ok(())
    }

    /// Primal Simplex: pivot until no non-dummy objective coefficient is
    /// negative.
    ///
    /// `objective` is normally the solver's objective row, but the
    /// artificial bootstrap runs this against a candidate row to drive its
    /// constant to zero.
    pub(super) fn optimize(&mut self, objective: Symbol) -> Result<(), AddConstraintError> {
        loop {
            let mut enter = 0;
            for term in self.tableau.row_terms(objective) {
                if !self.is_dummy(term.coord.column) && term.multiplier < 0.0 {
                    enter = term.coord.column;
                    break;
                }
            }
            if enter == 0 {
                return Ok(());
            }

            let mut exit = 0;
            let mut min_ratio = f64::MAX;
            for term in self.tableau.column_terms(enter) {
                let row = term.coord.row;
                if !self.is_pivotable(row) || row == objective || term.multiplier > 0.0 {
                    continue;
                }
                let ratio = -self.tableau.constant(row) / term.multiplier;
                if ratio < min_ratio || (approx_eq(ratio, min_ratio) && row < exit) {
                    min_ratio = ratio;
                    exit = row;
                }
            }
            if exit == 0 {
                return Err(AddConstraintError::Internal);
            }

            self.pivot(exit, enter, exit)?;
        }
    }

    /// Dual Simplex: drain the infeasibility queue, re-pivoting each row
    /// whose constant is still negative on the entering column minimizing
    /// `objective coefficient / coefficient`.
    pub(super) fn dual_optimize(&mut self) -> Result<(), AllocationError> {
        while self.infeasible_rows != 0 {
            let leave = self.infeasible_rows;
            let head = self.tableau.term_mut(Coord { row: leave, column: 0 });
            self.infeasible_rows = if head.next_row != leave { head.next_row } else { 0 };
            head.next_row = 0;
            let constant = head.multiplier;

            // a later pivot may have repaired this row while it sat queued
            if near_zero(constant) || constant >= 0.0 {
                continue;
            }

            let mut enter = 0;
            let mut min_ratio = f64::MAX;
            for term in self.tableau.row_terms(leave) {
                let column = term.coord.column;
                if self.is_dummy(column) || term.multiplier <= 0.0 {
                    continue;
                }
                let objective_coefficient = self
                    .tableau
                    .find(Coord { row: self.objective, column })
                    .map_or(0.0, |term| term.multiplier);
                let ratio = objective_coefficient / term.multiplier;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    enter = column;
                }
            }
            assert_ne!(enter, 0, "dual optimization found no entering symbol");

            self.pivot(leave, enter, leave)?;
        }
        Ok(())
    }

    /// Admit a row that offered no subject: copy it under a fresh
    /// artificial symbol, minimize the source row like an objective, and
    /// accept when its constant reaches zero.
    ///
    /// The artificial is consumed by whichever path disposes of it: the
    /// eviction pivot deletes a still-basic artificial, and a non-basic
    /// one has its residual column scrubbed before deletion.
    pub(super) fn add_with_artificial(&mut self, row: Symbol) -> Result<(), AddConstraintError> {
        let artificial = self.new_symbol(SymbolKind::Slack)?;
        self.tableau.add_row(artificial, row, 1.0)?;

        match self.optimize(row) {
            Ok(()) => {}
            Err(AddConstraintError::Allocation(error)) => return Err(error.into()),
            // no leaving row: fall through to the feasibility check
            Err(_) => {}
        }
        let satisfied = near_zero(self.tableau.constant(row));
        self.drop_row(row);
        self.delete_symbol(row);

        if self.tableau.has_row(artificial) {
            if self.tableau.is_constant_row(artificial) {
                self.drop_row(artificial);
                self.delete_symbol(artificial);
                return if satisfied { Ok(()) } else { Err(AddConstraintError::Unbounded) };
            }

            let mut entry = 0;
            for term in self.tableau.row_terms(artificial) {
                if self.is_pivotable(term.coord.column) {
                    entry = term.coord.column;
                    break;
                }
            }
            if entry == 0 {
                self.drop_row(artificial);
                self.delete_symbol(artificial);
                return Err(AddConstraintError::Unbounded);
            }
            self.pivot(artificial, entry, 0)?;
        } else {
            self.scrub_column(artificial);
            self.delete_symbol(artificial);
        }

        if satisfied {
            Ok(())
        } else {
            Err(AddConstraintError::Unbounded)
        }
    }

    /// Delete every remaining term in `symbol`'s column. Only sound for a
    /// symbol that stays non-basic until its deletion: such terms no
    /// longer influence any row constant.
    pub(super) fn scrub_column(&mut self, symbol: Symbol) {
        let mut row = self.tableau.term(Coord { row: 0, column: symbol }).next_row;
        while row != 0 {
            let term = self.tableau.term(Coord { row, column: symbol });
            let next = term.next_row;
            self.tableau.remove(Coord { row, column: symbol }, Unlink::RowOnly);
            row = next;
        }
        self.tableau.reset_column_head(symbol);
    }
}
