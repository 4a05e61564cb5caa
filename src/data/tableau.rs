//! # Sparse tableau
//!
//! A dictionary-of-keys sparse matrix holding the solver's linear
//! equalities. Each non-zero multiplier lives in a term record keyed by its
//! `(row, column)` coordinate; the coordinate is hashed into the index table
//! to locate the record in the term arena.
//!
//! Every term is threaded onto two intrusive doubly linked lists, one along
//! its row and one along its column, so both "all terms of this row" and
//! "all rows mentioning this symbol" are cheap walks. The lists are linked
//! by 16-bit symbol ids rather than pointers. Two sentinel kinds anchor
//! them: the row head at `(r, 0)`, whose multiplier doubles as the row's
//! constant, and the column head at `(0, c)`, which exists for the lifetime
//! of symbol `c`. Heads persist even when a body multiplier would decay;
//! body terms whose multiplier drops within [`EPSILON`](super::EPSILON) of
//! zero are deleted on the spot.
use std::fmt;

use itertools::Itertools;

use crate::data::arena::Arena;
use crate::data::index_map::{IndexMap, Probe};
use crate::data::{near_zero, AllocationError};

/// A variable id. Id `0` is reserved as "none" and as the sentinel end of
/// every link chain.
pub type Symbol = u16;

/// Position of a term: the basic symbol labelling its row and the non-basic
/// symbol labelling its column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Coord {
    pub row: Symbol,
    pub column: Symbol,
}

/// FNV-1a over the four coordinate bytes, bumped to 1 when the digest is 0
/// so that 0 stays the index table's empty marker.
fn coord_hash(coord: Coord) -> u32 {
    const SEED: u32 = 0x811C_9DC5;
    const PRIME: u32 = 0x0100_0193;

    let mut hash = SEED;
    let bytes = coord.row.to_le_bytes().into_iter().chain(coord.column.to_le_bytes());
    for byte in bytes {
        hash = (hash ^ u32::from(byte)).wrapping_mul(PRIME);
    }
    if hash == 0 {
        1
    } else {
        hash
    }
}

/// One matrix entry plus its position in the two link chains.
#[derive(Clone, Copy, Debug)]
pub struct Term {
    pub coord: Coord,
    pub prev_row: Symbol,
    pub next_row: Symbol,
    pub prev_column: Symbol,
    pub next_column: Symbol,
    pub multiplier: f64,
}

impl Term {
    fn new(coord: Coord) -> Self {
        Self {
            coord,
            prev_row: 0,
            next_row: 0,
            prev_column: 0,
            next_column: 0,
            multiplier: 0.0,
        }
    }
}

/// Which chains to splice a term out of on deletion.
///
/// `ColumnOnly` serves walks that discard a whole row afterwards, and
/// `RowOnly` the mirrored case of a column about to be reset; repairing a
/// chain that is about to disappear would be wasted work.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unlink {
    Neither,
    RowOnly,
    ColumnOnly,
    Both,
}

impl Unlink {
    fn row(self) -> bool {
        matches!(self, Unlink::RowOnly | Unlink::Both)
    }

    fn column(self) -> bool {
        matches!(self, Unlink::ColumnOnly | Unlink::Both)
    }
}

/// Result of probing for a coordinate: where the probe ended, and the term
/// arena index when the coordinate is present.
struct Located {
    probe: Probe,
    term: Option<u32>,
}

/// The sparse matrix of current linear equalities.
pub struct Tableau {
    terms: Arena<Term>,
    index: IndexMap,
}

impl Tableau {
    /// Create a tableau with `page_size` bytes reserved for the term arena
    /// and the same for the index table.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            terms: Arena::with_page_size(page_size),
            index: IndexMap::with_page_size(page_size),
        }
    }

    /// The term at `coord`, if present.
    pub fn find(&self, coord: Coord) -> Option<&Term> {
        self.locate(coord).term.map(|index| self.terms.get(index))
    }

    /// The term at `coord` mutably, if present.
    pub fn find_mut(&mut self, coord: Coord) -> Option<&mut Term> {
        match self.locate(coord).term {
            Some(index) => Some(self.terms.get_mut(index)),
            None => None,
        }
    }

    /// The term at `coord`; the coordinate must be present.
    pub fn term(&self, coord: Coord) -> &Term {
        match self.find(coord) {
            Some(term) => term,
            None => panic!("no term at ({}, {})", coord.row, coord.column),
        }
    }

    /// The term at `coord` mutably; the coordinate must be present.
    pub fn term_mut(&mut self, coord: Coord) -> &mut Term {
        match self.locate(coord).term {
            Some(index) => self.terms.get_mut(index),
            None => panic!("no term at ({}, {})", coord.row, coord.column),
        }
    }

    /// Whether `row` labels a live row.
    pub fn has_row(&self, row: Symbol) -> bool {
        self.find(Coord { row, column: 0 }).is_some()
    }

    /// Whether the live row `row` consists of its constant alone.
    pub fn is_constant_row(&self, row: Symbol) -> bool {
        self.term(Coord { row, column: 0 }).next_column == 0
    }

    /// The constant of `row`, or `0.0` when `row` labels no row.
    pub fn constant(&self, row: Symbol) -> f64 {
        self.find(Coord { row, column: 0 }).map_or(0.0, |term| term.multiplier)
    }

    /// Start a row: store its constant at `(row, 0)`.
    pub fn init_row(&mut self, row: Symbol, constant: f64) -> Result<(), AllocationError> {
        debug_assert!(!self.has_row(row));

        self.add(Coord { row, column: 0 }, constant)
    }

    /// Create the column head `(0, column)` for a fresh symbol.
    pub fn init_column(&mut self, column: Symbol) -> Result<(), AllocationError> {
        debug_assert_ne!(column, 0);
        debug_assert!(self.find(Coord { row: 0, column }).is_none());

        self.add(Coord { row: 0, column }, 0.0)
    }

    /// Add `value` to the multiplier at `coord`, creating the term when the
    /// coordinate is absent and deleting it when a body multiplier decays
    /// to near zero. Heads (`row == 0` or `column == 0`) always persist.
    pub fn add(&mut self, coord: Coord, value: f64) -> Result<(), AllocationError> {
        let located = self.locate(coord);
        let index = match located.term {
            Some(index) => index,
            None => self.create(coord, located.probe)?,
        };

        let term = self.terms.get_mut(index);
        term.multiplier += value;
        if coord.row != 0 && coord.column != 0 && near_zero(term.multiplier) {
            self.remove(coord, Unlink::Both);
        }
        Ok(())
    }

    /// Add `multiplier` times the row of `source` (constant included) into
    /// the row of `target`.
    pub fn add_row(
        &mut self,
        target: Symbol,
        source: Symbol,
        multiplier: f64,
    ) -> Result<(), AllocationError> {
        debug_assert_ne!(target, source);

        let mut column = 0;
        loop {
            let term = self.term(Coord { row: source, column });
            let next = term.next_column;
            let value = term.multiplier * multiplier;
            self.add(Coord { row: target, column }, value)?;
            if next == 0 {
                break;
            }
            column = next;
        }
        Ok(())
    }

    /// Scale every term of `row`, constant included.
    pub fn multiply_row(&mut self, row: Symbol, multiplier: f64) {
        let mut column = 0;
        loop {
            let term = self.term_mut(Coord { row, column });
            term.multiplier *= multiplier;
            let next = term.next_column;
            if next == 0 {
                break;
            }
            column = next;
        }
    }

    /// Substitute `symbol` into the row of `target`: inline its row scaled
    /// by `multiplier` when it is basic, otherwise add the single term.
    pub fn merge_row(
        &mut self,
        target: Symbol,
        symbol: Symbol,
        multiplier: f64,
    ) -> Result<(), AllocationError> {
        if self.has_row(symbol) {
            self.add_row(target, symbol, multiplier)
        } else {
            self.add(Coord { row: target, column: symbol }, multiplier)
        }
    }

    /// Delete every term of `row`, head included. Body terms are spliced
    /// out of their column chains only; the row chain dies with the row.
    pub fn free_row(&mut self, row: Symbol) {
        let mut column = 0;
        loop {
            let term = self.term(Coord { row, column });
            let next = term.next_column;
            let unlink = if column == 0 { Unlink::Neither } else { Unlink::ColumnOnly };
            self.remove(Coord { row, column }, unlink);
            if next == 0 {
                break;
            }
            column = next;
        }
    }

    /// Delete the term at `coord`, splicing the chains `unlink` names.
    pub fn remove(&mut self, coord: Coord, unlink: Unlink) {
        let located = self.locate(coord);
        let index = match located.term {
            Some(index) => index,
            None => panic!("no term at ({}, {})", coord.row, coord.column),
        };
        self.unlink(index, unlink);
        let erased = self.index.erase(located.probe.slot);
        debug_assert_eq!(erased, index);
        self.terms.remove(index);
    }

    /// Clear the column head links of `column` after a walk that removed
    /// the column's terms without splicing the chain.
    pub fn reset_column_head(&mut self, column: Symbol) {
        let head = self.term_mut(Coord { row: 0, column });
        head.next_row = 0;
        head.prev_row = 0;
    }

    /// The body terms of `row`, skipping the constant head.
    ///
    /// The tableau must not be mutated while iterating; walks that delete
    /// or create terms fetch each successor id before editing instead.
    pub fn row_terms(&self, row: Symbol) -> RowTerms {
        RowTerms {
            tableau: self,
            row,
            column: self.term(Coord { row, column: 0 }).next_column,
        }
    }

    /// The terms of `column` across all rows, skipping the column head.
    pub fn column_terms(&self, column: Symbol) -> ColumnTerms {
        ColumnTerms {
            tableau: self,
            column,
            row: self.term(Coord { row: 0, column }).next_row,
        }
    }

    fn locate(&self, coord: Coord) -> Located {
        let hash = coord_hash(coord);
        let mut probe = self.index.find(hash);
        while probe.hash == hash {
            let index = self.index.value(probe.slot);
            if self.terms.get(index).coord == coord {
                return Located { probe, term: Some(index) };
            }
            probe = self.index.find_next(&probe);
        }
        Located { probe, term: None }
    }

    /// Insert an empty term at `coord`, linking body terms into both
    /// chains. `probe` is the insertion point `locate` returned.
    fn create(&mut self, coord: Coord, probe: Probe) -> Result<u32, AllocationError> {
        let index = self.terms.insert(Term::new(coord))?;
        self.index.insert(probe.slot, coord_hash(coord), index);
        if self.index.overloaded() {
            if let Err(error) = self.index.grow() {
                self.index.erase(probe.slot);
                self.terms.remove(index);
                return Err(error);
            }
        }
        if coord.row != 0 && coord.column != 0 {
            self.link(coord, index);
        }
        Ok(index)
    }

    /// Append the term at `coord` to the tail of its row chain and of its
    /// column chain. The tails are remembered by the heads' back links.
    fn link(&mut self, coord: Coord, index: u32) {
        let head = self.term_mut(Coord { row: coord.row, column: 0 });
        let tail_column = head.prev_column;
        head.prev_column = coord.column;
        let tail = self.term_mut(Coord { row: coord.row, column: tail_column });
        debug_assert_eq!(tail.next_column, 0);
        tail.next_column = coord.column;

        let head = self.term_mut(Coord { row: 0, column: coord.column });
        let tail_row = head.prev_row;
        head.prev_row = coord.row;
        let tail = self.term_mut(Coord { row: tail_row, column: coord.column });
        debug_assert_eq!(tail.next_row, 0);
        tail.next_row = coord.row;

        let term = self.terms.get_mut(index);
        term.prev_column = tail_column;
        term.next_column = 0;
        term.prev_row = tail_row;
        term.next_row = 0;
    }

    fn unlink(&mut self, index: u32, unlink: Unlink) {
        let term = *self.terms.get(index);
        if unlink.row() {
            let row = term.coord.row;
            self.term_mut(Coord { row, column: term.prev_column }).next_column = term.next_column;
            self.term_mut(Coord { row, column: term.next_column }).prev_column = term.prev_column;
        }
        if unlink.column() {
            let column = term.coord.column;
            self.term_mut(Coord { row: term.prev_row, column }).next_row = term.next_row;
            self.term_mut(Coord { row: term.next_row, column }).prev_row = term.prev_row;
        }
    }
}

/// Borrowing iterator over the body terms of one row.
pub struct RowTerms<'a> {
    tableau: &'a Tableau,
    row: Symbol,
    column: Symbol,
}

impl<'a> Iterator for RowTerms<'a> {
    type Item = &'a Term;

    fn next(&mut self) -> Option<&'a Term> {
        if self.column == 0 {
            return None;
        }
        let term = self.tableau.term(Coord { row: self.row, column: self.column });
        self.column = term.next_column;
        Some(term)
    }
}

/// Borrowing iterator over the terms of one column across all rows.
pub struct ColumnTerms<'a> {
    tableau: &'a Tableau,
    column: Symbol,
    row: Symbol,
}

impl<'a> Iterator for ColumnTerms<'a> {
    type Item = &'a Term;

    fn next(&mut self) -> Option<&'a Term> {
        if self.row == 0 {
            return None;
        }
        let term = self.tableau.term(Coord { row: self.row, column: self.column });
        self.row = term.next_row;
        Some(term)
    }
}

impl fmt::Display for Tableau {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rows = self
            .terms
            .iter()
            .filter(|(_, term)| term.coord.row != 0 && term.coord.column == 0)
            .map(|(_, term)| term.coord.row)
            .sorted();
        for row in rows {
            let body = self
                .row_terms(row)
                .map(|term| format!("{:+} s{}", term.multiplier, term.coord.column))
                .join(" ");
            writeln!(f, "s{} = {} {}", row, self.constant(row), body)?;
        }
        Ok(())
    }
}

#[cfg(test)]
impl Tableau {
    /// The labels of all live rows, in id order.
    pub(crate) fn row_labels(&self) -> Vec<Symbol> {
        self.terms
            .iter()
            .filter(|(_, term)| term.coord.row != 0 && term.coord.column == 0)
            .map(|(_, term)| term.coord.row)
            .sorted()
            .collect()
    }

    /// Check the structural invariants: every row has its head, every
    /// symbol in use has a column head whose chain visits exactly the rows
    /// mentioning it, no body multiplier is near zero, and forward and
    /// backward links mirror each other.
    ///
    /// Row-head `next_row` links are borrowed by the solver's infeasibility
    /// queue, so this must only run while that queue is empty.
    pub(crate) fn assert_consistent(&self) {
        use std::collections::{HashMap, HashSet};

        let live: Vec<Term> = self.terms.iter().map(|(_, term)| *term).collect();

        let mut row_bodies: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();
        let mut column_bodies: HashMap<Symbol, HashSet<Symbol>> = HashMap::new();
        for term in &live {
            let Coord { row, column } = term.coord;
            if row != 0 && column != 0 {
                assert!(
                    !near_zero(term.multiplier),
                    "near-zero body term at ({}, {})",
                    row,
                    column
                );
                row_bodies.entry(row).or_default().insert(column);
                column_bodies.entry(column).or_default().insert(row);
            }
        }

        for (&row, body) in &row_bodies {
            assert!(self.has_row(row), "row {} has body terms but no head", row);
            let forward: HashSet<Symbol> =
                self.row_terms(row).map(|term| term.coord.column).collect();
            assert_eq!(&forward, body, "row {} chain mismatch", row);
            // back links mirror the forward walk
            let mut previous = 0;
            for term in self.row_terms(row) {
                assert_eq!(term.prev_column, previous);
                previous = term.coord.column;
            }
            assert_eq!(self.term(Coord { row, column: 0 }).prev_column, previous);
        }

        for (&column, body) in &column_bodies {
            assert!(
                self.find(Coord { row: 0, column }).is_some(),
                "column {} has terms but no head",
                column
            );
            let forward: HashSet<Symbol> =
                self.column_terms(column).map(|term| term.coord.row).collect();
            assert_eq!(&forward, body, "column {} chain mismatch", column);
            let mut previous = 0;
            for term in self.column_terms(column) {
                assert_eq!(term.prev_row, previous);
                previous = term.coord.row;
            }
            assert_eq!(self.term(Coord { row: 0, column }).prev_row, previous);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn coord(row: Symbol, column: Symbol) -> Coord {
        Coord { row, column }
    }

    /// A tableau with column heads for symbols 1 through `symbols`.
    fn tableau_with_symbols(symbols: Symbol) -> Tableau {
        let mut tableau = Tableau::with_page_size(256);
        for column in 1..=symbols {
            tableau.init_column(column).unwrap();
        }
        tableau
    }

    #[test]
    fn coordinate_hash_is_never_zero() {
        for row in 0..64 {
            for column in 0..64 {
                assert_ne!(coord_hash(coord(row, column)), 0);
            }
        }
    }

    #[test]
    fn add_accumulates_and_decays() {
        let mut tableau = tableau_with_symbols(3);
        tableau.init_row(2, 5.0).unwrap();

        tableau.add(coord(2, 3), 1.5).unwrap();
        tableau.add(coord(2, 3), 0.5).unwrap();
        assert_eq!(tableau.term(coord(2, 3)).multiplier, 2.0);

        tableau.add(coord(2, 3), -2.0).unwrap();
        assert!(tableau.find(coord(2, 3)).is_none());
        tableau.assert_consistent();

        // heads survive a zero multiplier
        tableau.add(coord(2, 0), -5.0).unwrap();
        assert!(tableau.has_row(2));
        assert_eq!(tableau.constant(2), 0.0);
    }

    #[test]
    fn rows_and_columns_are_chained() {
        let mut tableau = tableau_with_symbols(4);
        tableau.init_row(2, 1.0).unwrap();
        tableau.init_row(3, 2.0).unwrap();
        tableau.add(coord(2, 1), 1.0).unwrap();
        tableau.add(coord(2, 4), 2.0).unwrap();
        tableau.add(coord(3, 4), 3.0).unwrap();
        tableau.assert_consistent();

        let columns: Vec<Symbol> = tableau.row_terms(2).map(|t| t.coord.column).collect();
        assert_eq!(columns, vec![1, 4]);
        let rows: Vec<Symbol> = tableau.column_terms(4).map(|t| t.coord.row).collect();
        assert_eq!(rows, vec![2, 3]);
    }

    #[test]
    fn remove_splices_both_chains() {
        let mut tableau = tableau_with_symbols(4);
        tableau.init_row(2, 0.0).unwrap();
        for column in [1, 3, 4] {
            tableau.add(coord(2, column), 1.0).unwrap();
        }
        tableau.init_row(3, 0.0).unwrap();
        tableau.add(coord(3, 3), 1.0).unwrap();

        tableau.remove(coord(2, 3), Unlink::Both);
        tableau.assert_consistent();

        let columns: Vec<Symbol> = tableau.row_terms(2).map(|t| t.coord.column).collect();
        assert_eq!(columns, vec![1, 4]);
        let rows: Vec<Symbol> = tableau.column_terms(3).map(|t| t.coord.row).collect();
        assert_eq!(rows, vec![3]);
    }

    #[test]
    fn add_row_folds_in_constant_and_body() {
        let mut tableau = tableau_with_symbols(4);
        tableau.init_row(2, 3.0).unwrap();
        tableau.add(coord(2, 1), 2.0).unwrap();
        tableau.add(coord(2, 4), 1.0).unwrap();

        tableau.init_row(3, 1.0).unwrap();
        tableau.add(coord(3, 1), -1.0).unwrap();

        tableau.add_row(3, 2, 2.0).unwrap();
        tableau.assert_consistent();

        assert_eq!(tableau.constant(3), 7.0);
        assert_eq!(tableau.term(coord(3, 1)).multiplier, 3.0);
        assert_eq!(tableau.term(coord(3, 4)).multiplier, 2.0);
    }

    #[test]
    fn add_row_cancellation_deletes_terms() {
        let mut tableau = tableau_with_symbols(4);
        tableau.init_row(2, 0.0).unwrap();
        tableau.add(coord(2, 1), 1.0).unwrap();
        tableau.init_row(3, 0.0).unwrap();
        tableau.add(coord(3, 1), -1.0).unwrap();

        tableau.add_row(3, 2, 1.0).unwrap();
        tableau.assert_consistent();
        assert!(tableau.find(coord(3, 1)).is_none());
    }

    #[test]
    fn merge_row_inlines_basic_symbols() {
        let mut tableau = tableau_with_symbols(4);
        // symbol 2 is basic: s2 = 5 + 2 s1
        tableau.init_row(2, 5.0).unwrap();
        tableau.add(coord(2, 1), 2.0).unwrap();

        tableau.init_row(3, 0.0).unwrap();
        tableau.merge_row(3, 2, 3.0).unwrap();
        assert_eq!(tableau.constant(3), 15.0);
        assert_eq!(tableau.term(coord(3, 1)).multiplier, 6.0);
        assert!(tableau.find(coord(3, 2)).is_none());

        // symbol 4 is non-basic: merged as a plain term
        tableau.merge_row(3, 4, 1.0).unwrap();
        assert_eq!(tableau.term(coord(3, 4)).multiplier, 1.0);
        tableau.assert_consistent();
    }

    #[test]
    fn multiply_row_scales_constant_and_body() {
        let mut tableau = tableau_with_symbols(2);
        tableau.init_row(2, -4.0).unwrap();
        tableau.add(coord(2, 1), 2.0).unwrap();

        tableau.multiply_row(2, -1.0);
        assert_eq!(tableau.constant(2), 4.0);
        assert_eq!(tableau.term(coord(2, 1)).multiplier, -2.0);
    }

    #[test]
    fn free_row_clears_the_row_and_its_column_entries() {
        let mut tableau = tableau_with_symbols(4);
        tableau.init_row(2, 1.0).unwrap();
        tableau.add(coord(2, 1), 1.0).unwrap();
        tableau.add(coord(2, 3), 2.0).unwrap();
        tableau.init_row(4, 1.0).unwrap();
        tableau.add(coord(4, 3), 1.0).unwrap();

        tableau.free_row(2);
        tableau.assert_consistent();

        assert!(!tableau.has_row(2));
        assert_eq!(tableau.constant(2), 0.0);
        let rows: Vec<Symbol> = tableau.column_terms(3).map(|t| t.coord.row).collect();
        assert_eq!(rows, vec![4]);
    }

    #[test]
    fn survives_index_growth() {
        let mut tableau = Tableau::with_page_size(32);
        for column in 1..=40 {
            tableau.init_column(column).unwrap();
        }
        for row in 41..=50u16 {
            tableau.init_row(row, f64::from(row)).unwrap();
            for column in 1..=40 {
                tableau.add(coord(row, column), f64::from(column)).unwrap();
            }
        }
        tableau.assert_consistent();
        for row in 41..=50u16 {
            assert_eq!(tableau.constant(row), f64::from(row));
            assert_eq!(tableau.term(coord(row, 17)).multiplier, 17.0);
        }
    }
}
