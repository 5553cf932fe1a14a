//! Output-size prediction without expansion.

use crate::grammar::{Grammar, Symbol};
use crate::turtle::TurtleOp;
use std::collections::BTreeMap;

/// Sizes predicted for one grammar and iteration count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExpansionEstimate {
    /// Draw symbols in the expanded string, i.e. `LineTo` commands.
    pub draw_segments: u64,
    /// Draw, move and pop symbols in the expanded string. The compiled path
    /// has at most `path_steps + 1` commands (pops on an empty stack emit
    /// nothing).
    pub path_steps: u64,
    /// Every symbol with a turtle meaning: path steps plus turns and pushes.
    /// Rule paths only change from one depth to the next through these.
    pub turtle_ops: u64,
    /// Frames visited by explicit-stack expansion: the axiom plus every
    /// symbol produced by a rewrite at any depth.
    pub expansion_work: u64,
}

/// Counts the draw symbols the fully expanded string would contain after
/// `iterations` rewrites.
///
/// The result equals the number of line segments [`crate::PathCompiler`]
/// emits for the same grammar and iteration count.
pub fn estimate_draw_segments(grammar: &Grammar, iterations: u32) -> u64 {
    estimate_expansion(grammar, iterations).draw_segments
}

/// Predicts the size of the expansion of `grammar` after `iterations`
/// rewrites.
///
/// Tracks one multiplicity per distinct symbol instead of the string itself.
/// One rewrite round is a linear map on those multiplicities, so `iterations`
/// rounds are applied by repeated squaring: the cost is `O(n³ log iterations)`
/// for `n` distinct symbols, however large `iterations` is. Counts saturate at
/// `u64::MAX`; any such grammar is far past any ceiling anyway.
pub fn estimate_expansion(grammar: &Grammar, iterations: u32) -> ExpansionEstimate {
    let symbols = distinct_symbols(grammar);
    let index: BTreeMap<&Symbol, usize> = symbols
        .iter()
        .enumerate()
        .map(|(i, &symbol)| (symbol, i))
        .collect();

    // One extra slot accumulates expansion work across rounds.
    let work = symbols.len();
    let mut round = Matrix::zero(work + 1);
    for (i, symbol) in symbols.iter().enumerate() {
        match grammar.production(symbol) {
            Some(replacement) => {
                for produced in replacement {
                    round.add(i, index[produced], 1);
                }
                round.add(i, work, replacement.len() as u64);
            }
            None => round.add(i, i, 1),
        }
    }
    round.add(work, work, 1);

    let mut counts = vec![0u64; work + 1];
    for symbol in grammar.axiom() {
        counts[index[symbol]] += 1;
    }
    counts[work] = grammar.axiom().len() as u64;

    let counts = round.apply_power(counts, iterations);

    let mut estimate = ExpansionEstimate {
        expansion_work: counts[work],
        ..Default::default()
    };
    for (symbol, &count) in symbols.iter().zip(&counts) {
        let op = symbol.op();
        if op == TurtleOp::Ignore {
            continue;
        }
        estimate.turtle_ops = estimate.turtle_ops.saturating_add(count);
        if matches!(op, TurtleOp::Draw | TurtleOp::Move | TurtleOp::Pop) {
            estimate.path_steps = estimate.path_steps.saturating_add(count);
        }
        if op == TurtleOp::Draw {
            estimate.draw_segments = estimate.draw_segments.saturating_add(count);
        }
    }
    estimate
}

/// Every symbol of the axiom and of the rules, in a stable order.
fn distinct_symbols(grammar: &Grammar) -> Vec<&Symbol> {
    let rules = grammar
        .rules()
        .iter()
        .flat_map(|(key, rhs)| std::iter::once(key).chain(rhs));
    let mut symbols: Vec<&Symbol> = grammar.axiom().iter().chain(rules).collect();
    symbols.sort();
    symbols.dedup();
    symbols
}

/// Square matrix of saturating counts. Row `i` holds what one occurrence of
/// symbol `i` becomes after one round.
struct Matrix {
    size: usize,
    cells: Vec<u64>,
}

impl Matrix {
    fn zero(size: usize) -> Self {
        Self {
            size,
            cells: vec![0; size * size],
        }
    }

    fn get(&self, row: usize, col: usize) -> u64 {
        self.cells[row * self.size + col]
    }

    fn add(&mut self, row: usize, col: usize, count: u64) {
        let cell = &mut self.cells[row * self.size + col];
        *cell = cell.saturating_add(count);
    }

    fn multiply(&self, other: &Matrix) -> Matrix {
        let mut out = Matrix::zero(self.size);
        for i in 0..self.size {
            for k in 0..self.size {
                let left = self.get(i, k);
                if left == 0 {
                    continue;
                }
                for j in 0..self.size {
                    out.add(i, j, left.saturating_mul(other.get(k, j)));
                }
            }
        }
        out
    }

    /// Row vector times this matrix.
    fn apply(&self, counts: &[u64]) -> Vec<u64> {
        let mut out = vec![0u64; self.size];
        for (i, &count) in counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            for (j, cell) in out.iter_mut().enumerate() {
                *cell = cell.saturating_add(count.saturating_mul(self.get(i, j)));
            }
        }
        out
    }

    /// `counts` times this matrix raised to `exponent`.
    fn apply_power(self, mut counts: Vec<u64>, mut exponent: u32) -> Vec<u64> {
        let mut base = self;
        while exponent > 0 {
            if exponent & 1 == 1 {
                counts = base.apply(&counts);
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.multiply(&base);
            }
        }
        counts
    }
}
