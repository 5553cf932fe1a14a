//! Compiler that turns a [`Grammar`] into a [`PathBuffer`].
//!
//! The entry point is [`PathCompiler`]. Configure it with a [`CompilerConfig`]
//! and call [`PathCompiler::compile`] with a grammar, an iteration count and a
//! turn angle.
//!
//! Two strategies are available:
//!
//! * [`Strategy::Direct`] walks the expansion with an explicit frame stack and
//!   interprets every terminal symbol against one shared turtle. Work is
//!   proportional to the expanded length.
//! * [`Strategy::Composed`] traces each rewritten symbol once per depth, in a
//!   local frame, and stitches those rule paths into their parents with rigid
//!   transforms. Symbolic work is proportional to `iterations × grammar size`.
//!
//! Both emit exactly the same command sequence for bracket-local grammars
//! (see [`Grammar::is_bracket_local`]); [`Strategy::Auto`] picks the composed
//! strategy whenever that holds.

use crate::grammar::{Grammar, Symbol};
use crate::path::PathBuffer;
use crate::turtle::{BoundingBox, Pose, TurtleOp, TurtleState};
use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Maximum number of drawn segments a request may produce.
pub const DEFAULT_MAX_SEGMENTS: u64 = 1_000_000;

/// How the compiler expands the grammar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Composed when the grammar is bracket-local, direct otherwise.
    #[default]
    Auto,
    /// Explicit-stack expansion over a single turtle.
    Direct,
    /// Bottom-up memoized composition of per-symbol rule paths.
    Composed,
}

impl Strategy {
    /// The strategy that will actually run for `grammar`. Never `Auto`.
    pub fn resolve(self, grammar: &Grammar) -> Strategy {
        match self {
            Strategy::Auto if grammar.is_bracket_local() => Strategy::Composed,
            Strategy::Auto => Strategy::Direct,
            forced => forced,
        }
    }
}

/// Configuration for path compilation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Distance covered by one draw or skip symbol.
    pub step_length: f64,
    /// Starting heading in degrees. `-90` points up on a y-down surface.
    pub initial_heading: f64,
    /// Admission ceiling on the estimated segment count.
    pub max_segments: u64,
    pub strategy: Strategy,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            step_length: 1.0,
            initial_heading: -90.0,
            max_segments: DEFAULT_MAX_SEGMENTS,
            strategy: Strategy::Auto,
        }
    }
}

/// The geometry produced by one compilation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompiledPath {
    /// Commands in the compilation frame, starting with a move to the origin.
    pub path: PathBuffer,
    /// Exact bounds of every visited point.
    pub bounds: BoundingBox,
    /// Pose of the turtle after the last symbol.
    pub end: Pose,
    /// Number of `LineTo` commands.
    pub draw_segments: u64,
    /// Pushes left unmatched at the end of the axiom.
    pub open_branches: usize,
    /// Strategy actually used (never `Auto`).
    pub strategy: Strategy,
    /// Rule paths traced by the composed strategy; zero for direct.
    pub rule_paths: usize,
}

/// A rule path traced in its own frame: origin start, reference heading.
#[derive(PartialEq)]
struct RulePath {
    path: PathBuffer,
    end: Pose,
}

type RulePaths<'g> = HashMap<&'g Symbol, RulePath>;

/// Compiles grammars into paths.
pub struct PathCompiler {
    config: CompilerConfig,
}

impl PathCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Expands `grammar` `iterations` times and traces the result with turns
    /// of `angle` degrees.
    ///
    /// `iterations == 0` interprets the axiom literally. No size check is
    /// made here; callers gate on [`crate::admit`] first.
    #[tracing::instrument(skip(self, grammar), fields(axiom_len = grammar.axiom().len()))]
    pub fn compile(&self, grammar: &Grammar, iterations: u32, angle: f64) -> CompiledPath {
        let strategy = self.config.strategy.resolve(grammar);
        match (self.config.strategy, strategy) {
            (Strategy::Auto, Strategy::Direct) => {
                tracing::debug!("replacements are not bracket-balanced, expanding directly");
            }
            (Strategy::Composed, _) if !grammar.is_bracket_local() => {
                tracing::warn!(
                    "composed strategy forced on a grammar with unbalanced replacements; \
                     branch restores that cross rule boundaries will be lost"
                );
            }
            _ => {}
        }

        match strategy {
            Strategy::Direct => self.compile_direct(grammar, iterations, angle),
            _ => self.compile_composed(grammar, iterations, angle),
        }
    }

    /// Explicit-stack expansion.
    ///
    /// Frames are `(symbols, remaining)`. A frame with nothing remaining is
    /// interpreted in order; otherwise one frame per symbol is pushed in
    /// reverse so that popping replays left to right.
    pub fn compile_direct(&self, grammar: &Grammar, iterations: u32, angle: f64) -> CompiledPath {
        let mut turtle = TurtleState::new(DVec2::ZERO, self.config.initial_heading);
        let mut path = PathBuffer::new();
        path.move_to(DVec2::ZERO);

        let mut frames: Vec<(&[Symbol], u32)> = vec![(grammar.axiom(), iterations)];
        while let Some((symbols, remaining)) = frames.pop() {
            if remaining == 0 {
                for symbol in symbols {
                    self.interpret(symbol.op(), angle, &mut turtle, &mut path);
                }
                continue;
            }
            for symbol in symbols.iter().rev() {
                match grammar.production(symbol) {
                    Some(replacement) => frames.push((replacement, remaining - 1)),
                    None => frames.push((std::slice::from_ref(symbol), 0)),
                }
            }
        }

        self.finish(path, turtle, Strategy::Direct, 0)
    }

    /// Bottom-up memoized composition.
    ///
    /// Level `i` holds the rewritable symbols that occur after `i` rewrites of
    /// the axiom. Levels are traced deepest first so each rule path can embed
    /// the already traced paths of the level below it.
    ///
    /// Once the level sets repeat with some period, a traced level that equals
    /// the one a period deeper repeats all the way up to where the cycle
    /// starts, so those levels are skipped. Only one period of rule paths is
    /// alive at a time.
    pub fn compile_composed(&self, grammar: &Grammar, iterations: u32, angle: f64) -> CompiledPath {
        let levels = Levels::new(grammar, iterations);

        // Rule paths of the most recently traced levels, shallowest first.
        let mut recent: VecDeque<RulePaths> = VecDeque::new();
        let mut rule_paths = 0;
        let mut level = levels.depth;
        while level > 0 {
            level -= 1;
            let traced = self.trace_level(grammar, levels.get(level), recent.front(), angle);
            rule_paths += traced.len();
            tracing::trace!(level, rule_paths = traced.len(), "traced rule paths");

            let Some((cycle_start, period)) = levels.cycle.filter(|&(start, _)| level >= start)
            else {
                recent.clear();
                recent.push_front(traced);
                continue;
            };

            let repeats = recent.len() == period && recent.back() == Some(&traced);
            if recent.len() == period {
                recent.pop_back();
            }
            recent.push_front(traced);

            if repeats && level > cycle_start {
                // `recent[k]` holds level `level + k`; keep the one congruent to
                // `cycle_start`.
                let offset = (period - (level - cycle_start) % period) % period;
                recent.swap(0, offset);
                recent.truncate(1);
                tracing::debug!(from = level, to = cycle_start, period, "rule paths repeat");
                level = cycle_start;
            }
        }

        let mut turtle = TurtleState::new(DVec2::ZERO, self.config.initial_heading);
        let mut path = PathBuffer::new();
        path.move_to(DVec2::ZERO);
        let cache = recent.front();
        self.trace(grammar.axiom(), cache, angle, &mut turtle, &mut path);

        self.finish(path, turtle, Strategy::Composed, rule_paths)
    }

    /// Traces the rule path of every symbol in `symbols` on top of `below`.
    fn trace_level<'g>(
        &self,
        grammar: &'g Grammar,
        symbols: &BTreeSet<&'g Symbol>,
        below: Option<&RulePaths<'g>>,
        angle: f64,
    ) -> RulePaths<'g> {
        let mut traced = HashMap::with_capacity(symbols.len());
        for &symbol in symbols {
            let replacement = grammar.production(symbol).unwrap_or_default();
            let mut turtle = TurtleState::new(DVec2::ZERO, self.config.initial_heading);
            let mut path = PathBuffer::new();
            self.trace(replacement, below, angle, &mut turtle, &mut path);
            traced.insert(
                symbol,
                RulePath {
                    path,
                    end: turtle.pose,
                },
            );
        }
        traced
    }

    /// Traces `symbols`, embedding cached rule paths for symbols found in
    /// `cache` and interpreting every other symbol directly.
    fn trace(
        &self,
        symbols: &[Symbol],
        cache: Option<&RulePaths<'_>>,
        angle: f64,
        turtle: &mut TurtleState,
        path: &mut PathBuffer,
    ) {
        for symbol in symbols {
            match cache.and_then(|cache| cache.get(symbol)) {
                Some(child) => self.embed(child, turtle, path),
                None => self.interpret(symbol.op(), angle, turtle, path),
            }
        }
    }

    /// Appends `child` at the turtle's pose.
    ///
    /// The child is rotated by the heading difference from the reference
    /// heading, then translated to the turtle's position. The turtle takes the
    /// child's transformed end pose.
    fn embed(&self, child: &RulePath, turtle: &mut TurtleState, path: &mut PathBuffer) {
        let reference = self.config.initial_heading;
        let transform = DAffine2::from_angle_translation(
            (turtle.pose.heading - reference).to_radians(),
            turtle.pose.position,
        );
        path.embed(&child.path, &transform, &mut turtle.bounds);
        turtle.pose = Pose::new(
            transform.transform_point2(child.end.position),
            turtle.pose.heading + (child.end.heading - reference),
        );
    }

    fn interpret(
        &self,
        op: TurtleOp,
        angle: f64,
        turtle: &mut TurtleState,
        path: &mut PathBuffer,
    ) {
        match op {
            TurtleOp::Draw => path.line_to(turtle.advance(self.config.step_length)),
            TurtleOp::Move => path.move_to(turtle.advance(self.config.step_length)),
            TurtleOp::Turn(sign) => turtle.turn(angle * sign),
            TurtleOp::Push => turtle.push(),
            TurtleOp::Pop => {
                if let Some(restored) = turtle.pop() {
                    path.move_to(restored);
                }
            }
            TurtleOp::Ignore => {}
        }
    }

    fn finish(
        &self,
        path: PathBuffer,
        turtle: TurtleState,
        strategy: Strategy,
        rule_paths: usize,
    ) -> CompiledPath {
        CompiledPath {
            draw_segments: path.line_count() as u64,
            path,
            bounds: turtle.bounds,
            end: turtle.pose,
            open_branches: turtle.depth(),
            strategy,
            rule_paths,
        }
    }
}

/// Rewritable symbols occurring at each level `0..depth`.
///
/// Each set is a function of the previous one over a finite alphabet, so the
/// sequence is eventually periodic. Sets are stored up to the first repeat.
struct Levels<'g> {
    depth: usize,
    sets: Vec<BTreeSet<&'g Symbol>>,
    /// `(start, period)` when the sequence repeats before `depth`.
    cycle: Option<(usize, usize)>,
}

impl<'g> Levels<'g> {
    /// Level 0 is the rewritable symbols of the axiom; level `i + 1` is every
    /// rewritable symbol in the replacement of a level `i` symbol.
    fn new(grammar: &'g Grammar, iterations: u32) -> Self {
        let depth = iterations as usize;
        let mut sets = Vec::new();
        let mut cycle = None;
        let mut current: BTreeSet<&Symbol> = grammar
            .axiom()
            .iter()
            .filter(|s| grammar.has_production(s))
            .collect();

        while sets.len() < depth {
            if let Some(start) = sets.iter().position(|seen| *seen == current) {
                cycle = Some((start, sets.len() - start));
                break;
            }
            let next = current
                .iter()
                .filter_map(|s| grammar.production(s))
                .flatten()
                .filter(|s| grammar.has_production(s))
                .collect();
            sets.push(std::mem::replace(&mut current, next));
        }

        Self { depth, sets, cycle }
    }

    fn get(&self, level: usize) -> &BTreeSet<&'g Symbol> {
        match self.cycle {
            Some((start, period)) if level >= self.sets.len() => {
                &self.sets[start + (level - start) % period]
            }
            _ => &self.sets[level],
        }
    }
}
