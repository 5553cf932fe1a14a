//! Generation requests and admission control.

use crate::compiler::{CompiledPath, CompilerConfig, PathCompiler, Strategy};
use crate::error::{GenerationError, GenerationResult};
use crate::estimate::{ExpansionEstimate, estimate_expansion};
use crate::grammar::Grammar;
use crate::turtle::BoundingBox;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Parameters of one generation, as entered by the user.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub axiom: String,
    pub rules: String,
    /// Must be at least 1.
    pub iterations: i64,
    pub angle_degrees: f64,
}

impl GenerationRequest {
    pub fn new(
        axiom: impl Into<String>,
        rules: impl Into<String>,
        iterations: i64,
        angle_degrees: f64,
    ) -> Self {
        Self {
            axiom: axiom.into(),
            rules: rules.into(),
            iterations,
            angle_degrees,
        }
    }
}

/// A successful generation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Generation {
    pub path: CompiledPath,
    /// Segment count predicted before compiling.
    pub estimated_segments: u64,
    /// Wall-clock time spent parsing, estimating and compiling.
    pub elapsed_ms: f64,
}

impl Generation {
    pub fn bounds(&self) -> &BoundingBox {
        &self.path.bounds
    }

    pub fn draw_segment_count(&self) -> u64 {
        self.path.draw_segments
    }
}

/// Checks an iteration count and narrows it for the compiler.
pub fn validate_iterations(iterations: i64) -> GenerationResult<u32> {
    match u32::try_from(iterations) {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(GenerationError::InvalidIterationCount(iterations)),
    }
}

/// Refuses `grammar` when compiling it would exceed `config.max_segments`.
///
/// Sizes are checked against the same ceiling, in order: drawn segments,
/// path steps (draws, moves and pops), turtle operations (path steps, turns
/// and pushes), and, when the grammar will be expanded directly, the number
/// of frames the expansion visits. The refusal carries the first size over
/// the ceiling.
pub fn admit(
    grammar: &Grammar,
    iterations: u32,
    config: &CompilerConfig,
) -> GenerationResult<ExpansionEstimate> {
    if grammar.axiom().is_empty() {
        return Err(GenerationError::EmptyOrUnparsableGrammar);
    }

    let limit = config.max_segments;
    let estimate = estimate_expansion(grammar, iterations);
    let direct = config.strategy.resolve(grammar) == Strategy::Direct;
    let oversized = [
        Some(estimate.draw_segments),
        Some(estimate.path_steps),
        Some(estimate.turtle_ops),
        direct.then_some(estimate.expansion_work),
    ]
    .into_iter()
    .flatten()
    .find(|&size| size > limit);

    match oversized {
        Some(estimated) => Err(GenerationError::PathTooLarge { estimated, limit }),
        None => Ok(estimate),
    }
}

/// Validates, gates and compiles one request.
pub fn generate(
    request: &GenerationRequest,
    config: &CompilerConfig,
) -> GenerationResult<Generation> {
    let started = Instant::now();

    let iterations = validate_iterations(request.iterations)?;
    let grammar = Grammar::parse(&request.axiom, &request.rules);
    let estimate = admit(&grammar, iterations, config)?;

    let path = PathCompiler::new(config.clone()).compile(
        &grammar,
        iterations,
        request.angle_degrees,
    );
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    tracing::info!(
        segments = path.draw_segments,
        strategy = ?path.strategy,
        elapsed_ms,
        "generation complete"
    );

    Ok(Generation {
        path,
        estimated_segments: estimate.draw_segments,
        elapsed_ms,
    })
}
