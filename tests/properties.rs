// tests/properties.rs
use lsys_path as lsys;
use lsys_path::{CompiledPath, CompilerConfig, Grammar, PathCommand, PathCompiler, Pose};
use proptest::prelude::*;

/// Grammar fragments whose brackets are balanced within each fragment.
const BALANCED: &[&str] = &["F", "f", "+", "-", "A", "B", "F1", "[+F]", "[-A]", "[B]"];

/// Fragments that may leave brackets unbalanced.
const ANY: &[&str] = &["F", "f", "+", "-", "A", "B", "F1", "[", "]"];

const ANGLES: &[f64] = &[22.5, 25.0, 60.0, 90.0, 120.0];

fn word(pieces: &'static [&'static str], max: usize) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(pieces), 1..max).prop_map(|p| p.concat())
}

fn grammar(pieces: &'static [&'static str]) -> impl Strategy<Value = Grammar> {
    (
        word(pieces, 5),
        prop::option::of(word(pieces, 5)),
        prop::option::of(word(pieces, 5)),
        prop::option::of(word(pieces, 4)),
        prop::option::of(word(pieces, 4)),
    )
        .prop_map(|(axiom, a, b, f, f1)| {
            let rules: Vec<String> = [("A", a), ("B", b), ("F", f), ("F1", f1)]
                .into_iter()
                .filter_map(|(key, rhs)| rhs.map(|rhs| format!("{key}={rhs}")))
                .collect();
            Grammar::parse(&axiom, &rules.join(";"))
        })
}

fn compile(
    grammar: &Grammar,
    strategy: lsys::Strategy,
    iterations: u32,
    angle: f64,
) -> CompiledPath {
    PathCompiler::new(CompilerConfig {
        strategy,
        ..Default::default()
    })
    .compile(grammar, iterations, angle)
}

fn assert_same_pose(a: &Pose, b: &Pose) {
    assert!((a.position - b.position).length() < 1e-6, "{a:?} != {b:?}");
    assert!((a.heading - b.heading).abs() < 1e-6, "{a:?} != {b:?}");
}

fn assert_same_geometry(direct: &CompiledPath, composed: &CompiledPath) {
    let (a, b) = (direct.path.commands(), composed.path.commands());
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        let same_kind = matches!(
            (x, y),
            (PathCommand::MoveTo(_), PathCommand::MoveTo(_))
                | (PathCommand::LineTo(_), PathCommand::LineTo(_))
        );
        assert!(same_kind, "{x:?} vs {y:?}");
        assert!((x.point() - y.point()).length() < 1e-6, "{x:?} vs {y:?}");
    }
    assert_same_pose(&direct.end, &composed.end);
    assert!((direct.bounds.min - composed.bounds.min).length() < 1e-6);
    assert!((direct.bounds.max - composed.bounds.max).length() < 1e-6);
    assert_eq!(direct.open_branches, composed.open_branches);
}

proptest! {
    #[test]
    fn estimate_matches_emitted_segments(
        grammar in grammar(ANY),
        iterations in 0u32..5,
        angle in prop::sample::select(ANGLES),
    ) {
        let estimate = lsys::estimate_expansion(&grammar, iterations);
        prop_assert_eq!(
            lsys::estimate_draw_segments(&grammar, iterations),
            estimate.draw_segments
        );
        let strategies = [
            lsys::Strategy::Auto,
            lsys::Strategy::Direct,
            lsys::Strategy::Composed,
        ];
        for strategy in strategies {
            let compiled = compile(&grammar, strategy, iterations, angle);
            prop_assert_eq!(compiled.draw_segments, estimate.draw_segments);
            // Pops on an empty stack emit nothing.
            prop_assert!(compiled.path.len() as u64 <= estimate.path_steps + 1);
        }
    }

    #[test]
    fn composition_matches_direct_expansion_at_every_depth(
        grammar in grammar(BALANCED),
        iterations in 0u32..5,
        angle in prop::sample::select(ANGLES),
    ) {
        prop_assert!(grammar.is_bracket_local());
        let steps = lsys::estimate_expansion(&grammar, iterations).path_steps;
        let composed = compile(&grammar, lsys::Strategy::Composed, iterations, angle);
        prop_assert_eq!(composed.path.len() as u64, steps + 1);
        for depth in 0..=iterations {
            let direct = compile(&grammar, lsys::Strategy::Direct, depth, angle);
            let composed = compile(&grammar, lsys::Strategy::Composed, depth, angle);
            assert_same_geometry(&direct, &composed);
        }
    }

    #[test]
    fn auto_is_equivalent_to_direct_for_any_brackets(
        grammar in grammar(ANY),
        iterations in 0u32..4,
        angle in prop::sample::select(ANGLES),
    ) {
        let direct = compile(&grammar, lsys::Strategy::Direct, iterations, angle);
        let auto = compile(&grammar, lsys::Strategy::Auto, iterations, angle);
        assert_same_geometry(&direct, &auto);
    }

    #[test]
    fn balanced_axiom_returns_to_start(
        body in word(BALANCED, 5),
        rules in grammar(BALANCED),
        iterations in 1u32..4,
        angle in prop::sample::select(ANGLES),
    ) {
        let grammar = Grammar::from_parts(
            lsys::tokenize(&format!("[{body}]")),
            rules.rules().clone(),
        );
        let config = CompilerConfig::default();
        let compiled = compile(&grammar, lsys::Strategy::Auto, iterations, angle);
        prop_assert_eq!(
            compiled.end,
            Pose::new(glam::DVec2::ZERO, config.initial_heading)
        );
        prop_assert_eq!(compiled.open_branches, 0);
    }
}
