use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::Parser;
use lsys_path::{
    CompilerConfig, Frame, Generation, GenerationRequest, PRESETS, Strategy, Surface, ViewState,
    generate, preset,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "lsys",
    version,
    about = "Compile an L-system grammar into a turtle path"
)]
struct Cli {
    /// Start from a built-in preset (see --list-presets).
    #[arg(long)]
    preset: Option<String>,

    /// Axiom, e.g. "F--F--F".
    #[arg(long)]
    axiom: Option<String>,

    /// Rules separated by ';' or newlines, e.g. "F=F+F--F+F".
    #[arg(long)]
    rules: Option<String>,

    #[arg(long)]
    iterations: Option<i64>,

    /// Turn angle in degrees.
    #[arg(long)]
    angle: Option<f64>,

    /// Force an expansion strategy instead of choosing automatically.
    #[arg(long, value_enum, default_value_t = StrategyChoice::Auto)]
    strategy: StrategyChoice,

    /// Ceiling on drawn segments, path steps and direct expansion work.
    #[arg(long, default_value_t = lsys_path::DEFAULT_MAX_SEGMENTS)]
    max_segments: u64,

    #[arg(long, default_value_t = 1024.0)]
    width: f64,

    #[arg(long, default_value_t = 1024.0)]
    height: f64,

    #[arg(long, default_value_t = lsys_path::DEFAULT_PADDING)]
    padding: f64,

    /// Write the fitted path as a standalone SVG document.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Print a JSON summary instead of plain text.
    #[arg(long)]
    json: bool,

    /// List the built-in presets and exit.
    #[arg(long)]
    list_presets: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StrategyChoice {
    Auto,
    Direct,
    Composed,
}

impl From<StrategyChoice> for Strategy {
    fn from(choice: StrategyChoice) -> Self {
        match choice {
            StrategyChoice::Auto => Strategy::Auto,
            StrategyChoice::Direct => Strategy::Direct,
            StrategyChoice::Composed => Strategy::Composed,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.list_presets {
        for p in PRESETS {
            println!(
                "{:<18} {} (iterations {}, angle {})",
                p.key, p.name, p.iterations, p.angle
            );
        }
        return Ok(());
    }

    let request = build_request(&cli)?;
    let config = CompilerConfig {
        max_segments: cli.max_segments,
        strategy: cli.strategy.into(),
        ..Default::default()
    };
    let generation = generate(&request, &config).context("generation refused")?;

    let surface = Surface::new(cli.width, cli.height).with_padding(cli.padding);
    if let Some(out) = &cli.svg {
        let frame = Frame::new(generation.bounds(), &surface, &ViewState::default());
        std::fs::write(out, render_svg(&generation, &frame, &surface))
            .with_context(|| format!("writing {}", out.display()))?;
    }

    if cli.json {
        let summary = serde_json::json!({
            "draw_segments": generation.draw_segment_count(),
            "estimated_segments": generation.estimated_segments,
            "bounds": generation.bounds(),
            "strategy": generation.path.strategy,
            "rule_paths": generation.path.rule_paths,
            "elapsed_ms": generation.elapsed_ms,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let bounds = generation.bounds();
        println!(
            "{} segments ({:?}, {} rule paths) in {:.2} ms, bounds {:.3} x {:.3}",
            generation.draw_segment_count(),
            generation.path.strategy,
            generation.path.rule_paths,
            generation.elapsed_ms,
            bounds.width(),
            bounds.height(),
        );
    }

    Ok(())
}

fn build_request(cli: &Cli) -> anyhow::Result<GenerationRequest> {
    let mut request = match &cli.preset {
        Some(key) => match preset(key) {
            Some(p) => p.request(),
            None => bail!("unknown preset `{key}` (try --list-presets)"),
        },
        None => GenerationRequest::new("", "", 1, 90.0),
    };

    if let Some(axiom) = &cli.axiom {
        request.axiom = axiom.clone();
    }
    if let Some(rules) = &cli.rules {
        request.rules = rules.clone();
    }
    if let Some(iterations) = cli.iterations {
        request.iterations = iterations;
    }
    if let Some(angle) = cli.angle {
        request.angle_degrees = angle;
    }

    if request.axiom.trim().is_empty() {
        bail!("either --preset or --axiom is required");
    }
    Ok(request)
}

fn render_svg(generation: &Generation, frame: &Frame, surface: &Surface) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            "\n",
            r##"<path fill="none" stroke="#2c3e50" stroke-width="1" d="{d}"/>"##,
            "\n</svg>\n"
        ),
        w = surface.width,
        h = surface.height,
        d = generation.path.path.to_svg_path_data(&frame.transform),
    )
}
