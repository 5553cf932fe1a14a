//! Built-in grammars.
//!
//! Taken from "The Algorithmic Beauty of Plants" (Prusinkiewicz and
//! Lindenmayer) and Wikipedia.

use crate::grammar::Grammar;
use crate::request::GenerationRequest;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Preset {
    /// Stable identifier, e.g. `"hilbert"`.
    pub key: &'static str,
    pub name: &'static str,
    /// Where the grammar comes from.
    pub source: &'static str,
    pub axiom: &'static str,
    pub rules: &'static str,
    pub iterations: u32,
    pub angle: f64,
}

impl Preset {
    pub fn grammar(&self) -> Grammar {
        Grammar::parse(self.axiom, self.rules)
    }

    pub fn request(&self) -> GenerationRequest {
        GenerationRequest::new(
            self.axiom,
            self.rules,
            i64::from(self.iterations),
            self.angle,
        )
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        key: "hilbert",
        name: "Hilbert Curve",
        source: "https://en.wikipedia.org/wiki/Hilbert_curve#Representation_as_Lindenmayer_system",
        axiom: "A",
        rules: "A=+BF-AFA-FB+\nB=-AF+BFB+FA-",
        iterations: 4,
        angle: 90.0,
    },
    Preset {
        key: "koch_snowflake",
        name: "Koch Snowflake",
        source: "https://en.wikipedia.org/wiki/Koch_snowflake#Representation_as_Lindenmayer_system",
        axiom: "F--F--F",
        rules: "F=F+F--F+F",
        iterations: 4,
        angle: 60.0,
    },
    Preset {
        key: "koch",
        name: "Koch Curve",
        source: "https://en.wikipedia.org/wiki/Koch_snowflake#Representation_as_Lindenmayer_system",
        // Turned to run horizontally.
        axiom: "---F",
        rules: "F=F++F----F++F",
        iterations: 4,
        angle: 30.0,
    },
    Preset {
        key: "sierpinski",
        name: "Sierpinski Triangle",
        source: "https://en.wikipedia.org/wiki/L-system#Example_5:_Sierpinski_triangle",
        axiom: "F1-F2-F2",
        rules: "F1=F1-F2+F1+F2-F1\nF2=F2F2",
        iterations: 5,
        angle: 120.0,
    },
    Preset {
        key: "sierpinski_2",
        name: "Sierpinski Triangle 2",
        source: "ABOP Figure 1.10b",
        axiom: "F2",
        rules: "F1=F2+F1+F2\nF2=F1-F2-F1",
        iterations: 6,
        angle: 60.0,
    },
    Preset {
        key: "dragon",
        name: "Dragon Curve",
        source: "ABOP Figure 1.10b",
        axiom: "F1",
        rules: "F1=F1+F2+\nF2=-F1-F2",
        iterations: 10,
        angle: 90.0,
    },
    Preset {
        key: "bush",
        name: "Bush",
        source: "ABOP Figure 1.24c",
        axiom: "F",
        rules: "F=FF-[-F+F+F]+[+F-F-F]",
        iterations: 5,
        angle: 22.5,
    },
    Preset {
        key: "plant",
        name: "Plant",
        source: "https://en.wikipedia.org/wiki/L-system#Example_7:_fractal_plant",
        axiom: "-X",
        rules: "X=F+[[X]-X]-F[-FX]+X\nF=FF",
        iterations: 6,
        angle: 25.0,
    },
    Preset {
        key: "islands_and_lakes",
        name: "Islands and Lakes",
        source: "ABOP Figure 1.8",
        axiom: "F+F+F+F",
        rules: "F=F+f-FF+F+FF+Ff+FF-f+FF-F-FF-Ff-FFF\nf=ffffff",
        iterations: 3,
        angle: 90.0,
    },
    Preset {
        key: "crystal",
        name: "Crystal",
        source: "ABOP Figure 1.9d",
        axiom: "F-F-F-F",
        rules: "F=FF-F--F-F",
        iterations: 6,
        angle: 90.0,
    },
    Preset {
        key: "bracelet",
        name: "Bracelet",
        source: "ABOP Figure 1.9a",
        axiom: "F-F-F-F",
        rules: "F=FF-F-F-F-F-F+F",
        iterations: 5,
        angle: 90.0,
    },
    Preset {
        key: "gosper",
        name: "Gosper Curve",
        source: "ABOP Figure 1.11a",
        axiom: "F1",
        rules: "F1=F1+F2++F2-F1--F1F1-F2+\nF2=-F1+F2F2++F2+F1--F1-F2",
        iterations: 4,
        angle: 60.0,
    },
];

pub fn preset(key: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.key == key)
}

/// The preset whose grammar and angle match the given fields, or `None`
/// for a custom grammar.
pub fn find_matching_preset(axiom: &str, rules: &str, angle: f64) -> Option<&'static Preset> {
    let grammar = Grammar::parse(axiom, rules);
    PRESETS
        .iter()
        .find(|p| p.angle == angle && p.grammar() == grammar)
}
