//! # lsys-path
//!
//! Turns Lindenmayer grammars (an axiom plus `symbol=replacement` rules) into
//! the 2D path a turtle would trace, without ever building the expanded string.
//!
//! Every rewritable symbol is traced once per expansion depth in its own local
//! frame. Parents embed those rule paths with a rotation and a translation, so
//! the symbolic work grows with `iterations × grammar size` rather than with
//! the exponentially long expansion. A size estimator gates each request
//! before any geometry is built.
//!
//! ```rust,ignore
//! use lsys_path::{CompilerConfig, GenerationRequest, generate};
//!
//! let request = GenerationRequest::new("F--F--F", "F=F+F--F+F", 4, 60.0);
//! let generation = generate(&request, &CompilerConfig::default())?;
//! assert_eq!(generation.draw_segment_count(), 768);
//! ```

pub mod compiler;
pub mod error;
pub mod estimate;
pub mod fit;
pub mod grammar;
pub mod path;
pub mod presets;
pub mod request;
pub mod service;
pub mod turtle;

pub use compiler::*;
pub use error::*;
pub use estimate::*;
pub use fit::*;
pub use grammar::*;
pub use path::*;
pub use presets::*;
pub use request::*;
pub use service::*;
pub use turtle::*;
