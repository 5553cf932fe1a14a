//! Appendable move/line command buffers.

use crate::turtle::BoundingBox;
use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// One path command, in the owning buffer's frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathCommand {
    MoveTo(DVec2),
    LineTo(DVec2),
}

impl PathCommand {
    pub fn point(&self) -> DVec2 {
        match *self {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => p,
        }
    }

    pub fn transformed(&self, transform: &DAffine2) -> PathCommand {
        match *self {
            PathCommand::MoveTo(p) => PathCommand::MoveTo(transform.transform_point2(p)),
            PathCommand::LineTo(p) => PathCommand::LineTo(transform.transform_point2(p)),
        }
    }
}

/// An ordered sequence of path commands.
///
/// Coordinates are absolute within the buffer's own frame. A rule path is
/// traced from the local origin with the reference heading; embedding it
/// into a parent re-expresses it through a rigid transform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathBuffer {
    commands: Vec<PathCommand>,
}

impl PathBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn move_to(&mut self, point: DVec2) {
        self.commands.push(PathCommand::MoveTo(point));
    }

    pub fn line_to(&mut self, point: DVec2) {
        self.commands.push(PathCommand::LineTo(point));
    }

    /// Appends every command of `child`, mapped through `transform`, and
    /// grows `bounds` by each mapped vertex.
    pub fn embed(&mut self, child: &PathBuffer, transform: &DAffine2, bounds: &mut BoundingBox) {
        self.commands.reserve(child.commands.len());
        for command in &child.commands {
            let mapped = command.transformed(transform);
            bounds.include(mapped.point());
            self.commands.push(mapped);
        }
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of drawn segments.
    pub fn line_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::LineTo(_)))
            .count()
    }

    /// Serializes the buffer as SVG path data after mapping it through
    /// `transform`.
    pub fn to_svg_path_data(&self, transform: &DAffine2) -> String {
        let mut data = String::with_capacity(self.commands.len() * 16);
        for command in &self.commands {
            let (verb, p) = match command.transformed(transform) {
                PathCommand::MoveTo(p) => ('M', p),
                PathCommand::LineTo(p) => ('L', p),
            };
            if !data.is_empty() {
                data.push(' ');
            }
            // Writing into a String cannot fail.
            let _ = write!(data, "{verb}{:.3} {:.3}", p.x, p.y);
        }
        data
    }
}
