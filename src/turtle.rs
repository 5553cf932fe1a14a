//! Turtle state and operations for 2D path interpretation.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Position and heading of the turtle.
///
/// Headings are in degrees, measured from the `+X` axis towards `+Y`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec2,
    pub heading: f64,
}

impl Pose {
    pub fn new(position: DVec2, heading: f64) -> Self {
        Self { position, heading }
    }

    /// Unit vector pointing along the current heading.
    pub fn direction(&self) -> DVec2 {
        DVec2::from_angle(self.heading.to_radians())
    }
}

/// Axis-aligned bounding box over every point the turtle has visited.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: DVec2,
    pub max: DVec2,
}

impl BoundingBox {
    /// A degenerate box containing only `point`.
    pub fn from_point(point: DVec2) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    pub fn include(&mut self, point: DVec2) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

/// The state of the path turtle.
///
/// Tracks the current pose, the branch stack saved by `[`, and the running
/// bounds. A value of this type is owned by a single compilation; nothing
/// is shared between requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurtleState {
    /// Current pose of the cursor.
    pub pose: Pose,

    /// Poses saved by push operations, most recent last.
    pub stack: Vec<Pose>,

    /// Bounds of every point visited so far, including the starting point.
    pub bounds: BoundingBox,
}

impl TurtleState {
    /// Creates a turtle at `position` facing `heading` degrees.
    pub fn new(position: DVec2, heading: f64) -> Self {
        Self {
            pose: Pose::new(position, heading),
            stack: Vec::new(),
            bounds: BoundingBox::from_point(position),
        }
    }

    /// Moves `length` units along the heading and returns the new position.
    pub fn advance(&mut self, length: f64) -> DVec2 {
        self.pose.position += self.pose.direction() * length;
        self.bounds.include(self.pose.position);
        self.pose.position
    }

    /// Adds `degrees` to the heading.
    pub fn turn(&mut self, degrees: f64) {
        self.pose.heading += degrees;
    }

    pub fn push(&mut self) {
        self.stack.push(self.pose);
    }

    /// Restores the most recently pushed pose.
    ///
    /// Returns the restored position, or `None` (leaving the pose untouched)
    /// when the stack is empty.
    pub fn pop(&mut self) -> Option<DVec2> {
        let saved = self.stack.pop()?;
        self.pose = saved;
        Some(saved.position)
    }

    /// Number of pushes not yet matched by a pop.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Operations that can be performed by the path turtle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    /// Move forward while drawing a line (`F`, `F1`, ...).
    Draw,
    /// Move forward without drawing (`f`, `f1`, ...).
    Move,
    /// Rotate by the grammar angle times the sign (`+` is `1.0`, `-` is `-1.0`).
    Turn(f64),
    /// Save the current pose onto the stack (`[`).
    Push,
    /// Restore the most recently pushed pose (`]`).
    Pop,
    /// No-op. Symbol has no drawing meaning (`X`, `A`, ...).
    Ignore,
}

impl TurtleOp {
    /// Classifies a symbol by its leading character.
    pub fn classify(symbol: &str) -> TurtleOp {
        match symbol.chars().next() {
            Some('F') => TurtleOp::Draw,
            Some('f') => TurtleOp::Move,
            Some('+') => TurtleOp::Turn(1.0),
            Some('-') => TurtleOp::Turn(-1.0),
            Some('[') => TurtleOp::Push,
            Some(']') => TurtleOp::Pop,
            _ => TurtleOp::Ignore,
        }
    }
}
