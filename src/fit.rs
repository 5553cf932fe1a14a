//! Presentation transforms: fitting compiled bounds onto a drawing surface.
//!
//! Nothing here touches the compiled path itself. A [`Frame`] is computed
//! from the bounds, the surface and the user's [`ViewState`] each time the
//! view changes.

use crate::turtle::BoundingBox;
use glam::{DAffine2, DVec2};
use serde::{Deserialize, Serialize};

/// Padding between the fitted path and the surface edge.
pub const DEFAULT_PADDING: f64 = 20.0;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 1e6;

/// A drawing surface in device units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Surface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            padding: DEFAULT_PADDING,
        }
    }

    pub fn with_padding(mut self, padding: f64) -> Self {
        self.padding = padding;
        self
    }

    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width, self.height) * 0.5
    }
}

/// User pan and zoom, applied on top of the fit transform.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub pan: DVec2,
    pub zoom: f64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pan: DVec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn pan_by(&mut self, delta: DVec2) {
        self.pan += delta;
    }

    /// Scales the view by `factor`, keeping `anchor` (surface coordinates)
    /// fixed on screen.
    ///
    /// Returns `false` and leaves the view unchanged when the new zoom would
    /// leave `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn zoom_about(&mut self, anchor: DVec2, factor: f64) -> bool {
        let zoom = self.zoom * factor;
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            return false;
        }
        let original = (anchor - self.pan) / self.zoom;
        self.zoom = zoom;
        self.pan = anchor - original * zoom;
        true
    }

    pub fn to_affine(&self) -> DAffine2 {
        DAffine2::from_scale_angle_translation(DVec2::splat(self.zoom), 0.0, self.pan)
    }
}

/// Uniform scale plus translation centring bounds on a surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitTransform {
    pub scale: f64,
    pub translation: DVec2,
}

impl FitTransform {
    /// Fits `bounds` inside `surface` less padding.
    ///
    /// A zero-width or zero-height extent counts as one unit so straight
    /// lines and single points still get a finite scale.
    pub fn compute(bounds: &BoundingBox, surface: &Surface) -> Self {
        let extent = |e: f64| if e > f64::EPSILON { e } else { 1.0 };
        let available = |s: f64| (s - 2.0 * surface.padding).max(1.0);

        let scale = (available(surface.width) / extent(bounds.width()))
            .min(available(surface.height) / extent(bounds.height()));
        let translation = surface.center() - bounds.center() * scale;

        Self { scale, translation }
    }

    pub fn apply(&self, point: DVec2) -> DVec2 {
        point * self.scale + self.translation
    }

    pub fn to_affine(&self) -> DAffine2 {
        DAffine2::from_scale_angle_translation(DVec2::splat(self.scale), 0.0, self.translation)
    }
}

/// Everything a renderer needs to draw a compiled path once.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Maps path coordinates to surface coordinates.
    pub transform: DAffine2,
    /// Stroke width in path units that renders as one device pixel.
    pub line_width: f64,
}

impl Frame {
    pub fn new(bounds: &BoundingBox, surface: &Surface, view: &ViewState) -> Self {
        let fit = FitTransform::compute(bounds, surface);
        Self {
            transform: view.to_affine() * fit.to_affine(),
            line_width: 1.0 / (fit.scale * view.zoom),
        }
    }
}
