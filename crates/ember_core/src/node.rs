//! Visual nodes
//!
//! A `VisualNode` is the transform and appearance state a renderer needs to
//! draw one entity. Types that want to be drawn embed a node rather than
//! extending a base class.

use crate::geometry::{Point, Rect, Size, Vec2};
use crate::image::ImageHandle;

/// Image plus the source rectangle to sample from it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Drawable {
    pub image: ImageHandle,
    pub rect: Rect,
}

impl Drawable {
    /// Drawable over `frame`, or the whole image when no frame is given
    pub fn new(image: ImageHandle, frame: Option<Rect>) -> Self {
        Self {
            image,
            rect: frame.unwrap_or_else(|| image.full_frame()),
        }
    }
}

/// Transform and appearance of a drawable entity
#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
    /// Position in the parent's coordinate space
    pub position: Vec2,
    /// Rotation in degrees
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Opacity, nominally in [0, 1]
    pub alpha: f64,
    pub size: Size,
    /// Transform origin in local pixels
    pub pivot: Point,
    pub drawable: Option<Drawable>,
}

impl Default for VisualNode {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            alpha: 1.0,
            size: Size::ZERO,
            pivot: Point::ZERO,
            drawable: None,
        }
    }
}

impl VisualNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image and frame, sizing the node to the frame
    pub fn set_image(&mut self, image: ImageHandle, frame: Option<Rect>) {
        let drawable = Drawable::new(image, frame);
        self.size = drawable.rect.size;
        self.drawable = Some(drawable);
    }

    /// Apply the same scale to both axes
    pub fn set_uniform_scale(&mut self, scale: f64) {
        self.scale_x = scale;
        self.scale_y = scale;
    }
}
