//! Ember Core
//!
//! Foundational types shared by the Ember particle engine and its hosts:
//!
//! - **Geometry**: `Point`, `Size`, `Rect` and `Vec2` in double precision
//! - **Images**: opaque image handles and a name-keyed registry
//! - **Visual Nodes**: transform, opacity and sizing of a drawable entity
//! - **Containers**: ordered child collections keyed by generational ids
//! - **Ticking**: the per-frame `Tick` contract and a fixed-rate `FrameClock`
//!
//! # Example
//!
//! ```rust
//! use ember_core::{Container, FrameClock};
//!
//! let mut container = Container::new();
//! let a = container.add_child("a");
//! container.add_child("b");
//! assert_eq!(container.remove_child(a), Some("a"));
//! assert_eq!(container.len(), 1);
//!
//! let mut clock = FrameClock::new(60.0);
//! let total: u32 = (0..60).map(|_| clock.next_delta()).sum();
//! assert_eq!(total, 1000);
//! ```

pub mod container;
pub mod geometry;
pub mod image;
pub mod node;
pub mod tick;

pub use container::{Container, NodeId};
pub use geometry::{Point, Rect, Size, Vec2};
pub use image::{ImageHandle, ImageId, ImageRegistry};
pub use node::{Drawable, VisualNode};
pub use tick::{FrameClock, Tick};
