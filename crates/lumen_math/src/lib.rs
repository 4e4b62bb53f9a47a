//! Lumen math types.
//!
//! Thin layer over `glam` with the handful of geometric primitives the
//! integrator and the reference oracle share.

pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;
mod transform;
mod triangle;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Mat4Ext;
pub use triangle::{intersect_triangle, triangle_area, TriangleHit};
