//! Ray/triangle intersection shared by the reference oracle and light
//! sampling.

use crate::{Interval, Ray, Vec3};

/// Intersection of a ray with a triangle.
///
/// `u` and `v` are the barycentric weights of the second and third vertex;
/// the first vertex gets `1 - u - v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

/// Möller-Trumbore ray-triangle intersection. Both faces are hit.
pub fn intersect_triangle(
    ray: &Ray,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    ray_t: Interval,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to the triangle plane
    if a.abs() < 1e-8 {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    if !ray_t.contains(t) {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Area of the triangle `(v0, v1, v2)`.
pub fn triangle_area(v0: Vec3, v1: Vec3, v2: Vec3) -> f32 {
    0.5 * (v1 - v0).cross(v2 - v0).length()
}
