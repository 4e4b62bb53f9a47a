// Transform utilities for Mat4
//
// glam already provides transform_point3/transform_vector3 and inverse();
// this adds the two operations instancing needs on top of those.

use crate::{Aabb, Mat4, Vec3};

/// Extension trait for object-to-world matrices.
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box, returning the box around
    /// all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal with `self` being the world-to-object
    /// matrix (inverse transpose rule). The result is normalized.
    fn transform_normal(&self, normal: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let mut result = Aabb::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { aabb.min.x } else { aabb.max.x },
                if i & 2 == 0 { aabb.min.y } else { aabb.max.y },
                if i & 4 == 0 { aabb.min.z } else { aabb.max.z },
            );
            let p = self.transform_point3(corner);
            result = Aabb::surrounding(&result, &Aabb { min: p, max: p });
        }
        result
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        self.transpose().transform_vector3(normal).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let transformed = mat.transform_aabb(&aabb);

        assert!((transformed.min - Vec3::splat(5.0)).length() < 0.001);
        assert!((transformed.max - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation_grows_box() {
        let mat = Mat4::from_rotation_y(PI / 4.0);
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let transformed = mat.transform_aabb(&aabb);

        let expected = 2.0_f32.sqrt();
        assert!((transformed.max.x - expected).abs() < 0.001);
        assert!((transformed.max.y - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_transform_normal_non_uniform_scale() {
        // A 45 degree plane squashed along X: its normal must tilt towards X.
        let object_to_world = Mat4::from_scale(Vec3::new(0.5, 1.0, 1.0));
        let world_to_object = object_to_world.inverse();

        let n = Vec3::new(1.0, 1.0, 0.0).normalize();
        let world_n = world_to_object.transform_normal(n);

        // Tangent (1,-1,0) maps to (0.5,-1,0); the normal must stay perpendicular.
        let tangent = object_to_world.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        assert!(world_n.dot(tangent).abs() < 1e-5);
        assert!((world_n.length() - 1.0).abs() < 1e-5);
    }
}
