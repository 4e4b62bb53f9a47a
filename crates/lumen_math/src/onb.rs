use crate::Vec3;

/// Orthonormal basis around a unit vector `w`.
///
/// Built with the branchless construction of Duff et al., "Building an
/// Orthonormal Basis, Revisited" (JCGT 2017).
#[derive(Debug, Clone, Copy)]
pub struct Onb {
    pub u: Vec3,
    pub v: Vec3,
    pub w: Vec3,
}

impl Onb {
    /// `w` must be normalized.
    pub fn from_w(w: Vec3) -> Self {
        let sign = 1.0_f32.copysign(w.z);
        let a = -1.0 / (sign + w.z);
        let b = w.x * w.y * a;
        let u = Vec3::new(1.0 + sign * w.x * w.x * a, sign * b, -sign * w.x);
        let v = Vec3::new(b, sign + w.y * w.y * a, -w.y);
        Self { u, v, w }
    }

    /// Map a vector given in basis coordinates to world space.
    #[inline]
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        local.x * self.u + local.y * self.v + local.z * self.w
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(onb: &Onb) {
        assert!((onb.u.length() - 1.0).abs() < 1e-5);
        assert!((onb.v.length() - 1.0).abs() < 1e-5);
        assert!(onb.u.dot(onb.v).abs() < 1e-5);
        assert!(onb.u.dot(onb.w).abs() < 1e-5);
        assert!(onb.v.dot(onb.w).abs() < 1e-5);
    }

    #[test]
    fn test_onb_is_orthonormal() {
        for w in [
            Vec3::Z,
            Vec3::NEG_Z,
            Vec3::X,
            Vec3::Y,
            Vec3::new(1.0, -2.0, 0.5).normalize(),
            Vec3::new(-0.3, 0.1, -0.9).normalize(),
        ] {
            assert_orthonormal(&Onb::from_w(w));
        }
    }

    #[test]
    fn test_onb_local_z_maps_to_w() {
        let w = Vec3::new(0.2, 0.9, -0.4).normalize();
        let onb = Onb::from_w(w);
        assert!((onb.to_world(Vec3::Z) - w).length() < 1e-5);
    }
}
