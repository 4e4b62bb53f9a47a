//! Background radiance for rays that leave the scene.

use lumen_math::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sky {
    /// Black background; all light comes from emissive geometry.
    #[default]
    None,
    Solid {
        rgb: [f32; 3],
    },
    /// Blend from `bottom` to `top` by the ray's vertical direction.
    VerticalGradient {
        factor: f32,
        top: [f32; 3],
        bottom: [f32; 3],
    },
}

impl Sky {
    /// Radiance seen along `direction`, which need not be normalized.
    pub fn radiance(&self, direction: Vec3) -> Vec3 {
        match *self {
            Sky::None => Vec3::ZERO,
            Sky::Solid { rgb } => Vec3::from_array(rgb),
            Sky::VerticalGradient {
                factor,
                top,
                bottom,
            } => {
                let y = direction.normalize_or_zero().y;
                let t = (factor * 0.5 * (y + 1.0)).clamp(0.0, 1.0);
                Vec3::from_array(bottom).lerp(Vec3::from_array(top), t)
            }
        }
    }
}
