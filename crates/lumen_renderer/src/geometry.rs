//! The contract between the integrator and whatever finds ray hits.

use lumen_core::{Scene, Vertex};
use lumen_math::{Mat4, Mat4Ext, Ray, Vec2, Vec3};

/// Closest hits nearer than this are ignored to avoid self-intersection.
pub const T_MIN: f32 = 0.001;
/// Farthest distance any ray is traced.
pub const T_MAX: f32 = 10_000.0;

/// What the oracle reports about the nearest hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawHit {
    pub instance_id: u32,
    pub primitive_id: u32,
    /// Weights of the triangle's second and third vertex
    pub barycentrics: Vec2,
    pub t: f32,
    pub object_to_world: Mat4,
    pub world_to_object: Mat4,
    pub world_direction: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trace {
    Hit(RawHit),
    Missed,
}

impl Trace {
    pub fn hit(self) -> Option<RawHit> {
        match self {
            Trace::Hit(hit) => Some(hit),
            Trace::Missed => None,
        }
    }
}

/// Ray-scene intersection, consumed as a black box.
pub trait GeometryOracle: Send + Sync {
    /// Nearest hit with `t` in `[t_min, t_max]`.
    fn trace(&self, ray: &Ray, t_min: f32, t_max: f32) -> Trace;

    /// Is anything hit in `[t_min, t_max]`? Implementations may stop at
    /// the first hit found.
    fn occluded(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        matches!(self.trace(ray, t_min, t_max), Trace::Hit(_))
    }
}

/// Shading information at a hit point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HitRecord {
    pub position: Vec3,
    /// Hit point before the instance transform, used by solid textures
    pub local_position: Vec3,
    pub u: f32,
    pub v: f32,
    /// Unit normal, always facing against the incoming ray
    pub normal: Vec3,
    /// Did the un-flipped normal already face the ray?
    pub front_face: bool,
}

impl HitRecord {
    /// Look up the hit triangle in the scene and interpolate it.
    ///
    /// Returns `None` when the instance, mesh or primitive does not exist.
    pub fn from_raw(scene: &Scene, hit: &RawHit) -> Option<Self> {
        let (_, mesh) = scene.instance_mesh(hit.instance_id)?;
        let vertices = mesh.triangle_vertices(hit.primitive_id)?;
        Some(Self::interpolate(
            vertices,
            hit.barycentrics,
            &hit.object_to_world,
            &hit.world_to_object,
            hit.world_direction,
        ))
    }

    /// Interpolate per-vertex attributes at barycentric `b`.
    pub fn interpolate(
        vertices: [&Vertex; 3],
        b: Vec2,
        object_to_world: &Mat4,
        world_to_object: &Mat4,
        direction: Vec3,
    ) -> Self {
        let [v0, v1, v2] = vertices;
        let w = 1.0 - b.x - b.y;

        let local_position = w * v0.position() + b.x * v1.position() + b.y * v2.position();
        let uv = w * v0.uv() + b.x * v1.uv() + b.y * v2.uv();
        let local_normal = w * v0.normal() + b.x * v1.normal() + b.y * v2.normal();

        let mut outward = world_to_object.transform_normal(local_normal);
        if outward == Vec3::ZERO {
            // Missing vertex normals: fall back to the face normal
            let e1 = v1.position() - v0.position();
            let e2 = v2.position() - v0.position();
            outward = world_to_object.transform_normal(e1.cross(e2));
        }

        let front_face = direction.dot(outward) < 0.0;
        let normal = if front_face { outward } else { -outward };

        Self {
            position: object_to_world.transform_point3(local_position),
            local_position,
            u: uv.x,
            v: uv.y,
            normal,
            front_face,
        }
    }
}
