//! Triangle meshes and the primitive generators used to build scenes.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use lumen_math::{Aabb, Vec2, Vec3};

use crate::scene::{SceneError, SceneResult};

/// One mesh vertex, laid out for direct upload.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    #[inline]
    pub fn normal(&self) -> Vec3 {
        Vec3::from_array(self.normal)
    }

    #[inline]
    pub fn uv(&self) -> Vec2 {
        Vec2::from_array(self.uv)
    }
}

/// An indexed triangle mesh in object space.
///
/// Every three indices form a triangle; the triangle's position in that
/// list is its primitive id.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Object-space bounding box
    pub bounds: Aabb,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        let bounds = vertices.iter().fold(Aabb::EMPTY, |acc, v| {
            let p = v.position();
            Aabb::surrounding(&acc, &Aabb { min: p, max: p })
        });
        Self {
            name: name.into(),
            vertices,
            indices,
            bounds,
        }
    }

    /// A single triangle with a flat normal following the winding.
    pub fn triangle(name: impl Into<String>, points: [Vec3; 3], uvs: [Vec2; 3]) -> Self {
        let normal = (points[1] - points[0])
            .cross(points[2] - points[0])
            .normalize_or_zero();
        let vertices = points
            .iter()
            .zip(uvs.iter())
            .map(|(p, uv)| Vertex::new(*p, normal, *uv))
            .collect();
        Self::new(name, vertices, vec![0, 1, 2])
    }

    /// Parallelogram `corner`, `corner + u`, `corner + u + v`, `corner + v`.
    ///
    /// The face normal is `u × v`, so the winding decides which side is
    /// the front face.
    pub fn quad(name: impl Into<String>, corner: Vec3, u: Vec3, v: Vec3) -> Self {
        let normal = u.cross(v).normalize_or_zero();
        let vertices = vec![
            Vertex::new(corner, normal, Vec2::new(0.0, 0.0)),
            Vertex::new(corner + u, normal, Vec2::new(1.0, 0.0)),
            Vertex::new(corner + u + v, normal, Vec2::new(1.0, 1.0)),
            Vertex::new(corner + v, normal, Vec2::new(0.0, 1.0)),
        ];
        Self::new(name, vertices, vec![0, 1, 2, 0, 2, 3])
    }

    /// Axis-aligned box between two corners, faces pointing outwards.
    pub fn cuboid(name: impl Into<String>, a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        let d = max - min;
        let dx = Vec3::new(d.x, 0.0, 0.0);
        let dy = Vec3::new(0.0, d.y, 0.0);
        let dz = Vec3::new(0.0, 0.0, d.z);

        let faces = [
            Self::quad("", Vec3::new(max.x, min.y, min.z), dy, dz),
            Self::quad("", min, dz, dy),
            Self::quad("", Vec3::new(min.x, max.y, min.z), dz, dx),
            Self::quad("", min, dx, dz),
            Self::quad("", Vec3::new(min.x, min.y, max.z), dx, dy),
            Self::quad("", min, dy, dx),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for face in faces {
            let offset = vertices.len() as u32;
            vertices.extend_from_slice(&face.vertices);
            indices.extend(face.indices.iter().map(|i| i + offset));
        }

        Self::new(name, vertices, indices)
    }

    /// Latitude/longitude sphere with smooth normals.
    ///
    /// The triangles touching the poles are emitted once per segment instead
    /// of as degenerate quads.
    pub fn uv_sphere(
        name: impl Into<String>,
        center: Vec3,
        radius: f32,
        rings: u32,
        segments: u32,
    ) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let mut vertices = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
        for r in 0..=rings {
            let phi = PI * r as f32 / rings as f32;
            for s in 0..=segments {
                let theta = 2.0 * PI * s as f32 / segments as f32;
                let n = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                let uv = Vec2::new(
                    s as f32 / segments as f32,
                    1.0 - r as f32 / rings as f32,
                );
                vertices.push(Vertex::new(center + radius * n, n, uv));
            }
        }

        let row = segments + 1;
        let mut indices = Vec::new();
        for r in 0..rings {
            for s in 0..segments {
                let a = r * row + s;
                let b = (r + 1) * row + s;
                let c = (r + 1) * row + s + 1;
                let d = r * row + s + 1;

                if r != 0 {
                    indices.extend_from_slice(&[a, d, c]);
                }
                if r != rings - 1 {
                    indices.extend_from_slice(&[a, c, b]);
                }
            }
        }

        log::debug!(
            "Generated uv sphere: {} vertices, {} triangles",
            vertices.len(),
            indices.len() / 3
        );

        Self::new(name, vertices, indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertices of a triangle, or `None` if the primitive id or any of its
    /// indices is out of range.
    pub fn triangle_vertices(&self, primitive: u32) -> Option<[&Vertex; 3]> {
        let base = primitive as usize * 3;
        let idx = self.indices.get(base..base + 3)?;
        Some([
            self.vertices.get(idx[0] as usize)?,
            self.vertices.get(idx[1] as usize)?,
            self.vertices.get(idx[2] as usize)?,
        ])
    }

    /// Object-space corner positions of a triangle.
    pub fn triangle_positions(&self, primitive: u32) -> Option<[Vec3; 3]> {
        self.triangle_vertices(primitive)
            .map(|[a, b, c]| [a.position(), b.position(), c.position()])
    }

    /// Check the index buffer is well formed.
    pub fn validate(&self) -> SceneResult<()> {
        if self.indices.len() % 3 != 0 {
            return Err(SceneError::InvalidMesh {
                name: self.name.clone(),
                reason: format!("index count {} is not a multiple of 3", self.indices.len()),
            });
        }
        if let Some(bad) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= self.vertices.len())
        {
            return Err(SceneError::InvalidMesh {
                name: self.name.clone(),
                reason: format!(
                    "index {} out of range for {} vertices",
                    bad,
                    self.vertices.len()
                ),
            });
        }
        Ok(())
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}
