//! Light-source alias table.
//!
//! Every triangle of every instance with an emissive material gets one
//! entry, weighted by its world-space area. Vose's alias method gives
//! constant-time sampling proportional to area.

use bytemuck::{Pod, Zeroable};
use lumen_math::{triangle_area, Aabb};

use crate::material::Material;
use crate::mesh::Mesh;
use crate::scene::MeshInstance;
use crate::table::Table;

/// Triangles smaller than this are never sampled.
const MIN_TRIANGLE_AREA: f32 = 1e-8;

/// One row of the alias table.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct AliasEntry {
    /// Chance of keeping this row's own triangle
    pub probability: f32,
    /// Row to fall back to otherwise
    pub alias: u32,
    /// Mesh instance owning the triangle
    pub instance_id: u32,
    pub primitive_id: u32,
}

/// Alias table over all emissive triangles of a scene.
#[derive(Clone, Debug)]
pub struct LightSourceAliasTable {
    pub entries: Vec<AliasEntry>,
    /// Sum of all emissive triangle areas
    pub total_area: f32,
    /// World bounds of all emissive triangles
    pub bounds: Aabb,
}

impl LightSourceAliasTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total_area: 0.0,
            bounds: Aabb::EMPTY,
        }
    }

    /// Build the table from the scene's instances.
    ///
    /// Instances pointing at missing meshes or materials contribute nothing.
    pub fn build(
        meshes: &Table<Mesh>,
        materials: &Table<Material>,
        instances: &Table<MeshInstance>,
    ) -> Self {
        let mut weights = Vec::new();
        let mut rows = Vec::new();
        let mut bounds = Aabb::EMPTY;
        let mut light_count = 0;

        for (instance_id, instance) in instances.enumerate() {
            let is_light = materials
                .get_id(instance.material)
                .is_some_and(Material::is_emissive);
            if !is_light {
                continue;
            }
            let Some(mesh) = meshes.get_id(instance.mesh) else {
                continue;
            };
            light_count += 1;

            for primitive_id in 0..mesh.triangle_count() as u32 {
                let Some(p) = mesh.triangle_positions(primitive_id) else {
                    continue;
                };
                let [a, b, c] = p.map(|v| instance.object_to_world.transform_point3(v));
                let area = triangle_area(a, b, c);

                if area > MIN_TRIANGLE_AREA {
                    weights.push(area as f64);
                    rows.push((instance_id, primitive_id));
                    bounds = Aabb::surrounding(&bounds, &Aabb::from_triangle(a, b, c));
                }
            }
        }

        if rows.is_empty() {
            log::warn!("Scene has no emissive triangles, light sampling disabled");
            return Self::empty();
        }

        let total_area = weights.iter().sum::<f64>() as f32;
        let entries = build_alias_table(&weights)
            .into_iter()
            .zip(rows)
            .map(|((probability, alias), (instance_id, primitive_id))| AliasEntry {
                probability,
                alias,
                instance_id,
                primitive_id,
            })
            .collect::<Vec<_>>();

        log::debug!(
            "Light alias table: {} lights, {} triangles, total area {}",
            light_count,
            entries.len(),
            total_area
        );

        Self {
            entries,
            total_area,
            bounds,
        }
    }

    /// Number of emissive triangles that can be sampled.
    pub fn triangle_count(&self) -> usize {
        self.entries.len()
    }

    /// Light sampling is only possible with at least one triangle of
    /// positive total area.
    pub fn has_lights(&self) -> bool {
        !self.entries.is_empty() && self.total_area > 0.0
    }

    /// Pick a row from two uniform numbers in `[0, 1)`.
    pub fn pick(&self, u1: f32, u2: f32) -> Option<&AliasEntry> {
        let n = self.entries.len();
        if n == 0 {
            return None;
        }
        let i = ((u1 * n as f32) as usize).min(n - 1);
        let entry = &self.entries[i];
        if u2 < entry.probability {
            Some(entry)
        } else {
            self.entries.get(entry.alias as usize)
        }
    }

    /// Raw bytes for upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }
}

impl Default for LightSourceAliasTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Vose's alias construction. Returns `(probability, alias)` per input
/// weight. All weights must be non-negative with a positive sum.
pub fn build_alias_table(weights: &[f64]) -> Vec<(f32, u32)> {
    let n = weights.len();
    let total: f64 = weights.iter().sum();
    if n == 0 || total <= 0.0 {
        return Vec::new();
    }

    let mut scaled: Vec<f64> = weights.iter().map(|w| w * n as f64 / total).collect();
    let mut table: Vec<(f32, u32)> = (0..n as u32).map(|i| (1.0, i)).collect();

    let (mut small, mut large): (Vec<usize>, Vec<usize>) = (0..n).partition(|&i| scaled[i] < 1.0);

    while let (Some(&l), Some(&g)) = (small.last(), large.last()) {
        small.pop();
        large.pop();

        table[l] = (scaled[l] as f32, g as u32);
        scaled[g] = (scaled[g] + scaled[l]) - 1.0;

        if scaled[g] < 1.0 {
            small.push(g);
        } else {
            large.push(g);
        }
    }

    // Leftovers on either stack are 1 up to rounding
    for i in large.into_iter().chain(small) {
        table[i] = (1.0, i as u32);
    }

    table
}
