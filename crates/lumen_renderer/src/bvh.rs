//! Bounding volume hierarchy over the triangles of one mesh.
//!
//! Built in object space so every instance of a mesh shares it.

use lumen_core::Mesh;
use lumen_math::{intersect_triangle, Aabb, Interval, Ray, TriangleHit, Vec3};

/// Maximum primitives per leaf node before splitting.
const LEAF_MAX_SIZE: usize = 4;

enum BvhNode {
    Branch {
        left: Box<BvhNode>,
        right: Box<BvhNode>,
        bbox: Aabb,
    },
    Leaf {
        primitives: Vec<u32>,
        bbox: Aabb,
    },
    Empty,
}

/// Primitive id and its box, used only while building.
#[derive(Clone, Copy)]
struct BuildItem {
    primitive: u32,
    bbox: Aabb,
    centroid: Vec3,
}

pub struct MeshBvh {
    root: BvhNode,
    /// Object-space corners, indexed by primitive id
    triangles: Vec<[Vec3; 3]>,
}

impl MeshBvh {
    pub fn new(mesh: &Mesh) -> Self {
        let mut triangles = Vec::with_capacity(mesh.triangle_count());
        let mut items = Vec::with_capacity(mesh.triangle_count());

        for primitive in 0..mesh.triangle_count() as u32 {
            match mesh.triangle_positions(primitive) {
                Some([a, b, c]) => {
                    let bbox = Aabb::from_triangle(a, b, c);
                    items.push(BuildItem {
                        primitive,
                        bbox,
                        centroid: bbox.centroid(),
                    });
                    triangles.push([a, b, c]);
                }
                None => triangles.push([Vec3::ZERO; 3]),
            }
        }

        let root = if items.is_empty() {
            BvhNode::Empty
        } else {
            Self::build(items)
        };

        Self { root, triangles }
    }

    /// Simple median-split approach: sort primitives by centroid on the
    /// longest axis of the centroid bounds, split in half, recurse.
    fn build(mut items: Vec<BuildItem>) -> BvhNode {
        let bbox = items
            .iter()
            .fold(Aabb::EMPTY, |acc, item| Aabb::surrounding(&acc, &item.bbox));

        if items.len() <= LEAF_MAX_SIZE {
            return BvhNode::Leaf {
                primitives: items.iter().map(|item| item.primitive).collect(),
                bbox,
            };
        }

        let centroid_bounds = items.iter().fold(Aabb::EMPTY, |acc, item| {
            Aabb::surrounding(
                &acc,
                &Aabb {
                    min: item.centroid,
                    max: item.centroid,
                },
            )
        });
        let axis = centroid_bounds.longest_axis();

        items.sort_unstable_by(|a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let right_items = items.split_off(items.len() / 2);

        BvhNode::Branch {
            left: Box::new(Self::build(items)),
            right: Box::new(Self::build(right_items)),
            bbox,
        }
    }

    pub fn bounds(&self) -> Aabb {
        match &self.root {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bbox, .. } | BvhNode::Branch { bbox, .. } => *bbox,
        }
    }

    /// Closest triangle hit within `ray_t`.
    pub fn hit(&self, ray: &Ray, ray_t: Interval) -> Option<(u32, TriangleHit)> {
        self.hit_node(&self.root, ray, ray_t)
    }

    fn hit_node(
        &self,
        node: &BvhNode,
        ray: &Ray,
        ray_t: Interval,
    ) -> Option<(u32, TriangleHit)> {
        match node {
            BvhNode::Empty => None,

            BvhNode::Leaf { primitives, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let mut closest = None;
                let mut interval = ray_t;
                for &primitive in primitives {
                    let [a, b, c] = self.triangles[primitive as usize];
                    if let Some(hit) = intersect_triangle(ray, a, b, c, interval) {
                        interval = interval.with_max(hit.t);
                        closest = Some((primitive, hit));
                    }
                }
                closest
            }

            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = self.hit_node(left, ray, ray_t);

                // Only check right up to closest hit
                let right_max = hit_left.map_or(ray_t.max, |(_, hit)| hit.t);
                let hit_right = self.hit_node(right, ray, ray_t.with_max(right_max));

                hit_right.or(hit_left)
            }
        }
    }

    /// Does the ray hit anything within `ray_t`? Stops at the first hit.
    pub fn any_hit(&self, ray: &Ray, ray_t: Interval) -> bool {
        self.any_hit_node(&self.root, ray, ray_t)
    }

    fn any_hit_node(&self, node: &BvhNode, ray: &Ray, ray_t: Interval) -> bool {
        match node {
            BvhNode::Empty => false,
            BvhNode::Leaf { primitives, bbox } => {
                bbox.hit(ray, ray_t)
                    && primitives.iter().any(|&primitive| {
                        let [a, b, c] = self.triangles[primitive as usize];
                        intersect_triangle(ray, a, b, c, ray_t).is_some()
                    })
            }
            BvhNode::Branch { left, right, bbox } => {
                bbox.hit(ray, ray_t)
                    && (self.any_hit_node(left, ray, ray_t)
                        || self.any_hit_node(right, ray, ray_t))
            }
        }
    }
}
