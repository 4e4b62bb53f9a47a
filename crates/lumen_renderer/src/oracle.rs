//! Reference CPU geometry oracle.
//!
//! One BVH per mesh in object space; rays are moved into each instance's
//! object space after a world-space bounding box test. Instance search is
//! linear, which is fine for the instance counts of the built-in scenes.

use lumen_core::Scene;
use lumen_math::{Aabb, Interval, Mat4, Mat4Ext, Ray, Vec2};

use crate::bvh::MeshBvh;
use crate::geometry::{GeometryOracle, RawHit, Trace};

struct InstanceEntry {
    instance_id: u32,
    mesh: usize,
    object_to_world: Mat4,
    world_to_object: Mat4,
    /// World-space bounds for culling
    bbox: Aabb,
}

pub struct SceneBvh {
    meshes: Vec<MeshBvh>,
    instances: Vec<InstanceEntry>,
    world_bbox: Aabb,
}

impl SceneBvh {
    pub fn new(scene: &Scene) -> Self {
        let meshes: Vec<MeshBvh> = scene.meshes.iter().map(MeshBvh::new).collect();

        let mut instances = Vec::with_capacity(scene.instances.len());
        let mut world_bbox = Aabb::EMPTY;

        for (instance_id, instance) in scene.instances.enumerate() {
            let mesh = instance.mesh.index() as usize;
            let Some(bvh) = meshes.get(mesh) else {
                log::warn!("Instance {} references missing mesh {}", instance_id, mesh);
                continue;
            };

            let bbox = instance.object_to_world.transform_aabb(&bvh.bounds());
            world_bbox = Aabb::surrounding(&world_bbox, &bbox);
            instances.push(InstanceEntry {
                instance_id,
                mesh,
                object_to_world: instance.object_to_world,
                world_to_object: instance.world_to_object,
                bbox,
            });
        }

        log::info!(
            "Built scene BVH: {} meshes, {} instances",
            meshes.len(),
            instances.len()
        );

        Self {
            meshes,
            instances,
            world_bbox,
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.world_bbox
    }

    fn local_ray(entry: &InstanceEntry, ray: &Ray) -> Ray {
        // Direction stays unnormalized so `t` is the same in both spaces
        Ray::new(
            entry.world_to_object.transform_point3(ray.origin),
            entry.world_to_object.transform_vector3(ray.direction),
        )
    }
}

impl GeometryOracle for SceneBvh {
    fn trace(&self, ray: &Ray, t_min: f32, t_max: f32) -> Trace {
        let mut closest = t_max;
        let mut best = None;

        for entry in &self.instances {
            let interval = Interval::new(t_min, closest);
            if !entry.bbox.hit(ray, interval) {
                continue;
            }

            let local_ray = Self::local_ray(entry, ray);
            if let Some((primitive_id, hit)) = self.meshes[entry.mesh].hit(&local_ray, interval) {
                closest = hit.t;
                best = Some(RawHit {
                    instance_id: entry.instance_id,
                    primitive_id,
                    barycentrics: Vec2::new(hit.u, hit.v),
                    t: hit.t,
                    object_to_world: entry.object_to_world,
                    world_to_object: entry.world_to_object,
                    world_direction: ray.direction,
                });
            }
        }

        match best {
            Some(hit) => Trace::Hit(hit),
            None => Trace::Missed,
        }
    }

    fn occluded(&self, ray: &Ray, t_min: f32, t_max: f32) -> bool {
        let interval = Interval::new(t_min, t_max);
        self.instances.iter().any(|entry| {
            entry.bbox.hit(ray, interval)
                && self.meshes[entry.mesh].any_hit(&Self::local_ray(entry, ray), interval)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::{Material, Mesh, SceneBuilder, Transform};
    use lumen_math::Vec3;

    fn two_instance_scene() -> Scene {
        let mut builder = SceneBuilder::new("oracle");
        let white = builder.add_colour(Vec3::ONE);
        let m = builder.add_material(Material::Lambertian { albedo: white });
        let quad = builder
            .add_mesh(Mesh::quad("q", Vec3::new(-0.5, -0.5, 0.0), Vec3::X, Vec3::Y))
            .unwrap();
        builder
            .add_instance(quad, m, &Transform::from_translation(Vec3::new(0.0, 0.0, -2.0)))
            .unwrap();
        builder
            .add_instance(
                quad,
                m,
                &Transform::from_translation(Vec3::new(0.0, 0.0, -4.0))
                    .with_scale(Vec3::splat(3.0)),
            )
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_nearest_instance_wins() {
        let scene = two_instance_scene();
        let oracle = SceneBvh::new(&scene);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = oracle.trace(&ray, 0.001, 100.0).hit().unwrap();
        assert_eq!(hit.instance_id, 0);
        assert!((hit.t - 2.0).abs() < 1e-5);

        // Outside the small quad but inside the scaled one
        let ray = Ray::new(Vec3::new(1.0, 1.0, 0.0), Vec3::NEG_Z);
        let hit = oracle.trace(&ray, 0.001, 100.0).hit().unwrap();
        assert_eq!(hit.instance_id, 1);
        assert!((hit.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_t_is_world_distance_with_unnormalized_direction() {
        let scene = two_instance_scene();
        let oracle = SceneBvh::new(&scene);
        let ray = Ray::new(Vec3::new(1.2, 0.0, 0.0), Vec3::NEG_Z);
        let hit = oracle.trace(&ray, 0.001, 100.0).hit().unwrap();
        assert_eq!(hit.instance_id, 1);
        assert!((ray.at(hit.t).z + 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_miss_and_occlusion_range() {
        let scene = two_instance_scene();
        let oracle = SceneBvh::new(&scene);

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert_eq!(oracle.trace(&ray, 0.001, 100.0), Trace::Missed);

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(oracle.occluded(&ray, 0.001, 100.0));
        assert!(!oracle.occluded(&ray, 0.001, 1.9));
        assert_eq!(oracle.trace(&ray, 0.001, 1.9), Trace::Missed);
    }

    #[test]
    fn test_barycentrics_reconstruct_hit_point() {
        let scene = two_instance_scene();
        let oracle = SceneBvh::new(&scene);
        let ray = Ray::new(Vec3::new(0.1, 0.2, 0.0), Vec3::NEG_Z);
        let hit = oracle.trace(&ray, 0.001, 100.0).hit().unwrap();

        let [a, b, c] = scene.world_triangle(hit.instance_id, hit.primitive_id).unwrap();
        let w = 1.0 - hit.barycentrics.x - hit.barycentrics.y;
        let p = w * a + hit.barycentrics.x * b + hit.barycentrics.y * c;
        assert!((p - ray.at(hit.t)).length() < 1e-5);
    }
}
