//! Scene tables and the builder that assembles them.
//!
//! A [`Scene`] is immutable once built: meshes, instances, materials,
//! property tables and the light alias table are all read-only during
//! rendering.

use std::collections::HashMap;
use std::path::Path;

use lumen_math::{Aabb, Mat4, Mat4Ext, Quat, Vec3};
use thiserror::Error;

use crate::camera::Camera;
use crate::light::LightSourceAliasTable;
use crate::material::{Material, MaterialId};
use crate::mesh::Mesh;
use crate::noise::Perlin;
use crate::property::{CheckerTexture, NoiseTexture, PropertyRef, PropertyTables};
use crate::sky::Sky;
use crate::table::{Id, Table};
use crate::texture::{ImageTexture, TextureError};

#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Invalid mesh '{name}': {reason}")]
    InvalidMesh { name: String, reason: String },

    #[error("Unknown mesh id {0}")]
    UnknownMesh(u32),

    #[error("Unknown material id {0}")]
    UnknownMaterial(u32),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

pub type SceneResult<T> = Result<T, SceneError>;

pub type MeshId = Id<Mesh>;

/// Translation, rotation and scale, composed as `T * R * S`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    /// Rotate about `axis` (need not be normalized) by `degrees`.
    pub fn with_rotation(mut self, axis: Vec3, degrees: f32) -> Self {
        let axis = axis.normalize_or_zero();
        self.rotation = if axis == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(axis, degrees.to_radians())
        };
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// A placed copy of a mesh with its material.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshInstance {
    pub mesh: MeshId,
    pub material: MaterialId,
    pub object_to_world: Mat4,
    pub world_to_object: Mat4,
}

impl MeshInstance {
    pub fn new(mesh: MeshId, material: MaterialId, transform: &Transform) -> Self {
        let object_to_world = transform.to_matrix();
        Self {
            mesh,
            material,
            object_to_world,
            world_to_object: object_to_world.inverse(),
        }
    }
}

/// Everything the integrator reads while rendering.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub name: String,
    pub meshes: Table<Mesh>,
    pub instances: Table<MeshInstance>,
    pub materials: Table<Material>,
    pub properties: PropertyTables,
    pub lights: LightSourceAliasTable,
    pub sky: Sky,
    pub camera: Camera,
}

impl Scene {
    pub fn instance(&self, instance_id: u32) -> Option<&MeshInstance> {
        self.instances.get(instance_id)
    }

    /// Mesh and instance for an instance id, if both exist.
    pub fn instance_mesh(&self, instance_id: u32) -> Option<(&MeshInstance, &Mesh)> {
        let instance = self.instances.get(instance_id)?;
        let mesh = self.meshes.get_id(instance.mesh)?;
        Some((instance, mesh))
    }

    pub fn instance_material(&self, instance_id: u32) -> Option<&Material> {
        let instance = self.instances.get(instance_id)?;
        self.materials.get_id(instance.material)
    }

    /// World-space corners of one triangle of one instance.
    pub fn world_triangle(&self, instance_id: u32, primitive_id: u32) -> Option<[Vec3; 3]> {
        let (instance, mesh) = self.instance_mesh(instance_id)?;
        let p = mesh.triangle_positions(primitive_id)?;
        Some(p.map(|v| instance.object_to_world.transform_point3(v)))
    }

    pub fn total_triangle_count(&self) -> usize {
        self.instances
            .iter()
            .filter_map(|instance| self.meshes.get_id(instance.mesh))
            .map(Mesh::triangle_count)
            .sum()
    }

    /// World-space bounds of all instances.
    pub fn world_bounds(&self) -> Aabb {
        self.instances
            .iter()
            .filter_map(|instance| {
                let mesh = self.meshes.get_id(instance.mesh)?;
                Some(instance.object_to_world.transform_aabb(&mesh.bounds))
            })
            .fold(Aabb::EMPTY, |acc, b| Aabb::surrounding(&acc, &b))
    }

    /// Drop the light alias table so only BSDF sampling is used.
    pub fn disable_light_sampling(&mut self) {
        self.lights = LightSourceAliasTable::empty();
    }
}

/// Incrementally assembles a [`Scene`].
///
/// Every `add_*` call returns the handle to store in whatever refers to
/// the new row.
#[derive(Default)]
pub struct SceneBuilder {
    scene: Scene,
    image_paths: HashMap<String, u32>,
}

impl SceneBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            scene: Scene {
                name: name.into(),
                ..Default::default()
            },
            image_paths: HashMap::new(),
        }
    }

    pub fn add_colour(&mut self, rgb: Vec3) -> PropertyRef {
        PropertyRef::Rgb(self.scene.properties.colours.push(rgb))
    }

    pub fn add_image(&mut self, image: ImageTexture) -> PropertyRef {
        PropertyRef::Image(self.scene.properties.images.push(image))
    }

    /// Load an image from disk. The same path is only loaded once.
    pub fn add_image_file(&mut self, path: impl AsRef<Path>) -> SceneResult<PropertyRef> {
        let key = path.as_ref().display().to_string();
        if let Some(&index) = self.image_paths.get(&key) {
            return Ok(PropertyRef::Image(index));
        }
        let image = ImageTexture::load(path)?;
        let index = self.scene.properties.images.push(image);
        self.image_paths.insert(key, index);
        Ok(PropertyRef::Image(index))
    }

    pub fn add_checker(&mut self, scale: f32, odd: PropertyRef, even: PropertyRef) -> PropertyRef {
        if !odd.is_basic() || !even.is_basic() {
            log::warn!("Nested checker textures resolve to black");
        }
        let checker = CheckerTexture { scale, odd, even };
        PropertyRef::Checker(self.scene.properties.checkers.push(checker))
    }

    pub fn add_noise(&mut self, scale: f32) -> PropertyRef {
        PropertyRef::Noise(self.scene.properties.noises.push(NoiseTexture { scale }))
    }

    /// Reseed the Perlin lattice shared by all noise textures.
    pub fn noise_seed(&mut self, seed: u64) -> &mut Self {
        self.scene.properties.perlin = Perlin::new(seed);
        self
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.scene.materials.push_id(material)
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> SceneResult<MeshId> {
        mesh.validate()?;
        Ok(self.scene.meshes.push_id(mesh))
    }

    pub fn add_instance(
        &mut self,
        mesh: MeshId,
        material: MaterialId,
        transform: &Transform,
    ) -> SceneResult<u32> {
        if self.scene.meshes.get_id(mesh).is_none() {
            return Err(SceneError::UnknownMesh(mesh.index()));
        }
        if self.scene.materials.get_id(material).is_none() {
            return Err(SceneError::UnknownMaterial(material.index()));
        }
        Ok(self
            .scene
            .instances
            .push(MeshInstance::new(mesh, material, transform)))
    }

    /// Add a mesh and a single identity-transformed instance of it.
    pub fn add_object(&mut self, mesh: Mesh, material: MaterialId) -> SceneResult<u32> {
        let mesh = self.add_mesh(mesh)?;
        self.add_instance(mesh, material, &Transform::default())
    }

    pub fn sky(&mut self, sky: Sky) -> &mut Self {
        self.scene.sky = sky;
        self
    }

    pub fn camera(&mut self, camera: Camera) -> &mut Self {
        self.scene.camera = camera;
        self
    }

    /// Finish the scene and build its light alias table.
    pub fn build(self) -> Scene {
        let mut scene = self.scene;

        for material in scene.materials.iter() {
            for property in material.properties() {
                if !scene.properties.contains(property) {
                    log::warn!(
                        "{} material references missing {:?}, it will resolve to black",
                        material.kind_name(),
                        property
                    );
                }
            }
        }

        scene.lights =
            LightSourceAliasTable::build(&scene.meshes, &scene.materials, &scene.instances);

        log::debug!(
            "Built scene '{}': {} meshes, {} instances, {} triangles, {} materials",
            scene.name,
            scene.meshes.len(),
            scene.instances.len(),
            scene.total_triangle_count(),
            scene.materials.len()
        );

        scene
    }
}
