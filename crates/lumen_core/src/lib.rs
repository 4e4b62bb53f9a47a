//! Lumen Core - scene tables for the Lumen path tracer.
//!
//! Everything in here is read-only while a frame renders:
//!
//! - **Geometry**: [`Mesh`] with primitive generators, placed by [`MeshInstance`]
//! - **Appearance**: [`Material`] and the [`PropertyRef`] tables it points into
//! - **Lights**: [`LightSourceAliasTable`] over every emissive triangle
//! - **Setup**: [`Camera`], [`Sky`] and [`RenderSettings`]
//!
//! # Example
//!
//! ```
//! use lumen_core::{Material, Mesh, SceneBuilder};
//! use lumen_math::Vec3;
//!
//! let mut builder = SceneBuilder::new("demo");
//! let white = builder.add_colour(Vec3::ONE);
//! let light = builder.add_material(Material::DiffuseLight { emit: white });
//! builder
//!     .add_object(Mesh::quad("lamp", Vec3::ZERO, Vec3::X, Vec3::Z), light)
//!     .unwrap();
//! let scene = builder.build();
//! assert_eq!(scene.lights.triangle_count(), 2);
//! ```

pub mod camera;
pub mod light;
pub mod material;
pub mod mesh;
pub mod noise;
pub mod property;
pub mod scene;
pub mod scenes;
pub mod settings;
pub mod sky;
pub mod table;
pub mod texture;

// Re-export commonly used types
pub use camera::Camera;
pub use light::{build_alias_table, AliasEntry, LightSourceAliasTable};
pub use material::{Material, MaterialId};
pub use mesh::{Mesh, Vertex};
pub use noise::Perlin;
pub use property::{CheckerTexture, NoiseTexture, PropertyRef, PropertyTables};
pub use scene::{MeshId, MeshInstance, Scene, SceneBuilder, SceneError, SceneResult, Transform};
pub use settings::{IntegratorMode, PixelFilter, RenderSettings, SettingsError, SettingsResult};
pub use sky::Sky;
pub use table::{Id, Table};
pub use texture::{ImageTexture, TextureError, TextureResult};
